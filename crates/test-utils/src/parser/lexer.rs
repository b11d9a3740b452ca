// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Tokenizer for fixture SQL

use sqlgrid_ir::{IrError, IrResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Keyword or identifier; `quoted` for `"delimited"` names
    Word { value: String, quoted: bool },
    Number(String),
    /// Single-quoted string, quotes removed and `''` collapsed
    String(String),
    /// `X'0AFF'`
    HexString(String),
    /// `$n` or `?`
    Parameter(String),
    Symbol(&'static str),
    Eof,
}

impl Token {
    /// Unquoted word matching `keyword`, case-insensitively
    pub fn is_keyword(&self, keyword: &str) -> bool {
        match self {
            Token::Word {
                value,
                quoted: false,
            } => value.eq_ignore_ascii_case(keyword),
            _ => false,
        }
    }

    pub fn is_symbol(&self, symbol: &str) -> bool {
        matches!(self, Token::Symbol(s) if *s == symbol)
    }
}

#[derive(Debug, Clone)]
pub struct TokenWithLocation {
    pub token: Token,
    /// Byte offset of the first character
    pub position: usize,
}

/// Operators and punctuation, longest first
const SYMBOLS: &[&str] = &[
    "||/", "!~*", "||", "|/", "<<", ">>", "<>", "!=", "<=", ">=", "::", "~*", "!~", "!!", "(",
    ")", ",", ".", ";", "*", "+", "-", "/", "%", "^", "&", "|", "#", "=", "<", ">", "@", "~", "!",
];

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Tokenize the whole input; the last token is always [`Token::Eof`]
    pub fn tokenize(src: &str) -> IrResult<Vec<TokenWithLocation>> {
        let mut lexer = Lexer::new(src);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let eof = token.token == Token::Eof;
            tokens.push(token);
            if eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn error(&self, message: impl Into<String>) -> IrError {
        IrError::Syntax {
            message: message.into(),
            position: self.pos,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if trimmed.starts_with("--") {
                let line = trimmed.find('\n').unwrap_or(trimmed.len());
                self.pos += line;
            } else if trimmed.starts_with("/*") {
                let end = trimmed.find("*/").map(|i| i + 2).unwrap_or(trimmed.len());
                self.pos += end;
            } else {
                return;
            }
        }
    }

    fn next_token(&mut self) -> IrResult<TokenWithLocation> {
        self.skip_whitespace_and_comments();
        let position = self.pos;
        let Some(c) = self.peek() else {
            return Ok(TokenWithLocation {
                token: Token::Eof,
                position,
            });
        };

        let token = match c {
            '\'' => Token::String(self.lex_quoted('\'')?),
            '"' => Token::Word {
                value: self.lex_quoted('"')?,
                quoted: true,
            },
            '`' => Token::Word {
                value: self.lex_quoted('`')?,
                quoted: true,
            },
            'x' | 'X' if self.peek_at(1) == Some('\'') => {
                self.pos += 1;
                Token::HexString(self.lex_quoted('\'')?)
            }
            '0'..='9' => self.lex_number(),
            '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
            '$' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.pos += 1;
                let digits = self.take_while(|c| c.is_ascii_digit());
                Token::Parameter(format!("${}", digits))
            }
            '?' => {
                self.pos += 1;
                Token::Parameter("?".to_string())
            }
            c if c.is_alphabetic() || c == '_' => {
                let value = self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '$');
                Token::Word {
                    value: value.to_string(),
                    quoted: false,
                }
            }
            _ => {
                let rest = self.rest();
                let symbol = SYMBOLS
                    .iter()
                    .find(|symbol| rest.starts_with(**symbol))
                    .ok_or_else(|| self.error(format!("Unexpected character '{}'", c)))?;
                self.pos += symbol.len();
                Token::Symbol(symbol)
            }
        };
        Ok(TokenWithLocation { token, position })
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn lex_number(&mut self) -> Token {
        let start = self.pos;
        self.take_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_at(1).is_none_or(|c| c.is_ascii_digit()) {
            self.pos += 1;
            self.take_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some('+' | '-')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1 + sign;
                self.take_while(|c| c.is_ascii_digit());
            }
        }
        Token::Number(self.src[start..self.pos].to_string())
    }

    /// Body of a quoted token; a doubled quote stands for one
    fn lex_quoted(&mut self, quote: char) -> IrResult<String> {
        let start = self.pos;
        self.pos += quote.len_utf8();
        let mut value = String::new();
        loop {
            let Some(c) = self.peek() else {
                self.pos = start;
                return Err(self.error("Unterminated quoted token"));
            };
            self.pos += c.len_utf8();
            if c == quote {
                if self.peek() == Some(quote) {
                    self.pos += quote.len_utf8();
                    value.push(quote);
                } else {
                    return Ok(value);
                }
            } else {
                value.push(c);
            }
        }
    }
}
