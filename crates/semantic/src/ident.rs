// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Identifier resolution
//!
//! Unquoted identifiers fold to the configured case; quoted identifiers are
//! kept verbatim. Every name stored in the query graph has already been
//! normalized, so later comparisons are plain string equality.

use sqlgrid_ir::{Identifier, IdentifierCase};

use crate::config::AnalyzerConfig;

/// Words that must be quoted when used as identifiers in rebuilt text
const RESERVED: &[&str] = &[
    "all", "and", "any", "as", "asc", "between", "by", "case", "cast", "cross", "desc",
    "distinct", "else", "end", "exists", "false", "from", "full", "group", "having", "in",
    "inner", "into", "is", "join", "left", "like", "limit", "not", "null", "offset", "on",
    "or", "order", "outer", "right", "select", "some", "table", "then", "true", "union",
    "unique", "user", "using", "when", "where", "with",
];

/// Case folding and quoting rules for one dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierResolver {
    case: IdentifierCase,
    quote: char,
}

impl IdentifierResolver {
    pub fn new(case: IdentifierCase, quote: char) -> Self {
        Self { case, quote }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.identifier_case(), config.dialect.identifier_quote())
    }

    /// Normalized spelling of a parsed identifier
    pub fn normalize(&self, ident: &Identifier) -> String {
        if ident.quoted {
            ident.value.clone()
        } else {
            self.fold(&ident.value)
        }
    }

    /// Apply case folding to an unquoted name
    pub fn fold(&self, raw: &str) -> String {
        match self.case {
            IdentifierCase::Lower => raw.to_lowercase(),
            IdentifierCase::Upper => raw.to_uppercase(),
            IdentifierCase::Preserve => raw.to_string(),
        }
    }

    /// Render a normalized name, quoting it only when folding would change
    /// it or it is not a plain word
    pub fn quote(&self, name: &str) -> String {
        if !self.needs_quoting(name) {
            return name.to_string();
        }
        let doubled: String = name
            .chars()
            .flat_map(|c| {
                if c == self.quote {
                    vec![c, c]
                } else {
                    vec![c]
                }
            })
            .collect();
        format!("{q}{doubled}{q}", q = self.quote)
    }

    fn needs_quoting(&self, name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return true;
        };
        if !(first.is_alphabetic() || first == '_') {
            return true;
        }
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            return true;
        }
        if self.fold(name) != name {
            return true;
        }
        RESERVED.contains(&name.to_lowercase().as_str())
    }
}

impl Default for IdentifierResolver {
    fn default() -> Self {
        Self::new(IdentifierCase::Lower, '"')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquoted_identifiers_fold() {
        let resolver = IdentifierResolver::default();
        assert_eq!(resolver.normalize(&Identifier::new("Customer")), "customer");

        let upper = IdentifierResolver::new(IdentifierCase::Upper, '"');
        assert_eq!(upper.normalize(&Identifier::new("Customer")), "CUSTOMER");

        let preserve = IdentifierResolver::new(IdentifierCase::Preserve, '`');
        assert_eq!(preserve.normalize(&Identifier::new("Customer")), "Customer");
    }

    #[test]
    fn test_quoted_identifiers_keep_case() {
        let resolver = IdentifierResolver::default();
        assert_eq!(resolver.normalize(&Identifier::quoted("MixedCase")), "MixedCase");
    }

    #[test]
    fn test_quote_only_when_needed() {
        let resolver = IdentifierResolver::default();
        assert_eq!(resolver.quote("c_name"), "c_name");
        assert_eq!(resolver.quote("MixedCase"), "\"MixedCase\"");
        assert_eq!(resolver.quote("order"), "\"order\"");
        assert_eq!(resolver.quote("two words"), "\"two words\"");
        assert_eq!(resolver.quote("1st"), "\"1st\"");
        assert_eq!(resolver.quote("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_quote_round_trips_through_normalize() {
        let resolver = IdentifierResolver::default();
        for name in ["plain", "Upper", "select"] {
            let quoted = resolver.quote(name);
            let ident = if quoted.starts_with('"') {
                Identifier::quoted(quoted.trim_matches('"'))
            } else {
                Identifier::new(quoted)
            };
            assert_eq!(resolver.normalize(&ident), name);
        }
    }
}
