// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Type descriptors
//!
//! [`TypeDescriptor`] describes a SQL data type: a base [`TypeKind`] plus the
//! optional length, precision, scale and time zone flag.
//!
//! Descriptors come from three places:
//!
//! - the catalog (column types)
//! - `CAST(x AS type)` and `x::type`, parsed from a [`TypeName`] with
//!   [`TypeDescriptor::from_type_name`]
//! - type inference, which combines operand types with
//!   [`TypeDescriptor::promote`]
//!
//! ## Rendering
//!
//! [`TypeDescriptor::render`] writes the type back as dialect-specific SQL
//! text. Each kind has a template per dialect, for example
//! `NUMERIC[({precision}[,{scale}])]`. Placeholders are replaced by the
//! descriptor's values. A bracketed group is dropped when any placeholder
//! inside it has no value, so `NUMERIC` with no precision renders as
//! `NUMERIC` and with precision 10 as `NUMERIC(10)`. `{tz}` expands to
//! ` WITH TIME ZONE` when the flag is set.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{IrError, IrResult};
use crate::expr::LiteralKind;

/// Base data type kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TypeKind {
    /// Not yet inferred (parameters, unresolved expressions)
    Unknown,
    /// Type of the NULL literal
    Null,
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Numeric,
    Real,
    Double,
    Char,
    Varchar,
    Text,
    Binary,
    Date,
    Time,
    Timestamp,
    Interval,
    MacAddr,
    Cidr,
    Inet,
    Geometry,
    Bit,
    VarBit,
    Json,
}

impl TypeKind {
    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    pub fn is_character(&self) -> bool {
        matches!(self, TypeKind::Char | TypeKind::Varchar | TypeKind::Text)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            TypeKind::Date | TypeKind::Time | TypeKind::Timestamp | TypeKind::Interval
        )
    }

    fn numeric_rank(&self) -> Option<u8> {
        match self {
            TypeKind::SmallInt => Some(1),
            TypeKind::Integer => Some(2),
            TypeKind::BigInt => Some(3),
            TypeKind::Numeric => Some(4),
            TypeKind::Real => Some(5),
            TypeKind::Double => Some(6),
            _ => None,
        }
    }

    fn character_rank(&self) -> Option<u8> {
        match self {
            TypeKind::Char => Some(1),
            TypeKind::Varchar => Some(2),
            TypeKind::Text => Some(3),
            _ => None,
        }
    }

    fn template(&self, dialect: Dialect) -> &'static str {
        match (self, dialect) {
            (TypeKind::Unknown, _) => "UNKNOWN",
            (TypeKind::Null, _) => "NULL",
            (TypeKind::Boolean, _) => "BOOLEAN",
            (TypeKind::SmallInt, _) => "SMALLINT",
            (TypeKind::Integer, _) => "INTEGER",
            (TypeKind::BigInt, _) => "BIGINT",
            (TypeKind::Numeric, Dialect::MySQL) => "DECIMAL[({precision}[,{scale}])]",
            (TypeKind::Numeric, _) => "NUMERIC[({precision}[,{scale}])]",
            (TypeKind::Real, Dialect::MySQL) => "FLOAT",
            (TypeKind::Real, _) => "REAL",
            (TypeKind::Double, Dialect::MySQL) => "DOUBLE",
            (TypeKind::Double, _) => "DOUBLE PRECISION",
            (TypeKind::Char, _) => "CHAR[({length})]",
            (TypeKind::Varchar, _) => "VARCHAR[({length})]",
            (TypeKind::Text, _) => "TEXT",
            (TypeKind::Binary, Dialect::MySQL) => "BLOB",
            (TypeKind::Binary, _) => "BYTEA",
            (TypeKind::Date, _) => "DATE",
            (TypeKind::Time, Dialect::MySQL) => "TIME[({precision})]",
            (TypeKind::Time, _) => "TIME[({precision})]{tz}",
            (TypeKind::Timestamp, Dialect::MySQL) => "TIMESTAMP[({precision})]",
            (TypeKind::Timestamp, _) => "TIMESTAMP[({precision})]{tz}",
            (TypeKind::Interval, _) => "INTERVAL",
            (TypeKind::MacAddr, Dialect::MySQL) => "VARCHAR(17)",
            (TypeKind::MacAddr, _) => "MACADDR",
            (TypeKind::Cidr, Dialect::MySQL) => "VARCHAR(43)",
            (TypeKind::Cidr, _) => "CIDR",
            (TypeKind::Inet, Dialect::MySQL) => "VARCHAR(43)",
            (TypeKind::Inet, _) => "INET",
            (TypeKind::Geometry, Dialect::MySQL) => "GEOMETRY",
            (TypeKind::Geometry, _) => "POINT",
            (TypeKind::Bit, _) => "BIT[({length})]",
            (TypeKind::VarBit, Dialect::MySQL) => "BIT[({length})]",
            (TypeKind::VarBit, _) => "VARBIT[({length})]",
            (TypeKind::Json, _) => "JSON",
        }
    }
}

/// A type name as written in `CAST(x AS name(modifiers))` or `x::name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeName {
    /// Space-separated keywords, e.g. `character varying`
    pub name: String,
    /// Length or precision/scale modifiers
    pub modifiers: Vec<u32>,
    pub with_time_zone: bool,
}

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: Vec::new(),
            with_time_zone: false,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Vec<u32>) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// A resolved SQL data type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    #[serde(default)]
    pub with_time_zone: bool,
}

impl TypeDescriptor {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            length: None,
            precision: None,
            scale: None,
            with_time_zone: false,
        }
    }

    pub fn unknown() -> Self {
        Self::new(TypeKind::Unknown)
    }

    pub fn varchar(length: u32) -> Self {
        Self::new(TypeKind::Varchar).with_length(length)
    }

    pub fn numeric(precision: u32, scale: u32) -> Self {
        Self::new(TypeKind::Numeric).with_precision(precision, Some(scale))
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: Option<u32>) -> Self {
        self.precision = Some(precision);
        self.scale = scale;
        self
    }

    pub fn with_time_zone(mut self) -> Self {
        self.with_time_zone = true;
        self
    }

    pub fn is_known(&self) -> bool {
        !matches!(self.kind, TypeKind::Unknown | TypeKind::Null)
    }

    /// Resolve a parsed type name
    pub fn from_type_name(type_name: &TypeName) -> IrResult<Self> {
        let normalized = type_name
            .name
            .split_whitespace()
            .map(|part| part.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        let kind = match normalized.as_str() {
            "bool" | "boolean" => TypeKind::Boolean,
            "smallint" | "int2" => TypeKind::SmallInt,
            "int" | "integer" | "int4" | "serial" => TypeKind::Integer,
            "bigint" | "int8" | "bigserial" => TypeKind::BigInt,
            "numeric" | "decimal" | "dec" => TypeKind::Numeric,
            "real" | "float4" => TypeKind::Real,
            "double" | "double precision" | "float8" => TypeKind::Double,
            "float" => match type_name.modifiers.first() {
                Some(bits) if *bits <= 24 => TypeKind::Real,
                _ => TypeKind::Double,
            },
            "char" | "character" | "bpchar" => TypeKind::Char,
            "varchar" | "character varying" | "char varying" => TypeKind::Varchar,
            "text" | "string" => TypeKind::Text,
            "bytea" | "blob" | "binary" | "varbinary" => TypeKind::Binary,
            "date" => TypeKind::Date,
            "time" | "time without time zone" => TypeKind::Time,
            "timetz" | "time with time zone" => {
                return Ok(Self::new(TypeKind::Time)
                    .with_optional_precision(type_name.modifiers.first().copied())
                    .with_time_zone());
            }
            "timestamp" | "datetime" | "timestamp without time zone" => TypeKind::Timestamp,
            "timestamptz" | "timestamp with time zone" => {
                return Ok(Self::new(TypeKind::Timestamp)
                    .with_optional_precision(type_name.modifiers.first().copied())
                    .with_time_zone());
            }
            "interval" => TypeKind::Interval,
            "macaddr" => TypeKind::MacAddr,
            "cidr" => TypeKind::Cidr,
            "inet" => TypeKind::Inet,
            "point" | "box" | "line" | "lseg" | "path" | "polygon" | "circle" | "geometry" => {
                TypeKind::Geometry
            }
            "bit" => TypeKind::Bit,
            "varbit" | "bit varying" => TypeKind::VarBit,
            "json" | "jsonb" => TypeKind::Json,
            _ => return Err(IrError::UnknownType(type_name.name.clone())),
        };

        let mut descriptor = Self::new(kind);
        descriptor.with_time_zone = type_name.with_time_zone;
        match kind {
            TypeKind::Char | TypeKind::Varchar | TypeKind::Bit | TypeKind::VarBit => {
                descriptor.length = type_name.modifiers.first().copied();
                if type_name.modifiers.len() > 1 {
                    return Err(IrError::InvalidTypeModifier(type_name.name.clone()));
                }
            }
            TypeKind::Numeric => {
                if type_name.modifiers.len() > 2 {
                    return Err(IrError::InvalidTypeModifier(type_name.name.clone()));
                }
                descriptor.precision = type_name.modifiers.first().copied();
                descriptor.scale = type_name.modifiers.get(1).copied();
                if let (Some(precision), Some(scale)) = (descriptor.precision, descriptor.scale) {
                    if scale > precision {
                        return Err(IrError::InvalidTypeModifier(type_name.name.clone()));
                    }
                }
            }
            TypeKind::Time | TypeKind::Timestamp => {
                descriptor.precision = type_name.modifiers.first().copied();
            }
            TypeKind::Real | TypeKind::Double => {}
            _ if !type_name.modifiers.is_empty() => {
                return Err(IrError::InvalidTypeModifier(type_name.name.clone()));
            }
            _ => {}
        }
        Ok(descriptor)
    }

    fn with_optional_precision(mut self, precision: Option<u32>) -> Self {
        self.precision = precision;
        self
    }

    /// Type of a literal given its lexical category and token text
    pub fn for_literal(kind: LiteralKind, text: &str) -> Self {
        match kind {
            LiteralKind::Integer => match text.parse::<i64>() {
                Ok(value) if i32::try_from(value).is_ok() => Self::new(TypeKind::Integer),
                Ok(_) => Self::new(TypeKind::BigInt),
                Err(_) => Self::new(TypeKind::Numeric),
            },
            LiteralKind::Float => Self::new(TypeKind::Numeric),
            LiteralKind::String => {
                Self::varchar(u32::try_from(text.chars().count()).unwrap_or(u32::MAX))
            }
            LiteralKind::Date => Self::new(TypeKind::Date),
            LiteralKind::Time => Self::new(TypeKind::Time),
            LiteralKind::Timestamp => Self::new(TypeKind::Timestamp),
            LiteralKind::Interval => Self::new(TypeKind::Interval),
            LiteralKind::Binary => Self::new(TypeKind::Binary),
            LiteralKind::MacAddr => Self::new(TypeKind::MacAddr),
            LiteralKind::Cidr => Self::new(TypeKind::Cidr),
            LiteralKind::Inet => Self::new(TypeKind::Inet),
            LiteralKind::Geometry => Self::new(TypeKind::Geometry),
            LiteralKind::Boolean => Self::new(TypeKind::Boolean),
            LiteralKind::Null => Self::new(TypeKind::Null),
            LiteralKind::Parameter => Self::unknown(),
        }
    }

    /// Combine two operand types into the type of the result
    ///
    /// Unknown and NULL operands take the other side's type. Numeric types
    /// widen along `SMALLINT < INTEGER < BIGINT < NUMERIC < REAL < DOUBLE`,
    /// character types along `CHAR < VARCHAR < TEXT`. A number combined with
    /// a string stays a number. Temporal pairs follow date arithmetic.
    pub fn promote(&self, other: &TypeDescriptor) -> TypeDescriptor {
        if !self.is_known() {
            return other.clone();
        }
        if !other.is_known() {
            return self.clone();
        }
        if self.kind == other.kind {
            return self.merge_modifiers(other);
        }

        if let (Some(left), Some(right)) = (self.kind.numeric_rank(), other.kind.numeric_rank())
        {
            return if left >= right {
                self.clone()
            } else {
                other.clone()
            };
        }
        if let (Some(left), Some(right)) =
            (self.kind.character_rank(), other.kind.character_rank())
        {
            let wider = if left >= right { self } else { other };
            let mut result = TypeDescriptor::new(wider.kind);
            if wider.kind != TypeKind::Text {
                result.length = self.length.max(other.length);
            }
            return result;
        }
        if self.kind.is_numeric() && other.kind.is_character() {
            return self.clone();
        }
        if other.kind.is_numeric() && self.kind.is_character() {
            return other.clone();
        }

        use TypeKind::*;
        match (self.kind, other.kind) {
            (Date, Interval) | (Interval, Date) | (Date, Time) | (Time, Date) => {
                TypeDescriptor::new(Timestamp)
            }
            (Timestamp, _) if other.kind.is_temporal() => self.clone(),
            (_, Timestamp) if self.kind.is_temporal() => other.clone(),
            (Time, Interval) => self.clone(),
            (Interval, Time) => other.clone(),
            _ => self.clone(),
        }
    }

    fn merge_modifiers(&self, other: &TypeDescriptor) -> TypeDescriptor {
        let mut result = self.clone();
        result.length = self.length.max(other.length);
        result.precision = self.precision.max(other.precision);
        result.scale = self.scale.max(other.scale);
        result.with_time_zone = self.with_time_zone || other.with_time_zone;
        result
    }

    /// Render the type as SQL text for the given dialect
    pub fn render(&self, dialect: Dialect) -> String {
        let template = self.kind.template(dialect);
        let tz = if self.with_time_zone {
            Some(" WITH TIME ZONE".to_string())
        } else {
            Some(String::new())
        };
        let values = [
            ("length", self.length.map(|v| v.to_string())),
            ("precision", self.precision.map(|v| v.to_string())),
            ("scale", self.scale.map(|v| v.to_string())),
            ("tz", tz),
        ];
        let chars: Vec<char> = template.chars().collect();
        let mut pos = 0;
        substitute(&chars, &mut pos, &values).unwrap_or_default()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Dialect::PostgreSQL))
    }
}

/// Expand a template up to the closing bracket of the current group
///
/// Returns `None` when a placeholder of this group has no value.
fn substitute(chars: &[char], pos: &mut usize, values: &[(&str, Option<String>)]) -> Option<String> {
    let mut out = String::new();
    let mut complete = true;
    while *pos < chars.len() {
        let c = chars[*pos];
        *pos += 1;
        match c {
            '[' => {
                if let Some(group) = substitute(chars, pos, values) {
                    out.push_str(&group);
                }
            }
            ']' => break,
            '{' => {
                let start = *pos;
                while *pos < chars.len() && chars[*pos] != '}' {
                    *pos += 1;
                }
                let key: String = chars[start..*pos].iter().collect();
                *pos += 1;
                match values.iter().find(|(name, _)| *name == key) {
                    Some((_, Some(value))) => out.push_str(value),
                    _ => complete = false,
                }
            }
            _ => out.push(c),
        }
    }
    complete.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_numeric_templates() {
        let plain = TypeDescriptor::new(TypeKind::Numeric);
        assert_eq!(plain.render(Dialect::PostgreSQL), "NUMERIC");

        let precision = TypeDescriptor::new(TypeKind::Numeric).with_precision(10, None);
        assert_eq!(precision.render(Dialect::PostgreSQL), "NUMERIC(10)");

        let full = TypeDescriptor::numeric(12, 2);
        assert_eq!(full.render(Dialect::PostgreSQL), "NUMERIC(12,2)");
        assert_eq!(full.render(Dialect::MySQL), "DECIMAL(12,2)");
    }

    #[test]
    fn test_render_character_and_temporal() {
        assert_eq!(TypeDescriptor::varchar(25).render(Dialect::PostgreSQL), "VARCHAR(25)");
        assert_eq!(TypeDescriptor::new(TypeKind::Varchar).render(Dialect::MySQL), "VARCHAR");
        assert_eq!(
            TypeDescriptor::new(TypeKind::Timestamp)
                .with_time_zone()
                .render(Dialect::PostgreSQL),
            "TIMESTAMP WITH TIME ZONE"
        );
        assert_eq!(
            TypeDescriptor::new(TypeKind::Timestamp)
                .with_time_zone()
                .render(Dialect::MySQL),
            "TIMESTAMP"
        );
        assert_eq!(TypeDescriptor::new(TypeKind::Double).render(Dialect::PostgreSQL), "DOUBLE PRECISION");
    }

    #[test]
    fn test_from_type_name() {
        let ty = TypeDescriptor::from_type_name(
            &TypeName::new("character varying").with_modifiers(vec![40]),
        )
        .unwrap();
        assert_eq!(ty.kind, TypeKind::Varchar);
        assert_eq!(ty.length, Some(40));

        let ty = TypeDescriptor::from_type_name(&TypeName::new("DECIMAL").with_modifiers(vec![15, 2]))
            .unwrap();
        assert_eq!(ty, TypeDescriptor::numeric(15, 2));

        let ty = TypeDescriptor::from_type_name(&TypeName::new("timestamptz")).unwrap();
        assert!(ty.with_time_zone);
    }

    #[test]
    fn test_from_type_name_errors() {
        assert!(matches!(
            TypeDescriptor::from_type_name(&TypeName::new("widget")),
            Err(IrError::UnknownType(_))
        ));
        assert!(matches!(
            TypeDescriptor::from_type_name(&TypeName::new("numeric").with_modifiers(vec![2, 5])),
            Err(IrError::InvalidTypeModifier(_))
        ));
        assert!(matches!(
            TypeDescriptor::from_type_name(&TypeName::new("date").with_modifiers(vec![1])),
            Err(IrError::InvalidTypeModifier(_))
        ));
    }

    #[test]
    fn test_promote_numeric_widening() {
        let int = TypeDescriptor::new(TypeKind::Integer);
        let big = TypeDescriptor::new(TypeKind::BigInt);
        let dbl = TypeDescriptor::new(TypeKind::Double);
        assert_eq!(int.promote(&big).kind, TypeKind::BigInt);
        assert_eq!(big.promote(&int).kind, TypeKind::BigInt);
        assert_eq!(int.promote(&dbl).kind, TypeKind::Double);
    }

    #[test]
    fn test_promote_unknown_takes_other_side() {
        let unknown = TypeDescriptor::unknown();
        let date = TypeDescriptor::new(TypeKind::Date);
        assert_eq!(unknown.promote(&date), date);
        assert_eq!(date.promote(&TypeDescriptor::new(TypeKind::Null)), date);
    }

    #[test]
    fn test_promote_character_and_temporal() {
        let a = TypeDescriptor::varchar(10);
        let b = TypeDescriptor::new(TypeKind::Char).with_length(20);
        let merged = a.promote(&b);
        assert_eq!(merged.kind, TypeKind::Varchar);
        assert_eq!(merged.length, Some(20));

        let date = TypeDescriptor::new(TypeKind::Date);
        let interval = TypeDescriptor::new(TypeKind::Interval);
        assert_eq!(date.promote(&interval).kind, TypeKind::Timestamp);

        let int = TypeDescriptor::new(TypeKind::Integer);
        assert_eq!(a.promote(&int).kind, TypeKind::Integer);
    }

    #[test]
    fn test_literal_types() {
        assert_eq!(TypeDescriptor::for_literal(LiteralKind::Integer, "42").kind, TypeKind::Integer);
        assert_eq!(
            TypeDescriptor::for_literal(LiteralKind::Integer, "9999999999").kind,
            TypeKind::BigInt
        );
        assert_eq!(TypeDescriptor::for_literal(LiteralKind::String, "abc").length, Some(3));
        assert!(!TypeDescriptor::for_literal(LiteralKind::Parameter, "$1").is_known());
    }
}
