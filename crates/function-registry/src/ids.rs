// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Stable numeric function ids
//!
//! The planner and executor switch on these values, so they are part of the
//! analyzer's output contract.

/// Numeric function identifier
pub type FunctionId = u32;

/// Any function the registry does not know, passed through by name
pub const CUSTOM_ID: FunctionId = 9999;

// Aggregates
pub const COUNT: FunctionId = 1;
pub const SUM: FunctionId = 2;
pub const AVG: FunctionId = 3;
pub const MIN: FunctionId = 4;
pub const MAX: FunctionId = 5;
pub const STDDEV: FunctionId = 6;
pub const STDDEV_POP: FunctionId = 7;
pub const STDDEV_SAMP: FunctionId = 8;
pub const VARIANCE: FunctionId = 9;
pub const VAR_POP: FunctionId = 10;
pub const VAR_SAMP: FunctionId = 11;
pub const BOOL_AND: FunctionId = 12;
pub const BOOL_OR: FunctionId = 13;
pub const EVERY: FunctionId = 14;
pub const BIT_AND: FunctionId = 15;
pub const BIT_OR: FunctionId = 16;

// Keyword-shaped calls
pub const CASE: FunctionId = 100;
pub const CAST: FunctionId = 101;
pub const CONVERT: FunctionId = 102;
pub const TRIM: FunctionId = 103;
pub const EXTRACT: FunctionId = 104;
pub const SUBSTRING: FunctionId = 105;
pub const OVERLAY: FunctionId = 106;
pub const POSITION: FunctionId = 107;
pub const COALESCE: FunctionId = 108;
pub const NULLIF: FunctionId = 109;
pub const GREATEST: FunctionId = 110;
pub const LEAST: FunctionId = 111;

// Strings
pub const UPPER: FunctionId = 200;
pub const LOWER: FunctionId = 201;
pub const LENGTH: FunctionId = 202;
pub const CHAR_LENGTH: FunctionId = 203;
pub const CONCAT: FunctionId = 204;
pub const REPLACE: FunctionId = 205;
pub const LTRIM: FunctionId = 206;
pub const RTRIM: FunctionId = 207;
pub const LPAD: FunctionId = 208;
pub const RPAD: FunctionId = 209;
pub const SPLIT_PART: FunctionId = 210;
pub const INITCAP: FunctionId = 211;
pub const REPEAT: FunctionId = 212;
pub const REVERSE: FunctionId = 213;
pub const MD5: FunctionId = 214;
pub const ASCII: FunctionId = 215;
pub const CHR: FunctionId = 216;

// Math
pub const ABS: FunctionId = 300;
pub const CEIL: FunctionId = 301;
pub const FLOOR: FunctionId = 302;
pub const ROUND: FunctionId = 303;
pub const TRUNC: FunctionId = 304;
pub const MOD: FunctionId = 305;
pub const POWER: FunctionId = 306;
pub const SQRT: FunctionId = 307;
pub const CBRT: FunctionId = 308;
pub const EXP: FunctionId = 309;
pub const LN: FunctionId = 310;
pub const LOG: FunctionId = 311;
pub const SIGN: FunctionId = 312;
pub const PI: FunctionId = 313;
pub const RANDOM: FunctionId = 314;

// Date and time
pub const NOW: FunctionId = 400;
pub const CURRENT_DATE: FunctionId = 401;
pub const CURRENT_TIMESTAMP: FunctionId = 402;
pub const DATE_TRUNC: FunctionId = 403;
pub const DATE_PART: FunctionId = 404;
pub const AGE: FunctionId = 405;
pub const TO_CHAR: FunctionId = 406;
pub const TO_DATE: FunctionId = 407;
pub const TO_TIMESTAMP: FunctionId = 408;
