// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Integration tests for type descriptors

use sqlgrid_ir::{Dialect, TypeDescriptor, TypeKind, TypeName};

#[test]
fn test_cast_target_renders_in_both_dialects() {
    let ty = TypeDescriptor::from_type_name(&TypeName::new("double precision")).unwrap();
    assert_eq!(ty.kind, TypeKind::Double);
    assert_eq!(ty.render(Dialect::PostgreSQL), "DOUBLE PRECISION");
    assert_eq!(ty.render(Dialect::MySQL), "DOUBLE");
}

#[test]
fn test_time_precision_and_zone() {
    let mut name = TypeName::new("time").with_modifiers(vec![3]);
    name.with_time_zone = true;
    let ty = TypeDescriptor::from_type_name(&name).unwrap();
    assert_eq!(ty.render(Dialect::PostgreSQL), "TIME(3) WITH TIME ZONE");
}

#[test]
fn test_float_precision_picks_real_or_double() {
    let real = TypeDescriptor::from_type_name(&TypeName::new("float").with_modifiers(vec![10]))
        .unwrap();
    let double = TypeDescriptor::from_type_name(&TypeName::new("float").with_modifiers(vec![40]))
        .unwrap();
    assert_eq!(real.kind, TypeKind::Real);
    assert_eq!(double.kind, TypeKind::Double);
}

#[test]
fn test_display_uses_postgres_spelling() {
    let ty = TypeDescriptor::new(TypeKind::Binary);
    assert_eq!(ty.to_string(), "BYTEA");
}

#[test]
fn test_promote_is_symmetric_for_numbers() {
    let kinds = [
        TypeKind::SmallInt,
        TypeKind::Integer,
        TypeKind::BigInt,
        TypeKind::Numeric,
        TypeKind::Real,
        TypeKind::Double,
    ];
    for a in kinds {
        for b in kinds {
            let left = TypeDescriptor::new(a).promote(&TypeDescriptor::new(b));
            let right = TypeDescriptor::new(b).promote(&TypeDescriptor::new(a));
            assert_eq!(left.kind, right.kind, "{a:?} vs {b:?}");
        }
    }
}
