// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Presence predicates and the errors reported when an options record holds
//! an invalid combination of fields.
//!
//! Each record lists its own fields explicitly when calling a predicate:
//!
//! ```ignore
//! if !exactly_one_value_set(&[&self.rename_to, &self.set, &self.unset]) {
//!     errs.push(err_exactly_one_of("AlterSequenceOptions", &["rename_to", "set", "unset"]));
//! }
//! ```
//!
//! All violations found in one record, and in every record nested inside it,
//! are collected into a single [`ValidationErrors`].

use std::fmt;

use thiserror::Error;

use crate::compile::Options;
use crate::field::Value;
use crate::identifier::{
    AccountIdentifier, AccountObjectIdentifier, DatabaseObjectIdentifier,
    ExternalObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier, TableColumnIdentifier,
};

/// The closed set of error kinds, for comparing errors without matching on
/// their payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NilOptions,
    InvalidIdentifier,
    OneOf,
    ExactlyOneOf,
    AtLeastOneOf,
    NotSet,
    InvalidValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("options cannot be nil")]
    NilOptions,
    #[error("invalid object identifier: {field}")]
    InvalidIdentifier { field: &'static str },
    #[error("{record} fields: [{}] are incompatible and cannot be set at the same time", .fields.join(", "))]
    OneOf {
        record: &'static str,
        fields: Vec<&'static str>,
    },
    #[error("exactly one of {record} fields [{}] must be set", .fields.join(", "))]
    ExactlyOneOf {
        record: &'static str,
        fields: Vec<&'static str>,
    },
    #[error("at least one of {record} fields [{}] must be set", .fields.join(", "))]
    AtLeastOneOf {
        record: &'static str,
        fields: Vec<&'static str>,
    },
    #[error("{record} fields: [{}] should be set", .fields.join(", "))]
    NotSet {
        record: &'static str,
        fields: Vec<&'static str>,
    },
    #[error("{record}.{field}: {reason}")]
    InvalidValue {
        record: &'static str,
        field: &'static str,
        reason: String,
    },
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::NilOptions => ErrorKind::NilOptions,
            ValidationError::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
            ValidationError::OneOf { .. } => ErrorKind::OneOf,
            ValidationError::ExactlyOneOf { .. } => ErrorKind::ExactlyOneOf,
            ValidationError::AtLeastOneOf { .. } => ErrorKind::AtLeastOneOf,
            ValidationError::NotSet { .. } => ErrorKind::NotSet,
            ValidationError::InvalidValue { .. } => ErrorKind::InvalidValue,
        }
    }
}

/// Every violation found while validating one options record, in the order
/// they were found. Violations are deduplicated per record: a nested record
/// that repeats an error raised by a sibling still contributes its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `err` unless an identical error was already recorded.
    pub fn push(&mut self, err: ValidationError) {
        if !self.0.contains(&err) {
            self.0.push(err);
        }
    }

    /// Records `err` when `violated` holds.
    pub fn check(&mut self, violated: bool, err: impl FnOnce() -> ValidationError) {
        if violated {
            self.push(err());
        }
    }

    /// Records an invalid identifier error unless `ident` is valid.
    pub fn identifier<I: ObjectIdentifier + ?Sized>(&mut self, field: &'static str, ident: &I) {
        if !ident.is_valid() {
            self.push(ValidationError::InvalidIdentifier { field });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.0.iter().any(|e| e.kind() == kind)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        ValidationErrors(vec![err])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Validates `opts` and every record nested in its field table.
pub fn validate<O: Options + ?Sized>(opts: &O) -> Result<(), ValidationErrors> {
    let mut errs = ValidationErrors::new();
    collect(opts, &mut errs);
    errs.into_result()
}

// Each record's own errors are deduplicated, but two records reporting the
// same violation are both kept.
fn collect<O: Options + ?Sized>(opts: &O, errs: &mut ValidationErrors) {
    let mut own = ValidationErrors::new();
    opts.check(&mut own);
    errs.0.extend(own.0);
    for field in opts.fields() {
        if let Some(value) = &field.value {
            collect_value(value, errs);
        }
    }
}

fn collect_value(value: &Value<'_>, errs: &mut ValidationErrors) {
    match value {
        Value::Record(record) => collect(*record, errs),
        Value::List(items) => {
            for item in items {
                collect_value(item, errs);
            }
        }
        _ => {}
    }
}

/// Whether a field counts as "set": present, and non-empty for collections.
pub trait IsSet {
    fn is_set(&self) -> bool;
}

impl<T: IsSet> IsSet for Option<T> {
    fn is_set(&self) -> bool {
        matches!(self, Some(v) if v.is_set())
    }
}

impl<T> IsSet for Vec<T> {
    fn is_set(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: IsSet + ?Sized> IsSet for &T {
    fn is_set(&self) -> bool {
        (**self).is_set()
    }
}

/// Marks types as set whenever they are present, whatever their value.
///
/// Options records nested in other records use this so the counting
/// predicates can see them.
#[macro_export]
macro_rules! impl_is_set {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::validation::IsSet for $ty {
                fn is_set(&self) -> bool {
                    true
                }
            }
        )*
    };
}

impl_is_set!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f64,
    String,
    AccountIdentifier,
    AccountObjectIdentifier,
    DatabaseObjectIdentifier,
    SchemaObjectIdentifier,
    TableColumnIdentifier,
    ExternalObjectIdentifier
);

pub fn value_set(v: &dyn IsSet) -> bool {
    v.is_set()
}

pub fn any_value_set(values: &[&dyn IsSet]) -> bool {
    values.iter().any(|v| v.is_set())
}

pub fn every_value_set(values: &[&dyn IsSet]) -> bool {
    values.iter().all(|v| v.is_set())
}

pub fn exactly_one_value_set(values: &[&dyn IsSet]) -> bool {
    values.iter().filter(|v| v.is_set()).count() == 1
}

/// Whether a keyword flag is present and true.
pub fn is_true(flag: Option<bool>) -> bool {
    flag == Some(true)
}

pub fn err_one_of(record: &'static str, fields: &[&'static str]) -> ValidationError {
    ValidationError::OneOf {
        record,
        fields: fields.to_vec(),
    }
}

pub fn err_exactly_one_of(record: &'static str, fields: &[&'static str]) -> ValidationError {
    ValidationError::ExactlyOneOf {
        record,
        fields: fields.to_vec(),
    }
}

pub fn err_at_least_one_of(record: &'static str, fields: &[&'static str]) -> ValidationError {
    ValidationError::AtLeastOneOf {
        record,
        fields: fields.to_vec(),
    }
}

pub fn err_not_set(record: &'static str, fields: &[&'static str]) -> ValidationError {
    ValidationError::NotSet {
        record,
        fields: fields.to_vec(),
    }
}

pub fn err_invalid_value(
    record: &'static str,
    field: &'static str,
    reason: impl Into<String>,
) -> ValidationError {
    ValidationError::InvalidValue {
        record,
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    #[test]
    fn presence_is_not_truthiness() {
        assert!(value_set(&Some(false)));
        assert!(value_set(&Some(0)));
        assert!(!value_set(&None::<i32>));
        assert!(!value_set(&Some(Vec::<String>::new())));
        assert!(value_set(&vec![1]));
        assert!(is_true(Some(true)));
        assert!(!is_true(Some(false)));
        assert!(!is_true(None));
    }

    #[test]
    fn counting_predicates() {
        let a = Some(1);
        let b: Option<String> = None;
        let c = Some(String::new());
        assert!(any_value_set(&[&a, &b]));
        assert!(!any_value_set(&[&b]));
        assert!(every_value_set(&[&a, &c]));
        assert!(!every_value_set(&[&a, &b]));
        assert!(exactly_one_value_set(&[&a, &b]));
        assert!(!exactly_one_value_set(&[&a, &b, &c]));
        assert!(!exactly_one_value_set(&[&b]));
    }

    #[test]
    fn messages_name_the_fields() {
        assert_eq!(
            err_one_of("CreateSequenceOptions", &["or_replace", "if_not_exists"]).to_string(),
            "CreateSequenceOptions fields: [or_replace, if_not_exists] are incompatible and cannot be set at the same time"
        );
        assert_eq!(
            err_exactly_one_of("AlterSequenceOptions", &["rename_to", "set"]).to_string(),
            "exactly one of AlterSequenceOptions fields [rename_to, set] must be set"
        );
        assert_eq!(
            err_at_least_one_of("SequenceSet", &["values_behavior", "comment"]).to_string(),
            "at least one of SequenceSet fields [values_behavior, comment] must be set"
        );
        assert_eq!(
            err_not_set("CreateViewOptions", &["sql"]).to_string(),
            "CreateViewOptions fields: [sql] should be set"
        );
    }

    #[test]
    fn errors_aggregate_without_duplicates() {
        let mut errs = ValidationErrors::new();
        errs.push(ValidationError::NilOptions);
        errs.push(ValidationError::InvalidIdentifier { field: "name" });
        errs.push(ValidationError::NilOptions);
        assert_eq!(errs.len(), 2);
        assert_eq!(
            errs.to_string(),
            "options cannot be nil\ninvalid object identifier: name"
        );
        assert!(errs.contains_kind(ErrorKind::InvalidIdentifier));
        assert!(!errs.contains_kind(ErrorKind::OneOf));
    }

    #[derive(Debug, Default)]
    struct Leaf {
        x: Option<i32>,
        y: Option<i32>,
    }

    impl Options for Leaf {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![
                Field::parameter("X", self.x.as_ref()),
                Field::parameter("Y", self.y.as_ref()),
            ]
        }

        fn check(&self, errs: &mut ValidationErrors) {
            errs.check(!any_value_set(&[&self.x, &self.y]), || {
                err_at_least_one_of("Leaf", &["x", "y"])
            });
        }
    }

    #[derive(Debug, Default)]
    struct Root {
        name: AccountObjectIdentifier,
        set: Option<Leaf>,
        items: Vec<Leaf>,
    }

    impl Options for Root {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![
                Field::fixed("ROOT"),
                Field::identifier(&self.name),
                Field::record(Some("SET"), self.set.as_ref()),
                Field::record_list(None, &self.items),
            ]
        }

        fn check(&self, errs: &mut ValidationErrors) {
            errs.identifier("name", &self.name);
        }
    }

    #[test]
    fn validation_recurses_into_nested_records() {
        let root = Root {
            name: AccountObjectIdentifier::new("r"),
            set: Some(Leaf::default()),
            items: vec![
                Leaf {
                    x: Some(1),
                    y: None,
                },
                Leaf::default(),
            ],
        };
        let errs = validate(&root).unwrap_err();
        // The nested set and the second list item each report a violation.
        assert_eq!(
            errs.into_iter().collect::<Vec<_>>(),
            vec![
                err_at_least_one_of("Leaf", &["x", "y"]),
                err_at_least_one_of("Leaf", &["x", "y"]),
            ]
        );
    }

    #[test]
    fn one_record_reports_each_violation_once() {
        #[derive(Debug)]
        struct Twice;
        impl Options for Twice {
            fn fields(&self) -> Vec<Field<'_>> {
                vec![]
            }

            fn check(&self, errs: &mut ValidationErrors) {
                errs.push(ValidationError::NilOptions);
                errs.push(ValidationError::NilOptions);
            }
        }
        assert_eq!(validate(&Twice).unwrap_err().len(), 1);

        let items = Root {
            name: AccountObjectIdentifier::new("r"),
            items: vec![Leaf::default(), Leaf::default(), Leaf::default()],
            ..Default::default()
        };
        assert_eq!(validate(&items).unwrap_err().len(), 3);
    }

    #[test]
    fn validation_reports_all_violations() {
        let root = Root {
            set: Some(Leaf::default()),
            ..Default::default()
        };
        let errs = validate(&root).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert_eq!(
            errs.iter().map(|e| e.kind()).collect::<Vec<_>>(),
            vec![ErrorKind::InvalidIdentifier, ErrorKind::AtLeastOneOf]
        );
    }

    #[test]
    fn absent_options_fail() {
        let none: Option<Root> = None;
        assert_eq!(
            validate(&none),
            Err(ValidationErrors::from(ValidationError::NilOptions))
        );
        let some = Some(Root {
            name: AccountObjectIdentifier::new("r"),
            ..Default::default()
        });
        assert_eq!(validate(&some), Ok(()));
    }
}
