// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Clauses shared by several statement shapes.

use wh_ddl::field::Role;
use wh_ddl::validation::{err_invalid_value, is_true};
use wh_ddl::{
    AccountObjectIdentifier, DatabaseObjectIdentifier, Field, Options, SchemaObjectIdentifier,
    ValidationErrors, Value, sql_keyword_enum,
};

/// `LIKE '<pattern>'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Like {
    pub pattern: String,
}

impl Like {
    pub fn new(pattern: impl Into<String>) -> Self {
        Like {
            pattern: pattern.into(),
        }
    }
}

impl Options for Like {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("LIKE"),
            Field::value(Some(&self.pattern)).single_quotes(),
        ]
    }
}

/// `STARTS WITH '<prefix>'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartsWith {
    pub prefix: String,
}

impl Options for StartsWith {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("STARTS WITH"),
            Field::value(Some(&self.prefix)).single_quotes(),
        ]
    }
}

/// The scope of a `SHOW` statement. Exactly one scope can be named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum In {
    Account,
    Database(AccountObjectIdentifier),
    Schema(DatabaseObjectIdentifier),
}

impl Options for In {
    fn fields(&self) -> Vec<Field<'_>> {
        match self {
            In::Account => vec![Field::fixed("IN ACCOUNT")],
            In::Database(id) => vec![Field::fixed("IN DATABASE"), Field::identifier(id)],
            In::Schema(id) => vec![Field::fixed("IN SCHEMA"), Field::identifier(id)],
        }
    }

    fn check(&self, errs: &mut ValidationErrors) {
        match self {
            In::Account => {}
            In::Database(id) => errs.identifier("in.database", id),
            In::Schema(id) => errs.identifier("in.schema", id),
        }
    }
}

/// `LIMIT <rows> [FROM '<name>']`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitFrom {
    pub rows: i32,
    pub from: Option<String>,
}

impl LimitFrom {
    pub fn new(rows: i32) -> Self {
        LimitFrom { rows, from: None }
    }
}

impl Options for LimitFrom {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::parameter("LIMIT", Some(&self.rows)).no_equals(),
            Field::parameter("FROM", self.from.as_ref())
                .no_equals()
                .single_quotes(),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.check(self.rows < 0, || {
            err_invalid_value("LimitFrom", "rows", "must not be negative")
        });
    }
}

/// One `<tag> = '<value>'` pair of a `WITH TAG (...)` or `SET TAG` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAssociation {
    pub name: SchemaObjectIdentifier,
    pub value: String,
}

impl TagAssociation {
    pub fn new(name: SchemaObjectIdentifier, value: impl Into<String>) -> Self {
        TagAssociation {
            name,
            value: value.into(),
        }
    }
}

impl Options for TagAssociation {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::identifier(&self.name),
            Field::fixed("="),
            Field::value(Some(&self.value)).single_quotes(),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("tag.name", &self.name);
    }
}

sql_keyword_enum! {
    /// What happens to dependent objects when an object is dropped.
    pub enum DropBehavior {
        Cascade => "CASCADE",
        Restrict => "RESTRICT",
    }
}

/// A comma-separated list of the names whose flag is present and true, as
/// in `UNSET COMMENT, DATA_RETENTION_TIME_IN_DAYS`. Renders nothing when no
/// flag is true.
pub fn flag_list<'a>(flags: &[(&'static str, Option<bool>)]) -> Field<'a> {
    let names = flags
        .iter()
        .filter(|(_, flag)| is_true(*flag))
        .map(|(name, _)| Value::Keyword(*name))
        .collect();
    Field::new(Role::List(None), Some(Value::List(names))).no_parentheses()
}

/// Whether any flag of an `UNSET`-style record is present and true.
pub fn any_flag_true(flags: &[Option<bool>]) -> bool {
    flags.iter().copied().any(is_true)
}

#[cfg(test)]
mod tests {
    use wh_ddl::{ValidationError, compile, validate};

    use super::*;

    #[test]
    fn renders_filters() {
        assert_eq!(compile(&Like::new("seq%")).unwrap(), "LIKE 'seq%'");
        assert_eq!(
            compile(&StartsWith {
                prefix: "TMP_".into()
            })
            .unwrap(),
            "STARTS WITH 'TMP_'"
        );
        assert_eq!(compile(&In::Account).unwrap(), "IN ACCOUNT");
        assert_eq!(
            compile(&In::Schema(DatabaseObjectIdentifier::new("db", "sch"))).unwrap(),
            r#"IN SCHEMA "db"."sch""#
        );
    }

    #[test]
    fn renders_limit() {
        assert_eq!(compile(&LimitFrom::new(0)).unwrap(), "LIMIT 0");
        let limit = LimitFrom {
            rows: 10,
            from: Some("name_a".into()),
        };
        assert_eq!(compile(&limit).unwrap(), "LIMIT 10 FROM 'name_a'");
        assert!(validate(&LimitFrom::new(-1)).is_err());
    }

    #[test]
    fn tag_names_must_be_valid() {
        let tag = TagAssociation::new(SchemaObjectIdentifier::new("db", "sch", "cost"), "eng");
        assert_eq!(compile(&tag).unwrap(), r#""db"."sch"."cost" = 'eng'"#);

        let bad = TagAssociation::new(SchemaObjectIdentifier::new("db", "", "cost"), "eng");
        let errs = validate(&bad).unwrap_err();
        assert_eq!(
            errs.iter().collect::<Vec<_>>(),
            vec![&ValidationError::InvalidIdentifier { field: "tag.name" }]
        );
    }

    #[test]
    fn flag_lists_render_true_flags_only() {
        #[derive(Debug)]
        struct Unset {
            a: Option<bool>,
            b: Option<bool>,
            c: Option<bool>,
        }
        impl Options for Unset {
            fn fields(&self) -> Vec<Field<'_>> {
                vec![
                    Field::fixed("UNSET"),
                    flag_list(&[("A", self.a), ("B", self.b), ("C", self.c)]),
                ]
            }
        }
        let unset = Unset {
            a: Some(true),
            b: Some(false),
            c: Some(true),
        };
        assert_eq!(compile(&unset).unwrap(), "UNSET A, C");
        assert!(any_flag_true(&[unset.a, unset.b]));
        assert!(!any_flag_true(&[None, Some(false)]));
    }

    #[test]
    fn scope_identifiers_are_checked() {
        let errs = validate(&In::Database(AccountObjectIdentifier::new(""))).unwrap_err();
        assert_eq!(errs.to_string(), "invalid object identifier: in.database");
    }
}
