// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Turns an options record into SQL text.
//!
//! The compiler performs no semantic checks: an options record is expected
//! to have passed [`crate::validation::validate`] first. The only failures
//! reported here are role/value combinations that have no rendering, which
//! indicate a mistake in the record's field table rather than in the input.

use std::fmt;

use thiserror::Error;

use crate::field::{Field, Parens, Role, Value};
use crate::validation::ValidationErrors;

/// An in-memory description of one SQL statement (or one clause of one).
pub trait Options: fmt::Debug {
    /// The record's fields, in the order they appear in the statement.
    fn fields(&self) -> Vec<Field<'_>>;

    /// Checks invariants local to this record. Records nested in
    /// [`Options::fields`] are checked by [`crate::validation::validate`]
    /// without this method having to recurse into them.
    fn check(&self, _errs: &mut ValidationErrors) {}
}

/// An absent record renders nothing and fails validation.
impl<T: Options> Options for Option<T> {
    fn fields(&self) -> Vec<Field<'_>> {
        match self {
            Some(opts) => opts.fields(),
            None => vec![],
        }
    }

    fn check(&self, errs: &mut ValidationErrors) {
        match self {
            Some(opts) => opts.check(errs),
            None => errs.push(crate::validation::ValidationError::NilOptions),
        }
    }
}

impl<T: Options + ?Sized> Options for &T {
    fn fields(&self) -> Vec<Field<'_>> {
        (**self).fields()
    }

    fn check(&self, errs: &mut ValidationErrors) {
        (**self).check(errs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("{role} field cannot render a {value} value")]
    UnsupportedValue { role: String, value: &'static str },
    #[error("{role} field with a boolean value requires SQL text")]
    MissingText { role: String },
}

impl RenderError {
    fn unsupported(role: &Role, value: &Value<'_>) -> Self {
        RenderError::UnsupportedValue {
            role: role.to_string(),
            value: value.kind(),
        }
    }
}

/// Compiles `opts` into a single statement.
pub fn compile<O: Options + ?Sized>(opts: &O) -> Result<String, RenderError> {
    let tokens = render_fields(&opts.fields())?;
    Ok(tokens.join(" ").trim().to_string())
}

fn render_fields(fields: &[Field<'_>]) -> Result<Vec<String>, RenderError> {
    let mut tokens = Vec::with_capacity(fields.len());
    for field in fields {
        if let Some(token) = render_field(field)? {
            if !token.is_empty() {
                tokens.push(token);
            }
        }
    }
    Ok(tokens)
}

fn render_field(field: &Field<'_>) -> Result<Option<String>, RenderError> {
    let Field {
        role,
        modifiers,
        value,
    } = field;

    match (role, value) {
        (Role::Static(sql), _) => Ok(Some(sql.to_string())),
        (_, None) => Ok(None),
        (Role::Keyword(sql), Some(value)) => match value {
            Value::Bool(false) => Ok(None),
            Value::Bool(true) => match sql {
                Some(sql) => Ok(Some(sql.to_string())),
                None => Err(RenderError::MissingText {
                    role: role.to_string(),
                }),
            },
            Value::Ident(_) | Value::List(_) => Err(RenderError::unsupported(role, value)),
            Value::Record(record) => {
                let inner = compile(*record)?;
                let inner = match modifiers.parens {
                    Some(Parens::IfNonEmpty | Parens::Always) => format!("({})", inner),
                    _ => inner,
                };
                Ok(Some(prefix(*sql, false, inner)))
            }
            scalar => Ok(Some(prefix(
                *sql,
                false,
                render_scalar(role, scalar, modifiers.quotes)?,
            ))),
        },
        (Role::Parameter(name), Some(value)) => {
            let equals = modifiers.equals.unwrap_or(true);
            let rendered = match value {
                Value::List(items) => {
                    let items = render_items(role, items, modifiers.quotes)?;
                    format!("({})", items.join(modifiers.separator.as_str()))
                }
                Value::Record(record) => {
                    let inner = compile(*record)?;
                    match modifiers.parens {
                        Some(Parens::IfNonEmpty | Parens::Always) => format!("({})", inner),
                        _ => inner,
                    }
                }
                scalar => {
                    let s = render_scalar(role, scalar, modifiers.quotes)?;
                    match modifiers.parens {
                        Some(Parens::IfNonEmpty | Parens::Always) => format!("({})", s),
                        _ => s,
                    }
                }
            };
            Ok(Some(prefix(*name, equals, rendered)))
        }
        (Role::Identifier(name), Some(value)) => match value {
            Value::Ident(ident) => Ok(Some(prefix(
                *name,
                modifiers.equals.unwrap_or(false),
                ident.clone(),
            ))),
            _ => Err(RenderError::unsupported(role, value)),
        },
        (Role::List(name), Some(value)) => match value {
            Value::List(items) => {
                let parens = modifiers.parens.unwrap_or(Parens::IfNonEmpty);
                if items.is_empty() && parens != Parens::Always {
                    return Ok(None);
                }
                let joined = render_items(role, items, modifiers.quotes)?
                    .join(modifiers.separator.as_str());
                let rendered = match parens {
                    Parens::Never => joined,
                    Parens::IfNonEmpty | Parens::Always => format!("({})", joined),
                };
                Ok(Some(prefix(
                    *name,
                    modifiers.equals.unwrap_or(false),
                    rendered,
                )))
            }
            _ => Err(RenderError::unsupported(role, value)),
        },
    }
}

fn prefix(name: Option<&'static str>, equals: bool, rendered: String) -> String {
    match name {
        Some(name) if equals => format!("{} = {}", name, rendered),
        Some(name) if rendered.is_empty() => name.to_string(),
        Some(name) => format!("{} {}", name, rendered),
        None => rendered,
    }
}

fn render_items(
    role: &Role,
    items: &[Value<'_>],
    quotes: crate::field::Quotes,
) -> Result<Vec<String>, RenderError> {
    items
        .iter()
        .map(|item| match item {
            Value::Record(record) => compile(*record),
            Value::List(_) => Err(RenderError::unsupported(role, item)),
            scalar => render_scalar(role, scalar, quotes),
        })
        .collect()
}

fn render_scalar(
    role: &Role,
    value: &Value<'_>,
    quotes: crate::field::Quotes,
) -> Result<String, RenderError> {
    Ok(match value {
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Text(s) => quotes.apply(s),
        Value::Keyword(s) => quotes.apply(s),
        Value::Ident(s) => s.clone(),
        Value::List(_) | Value::Record(_) => return Err(RenderError::unsupported(role, value)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{AccountObjectIdentifier, SchemaObjectIdentifier};

    #[derive(Debug, Default)]
    struct Inner {
        a: Option<i32>,
        b: Option<String>,
    }

    impl Options for Inner {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![
                Field::parameter("A", self.a.as_ref()),
                Field::parameter("B", self.b.as_ref()).single_quotes(),
            ]
        }
    }

    #[derive(Debug)]
    struct Outer {
        name: SchemaObjectIdentifier,
        if_exists: Option<bool>,
        rename_to: Option<SchemaObjectIdentifier>,
        set: Option<Inner>,
        columns: Vec<String>,
        args: Vec<String>,
        tags: Vec<Inner>,
    }

    impl Default for Outer {
        fn default() -> Self {
            Outer {
                name: SchemaObjectIdentifier::new("db", "sch", "obj"),
                if_exists: None,
                rename_to: None,
                set: None,
                columns: vec![],
                args: vec![],
                tags: vec![],
            }
        }
    }

    impl Options for Outer {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![
                Field::fixed("ALTER THING"),
                Field::keyword("IF EXISTS", self.if_exists),
                Field::identifier(&self.name),
                Field::list(None, &self.args).must_parentheses(),
                Field::named_identifier("RENAME TO", self.rename_to.as_ref()),
                Field::record(Some("SET"), self.set.as_ref()),
                Field::list(Some("COLUMNS"), &self.columns).double_quotes(),
                Field::record_list(Some("WITH TAG"), &self.tags),
            ]
        }
    }

    #[test]
    fn renders_bare_statement() {
        assert_eq!(
            compile(&Outer::default()).unwrap(),
            r#"ALTER THING "db"."sch"."obj" ()"#
        );
    }

    #[test]
    fn renders_in_declared_order() {
        let opts = Outer {
            set: Some(Inner {
                a: Some(0),
                b: Some("x".into()),
            }),
            if_exists: Some(true),
            rename_to: Some(SchemaObjectIdentifier::new("db", "sch", "new")),
            columns: vec!["c1".into(), "c2".into()],
            args: vec!["1".into()],
            ..Default::default()
        };
        assert_eq!(
            compile(&opts).unwrap(),
            r#"ALTER THING IF EXISTS "db"."sch"."obj" (1) RENAME TO "db"."sch"."new" SET A = 0 B = 'x' COLUMNS ("c1", "c2")"#
        );
        assert_eq!(compile(&opts).unwrap(), compile(&opts).unwrap());
    }

    #[test]
    fn absence_differs_from_zero() {
        let absent = Outer {
            set: Some(Inner::default()),
            ..Default::default()
        };
        let zero = Outer {
            set: Some(Inner {
                a: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            compile(&absent).unwrap(),
            r#"ALTER THING "db"."sch"."obj" () SET"#
        );
        assert_eq!(
            compile(&zero).unwrap(),
            r#"ALTER THING "db"."sch"."obj" () SET A = 0"#
        );

        let false_flag = Outer {
            if_exists: Some(false),
            ..Default::default()
        };
        assert_eq!(
            compile(&false_flag).unwrap(),
            compile(&Outer::default()).unwrap()
        );
    }

    #[test]
    fn renders_record_lists() {
        let opts = Outer {
            tags: vec![
                Inner {
                    a: Some(1),
                    b: None,
                },
                Inner {
                    a: None,
                    b: Some("v".into()),
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            compile(&opts).unwrap(),
            r#"ALTER THING "db"."sch"."obj" () WITH TAG (A = 1, B = 'v')"#
        );
    }

    #[test]
    fn parameter_modifiers() {
        #[derive(Debug)]
        struct P {
            size: Option<String>,
            count: Option<u32>,
            enabled: Option<bool>,
            values: Vec<String>,
            target: Option<AccountObjectIdentifier>,
        }
        impl Options for P {
            fn fields(&self) -> Vec<Field<'_>> {
                vec![
                    Field::parameter("SIZE", self.size.as_ref()).single_quotes(),
                    Field::parameter("COUNT", self.count.as_ref()).no_equals(),
                    Field::parameter("ENABLED", self.enabled.as_ref()),
                    Field::parameter("VALUES", Some(&self.values)).single_quotes(),
                    Field::parameter("WAREHOUSE", self.target.as_ref()),
                    Field::named_identifier("OWNER", self.target.as_ref()).equals(),
                ]
            }
        }
        let p = P {
            size: Some("XSMALL".into()),
            count: Some(3),
            enabled: Some(false),
            values: vec!["a".into(), "b".into()],
            target: Some(AccountObjectIdentifier::new("wh")),
        };
        assert_eq!(
            compile(&p).unwrap(),
            r#"SIZE = 'XSMALL' COUNT 3 ENABLED = false VALUES = ('a', 'b') WAREHOUSE = "wh" OWNER = "wh""#
        );
    }

    #[test]
    fn unsupported_combinations_are_errors() {
        #[derive(Debug)]
        struct Bad(String);
        impl Options for Bad {
            fn fields(&self) -> Vec<Field<'_>> {
                vec![Field::new(
                    Role::Identifier(None),
                    Some(Value::Text(self.0.as_str().into())),
                )]
            }
        }
        assert_eq!(
            compile(&Bad("x".into())),
            Err(RenderError::UnsupportedValue {
                role: "identifier".into(),
                value: "text",
            })
        );

        #[derive(Debug)]
        struct NoText;
        impl Options for NoText {
            fn fields(&self) -> Vec<Field<'_>> {
                vec![Field::new(Role::Keyword(None), Some(Value::Bool(true)))]
            }
        }
        assert_eq!(
            compile(&NoText),
            Err(RenderError::MissingText {
                role: "keyword".into()
            })
        );
    }

    #[test]
    fn static_text_ignores_value_and_absent_values_render_nothing() {
        #[derive(Debug)]
        struct Mixed;
        impl Options for Mixed {
            fn fields(&self) -> Vec<Field<'_>> {
                vec![
                    Field::new(Role::Static("BEGIN"), Some(Value::Bool(false))),
                    Field::new(Role::Keyword(Some("SKIPPED")), None),
                    Field::new(Role::Parameter(Some("P")), None),
                    Field::new(Role::Identifier(Some("ID")), None),
                    Field::new(Role::List(Some("L")), None),
                    Field::fixed("END"),
                ]
            }
        }
        assert_eq!(compile(&Mixed).unwrap(), "BEGIN END");
        assert!(crate::validation::validate(&Mixed).is_ok());
    }

    #[test]
    fn absent_option_renders_nothing() {
        let none: Option<Outer> = None;
        assert_eq!(compile(&none).unwrap(), "");
    }
}
