// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The vocabulary used to describe how each field of an options record is
//! rendered.
//!
//! An options record describes itself as an ordered list of [`Field`]s. Each
//! field pairs a [`Role`] (what kind of SQL fragment the field produces) and a
//! set of [`Modifiers`] with the field's runtime [`Value`], or `None` when the
//! field is absent:
//!
//! ```ignore
//! vec![
//!     Field::fixed("CREATE"),
//!     Field::keyword("OR REPLACE", self.or_replace),
//!     Field::fixed("SEQUENCE"),
//!     Field::identifier(&self.name),
//!     Field::parameter("START", self.start.as_ref()),
//!     Field::parameter("COMMENT", self.comment.as_ref()).single_quotes(),
//! ]
//! ```
//!
//! The compiler in [`crate::compile`] walks that list in order.

use std::borrow::Cow;
use std::fmt;

use crate::compile::Options;
use crate::identifier::{
    AccountObjectIdentifier, DatabaseObjectIdentifier, ExternalObjectIdentifier, ObjectIdentifier,
    SchemaObjectIdentifier, TableColumnIdentifier,
};

/// What kind of SQL fragment a field produces.
///
/// The optional text is the SQL literal associated with the field: the
/// keyword itself for static and keyword fields, or the `NAME` of a
/// `NAME = VALUE` pair for the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Always rendered, regardless of the value.
    Static(&'static str),
    /// Rendered when the value is present (and, for booleans, true).
    Keyword(Option<&'static str>),
    /// `NAME = VALUE`.
    Parameter(Option<&'static str>),
    /// A qualified object name, optionally preceded by `NAME` or `NAME =`.
    Identifier(Option<&'static str>),
    /// A separated sequence of items.
    List(Option<&'static str>),
}

impl Role {
    pub fn text(&self) -> Option<&'static str> {
        match self {
            Role::Static(text) => Some(*text),
            Role::Keyword(text)
            | Role::Parameter(text)
            | Role::Identifier(text)
            | Role::List(text) => *text,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Role::Static(_) => "static",
            Role::Keyword(_) => "keyword",
            Role::Parameter(_) => "parameter",
            Role::Identifier(_) => "identifier",
            Role::List(_) => "list",
        }
    }
}

/// How a textual value is quoted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Quotes {
    #[default]
    Bare,
    Single,
    Double,
}

impl Quotes {
    pub fn apply(&self, s: &str) -> String {
        match self {
            Quotes::Bare => s.to_string(),
            Quotes::Single => format!("'{}'", s),
            Quotes::Double => format!("\"{}\"", s),
        }
    }
}

/// Whether a value is wrapped in parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parens {
    Never,
    /// Wrap, but render nothing at all for an empty list.
    IfNonEmpty,
    /// Wrap, rendering `()` for an empty list.
    Always,
}

/// How list items are joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Separator {
    #[default]
    Comma,
    Space,
}

impl Separator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Separator::Comma => ", ",
            Separator::Space => " ",
        }
    }
}

/// Rendering modifiers. `None` means "use the role's default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub quotes: Quotes,
    pub equals: Option<bool>,
    pub parens: Option<Parens>,
    pub separator: Separator,
}

/// The runtime value of a present field.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Free text supplied by the caller; quoted per [`Modifiers::quotes`].
    Text(Cow<'a, str>),
    /// A fixed SQL keyword, such as the variant of a keyword enum.
    Keyword(&'static str),
    /// An already quoted, fully-qualified object name.
    Ident(String),
    List(Vec<Value<'a>>),
    /// A nested options record, compiled recursively.
    Record(&'a dyn Options),
}

impl Value<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Keyword(_) => "keyword",
            Value::Ident(_) => "identifier",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }
}

/// Converts a Rust value into a field [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value<'_>;
}

impl ToValue for bool {
    fn to_value(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

macro_rules! impl_to_value_int {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value<'_> {
                    Value::Int(i64::from(*self))
                }
            }
        )*
    };
}

impl_to_value_int!(i8, i16, i32, i64, u8, u16, u32);

impl ToValue for f64 {
    fn to_value(&self) -> Value<'_> {
        Value::Float(*self)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value<'_> {
        Value::Text(Cow::Borrowed(self))
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value<'_> {
        Value::Text(Cow::Borrowed(self))
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value<'_> {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value<'_> {
        (**self).to_value()
    }
}

macro_rules! impl_to_value_ident {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value<'_> {
                    Value::Ident(self.fully_qualified_name())
                }
            }
        )*
    };
}

impl_to_value_ident!(
    AccountObjectIdentifier,
    DatabaseObjectIdentifier,
    SchemaObjectIdentifier,
    TableColumnIdentifier,
    ExternalObjectIdentifier
);

/// Declares an enum whose variants each render as a fixed SQL keyword.
///
/// The enum gets `Display`, [`ToValue`] (as [`Value::Keyword`]) and
/// [`crate::validation::IsSet`] implementations.
#[macro_export]
macro_rules! sql_keyword_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $sql:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub fn as_sql(&self) -> &'static str {
                match self {
                    $( $name::$variant => $sql ),+
                }
            }

            pub fn from_sql(s: &str) -> Option<Self> {
                $(
                    if s.eq_ignore_ascii_case($sql) {
                        return Some($name::$variant);
                    }
                )+
                None
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_sql())
            }
        }

        impl $crate::field::ToValue for $name {
            fn to_value(&self) -> $crate::field::Value<'_> {
                $crate::field::Value::Keyword(self.as_sql())
            }
        }

        impl $crate::validation::IsSet for $name {
            fn is_set(&self) -> bool {
                true
            }
        }
    };
}

/// One entry of an options record's rendering table.
#[derive(Debug, Clone)]
pub struct Field<'a> {
    pub role: Role,
    pub modifiers: Modifiers,
    pub value: Option<Value<'a>>,
}

impl<'a> Field<'a> {
    pub fn new(role: Role, value: Option<Value<'a>>) -> Self {
        Field {
            role,
            modifiers: Modifiers::default(),
            value,
        }
    }

    /// A literal that is part of the statement shape, e.g. `CREATE`.
    pub fn fixed(sql: &'static str) -> Self {
        Field::new(Role::Static(sql), None)
    }

    /// A keyword rendered only when `flag` is present and true.
    pub fn keyword(sql: &'static str, flag: Option<bool>) -> Self {
        Field::new(Role::Keyword(Some(sql)), flag.map(Value::Bool))
    }

    /// A keyword-like value that renders itself, e.g. `ORDER` / `NOORDER`.
    pub fn keyword_value<T: ToValue + ?Sized>(value: Option<&'a T>) -> Self {
        Field::new(Role::Keyword(None), value.map(ToValue::to_value))
    }

    /// `NAME = VALUE`.
    pub fn parameter<T: ToValue + ?Sized>(name: &'static str, value: Option<&'a T>) -> Self {
        Field::new(Role::Parameter(Some(name)), value.map(ToValue::to_value))
    }

    /// A bare value with no name, e.g. the pattern of `LIKE '<pattern>'`.
    pub fn value<T: ToValue + ?Sized>(value: Option<&'a T>) -> Self {
        Field::new(Role::Parameter(None), value.map(ToValue::to_value))
    }

    /// A required object name.
    pub fn identifier<T: ToValue + ?Sized>(ident: &'a T) -> Self {
        Field::new(Role::Identifier(None), Some(ident.to_value()))
    }

    /// An optional object name preceded by `sql`, e.g. `RENAME TO <name>`.
    pub fn named_identifier<T: ToValue + ?Sized>(sql: &'static str, ident: Option<&'a T>) -> Self {
        Field::new(Role::Identifier(Some(sql)), ident.map(ToValue::to_value))
    }

    /// A list of items, optionally preceded by `sql`.
    pub fn list<T: ToValue>(sql: Option<&'static str>, items: &'a [T]) -> Self {
        Field::new(
            Role::List(sql),
            Some(Value::List(items.iter().map(ToValue::to_value).collect())),
        )
    }

    /// A list of nested records, optionally preceded by `sql`.
    pub fn record_list<T: Options>(sql: Option<&'static str>, items: &'a [T]) -> Self {
        Field::new(
            Role::List(sql),
            Some(Value::List(
                items.iter().map(|i| Value::Record(i)).collect(),
            )),
        )
    }

    /// A nested record rendered as `SQL <compiled record>` when present.
    pub fn record<T: Options>(sql: Option<&'static str>, record: Option<&'a T>) -> Self {
        Field::new(
            Role::Keyword(sql),
            record.map(|r| Value::Record(r)),
        )
    }

    /// A nested record rendered as `NAME = <compiled record>` when present.
    pub fn record_parameter<T: Options>(name: &'static str, record: Option<&'a T>) -> Self {
        Field::new(
            Role::Parameter(Some(name)),
            record.map(|r| Value::Record(r)),
        )
    }

    pub fn single_quotes(mut self) -> Self {
        self.modifiers.quotes = Quotes::Single;
        self
    }

    pub fn double_quotes(mut self) -> Self {
        self.modifiers.quotes = Quotes::Double;
        self
    }

    pub fn no_quotes(mut self) -> Self {
        self.modifiers.quotes = Quotes::Bare;
        self
    }

    pub fn equals(mut self) -> Self {
        self.modifiers.equals = Some(true);
        self
    }

    pub fn no_equals(mut self) -> Self {
        self.modifiers.equals = Some(false);
        self
    }

    pub fn parentheses(mut self) -> Self {
        self.modifiers.parens = Some(Parens::IfNonEmpty);
        self
    }

    pub fn no_parentheses(mut self) -> Self {
        self.modifiers.parens = Some(Parens::Never);
        self
    }

    pub fn must_parentheses(mut self) -> Self {
        self.modifiers.parens = Some(Parens::Always);
        self
    }

    pub fn no_comma(mut self) -> Self {
        self.modifiers.separator = Separator::Space;
        self
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => write!(f, "{} {:?}", self.kind(), text),
            None => f.write_str(self.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pick_roles() {
        assert_eq!(Field::fixed("CREATE").role, Role::Static("CREATE"));
        assert_eq!(
            Field::keyword("OR REPLACE", None).role,
            Role::Keyword(Some("OR REPLACE"))
        );
        assert!(!Field::keyword("OR REPLACE", None).is_present());
        assert!(Field::keyword("OR REPLACE", Some(false)).is_present());

        let id = AccountObjectIdentifier::new("wh");
        let field = Field::identifier(&id);
        assert_eq!(field.role, Role::Identifier(None));
        assert!(matches!(field.value, Some(Value::Ident(ref s)) if s == "\"wh\""));
    }

    #[test]
    fn modifiers_accumulate() {
        let comment = String::from("c");
        let field = Field::parameter("COMMENT", Some(&comment))
            .single_quotes()
            .no_equals();
        assert_eq!(field.modifiers.quotes, Quotes::Single);
        assert_eq!(field.modifiers.equals, Some(false));
        assert_eq!(field.modifiers.parens, None);

        let items: Vec<String> = vec![];
        let field = Field::list(Some("COLUMNS"), &items)
            .must_parentheses()
            .no_comma();
        assert_eq!(field.modifiers.parens, Some(Parens::Always));
        assert_eq!(field.modifiers.separator, Separator::Space);
    }

    #[test]
    fn integers_widen() {
        assert!(matches!(7u32.to_value(), Value::Int(7)));
        assert!(matches!((-3i8).to_value(), Value::Int(-3)));
        assert!(matches!(0i32.to_value(), Value::Int(0)));
    }

    crate::sql_keyword_enum! {
        enum Direction {
            Asc => "ASC",
            Desc => "DESC",
        }
    }

    #[test]
    fn keyword_enums_render_their_sql() {
        assert_eq!(Direction::Desc.to_string(), "DESC");
        assert_eq!(Direction::from_sql("asc"), Some(Direction::Asc));
        assert_eq!(Direction::from_sql("sideways"), None);
        assert!(matches!(Direction::Asc.to_value(), Value::Keyword("ASC")));
    }
}
