// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Qualified object names.
//!
//! Every statement embeds one or more object names. Names have between one
//! and four components depending on where the object lives:
//!
//! ```text
//! AccountObjectIdentifier    "warehouse"
//! DatabaseObjectIdentifier   "db"."schema"
//! SchemaObjectIdentifier     "db"."schema"."sequence"
//! TableColumnIdentifier      "db"."schema"."table"."column"
//! ExternalObjectIdentifier   ORG.ACCOUNT."share"
//! ```
//!
//! Components are always rendered double quoted, with embedded double quotes
//! doubled, so that rendering never depends on the case or the characters of
//! the name.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Quotes a single name component.
pub fn quote_ident(part: &str) -> String {
    format!("\"{}\"", part.replace('"', "\"\""))
}

/// Renders quoted components joined with `.`, or the empty string when any
/// component is empty.
fn render_parts(parts: &[&str]) -> String {
    if parts.iter().any(|p| p.is_empty()) {
        return String::new();
    }
    parts
        .iter()
        .map(|p| quote_ident(p))
        .collect::<Vec<_>>()
        .join(".")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("unterminated quoted identifier in {0:?}")]
    UnterminatedQuote(String),
    #[error("unexpected character {found:?} after quoted identifier in {text:?}")]
    UnexpectedCharacter { text: String, found: char },
    #[error("expected {expected} parts in identifier {text:?}, found {found}")]
    WrongPartCount {
        text: String,
        expected: usize,
        found: usize,
    },
}

/// Splits a dotted, optionally double-quoted name into its components.
///
/// `"a""b".c` yields `["a\"b", "c"]`. Unquoted components are taken
/// verbatim.
pub fn parse_identifier_parts(text: &str) -> Result<Vec<String>, IdentifierError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = text.trim().chars().peekable();
    let mut quoted_part_done = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if current.is_empty() && !quoted_part_done => {
                loop {
                    match chars.next() {
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            current.push('"');
                        }
                        Some('"') => break,
                        Some(c) => current.push(c),
                        None => return Err(IdentifierError::UnterminatedQuote(text.into())),
                    }
                }
                quoted_part_done = true;
            }
            '.' => {
                parts.push(std::mem::take(&mut current));
                quoted_part_done = false;
            }
            c if quoted_part_done => {
                return Err(IdentifierError::UnexpectedCharacter {
                    text: text.into(),
                    found: c,
                });
            }
            c => current.push(c),
        }
    }
    parts.push(current);
    Ok(parts)
}

fn parse_exact<const N: usize>(text: &str) -> Result<[String; N], IdentifierError> {
    let parts = parse_identifier_parts(text)?;
    let found = parts.len();
    parts
        .try_into()
        .map_err(|_| IdentifierError::WrongPartCount {
            text: text.into(),
            expected: N,
            found,
        })
}

/// Behavior shared by every kind of qualified name.
pub trait ObjectIdentifier: fmt::Debug {
    /// The unqualified name of the object itself.
    fn name(&self) -> &str;

    /// The raw, unquoted components, outermost first.
    fn parts(&self) -> Vec<&str>;

    /// The quoted, dotted rendering used in statements. Empty if the
    /// identifier is not valid.
    fn fully_qualified_name(&self) -> String {
        render_parts(&self.parts())
    }

    /// Whether every required component is non-empty.
    fn is_valid(&self) -> bool {
        self.parts().iter().all(|p| !p.is_empty())
    }
}

/// Names an object that lives directly in the account (databases,
/// warehouses, roles, ...).
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AccountObjectIdentifier {
    name: String,
}

impl AccountObjectIdentifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn from_fully_qualified_name(text: &str) -> Result<Self, IdentifierError> {
        let [name] = parse_exact::<1>(text)?;
        Ok(Self { name })
    }
}

impl ObjectIdentifier for AccountObjectIdentifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn parts(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

/// Names an object that lives in a database (schemas, database roles).
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DatabaseObjectIdentifier {
    database: String,
    name: String,
}

impl DatabaseObjectIdentifier {
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
        }
    }

    pub fn from_fully_qualified_name(text: &str) -> Result<Self, IdentifierError> {
        let [database, name] = parse_exact::<2>(text)?;
        Ok(Self { database, name })
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn database_id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(self.database.clone())
    }
}

impl ObjectIdentifier for DatabaseObjectIdentifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn parts(&self) -> Vec<&str> {
        vec![self.database.as_str(), self.name.as_str()]
    }
}

/// Names an object that lives in a schema (tables, views, sequences, ...).
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SchemaObjectIdentifier {
    database: String,
    schema: String,
    name: String,
}

impl SchemaObjectIdentifier {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            name: name.into(),
        }
    }

    pub fn from_fully_qualified_name(text: &str) -> Result<Self, IdentifierError> {
        let [database, schema, name] = parse_exact::<3>(text)?;
        Ok(Self {
            database,
            schema,
            name,
        })
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn database_id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(self.database.clone())
    }

    pub fn schema_id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(self.database.clone(), self.schema.clone())
    }
}

impl ObjectIdentifier for SchemaObjectIdentifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn parts(&self) -> Vec<&str> {
        vec![self.database.as_str(), self.schema.as_str(), self.name.as_str()]
    }
}

/// Names a column of a table.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TableColumnIdentifier {
    database: String,
    schema: String,
    table: String,
    column: String,
}

impl TableColumnIdentifier {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn from_fully_qualified_name(text: &str) -> Result<Self, IdentifierError> {
        let [database, schema, table, column] = parse_exact::<4>(text)?;
        Ok(Self {
            database,
            schema,
            table,
            column,
        })
    }

    pub fn table_id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(
            self.database.clone(),
            self.schema.clone(),
            self.table.clone(),
        )
    }
}

impl ObjectIdentifier for TableColumnIdentifier {
    fn name(&self) -> &str {
        &self.column
    }

    fn parts(&self) -> Vec<&str> {
        vec![
            self.database.as_str(),
            self.schema.as_str(),
            self.table.as_str(),
            self.column.as_str(),
        ]
    }
}

/// Names an account as `ORGANIZATION.ACCOUNT`.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AccountIdentifier {
    organization: String,
    account: String,
}

impl AccountIdentifier {
    pub fn new(organization: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            account: account.into(),
        }
    }

    pub fn organization_name(&self) -> &str {
        &self.organization
    }

    pub fn account_name(&self) -> &str {
        &self.account
    }

    pub fn is_valid(&self) -> bool {
        !self.organization.is_empty() && !self.account.is_empty()
    }
}

impl fmt::Display for AccountIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}.{}", self.organization, self.account)
        } else {
            Ok(())
        }
    }
}

/// Names an object owned by another account, e.g. a share.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ExternalObjectIdentifier {
    account: AccountIdentifier,
    object: AccountObjectIdentifier,
}

impl ExternalObjectIdentifier {
    pub fn new(account: AccountIdentifier, object: AccountObjectIdentifier) -> Self {
        Self { account, object }
    }

    /// Parses `ORG.ACCOUNT.object`, where each component may be quoted.
    pub fn from_fully_qualified_name(text: &str) -> Result<Self, IdentifierError> {
        let [organization, account, name] = parse_exact::<3>(text)?;
        Ok(Self {
            account: AccountIdentifier::new(organization, account),
            object: AccountObjectIdentifier::new(name),
        })
    }

    pub fn account(&self) -> &AccountIdentifier {
        &self.account
    }
}

impl ObjectIdentifier for ExternalObjectIdentifier {
    fn name(&self) -> &str {
        self.object.name()
    }

    fn parts(&self) -> Vec<&str> {
        vec![
            self.account.organization.as_str(),
            self.account.account.as_str(),
            self.object.name.as_str(),
        ]
    }

    // The account qualifier is never quoted.
    fn fully_qualified_name(&self) -> String {
        if !self.is_valid() {
            return String::new();
        }
        format!("{}.{}", self.account, self.object.fully_qualified_name())
    }
}

macro_rules! impl_display_ident {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.fully_qualified_name())
                }
            }
        )*
    };
}

impl_display_ident!(
    AccountObjectIdentifier,
    DatabaseObjectIdentifier,
    SchemaObjectIdentifier,
    TableColumnIdentifier,
    ExternalObjectIdentifier
);

/// The kinds of objects a statement can target by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Column,
    Database,
    Role,
    Schema,
    Sequence,
    Table,
    Tag,
    View,
    Warehouse,
}

impl ObjectType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ObjectType::Column => "COLUMN",
            ObjectType::Database => "DATABASE",
            ObjectType::Role => "ROLE",
            ObjectType::Schema => "SCHEMA",
            ObjectType::Sequence => "SEQUENCE",
            ObjectType::Table => "TABLE",
            ObjectType::Tag => "TAG",
            ObjectType::View => "VIEW",
            ObjectType::Warehouse => "WAREHOUSE",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_every_component() {
        let id = SchemaObjectIdentifier::new("db", "schema", "name with \"quote\"");
        assert_eq!(
            id.fully_qualified_name(),
            r#""db"."schema"."name with ""quote""""#
        );
        assert_eq!(id.to_string(), id.fully_qualified_name());
    }

    #[test]
    fn renders_each_arity() {
        assert_eq!(AccountObjectIdentifier::new("wh").to_string(), r#""wh""#);
        assert_eq!(
            DatabaseObjectIdentifier::new("db", "sch").to_string(),
            r#""db"."sch""#
        );
        assert_eq!(
            TableColumnIdentifier::new("db", "sch", "tbl", "col").to_string(),
            r#""db"."sch"."tbl"."col""#
        );
        let share = ExternalObjectIdentifier::new(
            AccountIdentifier::new("ORG", "ACCT"),
            AccountObjectIdentifier::new("share"),
        );
        assert_eq!(share.to_string(), r#"ORG.ACCT."share""#);
    }

    #[test]
    fn empty_components_are_invalid() {
        let id = SchemaObjectIdentifier::new("db", "", "seq");
        assert!(!id.is_valid());
        assert_eq!(id.fully_qualified_name(), "");
        assert!(!AccountObjectIdentifier::new("").is_valid());
        let share = ExternalObjectIdentifier::new(
            AccountIdentifier::new("", "ACCT"),
            AccountObjectIdentifier::new("share"),
        );
        assert!(!share.is_valid());
        assert_eq!(share.fully_qualified_name(), "");
    }

    #[test]
    fn equality_is_structural() {
        let a = SchemaObjectIdentifier::new("db", "sch", "seq");
        let b = SchemaObjectIdentifier::from_fully_qualified_name(r#""db"."sch"."seq""#).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, SchemaObjectIdentifier::new("db", "sch", "SEQ"));
    }

    #[test]
    fn parses_quoted_and_bare_parts() {
        assert_eq!(
            parse_identifier_parts(r#""a""b".c."d.e""#).unwrap(),
            vec!["a\"b".to_string(), "c".to_string(), "d.e".to_string()]
        );
        let id = SchemaObjectIdentifier::new("db", "schema", "name with \"quote\"");
        let parsed =
            SchemaObjectIdentifier::from_fully_qualified_name(&id.fully_qualified_name()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_malformed_names() {
        assert_eq!(
            parse_identifier_parts(r#""abc"#),
            Err(IdentifierError::UnterminatedQuote(r#""abc"#.into()))
        );
        assert!(matches!(
            parse_identifier_parts(r#""abc"x"#),
            Err(IdentifierError::UnexpectedCharacter { found: 'x', .. })
        ));
        assert_eq!(
            DatabaseObjectIdentifier::from_fully_qualified_name("a.b.c"),
            Err(IdentifierError::WrongPartCount {
                text: "a.b.c".into(),
                expected: 2,
                found: 3,
            })
        );
    }

    #[test]
    fn navigates_to_parents() {
        let col = TableColumnIdentifier::new("db", "sch", "tbl", "col");
        let table = col.table_id();
        assert_eq!(table.to_string(), r#""db"."sch"."tbl""#);
        assert_eq!(table.schema_id().to_string(), r#""db"."sch""#);
        assert_eq!(table.database_id().to_string(), r#""db""#);
        assert_eq!(table.schema_id().database_id().name(), "db");
    }

    #[test]
    fn serializes_as_plain_record() {
        let id = DatabaseObjectIdentifier::new("db", "sch");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#"{"database":"db","name":"sch"}"#);
        let back: DatabaseObjectIdentifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
