// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Sequences.

use wh_ddl::validation::{
    any_value_set, err_at_least_one_of, err_exactly_one_of, err_one_of, exactly_one_value_set,
    is_true,
};
use wh_ddl::{
    Field, ObjectIdentifier, Options, SchemaObjectIdentifier, ValidationErrors, impl_is_set,
    sql_keyword_enum,
};

use crate::client::Connection;
use crate::common::{DropBehavior, In, Like};
use crate::error::Error;
use crate::exec::{find_one, validate_and_exec, validate_and_query, validate_and_query_one};
use crate::row::{DecodeError, FromRow, Row};

sql_keyword_enum! {
    /// Whether generated values are guaranteed to increase.
    pub enum ValuesBehavior {
        Order => "ORDER",
        NoOrder => "NOORDER",
    }
}

/// `CREATE [OR REPLACE] SEQUENCE [IF NOT EXISTS] <name> [WITH] [START = n]
/// [INCREMENT = n] [ORDER | NOORDER] [COMMENT = '<text>']`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateSequenceOptions {
    pub or_replace: Option<bool>,
    pub if_not_exists: Option<bool>,
    pub name: SchemaObjectIdentifier,
    pub with: Option<bool>,
    pub start: Option<i64>,
    pub increment: Option<i64>,
    pub values_behavior: Option<ValuesBehavior>,
    pub comment: Option<String>,
}

impl CreateSequenceOptions {
    pub fn new(name: SchemaObjectIdentifier) -> Self {
        CreateSequenceOptions {
            name,
            ..Default::default()
        }
    }
}

impl Options for CreateSequenceOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("CREATE"),
            Field::keyword("OR REPLACE", self.or_replace),
            Field::fixed("SEQUENCE"),
            Field::keyword("IF NOT EXISTS", self.if_not_exists),
            Field::identifier(&self.name),
            Field::keyword("WITH", self.with),
            Field::parameter("START", self.start.as_ref()),
            Field::parameter("INCREMENT", self.increment.as_ref()),
            Field::keyword_value(self.values_behavior.as_ref()),
            Field::parameter("COMMENT", self.comment.as_ref()).single_quotes(),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
        errs.check(
            is_true(self.or_replace) && is_true(self.if_not_exists),
            || err_one_of("CreateSequenceOptions", &["or_replace", "if_not_exists"]),
        );
    }
}

/// The `SET` clause of `ALTER SEQUENCE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceSet {
    pub values_behavior: Option<ValuesBehavior>,
    pub comment: Option<String>,
}

impl_is_set!(SequenceSet);

impl Options for SequenceSet {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::keyword_value(self.values_behavior.as_ref()),
            Field::parameter("COMMENT", self.comment.as_ref()).single_quotes(),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.check(
            !any_value_set(&[&self.values_behavior, &self.comment]),
            || err_at_least_one_of("SequenceSet", &["values_behavior", "comment"]),
        );
    }
}

/// `ALTER SEQUENCE [IF EXISTS] <name> <action>`, with exactly one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlterSequenceOptions {
    pub if_exists: Option<bool>,
    pub name: SchemaObjectIdentifier,
    pub rename_to: Option<SchemaObjectIdentifier>,
    pub set_increment: Option<i64>,
    pub set: Option<SequenceSet>,
    pub unset_comment: Option<bool>,
}

impl AlterSequenceOptions {
    pub fn new(name: SchemaObjectIdentifier) -> Self {
        AlterSequenceOptions {
            name,
            ..Default::default()
        }
    }
}

impl Options for AlterSequenceOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("ALTER SEQUENCE"),
            Field::keyword("IF EXISTS", self.if_exists),
            Field::identifier(&self.name),
            Field::named_identifier("RENAME TO", self.rename_to.as_ref()),
            Field::parameter("SET INCREMENT", self.set_increment.as_ref()),
            Field::record(Some("SET"), self.set.as_ref()),
            Field::keyword("UNSET COMMENT", self.unset_comment),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
        if let Some(rename_to) = &self.rename_to {
            errs.identifier("rename_to", rename_to);
        }
        errs.check(
            !exactly_one_value_set(&[
                &self.rename_to,
                &self.set_increment,
                &self.set,
                &self.unset_comment,
            ]),
            || {
                err_exactly_one_of(
                    "AlterSequenceOptions",
                    &["rename_to", "set_increment", "set", "unset_comment"],
                )
            },
        );
    }
}

/// `DROP SEQUENCE [IF EXISTS] <name> [CASCADE | RESTRICT]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropSequenceOptions {
    pub if_exists: Option<bool>,
    pub name: SchemaObjectIdentifier,
    pub behavior: Option<DropBehavior>,
}

impl DropSequenceOptions {
    pub fn new(name: SchemaObjectIdentifier) -> Self {
        DropSequenceOptions {
            name,
            ..Default::default()
        }
    }
}

impl Options for DropSequenceOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("DROP SEQUENCE"),
            Field::keyword("IF EXISTS", self.if_exists),
            Field::identifier(&self.name),
            Field::keyword_value(self.behavior.as_ref()),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
    }
}

/// `SHOW SEQUENCES [LIKE '<pattern>'] [IN ...]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowSequenceOptions {
    pub like: Option<Like>,
    pub scope: Option<In>,
}

impl Options for ShowSequenceOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("SHOW SEQUENCES"),
            Field::record(None, self.like.as_ref()),
            Field::record(None, self.scope.as_ref()),
        ]
    }
}

/// `DESCRIBE SEQUENCE <name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeSequenceOptions {
    pub name: SchemaObjectIdentifier,
}

impl Options for DescribeSequenceOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("DESCRIBE SEQUENCE"),
            Field::identifier(&self.name),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
    }
}

/// A row of `SHOW SEQUENCES` or `DESCRIBE SEQUENCE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRow {
    pub created_on: String,
    pub name: String,
    pub schema_name: String,
    pub database_name: String,
    pub next_value: i64,
    pub interval: i64,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub ordered: Option<bool>,
}

impl FromRow for SequenceRow {
    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(SequenceRow {
            created_on: row.require("created_on")?,
            name: row.require("name")?,
            schema_name: row.require("schema_name")?,
            database_name: row.require("database_name")?,
            next_value: row.require("next_value")?,
            interval: row.require("interval")?,
            owner: row.get("owner")?,
            comment: row.get("comment")?,
            ordered: row.get_opt("ordered")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub created_on: String,
    pub name: String,
    pub schema_name: String,
    pub database_name: String,
    pub next_value: i64,
    pub interval: i64,
    pub owner: String,
    pub comment: String,
    pub ordered: bool,
}

impl Sequence {
    pub fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

impl From<SequenceRow> for Sequence {
    fn from(row: SequenceRow) -> Self {
        Sequence {
            created_on: row.created_on,
            name: row.name,
            schema_name: row.schema_name,
            database_name: row.database_name,
            next_value: row.next_value,
            interval: row.interval,
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            ordered: row.ordered.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SequencesApi<'a> {
    conn: &'a dyn Connection,
}

impl<'a> SequencesApi<'a> {
    pub(crate) fn new(conn: &'a dyn Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, opts: &CreateSequenceOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn alter(&self, opts: &AlterSequenceOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn drop(&self, opts: &DropSequenceOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn show(&self, opts: &ShowSequenceOptions) -> Result<Vec<Sequence>, Error> {
        validate_and_query::<_, SequenceRow, _>(self.conn, opts).await
    }

    /// Looks up one sequence by name within its schema.
    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> Result<Sequence, Error> {
        let opts = ShowSequenceOptions {
            like: Some(Like::new(id.name())),
            scope: Some(In::Schema(id.schema_id())),
        };
        let sequences = self.show(&opts).await?;
        find_one(sequences, |s| s.id() == *id, id)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> Result<Sequence, Error> {
        let opts = DescribeSequenceOptions { name: id.clone() };
        validate_and_query_one::<_, SequenceRow, _>(self.conn, &opts, id).await
    }
}
