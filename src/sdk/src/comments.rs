// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! `COMMENT ON` statements.

use wh_ddl::validation::err_invalid_value;
use wh_ddl::{
    Field, ObjectIdentifier, ObjectType, Options, TableColumnIdentifier, ToValue,
    ValidationErrors,
};

use crate::client::Connection;
use crate::error::Error;
use crate::exec::validate_and_exec;

/// `COMMENT [IF EXISTS] ON <object type> <name> IS '<text>'`
///
/// Columns have their own statement, [`CommentOnColumnOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentOptions<I> {
    pub if_exists: Option<bool>,
    pub object_type: ObjectType,
    pub name: I,
    pub value: String,
}

impl<I> CommentOptions<I> {
    pub fn new(object_type: ObjectType, name: I, value: impl Into<String>) -> Self {
        CommentOptions {
            if_exists: None,
            object_type,
            name,
            value: value.into(),
        }
    }
}

impl<I: ObjectIdentifier + ToValue> Options for CommentOptions<I> {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("COMMENT"),
            Field::keyword("IF EXISTS", self.if_exists),
            Field::fixed("ON"),
            Field::fixed(self.object_type.as_sql()),
            Field::identifier(&self.name),
            Field::parameter("IS", Some(&self.value))
                .no_equals()
                .single_quotes(),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
        errs.check(self.object_type == ObjectType::Column, || {
            err_invalid_value(
                "CommentOptions",
                "object_type",
                "use CommentOnColumnOptions for columns",
            )
        });
    }
}

/// `COMMENT ON COLUMN <table>.<column> IS '<text>'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentOnColumnOptions {
    pub column: TableColumnIdentifier,
    pub value: String,
}

impl Options for CommentOnColumnOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("COMMENT ON COLUMN"),
            Field::identifier(&self.column),
            Field::parameter("IS", Some(&self.value))
                .no_equals()
                .single_quotes(),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("column", &self.column);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommentsApi<'a> {
    conn: &'a dyn Connection,
}

impl<'a> CommentsApi<'a> {
    pub(crate) fn new(conn: &'a dyn Connection) -> Self {
        Self { conn }
    }

    pub async fn set<I>(&self, opts: &CommentOptions<I>) -> Result<(), Error>
    where
        I: ObjectIdentifier + ToValue,
    {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn set_column(&self, opts: &CommentOnColumnOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }
}
