// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Schemas.

use wh_ddl::validation::{
    any_value_set, err_at_least_one_of, err_exactly_one_of, err_one_of, exactly_one_value_set,
    is_true,
};
use wh_ddl::{
    DatabaseObjectIdentifier, Field, ObjectIdentifier, Options, SchemaObjectIdentifier,
    ValidationErrors, impl_is_set,
};

use crate::client::Connection;
use crate::common::{
    DropBehavior, In, Like, LimitFrom, StartsWith, TagAssociation, any_flag_true, flag_list,
};
use crate::error::Error;
use crate::exec::{find_one, validate_and_exec, validate_and_query};
use crate::row::{DecodeError, FromRow, Row};

/// `CREATE [OR REPLACE] [TRANSIENT] SCHEMA [IF NOT EXISTS] <name> ...`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateSchemaOptions {
    pub or_replace: Option<bool>,
    pub transient: Option<bool>,
    pub if_not_exists: Option<bool>,
    pub name: DatabaseObjectIdentifier,
    pub clone: Option<DatabaseObjectIdentifier>,
    pub with_managed_access: Option<bool>,
    pub data_retention_time_in_days: Option<i32>,
    pub max_data_extension_time_in_days: Option<i32>,
    pub default_ddl_collation: Option<String>,
    pub comment: Option<String>,
    pub tags: Vec<TagAssociation>,
}

impl CreateSchemaOptions {
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
        CreateSchemaOptions {
            name,
            ..Default::default()
        }
    }
}

impl Options for CreateSchemaOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("CREATE"),
            Field::keyword("OR REPLACE", self.or_replace),
            Field::keyword("TRANSIENT", self.transient),
            Field::fixed("SCHEMA"),
            Field::keyword("IF NOT EXISTS", self.if_not_exists),
            Field::identifier(&self.name),
            Field::named_identifier("CLONE", self.clone.as_ref()),
            Field::keyword("WITH MANAGED ACCESS", self.with_managed_access),
            Field::parameter(
                "DATA_RETENTION_TIME_IN_DAYS",
                self.data_retention_time_in_days.as_ref(),
            ),
            Field::parameter(
                "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                self.max_data_extension_time_in_days.as_ref(),
            ),
            Field::parameter("DEFAULT_DDL_COLLATION", self.default_ddl_collation.as_ref())
                .single_quotes(),
            Field::parameter("COMMENT", self.comment.as_ref()).single_quotes(),
            Field::record_list(Some("WITH TAG"), &self.tags),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
        if let Some(clone) = &self.clone {
            errs.identifier("clone", clone);
        }
        errs.check(
            is_true(self.or_replace) && is_true(self.if_not_exists),
            || err_one_of("CreateSchemaOptions", &["or_replace", "if_not_exists"]),
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSet {
    pub data_retention_time_in_days: Option<i32>,
    pub max_data_extension_time_in_days: Option<i32>,
    pub default_ddl_collation: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaUnset {
    pub data_retention_time_in_days: Option<bool>,
    pub max_data_extension_time_in_days: Option<bool>,
    pub default_ddl_collation: Option<bool>,
    pub comment: Option<bool>,
}

impl_is_set!(SchemaSet, SchemaUnset);

impl Options for SchemaSet {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::parameter(
                "DATA_RETENTION_TIME_IN_DAYS",
                self.data_retention_time_in_days.as_ref(),
            ),
            Field::parameter(
                "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                self.max_data_extension_time_in_days.as_ref(),
            ),
            Field::parameter("DEFAULT_DDL_COLLATION", self.default_ddl_collation.as_ref())
                .single_quotes(),
            Field::parameter("COMMENT", self.comment.as_ref()).single_quotes(),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.check(
            !any_value_set(&[
                &self.data_retention_time_in_days,
                &self.max_data_extension_time_in_days,
                &self.default_ddl_collation,
                &self.comment,
            ]),
            || {
                err_at_least_one_of(
                    "SchemaSet",
                    &[
                        "data_retention_time_in_days",
                        "max_data_extension_time_in_days",
                        "default_ddl_collation",
                        "comment",
                    ],
                )
            },
        );
    }
}

impl Options for SchemaUnset {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![flag_list(&[
            ("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days),
            (
                "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                self.max_data_extension_time_in_days,
            ),
            ("DEFAULT_DDL_COLLATION", self.default_ddl_collation),
            ("COMMENT", self.comment),
        ])]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.check(
            !any_flag_true(&[
                self.data_retention_time_in_days,
                self.max_data_extension_time_in_days,
                self.default_ddl_collation,
                self.comment,
            ]),
            || {
                err_at_least_one_of(
                    "SchemaUnset",
                    &[
                        "data_retention_time_in_days",
                        "max_data_extension_time_in_days",
                        "default_ddl_collation",
                        "comment",
                    ],
                )
            },
        );
    }
}

/// `ALTER SCHEMA [IF EXISTS] <name> <action>`, with exactly one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlterSchemaOptions {
    pub if_exists: Option<bool>,
    pub name: DatabaseObjectIdentifier,
    pub new_name: Option<DatabaseObjectIdentifier>,
    pub swap_with: Option<DatabaseObjectIdentifier>,
    pub set: Option<SchemaSet>,
    pub unset: Option<SchemaUnset>,
    pub set_tags: Vec<TagAssociation>,
    pub unset_tags: Vec<SchemaObjectIdentifier>,
    pub enable_managed_access: Option<bool>,
    pub disable_managed_access: Option<bool>,
}

impl AlterSchemaOptions {
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
        AlterSchemaOptions {
            name,
            ..Default::default()
        }
    }
}

impl Options for AlterSchemaOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("ALTER SCHEMA"),
            Field::keyword("IF EXISTS", self.if_exists),
            Field::identifier(&self.name),
            Field::named_identifier("RENAME TO", self.new_name.as_ref()),
            Field::named_identifier("SWAP WITH", self.swap_with.as_ref()),
            Field::record(Some("SET"), self.set.as_ref()),
            Field::record(Some("UNSET"), self.unset.as_ref()),
            Field::record_list(Some("SET TAG"), &self.set_tags).no_parentheses(),
            Field::list(Some("UNSET TAG"), &self.unset_tags).no_parentheses(),
            Field::keyword("ENABLE MANAGED ACCESS", self.enable_managed_access),
            Field::keyword("DISABLE MANAGED ACCESS", self.disable_managed_access),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
        if let Some(new_name) = &self.new_name {
            errs.identifier("new_name", new_name);
        }
        if let Some(swap_with) = &self.swap_with {
            errs.identifier("swap_with", swap_with);
        }
        errs.check(
            !exactly_one_value_set(&[
                &self.new_name,
                &self.swap_with,
                &self.set,
                &self.unset,
                &self.set_tags,
                &self.unset_tags,
                &self.enable_managed_access,
                &self.disable_managed_access,
            ]),
            || {
                err_exactly_one_of(
                    "AlterSchemaOptions",
                    &[
                        "new_name",
                        "swap_with",
                        "set",
                        "unset",
                        "set_tags",
                        "unset_tags",
                        "enable_managed_access",
                        "disable_managed_access",
                    ],
                )
            },
        );
    }
}

/// `DROP SCHEMA [IF EXISTS] <name> [CASCADE | RESTRICT]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropSchemaOptions {
    pub if_exists: Option<bool>,
    pub name: DatabaseObjectIdentifier,
    pub behavior: Option<DropBehavior>,
}

impl Options for DropSchemaOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("DROP SCHEMA"),
            Field::keyword("IF EXISTS", self.if_exists),
            Field::identifier(&self.name),
            Field::keyword_value(self.behavior.as_ref()),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
    }
}

/// `SHOW [TERSE] SCHEMAS [HISTORY] [LIKE ...] [IN ...] [STARTS WITH ...] [LIMIT ...]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowSchemasOptions {
    pub terse: Option<bool>,
    pub history: Option<bool>,
    pub like: Option<Like>,
    pub scope: Option<In>,
    pub starts_with: Option<StartsWith>,
    pub limit: Option<LimitFrom>,
}

impl Options for ShowSchemasOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("SHOW"),
            Field::keyword("TERSE", self.terse),
            Field::fixed("SCHEMAS"),
            Field::keyword("HISTORY", self.history),
            Field::record(None, self.like.as_ref()),
            Field::record(None, self.scope.as_ref()),
            Field::record(None, self.starts_with.as_ref()),
            Field::record(None, self.limit.as_ref()),
        ]
    }
}

/// `DESCRIBE SCHEMA <name>`, which lists the objects in the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeSchemaOptions {
    pub name: DatabaseObjectIdentifier,
}

impl Options for DescribeSchemaOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![Field::fixed("DESCRIBE SCHEMA"), Field::identifier(&self.name)]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRow {
    pub created_on: String,
    pub name: String,
    pub database_name: String,
    pub is_default: Option<bool>,
    pub is_current: Option<bool>,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub options: Option<String>,
    pub retention_time: Option<String>,
}

impl FromRow for SchemaRow {
    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(SchemaRow {
            created_on: row.require("created_on")?,
            name: row.require("name")?,
            database_name: row.require("database_name")?,
            is_default: row.get_opt("is_default")?,
            is_current: row.get_opt("is_current")?,
            owner: row.get_opt("owner")?,
            comment: row.get_opt("comment")?,
            options: row.get_opt("options")?,
            retention_time: row.get_opt("retention_time")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub created_on: String,
    pub name: String,
    pub database_name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub owner: String,
    pub comment: String,
    pub transient: bool,
    pub managed_access: bool,
    pub retention_time: Option<i32>,
}

impl Schema {
    pub fn id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(&self.database_name, &self.name)
    }
}

impl From<SchemaRow> for Schema {
    fn from(row: SchemaRow) -> Self {
        let options = row.options.unwrap_or_default();
        Schema {
            created_on: row.created_on,
            name: row.name,
            database_name: row.database_name,
            is_default: row.is_default.unwrap_or(false),
            is_current: row.is_current.unwrap_or(false),
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            transient: options.contains("TRANSIENT"),
            managed_access: options.contains("MANAGED ACCESS"),
            retention_time: row.retention_time.and_then(|r| r.trim().parse().ok()),
        }
    }
}

/// One object listed by `DESCRIBE SCHEMA`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDetailsRow {
    pub created_on: String,
    pub name: String,
    pub kind: String,
}

impl FromRow for SchemaDetailsRow {
    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(SchemaDetailsRow {
            created_on: row.require("created_on")?,
            name: row.require("name")?,
            kind: row.require("kind")?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SchemasApi<'a> {
    conn: &'a dyn Connection,
}

impl<'a> SchemasApi<'a> {
    pub(crate) fn new(conn: &'a dyn Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, opts: &CreateSchemaOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn alter(&self, opts: &AlterSchemaOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn drop(&self, opts: &DropSchemaOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn show(&self, opts: &ShowSchemasOptions) -> Result<Vec<Schema>, Error> {
        validate_and_query::<_, SchemaRow, _>(self.conn, opts).await
    }

    pub async fn show_by_id(&self, id: &DatabaseObjectIdentifier) -> Result<Schema, Error> {
        let opts = ShowSchemasOptions {
            like: Some(Like::new(id.name())),
            scope: Some(In::Database(id.database_id())),
            ..Default::default()
        };
        let schemas = self.show(&opts).await?;
        find_one(schemas, |s| s.id() == *id, id)
    }

    pub async fn describe(
        &self,
        id: &DatabaseObjectIdentifier,
    ) -> Result<Vec<SchemaDetailsRow>, Error> {
        let opts = DescribeSchemaOptions { name: id.clone() };
        validate_and_query::<_, SchemaDetailsRow, _>(self.conn, &opts).await
    }
}
