// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Databases, including databases created from a share.

use wh_ddl::validation::{
    any_value_set, err_at_least_one_of, err_exactly_one_of, err_one_of, exactly_one_value_set,
    is_true,
};
use wh_ddl::{
    AccountObjectIdentifier, ExternalObjectIdentifier, Field, ObjectIdentifier, Options,
    SchemaObjectIdentifier, ValidationErrors, impl_is_set,
};

use crate::client::Connection;
use crate::common::{
    DropBehavior, Like, LimitFrom, StartsWith, TagAssociation, any_flag_true, flag_list,
};
use crate::error::Error;
use crate::exec::{find_one, validate_and_exec, validate_and_query};
use crate::row::{DecodeError, FromRow, Row};

/// `CREATE [OR REPLACE] [TRANSIENT] DATABASE [IF NOT EXISTS] <name> ...`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateDatabaseOptions {
    pub or_replace: Option<bool>,
    pub transient: Option<bool>,
    pub if_not_exists: Option<bool>,
    pub name: AccountObjectIdentifier,
    pub clone: Option<AccountObjectIdentifier>,
    pub data_retention_time_in_days: Option<i32>,
    pub max_data_extension_time_in_days: Option<i32>,
    pub default_ddl_collation: Option<String>,
    pub comment: Option<String>,
    pub tags: Vec<TagAssociation>,
}

impl CreateDatabaseOptions {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        CreateDatabaseOptions {
            name,
            ..Default::default()
        }
    }
}

impl Options for CreateDatabaseOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("CREATE"),
            Field::keyword("OR REPLACE", self.or_replace),
            Field::keyword("TRANSIENT", self.transient),
            Field::fixed("DATABASE"),
            Field::keyword("IF NOT EXISTS", self.if_not_exists),
            Field::identifier(&self.name),
            Field::named_identifier("CLONE", self.clone.as_ref()),
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
            || err_one_of("CreateDatabaseOptions", &["or_replace", "if_not_exists"]),
        );
    }
}

/// `CREATE DATABASE <name> FROM SHARE <org>.<account>."<share>"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateSharedDatabaseOptions {
    pub or_replace: Option<bool>,
    pub transient: Option<bool>,
    pub if_not_exists: Option<bool>,
    pub name: AccountObjectIdentifier,
    pub from_share: ExternalObjectIdentifier,
    pub comment: Option<String>,
    pub tags: Vec<TagAssociation>,
}

impl Options for CreateSharedDatabaseOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("CREATE"),
            Field::keyword("OR REPLACE", self.or_replace),
            Field::keyword("TRANSIENT", self.transient),
            Field::fixed("DATABASE"),
            Field::keyword("IF NOT EXISTS", self.if_not_exists),
            Field::identifier(&self.name),
            Field::named_identifier("FROM SHARE", Some(&self.from_share)),
            Field::parameter("COMMENT", self.comment.as_ref()).single_quotes(),
            Field::record_list(Some("WITH TAG"), &self.tags),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
        errs.identifier("from_share", &self.from_share);
        errs.check(
            is_true(self.or_replace) && is_true(self.if_not_exists),
            || err_one_of("CreateSharedDatabaseOptions", &["or_replace", "if_not_exists"]),
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSet {
    pub data_retention_time_in_days: Option<i32>,
    pub max_data_extension_time_in_days: Option<i32>,
    pub default_ddl_collation: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseUnset {
    pub data_retention_time_in_days: Option<bool>,
    pub max_data_extension_time_in_days: Option<bool>,
    pub default_ddl_collation: Option<bool>,
    pub comment: Option<bool>,
}

impl_is_set!(DatabaseSet, DatabaseUnset);

impl Options for DatabaseSet {
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
                    "DatabaseSet",
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

impl Options for DatabaseUnset {
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
                    "DatabaseUnset",
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

/// `ALTER DATABASE [IF EXISTS] <name> <action>`, with exactly one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlterDatabaseOptions {
    pub if_exists: Option<bool>,
    pub name: AccountObjectIdentifier,
    pub new_name: Option<AccountObjectIdentifier>,
    pub swap_with: Option<AccountObjectIdentifier>,
    pub set: Option<DatabaseSet>,
    pub unset: Option<DatabaseUnset>,
    pub set_tags: Vec<TagAssociation>,
    pub unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterDatabaseOptions {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        AlterDatabaseOptions {
            name,
            ..Default::default()
        }
    }
}

impl Options for AlterDatabaseOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("ALTER DATABASE"),
            Field::keyword("IF EXISTS", self.if_exists),
            Field::identifier(&self.name),
            Field::named_identifier("RENAME TO", self.new_name.as_ref()),
            Field::named_identifier("SWAP WITH", self.swap_with.as_ref()),
            Field::record(Some("SET"), self.set.as_ref()),
            Field::record(Some("UNSET"), self.unset.as_ref()),
            Field::record_list(Some("SET TAG"), &self.set_tags).no_parentheses(),
            Field::list(Some("UNSET TAG"), &self.unset_tags).no_parentheses(),
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
            ]),
            || {
                err_exactly_one_of(
                    "AlterDatabaseOptions",
                    &[
                        "new_name",
                        "swap_with",
                        "set",
                        "unset",
                        "set_tags",
                        "unset_tags",
                    ],
                )
            },
        );
    }
}

/// `DROP DATABASE [IF EXISTS] <name> [CASCADE | RESTRICT]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropDatabaseOptions {
    pub if_exists: Option<bool>,
    pub name: AccountObjectIdentifier,
    pub behavior: Option<DropBehavior>,
}

impl Options for DropDatabaseOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("DROP DATABASE"),
            Field::keyword("IF EXISTS", self.if_exists),
            Field::identifier(&self.name),
            Field::keyword_value(self.behavior.as_ref()),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
    }
}

/// `UNDROP DATABASE <name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndropDatabaseOptions {
    pub name: AccountObjectIdentifier,
}

impl Options for UndropDatabaseOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![Field::fixed("UNDROP DATABASE"), Field::identifier(&self.name)]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
    }
}

/// `SHOW [TERSE] DATABASES [HISTORY] [LIKE ...] [STARTS WITH ...] [LIMIT ...]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowDatabasesOptions {
    pub terse: Option<bool>,
    pub history: Option<bool>,
    pub like: Option<Like>,
    pub starts_with: Option<StartsWith>,
    pub limit: Option<LimitFrom>,
}

impl Options for ShowDatabasesOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("SHOW"),
            Field::keyword("TERSE", self.terse),
            Field::fixed("DATABASES"),
            Field::keyword("HISTORY", self.history),
            Field::record(None, self.like.as_ref()),
            Field::record(None, self.starts_with.as_ref()),
            Field::record(None, self.limit.as_ref()),
        ]
    }
}

/// `DESCRIBE DATABASE <name>`, which lists the database's schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeDatabaseOptions {
    pub name: AccountObjectIdentifier,
}

impl Options for DescribeDatabaseOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![Field::fixed("DESCRIBE DATABASE"), Field::identifier(&self.name)]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRow {
    pub created_on: String,
    pub name: String,
    pub is_default: Option<bool>,
    pub is_current: Option<bool>,
    pub origin: Option<String>,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub options: Option<String>,
    pub retention_time: Option<String>,
    pub dropped_on: Option<String>,
}

impl FromRow for DatabaseRow {
    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(DatabaseRow {
            created_on: row.require("created_on")?,
            name: row.require("name")?,
            is_default: row.get_opt("is_default")?,
            is_current: row.get_opt("is_current")?,
            origin: row.get_opt("origin")?,
            owner: row.get_opt("owner")?,
            comment: row.get_opt("comment")?,
            options: row.get_opt("options")?,
            retention_time: row.get_opt("retention_time")?,
            dropped_on: row.get_opt("dropped_on")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    pub created_on: String,
    pub name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub origin: String,
    pub owner: String,
    pub comment: String,
    pub transient: bool,
    /// Days of time travel. Absent in terse output.
    pub retention_time: Option<i32>,
    pub dropped_on: Option<String>,
}

impl Database {
    pub fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

impl From<DatabaseRow> for Database {
    fn from(row: DatabaseRow) -> Self {
        let options = row.options.unwrap_or_default();
        Database {
            created_on: row.created_on,
            name: row.name,
            is_default: row.is_default.unwrap_or(false),
            is_current: row.is_current.unwrap_or(false),
            origin: row.origin.unwrap_or_default(),
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            transient: options.contains("TRANSIENT"),
            retention_time: row.retention_time.and_then(|r| r.trim().parse().ok()),
            dropped_on: row.dropped_on.filter(|d| !d.is_empty()),
        }
    }
}

/// One schema listed by `DESCRIBE DATABASE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseDetailsRow {
    pub created_on: String,
    pub name: String,
    pub kind: String,
}

impl FromRow for DatabaseDetailsRow {
    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(DatabaseDetailsRow {
            created_on: row.require("created_on")?,
            name: row.require("name")?,
            kind: row.require("kind")?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DatabasesApi<'a> {
    conn: &'a dyn Connection,
}

impl<'a> DatabasesApi<'a> {
    pub(crate) fn new(conn: &'a dyn Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, opts: &CreateDatabaseOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn create_shared(&self, opts: &CreateSharedDatabaseOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn alter(&self, opts: &AlterDatabaseOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn drop(&self, opts: &DropDatabaseOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn undrop(&self, id: &AccountObjectIdentifier) -> Result<(), Error> {
        validate_and_exec(self.conn, &UndropDatabaseOptions { name: id.clone() }).await
    }

    pub async fn show(&self, opts: &ShowDatabasesOptions) -> Result<Vec<Database>, Error> {
        validate_and_query::<_, DatabaseRow, _>(self.conn, opts).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> Result<Database, Error> {
        let opts = ShowDatabasesOptions {
            like: Some(Like::new(id.name())),
            ..Default::default()
        };
        let databases = self.show(&opts).await?;
        find_one(databases, |d| d.id() == *id, id)
    }

    pub async fn describe(
        &self,
        id: &AccountObjectIdentifier,
    ) -> Result<Vec<DatabaseDetailsRow>, Error> {
        let opts = DescribeDatabaseOptions { name: id.clone() };
        validate_and_query::<_, DatabaseDetailsRow, _>(self.conn, &opts).await
    }
}
