// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Account roles.

use wh_ddl::validation::{err_exactly_one_of, err_one_of, exactly_one_value_set, is_true};
use wh_ddl::{
    AccountObjectIdentifier, Field, ObjectIdentifier, Options, SchemaObjectIdentifier,
    ValidationErrors,
};

use crate::client::Connection;
use crate::common::{Like, TagAssociation};
use crate::error::Error;
use crate::exec::{find_one, validate_and_exec, validate_and_query};
use crate::row::{DecodeError, FromRow, Row};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateRoleOptions {
    pub or_replace: Option<bool>,
    pub if_not_exists: Option<bool>,
    pub name: AccountObjectIdentifier,
    pub comment: Option<String>,
    pub tags: Vec<TagAssociation>,
}

impl Options for CreateRoleOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("CREATE"),
            Field::keyword("OR REPLACE", self.or_replace),
            Field::fixed("ROLE"),
            Field::keyword("IF NOT EXISTS", self.if_not_exists),
            Field::identifier(&self.name),
            Field::parameter("COMMENT", self.comment.as_ref()).single_quotes(),
            Field::record_list(Some("WITH TAG"), &self.tags),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
        errs.check(
            is_true(self.or_replace) && is_true(self.if_not_exists),
            || err_one_of("CreateRoleOptions", &["or_replace", "if_not_exists"]),
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlterRoleOptions {
    pub if_exists: Option<bool>,
    pub name: AccountObjectIdentifier,
    pub rename_to: Option<AccountObjectIdentifier>,
    pub set_comment: Option<String>,
    pub unset_comment: Option<bool>,
    pub set_tags: Vec<TagAssociation>,
    pub unset_tags: Vec<SchemaObjectIdentifier>,
}

impl Options for AlterRoleOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("ALTER ROLE"),
            Field::keyword("IF EXISTS", self.if_exists),
            Field::identifier(&self.name),
            Field::named_identifier("RENAME TO", self.rename_to.as_ref()),
            Field::parameter("SET COMMENT", self.set_comment.as_ref()).single_quotes(),
            Field::keyword("UNSET COMMENT", self.unset_comment),
            Field::record_list(Some("SET TAG"), &self.set_tags).no_parentheses(),
            Field::list(Some("UNSET TAG"), &self.unset_tags).no_parentheses(),
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
                &self.set_comment,
                &self.unset_comment,
                &self.set_tags,
                &self.unset_tags,
            ]),
            || {
                err_exactly_one_of(
                    "AlterRoleOptions",
                    &[
                        "rename_to",
                        "set_comment",
                        "unset_comment",
                        "set_tags",
                        "unset_tags",
                    ],
                )
            },
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropRoleOptions {
    pub if_exists: Option<bool>,
    pub name: AccountObjectIdentifier,
}

impl Options for DropRoleOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("DROP ROLE"),
            Field::keyword("IF EXISTS", self.if_exists),
            Field::identifier(&self.name),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowRolesOptions {
    pub like: Option<Like>,
}

impl Options for ShowRolesOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("SHOW ROLES"),
            Field::record(None, self.like.as_ref()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRow {
    pub created_on: String,
    pub name: String,
    pub is_default: Option<bool>,
    pub is_current: Option<bool>,
    pub is_inherited: Option<bool>,
    pub assigned_to_users: Option<i64>,
    pub granted_to_roles: Option<i64>,
    pub granted_roles: Option<i64>,
    pub owner: Option<String>,
    pub comment: Option<String>,
}

impl FromRow for RoleRow {
    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(RoleRow {
            created_on: row.require("created_on")?,
            name: row.require("name")?,
            is_default: row.get_opt("is_default")?,
            is_current: row.get_opt("is_current")?,
            is_inherited: row.get_opt("is_inherited")?,
            assigned_to_users: row.get_opt("assigned_to_users")?,
            granted_to_roles: row.get_opt("granted_to_roles")?,
            granted_roles: row.get_opt("granted_roles")?,
            owner: row.get_opt("owner")?,
            comment: row.get_opt("comment")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub created_on: String,
    pub name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub is_inherited: bool,
    pub assigned_to_users: i64,
    pub granted_to_roles: i64,
    pub granted_roles: i64,
    pub owner: String,
    pub comment: String,
}

impl Role {
    pub fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            created_on: row.created_on,
            name: row.name,
            is_default: row.is_default.unwrap_or(false),
            is_current: row.is_current.unwrap_or(false),
            is_inherited: row.is_inherited.unwrap_or(false),
            assigned_to_users: row.assigned_to_users.unwrap_or(0),
            granted_to_roles: row.granted_to_roles.unwrap_or(0),
            granted_roles: row.granted_roles.unwrap_or(0),
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RolesApi<'a> {
    conn: &'a dyn Connection,
}

impl<'a> RolesApi<'a> {
    pub(crate) fn new(conn: &'a dyn Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, opts: &CreateRoleOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn alter(&self, opts: &AlterRoleOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn drop(&self, opts: &DropRoleOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn show(&self, opts: &ShowRolesOptions) -> Result<Vec<Role>, Error> {
        validate_and_query::<_, RoleRow, _>(self.conn, opts).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> Result<Role, Error> {
        let opts = ShowRolesOptions {
            like: Some(Like::new(id.name())),
        };
        let roles = self.show(&opts).await?;
        find_one(roles, |r| r.id() == *id, id)
    }
}

#[cfg(test)]
mod tests {
    use wh_ddl::{ErrorKind, compile, validate};

    use super::*;

    #[test]
    fn create_and_alter() {
        let create = CreateRoleOptions {
            if_not_exists: Some(true),
            name: AccountObjectIdentifier::new("analyst"),
            comment: Some("read only".into()),
            ..Default::default()
        };
        assert_eq!(
            compile(&create).unwrap(),
            r#"CREATE ROLE IF NOT EXISTS "analyst" COMMENT = 'read only'"#
        );

        let alter = AlterRoleOptions {
            name: AccountObjectIdentifier::new("analyst"),
            set_comment: Some("rw".into()),
            ..Default::default()
        };
        assert_eq!(
            compile(&alter).unwrap(),
            r#"ALTER ROLE "analyst" SET COMMENT = 'rw'"#
        );

        let nothing = AlterRoleOptions {
            name: AccountObjectIdentifier::new("analyst"),
            ..Default::default()
        };
        assert!(
            validate(&nothing)
                .unwrap_err()
                .contains_kind(ErrorKind::ExactlyOneOf)
        );
    }

    #[test]
    fn invalid_name_and_conflicting_flags_are_both_reported() {
        let create = CreateRoleOptions {
            or_replace: Some(true),
            if_not_exists: Some(true),
            ..Default::default()
        };
        let errs = validate(&create).unwrap_err();
        assert_eq!(
            errs.iter().map(|e| e.kind()).collect::<Vec<_>>(),
            vec![ErrorKind::InvalidIdentifier, ErrorKind::OneOf]
        );
    }

    #[test]
    fn show_and_drop() {
        assert_eq!(compile(&ShowRolesOptions::default()).unwrap(), "SHOW ROLES");
        let drop = DropRoleOptions {
            if_exists: Some(true),
            name: AccountObjectIdentifier::new("analyst"),
        };
        assert_eq!(
            compile(&drop).unwrap(),
            r#"DROP ROLE IF EXISTS "analyst""#
        );
    }
}
