// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Views.

use wh_ddl::field::Role;
use wh_ddl::identifier::quote_ident;
use wh_ddl::validation::{
    err_exactly_one_of, err_invalid_value, err_not_set, err_one_of, exactly_one_value_set,
    is_true,
};
use wh_ddl::{
    Field, ObjectIdentifier, Options, SchemaObjectIdentifier, ValidationErrors, Value,
};

use crate::client::Connection;
use crate::common::{In, Like, LimitFrom, StartsWith, TagAssociation};
use crate::error::Error;
use crate::exec::{find_one, validate_and_exec, validate_and_query};
use crate::row::{DecodeError, FromRow, Row};

/// One entry of the column list of `CREATE VIEW`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewColumn {
    pub name: String,
    pub comment: Option<String>,
}

impl ViewColumn {
    pub fn new(name: impl Into<String>) -> Self {
        ViewColumn {
            name: name.into(),
            comment: None,
        }
    }
}

impl Options for ViewColumn {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new(Role::Parameter(None), Some(Value::Ident(quote_ident(&self.name)))),
            Field::parameter("COMMENT", self.comment.as_ref())
                .no_equals()
                .single_quotes(),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.check(self.name.is_empty(), || {
            err_invalid_value("ViewColumn", "name", "must not be empty")
        });
    }
}

/// `CREATE [OR REPLACE] [SECURE] [TEMPORARY] [RECURSIVE] VIEW [IF NOT EXISTS]
/// <name> [(<columns>)] ... AS <query>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateViewOptions {
    pub or_replace: Option<bool>,
    pub secure: Option<bool>,
    pub temporary: Option<bool>,
    pub recursive: Option<bool>,
    pub if_not_exists: Option<bool>,
    pub name: SchemaObjectIdentifier,
    pub columns: Vec<ViewColumn>,
    pub change_tracking: Option<bool>,
    pub copy_grants: Option<bool>,
    pub comment: Option<String>,
    pub tags: Vec<TagAssociation>,
    pub sql: String,
}

impl CreateViewOptions {
    pub fn new(name: SchemaObjectIdentifier, sql: impl Into<String>) -> Self {
        CreateViewOptions {
            name,
            sql: sql.into(),
            ..Default::default()
        }
    }
}

impl Options for CreateViewOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("CREATE"),
            Field::keyword("OR REPLACE", self.or_replace),
            Field::keyword("SECURE", self.secure),
            Field::keyword("TEMPORARY", self.temporary),
            Field::keyword("RECURSIVE", self.recursive),
            Field::fixed("VIEW"),
            Field::keyword("IF NOT EXISTS", self.if_not_exists),
            Field::identifier(&self.name),
            Field::record_list(None, &self.columns),
            Field::parameter("CHANGE_TRACKING", self.change_tracking.as_ref()),
            Field::keyword("COPY GRANTS", self.copy_grants),
            Field::parameter("COMMENT", self.comment.as_ref()).single_quotes(),
            Field::record_list(Some("WITH TAG"), &self.tags),
            Field::parameter("AS", Some(&self.sql)).no_equals(),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
        errs.check(self.sql.trim().is_empty(), || {
            err_not_set("CreateViewOptions", &["sql"])
        });
        errs.check(
            is_true(self.or_replace) && is_true(self.if_not_exists),
            || err_one_of("CreateViewOptions", &["or_replace", "if_not_exists"]),
        );
        errs.check(
            is_true(self.copy_grants) && !is_true(self.or_replace),
            || err_invalid_value("CreateViewOptions", "copy_grants", "requires or_replace"),
        );
    }
}

/// `ALTER VIEW [IF EXISTS] <name> <action>`, with exactly one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlterViewOptions {
    pub if_exists: Option<bool>,
    pub name: SchemaObjectIdentifier,
    pub rename_to: Option<SchemaObjectIdentifier>,
    pub set_comment: Option<String>,
    pub unset_comment: Option<bool>,
    pub set_secure: Option<bool>,
    pub unset_secure: Option<bool>,
    pub set_change_tracking: Option<bool>,
    pub set_tags: Vec<TagAssociation>,
    pub unset_tags: Vec<SchemaObjectIdentifier>,
}

impl Options for AlterViewOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("ALTER VIEW"),
            Field::keyword("IF EXISTS", self.if_exists),
            Field::identifier(&self.name),
            Field::named_identifier("RENAME TO", self.rename_to.as_ref()),
            Field::parameter("SET COMMENT", self.set_comment.as_ref()).single_quotes(),
            Field::keyword("UNSET COMMENT", self.unset_comment),
            Field::keyword("SET SECURE", self.set_secure),
            Field::keyword("UNSET SECURE", self.unset_secure),
            Field::parameter("SET CHANGE_TRACKING", self.set_change_tracking.as_ref()),
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
                &self.set_secure,
                &self.unset_secure,
                &self.set_change_tracking,
                &self.set_tags,
                &self.unset_tags,
            ]),
            || {
                err_exactly_one_of(
                    "AlterViewOptions",
                    &[
                        "rename_to",
                        "set_comment",
                        "unset_comment",
                        "set_secure",
                        "unset_secure",
                        "set_change_tracking",
                        "set_tags",
                        "unset_tags",
                    ],
                )
            },
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropViewOptions {
    pub if_exists: Option<bool>,
    pub name: SchemaObjectIdentifier,
}

impl Options for DropViewOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("DROP VIEW"),
            Field::keyword("IF EXISTS", self.if_exists),
            Field::identifier(&self.name),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowViewsOptions {
    pub terse: Option<bool>,
    pub like: Option<Like>,
    pub scope: Option<In>,
    pub starts_with: Option<StartsWith>,
    pub limit: Option<LimitFrom>,
}

impl Options for ShowViewsOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("SHOW"),
            Field::keyword("TERSE", self.terse),
            Field::fixed("VIEWS"),
            Field::record(None, self.like.as_ref()),
            Field::record(None, self.scope.as_ref()),
            Field::record(None, self.starts_with.as_ref()),
            Field::record(None, self.limit.as_ref()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeViewOptions {
    pub name: SchemaObjectIdentifier,
}

impl Options for DescribeViewOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![Field::fixed("DESCRIBE VIEW"), Field::identifier(&self.name)]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRow {
    pub created_on: String,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub text: Option<String>,
    pub is_secure: Option<bool>,
    pub is_materialized: Option<bool>,
    pub change_tracking: Option<String>,
}

impl FromRow for ViewRow {
    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(ViewRow {
            created_on: row.require("created_on")?,
            name: row.require("name")?,
            database_name: row.require("database_name")?,
            schema_name: row.require("schema_name")?,
            owner: row.get_opt("owner")?,
            comment: row.get_opt("comment")?,
            text: row.get_opt("text")?,
            is_secure: row.get_opt("is_secure")?,
            is_materialized: row.get_opt("is_materialized")?,
            change_tracking: row.get_opt("change_tracking")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub created_on: String,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub owner: String,
    pub comment: String,
    /// The full `CREATE VIEW` statement, when visible to the caller.
    pub text: String,
    pub is_secure: bool,
    pub is_materialized: bool,
    pub change_tracking: bool,
}

impl View {
    pub fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }

    /// The query the view selects from, extracted from [`View::text`].
    pub fn body(&self) -> Option<&str> {
        extract_view_body(&self.text)
    }
}

impl From<ViewRow> for View {
    fn from(row: ViewRow) -> Self {
        View {
            created_on: row.created_on,
            name: row.name,
            database_name: row.database_name,
            schema_name: row.schema_name,
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            text: row.text.unwrap_or_default(),
            is_secure: row.is_secure.unwrap_or(false),
            is_materialized: row.is_materialized.unwrap_or(false),
            change_tracking: row
                .change_tracking
                .is_some_and(|c| c.eq_ignore_ascii_case("on")),
        }
    }
}

/// One column listed by `DESCRIBE VIEW`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewColumnRow {
    pub name: String,
    pub data_type: String,
    pub kind: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub comment: Option<String>,
}

impl FromRow for ViewColumnRow {
    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(ViewColumnRow {
            name: row.require("name")?,
            data_type: row.require("type")?,
            kind: row.require("kind")?,
            nullable: row.require("null?")?,
            default: row.get_opt("default")?,
            comment: row.get_opt("comment")?,
        })
    }
}

/// Returns the query following the first top-level `AS` keyword of a view
/// definition, or `None` if there is none.
///
/// This is a best-effort scan, not a parser: it skips parenthesized column
/// lists and quoted strings and identifiers, and otherwise matches `AS` as a
/// whole word.
pub fn extract_view_body(definition: &str) -> Option<&str> {
    let bytes = definition.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            // A doubled quote closes and immediately reopens, which leaves
            // the scan inside the literal.
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' => quote = Some(b),
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b'a' | b'A' if depth == 0 && is_as_keyword(bytes, i) => {
                let body = definition[i + 2..].trim();
                return (!body.is_empty()).then_some(body);
            }
            _ => {}
        }
    }
    None
}

fn is_as_keyword(bytes: &[u8], i: usize) -> bool {
    let Some(next) = bytes.get(i + 1) else {
        return false;
    };
    let before = i
        .checked_sub(1)
        .and_then(|j| bytes.get(j))
        .is_some_and(|b| b.is_ascii_whitespace() || *b == b')');
    let after = bytes
        .get(i + 2)
        .is_some_and(|b| b.is_ascii_whitespace() || *b == b'(');
    next.eq_ignore_ascii_case(&b's') && before && after
}

#[derive(Debug, Clone, Copy)]
pub struct ViewsApi<'a> {
    conn: &'a dyn Connection,
}

impl<'a> ViewsApi<'a> {
    pub(crate) fn new(conn: &'a dyn Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, opts: &CreateViewOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn alter(&self, opts: &AlterViewOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn drop(&self, opts: &DropViewOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn show(&self, opts: &ShowViewsOptions) -> Result<Vec<View>, Error> {
        validate_and_query::<_, ViewRow, _>(self.conn, opts).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> Result<View, Error> {
        let opts = ShowViewsOptions {
            like: Some(Like::new(id.name())),
            scope: Some(In::Schema(id.schema_id())),
            ..Default::default()
        };
        let views = self.show(&opts).await?;
        find_one(views, |v| v.id() == *id, id)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> Result<Vec<ViewColumnRow>, Error> {
        let opts = DescribeViewOptions { name: id.clone() };
        validate_and_query::<_, ViewColumnRow, _>(self.conn, &opts).await
    }
}

#[cfg(test)]
mod tests {
    use wh_ddl::{ErrorKind, compile, validate};

    use super::*;

    fn view() -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("db", "sch", "v")
    }

    #[test]
    fn create_with_columns() {
        let opts = CreateViewOptions {
            or_replace: Some(true),
            secure: Some(true),
            columns: vec![
                ViewColumn {
                    name: "id".into(),
                    comment: Some("key".into()),
                },
                ViewColumn::new("say \"hi\""),
            ],
            change_tracking: Some(true),
            copy_grants: Some(true),
            comment: Some("recent".into()),
            ..CreateViewOptions::new(view(), "SELECT id, greeting FROM t")
        };
        assert!(validate(&opts).is_ok());
        assert_eq!(
            compile(&opts).unwrap(),
            r#"CREATE OR REPLACE SECURE VIEW "db"."sch"."v" ("id" COMMENT 'key', "say ""hi""") CHANGE_TRACKING = true COPY GRANTS COMMENT = 'recent' AS SELECT id, greeting FROM t"#
        );
    }

    #[test]
    fn create_requires_query() {
        let opts = CreateViewOptions::new(view(), "  ");
        assert_eq!(
            validate(&opts).unwrap_err().to_string(),
            "CreateViewOptions fields: [sql] should be set"
        );

        let grants = CreateViewOptions {
            copy_grants: Some(true),
            ..CreateViewOptions::new(view(), "SELECT 1")
        };
        assert!(
            validate(&grants)
                .unwrap_err()
                .contains_kind(ErrorKind::InvalidValue)
        );
    }

    #[test]
    fn each_empty_column_is_reported() {
        let opts = CreateViewOptions {
            columns: vec![ViewColumn::new(""), ViewColumn::new("ok"), ViewColumn::new("")],
            ..CreateViewOptions::new(view(), "SELECT 1, 2, 3")
        };
        let errs = validate(&opts).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(
            errs.iter()
                .all(|e| *e == err_invalid_value("ViewColumn", "name", "must not be empty"))
        );
    }

    #[test]
    fn alter_secure() {
        let opts = AlterViewOptions {
            name: view(),
            unset_secure: Some(true),
            ..Default::default()
        };
        assert!(validate(&opts).is_ok());
        assert_eq!(
            compile(&opts).unwrap(),
            r#"ALTER VIEW "db"."sch"."v" UNSET SECURE"#
        );
    }

    #[test]
    fn extracts_body_after_top_level_as() {
        assert_eq!(
            extract_view_body("CREATE VIEW v AS SELECT 1"),
            Some("SELECT 1")
        );
        assert_eq!(
            extract_view_body(
                "create or replace view V (A COMMENT 'known as a', B) comment = 'alias as b' as\nselect a, b as c from t"
            ),
            Some("select a, b as c from t")
        );
        assert_eq!(
            extract_view_body(r#"CREATE VIEW "AS" AS SELECT 'x'"#),
            Some("SELECT 'x'")
        );
        assert_eq!(extract_view_body("CREATE VIEW ALIAS_VIEW"), None);
        assert_eq!(extract_view_body("CREATE VIEW v AS   "), None);
    }

    #[test]
    fn converts_rows() {
        let row = Row::from_pairs([
            ("created_on", "2024-01-01"),
            ("name", "V"),
            ("database_name", "DB"),
            ("schema_name", "SCH"),
            ("text", "CREATE VIEW V AS SELECT 1"),
            ("is_secure", "true"),
            ("change_tracking", "ON"),
        ]);
        let view = View::from(ViewRow::from_row(&row).unwrap());
        assert_eq!(view.id(), SchemaObjectIdentifier::new("DB", "SCH", "V"));
        assert_eq!(view.body(), Some("SELECT 1"));
        assert!(view.is_secure);
        assert!(view.change_tracking);
        assert!(!view.is_materialized);
    }
}
