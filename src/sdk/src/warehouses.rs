// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Warehouses: the compute clusters that run queries.

use wh_ddl::validation::{
    any_value_set, err_at_least_one_of, err_exactly_one_of, err_invalid_value,
    err_one_of, exactly_one_value_set, is_true,
};
use wh_ddl::{
    AccountObjectIdentifier, Field, ObjectIdentifier, Options, SchemaObjectIdentifier,
    ValidationErrors, impl_is_set, sql_keyword_enum,
};

use crate::client::Connection;
use crate::common::{Like, TagAssociation, any_flag_true, flag_list};
use crate::error::Error;
use crate::exec::{find_one, validate_and_exec, validate_and_query};
use crate::row::{DecodeError, FromRow, Row};

const MAX_CLUSTER_COUNT: u32 = 10;
const MAX_QUERY_ACCELERATION_SCALE_FACTOR: u32 = 100;

sql_keyword_enum! {
    pub enum WarehouseType {
        Standard => "STANDARD",
        SnowparkOptimized => "SNOWPARK-OPTIMIZED",
    }
}

sql_keyword_enum! {
    pub enum WarehouseSize {
        XSmall => "XSMALL",
        Small => "SMALL",
        Medium => "MEDIUM",
        Large => "LARGE",
        XLarge => "XLARGE",
        XXLarge => "XXLARGE",
        XXXLarge => "XXXLARGE",
        X4Large => "X4LARGE",
        X5Large => "X5LARGE",
        X6Large => "X6LARGE",
    }
}

sql_keyword_enum! {
    pub enum ScalingPolicy {
        Standard => "STANDARD",
        Economy => "ECONOMY",
    }
}

/// Range checks shared by `CREATE WAREHOUSE` and `ALTER WAREHOUSE ... SET`.
fn check_properties(
    record: &'static str,
    min_cluster_count: Option<u32>,
    max_cluster_count: Option<u32>,
    scale_factor: Option<u32>,
    errs: &mut ValidationErrors,
) {
    for (field, count) in [
        ("min_cluster_count", min_cluster_count),
        ("max_cluster_count", max_cluster_count),
    ] {
        if let Some(count) = count {
            errs.check(!(1..=MAX_CLUSTER_COUNT).contains(&count), || {
                err_invalid_value(
                    record,
                    field,
                    format!("must be between 1 and {MAX_CLUSTER_COUNT}"),
                )
            });
        }
    }
    if let (Some(min), Some(max)) = (min_cluster_count, max_cluster_count) {
        errs.check(min > max, || {
            err_invalid_value(
                record,
                "min_cluster_count",
                "must not exceed max_cluster_count",
            )
        });
    }
    if let Some(factor) = scale_factor {
        errs.check(factor > MAX_QUERY_ACCELERATION_SCALE_FACTOR, || {
            err_invalid_value(
                record,
                "query_acceleration_max_scale_factor",
                format!("must be at most {MAX_QUERY_ACCELERATION_SCALE_FACTOR}"),
            )
        });
    }
}

/// `CREATE [OR REPLACE] WAREHOUSE [IF NOT EXISTS] <name> [WITH] <properties>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateWarehouseOptions {
    pub or_replace: Option<bool>,
    pub if_not_exists: Option<bool>,
    pub name: AccountObjectIdentifier,
    pub warehouse_type: Option<WarehouseType>,
    pub warehouse_size: Option<WarehouseSize>,
    pub max_cluster_count: Option<u32>,
    pub min_cluster_count: Option<u32>,
    pub scaling_policy: Option<ScalingPolicy>,
    pub auto_suspend: Option<u32>,
    pub auto_resume: Option<bool>,
    pub initially_suspended: Option<bool>,
    pub resource_monitor: Option<AccountObjectIdentifier>,
    pub comment: Option<String>,
    pub enable_query_acceleration: Option<bool>,
    pub query_acceleration_max_scale_factor: Option<u32>,
    pub tags: Vec<TagAssociation>,
}

impl CreateWarehouseOptions {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        CreateWarehouseOptions {
            name,
            ..Default::default()
        }
    }
}

impl Options for CreateWarehouseOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("CREATE"),
            Field::keyword("OR REPLACE", self.or_replace),
            Field::fixed("WAREHOUSE"),
            Field::keyword("IF NOT EXISTS", self.if_not_exists),
            Field::identifier(&self.name),
            Field::parameter("WAREHOUSE_TYPE", self.warehouse_type.as_ref()).single_quotes(),
            Field::parameter("WAREHOUSE_SIZE", self.warehouse_size.as_ref()),
            Field::parameter("MAX_CLUSTER_COUNT", self.max_cluster_count.as_ref()),
            Field::parameter("MIN_CLUSTER_COUNT", self.min_cluster_count.as_ref()),
            Field::parameter("SCALING_POLICY", self.scaling_policy.as_ref()),
            Field::parameter("AUTO_SUSPEND", self.auto_suspend.as_ref()),
            Field::parameter("AUTO_RESUME", self.auto_resume.as_ref()),
            Field::parameter("INITIALLY_SUSPENDED", self.initially_suspended.as_ref()),
            Field::named_identifier("RESOURCE_MONITOR", self.resource_monitor.as_ref()).equals(),
            Field::parameter("COMMENT", self.comment.as_ref()).single_quotes(),
            Field::parameter(
                "ENABLE_QUERY_ACCELERATION",
                self.enable_query_acceleration.as_ref(),
            ),
            Field::parameter(
                "QUERY_ACCELERATION_MAX_SCALE_FACTOR",
                self.query_acceleration_max_scale_factor.as_ref(),
            ),
            Field::record_list(Some("WITH TAG"), &self.tags),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
        if let Some(monitor) = &self.resource_monitor {
            errs.identifier("resource_monitor", monitor);
        }
        errs.check(
            is_true(self.or_replace) && is_true(self.if_not_exists),
            || err_one_of("CreateWarehouseOptions", &["or_replace", "if_not_exists"]),
        );
        check_properties(
            "CreateWarehouseOptions",
            self.min_cluster_count,
            self.max_cluster_count,
            self.query_acceleration_max_scale_factor,
            errs,
        );
    }
}

/// The `SET` clause of `ALTER WAREHOUSE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarehouseSet {
    pub warehouse_type: Option<WarehouseType>,
    pub warehouse_size: Option<WarehouseSize>,
    pub wait_for_completion: Option<bool>,
    pub max_cluster_count: Option<u32>,
    pub min_cluster_count: Option<u32>,
    pub scaling_policy: Option<ScalingPolicy>,
    pub auto_suspend: Option<u32>,
    pub auto_resume: Option<bool>,
    pub resource_monitor: Option<AccountObjectIdentifier>,
    pub comment: Option<String>,
    pub enable_query_acceleration: Option<bool>,
    pub query_acceleration_max_scale_factor: Option<u32>,
}

impl Options for WarehouseSet {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::parameter("WAREHOUSE_TYPE", self.warehouse_type.as_ref()).single_quotes(),
            Field::parameter("WAREHOUSE_SIZE", self.warehouse_size.as_ref()),
            Field::parameter("WAIT_FOR_COMPLETION", self.wait_for_completion.as_ref()),
            Field::parameter("MAX_CLUSTER_COUNT", self.max_cluster_count.as_ref()),
            Field::parameter("MIN_CLUSTER_COUNT", self.min_cluster_count.as_ref()),
            Field::parameter("SCALING_POLICY", self.scaling_policy.as_ref()),
            Field::parameter("AUTO_SUSPEND", self.auto_suspend.as_ref()),
            Field::parameter("AUTO_RESUME", self.auto_resume.as_ref()),
            Field::named_identifier("RESOURCE_MONITOR", self.resource_monitor.as_ref()).equals(),
            Field::parameter("COMMENT", self.comment.as_ref()).single_quotes(),
            Field::parameter(
                "ENABLE_QUERY_ACCELERATION",
                self.enable_query_acceleration.as_ref(),
            ),
            Field::parameter(
                "QUERY_ACCELERATION_MAX_SCALE_FACTOR",
                self.query_acceleration_max_scale_factor.as_ref(),
            ),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.check(
            !any_value_set(&[
                &self.warehouse_type,
                &self.warehouse_size,
                &self.max_cluster_count,
                &self.min_cluster_count,
                &self.scaling_policy,
                &self.auto_suspend,
                &self.auto_resume,
                &self.resource_monitor,
                &self.comment,
                &self.enable_query_acceleration,
                &self.query_acceleration_max_scale_factor,
            ]),
            || {
                err_at_least_one_of(
                    "WarehouseSet",
                    &[
                        "warehouse_type",
                        "warehouse_size",
                        "max_cluster_count",
                        "min_cluster_count",
                        "scaling_policy",
                        "auto_suspend",
                        "auto_resume",
                        "resource_monitor",
                        "comment",
                        "enable_query_acceleration",
                        "query_acceleration_max_scale_factor",
                    ],
                )
            },
        );
        errs.check(
            self.wait_for_completion.is_some() && self.warehouse_size.is_none(),
            || {
                err_invalid_value(
                    "WarehouseSet",
                    "wait_for_completion",
                    "requires warehouse_size",
                )
            },
        );
        if let Some(monitor) = &self.resource_monitor {
            errs.identifier("resource_monitor", monitor);
        }
        check_properties(
            "WarehouseSet",
            self.min_cluster_count,
            self.max_cluster_count,
            self.query_acceleration_max_scale_factor,
            errs,
        );
    }
}

/// The `UNSET` clause of `ALTER WAREHOUSE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarehouseUnset {
    pub warehouse_type: Option<bool>,
    pub max_cluster_count: Option<bool>,
    pub min_cluster_count: Option<bool>,
    pub scaling_policy: Option<bool>,
    pub auto_suspend: Option<bool>,
    pub auto_resume: Option<bool>,
    pub resource_monitor: Option<bool>,
    pub comment: Option<bool>,
    pub enable_query_acceleration: Option<bool>,
    pub query_acceleration_max_scale_factor: Option<bool>,
}

impl WarehouseUnset {
    fn flags(&self) -> [(&'static str, Option<bool>); 10] {
        [
            ("WAREHOUSE_TYPE", self.warehouse_type),
            ("MAX_CLUSTER_COUNT", self.max_cluster_count),
            ("MIN_CLUSTER_COUNT", self.min_cluster_count),
            ("SCALING_POLICY", self.scaling_policy),
            ("AUTO_SUSPEND", self.auto_suspend),
            ("AUTO_RESUME", self.auto_resume),
            ("RESOURCE_MONITOR", self.resource_monitor),
            ("COMMENT", self.comment),
            ("ENABLE_QUERY_ACCELERATION", self.enable_query_acceleration),
            (
                "QUERY_ACCELERATION_MAX_SCALE_FACTOR",
                self.query_acceleration_max_scale_factor,
            ),
        ]
    }
}

impl Options for WarehouseUnset {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![flag_list(&self.flags())]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.check(!any_flag_true(&self.flags().map(|(_, flag)| flag)), || {
            err_at_least_one_of(
                "WarehouseUnset",
                &[
                    "warehouse_type",
                    "max_cluster_count",
                    "min_cluster_count",
                    "scaling_policy",
                    "auto_suspend",
                    "auto_resume",
                    "resource_monitor",
                    "comment",
                    "enable_query_acceleration",
                    "query_acceleration_max_scale_factor",
                ],
            )
        });
    }
}

impl_is_set!(WarehouseSet, WarehouseUnset);

/// `ALTER WAREHOUSE [IF EXISTS] <name> <action>`, with exactly one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlterWarehouseOptions {
    pub if_exists: Option<bool>,
    pub name: AccountObjectIdentifier,
    pub suspend: Option<bool>,
    pub resume: Option<bool>,
    pub if_suspended: Option<bool>,
    pub abort_all_queries: Option<bool>,
    pub new_name: Option<AccountObjectIdentifier>,
    pub set: Option<WarehouseSet>,
    pub unset: Option<WarehouseUnset>,
    pub set_tags: Vec<TagAssociation>,
    pub unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterWarehouseOptions {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        AlterWarehouseOptions {
            name,
            ..Default::default()
        }
    }
}

impl Options for AlterWarehouseOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("ALTER WAREHOUSE"),
            Field::keyword("IF EXISTS", self.if_exists),
            Field::identifier(&self.name),
            Field::keyword("SUSPEND", self.suspend),
            Field::keyword("RESUME", self.resume),
            Field::keyword("IF SUSPENDED", self.if_suspended),
            Field::keyword("ABORT ALL QUERIES", self.abort_all_queries),
            Field::named_identifier("RENAME TO", self.new_name.as_ref()),
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
        errs.check(
            !exactly_one_value_set(&[
                &self.suspend,
                &self.resume,
                &self.abort_all_queries,
                &self.new_name,
                &self.set,
                &self.unset,
                &self.set_tags,
                &self.unset_tags,
            ]),
            || {
                err_exactly_one_of(
                    "AlterWarehouseOptions",
                    &[
                        "suspend",
                        "resume",
                        "abort_all_queries",
                        "new_name",
                        "set",
                        "unset",
                        "set_tags",
                        "unset_tags",
                    ],
                )
            },
        );
        errs.check(
            is_true(self.if_suspended) && !is_true(self.resume),
            || err_invalid_value("AlterWarehouseOptions", "if_suspended", "requires resume"),
        );
    }
}

/// `DROP WAREHOUSE [IF EXISTS] <name>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropWarehouseOptions {
    pub if_exists: Option<bool>,
    pub name: AccountObjectIdentifier,
}

impl Options for DropWarehouseOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("DROP WAREHOUSE"),
            Field::keyword("IF EXISTS", self.if_exists),
            Field::identifier(&self.name),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
    }
}

/// `SHOW WAREHOUSES [LIKE '<pattern>']`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowWarehousesOptions {
    pub like: Option<Like>,
}

impl Options for ShowWarehousesOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("SHOW WAREHOUSES"),
            Field::record(None, self.like.as_ref()),
        ]
    }
}

/// `DESCRIBE WAREHOUSE <name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeWarehouseOptions {
    pub name: AccountObjectIdentifier,
}

impl Options for DescribeWarehouseOptions {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("DESCRIBE WAREHOUSE"),
            Field::identifier(&self.name),
        ]
    }

    fn check(&self, errs: &mut ValidationErrors) {
        errs.identifier("name", &self.name);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseRow {
    pub name: String,
    pub state: String,
    pub warehouse_type: String,
    pub size: String,
    pub min_cluster_count: Option<u32>,
    pub max_cluster_count: Option<u32>,
    pub started_clusters: Option<u32>,
    pub running: Option<u32>,
    pub queued: Option<u32>,
    pub is_default: Option<bool>,
    pub is_current: Option<bool>,
    pub auto_suspend: Option<String>,
    pub auto_resume: Option<bool>,
    pub created_on: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub enable_query_acceleration: Option<bool>,
    pub query_acceleration_max_scale_factor: Option<u32>,
    pub resource_monitor: Option<String>,
    pub scaling_policy: Option<String>,
}

impl FromRow for WarehouseRow {
    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(WarehouseRow {
            name: row.require("name")?,
            state: row.require("state")?,
            warehouse_type: row.require("type")?,
            size: row.require("size")?,
            min_cluster_count: row.get_opt("min_cluster_count")?,
            max_cluster_count: row.get_opt("max_cluster_count")?,
            started_clusters: row.get_opt("started_clusters")?,
            running: row.get_opt("running")?,
            queued: row.get_opt("queued")?,
            is_default: row.get_opt("is_default")?,
            is_current: row.get_opt("is_current")?,
            auto_suspend: row.get_opt("auto_suspend")?,
            auto_resume: row.get_opt("auto_resume")?,
            created_on: row.require("created_on")?,
            owner: row.get_opt("owner")?,
            comment: row.get_opt("comment")?,
            enable_query_acceleration: row.get_opt("enable_query_acceleration")?,
            query_acceleration_max_scale_factor: row
                .get_opt("query_acceleration_max_scale_factor")?,
            resource_monitor: row.get_opt("resource_monitor")?,
            scaling_policy: row.get_opt("scaling_policy")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Warehouse {
    pub name: String,
    pub state: String,
    pub warehouse_type: Option<WarehouseType>,
    /// As displayed by the server, e.g. `X-Small`.
    pub size: String,
    pub min_cluster_count: u32,
    pub max_cluster_count: u32,
    pub started_clusters: u32,
    pub running: u32,
    pub queued: u32,
    pub is_default: bool,
    pub is_current: bool,
    /// Seconds of inactivity before suspension. `None` when auto suspend is
    /// disabled.
    pub auto_suspend: Option<u32>,
    pub auto_resume: bool,
    pub created_on: String,
    pub owner: String,
    pub comment: String,
    pub enable_query_acceleration: bool,
    pub query_acceleration_max_scale_factor: u32,
    pub resource_monitor: Option<AccountObjectIdentifier>,
    pub scaling_policy: Option<ScalingPolicy>,
}

impl Warehouse {
    pub fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

impl From<WarehouseRow> for Warehouse {
    fn from(row: WarehouseRow) -> Self {
        Warehouse {
            name: row.name,
            state: row.state,
            warehouse_type: WarehouseType::from_sql(&row.warehouse_type),
            size: row.size,
            min_cluster_count: row.min_cluster_count.unwrap_or(1),
            max_cluster_count: row.max_cluster_count.unwrap_or(1),
            started_clusters: row.started_clusters.unwrap_or(0),
            running: row.running.unwrap_or(0),
            queued: row.queued.unwrap_or(0),
            is_default: row.is_default.unwrap_or(false),
            is_current: row.is_current.unwrap_or(false),
            auto_suspend: row
                .auto_suspend
                .and_then(|s| s.trim().parse().ok())
                .filter(|secs| *secs > 0),
            auto_resume: row.auto_resume.unwrap_or(false),
            created_on: row.created_on,
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            enable_query_acceleration: row.enable_query_acceleration.unwrap_or(false),
            query_acceleration_max_scale_factor: row
                .query_acceleration_max_scale_factor
                .unwrap_or(0),
            resource_monitor: row
                .resource_monitor
                .filter(|m| !m.is_empty() && m != "null")
                .map(AccountObjectIdentifier::new),
            scaling_policy: row
                .scaling_policy
                .as_deref()
                .and_then(ScalingPolicy::from_sql),
        }
    }
}

/// One property listed by `DESCRIBE WAREHOUSE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseDetails {
    pub created_on: String,
    pub name: String,
    pub kind: String,
}

impl FromRow for WarehouseDetails {
    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(WarehouseDetails {
            created_on: row.require("created_on")?,
            name: row.require("name")?,
            kind: row.require("kind")?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WarehousesApi<'a> {
    conn: &'a dyn Connection,
}

impl<'a> WarehousesApi<'a> {
    pub(crate) fn new(conn: &'a dyn Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, opts: &CreateWarehouseOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn alter(&self, opts: &AlterWarehouseOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn drop(&self, opts: &DropWarehouseOptions) -> Result<(), Error> {
        validate_and_exec(self.conn, opts).await
    }

    pub async fn show(&self, opts: &ShowWarehousesOptions) -> Result<Vec<Warehouse>, Error> {
        validate_and_query::<_, WarehouseRow, _>(self.conn, opts).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> Result<Warehouse, Error> {
        let opts = ShowWarehousesOptions {
            like: Some(Like::new(id.name())),
        };
        let warehouses = self.show(&opts).await?;
        find_one(warehouses, |w| w.id() == *id, id)
    }

    pub async fn describe(
        &self,
        id: &AccountObjectIdentifier,
    ) -> Result<Vec<WarehouseDetails>, Error> {
        let opts = DescribeWarehouseOptions { name: id.clone() };
        validate_and_query::<_, WarehouseDetails, _>(self.conn, &opts).await
    }
}
