// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The database handle and the per-object APIs it hands out.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::comments::CommentsApi;
use crate::config::{ConnectionProfile, ProfilesConfig};
use crate::databases::DatabasesApi;
use crate::error::{DriverError, Error};
use crate::postgres::PgConnection;
use crate::roles::RolesApi;
use crate::row::Row;
use crate::schemas::SchemasApi;
use crate::sequences::SequencesApi;
use crate::views::ViewsApi;
use crate::warehouses::WarehousesApi;

/// Something that can run SQL text.
///
/// Implementations must be safe to share between tasks. The SDK never
/// retries, and an in-flight statement is cancelled by dropping its future.
#[async_trait]
pub trait Connection: fmt::Debug + Send + Sync {
    /// Runs a statement that returns no rows.
    async fn exec(&self, sql: &str) -> Result<(), DriverError>;

    /// Runs a statement and returns every row it produced.
    async fn query(&self, sql: &str) -> Result<Vec<Row>, DriverError>;
}

/// A warehouse client.
///
/// ```ignore
/// let client = Client::connect(&profile).await?;
/// client.sequences().create(&opts).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    conn: Arc<dyn Connection>,
}

impl Client {
    pub fn new(conn: Arc<dyn Connection>) -> Self {
        Client { conn }
    }

    /// Connects to the endpoint described by `profile`.
    pub async fn connect(profile: &ConnectionProfile) -> Result<Self, Error> {
        let conn = PgConnection::connect(profile).await?;
        Ok(Client::new(Arc::new(conn)))
    }

    /// Connects using a named profile, or the default one when `name` is
    /// `None`. `${VAR}` references in the profile are expanded first.
    pub async fn connect_with_profile(
        config: &ProfilesConfig,
        name: Option<&str>,
    ) -> Result<Self, Error> {
        let profile = match name {
            Some(name) => config.get_profile(name)?,
            None => config.get_default_profile()?,
        };
        let profile = config.expand_env_vars(profile)?;
        Self::connect(&profile).await
    }

    pub fn connection(&self) -> &dyn Connection {
        &*self.conn
    }

    pub fn sequences(&self) -> SequencesApi<'_> {
        SequencesApi::new(self.connection())
    }

    pub fn databases(&self) -> DatabasesApi<'_> {
        DatabasesApi::new(self.connection())
    }

    pub fn schemas(&self) -> SchemasApi<'_> {
        SchemasApi::new(self.connection())
    }

    pub fn warehouses(&self) -> WarehousesApi<'_> {
        WarehousesApi::new(self.connection())
    }

    pub fn roles(&self) -> RolesApi<'_> {
        RolesApi::new(self.connection())
    }

    pub fn views(&self) -> ViewsApi<'_> {
        ViewsApi::new(self.connection())
    }

    pub fn comments(&self) -> CommentsApi<'_> {
        CommentsApi::new(self.connection())
    }
}
