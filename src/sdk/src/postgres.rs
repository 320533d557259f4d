// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A [`Connection`] over the PostgreSQL wire protocol.

use std::fmt;

use async_trait::async_trait;
use tokio_postgres::{NoTls, SimpleQueryMessage};
use tracing::{error, info};

use crate::client::Connection;
use crate::config::ConnectionProfile;
use crate::error::DriverError;
use crate::row::Row;

pub struct PgConnection {
    client: tokio_postgres::Client,
}

impl fmt::Debug for PgConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnection")
            .field("closed", &self.client.is_closed())
            .finish_non_exhaustive()
    }
}

impl PgConnection {
    /// Opens a connection and drives it on a background tokio task.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverError`] if the endpoint cannot be reached or
    /// rejects the credentials.
    pub async fn connect(profile: &ConnectionProfile) -> Result<Self, DriverError> {
        let (client, connection) = profile
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| driver_error(&e))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        info!(host = %profile.host, port = profile.port, "connected");
        let conn = PgConnection { client };
        conn.apply_session(profile).await?;
        Ok(conn)
    }

    /// Selects the role and warehouse named by the profile, if any.
    async fn apply_session(&self, profile: &ConnectionProfile) -> Result<(), DriverError> {
        if let Some(role) = &profile.role {
            self.exec(&format!("USE ROLE {}", wh_ddl::identifier::quote_ident(role)))
                .await?;
        }
        if let Some(warehouse) = &profile.warehouse {
            self.exec(&format!(
                "USE WAREHOUSE {}",
                wh_ddl::identifier::quote_ident(warehouse)
            ))
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for PgConnection {
    async fn exec(&self, sql: &str) -> Result<(), DriverError> {
        self.client
            .batch_execute(sql)
            .await
            .map_err(|e| driver_error(&e))
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, DriverError> {
        let messages = self
            .client
            .simple_query(sql)
            .await
            .map_err(|e| driver_error(&e))?;
        Ok(messages
            .into_iter()
            .filter_map(|msg| match msg {
                SimpleQueryMessage::Row(row) => Some(convert_row(&row)),
                _ => None,
            })
            .collect())
    }
}

fn convert_row(row: &tokio_postgres::SimpleQueryRow) -> Row {
    Row::new(
        row.columns()
            .iter()
            .enumerate()
            .map(|(i, col)| (col.name().to_string(), row.get(i).map(str::to_string)))
            .collect(),
    )
}

fn driver_error(error: &tokio_postgres::Error) -> DriverError {
    match error.as_db_error() {
        Some(db_error) => {
            let mut message = db_error.message().to_string();
            if let Some(detail) = db_error.detail() {
                message.push_str(&format!("\n  Detail: {}", detail));
            }
            if let Some(hint) = db_error.hint() {
                message.push_str(&format!("\n  Hint: {}", hint));
            }
            DriverError::new(message).with_code(db_error.code().code())
        }
        None => DriverError::new(error.to_string()),
    }
}
