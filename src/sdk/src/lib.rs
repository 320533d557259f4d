// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Resource handlers for a cloud data warehouse.
//!
//! Each resource module (sequences, databases, ...) declares one options
//! record per statement shape and an API that runs them through the
//! [`exec`] pipeline: validate, compile, execute, decode. The pipeline talks
//! to the database through the [`Connection`] trait, implemented over the
//! PostgreSQL wire protocol by [`postgres::PgConnection`].
//!
//! The library emits `tracing` events but never installs a subscriber.

pub mod client;
pub mod comments;
pub mod common;
pub mod config;
pub mod databases;
pub mod error;
pub mod exec;
pub mod postgres;
pub mod roles;
pub mod row;
pub mod schemas;
pub mod sequences;
pub mod views;
pub mod warehouses;

pub use crate::client::{Client, Connection};
pub use crate::config::{ConnectionProfile, ProfilesConfig};
pub use crate::error::{DriverError, Error, ErrorKind};
pub use crate::row::{FromColumn, FromRow, Row};
