// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The validate, compile, execute, decode pipeline every resource handler
//! runs through.
//!
//! Validation and rendering failures abort before anything is sent, so the
//! connection never sees a statement built from invalid options.

use std::fmt;

use itertools::Itertools;
use tracing::debug;
use wh_ddl::{Options, compile, validate};

use crate::client::Connection;
use crate::error::Error;
use crate::row::FromRow;

/// Validates and compiles `opts` into SQL text without running it.
pub fn prepare<O: Options + ?Sized>(opts: &O) -> Result<String, Error> {
    validate(opts)?;
    Ok(compile(opts)?)
}

/// Validates, compiles and runs a statement that returns no rows.
pub async fn validate_and_exec<O: Options + ?Sized>(
    conn: &dyn Connection,
    opts: &O,
) -> Result<(), Error> {
    let sql = prepare(opts)?;
    debug!(%sql, "executing statement");
    conn.exec(&sql).await?;
    Ok(())
}

/// Validates, compiles and runs a statement, decoding every returned row as
/// `R` and converting it into the public entity `E`.
pub async fn validate_and_query<O, R, E>(conn: &dyn Connection, opts: &O) -> Result<Vec<E>, Error>
where
    O: Options + ?Sized,
    R: FromRow,
    E: From<R>,
{
    let sql = prepare(opts)?;
    debug!(%sql, "running query");
    let rows = conn.query(&sql).await?;
    debug!(rows = rows.len(), "query returned");
    rows.iter()
        .map(|row| R::from_row(row).map(E::from).map_err(Error::from))
        .collect()
}

/// Like [`validate_and_query`], for statements that must return exactly one
/// row. No rows means `what` does not exist.
pub async fn validate_and_query_one<O, R, E>(
    conn: &dyn Connection,
    opts: &O,
    what: impl fmt::Display,
) -> Result<E, Error>
where
    O: Options + ?Sized,
    R: FromRow,
    E: From<R>,
{
    validate_and_query::<O, R, E>(conn, opts)
        .await?
        .into_iter()
        .exactly_one()
        .map_err(|rest| match rest.count() {
            0 => Error::not_found(what),
            count => Error::TooManyRows { count },
        })
}

/// Picks the first item matching `predicate`, for lookups implemented as a
/// filtered `SHOW`.
pub fn find_one<T>(
    items: impl IntoIterator<Item = T>,
    predicate: impl FnMut(&T) -> bool,
    what: impl fmt::Display,
) -> Result<T, Error> {
    items
        .into_iter()
        .find(predicate)
        .ok_or_else(|| Error::not_found(what))
}
