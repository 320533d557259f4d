// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Rows as returned by `SHOW` and `DESCRIBE` statements.
//!
//! Both statements return text columns, so a [`Row`] holds every value as an
//! optional string and [`FromColumn`] parses it on access.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("column '{0}' not present in row")]
    MissingColumn(String),
    #[error("column '{0}' is null")]
    NullColumn(String),
    #[error("column '{column}': cannot parse {value:?} as {ty}")]
    InvalidValue {
        column: String,
        value: String,
        ty: &'static str,
    },
}

/// One result row: ordered column names paired with nullable text values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, Option<String>)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Option<String>)>) -> Self {
        Row { columns }
    }

    /// Builds a row from non-null `(column, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Row {
            columns: pairs
                .into_iter()
                .map(|(c, v)| (c.to_string(), Some(v.to_string())))
                .collect(),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    fn raw(&self, column: &str) -> Result<Option<&str>, DecodeError> {
        self.columns
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(column))
            .map(|(_, v)| v.as_deref())
            .ok_or_else(|| DecodeError::MissingColumn(column.to_string()))
    }

    /// Decodes a nullable column. Fails only if the column is missing or its
    /// value does not parse.
    pub fn get<T: FromColumn>(&self, column: &str) -> Result<Option<T>, DecodeError> {
        match self.raw(column)? {
            Some(value) => T::from_column(value)
                .map(Some)
                .ok_or_else(|| DecodeError::InvalidValue {
                    column: column.to_string(),
                    value: value.to_string(),
                    ty: T::TYPE_NAME,
                }),
            None => Ok(None),
        }
    }

    /// Like [`Row::get`], for columns that are never null.
    pub fn require<T: FromColumn>(&self, column: &str) -> Result<T, DecodeError> {
        self.get(column)?
            .ok_or_else(|| DecodeError::NullColumn(column.to_string()))
    }

    /// Like [`Row::get`], for columns that only some server versions return.
    pub fn get_opt<T: FromColumn>(&self, column: &str) -> Result<Option<T>, DecodeError> {
        match self.get(column) {
            Err(DecodeError::MissingColumn(_)) => Ok(None),
            other => other,
        }
    }
}

/// Parses one text column value.
pub trait FromColumn: Sized {
    const TYPE_NAME: &'static str;

    fn from_column(value: &str) -> Option<Self>;
}

impl FromColumn for String {
    const TYPE_NAME: &'static str = "string";

    fn from_column(value: &str) -> Option<Self> {
        Some(value.to_string())
    }
}

impl FromColumn for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_column(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "y" | "yes" | "on" => Some(true),
            "false" | "f" | "n" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

macro_rules! impl_from_column_parse {
    ($($ty:ty => $name:literal),*) => {
        $(
            impl FromColumn for $ty {
                const TYPE_NAME: &'static str = $name;

                fn from_column(value: &str) -> Option<Self> {
                    value.trim().parse().ok()
                }
            }
        )*
    };
}

impl_from_column_parse!(
    i32 => "i32",
    i64 => "i64",
    u32 => "u32",
    u64 => "u64",
    f64 => "f64"
);

/// Decodes a [`Row`] into a row-shape record.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, DecodeError>;
}
