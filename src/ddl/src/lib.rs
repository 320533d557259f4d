// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Declarative options-to-SQL compilation.
//!
//! Each SQL statement shape (`CREATE SEQUENCE`, `ALTER DATABASE`, `SHOW
//! SCHEMAS`, ...) is described by an options record implementing
//! [`Options`]. A record lists its fields as an ordered table of
//! [`Field`]s, which [`compile`] renders into SQL text, and states its
//! invariants in [`Options::check`], which [`validate`] runs together with
//! the checks of every record nested inside it.
//!
//! Validation and compilation are separate passes. Compiling a record that
//! has not been validated renders whatever it holds.

pub mod compile;
pub mod field;
pub mod identifier;
pub mod validation;

pub use crate::compile::{Options, RenderError, compile};
pub use crate::field::{Field, ToValue, Value};
pub use crate::identifier::{
    AccountIdentifier, AccountObjectIdentifier, DatabaseObjectIdentifier, ExternalObjectIdentifier,
    IdentifierError, ObjectIdentifier, ObjectType, SchemaObjectIdentifier, TableColumnIdentifier,
};
pub use crate::validation::{ErrorKind, IsSet, ValidationError, ValidationErrors, validate};
