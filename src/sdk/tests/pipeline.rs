// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! End-to-end tests of the resource APIs against an in-memory connection
//! that records every statement it receives.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;
use wh_ddl::field::Role;
use wh_ddl::{
    AccountObjectIdentifier, Field, ObjectType, Options, SchemaObjectIdentifier, Value,
};
use wh_sdk::comments::CommentOptions;
use wh_sdk::databases::{AlterDatabaseOptions, DatabaseSet};
use wh_sdk::exec::validate_and_exec;
use wh_sdk::sequences::{CreateSequenceOptions, ShowSequenceOptions, ValuesBehavior};
use wh_sdk::warehouses::CreateWarehouseOptions;
use wh_sdk::{Client, Connection, DriverError, ErrorKind, Row};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Default)]
struct Recorder {
    statements: Mutex<Vec<String>>,
    results: Mutex<VecDeque<Result<Vec<Row>, DriverError>>>,
    exec_error: Mutex<Option<DriverError>>,
}

impl Recorder {
    fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    fn push_rows(&self, rows: Vec<Row>) {
        self.results.lock().unwrap().push_back(Ok(rows));
    }

    fn fail_next_exec(&self, err: DriverError) {
        *self.exec_error.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl Connection for Recorder {
    async fn exec(&self, sql: &str) -> Result<(), DriverError> {
        self.statements.lock().unwrap().push(sql.to_string());
        match self.exec_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, DriverError> {
        self.statements.lock().unwrap().push(sql.to_string());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }
}

fn setup() -> (Arc<Recorder>, Client) {
    init_tracing();
    let recorder = Arc::new(Recorder::default());
    let client = Client::new(recorder.clone());
    (recorder, client)
}

fn seq_id() -> SchemaObjectIdentifier {
    SchemaObjectIdentifier::new("db", "schema", "seq")
}

fn sequence_row(database: &str, schema: &str, name: &str) -> Row {
    Row::from_pairs([
        ("created_on", "2024-01-01 00:00:00"),
        ("name", name),
        ("schema_name", schema),
        ("database_name", database),
        ("next_value", "1"),
        ("interval", "1"),
        ("owner", "SYSADMIN"),
        ("comment", ""),
        ("ordered", "Y"),
    ])
}

#[tokio::test]
async fn create_sends_compiled_statement() {
    let (recorder, client) = setup();
    let opts = CreateSequenceOptions {
        or_replace: Some(true),
        with: Some(true),
        start: Some(1),
        increment: Some(1),
        values_behavior: Some(ValuesBehavior::Order),
        comment: Some("comment".into()),
        ..CreateSequenceOptions::new(seq_id())
    };
    client.sequences().create(&opts).await.unwrap();
    assert_eq!(
        recorder.statements(),
        vec![
            r#"CREATE OR REPLACE SEQUENCE "db"."schema"."seq" WITH START = 1 INCREMENT = 1 ORDER COMMENT = 'comment'"#
        ]
    );
}

#[tokio::test]
async fn invalid_options_never_reach_the_connection() {
    let (recorder, client) = setup();
    let opts = CreateSequenceOptions {
        or_replace: Some(true),
        if_not_exists: Some(true),
        ..CreateSequenceOptions::new(seq_id())
    };
    let err = client.sequences().create(&opts).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("or_replace, if_not_exists"));

    let alter = AlterDatabaseOptions {
        set: Some(DatabaseSet::default()),
        ..AlterDatabaseOptions::new(AccountObjectIdentifier::new("db"))
    };
    let err = client.databases().alter(&alter).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert!(recorder.statements().is_empty());
}

/// Passes validation but names text where an identifier belongs.
#[derive(Debug)]
struct MistypedIdentifier;

impl Options for MistypedIdentifier {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::fixed("DROP TABLE"),
            Field::new(Role::Identifier(None), Some(Value::Text("t".into()))),
        ]
    }
}

#[tokio::test]
async fn render_errors_never_reach_the_connection() {
    let (recorder, client) = setup();
    let err = validate_and_exec(client.connection(), &MistypedIdentifier)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert!(err.to_string().contains("identifier field cannot render a text value"));
    assert!(recorder.statements().is_empty());
}

#[tokio::test]
async fn driver_errors_are_translated() {
    let (recorder, client) = setup();
    recorder.fail_next_exec(DriverError::new(
        "SQL compilation error: Database 'DB' does not exist or not authorized.",
    ));
    let alter = AlterDatabaseOptions {
        set: Some(DatabaseSet {
            comment: Some("c".into()),
            ..Default::default()
        }),
        ..AlterDatabaseOptions::new(AccountObjectIdentifier::new("db"))
    };
    let err = client.databases().alter(&alter).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ObjectNotExistOrAuthorized);

    recorder.fail_next_exec(DriverError::new("syntax error").with_code("42601"));
    let err = client
        .warehouses()
        .create(&CreateWarehouseOptions::new(AccountObjectIdentifier::new("wh")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Driver);
    assert_eq!(recorder.statements().len(), 2);
}

#[tokio::test]
async fn show_maps_rows_to_entities() {
    let (recorder, client) = setup();
    recorder.push_rows(vec![
        sequence_row("db", "schema", "seq"),
        sequence_row("db", "schema", "seq_2"),
    ]);
    let sequences = client
        .sequences()
        .show(&ShowSequenceOptions::default())
        .await
        .unwrap();
    assert_eq!(sequences.len(), 2);
    assert_eq!(sequences[1].name, "seq_2");
    assert!(sequences[0].ordered);
    assert_eq!(recorder.statements(), vec!["SHOW SEQUENCES"]);
}

#[tokio::test]
async fn show_by_id_filters_pattern_matches() {
    let (recorder, client) = setup();
    // `_` in a LIKE pattern matches any character, so the server may return
    // more than the requested sequence.
    recorder.push_rows(vec![
        sequence_row("db", "schema", "seqX"),
        sequence_row("db", "schema", "seq"),
    ]);
    let sequence = client.sequences().show_by_id(&seq_id()).await.unwrap();
    assert_eq!(sequence.id(), seq_id());
    assert_eq!(
        recorder.statements(),
        vec![r#"SHOW SEQUENCES LIKE 'seq' IN SCHEMA "db"."schema""#]
    );

    recorder.push_rows(vec![sequence_row("db", "schema", "other")]);
    let err = client.sequences().show_by_id(&seq_id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
    assert!(err.is_not_found());
}

#[tokio::test]
async fn describe_requires_exactly_one_row() {
    let (recorder, client) = setup();
    let err = client.sequences().describe(&seq_id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
    assert_eq!(err.to_string(), r#""db"."schema"."seq" not found"#);

    recorder.push_rows(vec![
        sequence_row("db", "schema", "seq"),
        sequence_row("db", "schema", "seq"),
    ]);
    let err = client.sequences().describe(&seq_id()).await.unwrap_err();
    assert!(matches!(err, wh_sdk::Error::TooManyRows { count: 2 }));

    recorder.push_rows(vec![sequence_row("db", "schema", "seq")]);
    let sequence = client.sequences().describe(&seq_id()).await.unwrap();
    assert_eq!(sequence.owner, "SYSADMIN");
    assert_eq!(
        recorder.statements()[0],
        r#"DESCRIBE SEQUENCE "db"."schema"."seq""#
    );
}

#[tokio::test]
async fn malformed_rows_are_decode_errors() {
    let (recorder, client) = setup();
    recorder.push_rows(vec![Row::from_pairs([("name", "seq")])]);
    let err = client
        .sequences()
        .show(&ShowSequenceOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn handlers_share_one_client() {
    let (recorder, client) = setup();
    let names = ["a", "b", "c"];
    let creates = names.map(|name| {
        let client = client.clone();
        tokio::spawn(async move {
            let opts = CreateSequenceOptions::new(SchemaObjectIdentifier::new("db", "sch", name));
            client.sequences().create(&opts).await
        })
    });
    for create in creates {
        create.await.unwrap().unwrap();
    }
    let mut statements = recorder.statements();
    statements.sort();
    assert_eq!(
        statements,
        vec![
            r#"CREATE SEQUENCE "db"."sch"."a""#,
            r#"CREATE SEQUENCE "db"."sch"."b""#,
            r#"CREATE SEQUENCE "db"."sch"."c""#,
        ]
    );

    client
        .comments()
        .set(&CommentOptions::new(
            ObjectType::Sequence,
            SchemaObjectIdentifier::new("db", "sch", "a"),
            "first",
        ))
        .await
        .unwrap();
    assert_eq!(
        recorder.statements().last().unwrap(),
        r#"COMMENT ON SEQUENCE "db"."sch"."a" IS 'first'"#
    );
}
