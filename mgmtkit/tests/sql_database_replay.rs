//! End-to-end tests for `Get-AzureSqlDatabase` against recorded sessions.
//!
//! The command sends real HTTP requests to a mock server replaying the
//! recording; the OData validator checks every request on the way in.

use std::sync::Arc;

use mgmtkit::prelude::*;
use mgmtkit_testing::assertions::{assert_no_fault, assert_no_more_requests};
use mgmtkit_testing::fixtures::{self, GET_DATABASE_SESSION, TEST_SERVER_NAME, TEST_USER_AGENT};
use mgmtkit_testing::{ExceptionManager, MockHttpServer, MockServerConfig, init_tracing};
use pretty_assertions::assert_eq;

fn context() -> ExecutionContext {
    ExecutionContext::new().with_user_agent(TEST_USER_AGENT)
}

fn start(exceptions: &ExceptionManager, session: HttpSession) -> MockHttpServer {
    let session = session.with_validator(fixtures::odata_validator());
    MockHttpServer::start_with_config(exceptions, MockServerConfig::ephemeral(), session).unwrap()
}

fn client(server: &MockHttpServer, ctx: &ExecutionContext) -> Arc<SqlDatabaseClient> {
    let config = SqlClientConfig::new(server.uri().clone(), TEST_SERVER_NAME);
    Arc::new(SqlDatabaseClient::new(config, ctx).unwrap())
}

async fn run(command: GetAzureSqlDatabaseCommand, ctx: &ExecutionContext) -> OutputStreams {
    let mut command = command;
    let mut streams = OutputStreams::new();
    command.execute_cmdlet(ctx, &mut streams).await.unwrap();
    streams
}

fn single_database(streams: &OutputStreams) -> Database {
    assert_eq!(streams.objects.len(), 1, "Expecting a single Database object");
    streams.objects[0]
        .as_database()
        .cloned()
        .expect("Expecting a Database object")
}

fn assert_testdb2(db: &Database) {
    assert_eq!(db.name, "testdb2");
    assert_eq!(db.collation_name, "Japanese_CI_AS");
    assert_eq!(db.edition, "Web");
    assert_eq!(db.max_size_gb, 5);
}

#[tokio::test]
async fn test_get_database_with_sql_auth() {
    init_tracing();
    let exceptions = ExceptionManager::new();
    let server = start(&exceptions, fixtures::get_database_session());
    let ctx = context();
    let client = client(&server, &ctx);

    let databases = run(GetAzureSqlDatabaseCommand::new(Arc::clone(&client)), &ctx).await;
    let database1 = run(
        GetAzureSqlDatabaseCommand::new(Arc::clone(&client)).with_database_name("testdb1"),
        &ctx,
    )
    .await;
    let database2 = run(
        GetAzureSqlDatabaseCommand::new(Arc::clone(&client)).with_database_name("testdb2"),
        &ctx,
    )
    .await;
    server.stop().unwrap().assert_all_consumed();

    for streams in [&databases, &database1, &database2] {
        assert!(streams.errors.is_empty(), "Errors during run: {:?}", streams.errors);
        assert!(streams.warnings.is_empty(), "Warnings during run: {:?}", streams.warnings);
    }
    assert_eq!(databases.databases().len(), 3);
    assert_eq!(single_database(&database1).name, "testdb1");
    assert_testdb2(&single_database(&database2));
    assert_no_fault(exceptions);
}

#[tokio::test]
async fn test_get_database_with_sql_auth_by_pipe() {
    init_tracing();
    let exceptions = ExceptionManager::new();
    let server = start(&exceptions, fixtures::get_database_session());
    let ctx = context();
    let client = client(&server, &ctx);

    let mut databases = run(GetAzureSqlDatabaseCommand::new(Arc::clone(&client)), &ctx).await;
    let listed: Vec<Database> = databases
        .take_objects()
        .into_iter()
        .filter_map(|o| o.as_database().cloned())
        .collect();
    assert_eq!(listed.len(), 3);
    let testdb1 = listed.iter().find(|db| db.name == "testdb1").cloned().unwrap();
    let testdb2 = listed.iter().find(|db| db.name == "testdb2").cloned().unwrap();

    let database1 = run(GetAzureSqlDatabaseCommand::new(Arc::clone(&client)).with_database(testdb1), &ctx).await;
    let database2 = run(GetAzureSqlDatabaseCommand::new(Arc::clone(&client)).with_database(testdb2), &ctx).await;
    server.stop().unwrap().assert_all_consumed();

    assert!(database1.errors.is_empty() && database2.errors.is_empty());
    assert!(database1.warnings.is_empty() && database2.warnings.is_empty());
    assert_eq!(single_database(&database1).name, "testdb1");
    assert_testdb2(&single_database(&database2));
    assert_no_fault(exceptions);
}

#[tokio::test]
async fn test_request_past_recording_is_reported() {
    init_tracing();
    let mut exceptions = ExceptionManager::new();
    let server = start(&exceptions, fixtures::get_database_session());
    let ctx = context();
    let client = client(&server, &ctx);

    run(GetAzureSqlDatabaseCommand::new(Arc::clone(&client)), &ctx).await;
    for name in ["testdb1", "testdb2"] {
        run(GetAzureSqlDatabaseCommand::new(Arc::clone(&client)).with_database_name(name), &ctx).await;
    }
    let extra = run(
        GetAzureSqlDatabaseCommand::new(Arc::clone(&client)).with_database_name("testdb1"),
        &ctx,
    )
    .await;
    let report = server.stop().unwrap();

    assert_eq!(report.served, 4);
    assert!(extra.objects.is_empty());
    assert_eq!(extra.errors.len(), 1);
    assert_eq!(extra.errors[0].category, ErrorCategory::Service);
    assert!(extra.errors[0].message.contains("No more requests expected."));
    assert!(extra.warnings.len() >= 2);
    assert_no_more_requests(&mut exceptions, 3);
    assert_no_fault(exceptions);
}

#[tokio::test]
async fn test_get_database_with_sql_auth_non_existent_db() {
    init_tracing();
    let exceptions = ExceptionManager::new();
    let server = start(&exceptions, fixtures::get_missing_database_session());
    let ctx = context();
    let client = client(&server, &ctx);

    let streams = run(
        GetAzureSqlDatabaseCommand::new(Arc::clone(&client)).with_database_name("testdb3"),
        &ctx,
    )
    .await;
    server.stop().unwrap().assert_all_consumed();

    assert_eq!(streams.errors.len(), 1, "Expecting errors");
    assert_eq!(streams.warnings.len(), 2, "Expecting tracing IDs");
    assert_eq!(streams.errors[0].message, "Database 'testserver.testdb3' not found.");
    assert_eq!(streams.errors[0].category, ErrorCategory::ObjectNotFound);
    assert!(streams.warnings.iter().any(|w| w.starts_with("Client Session Id")));
    assert!(streams.warnings.iter().any(|w| w.starts_with("Client Request Id")));
    assert!(streams.warnings.iter().any(|w| w.contains(ctx.client_session_id())));
    assert_no_fault(exceptions);
}

#[tokio::test]
async fn test_session_loaded_from_fixture_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    fixtures::write_sample_store(&path).unwrap();
    let store = SessionStore::open(&path).unwrap();

    let exceptions = ExceptionManager::new();
    let server = start(&exceptions, store.get_session(GET_DATABASE_SESSION).unwrap());
    let ctx = context();
    let client = client(&server, &ctx);

    let databases = run(GetAzureSqlDatabaseCommand::new(client), &ctx).await;
    let names: Vec<&str> = databases
        .objects
        .iter()
        .filter_map(PipelineObject::as_database)
        .map(|db| db.name.as_str())
        .collect();
    assert_eq!(names, vec!["master", "testdb1", "testdb2"]);

    let report = server.stop().unwrap();
    assert_eq!((report.served, report.expected), (1, 3));
    assert_no_fault(exceptions);
}

#[tokio::test]
async fn test_warning_reports_session_id_sent_by_client() {
    init_tracing();
    let exceptions = ExceptionManager::new();
    let server = start(&exceptions, fixtures::get_missing_database_session());
    let client_ctx = context().with_client_session_id("client-session");
    let run_ctx = context().with_client_session_id("other-session");
    let client = client(&server, &client_ctx);

    let streams = run(
        GetAzureSqlDatabaseCommand::new(client).with_database_name("testdb3"),
        &run_ctx,
    )
    .await;
    server.stop().unwrap().assert_all_consumed();

    assert_eq!(streams.warnings[0], "Client Session Id: 'client-session'");
    assert_no_fault(exceptions);
}
