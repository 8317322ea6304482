//! Recorded sessions and validators shared by the test suites.
//!
//! The sessions here mirror what the commands send and receive against the
//! management service, so they can be replayed without network access.

use std::path::Path;

use mgmtkit_core::MgmtError;
use mgmtkit_core::http::{HttpMessage, HttpRequest, HttpResponse};
use mgmtkit_core::session::{HttpSession, SessionCollection, SessionSettings, SessionStore};
use mgmtkit_core::validator::{self, RequestValidator, ValidationError};
use serde_json::{Value, json};

/// User agent recorded in every fixture request.
pub const TEST_USER_AGENT: &str = "mgmtkit/0.4.0";

/// Server name substituted for `$(Servername)`.
pub const TEST_SERVER_NAME: &str = "testserver";

/// Subscription substituted for `$(SubscriptionId)`.
pub const TEST_SUBSCRIPTION_ID: &str = "6f9c1d52-2b4e-4d6a-9a1f-3c0e8e7b5a21";

/// Session listing and fetching the `testdb1` and `testdb2` databases.
pub const GET_DATABASE_SESSION: &str = "UnitTests.GetAzureSqlDatabaseWithSqlAuth";

/// Session fetching a database that does not exist.
pub const GET_MISSING_DATABASE_SESSION: &str = "UnitTests.GetAzureSqlDatabaseWithSqlAuthNonExistentDb";

/// Session creating a store add-on.
pub const NEW_ADD_ON_SESSION: &str = "UnitTests.NewAzureStoreAddOn";

/// Headers every OData request must repeat exactly.
pub const ODATA_HEADERS: &[&str] = &["Accept", "DataServiceVersion", "MaxDataServiceVersion"];

/// Headers carrying per-run tracing ids, which must be present.
pub const TRACING_HEADERS: &[&str] = &["x-ms-client-session-id", "x-ms-client-request-id"];

/// Headers every store request must repeat exactly.
pub const STORE_HEADERS: &[&str] = &["x-ms-version"];

const DATABASES_PATH: &str = "/v1/ManagementService.svc/Servers('$(Servername)')/Databases";

fn odata_request(url: String) -> HttpRequest {
    HttpRequest::new("GET", url)
        .with_header("User-Agent", TEST_USER_AGENT)
        .with_header("Accept", "application/json;odata=minimalmetadata")
        .with_header("DataServiceVersion", "3.0;NetFx")
        .with_header("MaxDataServiceVersion", "3.0;NetFx")
        .with_header("x-ms-client-session-id", "recorded-session-id")
        .with_header("x-ms-client-request-id", "recorded-request-id")
}

fn odata_response(value: Vec<Value>) -> HttpResponse {
    HttpResponse::json(200, &json!({ "value": value }))
        .with_header("DataServiceVersion", "3.0;")
}

fn database(id: u32, name: &str, collation: &str, edition: &str, max_size_gb: u32) -> Value {
    json!({
        "Id": id,
        "Name": name,
        "CollationName": collation,
        "Edition": edition,
        "MaxSizeGB": max_size_gb,
        "CreationDate": "2013-05-01T12:00:00Z",
        "IsSystemObject": name == "master"
    })
}

fn filter_url(name: &str) -> String {
    format!("{DATABASES_PATH}()?$filter=Name eq '{name}'")
}

fn sql_settings() -> SessionSettings {
    SessionSettings::new().with_property("Servername", TEST_SERVER_NAME)
}

/// Three requests: list all databases, then fetch `testdb1` and `testdb2`.
#[must_use]
pub fn get_database_session() -> HttpSession {
    let master = database(1, "master", "SQL_Latin1_General_CP1_CI_AS", "Web", 1);
    let testdb1 = database(4, "testdb1", "SQL_Latin1_General_CP1_CI_AS", "Web", 1);
    let testdb2 = database(5, "testdb2", "Japanese_CI_AS", "Web", 5);

    HttpSession::new(GET_DATABASE_SESSION)
        .with_settings(sql_settings())
        .with_exchange(
            odata_request(DATABASES_PATH.to_string()),
            odata_response(vec![master, testdb1.clone(), testdb2.clone()]),
        )
        .with_exchange(odata_request(filter_url("testdb1")), odata_response(vec![testdb1]))
        .with_exchange(odata_request(filter_url("testdb2")), odata_response(vec![testdb2]))
}

/// One request fetching `testdb3`, which the service does not have.
#[must_use]
pub fn get_missing_database_session() -> HttpSession {
    HttpSession::new(GET_MISSING_DATABASE_SESSION)
        .with_settings(sql_settings())
        .with_exchange(odata_request(filter_url("testdb3")), odata_response(Vec::new()))
}

/// Two requests: look up the add-on name (not found), then create it.
#[must_use]
pub fn new_add_on_session() -> HttpSession {
    let path = "/$(SubscriptionId)/store/addons/TestAddOn";
    let store_request = |method: &str| {
        HttpRequest::new(method, path)
            .with_header("User-Agent", TEST_USER_AGENT)
            .with_header("x-ms-version", "2013-06-01")
    };

    HttpSession::new(NEW_ADD_ON_SESSION)
        .with_settings(SessionSettings::new().with_property("SubscriptionId", TEST_SUBSCRIPTION_ID))
        .with_exchange(store_request("GET"), HttpResponse::new(404))
        .with_exchange(
            store_request("PUT")
                .with_header("Content-Type", "application/json")
                .with_body(
                    json!({
                        "type": "Search",
                        "plan": "free",
                        "location": "West US",
                        "promotionCode": null
                    })
                    .to_string(),
                ),
            HttpResponse::json(
                201,
                &json!({
                    "name": "TestAddOn",
                    "type": "Search",
                    "plan": "free",
                    "location": "West US",
                    "state": "Provisioning"
                }),
            ),
        )
}

/// Every fixture session.
#[must_use]
pub fn sample_sessions() -> SessionCollection {
    [
        get_database_session(),
        get_missing_database_session(),
        new_add_on_session(),
    ]
    .into_iter()
    .collect()
}

/// Write the fixture sessions to a store file at `path`.
pub fn write_sample_store(path: &Path) -> Result<SessionStore, MgmtError> {
    let sessions = sample_sessions();
    let mut store = SessionStore::open(path)?;
    for name in sessions.names() {
        store.add_session(sessions.get_session(name)?);
    }
    store.save_default_session_collection()?;
    Ok(store)
}

fn check_odata(expected: &HttpMessage, actual: &HttpRequest) -> Result<(), ValidationError> {
    validator::validate_method(expected, actual)?;
    validator::validate_user_agent(expected, actual)?;
    validator::validate_headers(expected, actual, ODATA_HEADERS)?;
    validator::validate_headers_present(expected, actual, TRACING_HEADERS)?;
    validator::validate_path_and_query(expected, actual)
}

/// Validator for OData sessions: method, user agent, OData headers, tracing
/// ids and URL, for every recorded request.
#[must_use]
pub fn odata_validator() -> impl RequestValidator + 'static {
    |index: usize, expected: Option<&HttpMessage>, actual: &HttpRequest| -> Result<(), ValidationError> {
        let expected = expected.ok_or_else(|| validator::no_more_requests(index))?;
        check_odata(expected, actual)
    }
}

/// Validator for store sessions: method, user agent, version header, URL and
/// JSON body.
#[must_use]
pub fn store_validator() -> impl RequestValidator + 'static {
    |index: usize, expected: Option<&HttpMessage>, actual: &HttpRequest| -> Result<(), ValidationError> {
        let expected = expected.ok_or_else(|| validator::no_more_requests(index))?;
        validator::validate_method(expected, actual)?;
        validator::validate_user_agent(expected, actual)?;
        validator::validate_headers(expected, actual, STORE_HEADERS)?;
        validator::validate_path_and_query(expected, actual)?;
        validator::validate_body(expected, actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_sessions_are_indexed() {
        let sessions = sample_sessions();
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions.get_session(GET_DATABASE_SESSION).unwrap().len(), 3);
        assert_eq!(sessions.get_session(GET_MISSING_DATABASE_SESSION).unwrap().len(), 1);
        assert_eq!(sessions.get_session(NEW_ADD_ON_SESSION).unwrap().len(), 2);
    }

    #[test]
    fn test_server_name_substituted() {
        let session = get_database_session().resolved();
        assert_eq!(
            session.messages[1].request.path(),
            "/v1/ManagementService.svc/Servers('testserver')/Databases()"
        );
        assert_eq!(
            session.messages[1].request.query_pairs(),
            vec![("$filter".to_string(), "Name eq 'testdb1'".to_string())]
        );
    }

    #[test]
    fn test_odata_validator_accepts_recorded_requests() {
        let session = get_database_session().resolved();
        let validator = odata_validator();
        for message in &session.messages {
            let actual = message.request.clone();
            assert!(validator.validate(message.index, Some(message), &actual).is_ok());
        }
        let err = validator
            .validate(3, None, &session.messages[0].request)
            .unwrap_err();
        assert!(matches!(err, ValidationError::NoMoreRequests { index: 3 }));
    }

    #[test]
    fn test_odata_validator_requires_tracing_ids() {
        let session = get_database_session();
        let mut actual = session.messages[0].request.clone();
        actual.headers.remove("x-ms-client-request-id");
        let err = odata_validator()
            .validate(0, session.message(0), &actual)
            .unwrap_err();
        assert!(matches!(err, ValidationError::HeaderMismatch { .. }));
    }

    #[test]
    fn test_write_sample_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures").join("sessions.json");
        let store = write_sample_store(&path).unwrap();
        assert!(!store.is_dirty());

        let reopened = SessionStore::open(&path).unwrap();
        assert_eq!(reopened.collection().len(), 3);
    }
}
