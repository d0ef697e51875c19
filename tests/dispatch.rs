use async_trait::async_trait;
use resource_api::service::validation::{max_length, required, valid_color};
use resource_api::sql::QueryBuf;
use resource_api::{
    ApiRequest, AppError, Dispatcher, Record, Registry, Resource, Storage,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Storage fake: records every statement and answers with canned rows.
#[derive(Default)]
struct RecordingStorage {
    executed: Mutex<Vec<QueryBuf>>,
    rows: Mutex<Vec<Record>>,
}

impl RecordingStorage {
    fn returning(rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect();
        RecordingStorage {
            executed: Mutex::new(Vec::new()),
            rows: Mutex::new(rows),
        }
    }

    fn statements(&self) -> Vec<QueryBuf> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn execute(&self, query: &QueryBuf) -> Result<Vec<Record>, AppError> {
        self.executed.lock().unwrap().push(query.clone());
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn last_insert_id(&self) -> Result<Option<Value>, AppError> {
        Ok(None)
    }
}

fn widgets() -> Resource {
    Resource::builder("WidgetsResource")
        .fields(["name", "color"])
        .validate(required("name"))
        .validate(max_length("name", 5))
        .validate(valid_color("color"))
        .build()
        .unwrap()
}

fn dispatcher(storage: Arc<RecordingStorage>, development: bool) -> Dispatcher {
    let mut registry = Registry::new();
    registry.register_resource(widgets()).unwrap();
    Dispatcher::new(Arc::new(registry), storage, development)
}

#[tokio::test]
async fn unknown_route_is_404_without_touching_storage() {
    let storage = Arc::new(RecordingStorage::default());
    let response = dispatcher(storage.clone(), false)
        .dispatch(ApiRequest::new("GET", "/gadgets"))
        .await;

    assert_eq!(response.status.as_u16(), 404);
    assert_eq!(response.error(), Some("No such route"));
    assert!(storage.statements().is_empty());
}

#[tokio::test]
async fn validation_failures_are_collected_before_any_sql() {
    let storage = Arc::new(RecordingStorage::default());
    let response = dispatcher(storage.clone(), false)
        .dispatch(
            ApiRequest::new("POST", "/widgets").with_body(r#"{"name": "abcdef", "color": "red"}"#),
        )
        .await;

    assert_eq!(response.status.as_u16(), 422);
    let error = response.error().unwrap();
    assert!(error.starts_with("There are 2 error(s) in the request"), "{error}");
    assert!(error.contains("name"));
    assert!(error.contains("color"));
    assert!(storage.statements().is_empty());
}

#[tokio::test]
async fn missing_required_field_is_named() {
    let storage = Arc::new(RecordingStorage::default());
    let response = dispatcher(storage.clone(), false)
        .dispatch(ApiRequest::new("POST", "/widgets").with_body(r##"{"color": "#fff"}"##))
        .await;

    assert_eq!(response.status.as_u16(), 422);
    assert_eq!(
        response.error(),
        Some("There are 1 error(s) in the request\nThe field [name] is required")
    );
    assert!(storage.statements().is_empty());
}

#[tokio::test]
async fn empty_update_never_reaches_storage() {
    let storage = Arc::new(RecordingStorage::default());
    let response = dispatcher(storage.clone(), false)
        .dispatch(ApiRequest::new("PATCH", "/widgets/3").with_body("{}"))
        .await;

    assert_eq!(response.status.as_u16(), 400);
    assert_eq!(
        response.error(),
        Some("Update request is empty for resource: widgets")
    );
    assert!(storage.statements().is_empty());
}

#[tokio::test]
async fn columns_outside_the_whitelist_are_rejected() {
    let storage = Arc::new(RecordingStorage::default());
    let response = dispatcher(storage.clone(), true)
        .dispatch(
            ApiRequest::new("PUT", "/widgets/3").with_body(r#"{"name": "ok", "weight": 3}"#),
        )
        .await;

    assert_eq!(response.status.as_u16(), 582);
    assert!(response.error().unwrap().contains("weight"));
    assert!(storage.statements().is_empty());
}

#[tokio::test]
async fn captured_identity_is_bound_not_interpolated() {
    let storage = Arc::new(RecordingStorage::returning(vec![
        json!({"id": 3, "name": "bolt", "color": "#fff"}),
    ]));
    let response = dispatcher(storage.clone(), false)
        .dispatch(ApiRequest::new("GET", "/Widgets/3"))
        .await;

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.data().unwrap()[0]["name"], json!("bolt"));

    let statements = storage.statements();
    assert_eq!(statements.len(), 1);
    assert!(!statements[0].sql().contains('3'));
    assert_eq!(statements[0].params(), &[json!(3)]);
}

#[tokio::test]
async fn non_numeric_identity_is_a_request_error() {
    let storage = Arc::new(RecordingStorage::default());
    let response = dispatcher(storage.clone(), false)
        .dispatch(ApiRequest::new("GET", "/widgets/abc"))
        .await;

    assert_eq!(response.status.as_u16(), 400);
    assert!(storage.statements().is_empty());
}

#[tokio::test]
async fn unsupported_verb_is_a_server_error() {
    let storage = Arc::new(RecordingStorage::default());

    let hidden = dispatcher(storage.clone(), false)
        .dispatch(ApiRequest::new("OPTIONS", "/widgets"))
        .await;
    assert_eq!(hidden.status.as_u16(), 500);
    assert_eq!(
        hidden.error(),
        Some("The request could not be processed due to an unexpected error")
    );

    let shown = dispatcher(storage, true)
        .dispatch(ApiRequest::new("OPTIONS", "/widgets"))
        .await;
    assert_eq!(shown.status.as_u16(), 500);
    assert!(shown.error().unwrap().contains("options"));
}

#[tokio::test]
async fn delete_without_identity_is_no_such_route() {
    let storage = Arc::new(RecordingStorage::default());
    let response = dispatcher(storage.clone(), false)
        .dispatch(ApiRequest::new("DELETE", "/widgets"))
        .await;

    assert_eq!(response.status.as_u16(), 404);
    assert!(storage.statements().is_empty());
}

#[tokio::test]
async fn delete_answers_with_empty_data() {
    let storage = Arc::new(RecordingStorage::default());
    let response = dispatcher(storage.clone(), false)
        .dispatch(ApiRequest::new("DELETE", "/widgets/9"))
        .await;

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.data(), Some(&[][..]));
    let statements = storage.statements();
    assert_eq!(statements.len(), 1);
    assert!(statements[0].sql().starts_with("DELETE FROM \"widgets\""));
}

/// Storage whose driver fails on every statement.
struct FailingStorage;

#[async_trait]
impl Storage for FailingStorage {
    async fn execute(&self, _query: &QueryBuf) -> Result<Vec<Record>, AppError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn last_insert_id(&self) -> Result<Option<Value>, AppError> {
        Ok(None)
    }
}

fn failing_dispatcher(development: bool) -> Dispatcher {
    let mut registry = Registry::new();
    registry.register_resource(widgets()).unwrap();
    Dispatcher::new(Arc::new(registry), Arc::new(FailingStorage), development)
}

#[tokio::test]
async fn storage_failure_is_580_with_generic_message() {
    let response = failing_dispatcher(false)
        .dispatch(ApiRequest::new("GET", "/widgets"))
        .await;

    assert_eq!(response.status.as_u16(), 580);
    assert_eq!(
        response.error(),
        Some("The request could not be processed due to an unexpected error")
    );
}

#[tokio::test]
async fn storage_failure_shows_its_chain_in_development() {
    let response = failing_dispatcher(true)
        .dispatch(ApiRequest::new("GET", "/widgets/1"))
        .await;

    assert_eq!(response.status.as_u16(), 580);
    let error = response.error().unwrap();
    assert!(error.starts_with("Storage error"), "{error}");
    assert!(error.contains("\ncaused by: "), "{error}");
}

/// Insert answers with no rows; the identity comes with the insert, while the shared
/// slot holds an identity from some other request.
struct NoReturningStorage {
    executed: Mutex<Vec<QueryBuf>>,
}

#[async_trait]
impl Storage for NoReturningStorage {
    async fn execute(&self, query: &QueryBuf) -> Result<Vec<Record>, AppError> {
        self.executed.lock().unwrap().push(query.clone());
        if query.is_insert() {
            return Ok(Vec::new());
        }
        let row = json!({"id": query.params()[0], "name": "bolt", "color": "#fff"});
        Ok(vec![row.as_object().cloned().unwrap()])
    }

    async fn last_insert_id(&self) -> Result<Option<Value>, AppError> {
        Ok(Some(json!(99)))
    }

    async fn execute_insert(
        &self,
        query: &QueryBuf,
    ) -> Result<(Vec<Record>, Option<Value>), AppError> {
        Ok((self.execute(query).await?, Some(json!(5))))
    }
}

#[tokio::test]
async fn insert_reads_back_its_own_identity() {
    let storage = Arc::new(NoReturningStorage {
        executed: Mutex::new(Vec::new()),
    });
    let mut registry = Registry::new();
    registry.register_resource(widgets()).unwrap();
    let response = Dispatcher::new(Arc::new(registry), storage.clone(), false)
        .dispatch(
            ApiRequest::new("POST", "/widgets").with_body(r##"{"name": "bolt", "color": "#fff"}"##),
        )
        .await;

    assert_eq!(response.status.as_u16(), 201);
    assert_eq!(response.data().unwrap()[0]["id"], json!(5));
    let executed = storage.executed.lock().unwrap();
    assert_eq!(executed.len(), 2);
    assert!(executed[1].sql().starts_with("SELECT"));
    assert_eq!(executed[1].params(), &[json!(5)]);
}
