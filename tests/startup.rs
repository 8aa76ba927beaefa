//! Startup schema initialization: ordering, exactly-once, idempotence, fail-fast.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use order_backend::schema::{default_catalog, TableDef};
use order_backend::{
    assemble, AppError, HostConfig, MemorySchemaStore, Preset, SchemaInitHook, SchemaState, SchemaStore,
};
use std::io;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Capture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn hook_for(store: &Arc<MemorySchemaStore>) -> Arc<SchemaInitHook> {
    Arc::new(SchemaInitHook::new(store.clone(), default_catalog("public")))
}

async fn get_root(app: axum::Router) -> StatusCode {
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    app.oneshot(req).await.unwrap().status()
}

#[tokio::test]
async fn tables_are_created_before_the_first_request() {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let store = Arc::new(MemorySchemaStore::new());
    let hook = hook_for(&store);
    let host = assemble(&HostConfig::preset(Preset::Bootstrap), Some(hook.clone())).unwrap();
    assert_eq!(hook.state(), SchemaState::NotInitialized);

    let app = host.start().await.unwrap().router();
    assert_eq!(hook.state(), SchemaState::Initialized);
    for _ in 0..3 {
        assert_eq!(get_root(app.clone()).await, StatusCode::OK);
    }

    let log = capture.text();
    let creating = log.find("creating tables if they do not exist").expect("start line");
    let created = log.find("tables created successfully").expect("success line");
    let request = log.find("started processing request").expect("request line");
    assert!(creating < created, "{log}");
    assert!(created < request, "{log}");
    assert_eq!(log.matches("creating tables if they do not exist").count(), 1);
    assert_eq!(log.matches("tables created successfully").count(), 1);
    assert_eq!(store.create_calls(), 4);
}

#[tokio::test]
async fn second_process_start_creates_nothing() {
    let store = Arc::new(MemorySchemaStore::new());
    let config = HostConfig::preset(Preset::Bootstrap);

    let first = hook_for(&store);
    assemble(&config, Some(first.clone())).unwrap().start().await.unwrap();
    assert_eq!(first.report().unwrap().created.len(), 4);

    let second = hook_for(&store);
    assemble(&config, Some(second.clone())).unwrap().start().await.unwrap();
    let report = second.report().unwrap();
    assert!(report.created.is_empty());
    assert_eq!(report.existing, vec!["clientes", "users", "orders", "order_items"]);
    assert_eq!(store.tables().len(), 4);
}

struct Unreachable;

#[async_trait]
impl SchemaStore for Unreachable {
    async fn ensure_namespace(&self, _schema: &str) -> Result<(), AppError> {
        Err(AppError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused")))
    }

    async fn table_exists(&self, _schema: &str, _table: &str) -> Result<bool, AppError> {
        unreachable!("namespace check fails first")
    }

    async fn create_table(&self, _schema: &str, _table: &TableDef) -> Result<(), AppError> {
        unreachable!("namespace check fails first")
    }
}

#[tokio::test]
async fn unreachable_store_fails_start() {
    let hook = Arc::new(SchemaInitHook::new(Arc::new(Unreachable), default_catalog("public")));
    let host = assemble(&HostConfig::preset(Preset::Bootstrap), Some(hook.clone())).unwrap();
    match host.start().await {
        Err(AppError::Startup { hook, source }) => {
            assert_eq!(hook, "schema-init");
            assert!(matches!(*source, AppError::Io(_)));
        }
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("start should fail when the store is unreachable"),
    }
    assert_eq!(hook.state(), SchemaState::NotInitialized);
}
