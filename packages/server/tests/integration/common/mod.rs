use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use common::storage::{BlobStore, FilesystemBlobStore};
use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use docstore::config::{
    AppConfig, CorsConfig, DatabaseConfig, FetchConfig, ServerConfig, StorageConfig,
};
use docstore::ingest::RemoteFetcher;
use docstore::serializer::WriteSerializer;
use docstore::service::DocumentService;
use docstore::state::AppState;

pub const MAX_BLOB_SIZE: u64 = 1024 * 1024;

pub mod routes {
    pub const FILES: &str = "/api/files";
    pub const ENTITIES: &str = "/api/entities";
    pub const TYPED_JSON_DATA: &str = "/api/typed-json-data";

    pub fn file(id: i32) -> String {
        format!("/api/files/{id}")
    }

    pub fn file_content(id: i32) -> String {
        format!("/api/files/{id}/content")
    }

    pub fn file_content_by_name(name: &str) -> String {
        format!("/api/files/by-name/{name}/content")
    }

    pub fn entity(id: &str) -> String {
        format!("/api/entities/{id}")
    }

    pub fn json_data(key: &str) -> String {
        format!("/api/json-data/{key}")
    }

    pub fn typed_json_data(key: &str) -> String {
        format!("/api/typed-json-data/{key}")
    }
}

/// A fresh SQLite database and blob directory, both removed on drop.
pub struct TestContext {
    pub service: DocumentService,
    pub blobs: Arc<FilesystemBlobStore>,
    pub db: DatabaseConnection,
    pub config: AppConfig,
    _dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_blob_store(|store| store as Arc<dyn BlobStore>).await
    }

    /// Build a context whose service sees the blob store through `wrap`.
    pub async fn with_blob_store<F>(wrap: F) -> Self
    where
        F: FnOnce(Arc<FilesystemBlobStore>) -> Arc<dyn BlobStore>,
    {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = dir.path().join("blobs");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("docstore.db").display());

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url,
                max_connections: 5,
            },
            storage: StorageConfig {
                data_path: data_path.clone(),
                max_blob_size: MAX_BLOB_SIZE,
            },
            fetch: FetchConfig { timeout_secs: 5 },
        };

        let blobs = Arc::new(
            FilesystemBlobStore::new(data_path, MAX_BLOB_SIZE)
                .await
                .expect("Failed to create blob store"),
        );
        let db = docstore::database::init_db(&config.database)
            .await
            .expect("Failed to initialize database");
        let fetcher = RemoteFetcher::new(Duration::from_secs(config.fetch.timeout_secs))
            .expect("Failed to build fetcher");

        let service = DocumentService::new(
            db.clone(),
            wrap(blobs.clone()),
            Arc::new(WriteSerializer::new()),
            fetcher,
        );

        Self {
            service,
            blobs,
            db,
            config,
            _dir: dir,
        }
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.config.storage.data_path.clone()
    }

    /// Number of stored blobs, excluding the staging directory.
    pub fn blob_count(&self) -> usize {
        std::fs::read_dir(self.blob_dir())
            .expect("Failed to read blob dir")
            .filter_map(Result::ok)
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .count()
    }

    pub fn staging_count(&self) -> usize {
        std::fs::read_dir(self.blob_dir().join(".tmp"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// Serve `router` on an ephemeral local port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    addr
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub ctx: TestContext,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let ctx = TestContext::new().await;
        let state = AppState {
            service: ctx.service.clone(),
            config: ctx.config.clone(),
        };
        let addr = serve(docstore::build_router(state)).await;

        Self {
            addr,
            client: Client::new(),
            ctx,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_raw(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Upload bytes as the `file` part, optionally with a `name` part.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>, name: Option<&str>) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(name) = name {
            form = form.text("name", name.to_string());
        }
        self.post_multipart(form).await
    }

    pub async fn post_multipart(&self, form: reqwest::multipart::Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(routes::FILES))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}
