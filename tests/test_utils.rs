use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use geophoto_backend::{
    entities::image::{ImageRecord, NewImageRecord},
    errors::AppError,
    repositories::image::{ImageCursor, ImageRepository},
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment},
    AppState,
};
use reqwest::{Client, Response};
use std::{
    net::TcpListener,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use uuid::Uuid;

/// Store double keeping records in insertion order.
#[derive(Default)]
pub struct InMemoryImageRepo {
    records: Mutex<Vec<ImageRecord>>,
    inserts: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryImageRepo {
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Vec<ImageRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageRepository for InMemoryImageRepo {
    async fn insert(&self, image: &NewImageRecord) -> Result<Uuid, AppError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("connection refused".into()));
        }

        let mut records = self.records.lock().unwrap();
        let id = Uuid::new_v4();
        let seq = records.len() as i64 + 1;
        records.push(ImageRecord {
            seq,
            id,
            image: image.image.clone(),
            image_type: image.image_type,
            latitude: image.latitude,
            longitude: image.longitude,
            timestamp: image.timestamp,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    fn scan_all(&self) -> ImageCursor {
        let snapshot = self.stored();
        stream::iter(snapshot.into_iter().map(Ok)).boxed()
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(AppError::StoreUnavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub repo: Arc<InMemoryImageRepo>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_limit(test_config().max_image_bytes).await
    }

    pub async fn spawn_with_limit(max_image_bytes: usize) -> Self {
        let mut config = test_config();
        config.max_image_bytes = max_image_bytes;

        let repo = Arc::new(InMemoryImageRepo::default());
        let state = web::Data::new(AppState::with_repository(&config, repo.clone()));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(NormalizePath::trim())
                .configure(configure_routes)
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(config.worker_count)
        .run();

        actix_rt::spawn(server);

        let client = Client::new();
        while client.get(format!("{}/api/v1/admin/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Self { address, client, repo }
    }

    pub fn images_url(&self) -> String {
        format!("{}/api/v1/images", self.address)
    }

    pub async fn upload(&self, body: Vec<u8>, content_type: &str, query: &[(&str, &str)]) -> Response {
        self.client
            .post(self.images_url())
            .header("Content-Type", content_type)
            .query(query)
            .body(body)
            .send()
            .await
            .expect("Failed to upload image")
    }

    /// Uploads a small JPEG placed at `origin` ("lat,lng").
    pub async fn upload_at(&self, origin: &str, timestamp: i64) -> Response {
        let timestamp = timestamp.to_string();
        self.upload(
            vec![0xFF, 0xD8, 0xFF, 0xE0],
            "image/jpeg",
            &[("origin", origin), ("timestamp", timestamp.as_str())],
        )
        .await
    }

    pub async fn list(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(self.images_url())
            .query(query)
            .send()
            .await
            .expect("Failed to list images")
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "GeoPhoto Test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        worker_count: 1,
        database_url: "postgres://unused@127.0.0.1:5432/unused".into(),
        max_db_connections: 1,
        max_image_bytes: 16 * 1024 * 1024,
        scan_batch_size: 100,
        cors_allowed_origins: vec!["*".to_string()],
    }
}
