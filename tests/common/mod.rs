use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use diesel::sqlite::SqliteConnection;
use govtrack::config::AppConfig;
use govtrack::db;
use govtrack::routes;
use govtrack::state::AppState;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::TempDir;
use tower::util::ServiceExt;

/// A router over a fresh SQLite database living in its own temp directory.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config<F>(tweak: F) -> Result<Self>
    where
        F: FnOnce(&mut AppConfig),
    {
        let dir = tempfile::tempdir().context("failed to create temp dir")?;
        let mut config = AppConfig::for_directory(dir.path());
        tweak(&mut config);

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        db::run_migrations(&pool)?;

        let state = AppState::new(pool, config);
        let router = routes::create_router(state.clone());

        Ok(Self { state, router, dir })
    }

    #[allow(dead_code)]
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    #[allow(dead_code)]
    pub fn backup_count(&self) -> usize {
        std::fs::read_dir(self.state.backups.backup_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub async fn send(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(method).uri(path);
        let body = match body {
            Some(bytes) => {
                builder = builder.header("content-type", "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };
        let request = builder.body(body)?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        self.send(Method::POST, path, Some(serde_json::to_vec(payload)?))
            .await
    }

    #[allow(dead_code)]
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        self.send(Method::PUT, path, Some(serde_json::to_vec(payload)?))
            .await
    }

    #[allow(dead_code)]
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        self.send(Method::PATCH, path, Some(serde_json::to_vec(payload)?))
            .await
    }

    pub async fn get(&self, path: &str) -> Result<hyper::Response<Body>> {
        self.send(Method::GET, path, None).await
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>,
    {
        let mut conn = self
            .state
            .pool
            .get()
            .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
        f(&mut conn)
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

#[allow(dead_code)]
pub async fn read_json<T: DeserializeOwned>(response: hyper::Response<Body>) -> Result<T> {
    let body = body_to_vec(response.into_body()).await?;
    serde_json::from_slice(&body).with_context(|| {
        format!(
            "unexpected response body: {}",
            String::from_utf8_lossy(&body)
        )
    })
}
