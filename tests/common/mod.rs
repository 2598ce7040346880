use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use docflow::auth::jwt::JwtService;
use docflow::config::AppConfig;
use docflow::models::{DistributionRule, Role, UserProfile};
use docflow::routes;
use docflow::state::AppState;
use docflow::store::{DirectoryStore, MemoryStore};
use http_body_util::BodyExt;
use serde::Serialize;
use tower::util::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Result<Self> {
        Self::with_config(test_config(true))
    }

    pub fn with_config(config: AppConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let jwt = JwtService::from_config(&config)?;
        let state = AppState::new(config, store, jwt);
        let router = routes::create_router(state.clone());
        Ok(Self { state, router })
    }

    pub fn token_for(&self, user_id: Uuid, role: Role, tenant_id: Uuid) -> Result<String> {
        self.state.jwt.generate_token(user_id, role, tenant_id)
    }

    pub async fn seed_user(
        &self,
        tenant_id: Uuid,
        name: &str,
        area: Option<&str>,
    ) -> Result<Uuid> {
        let user = UserProfile {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.to_string(),
            area: area.map(str::to_string),
        };
        let id = user.id;
        self.state
            .store
            .upsert_user(user)
            .await
            .map_err(|err| anyhow!("failed to seed user: {err}"))?;
        Ok(id)
    }

    pub async fn seed_rule(
        &self,
        tenant_id: Uuid,
        area: &str,
        user_ids: Vec<Uuid>,
    ) -> Result<()> {
        self.state
            .store
            .upsert_rule(DistributionRule {
                id: Uuid::new_v4(),
                tenant_id,
                area: area.to_string(),
                user_ids,
            })
            .await
            .map_err(|err| anyhow!("failed to seed rule: {err}"))
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(Method::PUT)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::DELETE).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }
}

pub fn test_config(notify_document_owner: bool) -> AppConfig {
    AppConfig {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        jwt_secret: "test-secret".to_string(),
        jwt_issuer: "test-issuer".to_string(),
        jwt_audience: "test-audience".to_string(),
        jwt_expiry_minutes: 60,
        cors_allowed_origin: None,
        notify_document_owner,
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}
