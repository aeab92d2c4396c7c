#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use bazar_api::mailer::Mailer;
use bazar_api::{AppState, AppStateInner, Settings};
use bazar_db::Database;

pub const SECRET: &str = "integration-secret";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub fn settings() -> Settings {
    Settings {
        jwt_secret: SECRET.into(),
        token_ttl: chrono::Duration::hours(1),
        frontend_url: "http://localhost:3000".into(),
        empty_search_not_found: false,
    }
}

pub fn app() -> TestApp {
    app_with(settings())
}

pub fn app_with(settings: Settings) -> TestApp {
    let db = Database::open_in_memory().unwrap();
    let state = AppStateInner::new(db, settings, Mailer::Log);
    TestApp {
        router: bazar_api::router(state.clone()),
        state,
    }
}

impl TestApp {
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => req
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, token, None).await
    }

    /// Register an account and return `(token, user_id)`.
    pub async fn register(&self, email: &str, role: &str) -> (String, i64) {
        let (status, body) = self
            .post(
                "/register",
                None,
                json!({
                    "first_name": "Nombre",
                    "last_name": "Apellido",
                    "email": email,
                    "password": "secreto123",
                    "role": role,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {}: {}", email, body);
        token_and_id(&body)
    }

    /// Create the admin the way the server does at startup, then log in.
    pub async fn admin(&self) -> (String, i64) {
        bazar_api::auth::bootstrap_admin(&self.state.db, "admin@bazar.test", "admin-pass").unwrap();
        let (status, body) = self
            .post(
                "/login",
                None,
                json!({ "email": "admin@bazar.test", "password": "admin-pass" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        token_and_id(&body)
    }

    pub async fn product(&self, token: &str, title: &str, price: f64) -> i64 {
        self.product_in(token, title, price, "Bicicletas", "used").await
    }

    pub async fn product_in(
        &self,
        token: &str,
        title: &str,
        price: f64,
        category: &str,
        tags: &str,
    ) -> i64 {
        let (status, body) = self
            .post(
                "/products",
                Some(token),
                json!({
                    "title": title,
                    "description": "En buen estado",
                    "price": price,
                    "location": "Madrid",
                    "tags": tags,
                    "category": category,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create product: {}", body);
        body["results"]["id"].as_i64().unwrap()
    }
}

fn token_and_id(body: &Value) -> (String, i64) {
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["results"]["id"].as_i64().unwrap(),
    )
}
