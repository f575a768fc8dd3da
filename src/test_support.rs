//! Shared fixtures for handler tests: an app over the in-memory store and a
//! pre-signed session.

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse},
    http::header,
    test as actix_test, web, App, Error,
};
use serde_json::{json, Value};

use crate::auth::Authenticator;
use crate::config::AuthConfig;
use crate::schemas::{Expense, Friend, Group};
use crate::store::MemoryStore;
use crate::AppState;

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        username: "admin".to_string(),
        password: "hunter2".to_string(),
        session_secret: b"test secret".to_vec(),
        session_ttl_hours: 1,
    }
}

pub fn test_state() -> web::Data<AppState> {
    web::Data::new(AppState {
        store: Arc::new(MemoryStore::new()),
        auth: Authenticator::new(auth_config()),
    })
}

pub fn test_app() -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(test_state())
        .configure(crate::api::configure)
}

/// `Authorization` header carrying a valid session for the test user.
pub fn bearer() -> (header::HeaderName, String) {
    let (_, token) = Authenticator::new(auth_config())
        .login("admin", "hunter2")
        .unwrap();
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

pub async fn create_friend<S, B>(app: &S, name: &str) -> Friend
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let request = actix_test::TestRequest::post()
        .uri("/api/friends")
        .insert_header(bearer())
        .set_json(json!({ "name": name }))
        .to_request();
    actix_test::call_and_read_body_json(app, request).await
}

pub async fn create_group<S, B>(app: &S, name: &str, member_ids: &[impl AsRef<str>]) -> Group
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let members: Vec<Value> = member_ids
        .iter()
        .map(|id| json!({ "id": id.as_ref() }))
        .collect();
    let request = actix_test::TestRequest::post()
        .uri("/api/groups")
        .insert_header(bearer())
        .set_json(json!({ "name": name, "members": members }))
        .to_request();
    actix_test::call_and_read_body_json(app, request).await
}

pub async fn add_expense<S, B>(app: &S, body: Value) -> Expense
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let request = actix_test::TestRequest::post()
        .uri("/api/expenses")
        .insert_header(bearer())
        .set_json(body)
        .to_request();
    actix_test::call_and_read_body_json(app, request).await
}
