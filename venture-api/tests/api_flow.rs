//! End-to-end boundary tests: real router, in-memory storage, scripted
//! completion provider.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use venture_api::{create_api_router, ApiConfig, AppState, USER_ID_HEADER};
use venture_core::{OrchestratorConfig, Project, User, UserRole};
use venture_engine::Orchestrator;
use venture_llm::{ScriptStep, ScriptedProvider};
use venture_storage::{MemoryStorage, ProjectStore, UserStore};

async fn app_with(script: Vec<ScriptStep>) -> (axum::Router, Arc<MemoryStorage>, User) {
    let storage = Arc::new(MemoryStorage::new());
    let user = storage
        .insert_user(User::new("founder@example.com", "Founder"))
        .await
        .unwrap();
    let orchestrator = Arc::new(Orchestrator::new(
        storage.clone(),
        Arc::new(ScriptedProvider::new(script)),
        OrchestratorConfig {
            backoff_base_ms: 1,
            backoff_cap_ms: 1,
            reserve_estimate: 500,
            ..Default::default()
        },
    ));
    let app = create_api_router(
        AppState::new(storage.clone(), orchestrator),
        &ApiConfig::default(),
    );
    (app, storage, user)
}

fn request(method: Method, uri: &str, user: Option<&User>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.user_id.to_string());
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let (app, _, _) = app_with(vec![]).await;

    let response = app
        .oneshot(request(Method::GET, "/projects", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_chat_turn_end_to_end() {
    let (app, _, user) = app_with(vec![ScriptStep::reply("Happy to help.", 20, 10)]).await;

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/projects",
            Some(&user),
            Some(json!({"name": "SynthMart"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let project = body_json(response).await;
    let project_id = project["project_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/chat/message",
            Some(&user),
            Some(json!({"project_id": project_id, "content": "hello"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = body_json(response).await;
    assert_eq!(outcome["message"], "Happy to help.");
    assert_eq!(outcome["agent"], "business");
    assert_eq!(outcome["user_tokens"]["used"], 30);

    let response = app
        .oneshot(request(
            Method::GET,
            &format!("/chat/conversations/{}", project_id),
            Some(&user),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let conversations = body_json(response).await;
    assert_eq!(conversations.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_quota_rejection_returns_403_with_code() {
    let (app, storage, _) = app_with(vec![ScriptStep::reply("never reached", 1, 1)]).await;

    let mut capped = User::new("capped@example.com", "Capped");
    capped.tokens_used = 24_900;
    let capped = storage.insert_user(capped).await.unwrap();
    let project = storage
        .insert_project(Project::new(capped.user_id, "Over Budget"))
        .await
        .unwrap();

    let response = app
        .oneshot(request(
            Method::POST,
            "/chat/message",
            Some(&capped),
            Some(json!({
                "project_id": project.project_id.to_string(),
                "content": "one more",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "QUOTA_EXCEEDED");
    assert_eq!(body["details"]["used"], 24_900);
}

#[tokio::test]
async fn test_admin_surface_requires_admin_role() {
    let (app, storage, user) = app_with(vec![]).await;

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/admin/users", Some(&user), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "ADMIN_REQUIRED");

    let admin = storage
        .insert_user(User::new("ops@example.com", "Ops").with_role(UserRole::Admin))
        .await
        .unwrap();
    let response = app
        .oneshot(request(Method::GET, "/admin/users", Some(&admin), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rows = body_json(response).await;
    assert_eq!(rows.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_user_detail_includes_project_count() {
    let (app, storage, user) = app_with(vec![]).await;
    storage
        .insert_project(Project::new(user.user_id, "One"))
        .await
        .unwrap();
    storage
        .insert_project(Project::new(user.user_id, "Two"))
        .await
        .unwrap();
    let admin = storage
        .insert_user(User::new("ops@example.com", "Ops").with_role(UserRole::Admin))
        .await
        .unwrap();

    let response = app
        .oneshot(request(
            Method::GET,
            &format!("/admin/users/{}", user.user_id),
            Some(&admin),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let row = body_json(response).await;
    assert_eq!(row["email"], "founder@example.com");
    assert_eq!(row["project_count"], 2);
}

#[tokio::test]
async fn test_foreign_project_read_is_forbidden() {
    let (app, storage, user) = app_with(vec![]).await;
    let other = storage
        .insert_user(User::new("other@example.com", "Other"))
        .await
        .unwrap();
    let project = storage
        .insert_project(Project::new(other.user_id, "Not Yours"))
        .await
        .unwrap();

    let response = app
        .oneshot(request(
            Method::GET,
            &format!("/projects/{}", project.project_id),
            Some(&user),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deactivated_user_is_rejected_at_the_door() {
    let (app, storage, user) = app_with(vec![]).await;
    storage.set_user_active(user.user_id, false).await.unwrap();

    let response = app
        .oneshot(request(Method::GET, "/projects", Some(&user), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "ACCOUNT_DEACTIVATED");
}
