//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use scimd::config::ServiceConfig;
use scimd::context::RequestContext;
use scimd::service::ScimService;
use serde_json::{Value, json};

/// A service over in-memory backends, tuned for fast tests.
pub fn service() -> ScimService {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = ServiceConfig {
        bcrypt_cost: 4,
        ..Default::default()
    };
    ScimService::new(config).expect("embedded schemas load")
}

/// A fresh request context.
pub fn ctx() -> RequestContext {
    RequestContext::with_generated_id()
}

/// Minimal user body with the given userName.
pub fn user_body(user_name: &str) -> Value {
    json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
        "userName": user_name,
    })
}

/// Group body with the given display name and member ids.
pub fn group_body(display_name: &str, members: &[&str]) -> Value {
    let members: Vec<Value> = members.iter().map(|id| json!({"value": id})).collect();
    json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Group"],
        "displayName": display_name,
        "members": members,
    })
}

/// Create a user and return its response body.
pub async fn create_user(service: &ScimService, body: Value) -> Value {
    let response = service.users().create(&ctx(), &body).await.expect("create user");
    assert_eq!(response.status, 201);
    response.body.expect("created body")
}

/// Create a group and return its response body.
pub async fn create_group(service: &ScimService, body: Value) -> Value {
    let response = service
        .groups()
        .create(&ctx(), &body)
        .await
        .expect("create group");
    assert_eq!(response.status, 201);
    response.body.expect("created body")
}

/// Drive the group-sync worker until its queue drains.
pub async fn drain_group_sync(service: &ScimService) {
    let worker = service.group_sync_worker();
    for _ in 0..32 {
        match worker.process_next().await {
            Ok(true) => continue,
            Ok(false) => break,
            Err(err) => panic!("group sync failed: {err}"),
        }
    }
}

/// The id of a response body.
pub fn id_of(body: &Value) -> String {
    body["id"].as_str().expect("id in body").to_string()
}
