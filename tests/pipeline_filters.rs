//! The write pipeline end to end: readOnly handling, id stamping, password
//! hashing, meta, validation and uniqueness.

mod common;

use common::{create_user, ctx, id_of, service, user_body};
use scimd::error::ScimError;
use scimd::storage::Storage;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn client_supplied_id_is_ignored_on_create() {
    let service = service();
    let body = create_user(
        &service,
        json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "userName": "u1",
            "id": "attacker",
        }),
    )
    .await;
    let id = id_of(&body);
    assert_ne!(id, "attacker");
    assert!(Uuid::parse_str(&id).is_ok());
}

#[tokio::test]
async fn create_stamps_meta_and_returns_version() {
    let service = service();
    let response = service.users().create(&ctx(), &user_body("u1")).await.unwrap();
    assert_eq!(response.status, 201);
    let body = response.body.unwrap();
    assert_eq!(body["meta"]["resourceType"], "User");
    assert!(body["meta"]["location"]
        .as_str()
        .unwrap()
        .contains("/Users/"));
    assert!(body["meta"]["version"].as_str().unwrap().starts_with("W/\""));
    assert_eq!(response.version.as_deref(), body["meta"]["version"].as_str());
    assert!(response.location.is_some());
}

#[tokio::test]
async fn non_canonical_user_type_is_rejected() {
    let service = service();
    let mut body = user_body("u1");
    body["userType"] = json!("NotLegal");
    let err = service.users().create(&ctx(), &body).await.unwrap_err();
    assert!(matches!(err, ScimError::InvalidValue { .. }));
    assert_eq!(err.http_status(), 400);
}

#[tokio::test]
async fn missing_required_user_name_is_rejected() {
    let service = service();
    let err = service
        .users()
        .create(
            &ctx(),
            &json!({"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"]}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ScimError::InvalidValue { .. }));
}

#[tokio::test]
async fn duplicate_user_name_conflicts() {
    let service = service();
    create_user(&service, user_body("taken")).await;
    let err = service
        .users()
        .create(&ctx(), &user_body("taken"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScimError::Uniqueness { .. }));
    assert_eq!(err.http_status(), 409);
}

#[tokio::test]
async fn password_is_hashed_and_never_returned() {
    let service = service();
    let mut body = user_body("u1");
    body["password"] = json!("hunter2");
    let created = create_user(&service, body).await;
    assert!(created.get("password").is_none());

    // The stored value is a bcrypt digest, not the plain text.
    let id = id_of(&created);
    let stored = service
        .users()
        .storage()
        .get(&ctx(), &id, None)
        .await
        .unwrap();
    let digest = stored
        .get(&scimd::expr::compile_path("password").unwrap())
        .unwrap();
    let digest = digest.as_str().unwrap();
    assert!(digest.starts_with("$2"));
    assert!(bcrypt::verify("hunter2", digest).unwrap());
}

#[tokio::test]
async fn changing_id_on_replace_is_a_mutability_error() {
    let service = service();
    let created = create_user(&service, user_body("u1")).await;
    let id = id_of(&created);

    let mut replacement = user_body("renamed");
    replacement["id"] = json!("different-id");
    let err = service
        .users()
        .replace(&ctx(), &id, &replacement, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ScimError::Mutability { .. }));

    // Changing a readWrite attribute is fine.
    let ok = service
        .users()
        .replace(&ctx(), &id, &user_body("renamed"), None)
        .await
        .unwrap();
    assert_eq!(ok.status, 200);
    assert_eq!(ok.body.unwrap()["userName"], "renamed");
}

#[tokio::test]
async fn unchanged_replace_reports_no_change() {
    let service = service();
    let created = create_user(&service, user_body("u1")).await;
    let id = id_of(&created);

    let response = service
        .users()
        .replace(&ctx(), &id, &user_body("u1"), None)
        .await
        .unwrap();
    assert_eq!(response.status, 204);
    assert!(response.body.is_none());
}

#[tokio::test]
async fn replace_bumps_last_modified_and_version() {
    let service = service();
    let created = create_user(&service, user_body("u1")).await;
    let id = id_of(&created);

    let response = service
        .users()
        .replace(&ctx(), &id, &user_body("changed"), None)
        .await
        .unwrap();
    let body = response.body.unwrap();
    assert_ne!(body["meta"]["version"], created["meta"]["version"]);
    assert_eq!(body["meta"]["created"], created["meta"]["created"]);
}
