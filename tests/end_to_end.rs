//! Full CRUD flows, conditional requests, bulk and concurrency.

mod common;

use common::{create_user, ctx, id_of, service, user_body};
use scimd::error::ScimError;
use scimd::json::Projection;
use scimd::protocol::status_for;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn create_get_replace_delete_lifecycle() {
    let service = service();
    let created = create_user(&service, user_body("lifecycle")).await;
    let id = id_of(&created);

    let fetched = service
        .users()
        .get(&ctx(), &id, &Projection::default(), None)
        .await
        .unwrap();
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.body.unwrap()["userName"], "lifecycle");

    let replaced = service
        .users()
        .replace(&ctx(), &id, &user_body("renamed"), None)
        .await
        .unwrap();
    assert_eq!(replaced.status, 200);

    let deleted = service.users().delete(&ctx(), &id, None).await.unwrap();
    assert_eq!(deleted.status, 204);

    let err = service
        .users()
        .get(&ctx(), &id, &Projection::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ScimError::ResourceNotFound { .. }));
    assert_eq!(err.http_status(), 404);
}

#[tokio::test]
async fn conditional_get_returns_304_on_matching_version() {
    let service = service();
    let created = create_user(&service, user_body("etag")).await;
    let id = id_of(&created);
    let version = created["meta"]["version"].as_str().unwrap().to_string();

    let not_modified = service
        .users()
        .get(&ctx(), &id, &Projection::default(), Some(&version))
        .await
        .unwrap();
    assert_eq!(not_modified.status, 304);
    assert!(not_modified.body.is_none());

    let fresh = service
        .users()
        .get(&ctx(), &id, &Projection::default(), Some("W/\"stale\""))
        .await
        .unwrap();
    assert_eq!(fresh.status, 200);
}

#[tokio::test]
async fn if_match_guards_writes() {
    let service = service();
    let created = create_user(&service, user_body("guarded")).await;
    let id = id_of(&created);
    let version = created["meta"]["version"].as_str().unwrap().to_string();

    let err = service
        .users()
        .replace(&ctx(), &id, &user_body("guarded2"), Some("W/\"wrong\""))
        .await
        .unwrap_err();
    assert!(matches!(err, ScimError::PreConditionFailed { .. }));
    assert_eq!(err.http_status(), 412);

    let ok = service
        .users()
        .replace(&ctx(), &id, &user_body("guarded2"), Some(&version))
        .await
        .unwrap();
    assert_eq!(ok.status, 200);

    // A deleted target under If-Match maps to 412, not 404.
    let missing = service
        .users()
        .delete(&ctx(), "never-there", Some("W/\"x\""))
        .await
        .unwrap_err();
    assert_eq!(status_for(&missing, true), 412);
}

#[tokio::test]
async fn concurrent_writers_on_one_id_serialize() {
    let service = Arc::new(service());
    let created = create_user(&service, user_body("contended")).await;
    let id = id_of(&created);

    let mut handles = Vec::new();
    for n in 0..8 {
        let service = Arc::clone(&service);
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            service
                .users()
                .replace(&ctx(), &id, &user_body(&format!("contended-{n}")), None)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let after = service
        .users()
        .get(&ctx(), &id, &Projection::default(), None)
        .await
        .unwrap();
    let name = after.body.unwrap()["userName"].as_str().unwrap().to_string();
    assert!(name.starts_with("contended-"));
}

#[tokio::test]
async fn bulk_processes_in_order_and_resolves_bulk_ids() {
    let service = service();
    let response = service
        .bulk(
            &ctx(),
            &json!({
                "schemas": ["urn:ietf:params:scim:api:messages:2.0:BulkRequest"],
                "Operations": [
                    {
                        "method": "POST",
                        "path": "/Users",
                        "bulkId": "newUser",
                        "data": user_body("bulk-user"),
                    },
                    {
                        "method": "POST",
                        "path": "/Groups",
                        "bulkId": "newGroup",
                        "data": {
                            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Group"],
                            "displayName": "bulk-group",
                            "members": [{"value": "bulkId:newUser"}],
                        },
                    }
                ],
            }),
        )
        .await
        .unwrap();

    assert_eq!(response.operations.len(), 2);
    assert_eq!(response.operations[0].status, "201");
    assert_eq!(response.operations[1].status, "201");
    assert!(response.operations[0].location.is_some());

    // The group's member resolved to the created user's real id.
    let users = service
        .users()
        .query(&ctx(), &Default::default())
        .await
        .unwrap();
    let user_id = users.resources[0]["id"].as_str().unwrap();
    let groups = service
        .groups()
        .query(&ctx(), &Default::default())
        .await
        .unwrap();
    assert_eq!(groups.resources[0]["members"][0]["value"], user_id);
}

#[tokio::test]
async fn bulk_stops_after_too_many_failures() {
    let service = service();
    let response = service
        .bulk(
            &ctx(),
            &json!({
                "schemas": ["urn:ietf:params:scim:api:messages:2.0:BulkRequest"],
                "failOnErrors": 0,
                "Operations": [
                    {"method": "DELETE", "path": "/Users/missing-1"},
                    {"method": "DELETE", "path": "/Users/missing-2"},
                    {"method": "POST", "path": "/Users", "data": user_body("never-created")},
                ],
            }),
        )
        .await
        .unwrap();

    // One failure exceeds the threshold of zero; later operations are not
    // attempted.
    assert_eq!(response.operations.len(), 1);
    assert_eq!(response.operations[0].status, "404");
    assert!(response.operations[0].response.is_some());

    let users = service
        .users()
        .query(&ctx(), &Default::default())
        .await
        .unwrap();
    assert_eq!(users.total_results, 0);
}

#[tokio::test]
async fn error_bodies_follow_the_scim_shape() {
    let service = service();
    let err = service
        .users()
        .create(
            &ctx(),
            &json!({
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "userName": "u",
                "userType": "NotLegal",
            }),
        )
        .await
        .unwrap_err();
    let body = err.to_body();
    assert_eq!(body["schemas"][0], "urn:ietf:params:scim:api:messages:2.0:Error");
    assert_eq!(body["status"], "400");
    assert_eq!(body["scimType"], "invalidValue");
    assert!(body["detail"].as_str().unwrap().contains("NotLegal"));
}
