//! Filtered queries, sorting, pagination and projection at the service
//! level.

mod common;

use common::{create_user, ctx, service, user_body};
use scimd::error::ScimError;
use scimd::protocol::SearchParams;
use scimd::query::SortOrder;
use serde_json::json;

#[tokio::test]
async fn filter_on_multi_valued_email_matches_any_element() {
    let service = service();
    for (name, email) in [("a", "x@y"), ("b", "x@y"), ("c", "other@y")] {
        let mut body = user_body(name);
        body["emails"] = json!([
            {"value": email, "type": "work"},
            {"value": format!("{name}@alt"), "type": "home"}
        ]);
        create_user(&service, body).await;
    }

    let result = service
        .users()
        .query(
            &ctx(),
            &SearchParams {
                filter: Some(r#"emails.value eq "x@y""#.to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(result.total_results, 2);
    let names: Vec<&str> = result
        .resources
        .iter()
        .map(|r| r["userName"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"a") && names.contains(&"b"));
}

#[tokio::test]
async fn compound_filters_and_negation() {
    let service = service();
    for (name, active) in [("alice", true), ("bob", false), ("carol", true)] {
        let mut body = user_body(name);
        body["active"] = json!(active);
        create_user(&service, body).await;
    }

    let active = service
        .users()
        .query(
            &ctx(),
            &SearchParams {
                filter: Some(r#"active eq true and userName sw "a""#.to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(active.total_results, 1);
    assert_eq!(active.resources[0]["userName"], "alice");

    let inactive = service
        .users()
        .query(
            &ctx(),
            &SearchParams {
                filter: Some("not (active eq true)".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(inactive.total_results, 1);
    assert_eq!(inactive.resources[0]["userName"], "bob");
}

#[tokio::test]
async fn bad_filter_is_invalid_filter() {
    let service = service();
    let err = service
        .users()
        .query(
            &ctx(),
            &SearchParams {
                filter: Some("userName eq unquoted".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ScimError::InvalidFilter { .. }));
}

#[tokio::test]
async fn sorting_and_pagination_cooperate() {
    let service = service();
    for name in ["delta", "alpha", "charlie", "bravo"] {
        create_user(&service, user_body(name)).await;
    }

    let page = service
        .users()
        .query(
            &ctx(),
            &SearchParams {
                sort_by: Some("userName".to_string()),
                sort_order: SortOrder::Ascending,
                start_index: Some(2),
                count: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total_results, 4);
    assert_eq!(page.items_per_page, 2);
    assert_eq!(page.start_index, 2);
    let names: Vec<&str> = page
        .resources
        .iter()
        .map(|r| r["userName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["bravo", "charlie"]);

    let descending = service
        .users()
        .query(
            &ctx(),
            &SearchParams {
                sort_by: Some("userName".to_string()),
                sort_order: SortOrder::Descending,
                count: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(descending.resources[0]["userName"], "delta");
}

#[tokio::test]
async fn projection_lists_shape_the_results() {
    let service = service();
    let mut body = user_body("ada");
    body["displayName"] = json!("Ada Lovelace");
    body["emails"] = json!([{"value": "ada@x", "type": "work"}]);
    create_user(&service, body).await;

    let selected = service
        .users()
        .query(
            &ctx(),
            &SearchParams {
                attributes: Some("userName".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let resource = &selected.resources[0];
    assert_eq!(resource["userName"], "ada");
    assert!(resource.get("displayName").is_none());
    assert!(resource.get("id").is_some());

    let excluded = service
        .users()
        .query(
            &ctx(),
            &SearchParams {
                excluded_attributes: Some("emails".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(excluded.resources[0].get("emails").is_none());
    assert_eq!(excluded.resources[0]["displayName"], "Ada Lovelace");

    let both = service
        .users()
        .query(
            &ctx(),
            &SearchParams {
                attributes: Some("userName".to_string()),
                excluded_attributes: Some("emails".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(both, ScimError::InvalidSyntax { .. }));
}

#[tokio::test]
async fn search_body_equals_query_parameters() {
    let service = service();
    create_user(&service, user_body("findme")).await;

    let result = service
        .users()
        .search(
            &ctx(),
            &json!({
                "schemas": ["urn:ietf:params:scim:api:messages:2.0:SearchRequest"],
                "filter": "userName eq \"findme\"",
            }),
        )
        .await
        .unwrap();
    assert_eq!(result.total_results, 1);
}
