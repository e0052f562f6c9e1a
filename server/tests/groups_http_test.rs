//! HTTP Integration Tests for Groups
//!
//! Group creation, membership moves, updates and deletion.
//!
//! Run with: `cargo test --test groups_http_test -- --nocapture`

mod helpers;

use std::collections::BTreeSet;

use axum::http::{Method, StatusCode};
use helpers::{body_to_json, create_admin, create_group, create_user, json_uuid, TestApp};
use portal_server::db::{self, Role};
use portal_server::email::EmailType;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

fn member_ids(group: &serde_json::Value) -> Vec<Uuid> {
    group["member_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().parse().unwrap())
        .collect()
}

#[sqlx::test]
async fn test_create_group_attaches_members_and_notifies(pool: PgPool) {
    let mut app = TestApp::new(pool);
    let admin = create_admin(&app.pool, "root").await;
    let other_admin = create_admin(&app.pool, "root2").await;
    let alice = create_user(&app.pool, "alice", Role::User).await;
    let token = app.token_for(&admin);

    let resp = app
        .send_json(
            Method::POST,
            "/api/groups",
            Some(&token),
            json!({
                "name": "Cohort1",
                "description": "First cohort",
                "user_ids": [alice.id, Uuid::now_v7()],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let group = body_to_json(resp).await;
    assert_eq!(group["name"], "Cohort1");
    assert_eq!(member_ids(&group), vec![alice.id]);

    let sent = app.drain_outbox();
    let assignment: Vec<_> = sent
        .iter()
        .filter(|n| n.kind == EmailType::GroupAssignment)
        .collect();
    assert_eq!(assignment.len(), 1);
    assert_eq!(assignment[0].to, "alice@example.com");
    assert_eq!(assignment[0].params, vec!["Cohort1".to_string(), "root".to_string()]);

    let created_to: BTreeSet<_> = sent
        .iter()
        .filter(|n| n.kind == EmailType::GroupCreated)
        .map(|n| n.to.clone())
        .collect();
    assert_eq!(
        created_to,
        BTreeSet::from([admin.email.clone(), other_admin.email.clone()])
    );

    let dup = app
        .send_json(
            Method::POST,
            "/api/groups",
            Some(&token),
            json!({ "name": "Cohort1" }),
        )
        .await;
    assert_eq!(dup.status(), StatusCode::CONFLICT);
    assert_eq!(body_to_json(dup).await["error"], "GROUP_EXISTS");
}

#[sqlx::test]
async fn test_assign_user_moves_between_groups(pool: PgPool) {
    let mut app = TestApp::new(pool);
    let admin = create_admin(&app.pool, "root").await;
    let x = create_user(&app.pool, "xavier", Role::User).await;
    let h = create_group(&app.pool, "H", &[x.id]).await;
    let g = create_group(&app.pool, "G", &[]).await;
    let token = app.token_for(&admin);

    let resp = app
        .send_json(
            Method::PUT,
            &format!("/api/groups/{}/users/{}", g.id, x.id),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(member_ids(&body_to_json(resp).await), vec![x.id]);

    let h_members = body_to_json(
        app.get(&format!("/api/groups/{}/users", h.id), Some(&token))
            .await,
    )
    .await;
    assert!(h_members.as_array().unwrap().is_empty());

    let sent = app.drain_outbox_of(EmailType::GroupAssignment);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].params[0], "G");

    // Assigning again to the same group sends nothing.
    let resp = app
        .send_json(
            Method::PUT,
            &format!("/api/groups/{}/users/{}", g.id, x.id),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(app.drain_outbox().is_empty());

    let missing = app
        .send_json(
            Method::PUT,
            &format!("/api/groups/{}/users/{}", Uuid::now_v7(), x.id),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test]
async fn test_remove_user_requires_membership(pool: PgPool) {
    let app = TestApp::new(pool);
    let admin = create_admin(&app.pool, "root").await;
    let x = create_user(&app.pool, "xavier", Role::User).await;
    let g = create_group(&app.pool, "G", &[]).await;
    let token = app.token_for(&admin);
    let uri = format!("/api/groups/{}/users/{}", g.id, x.id);

    let resp = app
        .oneshot(
            TestApp::request(Method::DELETE, &uri)
                .header("Authorization", format!("Bearer {token}"))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_to_json(resp).await["error"], "VALIDATION_ERROR");

    db::attach_user_to_group(&app.pool, x.id, g.id).await.unwrap();
    let resp = app
        .oneshot(
            TestApp::request(Method::DELETE, &uri)
                .header("Authorization", format!("Bearer {token}"))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(member_ids(&body_to_json(resp).await).is_empty());
    assert_eq!(db::find_user_group_id(&app.pool, x.id).await.unwrap(), None);
}

#[sqlx::test]
async fn test_update_group_replaces_membership(pool: PgPool) {
    let mut app = TestApp::new(pool);
    let admin = create_admin(&app.pool, "root").await;
    let a = create_user(&app.pool, "anna", Role::User).await;
    let b = create_user(&app.pool, "bert", Role::User).await;
    let g = create_group(&app.pool, "G", &[a.id]).await;
    create_group(&app.pool, "Taken", &[]).await;
    let token = app.token_for(&admin);
    let uri = format!("/api/groups/{}", g.id);

    let rename_clash = app
        .send_json(Method::PUT, &uri, Some(&token), json!({ "name": "Taken" }))
        .await;
    assert_eq!(rename_clash.status(), StatusCode::CONFLICT);

    // Without user_ids the membership is untouched.
    let resp = app
        .send_json(Method::PUT, &uri, Some(&token), json!({ "name": "Renamed" }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let group = body_to_json(resp).await;
    assert_eq!(group["name"], "Renamed");
    assert_eq!(member_ids(&group), vec![a.id]);

    let resp = app
        .send_json(
            Method::PUT,
            &uri,
            Some(&token),
            json!({ "name": "Renamed", "user_ids": [a.id, b.id] }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let mut members = member_ids(&body_to_json(resp).await);
    members.sort();
    let mut expected = vec![a.id, b.id];
    expected.sort();
    assert_eq!(members, expected);

    let sent = app.drain_outbox_of(EmailType::GroupAssignment);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "bert@example.com");

    let resp = app
        .send_json(
            Method::PUT,
            &uri,
            Some(&token),
            json!({ "name": "Renamed", "user_ids": [] }),
        )
        .await;
    assert!(member_ids(&body_to_json(resp).await).is_empty());
}

#[sqlx::test]
async fn test_delete_group_detaches_members(pool: PgPool) {
    let app = TestApp::new(pool);
    let admin = create_admin(&app.pool, "root").await;
    let a = create_user(&app.pool, "anna", Role::User).await;
    let g = create_group(&app.pool, "G", &[a.id]).await;
    let token = app.token_for(&admin);

    let resp = app
        .oneshot(
            TestApp::request(Method::DELETE, &format!("/api/groups/{}", g.id))
                .header("Authorization", format!("Bearer {token}"))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert!(db::find_group_by_id(&app.pool, g.id).await.unwrap().is_none());
    assert_eq!(db::find_user_group_id(&app.pool, a.id).await.unwrap(), None);
    assert!(db::find_user_by_id(&app.pool, a.id).await.unwrap().is_some());

    let resp = app.get("/api/groups", Some(&token)).await;
    assert!(body_to_json(resp).await.as_array().unwrap().is_empty());
}

#[sqlx::test]
async fn test_students_cannot_manage_groups(pool: PgPool) {
    let app = TestApp::new(pool);
    let a = create_user(&app.pool, "anna", Role::User).await;
    let g = create_group(&app.pool, "G", &[a.id]).await;
    let token = app.token_for(&a);

    let resp = app
        .send_json(Method::POST, "/api/groups", Some(&token), json!({ "name": "X" }))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Listing members only needs authentication.
    let resp = app
        .get(&format!("/api/groups/{}/users", g.id), Some(&token))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let members = body_to_json(resp).await;
    assert_eq!(json_uuid(&members[0], "id"), a.id);
}
