use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;

use migration::MigratorTrait;

async fn test_app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (username, display_name) in [("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, display_name) VALUES (?, ?, ?)",
            vec![username.into(), "password".into(), display_name.into()],
        ))
        .await
        .unwrap();
    }
    let engine = engine::Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    server::app(engine, db)
}

fn basic_auth(username: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{username}:password"));
    format!("Basic {encoded}")
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth(user));
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let request = builder.body(body).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}

async fn make_group(app: &Router, name: &str, members: &[&str]) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/group",
        "alice",
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let group_id = body["id"].as_str().unwrap().to_string();

    for member in members {
        let (status, _) = send(
            app,
            "POST",
            &format!("/group/{group_id}/members"),
            "alice",
            Some(json!({ "username": member, "role": "member" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    group_id
}

#[tokio::test]
async fn missing_or_bad_credentials_are_rejected() {
    let app = test_app().await;

    // No Authorization header at all: the typed-header extractor rejects it.
    let request = Request::builder()
        .method("GET")
        .uri("/groups")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Wrong password.
    let encoded = base64::engine::general_purpose::STANDARD.encode("alice:nope");
    let request = Request::builder()
        .method("GET")
        .uri("/groups")
        .header(header::AUTHORIZATION, format!("Basic {encoded}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown user.
    let (status, _) = send(&app, "GET", "/groups", "mallory", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn group_crud_roundtrip() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/group",
        "alice",
        Some(json!({ "name": "Flat 4B", "description": "terrace flat" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let group_id = body["id"].as_str().unwrap().to_string();

    // Snapshot by case-insensitive name.
    let (status, body) = send(
        &app,
        "GET",
        "/group",
        "alice",
        Some(json!({ "name": "flat 4b" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], group_id.as_str());
    assert_eq!(body["name"], "Flat 4B");
    assert_eq!(body["description"], "terrace flat");
    assert_eq!(body["owner"], "alice");
    assert_eq!(body["currency"], "INR");

    // Neither id nor name is a bad request.
    let (status, _) = send(&app, "GET", "/group", "alice", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/group/{group_id}"),
        "alice",
        Some(json!({ "name": "Flat 4C" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/groups", "alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["groups"].as_array().unwrap().len(), 1);
    assert_eq!(body["groups"][0]["name"], "Flat 4C");

    let (status, _) = send(&app, "DELETE", &format!("/group/{group_id}"), "alice", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "GET",
        "/group",
        "alice",
        Some(json!({ "id": group_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn membership_rules_are_enforced() {
    let app = test_app().await;
    let group_id = make_group(&app, "Flat", &["bob"]).await;

    // Members can read the roster.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/group/{group_id}/members"),
        "bob",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let members = body["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["username"], "alice");
    assert_eq!(members[0]["display_name"], "Alice");
    assert_eq!(members[0]["role"], "admin");
    assert_eq!(members[1]["username"], "bob");
    assert_eq!(members[1]["role"], "member");

    // Plain members cannot manage the roster or the group.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/group/{group_id}/members"),
        "bob",
        Some(json!({ "username": "carol", "role": "member" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("admin role"));

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/group/{group_id}"),
        "bob",
        Some(json!({ "name": "Bob's flat" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Outsiders get a 404, never a 403, so group ids do not leak.
    let (status, _) = send(
        &app,
        "GET",
        &format!("/group/{group_id}/members"),
        "carol",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Leaving is allowed without the admin role.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/group/{group_id}/members/bob"),
        "bob",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The creator's admin membership is protected.
    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/group/{group_id}/members/alice"),
        "alice",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("creator"));
}

#[tokio::test]
async fn expenses_balances_and_settlements_flow() {
    let app = test_app().await;
    let group_id = make_group(&app, "Flat", &["bob", "carol"]).await;

    let (status, body) = send(
        &app,
        "POST",
        "/expense",
        "alice",
        Some(json!({
            "group_id": group_id,
            "title": "Dinner",
            "amount_minor": 9000,
            "category": "food",
            "split": { "kind": "equal", "participants": ["alice", "bob", "carol"] },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_str().is_some());

    let (status, body) = send(
        &app,
        "GET",
        &format!("/group/{group_id}/balances"),
        "bob",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group_id"], group_id.as_str());
    assert_eq!(body["currency"], "INR");
    assert_eq!(body["residual_minor"], 0);
    let balances = body["balances"].as_array().unwrap();
    assert_eq!(balances[0]["username"], "alice");
    assert_eq!(balances[0]["paid_minor"], 9000);
    assert_eq!(balances[0]["owes_minor"], 3000);
    assert_eq!(balances[0]["balance_minor"], 6000);
    let transfers = body["transfers"].as_array().unwrap();
    assert_eq!(transfers.len(), 2);
    assert_eq!(transfers[0]["from"], "bob");
    assert_eq!(transfers[0]["to"], "alice");
    assert_eq!(transfers[0]["amount_minor"], 3000);

    // Bob pays his share back; `from` defaults to the caller.
    let (status, _) = send(
        &app,
        "POST",
        "/settlement",
        "bob",
        Some(json!({ "group_id": group_id, "to": "alice", "amount_minor": 3000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/group/{group_id}/balances"),
        "bob",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let balances = body["balances"].as_array().unwrap();
    assert_eq!(balances[0]["balance_minor"], 3000);
    let bob = balances
        .iter()
        .find(|row| row["username"] == "bob")
        .unwrap();
    assert_eq!(bob["settled_minor"], 3000);
    assert_eq!(bob["balance_minor"], 0);
    let transfers = body["transfers"].as_array().unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0]["from"], "carol");

    let (status, body) = send(
        &app,
        "GET",
        "/settlements",
        "carol",
        Some(json!({ "group_id": group_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let settlements = body["settlements"].as_array().unwrap();
    assert_eq!(settlements.len(), 1);
    assert_eq!(settlements[0]["from"], "bob");
    assert_eq!(settlements[0]["to"], "alice");
    assert_eq!(settlements[0]["amount_minor"], 3000);

    let (status, body) = send(&app, "GET", "/dashboard", "alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["net_minor"], 3000);
    assert_eq!(body["receivable_minor"], 3000);
    assert_eq!(body["payable_minor"], 0);
    assert_eq!(body["groups"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_expenses_are_rejected() {
    let app = test_app().await;
    let group_id = make_group(&app, "Flat", &["bob"]).await;

    // Unequal shares must cover the amount.
    let (status, body) = send(
        &app,
        "POST",
        "/expense",
        "alice",
        Some(json!({
            "group_id": group_id,
            "title": "Groceries",
            "amount_minor": 5000,
            "split": { "kind": "unequal", "shares": [
                { "username": "alice", "amount_minor": 2000 },
                { "username": "bob", "amount_minor": 2500 },
            ]},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("split amounts sum"));

    // Percent weights must sum to 100%.
    let (status, _) = send(
        &app,
        "POST",
        "/expense",
        "alice",
        Some(json!({
            "group_id": group_id,
            "title": "Rent",
            "amount_minor": 150000,
            "split": { "kind": "percent", "shares": [
                { "username": "alice", "percent_bp": 6000 },
                { "username": "bob", "percent_bp": 3000 },
            ]},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Split participants must belong to the group.
    let (status, body) = send(
        &app,
        "POST",
        "/expense",
        "alice",
        Some(json!({
            "group_id": group_id,
            "title": "Dinner",
            "amount_minor": 3000,
            "split": { "kind": "equal", "participants": ["alice", "carol"] },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("carol"));

    // Unknown category.
    let (status, _) = send(
        &app,
        "POST",
        "/expense",
        "alice",
        Some(json!({
            "group_id": group_id,
            "title": "Dinner",
            "amount_minor": 3000,
            "category": "fuel",
            "split": { "kind": "equal", "participants": ["alice"] },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // A split request missing its participants is malformed.
    let (status, _) = send(
        &app,
        "POST",
        "/expense",
        "alice",
        Some(json!({
            "group_id": group_id,
            "title": "Dinner",
            "amount_minor": 3000,
            "split": { "kind": "equal" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Non-members cannot record expenses against the group.
    let (status, _) = send(
        &app,
        "POST",
        "/expense",
        "carol",
        Some(json!({
            "group_id": group_id,
            "title": "Dinner",
            "amount_minor": 3000,
            "split": { "kind": "equal", "participants": ["carol"] },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expense_detail_update_and_delete() {
    let app = test_app().await;
    let group_id = make_group(&app, "Flat", &["bob"]).await;

    let (status, body) = send(
        &app,
        "POST",
        "/expense",
        "alice",
        Some(json!({
            "group_id": group_id,
            "title": "Electricity bill",
            "amount_minor": 8000,
            "category": "electricity",
            "split": { "kind": "unequal", "shares": [
                { "username": "alice", "amount_minor": 5000 },
                { "username": "bob", "amount_minor": 3000 },
            ]},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let expense_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/expenses/get",
        "bob",
        Some(json!({ "group_id": group_id, "expense_id": expense_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Electricity bill");
    assert_eq!(body["category"], "electricity");
    assert_eq!(body["created_by"], "alice");
    let splits = body["splits"].as_array().unwrap();
    assert_eq!(splits.len(), 2);
    assert!(splits[0]["percent_bp"].is_null());

    // Any member may edit; the title changes without touching the splits.
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/expense/{expense_id}"),
        "bob",
        Some(json!({ "group_id": group_id, "title": "Electricity (March)" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Changing the amount without a fresh split is rejected.
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/expense/{expense_id}"),
        "alice",
        Some(json!({ "group_id": group_id, "amount_minor": 9000 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("split"));

    let (status, body) = send(
        &app,
        "GET",
        "/expenses",
        "alice",
        Some(json!({ "group_id": group_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let expenses = body["expenses"].as_array().unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0]["title"], "Electricity (March)");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/expense/{expense_id}"),
        "alice",
        Some(json!({ "group_id": group_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "POST",
        "/expenses/get",
        "alice",
        Some(json!({ "group_id": group_id, "expense_id": expense_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_aggregate_by_category_member_and_month() {
    let app = test_app().await;
    let group_id = make_group(&app, "Flat", &["bob", "carol"]).await;

    for (title, amount, category, payer) in [
        ("Rent", 150_000, "rent", "alice"),
        ("Veg", 40_000, "groceries", "bob"),
        ("Fruit", 20_000, "groceries", "bob"),
    ] {
        let (status, _) = send(
            &app,
            "POST",
            "/expense",
            payer,
            Some(json!({
                "group_id": group_id,
                "title": title,
                "amount_minor": amount,
                "category": category,
                "split": { "kind": "unequal", "shares": [
                    { "username": payer, "amount_minor": amount },
                ]},
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        "GET",
        "/stats",
        "carol",
        Some(json!({ "group_id": group_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currency"], "INR");
    assert_eq!(body["total_spent_minor"], 210_000);
    assert_eq!(body["expense_count"], 3);
    assert_eq!(body["average_expense_minor"], 70_000);

    let categories = body["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0]["category"], "rent");
    assert_eq!(categories[0]["total_minor"], 150_000);
    assert_eq!(categories[0]["share_bp"], 7142);
    assert_eq!(categories[1]["category"], "groceries");
    assert_eq!(categories[1]["total_minor"], 60_000);

    let members = body["members"].as_array().unwrap();
    assert_eq!(members[0]["username"], "alice");
    assert_eq!(members[0]["paid_minor"], 150_000);
    assert_eq!(members[2]["paid_minor"], 0);

    let monthly = body["monthly"].as_array().unwrap();
    assert_eq!(monthly.len(), 6);
    assert_eq!(monthly[5]["total_minor"], 210_000);

    // A shorter window trims the series.
    let (status, body) = send(
        &app,
        "GET",
        "/stats",
        "alice",
        Some(json!({ "group_id": group_id, "months": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["monthly"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn profile_update_changes_display_name() {
    let app = test_app().await;
    let group_id = make_group(&app, "Flat", &[]).await;

    let (status, _) = send(
        &app,
        "POST",
        "/user/profile",
        "alice",
        Some(json!({ "display_name": "Alice W" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/group/{group_id}/members"),
        "alice",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"][0]["display_name"], "Alice W");

    let (status, _) = send(
        &app,
        "POST",
        "/user/profile",
        "alice",
        Some(json!({ "display_name": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
