//! Estates and their assets, expenses and disputes.
//!
//! Requires `TEST_DATABASE_URL`; see the crate docs.

use estate_desk_integration_tests::{TestServer, application_payload, unique};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

async fn create_estate(server: &TestServer, token: &str) -> Value {
    let (status, application) = server
        .send(
            Method::POST,
            "/applications/",
            token,
            Some(application_payload(&unique("Estate Agency"), "Eoin", &unique("Nolan"))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, estate) = server
        .send(
            Method::POST,
            "/estates/",
            token,
            Some(json!({
                "application": application["id"],
                "assets": [{
                    "name": "Family home",
                    "real_and_leasehold_properties": [
                        {"description": "House in Cork", "value": "350000.00"}
                    ],
                    "cars_and_boats": [{"description": "Car", "value": 8000}],
                }],
                "expenses": [{
                    "name": "Liabilities",
                    "tax_liabilities": [{"description": "CAT", "value": "1200.50"}],
                }],
                "disputes": [{"description": "Claim by nephew"}],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{estate}");
    estate
}

async fn count(server: &TestServer, table: &str, estate_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM loan.{table} WHERE estate_id = $1"
    ))
    .bind(estate_id)
    .fetch_one(&server.pool)
    .await
    .expect("Count query failed")
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_nested_create_and_read() {
    let server = TestServer::start().await;
    let token = server.login().await;
    let estate = create_estate(&server, &token).await;

    let asset = &estate["assets"][0];
    assert_eq!(asset["name"], "Family home");
    assert_eq!(
        asset["real_and_leasehold_properties"][0]["value"],
        "350000.00"
    );
    assert_eq!(asset["cars_and_boats"][0]["value"], "8000.00");
    assert_eq!(asset["household_contents"], json!([]));
    assert_eq!(estate["expenses"][0]["tax_liabilities"][0]["description"], "CAT");
    assert_eq!(estate["expenses"][0]["secured_mortgages"], json!([]));
    assert_eq!(estate["disputes"][0]["description"], "Claim by nephew");

    let id = estate["id"].as_i64().unwrap_or_default();
    let (status, shown) = server
        .send(Method::GET, &format!("/estates/{id}/"), &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shown, estate);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_unknown_application_rejected() {
    let server = TestServer::start().await;
    let token = server.login().await;

    let (status, body) = server
        .send(
            Method::POST,
            "/estates/",
            &token,
            Some(json!({"application": 999_999_999, "assets": [{"name": "Orphan"}]})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["application"].is_array());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_delete_estate_cascades() {
    let server = TestServer::start().await;
    let token = server.login().await;
    let estate = create_estate(&server, &token).await;
    let id = estate["id"].as_i64().unwrap_or_default();
    let asset_id = estate["assets"][0]["id"].as_i64().unwrap_or_default();

    let (status, _) = server
        .send(Method::DELETE, &format!("/estates/{id}/"), &token, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for table in ["asset", "expense", "dispute"] {
        assert_eq!(count(&server, table, id).await, 0, "{table}");
    }
    let items: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM loan.asset_item WHERE asset_id = $1")
            .bind(asset_id)
            .fetch_one(&server.pool)
            .await
            .expect("Count query failed");
    assert_eq!(items, 0);

    let (status, _) = server
        .send(Method::GET, &format!("/estates/{id}/"), &token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_asset_update_replaces_supplied_categories() {
    let server = TestServer::start().await;
    let token = server.login().await;
    let estate = create_estate(&server, &token).await;
    let asset_id = estate["assets"][0]["id"].as_i64().unwrap_or_default();

    let (status, asset) = server
        .send(
            Method::PATCH,
            &format!("/assets/{asset_id}"),
            &token,
            Some(json!({
                "name": "Home and car",
                "cars_and_boats": [
                    {"description": "Car", "value": "7500.00"},
                    {"description": "Boat", "value": "3000"},
                ],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(asset["name"], "Home and car");
    assert_eq!(asset["cars_and_boats"].as_array().map(Vec::len), Some(2));
    // Categories absent from the payload are untouched
    assert_eq!(
        asset["real_and_leasehold_properties"],
        estate["assets"][0]["real_and_leasehold_properties"]
    );
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_dispute_lifecycle() {
    let server = TestServer::start().await;
    let token = server.login().await;
    let estate = create_estate(&server, &token).await;
    let dispute_id = estate["disputes"][0]["id"].as_i64().unwrap_or_default();
    let path = format!("/disputes/{dispute_id}");

    let (status, body) = server.send(Method::PUT, &path, &token, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["description"].is_array());

    let (status, dispute) = server
        .send(
            Method::PUT,
            &path,
            &token,
            Some(json!({"description": "Claim settled"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dispute["description"], "Claim settled");

    let (status, _) = server.send(Method::DELETE, &path, &token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = server.send(Method::GET, &path, &token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_put_accepts_own_representation() {
    let server = TestServer::start().await;
    let token = server.login().await;
    let estate = create_estate(&server, &token).await;

    for (path, body) in [
        ("assets", &estate["assets"][0]),
        ("expenses", &estate["expenses"][0]),
    ] {
        let id = body["id"].as_i64().unwrap_or_default();
        let (status, updated) = server
            .send(Method::PUT, &format!("/{path}/{id}/"), &token, Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::OK, "{path}: {updated}");
        assert_eq!(updated["id"], body["id"]);
        assert_eq!(updated["name"], body["name"]);
    }

    let id = estate["expenses"][0]["id"].as_i64().unwrap_or_default();
    let (_, expense) = server
        .send(Method::GET, &format!("/expenses/{id}/"), &token, None)
        .await;
    assert_eq!(expense["tax_liabilities"][0]["description"], "CAT");
    assert_eq!(expense["tax_liabilities"][0]["value"], "1200.50");
}
