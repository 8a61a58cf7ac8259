//! Application intake, nested relations and listing.
//!
//! Requires `TEST_DATABASE_URL`; see the crate docs.

use estate_desk_integration_tests::{TestServer, application_payload, unique};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

async fn count(server: &TestServer, sql: &str, bind: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(bind)
        .fetch_one(&server.pool)
        .await
        .expect("Count query failed")
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_create_returns_detail() {
    let server = TestServer::start().await;
    let token = server.login().await;
    let agency = unique("Detail Agency");

    let (status, body) = server
        .send(
            Method::POST,
            "/applications/",
            &token,
            Some(application_payload(&agency, "Aoife", &unique("Byrne"))),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["amount"], "15000.00");
    assert_eq!(body["term"], 12);
    assert_eq!(body["agency"]["name"], agency.as_str());
    assert_eq!(body["application_status"]["id"], 1);
    assert_eq!(body["application_status"]["name"], "Active Application");
    assert_eq!(body["lead_solicitor"]["first_name"], "Aoife");
    assert!(body["created_by"].is_i64());
    assert!(body["date_submitted"].is_string());

    // The solicitor had no agency, so it is linked to this one
    assert_eq!(body["lead_solicitor"]["agency"], body["agency"]["id"]);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_inline_relations_do_not_duplicate() {
    let server = TestServer::start().await;
    let token = server.login().await;
    let agency = unique("Shared Agency");
    let last_name = unique("Murphy");

    let mut ids = Vec::new();
    for _ in 0..2 {
        let (status, body) = server
            .send(
                Method::POST,
                "/applications/",
                &token,
                Some(application_payload(&agency, "Sean", &last_name)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push((body["agency"]["id"].clone(), body["lead_solicitor"]["id"].clone()));
    }

    assert_eq!(ids[0], ids[1]);
    assert_eq!(
        count(&server, "SELECT COUNT(*) FROM loan.agency WHERE name = $1", &agency).await,
        1
    );
    assert_eq!(
        count(
            &server,
            "SELECT COUNT(*) FROM loan.solicitor WHERE last_name = $1",
            &last_name
        )
        .await,
        1
    );
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_term_out_of_range_rejected() {
    let server = TestServer::start().await;
    let token = server.login().await;
    let agency = unique("Term Agency");

    for term in [json!(0), json!(37), json!(-1), json!(12.5), json!("soon")] {
        let mut payload = application_payload(&agency, "Term", "Check");
        payload["term"] = term.clone();
        let (status, body) = server
            .send(Method::POST, "/applications/", &token, Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "term {term}");
        assert!(body["term"].is_array());
    }

    // Nothing was written for the rejected requests
    assert_eq!(
        count(&server, "SELECT COUNT(*) FROM loan.agency WHERE name = $1", &agency).await,
        0
    );
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_required_relations() {
    let server = TestServer::start().await;
    let token = server.login().await;

    let (status, body) = server
        .send(
            Method::POST,
            "/applications/",
            &token,
            Some(json!({"amount": "100.00", "term": 6, "agency": null})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["agency", "application_status", "lead_solicitor"] {
        assert!(body[field].is_array(), "{field}: {body}");
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_partial_update_touches_only_amount() {
    let server = TestServer::start().await;
    let token = server.login().await;

    let (_, created) = server
        .send(
            Method::POST,
            "/applications/",
            &token,
            Some(application_payload(&unique("Patch Agency"), "Niamh", &unique("Kelly"))),
        )
        .await;
    let id = created["id"].as_i64().unwrap_or_default();

    let (status, updated) = server
        .send(
            Method::PATCH,
            &format!("/applications/{id}/"),
            &token,
            Some(json!({"amount": 2500.5})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["amount"], "2500.50");
    for field in [
        "term",
        "agency",
        "application_status",
        "lead_solicitor",
        "created_by",
        "user",
        "date_submitted",
    ] {
        assert_eq!(updated[field], created[field], "{field}");
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_inline_agency_updates_linked_row() {
    let server = TestServer::start().await;
    let token = server.login().await;

    let (_, created) = server
        .send(
            Method::POST,
            "/applications/",
            &token,
            Some(application_payload(&unique("Rename Agency"), "Ciara", &unique("Ryan"))),
        )
        .await;
    let id = created["id"].as_i64().unwrap_or_default();
    let renamed = unique("Renamed Agency");

    let (status, updated) = server
        .send(
            Method::PATCH,
            &format!("/applications/{id}/"),
            &token,
            Some(json!({"agency": {"name": renamed}})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["agency"]["id"], created["agency"]["id"]);
    assert_eq!(updated["agency"]["name"], renamed.as_str());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_list_orders_by_descending_id() {
    let server = TestServer::start().await;
    let token = server.login().await;
    let agency = unique("List Agency");

    let mut created = Vec::new();
    for _ in 0..2 {
        let (_, body) = server
            .send(
                Method::POST,
                "/applications/",
                &token,
                Some(application_payload(&agency, "Liam", "Ward")),
            )
            .await;
        created.push(body["id"].as_i64().unwrap_or_default());
    }

    let (status, list) = server.send(Method::GET, "/applications/", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = list
        .as_array()
        .map(|items| items.iter().filter_map(|a| a["id"].as_i64()).collect())
        .unwrap_or_default();
    assert!(ids.windows(2).all(|w| w[0] > w[1]));
    assert!(created.iter().all(|id| ids.contains(id)));

    // List items carry ids, not nested objects
    let first: &Value = &list[0];
    assert!(first.get("agency").is_none());
    assert!(first["application_status"].is_i64() || first["application_status"].is_null());

    let (_, detail) = server
        .send(Method::GET, &format!("/applications/{}/", created[0]), &token, None)
        .await;
    let agency_id = detail["agency"]["id"].as_i64().unwrap_or_default();
    let (status, filtered) = server
        .send(Method::GET, &format!("/applications/?agency={agency_id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filtered.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_application_statuses_listed() {
    let server = TestServer::start().await;
    let token = server.login().await;

    let (status, list) = server
        .send(Method::GET, "/application-statuses/", &token, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(
        list.as_array()
            .is_some_and(|s| s.iter().any(|s| s["id"] == 7 && s["name"] == "Settled"))
    );
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_failed_create_rolls_back_inline_rows() {
    let server = TestServer::start().await;
    let token = server.login().await;
    let agency = unique("Rollback Agency");
    let last_name = unique("Doyle");

    // Status, agency and solicitor resolve before the user, so the new rows
    // exist inside the transaction when the unknown user fails it.
    let mut payload = application_payload(&agency, "Roisin", &last_name);
    payload["user"] = json!(999_999_999);
    let (status, body) = server
        .send(Method::POST, "/applications/", &token, Some(payload))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["user"].is_array(), "{body}");
    assert_eq!(
        count(&server, "SELECT COUNT(*) FROM loan.agency WHERE name = $1", &agency).await,
        0
    );
    assert_eq!(
        count(
            &server,
            "SELECT COUNT(*) FROM loan.solicitor WHERE last_name = $1",
            &last_name
        )
        .await,
        0
    );
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_solicitor_keeps_existing_agency() {
    let server = TestServer::start().await;
    let token = server.login().await;

    let (status, home) = server
        .send(
            Method::POST,
            "/agencies/",
            &token,
            Some(json!({
                "name": unique("Home Agency"),
                "house_number": "1",
                "street": "Quay Street",
                "town": "Wexford",
                "county": "Wexford",
                "eircode": "Y35 A1B2",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, solicitor) = server
        .send(
            Method::POST,
            "/solicitors/",
            &token,
            Some(json!({
                "title": "Dr",
                "first_name": "Maeve",
                "last_name": unique("Quinn"),
                "email": "maeve@example.com",
                "phone_number": "0531234567",
                "agency": home["id"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let other = unique("Other Agency");
    let mut payload = application_payload(&other, "unused", "unused");
    payload["lead_solicitor"] = solicitor["id"].clone();
    let (status, body) = server
        .send(Method::POST, "/applications/", &token, Some(payload))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["agency"]["name"], other.as_str());
    assert_eq!(body["lead_solicitor"]["agency"], home["id"]);

    let solicitor_id = solicitor["id"].as_i64().unwrap_or_default();
    let (_, shown) = server
        .send(Method::GET, &format!("/solicitors/{solicitor_id}/"), &token, None)
        .await;
    assert_eq!(shown["agency"]["name"], home["name"]);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_concurrent_creates_share_new_agency() {
    let server = TestServer::start().await;
    let token = server.login().await;
    let agency = unique("Race Agency");
    let last_name = unique("Power");

    let payload = application_payload(&agency, "Cathal", &last_name);
    let (first, second) = tokio::join!(
        server.send(Method::POST, "/applications/", &token, Some(payload.clone())),
        server.send(Method::POST, "/applications/", &token, Some(payload)),
    );

    assert_eq!(first.0, StatusCode::CREATED, "{}", first.1);
    assert_eq!(second.0, StatusCode::CREATED, "{}", second.1);
    assert_eq!(first.1["agency"]["id"], second.1["agency"]["id"]);
    assert_eq!(
        count(&server, "SELECT COUNT(*) FROM loan.agency WHERE name = $1", &agency).await,
        1
    );
    assert_eq!(
        count(
            &server,
            "SELECT COUNT(*) FROM loan.solicitor WHERE last_name = $1",
            &last_name
        )
        .await,
        1
    );
}
