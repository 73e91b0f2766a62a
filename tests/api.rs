mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::*;
use landline_backend::routes::create_router;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    inventory_id: i32,
}

async fn spawn_app() -> TestApp {
    let db = setup_db().await;
    let fx = la_to_sf(&db).await;
    let unit = unit_on(&db, fx.schedule_id, weekday()).await;

    TestApp {
        router: create_router(test_state(db)),
        inventory_id: unit.id,
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn booking_body(inventory_id: i32, seat_number: Option<i32>) -> Value {
    json!({
        "inventory_id": inventory_id,
        "passenger_name": "Jane Doe",
        "passenger_email": "jane@example.com",
        "seat_number": seat_number,
    })
}

async fn signup(app: &TestApp, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_signup_and_signin() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "email": "Rider@Example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "rider@example.com");
    assert!(body["token"].is_string());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "email": "rider@example.com", "password": "another1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "email": "new@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be at least 6 characters");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/signin",
        None,
        Some(json!({ "email": "rider@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/signin",
        None,
        Some(json!({ "email": "rider@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_search_departures() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/schedules/search?origin=Los%20Angeles&destination=San%20Francisco&date=2025-12-18",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let departures = body.as_array().unwrap();
    assert_eq!(departures.len(), 1);
    assert_eq!(departures[0]["inventory_id"], app.inventory_id);
    assert_eq!(departures[0]["available_seats"], 14);
    assert_eq!(departures[0]["price"], 49.0);
    assert_eq!(departures[0]["departure_time"], "06:00:00");

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/schedules/search?origin=Los%20Angeles&date=2025-12-18",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/schedules/search?origin=Los%20Angeles&destination=San%20Francisco&date=18-12-2025",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date format. Use YYYY-MM-DD");

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/schedules/search?origin=Boston&destination=Phoenix&date=2025-12-18",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalogue_lists_routes_and_locations() {
    let app = spawn_app().await;

    let (status, body) = send(&app, Method::GET, "/api/routes", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["origin"], "Los Angeles");
    assert_eq!(body[0]["base_price"], 49.0);

    let (status, body) = send(&app, Method::GET, "/api/routes/locations", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["Los Angeles", "San Francisco"]));
}

#[tokio::test]
async fn test_anonymous_booking_lifecycle() {
    let app = spawn_app().await;
    let inventory_id = app.inventory_id;

    let (status, booking) = send(
        &app,
        Method::POST,
        "/api/bookings",
        None,
        Some(booking_body(inventory_id, Some(3))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["price"], 49.0);
    assert_eq!(booking["seat_number"], 3);
    assert_eq!(booking["booking_date"], "2025-12-18");
    let id = booking["id"].as_i64().unwrap();

    let (status, quote) = send(
        &app,
        Method::GET,
        &format!("/api/schedules/{}/availability", inventory_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["available_seats"], 13);
    assert_eq!(quote["total_seats"], 14);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/bookings",
        None,
        Some(booking_body(inventory_id, Some(3))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/bookings/{}", id),
        None,
        Some(json!({ "passenger_name": "Jane Doe" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No valid fields to update");

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("/api/bookings/{}", id),
        None,
        Some(json!({ "seat_number": 8 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "modified");
    assert_eq!(updated["seat_number"], 8);
    assert_eq!(updated["departure_time"], "06:00:00");
    assert_eq!(updated["arrival_time"], "10:30:00");

    let (status, cancelled) = send(
        &app,
        Method::DELETE,
        &format!("/api/bookings/{}", id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert!(cancelled["cancelled_at"].is_string());

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/bookings/{}", id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, history) = send(
        &app,
        Method::GET,
        &format!("/api/bookings/{}/history", id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["modification_type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["seat_changed", "cancelled"]);
}

#[tokio::test]
async fn test_booking_input_errors() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/bookings",
        None,
        Some(json!({ "inventory_id": app.inventory_id, "passenger_name": "Jane" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Missing required fields: inventory_id, passenger_name, passenger_email"
    );

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/bookings",
        None,
        Some(json!({
            "inventory_id": app.inventory_id,
            "passenger_name": "Jane",
            "passenger_email": "jane@example.com",
            "seat_level": 7,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/bookings",
        None,
        Some(booking_body(9999, None)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/bookings/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/schedules/9999/availability",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/api/schedules/abc/seats", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{}", body);

    let (status, body) = send(&app, Method::DELETE, "/api/bookings/first", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{}", body);

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/bookings/9999",
        None,
        Some(json!({ "passenger_email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Booking not found");
}

#[tokio::test]
async fn test_seat_map_by_tier() {
    let app = spawn_app().await;
    send(
        &app,
        Method::POST,
        "/api/bookings",
        None,
        Some(booking_body(app.inventory_id, Some(11))),
    )
    .await;

    let (status, map) = send(
        &app,
        Method::GET,
        &format!("/api/schedules/{}/seats", app.inventory_id),
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(map["1"].as_array().unwrap().len(), 5);
    assert_eq!(map["2"].as_array().unwrap().len(), 5);
    assert_eq!(map["3"].as_array().unwrap().len(), 4);
    assert_eq!(map["3"][0], json!({ "seat_number": 11, "level": 3, "available": false }));
    assert_eq!(map["3"][1]["available"], true);
}

#[tokio::test]
async fn test_signed_in_bookings_are_listed() {
    let app = spawn_app().await;
    let token = signup(&app, "rider@example.com").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/bookings",
        Some(&token),
        Some(booking_body(app.inventory_id, None)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // A bad token still books, just anonymously.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/bookings",
        Some("not-a-token"),
        Some(booking_body(app.inventory_id, None)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, mine) = send(&app, Method::GET, "/api/bookings/my", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["origin"], "Los Angeles");
    assert_eq!(mine[0]["destination"], "San Francisco");
    assert_eq!(mine[0]["passenger_name"], "Jane Doe");

    let (status, _) = send(&app, Method::GET, "/api/bookings/my", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
