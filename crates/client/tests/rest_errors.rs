//! Error surfacing through the store boundary, against an in-process
//! server answering with the backend's error shapes.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use tokio::net::TcpListener;

use motorbay_client::bus::EventBus;
use motorbay_client::session::{Session, SessionStore};
use motorbay_client::stores::{CarsStore, FriendsStore};
use motorbay_shared::{CarSearchQuery, UserProfile};

async fn validation_error() -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "type": "https://tools.ietf.org/html/rfc9110#section-15.5.1",
            "title": "One or more validation errors occurred.",
            "status": 400,
            "traceId": "00-abc-00",
            "errors": {
                "email": ["required"],
                "name": ["too short"]
            }
        })),
    )
}

async fn unauthorized() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, Json(serde_json::json!({})))
}

async fn plain_text_failure() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn start_server() -> String {
    let app = Router::new()
        .route("/api/cars/search", post(validation_error))
        .route("/api/friends", get(unauthorized))
        .route("/api/friends/requests", get(unauthorized))
        .route("/api/chat/conversations", get(plain_text_failure));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn valid_session() -> Session {
    let now = Utc::now();
    Session {
        access_token: "token".to_string(),
        refresh_token: "refresh".to_string(),
        expires_at: now + Duration::hours(1),
        refresh_token_expires_at: now + Duration::days(7),
        user: UserProfile {
            id: "u-1".to_string(),
            email: "ada@motorbay.test".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone_number: None,
            avatar_url: None,
            roles: vec![],
            created_at: now,
        },
    }
}

#[tokio::test]
async fn stores_surface_extracted_error_messages() {
    let base_url = start_server().await;
    std::env::set_var("MOTORBAY_DATA_DIR", std::env::temp_dir().join("motorbay-itests"));
    std::env::set_var("MOTORBAY_API_URL", &base_url);

    let session = SessionStore::with_prefix(EventBus::new(), "itest_errors");
    session.clear();
    session.store(&valid_session());

    // Field-level validation errors are flattened and joined.
    let cars = CarsStore::new(session.clone());
    assert!(!cars.search(CarSearchQuery::default()).await);
    assert_eq!(cars.error(), Some("required. too short".to_string()));
    assert!(!cars.loading());

    // Clearing the error is the caller's dismiss affordance.
    cars.clear_error();
    assert_eq!(cars.error(), None);

    // Authorization failures are worded as a sign-in prompt.
    let friends = FriendsStore::new(session.clone());
    assert!(!friends.refresh().await);
    assert_eq!(
        friends.error(),
        Some("Please sign in to continue.".to_string())
    );

    // Non-JSON bodies are passed through verbatim.
    let conversations = motorbay_client::stores::ConversationsStore::new(session);
    assert!(!conversations.refresh().await);
    assert_eq!(conversations.error(), Some("upstream exploded".to_string()));
}
