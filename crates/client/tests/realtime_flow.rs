//! End-to-end realtime flow against an in-process server.
//!
//! Spins up an axum app serving the friends/chat REST endpoints plus
//! both hub WebSockets, then drives the real client stack: session
//! store, hub manager, throttled reconciliation, optimistic patches.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, RawQuery, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedSender;

use motorbay_client::bus::EventBus;
use motorbay_client::hub::HubManager;
use motorbay_client::session::{Session, SessionStore};
use motorbay_client::stores::{ConversationsStore, FriendsStore};
use motorbay_shared::{
    ChatMessage, ConversationSummary, Friend, FriendRequest, FriendRequestStatus, HubInvocation,
    HubMessage, UserProfile, UserSummary,
};

#[derive(Default)]
struct ServerState {
    friends: Mutex<Vec<Friend>>,
    requests: Mutex<Vec<FriendRequest>>,
    conversations: Mutex<Vec<ConversationSummary>>,
    hub_queries: Mutex<HashMap<String, String>>,
    friend_push: Mutex<Option<UnboundedSender<String>>>,
    chat_push: Mutex<Option<UnboundedSender<String>>>,
    chat_invocations: Mutex<Vec<HubInvocation>>,
    request_list_hits: Mutex<usize>,
}

type Shared = Arc<ServerState>;

async fn list_friends(State(state): State<Shared>) -> Json<Vec<Friend>> {
    Json(state.friends.lock().unwrap().clone())
}

async fn list_requests(State(state): State<Shared>) -> Json<Vec<FriendRequest>> {
    *state.request_list_hits.lock().unwrap() += 1;
    Json(state.requests.lock().unwrap().clone())
}

async fn accept_request(
    State(state): State<Shared>,
    Path(id): Path<String>,
) -> Json<FriendRequest> {
    let mut requests = state.requests.lock().unwrap();
    let request = requests
        .iter_mut()
        .find(|r| r.id == id)
        .expect("request exists");
    request.status = FriendRequestStatus::Accepted;
    request.responded_at = Some(Utc::now());
    let accepted = request.clone();
    drop(requests);

    state.friends.lock().unwrap().push(Friend {
        user_id: accepted.requester_id.clone(),
        user: accepted.requester.clone(),
        friends_since: accepted.responded_at.unwrap(),
    });
    state.requests.lock().unwrap().retain(|r| r.id != id);
    Json(accepted)
}

async fn list_conversations(State(state): State<Shared>) -> Json<Vec<ConversationSummary>> {
    Json(state.conversations.lock().unwrap().clone())
}

async fn chat_history(State(_state): State<Shared>) -> Json<Vec<ChatMessage>> {
    Json(Vec::new())
}

async fn friend_hub(
    State(state): State<Shared>,
    RawQuery(query): RawQuery,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    state
        .hub_queries
        .lock()
        .unwrap()
        .insert("friends".to_string(), query.unwrap_or_default());
    ws.on_upgrade(move |socket| run_hub(socket, state, HubSide::Friends))
}

async fn chat_hub(
    State(state): State<Shared>,
    RawQuery(query): RawQuery,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    state
        .hub_queries
        .lock()
        .unwrap()
        .insert("chat".to_string(), query.unwrap_or_default());
    ws.on_upgrade(move |socket| run_hub(socket, state, HubSide::Chat))
}

#[derive(Clone, Copy)]
enum HubSide {
    Friends,
    Chat,
}

async fn run_hub(mut socket: WebSocket, state: Shared, side: HubSide) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    match side {
        HubSide::Friends => *state.friend_push.lock().unwrap() = Some(tx),
        HubSide::Chat => *state.chat_push.lock().unwrap() = Some(tx),
    }

    loop {
        tokio::select! {
            frame = rx.recv() => match frame {
                Some(frame) => {
                    if socket.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(invocation) = serde_json::from_str::<HubInvocation>(text.as_str()) {
                        if matches!(side, HubSide::Chat) {
                            state.chat_invocations.lock().unwrap().push(invocation);
                        }
                    }
                }
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }
}

async fn start_server(state: Shared) -> String {
    let app = Router::new()
        .route("/api/friends", get(list_friends))
        .route("/api/friends/requests", get(list_requests))
        .route("/api/friends/requests/{id}/accept", post(accept_request))
        .route("/api/chat/conversations", get(list_conversations))
        .route("/api/chat/history/{user_id}", get(chat_history))
        .route("/hubs/friends", get(friend_hub))
        .route("/hubs/chat", get(chat_hub))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn summary(id: &str, name: &str) -> UserSummary {
    UserSummary {
        id: id.to_string(),
        first_name: name.to_string(),
        last_name: "Tester".to_string(),
        avatar_url: None,
    }
}

fn session_for(user_id: &str) -> Session {
    let now = Utc::now();
    Session {
        access_token: format!("token-{user_id}"),
        refresh_token: "refresh".to_string(),
        expires_at: now + Duration::hours(1),
        refresh_token_expires_at: now + Duration::days(7),
        user: UserProfile {
            id: user_id.to_string(),
            email: format!("{user_id}@motorbay.test"),
            first_name: "Bob".to_string(),
            last_name: "Tester".to_string(),
            phone_number: None,
            avatar_url: None,
            roles: vec![],
            created_at: now,
        },
    }
}

fn pending_request_to(addressee: &str) -> FriendRequest {
    FriendRequest {
        id: "req-1".to_string(),
        requester_id: "u-alice".to_string(),
        addressee_id: addressee.to_string(),
        requester: summary("u-alice", "Alice"),
        addressee: summary(addressee, "Bob"),
        status: FriendRequestStatus::Pending,
        created_at: Utc::now(),
        responded_at: None,
    }
}

fn push_frame(sender: &UnboundedSender<String>, target: &str, data: impl serde::Serialize) {
    let frame = HubMessage {
        target: target.to_string(),
        data: serde_json::to_value(data).unwrap(),
    };
    sender.send(serde_json::to_string(&frame).unwrap()).unwrap();
}

async fn wait_until(timeout_ms: u64, mut predicate: impl FnMut() -> bool) -> bool {
    let mut waited = 0;
    while waited <= timeout_ms {
        if predicate() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        waited += 50;
    }
    false
}

#[tokio::test(flavor = "multi_thread")]
async fn realtime_friend_and_chat_flow() {
    let state: Shared = Arc::new(ServerState::default());
    let base_url = start_server(state.clone()).await;

    std::env::set_var("MOTORBAY_DATA_DIR", std::env::temp_dir().join("motorbay-itests"));
    std::env::set_var("MOTORBAY_API_URL", &base_url);

    // Bob signs in.
    let bus = EventBus::new();
    let session = SessionStore::with_prefix(bus.clone(), "itest_realtime");
    session.clear();
    session.store(&session_for("u-bob"));

    let friends = FriendsStore::new(session.clone());
    let conversations = ConversationsStore::new(session.clone());
    let hubs = HubManager::new(session.clone());
    hubs.attach_friends(&friends);
    hubs.attach_conversations(&conversations);

    hubs.start();
    assert!(
        wait_until(3_000, || {
            hubs.chat.state().is_connected() && hubs.friends.state().is_connected()
        })
        .await,
        "both hubs connect"
    );

    // The token travelled as a connection parameter, not a header.
    {
        let queries = state.hub_queries.lock().unwrap();
        assert!(queries["friends"].contains("access_token=token-u-bob"));
        assert!(queries["chat"].contains("access_token=token-u-bob"));
    }

    // Initial snapshot: nothing pending.
    assert!(friends.refresh().await);
    assert!(friends.pending_received().is_empty());

    // Alice sends Bob a friend request; the server pushes the event and
    // the client reconciles through the throttle window.
    let request = pending_request_to("u-bob");
    state.requests.lock().unwrap().push(request.clone());
    {
        let push = state.friend_push.lock().unwrap();
        push_frame(push.as_ref().unwrap(), "FriendRequestReceived", &request);
    }
    assert!(
        wait_until(3_000, || friends.pending_received().len() == 1).await,
        "request appears after throttled refetch"
    );
    assert_eq!(friends.pending_received()[0].addressee_id, "u-bob");

    // A burst of identical pushes coalesces: at most one extra snapshot
    // fetch lands inside one throttle window.
    let hits_before = *state.request_list_hits.lock().unwrap();
    {
        let push = state.friend_push.lock().unwrap();
        for _ in 0..5 {
            push_frame(push.as_ref().unwrap(), "FriendRequestReceived", &request);
        }
    }
    tokio::time::sleep(std::time::Duration::from_millis(1_200)).await;
    let hits_after = *state.request_list_hits.lock().unwrap();
    assert!(
        hits_after - hits_before <= 2,
        "five pushes produced {} refetches",
        hits_after - hits_before
    );

    // Bob accepts: the pending entry moves into friends exactly once.
    let accepted = friends.accept("req-1").await.expect("accept succeeds");
    assert_eq!(accepted.user_id, "u-alice");
    assert!(friends.pending_received().is_empty());
    assert_eq!(
        friends.friends().iter().filter(|f| f.user_id == "u-alice").count(),
        1
    );

    // Chat: open the (empty) thread, send through the hub.
    assert!(conversations.load_thread("u-alice").await);
    hubs.send_message("u-alice", "hi alice").expect("send while connected");
    assert!(
        wait_until(2_000, || !state.chat_invocations.lock().unwrap().is_empty()).await,
        "server received the invocation"
    );
    {
        let invocations = state.chat_invocations.lock().unwrap();
        assert_eq!(invocations[0].target, "SendMessage");
        assert_eq!(invocations[0].arguments[0], serde_json::json!("u-alice"));
        assert_eq!(invocations[0].arguments[1], serde_json::json!("hi alice"));
    }

    // Alice replies; the push patches the open thread and the
    // conversation list re-fetches in the background.
    let reply = ChatMessage {
        id: "m-1".to_string(),
        sender_id: "u-alice".to_string(),
        receiver_id: "u-bob".to_string(),
        content: "hi bob".to_string(),
        sent_at: Utc::now(),
        read_at: None,
    };
    *state.conversations.lock().unwrap() = vec![ConversationSummary {
        user: summary("u-alice", "Alice"),
        last_message: reply.clone(),
        unread_count: 1,
    }];
    {
        let push = state.chat_push.lock().unwrap();
        push_frame(push.as_ref().unwrap(), "ReceiveMessage", &reply);
    }
    assert!(
        wait_until(3_000, || conversations.thread("u-alice").iter().any(|m| m.id == "m-1")).await,
        "pushed message lands in the open thread"
    );
    assert!(
        wait_until(3_000, || conversations.unread_total() == 1).await,
        "conversation list reconciled"
    );

    // Read receipt flows through the bus into the thread.
    {
        let push = state.chat_push.lock().unwrap();
        push_frame(
            push.as_ref().unwrap(),
            "MessageRead",
            serde_json::json!({"messageId": "m-1", "readerId": "u-bob"}),
        );
    }
    assert!(
        wait_until(2_000, || {
            conversations
                .thread("u-alice")
                .iter()
                .any(|m| m.id == "m-1" && m.read_at.is_some())
        })
        .await,
        "read receipt applied"
    );

    // Offline sends fail fast instead of queueing.
    hubs.shutdown();
    assert!(hubs.send_message("u-alice", "lost?").is_err());
}
