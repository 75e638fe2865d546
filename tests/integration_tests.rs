use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceExt;

use autoescola::config::AppConfig;
use autoescola::handlers;
use autoescola::models::{BookingRecord, BookingStep, ConversationState, LessonType};
use autoescola::services::availability::{
    AvailabilityBackend, AvailabilityError, InMemoryBackend,
};
use autoescola::services::dialogue;
use autoescola::services::messaging::MessagingProvider;
use autoescola::services::session::SessionStore;
use autoescola::state::AppState;

// ── Mock Providers ──

struct MockMessaging {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl MessagingProvider for MockMessaging {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

/// Backend whose remote store is permanently down.
struct FailingBackend;

#[async_trait]
impl AvailabilityBackend for FailingBackend {
    async fn check_availability(&self, _slot: &str) -> Result<bool, AvailabilityError> {
        Err(AvailabilityError::Backend("connection refused".to_string()))
    }

    async fn book_slot(&self, _record: &BookingRecord) -> Result<(), AvailabilityError> {
        Err(AvailabilityError::Backend("connection refused".to_string()))
    }

    async fn list_booked(&self) -> Result<Vec<String>, AvailabilityError> {
        Err(AvailabilityError::Backend("connection refused".to_string()))
    }

    async fn reset_bookings(&self) {}
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        ultramsg_instance_id: "instance-test".to_string(),
        ultramsg_token: "token-test".to_string(),
        sheets: None,
    }
}

fn test_state() -> (Arc<AppState>, Arc<Mutex<Vec<(String, String)>>>) {
    test_state_with_backend(Arc::new(InMemoryBackend::new()))
}

fn test_state_with_backend(
    availability: Arc<dyn AvailabilityBackend>,
) -> (Arc<AppState>, Arc<Mutex<Vec<(String, String)>>>) {
    let sent = Arc::new(Mutex::new(vec![]));
    let state = Arc::new(AppState {
        config: test_config(),
        sessions: SessionStore::new(),
        availability,
        messaging: Box::new(MockMessaging {
            sent: Arc::clone(&sent),
        }),
    });
    (state, sent)
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::health::health))
        .route(
            "/webhook/whatsapp",
            post(handlers::webhook::whatsapp_webhook),
        )
        .route("/api/bookings", get(handlers::admin::get_bookings))
        .with_state(state)
}

fn webhook_request(from: &str, body: &str) -> Request<Body> {
    let payload = serde_json::json!({ "data": { "from": from, "body": body } });
    Request::builder()
        .method("POST")
        .uri("/webhook/whatsapp")
        .header("Content-Type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn awaiting_date(lesson_type: LessonType, full_name: &str) -> ConversationState {
    ConversationState::Booking {
        lesson_type,
        step: BookingStep::AwaitingDate {
            full_name: full_name.to_string(),
        },
    }
}

// ── Health Check ──

#[tokio::test]
async fn test_health() {
    let (state, _) = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

// ── Webhook Tests ──

#[tokio::test]
async fn test_webhook_replies_with_menu() {
    let (state, sent) = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(webhook_request("+5561999990000", "oi"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(body.to_vec()).unwrap(), "success");

    let messages = sent.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, "+5561999990000");
    assert!(messages[0].1.contains("Marcar aula prática"));
    assert!(messages[0].1.contains("Finalizar atendimento"));
}

#[tokio::test]
async fn test_webhook_ignores_incomplete_payload() {
    let (state, sent) = test_state();

    for payload in [
        serde_json::json!({}),
        serde_json::json!({ "data": {} }),
        serde_json::json!({ "data": { "from": "+5561999990000" } }),
        serde_json::json!({ "data": { "from": "+5561999990000", "body": "" } }),
    ] {
        let app = test_app(state.clone());
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook/whatsapp")
                    .header("Content-Type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_full_booking_round_trip() {
    let (state, sent) = test_state();
    let user = "+5561999990000";

    for message in ["oi", "1", "Maria Silva", "2025-11-05T15:00"] {
        let app = test_app(state.clone());
        let res = app.oneshot(webhook_request(user, message)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let messages = sent.lock().unwrap();
    assert_eq!(messages.len(), 4);
    assert!(messages[3].1.contains("2025-11-05T15:00"));
    assert!(messages[3].1.contains("Maria"));
    assert_eq!(state.sessions.get(user), ConversationState::Menu);
}

// ── Dialogue Scenarios ──

#[tokio::test]
async fn test_greeting_shows_menu() {
    let (state, _) = test_state();
    let user = "+5561999990000";

    let reply = dialogue::process_message(&state, user, "Olá!").await.unwrap();
    assert!(reply.contains("1️⃣"));
    assert!(reply.contains("Falar com um atendente humano"));
    assert_eq!(state.sessions.get(user), ConversationState::Menu);
}

#[tokio::test]
async fn test_practical_booking_starts_with_name_prompt() {
    let (state, _) = test_state();
    let user = "+5561999990000";

    let reply = dialogue::process_message(&state, user, "1").await.unwrap();
    assert!(reply.contains("nome completo"));
    assert_eq!(
        state.sessions.get(user),
        ConversationState::Booking {
            lesson_type: LessonType::Practical,
            step: BookingStep::AwaitingName,
        }
    );
}

#[tokio::test]
async fn test_name_capture_greets_by_first_name() {
    let (state, _) = test_state();
    let user = "+5561999990000";

    dialogue::process_message(&state, user, "1").await.unwrap();
    let reply = dialogue::process_message(&state, user, "Maria Silva")
        .await
        .unwrap();

    assert!(reply.contains("Maria"));
    assert!(!reply.contains("Maria Silva"));
    assert_eq!(
        state.sessions.get(user),
        awaiting_date(LessonType::Practical, "Maria Silva")
    );
}

#[tokio::test]
async fn test_taken_slot_asks_for_another_and_keeps_step() {
    let (state, _) = test_state();
    let user = "+5561999990000";
    let slot = "2025-11-05T15:00";

    state
        .availability
        .book_slot(&BookingRecord {
            full_name: "João Souza".to_string(),
            lesson_type: LessonType::Practical,
            slot: slot.to_string(),
            user_id: "+5561977770000".to_string(),
        })
        .await
        .unwrap();

    state
        .sessions
        .set(user, awaiting_date(LessonType::Practical, "Maria Silva"));

    let reply = dialogue::process_message(&state, user, slot).await.unwrap();
    assert!(reply.contains("outra data"));
    assert_eq!(
        state.sessions.get(user),
        awaiting_date(LessonType::Practical, "Maria Silva")
    );

    // Retrying with a free slot completes the flow without restarting
    let reply = dialogue::process_message(&state, user, "2025-11-06T10:00")
        .await
        .unwrap();
    assert!(reply.contains("2025-11-06T10:00"));
    assert_eq!(state.sessions.get(user), ConversationState::Menu);
}

#[tokio::test]
async fn test_successful_booking_confirms_and_records() {
    let (state, _) = test_state();
    let user = "+5561999990000";

    state
        .sessions
        .set(user, awaiting_date(LessonType::Theory, "Maria Silva"));

    let reply = dialogue::process_message(&state, user, "2025-11-05T15:00")
        .await
        .unwrap();

    assert!(reply.contains("aula teórica"));
    assert!(reply.contains("2025-11-05T15:00"));
    assert_eq!(state.sessions.get(user), ConversationState::Menu);
    assert_eq!(
        state.availability.list_booked().await.unwrap(),
        vec!["2025-11-05T15:00".to_string()]
    );
}

#[tokio::test]
async fn test_menu_keyword_is_treated_as_name_inside_flow() {
    let (state, _) = test_state();
    let user = "+5561999990000";

    dialogue::process_message(&state, user, "2").await.unwrap();
    dialogue::process_message(&state, user, "menu").await.unwrap();

    assert_eq!(
        state.sessions.get(user),
        awaiting_date(LessonType::Theory, "menu")
    );
}

#[tokio::test]
async fn test_fallback_leaves_state_untouched() {
    let (state, _) = test_state();
    let user = "+5561999990000";

    let reply = dialogue::process_message(&state, user, "quanto custa?")
        .await
        .unwrap();
    assert!(reply.contains("não entendi"));
    assert_eq!(state.sessions.get(user), ConversationState::Menu);

    // Whitespace-only mid-flow is a fallback too, and keeps the step
    state
        .sessions
        .set(user, awaiting_date(LessonType::Practical, "Maria Silva"));
    let reply = dialogue::process_message(&state, user, "   ").await.unwrap();
    assert!(reply.contains("não entendi"));
    assert_eq!(
        state.sessions.get(user),
        awaiting_date(LessonType::Practical, "Maria Silva")
    );
}

#[tokio::test]
async fn test_terminal_intents_clear_state() {
    let (state, _) = test_state();

    let reply = dialogue::process_message(&state, "u1", "3").await.unwrap();
    assert!(reply.contains("simulado"));
    assert_eq!(state.sessions.get("u1"), ConversationState::Menu);

    let reply = dialogue::process_message(&state, "u2", "4").await.unwrap();
    assert!(reply.contains("atendente"));

    let reply = dialogue::process_message(&state, "u3", "cancelar")
        .await
        .unwrap();
    assert!(reply.contains("finalizado"));
}

#[tokio::test]
async fn test_backend_failure_apologizes_and_keeps_state() {
    let (state, _) = test_state_with_backend(Arc::new(FailingBackend));
    let user = "+5561999990000";

    state
        .sessions
        .set(user, awaiting_date(LessonType::Practical, "Maria Silva"));

    let reply = dialogue::process_message(&state, user, "2025-11-05T15:00")
        .await
        .unwrap();

    assert!(reply.contains("problema"));
    // Name and lesson type survive so the user can just retry
    assert_eq!(
        state.sessions.get(user),
        awaiting_date(LessonType::Practical, "Maria Silva")
    );
}

// ── Concurrency ──

#[tokio::test]
async fn test_concurrent_dialogue_bookings_single_winner() {
    let (state, _) = test_state();
    let slot = "2025-11-05T15:00";

    let users: Vec<String> = (0..8).map(|i| format!("+55619999900{i:02}")).collect();
    for user in &users {
        state
            .sessions
            .set(user, awaiting_date(LessonType::Practical, "Maria Silva"));
    }

    let handles: Vec<_> = users
        .iter()
        .map(|user| {
            let state = Arc::clone(&state);
            let user = user.clone();
            tokio::spawn(async move { dialogue::process_message(&state, &user, slot).await })
        })
        .collect();

    let mut confirmed = 0;
    let mut rejected = 0;
    for handle in handles {
        let reply = handle.await.unwrap().unwrap();
        if reply.contains("confirmada") {
            confirmed += 1;
        } else if reply.contains("outra data") {
            rejected += 1;
        } else {
            panic!("unexpected reply: {reply}");
        }
    }

    assert_eq!(confirmed, 1);
    assert_eq!(rejected, 7);
    assert_eq!(
        state.availability.list_booked().await.unwrap(),
        vec![slot.to_string()]
    );
}

// ── Bookings API ──

#[tokio::test]
async fn test_bookings_endpoint_lists_sorted_slots() {
    let (state, _) = test_state();

    for slot in ["2025-11-06T10:00", "2025-11-05T15:00"] {
        state
            .availability
            .book_slot(&BookingRecord {
                full_name: "Maria Silva".to_string(),
                lesson_type: LessonType::Practical,
                slot: slot.to_string(),
                user_id: "+5561999990000".to_string(),
            })
            .await
            .unwrap();
    }

    let app = test_app(state);
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let slots: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(slots, vec!["2025-11-05T15:00", "2025-11-06T10:00"]);
}

#[tokio::test]
async fn test_bookings_endpoint_surfaces_backend_failure() {
    let (state, _) = test_state_with_backend(Arc::new(FailingBackend));
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
}
