//! Route handler functions for all API endpoints.
//!
//! Each handler extracts parameters via axum extractors, drives the chat
//! pipeline or storage services, and returns JSON responses.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use sahayak_core::types::Intent;
use sahayak_engine::generator::followup_prompt;
use sahayak_engine::history::truncate_chars;
use sahayak_engine::GenerativeClient;
use sahayak_storage::{AnalyticsService, ConversationRepository};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FollowupRequest {
    pub user_id: Option<i64>,
    pub channel: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponseBody {
    pub user_message: String,
    pub bot_reply: String,
    pub detected_language: String,
    pub intent: Intent,
    pub sentiment_score: f64,
    /// Wall-clock processing time, formatted as "1.23s".
    pub response_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_summary: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub user_id: i64,
    pub avg_sentiment: f64,
    pub avg_response_time: String,
    pub escalation_rate: String,
    pub total_conversations: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowupResponse {
    pub followup_text: String,
    pub channel: String,
    pub conversation_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub time: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexResponse {
    pub message: String,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET / - service banner.
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "Sahayak customer service".to_string(),
    })
}

/// GET /health - liveness check with the current UTC timestamp.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        message: "Service is running".to_string(),
    })
}

/// POST /chat - process one chat message through the pipeline.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponseBody>, ApiError> {
    let Some(message) = body.message else {
        error!("Invalid request: missing 'message' in JSON");
        return Err(ApiError::BadRequest("Message is required".to_string()));
    };

    let user_text = message.trim();
    if user_text.is_empty() {
        warn!("Empty message received");
        return Err(ApiError::BadRequest(
            "Empty message not allowed".to_string(),
        ));
    }

    let outcome = state
        .pipeline
        .handle_message(user_text, body.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, "Chat pipeline failed");
            ApiError::from(e)
        })?;

    Ok(Json(ChatResponseBody {
        user_message: outcome.user_message,
        bot_reply: outcome.bot_reply,
        detected_language: outcome.detected_language,
        intent: outcome.intent,
        sentiment_score: outcome.sentiment_score,
        response_time: format!("{:.2}s", outcome.response_time_secs),
        escalate: outcome.escalate.then_some(true),
        context_summary: outcome.context_summary,
    }))
}

/// GET /analytics/{user_id} - aggregated metrics, recomputed on each call.
pub async fn analytics(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let service = AnalyticsService::new(Arc::clone(&state.database));

    let stats = service
        .user_stats(user_id)
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("No data for user".to_string()))?;

    // Keep the persisted analytics row in step with the fresh numbers.
    service.refresh(user_id, &stats).map_err(ApiError::from)?;

    let escalation_rate = format!(
        "{:.1}%",
        stats.escalation_count as f64 / stats.total_conversations as f64 * 100.0
    );

    Ok(Json(AnalyticsResponse {
        user_id,
        avg_sentiment: (stats.avg_sentiment * 100.0).round() / 100.0,
        avg_response_time: "N/A".to_string(),
        escalation_rate,
        total_conversations: stats.total_conversations,
    }))
}

/// POST /followup - generate (and mock-send) a post-chat satisfaction survey.
pub async fn followup(
    State(state): State<AppState>,
    Json(body): Json<FollowupRequest>,
) -> Result<Json<FollowupResponse>, ApiError> {
    let Some(user_id) = body.user_id else {
        return Err(ApiError::BadRequest("user_id required".to_string()));
    };
    let channel = body.channel.unwrap_or_else(|| "email".to_string());

    let conversations = ConversationRepository::new(Arc::clone(&state.database));
    let last = conversations
        .latest_for_user(user_id)
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("No conversation found".to_string()))?;

    // Survey language follows the first stored message of that turn.
    let language = conversations
        .messages_for(last.id)
        .map_err(ApiError::from)?
        .first()
        .map(|m| m.language.clone())
        .unwrap_or_else(|| "English".to_string());

    let format = if channel == "email" { "email" } else { "sms" };
    let prompt = followup_prompt(&language, &last.message, last.intent, format);

    let followup_text = state.client.generate(&prompt).await.map_err(|e| {
        error!(error = %e, "Follow-up generation failed");
        ApiError::Internal("Failed to generate follow-up".to_string())
    })?;

    // Delivery is mocked: log the send, never perform it.
    if channel == "email" {
        info!(
            "Mock email sent: {}...",
            truncate_chars(&followup_text, 100)
        );
    } else {
        info!("Mock SMS sent: {}...", truncate_chars(&followup_text, 100));
    }

    Ok(Json(FollowupResponse {
        followup_text,
        channel,
        conversation_id: last.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sahayak_core::config::ChatConfig;
    use sahayak_engine::{KnowledgeBase, StaticClient};
    use sahayak_storage::{Database, UserRepository};
    use tower::ServiceExt;

    fn structured(reply: &str, intent: &str, sentiment: f64) -> String {
        format!(
            r#"{{"language": "English", "reply": "{}", "intent": "{}", "sentiment_score": {}}}"#,
            reply, intent, sentiment
        )
    }

    fn make_state(client: StaticClient) -> AppState {
        let db = Arc::new(Database::in_memory().unwrap());
        AppState::new(
            db,
            Arc::new(client),
            KnowledgeBase::default(),
            ChatConfig::default(),
        )
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ---- Health and index ----

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = crate::create_router(make_state(StaticClient::new("x")));
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let health: serde_json::Value = body_json(resp).await;
        assert_eq!(health["status"], "ok");
        assert_eq!(health["message"], "Service is running");
        assert!(health["time"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_index_endpoint() {
        let app = crate::create_router(make_state(StaticClient::new("x")));
        let resp = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // ---- Chat validation ----

    #[tokio::test]
    async fn test_chat_missing_message() {
        let app = crate::create_router(make_state(StaticClient::new("x")));
        let resp = app
            .oneshot(post_json("/chat", r#"{"user_id": 1}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Message is required");
    }

    #[tokio::test]
    async fn test_chat_empty_message() {
        let app = crate::create_router(make_state(StaticClient::new("x")));
        let resp = app
            .oneshot(post_json("/chat", r#"{"message": "   "}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Empty message not allowed");
    }

    // ---- Chat turns ----

    #[tokio::test]
    async fn test_chat_happy_path() {
        let client = StaticClient::new(&structured("Our hours are 9 to 5.", "query", 0.9));
        let state = make_state(client);
        let user_id = UserRepository::new(Arc::clone(&state.database))
            .create("asha@example.com", "Asha", "general")
            .unwrap()
            .id;

        let app = crate::create_router(state);
        let resp = app
            .oneshot(post_json(
                "/chat",
                &format!(r#"{{"message": "what are your hours?", "user_id": {}}}"#, user_id),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["user_message"], "what are your hours?");
        assert_eq!(body["bot_reply"], "Our hours are 9 to 5.");
        assert_eq!(body["detected_language"], "English");
        assert_eq!(body["intent"], "query");
        assert_eq!(body["sentiment_score"], 0.9);
        assert!(body["response_time"].as_str().unwrap().ends_with('s'));
        // Non-escalated turns omit the escalation fields entirely.
        assert!(body.get("escalate").is_none());
        assert!(body.get("context_summary").is_none());
    }

    #[tokio::test]
    async fn test_chat_escalation_fields_present() {
        let client = StaticClient::new(&structured("Connecting you.", "escalate", 0.9));
        let state = make_state(client);
        let user_id = UserRepository::new(Arc::clone(&state.database))
            .create("asha@example.com", "Asha", "general")
            .unwrap()
            .id;

        let app = crate::create_router(state);
        let resp = app
            .oneshot(post_json(
                "/chat",
                &format!(r#"{{"message": "I want a human", "user_id": {}}}"#, user_id),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["escalate"], true);
        assert!(body["context_summary"]
            .as_str()
            .unwrap()
            .contains("Current: I want a human"));
        assert!(body["bot_reply"].as_str().unwrap().contains("Hold tight"));
    }

    #[tokio::test]
    async fn test_chat_generation_failure_is_500_and_persists_nothing() {
        let state = make_state(StaticClient::failing("model unreachable"));
        let user_id = UserRepository::new(Arc::clone(&state.database))
            .create("u@example.com", "U", "general")
            .unwrap()
            .id;
        let db = Arc::clone(&state.database);

        let app = crate::create_router(state);
        let resp = app
            .oneshot(post_json(
                "/chat",
                &format!(r#"{{"message": "hello", "user_id": {}}}"#, user_id),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let convs = ConversationRepository::new(db);
        assert_eq!(convs.count_for_user(user_id).unwrap(), 0);
    }

    // ---- Analytics ----

    #[tokio::test]
    async fn test_analytics_unknown_user_404() {
        let app = crate::create_router(make_state(StaticClient::new("x")));
        let resp = app
            .oneshot(Request::get("/analytics/42").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "No data for user");
    }

    #[tokio::test]
    async fn test_analytics_aggregation() {
        let state = make_state(StaticClient::new("x"));
        let user_id = UserRepository::new(Arc::clone(&state.database))
            .create("u@example.com", "U", "general")
            .unwrap()
            .id;
        let convs = ConversationRepository::new(Arc::clone(&state.database));
        convs.create(user_id, "good", Intent::Query, 0.8).unwrap();
        convs
            .create(user_id, "bad", Intent::Escalate, 0.2)
            .unwrap();

        let app = crate::create_router(state);
        let resp = app
            .oneshot(
                Request::get(format!("/analytics/{}", user_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body: AnalyticsResponse = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(body.user_id, user_id);
        assert_eq!(body.avg_sentiment, 0.5);
        assert_eq!(body.escalation_rate, "50.0%");
        assert_eq!(body.total_conversations, 2);
        assert_eq!(body.avg_response_time, "N/A");
    }

    #[tokio::test]
    async fn test_analytics_idempotent() {
        let state = make_state(StaticClient::new("x"));
        let user_id = UserRepository::new(Arc::clone(&state.database))
            .create("u@example.com", "U", "general")
            .unwrap()
            .id;
        ConversationRepository::new(Arc::clone(&state.database))
            .create(user_id, "hello", Intent::Query, 0.6)
            .unwrap();

        let app = crate::create_router(state);
        let first = app
            .clone()
            .oneshot(
                Request::get(format!("/analytics/{}", user_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let second = app
            .oneshot(
                Request::get(format!("/analytics/{}", user_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let first_body = body_json(first).await;
        let second_body = body_json(second).await;
        assert_eq!(first_body, second_body);
        assert_eq!(second_body["total_conversations"], 1);
    }

    // ---- Follow-up ----

    #[tokio::test]
    async fn test_followup_missing_user_id() {
        let app = crate::create_router(make_state(StaticClient::new("x")));
        let resp = app
            .oneshot(post_json("/followup", r#"{"channel": "email"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "user_id required");
    }

    #[tokio::test]
    async fn test_followup_no_conversation_404() {
        let state = make_state(StaticClient::new("x"));
        let user_id = UserRepository::new(Arc::clone(&state.database))
            .create("u@example.com", "U", "general")
            .unwrap()
            .id;

        let app = crate::create_router(state);
        let resp = app
            .oneshot(post_json(
                "/followup",
                &format!(r#"{{"user_id": {}}}"#, user_id),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "No conversation found");
    }

    #[tokio::test]
    async fn test_followup_defaults_to_email() {
        let state = make_state(StaticClient::new("How satisfied were you? 1-5"));
        let user_id = UserRepository::new(Arc::clone(&state.database))
            .create("u@example.com", "U", "general")
            .unwrap()
            .id;
        let convs = ConversationRepository::new(Arc::clone(&state.database));
        let conv_id = convs
            .create(user_id, "my balance?", Intent::Query, 0.7)
            .unwrap();
        convs
            .insert_turn_messages(conv_id, "my balance?", "Here it is.", "English")
            .unwrap();

        let app = crate::create_router(state);
        let resp = app
            .oneshot(post_json(
                "/followup",
                &format!(r#"{{"user_id": {}}}"#, user_id),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body: FollowupResponse = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(body.channel, "email");
        assert_eq!(body.conversation_id, conv_id);
        assert!(body.followup_text.contains("satisfied"));
    }

    #[tokio::test]
    async fn test_followup_sms_channel_echoed() {
        let state = make_state(StaticClient::new("Rate us 1-5 by reply"));
        let user_id = UserRepository::new(Arc::clone(&state.database))
            .create("u@example.com", "U", "general")
            .unwrap()
            .id;
        ConversationRepository::new(Arc::clone(&state.database))
            .create(user_id, "my bill", Intent::Complaint, 0.4)
            .unwrap();

        let app = crate::create_router(state);
        let resp = app
            .oneshot(post_json(
                "/followup",
                &format!(r#"{{"user_id": {}, "channel": "sms"}}"#, user_id),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body: FollowupResponse = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(body.channel, "sms");
    }

    #[tokio::test]
    async fn test_followup_generation_failure_500() {
        let state = make_state(StaticClient::failing("quota exceeded"));
        let user_id = UserRepository::new(Arc::clone(&state.database))
            .create("u@example.com", "U", "general")
            .unwrap()
            .id;
        ConversationRepository::new(Arc::clone(&state.database))
            .create(user_id, "hello", Intent::Query, 0.6)
            .unwrap();

        let app = crate::create_router(state);
        let resp = app
            .oneshot(post_json(
                "/followup",
                &format!(r#"{{"user_id": {}}}"#, user_id),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Failed to generate follow-up");
    }

    // ---- End-to-end: chat then analytics ----

    #[tokio::test]
    async fn test_chat_then_analytics_reflects_turn() {
        let client = StaticClient::new(&structured("Sure.", "query", 0.8));
        let state = make_state(client);
        let user_id = UserRepository::new(Arc::clone(&state.database))
            .create("u@example.com", "U", "general")
            .unwrap()
            .id;

        let app = crate::create_router(state);
        let chat_resp = app
            .clone()
            .oneshot(post_json(
                "/chat",
                &format!(r#"{{"message": "tell me things", "user_id": {}}}"#, user_id),
            ))
            .await
            .unwrap();
        assert_eq!(chat_resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(
                Request::get(format!("/analytics/{}", user_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["total_conversations"], 1);
        assert_eq!(body["avg_sentiment"], 0.8);
    }
}
