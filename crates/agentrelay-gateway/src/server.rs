use crate::router::{DispatchReport, EventRouter};
use crate::sink::ChannelSink;
use agentrelay_core::{AgentEvent, Message};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;

/// Shared application state.
pub struct AppState {
    /// Router every handler delegates to.
    pub router: Arc<EventRouter>,
}

/// The HTTP surface over an [`EventRouter`].
pub struct GatewayServer;

impl GatewayServer {
    /// Build the axum application.
    pub fn build(router: Arc<EventRouter>) -> Router {
        let state = Arc::new(AppState { router });

        Router::new()
            .route("/health", get(health_handler))
            .route("/connections", get(connections_handler))
            .route(
                "/threads/{thread_id}",
                get(session_handler).delete(delete_handler),
            )
            .route("/threads/{thread_id}/stream", get(stream_handler))
            .route("/threads/{thread_id}/events", post(events_handler))
            .route("/threads/{thread_id}/messages", put(messages_handler))
            .route("/threads/{thread_id}/pending", get(pending_handler))
            .with_state(state)
    }
}

/// Body of `POST /threads/{thread_id}/events`.
#[derive(Debug, Deserialize)]
pub struct EventsRequest {
    /// Events to route, in order.
    pub events: Vec<AgentEvent>,
}

/// Body of `PUT /threads/{thread_id}/messages`.
#[derive(Debug, Deserialize)]
pub struct MessagesRequest {
    /// Full replacement history.
    pub messages: Vec<Message>,
}

/// Session state as reported over HTTP.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Thread identifier.
    pub thread_id: String,
    /// Stored message history.
    pub messages: Vec<Message>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last touch of the session.
    pub last_activity: DateTime<Utc>,
    /// Whether a client stream is attached.
    pub connected: bool,
    /// Number of events waiting for a client.
    pub pending: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionsView {
    count: usize,
    thread_ids: Vec<String>,
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "agentrelay"}))
}

async fn stream_handler(
    Path(thread_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let (sink, rx) = ChannelSink::new();
    let flushed = state.router.attach(&thread_id, Arc::new(sink)).await;
    info!(thread_id = %thread_id, flushed, "Stream opened");

    let body = Body::from_stream(UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>));
    let content_type = state.router.connections().encoder().content_type();

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

async fn events_handler(
    Path(thread_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<EventsRequest>,
) -> Json<DispatchReport> {
    Json(state.router.dispatch_all(&thread_id, request.events).await)
}

async fn messages_handler(
    Path(thread_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<MessagesRequest>,
) -> StatusCode {
    state.router.update_messages(&thread_id, request.messages);
    StatusCode::NO_CONTENT
}

async fn session_handler(
    Path(thread_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionView>, StatusCode> {
    let session = state.router.session(&thread_id).ok_or(StatusCode::NOT_FOUND)?;
    let connected = state.router.connections().has_connection(&thread_id).await;
    let pending = state.router.pending().size(&thread_id);

    Ok(Json(SessionView {
        thread_id: session.thread_id,
        messages: session.messages,
        created_at: session.created_at,
        last_activity: session.last_activity,
        connected,
        pending,
    }))
}

async fn delete_handler(
    Path(thread_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> StatusCode {
    if state.router.forget(&thread_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn pending_handler(
    Path(thread_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<Vec<AgentEvent>> {
    Json(state.router.pending().peek(&thread_id))
}

async fn connections_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let hub = state.router.connections();
    let mut thread_ids = hub.thread_ids().await;
    thread_ids.sort();
    Json(ConnectionsView {
        count: thread_ids.len(),
        thread_ids,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::DeliveryConfig;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<EventRouter>) {
        let router = Arc::new(EventRouter::new(DeliveryConfig::default()));
        (GatewayServer::build(router.clone()), router)
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_service() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "agentrelay");
    }

    #[tokio::test]
    async fn posted_events_queue_without_client() {
        let (app, router) = app();
        let request = json_request(
            "POST",
            "/threads/t1/events",
            serde_json::json!({
                "events": [
                    {"type": "RUN_STARTED", "threadId": "t1", "runId": "r1"},
                    {"type": "TEXT_MESSAGE_CONTENT", "messageId": "m1", "delta": "hi"}
                ]
            }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["queued"], 2);
        assert_eq!(body["delivered"], 0);
        assert_eq!(router.pending().size("t1"), 2);
    }

    #[tokio::test]
    async fn malformed_event_is_rejected() {
        let (app, router) = app();
        let request = json_request(
            "POST",
            "/threads/t1/events",
            serde_json::json!({"events": [{"type": "NOT_A_KIND"}]}),
        );
        let response = app.oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
        assert!(router.session("t1").is_none());
    }

    #[tokio::test]
    async fn session_view_reflects_state() {
        let (app, router) = app();
        router.dispatch("t1", AgentEvent::text("m", "a")).await;
        router.update_messages("t1", vec![Message::user("hello")]);

        let response = app
            .oneshot(Request::get("/threads/t1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["threadId"], "t1");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["connected"], false);
        assert_eq!(body["pending"], 1);
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let (app, _) = app();
        let response = app
            .clone()
            .oneshot(Request::get("/threads/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(Request::delete("/threads/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn messages_update_only_known_threads() {
        let (app, router) = app();
        let body = serde_json::json!({"messages": [{"id": "1", "role": "user", "content": "x"}]});

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/threads/t1/messages", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(router.session("t1").is_none());

        router.sessions().get_or_create("t1");
        app.oneshot(json_request("PUT", "/threads/t1/messages", body))
            .await
            .unwrap();
        assert_eq!(router.session("t1").unwrap().message_count(), 1);
    }

    #[tokio::test]
    async fn delete_forgets_thread() {
        let (app, router) = app();
        router.dispatch("t1", AgentEvent::text("m", "a")).await;

        let response = app
            .oneshot(Request::delete("/threads/t1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(router.session("t1").is_none());
        assert_eq!(router.pending().size("t1"), 0);
    }

    #[tokio::test]
    async fn pending_lists_backlog_in_order() {
        let (app, router) = app();
        router.dispatch("t1", AgentEvent::text("m", "a")).await;
        router.dispatch("t1", AgentEvent::text("m", "b")).await;

        let response = app
            .oneshot(Request::get("/threads/t1/pending").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body[0]["delta"], "a");
        assert_eq!(body[1]["delta"], "b");
    }

    #[tokio::test]
    async fn stream_sets_sse_headers_and_attaches() {
        let (app, router) = app();
        let response = app
            .oneshot(Request::get("/threads/t1/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert!(router.connections().has_connection("t1").await);
    }

    #[tokio::test]
    async fn connections_lists_attached_threads() {
        let (app, router) = app();
        let (b, _rx_b) = ChannelSink::new();
        let (a, _rx_a) = ChannelSink::new();
        router.attach("b", Arc::new(b)).await;
        router.attach("a", Arc::new(a)).await;

        let response = app
            .oneshot(Request::get("/connections").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["threadIds"], serde_json::json!(["a", "b"]));
    }
}
