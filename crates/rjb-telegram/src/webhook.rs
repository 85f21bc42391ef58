//! Push delivery: an axum server that accepts one Telegram update per POST.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::Html,
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use rjb_core::{dispatch::Dispatcher, templates};

use crate::wire::WireUpdate;

#[derive(Clone)]
struct WebhookState {
    dispatcher: Arc<Dispatcher>,
}

/// Routes: `POST {path}` for updates, `OPTIONS {path}` for preflight, `GET /` status page.
pub fn router(dispatcher: Arc<Dispatcher>, path: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let hook = post(receive_update).options(preflight);
    let routes = if path == "/" {
        Router::new().route("/", hook.get(status_page))
    } else {
        Router::new()
            .route("/", get(status_page))
            .route(path, hook)
    };

    routes
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(WebhookState { dispatcher })
}

/// Bind `addr` and serve `app` until `shutdown` is cancelled.
pub async fn serve(
    addr: SocketAddr,
    app: Router,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "webhook server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            info!("webhook server shutting down");
        })
        .await?;

    Ok(())
}

async fn receive_update(
    State(state): State<WebhookState>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let update = match WireUpdate::from_slice(&body) {
        Ok(wire) => wire.into_update(),
        Err(e) => {
            warn!(error = %e, "rejecting malformed update");
            return (StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    match state.dispatcher.handle_push(&update).await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            warn!(update_id = update.id.0, error = %e, "push handler failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn status_page() -> Html<&'static str> {
    Html(templates::STATUS_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use rjb_core::{
        domain::{ChatId, MessageId, MessageRef},
        errors::Error,
        messaging::{
            port::MessagingPort,
            types::{ChatAction, MessagingCapabilities},
        },
        search::{JobQuery, JobSearch, ListingRecord},
        Result,
    };

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<(ChatId, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl MessagingPort for RecordingMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                supports_chat_actions: false,
                max_message_len: 4096,
            }
        }

        async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
            if self.fail {
                return Err(Error::Delivery("chat not found".to_string()));
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push((chat_id, html.to_string()));
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(sent.len() as i32),
            })
        }

        async fn send_chat_action(&self, _chat_id: ChatId, _action: ChatAction) -> Result<()> {
            Ok(())
        }
    }

    struct EmptySearch;

    #[async_trait]
    impl JobSearch for EmptySearch {
        async fn search(&self, _query: &JobQuery) -> Result<Vec<ListingRecord>> {
            Ok(Vec::new())
        }
    }

    fn app(messenger: Arc<RecordingMessenger>) -> Router {
        let dispatcher = Dispatcher::new(messenger, Arc::new(EmptySearch), 4000);
        router(Arc::new(dispatcher), "/api/webhook")
    }

    fn post_update(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/webhook")
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    const START: &str =
        r#"{"update_id": 10, "message": {"chat": {"id": 77}, "from": {"id": 1}, "text": "/start"}}"#;

    #[tokio::test]
    async fn valid_update_is_handled_and_acknowledged() {
        let messenger = Arc::new(RecordingMessenger::default());
        let response = app(messenger.clone()).oneshot(post_update(START)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");

        let sent = messenger.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChatId(77));
        assert_eq!(sent[0].1, templates::WELCOME);
    }

    #[tokio::test]
    async fn jobs_without_results_sends_one_message() {
        let messenger = Arc::new(RecordingMessenger::default());
        let response = app(messenger.clone())
            .oneshot(post_update(
                r#"{"update_id": 11, "message": {"chat": {"id": 5}, "text": "/jobs --tag rust"}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let sent = messenger.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, templates::NO_RESULTS);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let messenger = Arc::new(RecordingMessenger::default());
        let response = app(messenger.clone())
            .oneshot(post_update("{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(messenger.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_without_text_is_acknowledged_silently() {
        let messenger = Arc::new(RecordingMessenger::default());
        let response = app(messenger.clone())
            .oneshot(post_update(r#"{"update_id": 12}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(messenger.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn handler_failure_is_server_error() {
        let messenger = Arc::new(RecordingMessenger {
            fail: true,
            ..Default::default()
        });
        let response = app(messenger).oneshot(post_update(START)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn preflight_is_allowed_from_any_origin() {
        let messenger = Arc::new(RecordingMessenger::default());
        let response = app(messenger)
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/webhook")
                    .header("Origin", "https://example.org")
                    .header("Access-Control-Request-Method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn bare_options_returns_ok() {
        let messenger = Arc::new(RecordingMessenger::default());
        let response = app(messenger)
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/webhook")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn root_serves_status_page() {
        let messenger = Arc::new(RecordingMessenger::default());
        let response = app(messenger)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("<html"));
    }
}
