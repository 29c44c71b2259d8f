//! API route handlers.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use keepalive_channels::TelegramUpdate;

use super::server::AppState;

/// Plain acknowledgement.
pub async fn acknowledge() -> &'static str {
    "OK"
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "service": "keepalive",
        "version": keepalive_core::version(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Telegram webhook. Always answers `OK` so Telegram never redelivers.
/// Bodies that cannot be read or parsed are ignored, as are updates without text.
pub async fn telegram_webhook(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> &'static str {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("🌐 Ignoring unreadable webhook body: {e}");
            return "OK";
        }
    };
    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!("🌐 Ignoring malformed webhook body: {e}");
            return "OK";
        }
    };

    match update.to_incoming() {
        Some(message) => {
            tracing::debug!("🌐 Update {} from chat {}", update.update_id, message.chat_id);
            drop(state.keeper.spawn_message(message));
        }
        None => tracing::debug!("🌐 Update {} has no text message", update.update_id),
    }
    "OK"
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::server::build_router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use keepalive_agent::Keeper;
    use keepalive_core::traits::RecordingNotifier;
    use keepalive_core::types::ProbeOutcome;
    use keepalive_probe::EndpointProber;
    use keepalive_registry::MemoryRegistry;
    use tower::ServiceExt;

    struct UpProber;

    #[async_trait]
    impl EndpointProber for UpProber {
        async fn probe(&self, url: &str) -> ProbeOutcome {
            ProbeOutcome::ok(url, "200")
        }
    }

    fn app() -> (axum::Router, Arc<MemoryRegistry>, Arc<RecordingNotifier>) {
        let registry = Arc::new(MemoryRegistry::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let keeper = Keeper::new(
            "4242",
            registry.clone(),
            notifier.clone(),
            Arc::new(UpProber),
            4,
        );
        let router = build_router(AppState::new(Arc::new(keeper)), "/");
        (router, registry, notifier)
    }

    fn update(chat_id: i64, text: &str) -> Request<Body> {
        let body = serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 7,
                "chat": {"id": chat_id, "type": "private"},
                "date": 0,
                "text": text,
            }
        });
        Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn authorized_update_is_handled_after_ack() {
        let (router, registry, notifier) = app();

        let response = router.oneshot(update(4242, "https://a.test")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");

        tokio::time::timeout(Duration::from_secs(5), async {
            while notifier.messages().is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn unauthorized_update_is_acknowledged_and_dropped() {
        let (router, registry, notifier) = app();

        let response = router.oneshot(update(1, "https://a.test")).await.unwrap();
        assert_eq!(body_text(response).await, "OK");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(registry.is_empty());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_acknowledged() {
        let (router, _, notifier) = app();

        let request = Request::post("/").body(Body::from("not json")).unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn get_on_webhook_path_acknowledges() {
        let (router, _, _) = app();
        let request = Request::get("/").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn other_methods_and_paths_acknowledge() {
        let (router, registry, notifier) = app();

        for request in [
            Request::put("/").body(Body::from("{}")).unwrap(),
            Request::delete("/").body(Body::empty()).unwrap(),
            Request::patch("/").body(Body::empty()).unwrap(),
            Request::get("/nowhere").body(Body::empty()).unwrap(),
            Request::post("/health").body(Body::empty()).unwrap(),
        ] {
            let response = router.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_text(response).await, "OK");
        }

        assert!(registry.is_empty());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn oversized_body_is_acknowledged() {
        let (router, _, notifier) = app();

        let request = Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from(vec![b' '; 3 * 1024 * 1024]))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (router, _, _) = app();
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["version"], keepalive_core::version());
    }
}
