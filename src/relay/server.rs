use super::provider::CompletionProvider;
use super::{ChatReply, ChatRequest, EMPTY_PROMPT_ERROR, UPSTREAM_ERROR};
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared server state.
pub struct RelayState {
    pub provider: Arc<dyn CompletionProvider>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    provider: String,
    model: String,
}

async fn handle_chat(
    State(state): State<Arc<RelayState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> (StatusCode, Json<ChatReply>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected chat body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ChatReply::error(rejection.body_text())),
            );
        }
    };

    let prompt = request.prompt.unwrap_or_default();
    if prompt.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ChatReply::error(EMPTY_PROMPT_ERROR)),
        );
    }

    match state.provider.complete(&prompt).await {
        Ok(answer) => {
            tracing::info!(
                prompt_chars = prompt.chars().count(),
                answer_chars = answer.chars().count(),
                "chat relayed"
            );
            (StatusCode::OK, Json(ChatReply::answer(answer)))
        }
        Err(e) => {
            tracing::error!(error = %e, provider = state.provider.name(), "upstream call failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatReply::error(UPSTREAM_ERROR)),
            )
        }
    }
}

async fn handle_health(State(state): State<Arc<RelayState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        provider: state.provider.name().to_string(),
        model: state.provider.model().to_string(),
    })
}

/// Build the axum router.
pub fn build_router(provider: Arc<dyn CompletionProvider>) -> Router {
    let state = Arc::new(RelayState { provider });

    Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the relay until the process is stopped.
pub async fn run_server(provider: Arc<dyn CompletionProvider>, host: &str, port: u16) -> Result<()> {
    let app = build_router(provider);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind relay to {addr}"))?;
    tracing::info!("relay listening on http://{addr}");
    axum::serve(listener, app).await.context("Relay server stopped")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{RelayError, EMPTY_COMPLETION_ANSWER};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        reply: Result<String, String>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(reason.to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn model(&self) -> &str {
            "fake-1"
        }

        async fn complete(&self, prompt: &str) -> Result<String, RelayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(format!("{text} ({prompt})")),
                Err(reason) => Err(RelayError::Upstream(reason.clone())),
            }
        }
    }

    fn state_for(provider: Arc<FakeProvider>) -> State<Arc<RelayState>> {
        State(Arc::new(RelayState { provider }))
    }

    async fn chat(
        provider: &Arc<FakeProvider>,
        prompt: Option<&str>,
    ) -> (StatusCode, ChatReply) {
        let request = ChatRequest {
            prompt: prompt.map(str::to_string),
        };
        let (status, Json(reply)) = handle_chat(state_for(provider.clone()), Ok(Json(request))).await;
        (status, reply)
    }

    #[tokio::test]
    async fn blank_prompt_is_a_bad_request() {
        let provider = FakeProvider::answering("never");
        for prompt in [None, Some(""), Some("  \n\t ")] {
            let (status, reply) = chat(&provider, prompt).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(reply, ChatReply::error(EMPTY_PROMPT_ERROR));
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn answer_is_relayed() {
        let provider = FakeProvider::answering("Hola");
        let (status, reply) = chat(&provider, Some("¿qué tal?")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply.answer.as_deref(), Some("Hola (¿qué tal?)"));
        assert!(reply.error.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn upstream_failure_is_a_server_error_without_details() {
        let provider = FakeProvider::failing("secret upstream detail");
        let (status, reply) = chat(&provider, Some("hola")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply, ChatReply::error(UPSTREAM_ERROR));
    }

    #[tokio::test]
    async fn empty_completion_fallback_passes_through() {
        let provider = Arc::new(FakeProvider {
            reply: Ok(EMPTY_COMPLETION_ANSWER.to_string()),
            calls: AtomicUsize::new(0),
        });
        let (status, reply) = chat(&provider, Some("x")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(reply.answer.unwrap().starts_with(EMPTY_COMPLETION_ANSWER));
    }

    #[tokio::test]
    async fn health_reports_provider() {
        let provider = FakeProvider::answering("x");
        let Json(health) = handle_health(state_for(provider)).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.provider, "fake");
        assert_eq!(health.model, "fake-1");
    }

    #[test]
    fn router_builds() {
        let _router = build_router(FakeProvider::answering("x"));
    }
}
