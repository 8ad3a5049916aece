//! Serve command handler.
//!
//! Exposes the query service over HTTP, plus a callback receiver for
//! debugging webhook delivery locally.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use catalog_core::{config::AppConfig, AppError, AppResult};
use catalog_knowledge::rag::QaService;
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use super::runtime::build_service;

/// Serve the HTTP query endpoint
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on (default from config: 127.0.0.1:8000)
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl ServeCommand {
    /// Execute the serve command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        // Refuse to listen without a usable index
        let service = build_service(config).await?;

        let bind = self.bind.as_deref().unwrap_or(&config.server.bind);
        let listener = tokio::net::TcpListener::bind(bind).await.map_err(|e| {
            AppError::Config(format!("Failed to bind {}: {}", bind, e))
        })?;

        tracing::info!(
            address = %bind,
            index = %config.retrieval.index_name,
            "Catalog server listening"
        );

        axum::serve(listener, router(service))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Catalog server stopped");
        Ok(())
    }
}

/// Inbound query body. `user_id` is accepted as an alias of `session_id`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default, alias = "user_id")]
    pub session_id: String,

    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub status: String,
    pub answer: String,
}

impl QueryResponse {
    fn new(status: &str, answer: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            answer: answer.into(),
        }
    }
}

pub fn router(service: QaService) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/callback", post(callback))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn query(
    State(service): State<QaService>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> (StatusCode, Json<QueryResponse>) {
    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(QueryResponse::new("rejected", rejection.body_text())),
            )
        }
    };

    match service
        .handle_query(&request.session_id, &request.query)
        .await
    {
        Ok(answer) => (
            StatusCode::OK,
            Json(QueryResponse::new("processed", answer.answer)),
        ),
        Err(e @ (AppError::EmptyQuery | AppError::InvalidInput(_))) => (
            StatusCode::BAD_REQUEST,
            Json(QueryResponse::new("rejected", e.to_string())),
        ),
        Err(e) => {
            tracing::error!(session_id = %request.session_id, "Query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(QueryResponse::new("error", e.to_string())),
            )
        }
    }
}

async fn callback(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
    tracing::info!(payload = %body, "Received callback");
    Json(serde_json::json!({ "status": "received" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use catalog_core::EMPTY_QUERY_WARNING;
    use catalog_knowledge::rag::{ConversationGraph, RetrievalTool, SessionStore};
    use catalog_knowledge::{Passage, PassageMetadata, PassageSearch};
    use catalog_llm::{ChatMessage, ChatRequest, ChatResponse, LlmClient, LlmUsage};
    use catalog_prompt::GeneratePrompt;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct EchoLlm;

    #[async_trait::async_trait]
    impl LlmClient for EchoLlm {
        fn provider_name(&self) -> &str {
            "echo"
        }

        async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();

            if last.contains("explode") {
                return Err(AppError::Llm("connection refused".to_string()));
            }

            Ok(ChatResponse {
                message: ChatMessage::assistant(format!("You asked: {}", last)),
                model: request.model.clone(),
                usage: LlmUsage::default(),
                done: true,
            })
        }
    }

    struct StubSearch;

    #[async_trait::async_trait]
    impl PassageSearch for StubSearch {
        async fn search(&self, _query: &str, _k: usize) -> AppResult<Vec<(Passage, f32)>> {
            Ok(vec![(
                Passage::new("unused", PassageMetadata::default()),
                0.5,
            )])
        }
    }

    fn app() -> Router {
        let graph = ConversationGraph::new(
            Arc::new(EchoLlm),
            "llama3.2",
            RetrievalTool::new(Arc::new(StubSearch), 3),
            GeneratePrompt::builtin().unwrap(),
            SessionStore::new(10, Duration::from_secs(60)),
        );
        router(QaService::new(Arc::new(graph)))
    }

    async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_query_processed() {
        let (status, body) = post_json(
            app(),
            "/query",
            serde_json::json!({"session_id": "u1", "query": "Hi there"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "processed");
        assert_eq!(body["answer"], "You asked: Hi there");
    }

    #[tokio::test]
    async fn test_user_id_alias() {
        let (status, body) = post_json(
            app(),
            "/query",
            serde_json::json!({"user_id": "u1", "query": "Hi"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "processed");
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let (status, body) = post_json(
            app(),
            "/query",
            serde_json::json!({"session_id": "u1", "query": "   "}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "rejected");
        assert_eq!(body["answer"], EMPTY_QUERY_WARNING);
    }

    #[tokio::test]
    async fn test_missing_session_rejected() {
        let (status, body) =
            post_json(app(), "/query", serde_json::json!({"query": "Hi"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "rejected");
    }

    #[tokio::test]
    async fn test_model_failure_is_server_error() {
        let (status, body) = post_json(
            app(),
            "/query",
            serde_json::json!({"session_id": "u1", "query": "explode"}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert!(body["answer"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_callback_receiver() {
        let (status, body) = post_json(
            app(),
            "/callback",
            serde_json::json!({"session_id": "u1", "answer": "Hello"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"status": "received"}));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"status":"ok"}"#);
    }
}
