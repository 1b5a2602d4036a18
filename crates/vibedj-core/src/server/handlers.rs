//! HTTP handlers: the status greeting and the image description route.

use super::state::AppState;
use axum::extract::{Query, Request, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use serde::Deserialize;

/// Body of the status route.
pub const GREETING: &str = "The AI Vibe DJ is listening...";

/// Longest caller-supplied prompt accepted, in characters.
pub const MAX_PROMPT_CHARS: usize = 1000;

/// Liveness route. Answers every method and every unrouted path.
pub async fn status() -> &'static str {
    GREETING
}

#[derive(Deserialize)]
struct PromptQuery {
    prompt: Option<String>,
}

/// Pick the caller's `?prompt=` if present and sane, else the default.
fn resolve_prompt(uri: &Uri, default: &str) -> Result<String, &'static str> {
    let Query(query) =
        Query::<PromptQuery>::try_from_uri(uri).map_err(|_| "invalid query string")?;
    match query.prompt {
        None => Ok(default.to_string()),
        Some(p) if p.trim().is_empty() => Err("prompt must not be empty"),
        Some(p) if p.chars().count() > MAX_PROMPT_CHARS => Err("prompt is too long"),
        Some(p) => Ok(p),
    }
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Describe the uploaded image.
///
/// Method and prompt are checked before the body is read, and the body is
/// read under a hard cap, so rejected requests never reach the backend.
pub async fn find_the_vibe(State(state): State<AppState>, request: Request) -> Response {
    if request.method() != Method::POST {
        return (StatusCode::METHOD_NOT_ALLOWED, "only POST method is allowed").into_response();
    }

    let prompt = match resolve_prompt(request.uri(), &state.default_prompt) {
        Ok(prompt) => prompt,
        Err(message) => {
            tracing::warn!(stage = "request_read", "Rejected prompt: {message}");
            return (StatusCode::BAD_REQUEST, message).into_response();
        }
    };

    let image = match axum::body::to_bytes(request.into_body(), state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) if is_length_limit(&e) => {
            tracing::warn!(
                stage = "request_read",
                limit_bytes = state.max_body_bytes,
                "Request body exceeds limit"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body is too large").into_response();
        }
        Err(e) => {
            tracing::error!(stage = "request_read", "error reading request body: {e}");
            return (StatusCode::BAD_REQUEST, "could not read request body").into_response();
        }
    };

    tracing::debug!(
        provider = state.client.name(),
        bytes = image.len(),
        "Describing image"
    );

    match state.client.describe_image(&image, &prompt).await {
        Ok(description) => (StatusCode::OK, format!("The vibe is: {description}")).into_response(),
        Err(e) => {
            tracing::error!(
                stage = "backend",
                provider = state.client.name(),
                kind = e.kind(),
                status_code = ?e.status_code(),
                "Backend call failed: {e}"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to describe image: {e}"),
            )
                .into_response()
        }
    }
}
