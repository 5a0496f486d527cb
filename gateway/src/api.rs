use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;

use bridge_core::{Invocation, ToolOutput};

// Input: the raw query string, keyed by parameter name.
// Which key matters depends on the bridge.
pub type QueryParams = HashMap<String, String>;

// Output: tool stdout, labelled JSON but never parsed
pub fn json_passthrough(stdout: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        stdout,
    )
        .into_response()
}

pub fn html_page(content: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=UTF-8")],
        content,
    )
        .into_response()
}

pub fn page_not_found() -> Response {
    (StatusCode::NOT_FOUND, "File not found").into_response()
}

// Only produced under FailurePolicy::Report
pub fn tool_failed(invocation: &Invocation, output: &ToolOutput) -> Response {
    let body = format!(
        "Tool '{}' exited with {}\n{}",
        invocation.program.display(),
        output.status,
        String::from_utf8_lossy(&output.stderr),
    );
    (StatusCode::BAD_GATEWAY, body).into_response()
}

pub fn tool_unavailable(error: &anyhow::Error) -> Response {
    (StatusCode::BAD_GATEWAY, format!("{:#}", error)).into_response()
}
