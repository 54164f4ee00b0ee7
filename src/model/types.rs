use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub temperature: f64,
    pub top_p: f64,
}

/// One decoded unit of a generation response body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationFragment {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Serialize)]
pub struct PullRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}
