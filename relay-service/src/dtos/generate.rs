use serde::Deserialize;

/// Body of `POST /generate`.
///
/// `prompt` is optional at the wire level: an object without it still reaches
/// the handler, which then fails the request like any provider error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}
