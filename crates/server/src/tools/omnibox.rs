//! omnibox_input, omnibox_enter and omnibox_cancel tool implementations.
//!
//! The MCP client plays the omnibox: it reports each edit, the committed
//! text, and dismissal.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use omnisuggest_client::{SearchSession, Transport};
use omnisuggest_core::KvStore;
use omnisuggest_core::rank::{BestMatch, Suggestion};

use super::json_result;
use crate::error::ToolError;

/// Longest accepted omnibox text, in characters.
pub const MAX_INPUT_CHARS: usize = 400;

/// Parameters for the omnibox_input tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OmniboxInputParams {
    /// Omnibox text as typed, e.g. `naruto`, `bleach/a` or `onizuka!`.
    pub text: String,

    /// Also fetch the best match's image as a `data:` URI.
    #[serde(default)]
    pub include_image: bool,
}

/// Output from the omnibox_input tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OmniboxInputOutput {
    /// Summary row shown above the suggestions.
    pub default_description: String,
    pub suggestions: Vec<Suggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best: Option<BestNotification>,
}

/// Best match as a notification payload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BestNotification {
    #[serde(flatten)]
    pub matched: BestMatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

/// Parameters for the omnibox_enter tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OmniboxEnterParams {
    /// Omnibox text at the moment it was committed.
    pub text: String,
}

/// Output from the omnibox_enter tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OmniboxEnterOutput {
    /// Destination to open.
    pub url: String,
}

/// Output from the omnibox_cancel tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OmniboxCancelOutput {
    pub cancelled: bool,
}

fn check_length(text: &str) -> Result<(), ToolError> {
    let chars = text.chars().count();
    if chars > MAX_INPUT_CHARS {
        return Err(ToolError::InvalidInput(format!("text too long: {chars} chars (max {MAX_INPUT_CHARS})")));
    }
    Ok(())
}

/// Implementation of the omnibox_input tool.
pub async fn input_impl<T: Transport, S: KvStore>(
    session: &SearchSession<T, S>, params: OmniboxInputParams,
) -> Result<CallToolResult, McpError> {
    check_length(&params.text)?;

    let outcome = session.on_input_changed(&params.text).await;

    let best = match outcome.best {
        Some(matched) => {
            let image_data = if params.include_image && !matched.image.is_empty() {
                session.image_data(&matched.image).await
            } else {
                None
            };
            Some(BestNotification { matched, image_data })
        }
        None => None,
    };

    let output =
        OmniboxInputOutput { default_description: outcome.default_description, suggestions: outcome.suggestions, best };
    Ok(json_result(&output)?)
}

/// Implementation of the omnibox_enter tool.
pub async fn enter_impl<T: Transport, S: KvStore>(
    session: &SearchSession<T, S>, params: OmniboxEnterParams,
) -> Result<CallToolResult, McpError> {
    check_length(&params.text)?;
    session.cancel().await;

    let url = session.commit_url(&params.text);
    tracing::info!(url = %url, "omnibox committed");

    Ok(json_result(&OmniboxEnterOutput { url })?)
}

/// Implementation of the omnibox_cancel tool.
pub async fn cancel_impl<T: Transport, S: KvStore>(session: &SearchSession<T, S>) -> Result<CallToolResult, McpError> {
    session.cancel().await;
    Ok(json_result(&OmniboxCancelOutput { cancelled: true })?)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::tools::test_support::{output, session};

    fn input(text: &str, include_image: bool) -> OmniboxInputParams {
        OmniboxInputParams { text: text.to_string(), include_image }
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_returns_suggestions() {
        let (transport, kv, session) = session();

        let result = input_impl(&session, input("naruto", false)).await.unwrap();
        let out: OmniboxInputOutput = output(&result);

        assert_eq!(transport.requests.load(Ordering::SeqCst), 1);
        assert_eq!(out.suggestions.len(), 1);
        assert_eq!(out.suggestions[0].content, "https://myanimelist.net/anime/20/Naruto");
        assert!(out.default_description.contains("Found in categories: anime (1)"));

        let best = out.best.unwrap();
        assert_eq!(best.matched.title, "Naruto (TV)");
        assert_eq!(best.matched.text, "Oct 3, 2002 to Feb 8, 2007");
        assert_eq!(best.matched.image, "https://cdn.myanimelist.net/images/anime/13/17405.jpg");
        assert!(best.image_data.is_none());
        assert!(kv.contains("input:naruto").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_with_image() {
        let (_, _, session) = session();

        let result = input_impl(&session, input("naruto", true)).await.unwrap();
        let out: OmniboxInputOutput = output(&result);

        assert_eq!(out.best.unwrap().image_data.as_deref(), Some("data:image/jpeg;base64,anBn"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_input_served_from_cache() {
        let (transport, _, session) = session();

        input_impl(&session, input("naruto", false)).await.unwrap();
        let result = input_impl(&session, input("Naruto", false)).await.unwrap();
        let out: OmniboxInputOutput = output(&result);

        assert_eq!(transport.requests.load(Ordering::SeqCst), 1);
        assert_eq!(out.suggestions.len(), 1);
    }

    #[tokio::test]
    async fn test_input_too_long() {
        let (_, _, session) = session();
        let result = input_impl(&session, input(&"a".repeat(MAX_INPUT_CHARS + 1), false)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_enter_resolves_destination() {
        let (_, _, session) = session();

        let result = enter_impl(&session, OmniboxEnterParams { text: "one piece/m".into() }).await.unwrap();
        let out: OmniboxEnterOutput = output(&result);
        assert_eq!(out.url, "https://myanimelist.net/manga.php?q=one%20piece");

        let result = enter_impl(&session, OmniboxEnterParams { text: String::new() }).await.unwrap();
        let out: OmniboxEnterOutput = output(&result);
        assert_eq!(out.url, "https://myanimelist.net/");
    }

    #[tokio::test]
    async fn test_cancel() {
        let (_, _, session) = session();
        let result = cancel_impl(&session).await.unwrap();
        let out: OmniboxCancelOutput = output(&result);
        assert!(out.cancelled);
    }
}
