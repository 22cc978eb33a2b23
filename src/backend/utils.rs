use serde_json::Value;
use tracing::error;

use crate::backend::client::HttpResponse;
use crate::error::{Result, RockError};

/// Message used when neither the provider nor the transport says what went wrong.
pub const GENERIC_EXTRACTION_FAILURE: &str = "Error analyzing rock. Please try again.";

/// Extract JSON from markdown code blocks if present, otherwise return the content as-is.
///
/// Structured outputs should never be fenced, but some OpenAI-compatible
/// servers wrap JSON in ```json ... ``` anyway.
pub fn extract_json_from_markdown(content: &str) -> String {
    let trimmed = content.trim();

    if trimmed.starts_with("```")
        && let Some(start_idx) = trimmed.find('\n')
    {
        let after_start = &trimmed[start_idx + 1..];
        if let Some(end_idx) = after_start.rfind("```") {
            return after_start[..end_idx].trim().to_string();
        }
    }

    trimmed.to_string()
}

/// Convert a reqwest error into an extraction error, naming timeouts explicitly.
#[cfg(feature = "openai")]
pub fn handle_http_error(e: reqwest::Error, provider_name: &str) -> RockError {
    error!(error = %e, "HTTP request to {} failed", provider_name);
    if e.is_timeout() {
        RockError::Extraction(format!("Request to {} timed out", provider_name))
    } else {
        let message = e.to_string();
        if message.is_empty() {
            RockError::Extraction(GENERIC_EXTRACTION_FAILURE.to_string())
        } else {
            RockError::Extraction(message)
        }
    }
}

/// Longest plain-text error body shown to a user as is.
const MAX_PLAIN_BODY_MESSAGE: usize = 200;

/// Most specific message available for a failed response.
///
/// A JSON body yields its `error.message` (or top-level `message`). A short,
/// single-line plain-text body is used as is. Anything else, such as an HTML
/// error page from a proxy, yields the generic message.
pub fn error_message_from_body(body: &str) -> String {
    let trimmed = body.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => json
            .pointer("/error/message")
            .and_then(Value::as_str)
            .or_else(|| json.get("message").and_then(Value::as_str))
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| GENERIC_EXTRACTION_FAILURE.to_string()),
        Err(_) if is_plain_message(trimmed) => trimmed.to_string(),
        Err(_) => GENERIC_EXTRACTION_FAILURE.to_string(),
    }
}

fn is_plain_message(body: &str) -> bool {
    !body.is_empty()
        && body.len() <= MAX_PLAIN_BODY_MESSAGE
        && !body.starts_with('<')
        && !body.contains('\n')
}

/// Check HTTP response status and turn failures into extraction errors.
pub fn check_response_status(response: HttpResponse, provider_name: &str) -> Result<HttpResponse> {
    if !response.is_success() {
        error!(
            status = response.status,
            error = %response.body,
            "{} API returned error response", provider_name
        );
        return Err(RockError::Extraction(error_message_from_body(
            &response.body,
        )));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_markdown() {
        assert_eq!(extract_json_from_markdown("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json_from_markdown("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json_from_markdown("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_error_message_prefers_provider_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(error_message_from_body(body), "Incorrect API key provided");
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message_from_body("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_error_message_generic_fallback() {
        assert_eq!(error_message_from_body("   "), GENERIC_EXTRACTION_FAILURE);
        assert_eq!(
            error_message_from_body(r#"{"error":{"message":""}}"#),
            GENERIC_EXTRACTION_FAILURE
        );
        assert_eq!(
            error_message_from_body(r#"{"detail":"nope"}"#),
            GENERIC_EXTRACTION_FAILURE
        );
    }

    #[test]
    fn test_error_message_hides_html_and_long_bodies() {
        let html = "<html>\n<head><title>502 Bad Gateway</title></head>\n<body>nginx</body>\n</html>";
        assert_eq!(error_message_from_body(html), GENERIC_EXTRACTION_FAILURE);

        let long = "x".repeat(MAX_PLAIN_BODY_MESSAGE + 1);
        assert_eq!(error_message_from_body(&long), GENERIC_EXTRACTION_FAILURE);

        let multi_line = "upstream failed\nretry later";
        assert_eq!(error_message_from_body(multi_line), GENERIC_EXTRACTION_FAILURE);
    }

    #[test]
    fn test_check_response_status() {
        assert!(check_response_status(HttpResponse::new(200, "{}"), "OpenAI").is_ok());

        let err = check_response_status(
            HttpResponse::new(500, r#"{"error":{"message":"server overloaded"}}"#),
            "OpenAI",
        )
        .unwrap_err();
        assert_eq!(err, RockError::Extraction("server overloaded".to_string()));
    }
}
