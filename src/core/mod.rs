pub mod fs;
pub mod middleware;

use middleware::AuthMiddleware;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;

/// Transient transport failures are retried inside a single call only.
const TRANSIENT_RETRIES: u32 = 2;

pub(crate) fn authorized_client(middleware: AuthMiddleware) -> ClientWithMiddleware {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(TRANSIENT_RETRIES);
    ClientBuilder::new(Client::new())
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .with(middleware)
        .build()
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorResponse {
    pub error: GoogleErrorDetails,
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorDetails {
    pub code: u16,
    pub message: String,
    pub status: Option<String>,
}

impl GoogleErrorResponse {
    pub fn display_message(&self) -> String {
        match &self.error.status {
            Some(status) => format!("{} ({} {})", self.error.message, self.error.code, status),
            None => format!("{} (code: {})", self.error.message, self.error.code),
        }
    }
}

/// Renders a failed response as `"<op> failed <status>: <detail>"`.
pub async fn describe_failure(response: reqwest::Response, op: &str) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<GoogleErrorResponse>(&text) {
        Ok(err) => err.display_message(),
        Err(_) => text,
    };
    format!("{} failed {}: {}", op, status, detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_includes_status_when_present() {
        let err: GoogleErrorResponse = serde_json::from_str(
            r#"{"error":{"code":403,"message":"Permission denied","status":"PERMISSION_DENIED"}}"#,
        )
        .unwrap();
        assert_eq!(err.display_message(), "Permission denied (403 PERMISSION_DENIED)");

        let err: GoogleErrorResponse =
            serde_json::from_str(r#"{"error":{"code":500,"message":"boom"}}"#).unwrap();
        assert_eq!(err.display_message(), "boom (code: 500)");
    }
}
