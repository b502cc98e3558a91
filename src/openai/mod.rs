//! OpenAI 호환 HTTP 클라이언트
//!
//! 임베딩/답변 생성 프로바이더가 공유하는 요청 + 재시도 로직입니다.
//! 429, 5xx, 전송 실패는 지수 백오프로 재시도하고, 그 외 에러는 즉시 실패합니다.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;

/// 재시도 시 초기 백오프 (ms)
const INITIAL_BACKOFF_MS: u64 = 1000;

/// OpenAI 호환 API 클라이언트
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

/// OpenAI 에러 응답
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl OpenAiClient {
    /// 설정으로 클라이언트 생성 (API 키 필수)
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_retries: config.max_retries,
        })
    }

    /// JSON POST 요청 (재시도 포함)
    pub async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 0..=self.max_retries {
            let response = match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(anyhow::anyhow!("Failed to send request to {}: {}", url, e));
                    if attempt < self.max_retries {
                        let backoff = backoff_for(attempt);
                        tracing::warn!(
                            "Request failed, retrying in {:?} (attempt {}/{})",
                            backoff,
                            attempt + 1,
                            self.max_retries
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    break;
                }
            };

            let status = response.status();
            let text = response
                .text()
                .await
                .context("Failed to read response body")?;

            if status.is_success() {
                return serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse response from {}", path));
            }

            if is_retryable(status.as_u16()) {
                last_error = Some(anyhow::anyhow!(
                    "API error ({}): {}",
                    status,
                    describe_error(&text)
                ));

                if attempt < self.max_retries {
                    let backoff = backoff_for(attempt);
                    tracing::warn!(
                        "API returned {}, backing off {:?} (attempt {}/{})",
                        status,
                        backoff,
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            } else {
                anyhow::bail!("API error ({}): {}", status, describe_error(&text));
            }
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("Request failed after {} retries", self.max_retries)
        }))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn is_retryable(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

fn backoff_for(attempt: u32) -> Duration {
    Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt))
}

/// 에러 본문에서 메시지 추출 (파싱 실패 시 본문 그대로)
fn describe_error(body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(err) => match err.error.kind {
            Some(kind) => format!("{} ({})", err.error.message, kind),
            None => err.error.message,
        },
        Err(_) => body.trim().to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(429));
        assert!(is_retryable(500));
        assert!(is_retryable(503));
        assert!(!is_retryable(400));
        assert!(!is_retryable(401));
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_for(0), Duration::from_millis(1000));
        assert_eq!(backoff_for(1), Duration::from_millis(2000));
        assert_eq!(backoff_for(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_describe_error() {
        let body = r#"{"error":{"message":"Incorrect API key","type":"invalid_request_error"}}"#;
        assert_eq!(
            describe_error(body),
            "Incorrect API key (invalid_request_error)"
        );
        assert_eq!(describe_error(" upstream timeout "), "upstream timeout");
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = OpenAiClient::new(&OpenAiConfig::default());
        assert!(result.is_err());

        let config = OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://localhost:1234/v1/".to_string(),
            ..OpenAiConfig::default()
        };
        let client = OpenAiClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:1234/v1");
    }
}
