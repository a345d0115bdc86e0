//! Delivery to the collection service over HTTP.

use crate::config::Config;
use crate::core::delivery::Transport;
use crate::core::telemetry::CapturePayload;
use crate::error::DeliveryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ExampleRequest<'a> {
    project_key: &'a str,
    #[serde(flatten)]
    payload: &'a CapturePayload,
}

#[derive(Debug, Deserialize)]
struct ExampleResponse {
    id: Option<serde_json::Value>,
}

/// POSTs each capture to `{api_server}/api/v1/examples`.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    project_key: String,
}

impl HttpTransport {
    pub fn new(config: Config) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint(),
            project_key: config.project_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn body<'a>(&'a self, payload: &'a CapturePayload) -> ExampleRequest<'a> {
        ExampleRequest {
            project_key: &self.project_key,
            payload,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, payload: &CapturePayload) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&self.body(payload))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        match response.json::<ExampleResponse>().await {
            Ok(ExampleResponse { id: Some(id) }) => {
                log::debug!("Successfully sent example to API: {}", id)
            }
            _ => log::debug!("Successfully sent example to API"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::function::FunctionDecl;
    use crate::core::scope::ScopePath;
    use crate::core::signature::Signature;
    use crate::core::telemetry::TraceIds;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    #[test]
    fn test_request_body_carries_project_key() {
        let transport =
            HttpTransport::new(Config::new("pk_test").with_api_server("http://localhost:9")).unwrap();
        assert_eq!(transport.endpoint(), "http://localhost:9/api/v1/examples");

        let decl = FunctionDecl::new(ScopePath::new("app"), "ping").returns::<bool>();
        let payload = CapturePayload {
            capture_id: Uuid::new_v4(),
            signature: Arc::new(Signature::from_decl(&decl)),
            input: json!({}),
            output: json!(true),
            timestamp: Utc::now(),
            trace: TraceIds::none(),
        };

        let body = serde_json::to_value(transport.body(&payload)).unwrap();
        assert_eq!(body["project_key"], json!("pk_test"));
        assert_eq!(body["function_name"], json!("app.ping"));
        assert_eq!(body["signature_hash"], json!(payload.signature_hash()));
        assert!(body["otel_trace_id"].is_null());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let transport = HttpTransport::new(
            Config::new("pk_test")
                .with_api_server("http://127.0.0.1:9")
                .with_timeout(std::time::Duration::from_millis(200)),
        )
        .unwrap();
        let decl = FunctionDecl::new(ScopePath::new("app"), "ping");
        let payload = CapturePayload {
            capture_id: Uuid::new_v4(),
            signature: Arc::new(Signature::from_decl(&decl)),
            input: json!({}),
            output: json!(null),
            timestamp: Utc::now(),
            trace: TraceIds::none(),
        };
        assert!(transport.deliver(&payload).await.is_err());
    }
}
