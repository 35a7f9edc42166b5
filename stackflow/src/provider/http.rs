//! JSON-over-HTTP adapter for a provisioning gateway.
//!
//! Each operation is a POST of `{"Action": ..., ...}` to one endpoint. A
//! non-2xx response carries `{"Error": {"Code", "Message"}}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ProvisioningApi, RemoteStackState, StackRequest};
use crate::errors::ProviderError;

/// Provisioning client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpProvisioningClient {
    client: reqwest::Client,
    endpoint: String,
    region: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StackNameBody<'a> {
    action: &'static str,
    stack_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MutationBody<'a> {
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
    #[serde(flatten)]
    request: &'a StackRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeResponse {
    #[serde(default)]
    stacks: Vec<RemoteStackState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

impl HttpProvisioningClient {
    /// Creates a client for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::new(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            region: None,
            token: None,
        })
    }

    /// Sets the region sent with each request.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    async fn call<B: Serialize + Sync>(&self, action: &str, body: &B) -> Result<String, ProviderError> {
        debug!(action = %action, endpoint = %self.endpoint, "Provider request");

        let mut request = self.client.post(&self.endpoint).json(body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("{action} request failed: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::new(format!("{action} response unreadable: {e}")))?;

        if status.is_success() {
            return Ok(text);
        }

        Err(match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => {
                let err = ProviderError::new(envelope.error.message);
                match envelope.error.code {
                    Some(code) => err.with_code(code),
                    None => err,
                }
            }
            Err(_) => ProviderError::new(format!("HTTP {status}: {text}")),
        })
    }

    async fn mutate(&self, action: &'static str, request: &StackRequest) -> Result<(), ProviderError> {
        let body = MutationBody {
            action,
            region: self.region.as_deref(),
            request,
        };
        self.call(action, &body).await.map(|_| ())
    }
}

#[async_trait]
impl ProvisioningApi for HttpProvisioningClient {
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<RemoteStackState>, ProviderError> {
        let body = StackNameBody {
            action: "DescribeStacks",
            stack_name,
            region: self.region.as_deref(),
        };
        let text = self.call("DescribeStacks", &body).await?;
        let response: DescribeResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::new(format!("Malformed DescribeStacks response: {e}")))?;
        Ok(response.stacks.into_iter().next())
    }

    async fn create_stack(&self, request: &StackRequest) -> Result<(), ProviderError> {
        self.mutate("CreateStack", request).await
    }

    async fn update_stack(&self, request: &StackRequest) -> Result<(), ProviderError> {
        let update = StackRequest {
            on_failure: None,
            ..request.clone()
        };
        self.mutate("UpdateStack", &update).await
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<(), ProviderError> {
        let body = StackNameBody {
            action: "DeleteStack",
            stack_name,
            region: self.region.as_deref(),
        };
        self.call("DeleteStack", &body).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Capability, OnFailure};

    #[test]
    fn test_mutation_body_flattens_request() {
        let request = StackRequest {
            stack_name: "svc-dev-a".into(),
            template_body: "{}".into(),
            tags: Vec::new(),
            capabilities: vec![Capability::Iam],
            parameters: Vec::new(),
            on_failure: Some(OnFailure::Rollback),
        };
        let body = MutationBody {
            action: "CreateStack",
            region: Some("eu-west-1"),
            request: &request,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["Action"], "CreateStack");
        assert_eq!(json["Region"], "eu-west-1");
        assert_eq!(json["StackName"], "svc-dev-a");
        assert_eq!(json["Capabilities"][0], "CAPABILITY_IAM");
    }

    #[test]
    fn test_error_envelope_parse() {
        let envelope: ErrorEnvelope = serde_json::from_str(
            r#"{"Error": {"Code": "ValidationError", "Message": "No updates are to be performed."}}"#,
        )
        .unwrap();
        assert_eq!(envelope.error.code.as_deref(), Some("ValidationError"));
        assert!(envelope.error.message.starts_with("No updates"));
    }

    #[test]
    fn test_describe_response_parse() {
        let response: DescribeResponse = serde_json::from_str(
            r#"{"Stacks": [{"StackName": "a", "StackStatus": "CREATE_COMPLETE", "Tags": [{"Key": "STAGE", "Value": "dev"}]}]}"#,
        )
        .unwrap();
        assert_eq!(response.stacks[0].stack_status, "CREATE_COMPLETE");
        assert_eq!(response.stacks[0].tags[0].value, "dev");
    }
}
