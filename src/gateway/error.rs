use axum::{
    Json,
    response::{IntoResponse, Response},
};
use cyder_tools::log::error;
use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::controller::BaseError;
use crate::service::llm::LlmError;

/// Every way a completion request can fail. Precondition failures are
/// detected before any side effect and surface as 403 with a message body.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("api key is invalid")]
    InvalidApiKey,
    #[error("insufficient credits")]
    InsufficientCredits,
    #[error("model is not supported")]
    UnsupportedModel,
    #[error("{}", .0.as_deref().unwrap_or("no provider found for model"))]
    NoProviderForModel(Option<String>),
    #[error("provider call failed: {0}")]
    ProviderAdapterFailure(String),
    #[error("provider call timed out")]
    ProviderTimeout,
    #[error("internal server error")]
    Internal(BaseError),
}

impl From<BaseError> for GatewayError {
    fn from(err: BaseError) -> Self {
        GatewayError::Internal(err)
    }
}

impl From<LlmError> for GatewayError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => GatewayError::ProviderTimeout,
            other => GatewayError::ProviderAdapterFailure(other.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::ProviderTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal(err) => {
                error!("gateway internal error: {:?}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::FORBIDDEN,
        };
        let body = Json(json!({
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_provider_message_distinguishes_unsupported_name() {
        let no_mapping = GatewayError::NoProviderForModel(None);
        assert_eq!(no_mapping.to_string(), "no provider found for model");

        let unknown_name = GatewayError::NoProviderForModel(Some(
            "provider 'Azure' is not supported".to_string(),
        ));
        assert_eq!(unknown_name.to_string(), "provider 'Azure' is not supported");
    }

    #[test]
    fn test_llm_timeout_maps_to_provider_timeout() {
        assert!(matches!(
            GatewayError::from(LlmError::Timeout),
            GatewayError::ProviderTimeout
        ));
        assert!(matches!(
            GatewayError::from(LlmError::Api {
                status: 500,
                body: "boom".to_string()
            }),
            GatewayError::ProviderAdapterFailure(_)
        ));
    }
}
