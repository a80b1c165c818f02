use axum::{Json, http::HeaderMap};
use cyder_tools::log::{error, info};
use serde::Deserialize;

use super::auth::authenticate_request;
use super::dispatch::{ProviderKind, pick_mapping, provider_model_name};
use super::error::GatewayError;
use crate::database::{
    model::{Model, ModelProviderMapping},
    user::User,
};
use crate::service::llm::{ChatMessage, LlmResponse};
use crate::utils::billing;

#[derive(Debug, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// The unified completion endpoint: authenticate, gate on credits, resolve
/// the model, pick a provider, call it, settle the charge.
pub async fn chat_completions_handler(
    headers: HeaderMap,
    Json(payload): Json<ChatCompletionRequest>,
) -> Result<Json<LlmResponse>, GatewayError> {
    // 1. Bearer token must belong to a usable api key
    let api_key = authenticate_request(&headers)?;

    // 2. The key's owner needs a strictly positive balance before the call
    let user = User::find_active_by_id(api_key.user_id)?.ok_or(GatewayError::InvalidApiKey)?;
    if user.credits <= 0.0 {
        return Err(GatewayError::InsufficientCredits);
    }

    // 3. The requested model must exist in the catalog
    let model = Model::find_by_slug(&payload.model)?.ok_or(GatewayError::UnsupportedModel)?;

    // 4. Pick one provider uniformly at random from the eligible pool
    let eligible = ModelProviderMapping::list_for_model(model.id)?;
    let selected = pick_mapping(&eligible).ok_or(GatewayError::NoProviderForModel(None))?;

    // 5. Dispatch over the closed vendor set; an unrecognized provider name
    //    is reachable here even though a mapping exists
    let kind = ProviderKind::from_name(&selected.provider_name).ok_or_else(|| {
        GatewayError::NoProviderForModel(Some(format!(
            "provider '{}' is not supported",
            selected.provider_name
        )))
    })?;

    let upstream_model = provider_model_name(&payload.model);
    info!(
        "chat completion: model {} via {} for api key {}",
        payload.model, selected.provider_name, api_key.id
    );
    let response = kind.chat(upstream_model, &payload.messages).await?;

    // 6. Settle the charge from the usage the provider reported. The charge
    //    is best-effort: a failed write is logged, not bounced back to a
    //    caller who already has an answer.
    let credits_used = billing::credits_used(
        response.input_tokens_consumed,
        response.output_tokens_consumed,
        selected.mapping.input_token_cost,
        selected.mapping.output_token_cost,
    );
    match User::charge_for_usage(user.id, api_key.id, credits_used) {
        Ok(()) => info!(
            "charged {:.6} credits to user {} ({} in, {} out)",
            credits_used, user.id, response.input_tokens_consumed, response.output_tokens_consumed
        ),
        Err(err) => error!(
            "failed to record {:.6} credit charge for user {}: {:?}",
            credits_used, user.id, err
        ),
    }

    Ok(Json(response))
}
