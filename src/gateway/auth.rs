use axum::http::HeaderMap;
use cyder_tools::log::warn;
use reqwest::header::AUTHORIZATION;

use super::error::GatewayError;
use crate::database::api_key::ApiKey;

const BEARER_PREFIX: &str = "Bearer ";

/// Resolves the bearer token to a usable api key row. An absent, malformed,
/// unknown, disabled or soft-deleted key all collapse into `InvalidApiKey`.
pub fn authenticate_request(headers: &HeaderMap) -> Result<ApiKey, GatewayError> {
    let token = parse_bearer_token(headers).ok_or(GatewayError::InvalidApiKey)?;
    match ApiKey::find_usable_by_key(token) {
        Ok(Some(api_key)) => Ok(api_key),
        Ok(None) => {
            warn!("rejected unknown or disabled api key");
            Err(GatewayError::InvalidApiKey)
        }
        Err(err) => Err(GatewayError::from(err)),
    }
}

fn parse_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_parse_bearer_token() {
        let headers = headers_with_auth("Bearer tg-abc123");
        assert_eq!(parse_bearer_token(&headers), Some("tg-abc123"));
    }

    #[test]
    fn test_parse_bearer_token_missing_header() {
        assert_eq!(parse_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_parse_bearer_token_wrong_scheme() {
        let headers = headers_with_auth("Basic dXNlcjpwYXNz");
        assert_eq!(parse_bearer_token(&headers), None);
    }

    #[test]
    fn test_parse_bearer_token_empty_token() {
        let headers = headers_with_auth("Bearer ");
        assert_eq!(parse_bearer_token(&headers), None);
    }
}
