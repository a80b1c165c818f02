/// Converts raw token-cost units into the ledger's credit unit.
pub const CREDIT_UNIT_DIVISOR: f64 = 10.0;

/// Cost of a completed call in credits, from the token counts the provider
/// reported and the per-token prices of the mapping that served it. A
/// zero-token response costs zero; there is no minimum charge and no
/// rounding beyond f64 arithmetic.
pub fn credits_used(
    input_tokens: i64,
    output_tokens: i64,
    input_token_cost: f64,
    output_token_cost: f64,
) -> f64 {
    (input_tokens as f64 * input_token_cost + output_tokens as f64 * output_token_cost)
        / CREDIT_UNIT_DIVISOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credits_used_reference_values() {
        // (100 * 0.002 + 50 * 0.004) / 10 = 0.04
        assert!((credits_used(100, 50, 0.002, 0.004) - 0.04).abs() < 1e-12);
        // (10 * 0.01 + 5 * 0.02) / 10 = 0.02
        assert!((credits_used(10, 5, 0.01, 0.02) - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_zero_tokens_cost_nothing() {
        assert_eq!(credits_used(0, 0, 0.01, 0.02), 0.0);
    }

    #[test]
    fn test_one_sided_usage() {
        assert!((credits_used(0, 100, 0.5, 0.25) - 2.5).abs() < 1e-12);
        assert!((credits_used(100, 0, 0.5, 0.25) - 5.0).abs() < 1e-12);
    }
}
