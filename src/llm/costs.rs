//! Per-token pricing for known models (USD).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// (input, output) cost per token for a model, zero when unknown.
pub fn model_cost(model: &str) -> (Decimal, Decimal) {
    // Prices are per million tokens.
    let (input, output) = match model {
        m if m.starts_with("gpt-3.5-turbo") => (dec!(0.50), dec!(1.50)),
        m if m.starts_with("gpt-4o-mini") => (dec!(0.15), dec!(0.60)),
        m if m.starts_with("gpt-4o") => (dec!(2.50), dec!(10.00)),
        m if m.starts_with("claude-3-5-haiku") => (dec!(0.80), dec!(4.00)),
        m if m.starts_with("claude-sonnet-4") || m.starts_with("claude-3-5-sonnet") => {
            (dec!(3.00), dec!(15.00))
        }
        _ => (Decimal::ZERO, Decimal::ZERO),
    };
    let per_million = dec!(1000000);
    (input / per_million, output / per_million)
}

/// Estimated cost of one call.
pub fn estimate(costs: (Decimal, Decimal), input_tokens: u32, output_tokens: u32) -> Decimal {
    costs.0 * Decimal::from(input_tokens) + costs.1 * Decimal::from(output_tokens)
}
