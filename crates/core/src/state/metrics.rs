//! Running token, call and cost totals.

use pp_protocol::event_models::MetricsDelta;
use pp_protocol::state_models::Metrics;

const MICRODOLLARS_PER_DOLLAR: f64 = 1_000_000.0;

/// Convert a dollar amount to whole microdollars.
///
/// Negative, NaN and infinite amounts have no meaning as an additive delta
/// and yield `None`.
pub fn to_microdollars(usd: f64) -> Option<u64> {
    if !usd.is_finite() || usd < 0.0 {
        return None;
    }
    let micros = (usd * MICRODOLLARS_PER_DOLLAR).round();
    if micros >= u64::MAX as f64 {
        return Some(u64::MAX);
    }
    Some(micros as u64)
}

/// Add `delta` to `metrics`.
///
/// Totals saturate instead of wrapping so they never decrease. Returns a
/// warning when the cost part of the delta had to be discarded.
pub fn accumulate(metrics: &mut Metrics, delta: &MetricsDelta) -> Option<String> {
    let (cost, warning) = match to_microdollars(delta.cost_usd) {
        Some(cost) => (cost, None),
        None => (
            0,
            Some(format!(
                "Ignored invalid cost delta {} in metrics update",
                delta.cost_usd
            )),
        ),
    };

    metrics.calls = metrics.calls.saturating_add(delta.calls);
    metrics.input_tokens = metrics.input_tokens.saturating_add(delta.input_tokens);
    metrics.output_tokens = metrics.output_tokens.saturating_add(delta.output_tokens);
    metrics.cost_microdollars = metrics.cost_microdollars.saturating_add(cost);

    if let Some(model) = &delta.model {
        let usage = metrics.by_model.entry(model.clone()).or_default();
        usage.calls = usage.calls.saturating_add(delta.calls);
        usage.input_tokens = usage.input_tokens.saturating_add(delta.input_tokens);
        usage.output_tokens = usage.output_tokens.saturating_add(delta.output_tokens);
        usage.cost_microdollars = usage.cost_microdollars.saturating_add(cost);
    }

    warning
}
