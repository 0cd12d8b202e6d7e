//! Per-layer metric columns.
//!
//! `column` is the raw CSV header (it may contain `=`); lookups go through
//! [`metric_key`](crate::domain::metric_key) so either spelling works.

use crate::domain::{DateFormat, Layer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricInfo {
    pub column: &'static str,
    pub label: &'static str,
}

const fn metric(column: &'static str, label: &'static str) -> MetricInfo {
    MetricInfo { column, label }
}

pub const CONSENSUS_METRICS: &[MetricInfo] = &[
    metric("hhi", "HHI"),
    metric("nakamoto_coefficient", "Nakamoto coefficient"),
    metric("gini", "Gini coefficient"),
    metric("entropy=1", "Shannon entropy"),
    metric("theil_index", "Theil index"),
    metric("max_power_ratio", "Max power ratio"),
    metric("concentration_ratio=1", "1-concentration ratio"),
    metric("tau=0.33", "τ=0.33 decentralisation index"),
    metric("tau=0.66", "τ=0.66 decentralisation index"),
    metric("total_entities", "Total entities"),
];

pub const TOKENOMICS_METRICS: &[MetricInfo] = &[
    metric("hhi", "HHI"),
    metric("nakamoto_coefficient", "Nakamoto coefficient"),
    metric("gini", "Gini coefficient"),
    metric("entropy=1", "Shannon entropy"),
    metric("theil_index", "Theil index"),
    metric("max_power_ratio", "Max power ratio"),
    metric("concentration_ratio=1", "1-concentration ratio"),
    metric("tau=0.5", "τ=0.5 decentralisation index"),
    metric("tau=0.66", "τ=0.66 decentralisation index"),
    metric("total_entities", "Total entities"),
];

pub const SOFTWARE_METRICS: &[MetricInfo] = &[
    metric("hhi", "HHI"),
    metric("nakamoto_coefficient", "Nakamoto coefficient"),
    metric("gini", "Gini coefficient"),
    metric("entropy=1", "Shannon entropy"),
    metric("theil_index", "Theil index"),
    metric("max_power_ratio", "Max power ratio"),
    metric("tau=0.5", "τ=0.5 decentralisation index"),
    metric("total_entities", "Total entities"),
];

pub const NETWORK_METRICS: &[MetricInfo] = &[
    metric("hhi", "HHI"),
    metric("nakamoto_coefficient", "Nakamoto coefficient"),
    metric("gini", "Gini coefficient"),
    metric("entropy=1", "Shannon entropy"),
    metric("max_power_ratio", "Max power ratio"),
    metric("concentration_ratio=1", "1-concentration ratio"),
    metric("total_entities", "Total entities"),
];

pub const GEOGRAPHY_METRICS: &[MetricInfo] = NETWORK_METRICS;

pub const GOVERNANCE_METRICS: &[MetricInfo] = &[
    metric("gini_coefficient", "Gini coefficient"),
    metric("posts", "Posts"),
    metric("comments", "Comments"),
    metric("users", "Users"),
    metric("communities", "Communities"),
    metric("modularity", "Modularity"),
    metric("percentage", "Percentage"),
];

pub fn layer_metrics(layer: Layer) -> &'static [MetricInfo] {
    match layer {
        Layer::Consensus => CONSENSUS_METRICS,
        Layer::Tokenomics => TOKENOMICS_METRICS,
        Layer::Software => SOFTWARE_METRICS,
        Layer::Network => NETWORK_METRICS,
        Layer::Geography => GEOGRAPHY_METRICS,
        Layer::Governance => GOVERNANCE_METRICS,
    }
}

/// Date format each layer's snapshots are published in.
pub fn layer_date_format(layer: Layer) -> DateFormat {
    match layer {
        Layer::Consensus | Layer::Tokenomics | Layer::Network | Layer::Geography => DateFormat::Iso,
        Layer::Software | Layer::Governance => DateFormat::Auto,
    }
}

/// Human label for `metric` in `layer`, falling back to the metric name itself.
pub fn metric_label(metric: &str, layer: Layer) -> String {
    let key = crate::domain::metric_key(metric);
    layer_metrics(layer)
        .iter()
        .find(|m| crate::domain::metric_key(m.column) == key)
        .map_or_else(|| metric.to_string(), |m| m.label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_resolve_through_normalized_keys() {
        assert_eq!(metric_label("tau_0.5", Layer::Tokenomics), "τ=0.5 decentralisation index");
        assert_eq!(metric_label("entropy=1", Layer::Consensus), "Shannon entropy");
        assert_eq!(metric_label("mystery", Layer::Consensus), "mystery");
    }
}
