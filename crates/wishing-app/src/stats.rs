// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Serialize;

use crate::{AccountDataset, StatCategory};

/// Renders `value` with `decimals` places unless it is integral, in which
/// case no fraction is shown at all.
pub fn format_trimmed(value: f64, decimals: usize) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.decimals$}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: StatCategory,
    pub total: u64,
    pub percent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_pity: Option<String>,
}

/// Display-ready statistics for one account, in [`StatCategory::ALL`] order.
pub fn summarize(dataset: &AccountDataset) -> Vec<CategorySummary> {
    StatCategory::ALL
        .iter()
        .filter_map(|category| {
            dataset.statistics.get(category).map(|stats| {
                let percent = if dataset.total_wishes > 0 {
                    format_trimmed(
                        stats.total as f64 / dataset.total_wishes as f64 * 100.0,
                        2,
                    )
                } else {
                    "0".to_owned()
                };

                CategorySummary {
                    category: *category,
                    total: stats.total,
                    percent,
                    average_pity: stats.average_pity.map(|pity| format_trimmed(pity, 1)),
                }
            })
        })
        .collect()
}
