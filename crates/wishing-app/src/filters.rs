// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Per-column allow-lists for the wish table.
//!
//! Every filterable column owns a map of external key → enabled flag plus a
//! normalizer that turns the key into the value stored on [`WishEvent`]. The
//! map is open-ended: keys are added as they are discovered in loaded data.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::warn;

use crate::{ItemType, ViewerError, WishEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    Rarity,
    ItemType,
    BannerType,
}

impl Column {
    pub const ALL: [Self; 3] = [Self::Rarity, Self::ItemType, Self::BannerType];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rarity => "rarity",
            Self::ItemType => "type",
            Self::BannerType => "bannerType",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rarity" => Some(Self::Rarity),
            "type" => Some(Self::ItemType),
            "bannerType" | "banner" => Some(Self::BannerType),
            _ => None,
        }
    }

    /// The value of this column on `event`, in the form normalizers produce.
    pub fn extract(self, event: &WishEvent) -> ComparableValue {
        match self {
            Self::Rarity => ComparableValue::Int(i64::from(event.rarity)),
            Self::ItemType => ComparableValue::Text(event.item_type.as_str().to_owned()),
            Self::BannerType => ComparableValue::Int(event.banner_type.get()),
        }
    }

    /// The filter key `event` would be listed under in this column.
    pub fn key_for(self, event: &WishEvent) -> String {
        match self {
            Self::Rarity => event.rarity.to_string(),
            Self::ItemType => event.item_type.as_str().to_owned(),
            Self::BannerType => event.banner_type.to_string(),
        }
    }

    const fn normalizer(self) -> Normalizer {
        match self {
            Self::Rarity | Self::BannerType => normalize_int,
            Self::ItemType => normalize_item_type,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComparableValue {
    Int(i64),
    Text(String),
}

impl ComparableValue {
    pub fn to_key(&self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }
}

pub type Normalizer = fn(&str) -> Option<ComparableValue>;

fn normalize_int(key: &str) -> Option<ComparableValue> {
    key.trim().parse().ok().map(ComparableValue::Int)
}

fn normalize_item_type(key: &str) -> Option<ComparableValue> {
    ItemType::parse(key.trim())
        .map(|item_type| ComparableValue::Text(item_type.as_str().to_owned()))
}

#[derive(Debug, Clone)]
pub struct ColumnFilter {
    keys: BTreeMap<String, bool>,
    normalize: Normalizer,
}

impl ColumnFilter {
    pub fn new(normalize: Normalizer) -> Self {
        Self {
            keys: BTreeMap::new(),
            normalize,
        }
    }

    pub fn with_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        for key in keys {
            self.keys.insert(key.into(), true);
        }
        self
    }

    pub fn flags(&self) -> impl Iterator<Item = (&str, bool)> {
        self.keys.iter().map(|(key, enabled)| (key.as_str(), *enabled))
    }

    pub fn is_enabled(&self, key: &str) -> Option<bool> {
        self.keys.get(key).copied()
    }

    pub fn normalize(&self, key: &str) -> Option<ComparableValue> {
        (self.normalize)(key)
    }

    /// The one key spelling stored for `key`'s value, so `" 4"`, `"04"` and
    /// `"4"` all address the same flag.
    pub fn canonical_key(&self, key: &str) -> Option<String> {
        self.normalize(key).map(|value| value.to_key())
    }
}

/// The flag maps for every filterable column.
#[derive(Debug, Clone)]
pub struct ColumnFilterSet {
    columns: BTreeMap<Column, ColumnFilter>,
}

impl Default for ColumnFilterSet {
    fn default() -> Self {
        let mut columns = BTreeMap::new();
        columns.insert(
            Column::Rarity,
            ColumnFilter::new(Column::Rarity.normalizer()).with_keys(["3", "4", "5"]),
        );
        columns.insert(
            Column::ItemType,
            ColumnFilter::new(Column::ItemType.normalizer())
                .with_keys(ItemType::ALL.map(ItemType::as_str)),
        );
        columns.insert(
            Column::BannerType,
            ColumnFilter::new(Column::BannerType.normalizer()),
        );
        Self { columns }
    }
}

impl ColumnFilterSet {
    pub fn column(&self, column: Column) -> Option<&ColumnFilter> {
        self.columns.get(&column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (Column, &ColumnFilter)> {
        self.columns.iter().map(|(column, filter)| (*column, filter))
    }

    /// Canonical spelling of `key` in `column`, or `None` when the key does
    /// not normalize.
    pub fn canonical_key(&self, column: Column, key: &str) -> Option<String> {
        match self.columns.get(&column) {
            Some(filter) => filter.canonical_key(key),
            None => column.normalizer()(key).map(|value| value.to_key()),
        }
    }

    /// Sets one flag, creating the key if it was never seen. Returns whether
    /// the stored value changed.
    pub fn set_enabled(&mut self, column: Column, key: &str, enabled: bool) -> bool {
        let filter = self.filter_mut(column);
        match filter.keys.insert(key.to_owned(), enabled) {
            Some(previous) => previous != enabled,
            None => true,
        }
    }

    /// Adds `key` unless present. Returns `true` when the key is new.
    pub fn add_key(&mut self, column: Column, key: &str, default_enabled: bool) -> bool {
        let filter = self.filter_mut(column);
        if filter.keys.contains_key(key) {
            return false;
        }
        filter.keys.insert(key.to_owned(), default_enabled);
        true
    }

    /// Normalized values of every enabled key. Keys the normalizer rejects
    /// are skipped.
    pub fn effective_values(&self, column: Column) -> BTreeSet<ComparableValue> {
        let Some(filter) = self.columns.get(&column) else {
            return BTreeSet::new();
        };

        filter
            .keys
            .iter()
            .filter(|(_, enabled)| **enabled)
            .filter_map(|(key, _)| match normalize_key(column, filter, key) {
                Ok(value) => Some(value),
                Err(error) => {
                    warn!(%error, "skipping filter key");
                    None
                }
            })
            .collect()
    }

    /// Snapshot of the current flags as an evaluator.
    pub fn compile(&self) -> FilterEvaluator {
        FilterEvaluator {
            allow: self
                .columns
                .keys()
                .map(|column| (*column, self.effective_values(*column)))
                .collect(),
        }
    }

    fn filter_mut(&mut self, column: Column) -> &mut ColumnFilter {
        self.columns
            .entry(column)
            .or_insert_with(|| ColumnFilter::new(column.normalizer()))
    }
}

fn normalize_key(
    column: Column,
    filter: &ColumnFilter,
    key: &str,
) -> Result<ComparableValue, ViewerError> {
    filter.normalize(key).ok_or_else(|| ViewerError::MalformedKey {
        column,
        key: key.to_owned(),
    })
}

/// Conjunction of per-column allow-lists. A column with an empty allow-list
/// rejects every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEvaluator {
    allow: Vec<(Column, BTreeSet<ComparableValue>)>,
}

impl FilterEvaluator {
    pub fn matches(&self, event: &WishEvent) -> bool {
        self.allow
            .iter()
            .all(|(column, allowed)| allowed.contains(&column.extract(event)))
    }

    pub fn apply<'a>(&self, events: &'a [WishEvent]) -> Vec<&'a WishEvent> {
        events.iter().filter(|event| self.matches(event)).collect()
    }
}
