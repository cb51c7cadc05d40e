// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::ids::*;

pub const WISH_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

time::serde::format_description!(
    wish_time,
    PrimitiveDateTime,
    "[year]-[month]-[day] [hour]:[minute]:[second]"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Character,
    Weapon,
}

impl ItemType {
    pub const ALL: [Self; 2] = [Self::Character, Self::Weapon];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Character => "Character",
            Self::Weapon => "Weapon",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Character" => Some(Self::Character),
            "Weapon" => Some(Self::Weapon),
            _ => None,
        }
    }
}

/// One draw result, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishEvent {
    pub name: String,
    pub rarity: u8,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub banner_type: BannerTypeId,
    #[serde(default)]
    pub banner_type_name: String,
    #[serde(with = "wish_time")]
    pub time: PrimitiveDateTime,
    /// Draws it took to get this item; only tracked for 4 and 5 star results.
    #[serde(default)]
    pub pity: Option<u32>,
}

impl WishEvent {
    pub fn rarity_text(&self) -> String {
        "\u{2605}".repeat(usize::from(self.rarity))
    }

    pub fn time_text(&self) -> String {
        self.time
            .format(WISH_TIME_FORMAT)
            .unwrap_or_else(|_| self.time.to_string())
    }
}

/// A stored draw record before statistics and pity have been derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWish {
    pub id: WishId,
    #[serde(alias = "banner_type")]
    pub banner_type: BannerTypeId,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub rarity: u8,
    #[serde(with = "wish_time")]
    pub time: PrimitiveDateTime,
    pub name: String,
}

/// Every account's stored records plus the banner-type names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHistory {
    #[serde(default, alias = "banner_types")]
    pub banner_types: BTreeMap<BannerTypeId, String>,
    #[serde(default, alias = "wish_history")]
    pub wish_history: BTreeMap<AccountId, Vec<RawWish>>,
}

impl RawHistory {
    pub fn wish_count(&self) -> usize {
        self.wish_history.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatCategory {
    Characters5,
    Weapons5,
    Characters4,
    Weapons4,
    Weapons3,
}

impl StatCategory {
    pub const ALL: [Self; 5] = [
        Self::Characters5,
        Self::Weapons5,
        Self::Characters4,
        Self::Weapons4,
        Self::Weapons3,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Characters5 => "5\u{2605} characters",
            Self::Weapons5 => "5\u{2605} weapons",
            Self::Characters4 => "4\u{2605} characters",
            Self::Weapons4 => "4\u{2605} weapons",
            Self::Weapons3 => "3\u{2605} weapons",
        }
    }

    pub const fn tracks_pity(self) -> bool {
        !matches!(self, Self::Weapons3)
    }

    pub fn for_wish(rarity: u8, item_type: ItemType) -> Option<Self> {
        match (rarity, item_type) {
            (5, ItemType::Character) => Some(Self::Characters5),
            (5, ItemType::Weapon) => Some(Self::Weapons5),
            (4, ItemType::Character) => Some(Self::Characters4),
            (4, ItemType::Weapon) => Some(Self::Weapons4),
            (3, _) => Some(Self::Weapons3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_pity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PityCounter {
    pub name: String,
    pub pity4: u32,
    pub pity5: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowPityEntry {
    pub name: String,
    pub pity: u32,
}

/// Everything shown for one account. Replaced wholesale on reload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDataset {
    #[serde(default)]
    pub statistics: BTreeMap<StatCategory, CategoryStats>,
    #[serde(default)]
    pub pity: Vec<PityCounter>,
    #[serde(default)]
    pub low_pity: Vec<LowPityEntry>,
    #[serde(default)]
    pub wish_history: Vec<WishEvent>,
    #[serde(default)]
    pub total_wishes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerType {
    pub id: BannerTypeId,
    pub name: String,
}

/// Result of one data load: banner names plus one dataset per account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSnapshot {
    #[serde(default)]
    pub banner_types: BTreeMap<BannerTypeId, String>,
    #[serde(default)]
    pub uids: BTreeMap<AccountId, AccountDataset>,
}

impl DataSnapshot {
    pub fn banner_type_list(&self) -> Vec<BannerType> {
        self.banner_types
            .iter()
            .map(|(id, name)| BannerType {
                id: *id,
                name: name.clone(),
            })
            .collect()
    }
}
