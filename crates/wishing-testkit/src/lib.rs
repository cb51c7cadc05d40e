// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use time::macros::datetime;
use time::{Duration, PrimitiveDateTime};
use wishing_app::history::build_snapshot;
use wishing_app::{
    AccountDataset, AccountId, BannerTypeId, DataSnapshot, DataSource, ItemType, RawHistory,
    RawWish, RefreshResponse, WishEvent, WishId,
};

const BANNER_TYPES: [(i64, &str); 4] = [
    (100, "Novice Wishes"),
    (200, "Permanent Wish"),
    (301, "Character Event Wish"),
    (302, "Weapon Event Wish"),
];

const FIVE_STAR_CHARACTERS: [&str; 8] = [
    "Diluc", "Jean", "Keqing", "Mona", "Qiqi", "Venti", "Klee", "Zhongli",
];
const FIVE_STAR_WEAPONS: [&str; 6] = [
    "Skyward Harp",
    "Aquila Favonia",
    "Wolf's Gravestone",
    "Primordial Jade Winged-Spear",
    "Lost Prayer to the Sacred Winds",
    "Amos' Bow",
];
const FOUR_STAR_CHARACTERS: [&str; 10] = [
    "Barbara", "Beidou", "Bennett", "Fischl", "Ningguang", "Noelle", "Razor", "Sucrose",
    "Xiangling", "Xingqiu",
];
const FOUR_STAR_WEAPONS: [&str; 8] = [
    "Favonius Sword",
    "Sacrificial Bow",
    "The Stringless",
    "Rust",
    "Dragon's Bane",
    "Lion's Roar",
    "Rainslasher",
    "Eye of Perception",
];
const THREE_STAR_WEAPONS: [&str; 8] = [
    "Slingshot",
    "Cool Steel",
    "Black Tassel",
    "Debate Club",
    "Magic Guide",
    "Emerald Orb",
    "Harbinger of Dawn",
    "Thrilling Tales of Dragon Slayers",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of plausible wish records. The same seed always yields
/// the same history.
#[derive(Debug, Clone)]
pub struct WishFaker {
    rng: DeterministicRng,
    next_id: i64,
    clock: PrimitiveDateTime,
}

impl WishFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1_600_000_000_000_000_000,
            clock: reference_start(),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// One draw on `banner`, with rarity odds loosely following the game's.
    pub fn raw_wish(&mut self, banner: BannerTypeId) -> RawWish {
        let roll = self.rng.int_n(1000);
        let rarity = if roll < 16 {
            5
        } else if roll < 146 {
            4
        } else {
            3
        };
        self.raw_wish_with(banner, rarity)
    }

    pub fn raw_wish_with(&mut self, banner: BannerTypeId, rarity: u8) -> RawWish {
        let item_type = match rarity {
            5 | 4 if self.rng.bool() => ItemType::Character,
            _ => ItemType::Weapon,
        };
        let name = match (rarity, item_type) {
            (5, ItemType::Character) => self.pick(&FIVE_STAR_CHARACTERS),
            (5, ItemType::Weapon) => self.pick(&FIVE_STAR_WEAPONS),
            (4, ItemType::Character) => self.pick(&FOUR_STAR_CHARACTERS),
            (4, ItemType::Weapon) => self.pick(&FOUR_STAR_WEAPONS),
            _ => self.pick(&THREE_STAR_WEAPONS),
        };

        self.next_id += 1 + self.rng.int_n(1000) as i64;
        self.clock += Duration::minutes(1 + self.rng.int_n(240) as i64);

        RawWish {
            id: WishId::new(self.next_id),
            banner_type: banner,
            item_type,
            rarity,
            time: self.clock,
            name: name.to_owned(),
        }
    }

    /// `count` draws spread over the standard banners.
    pub fn raw_history(&mut self, count: usize) -> Vec<RawWish> {
        let banners: Vec<BannerTypeId> = banner_types().keys().copied().collect();
        (0..count)
            .map(|_| {
                let banner = banners[self.rng.int_n(banners.len())];
                self.raw_wish(banner)
            })
            .collect()
    }

    /// Full store contents for the given accounts.
    pub fn history(&mut self, accounts: &[(&str, usize)]) -> RawHistory {
        RawHistory {
            banner_types: banner_types(),
            wish_history: accounts
                .iter()
                .map(|(account, count)| (AccountId::from(*account), self.raw_history(*count)))
                .collect(),
        }
    }

    pub fn snapshot(&mut self, accounts: &[(&str, usize)]) -> DataSnapshot {
        build_snapshot(&self.history(accounts))
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }
}

pub fn banner_types() -> BTreeMap<BannerTypeId, String> {
    BANNER_TYPES
        .iter()
        .map(|(id, name)| (BannerTypeId::new(*id), (*name).to_owned()))
        .collect()
}

/// A display-ready event with fixed field values.
pub fn wish_event(rarity: u8, item_type: ItemType, banner: i64) -> WishEvent {
    let banner_type = BannerTypeId::new(banner);
    WishEvent {
        name: format!("{}-star {}", rarity, item_type.as_str().to_ascii_lowercase()),
        rarity,
        item_type,
        banner_type,
        banner_type_name: banner_types()
            .get(&banner_type)
            .cloned()
            .unwrap_or_else(|| banner.to_string()),
        time: reference_start(),
        pity: None,
    }
}

/// Wraps ready-made events for one account into a snapshot using the
/// standard banner names.
pub fn snapshot_from_events(accounts: Vec<(&str, Vec<WishEvent>)>) -> DataSnapshot {
    DataSnapshot {
        banner_types: banner_types(),
        uids: accounts
            .into_iter()
            .map(|(account, wish_history)| {
                (
                    AccountId::from(account),
                    AccountDataset {
                        total_wishes: wish_history.len() as u64,
                        wish_history,
                        ..AccountDataset::default()
                    },
                )
            })
            .collect(),
    }
}

/// `count` three-star weapon draws on the permanent banner.
pub fn uniform_events(count: usize) -> Vec<WishEvent> {
    (0..count)
        .map(|index| WishEvent {
            name: format!("wish {index}"),
            ..wish_event(3, ItemType::Weapon, 200)
        })
        .collect()
}

/// Data source that replays scripted answers in order.
#[derive(Debug, Default)]
pub struct FakeSource {
    loads: VecDeque<std::result::Result<DataSnapshot, String>>,
    refreshes: VecDeque<std::result::Result<RefreshResponse, String>>,
    pub load_calls: usize,
    pub refresh_calls: usize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_load(mut self, snapshot: DataSnapshot) -> Self {
        self.loads.push_back(Ok(snapshot));
        self
    }

    pub fn with_load_error(mut self, message: &str) -> Self {
        self.loads.push_back(Err(message.to_owned()));
        self
    }

    pub fn with_refresh(mut self, response: RefreshResponse) -> Self {
        self.refreshes.push_back(Ok(response));
        self
    }

    pub fn with_refresh_error(mut self, message: &str) -> Self {
        self.refreshes.push_back(Err(message.to_owned()));
        self
    }
}

impl DataSource for FakeSource {
    fn load(&mut self) -> Result<DataSnapshot> {
        self.load_calls += 1;
        match self.loads.pop_front() {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted load left")),
        }
    }

    fn refresh(&mut self) -> Result<RefreshResponse> {
        self.refresh_calls += 1;
        match self.refreshes.pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted refresh left")),
        }
    }
}

pub fn temp_history_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("history.json");
    Ok((dir, path))
}

fn reference_start() -> PrimitiveDateTime {
    datetime!(2021-09-28 00:00:00)
}
