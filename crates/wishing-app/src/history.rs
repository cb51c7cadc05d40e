// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Derives statistics, pity counters and display events from stored records.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::{
    AccountDataset, BannerTypeId, CategoryStats, DataSnapshot, LowPityEntry, PityCounter,
    RawHistory, RawWish, StatCategory, WishEvent,
};

const LOW_PITY_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
struct Counter {
    pity4: u32,
    pity5: u32,
}

/// Builds the display snapshot for every account in `history`.
pub fn build_snapshot(history: &RawHistory) -> DataSnapshot {
    let uids = history
        .wish_history
        .iter()
        .map(|(account, wishes)| {
            debug!(%account, wishes = wishes.len(), "building account dataset");
            (
                account.clone(),
                build_account(&history.banner_types, wishes),
            )
        })
        .collect();

    DataSnapshot {
        banner_types: history.banner_types.clone(),
        uids,
    }
}

pub fn build_account(
    banner_types: &BTreeMap<BannerTypeId, String>,
    wishes: &[RawWish],
) -> AccountDataset {
    let mut ordered: Vec<&RawWish> = wishes.iter().collect();
    ordered.sort_by_key(|wish| wish.id);

    let mut counters: BTreeMap<BannerTypeId, Counter> = banner_types
        .keys()
        .map(|id| (*id, Counter::default()))
        .collect();
    let mut samples: BTreeMap<StatCategory, Vec<u32>> = BTreeMap::new();
    let mut totals: BTreeMap<StatCategory, u64> = StatCategory::ALL
        .iter()
        .map(|category| (*category, 0))
        .collect();
    let mut low_pity = Vec::new();
    let mut history = Vec::with_capacity(ordered.len());

    for wish in ordered {
        let counter = counters.entry(wish.banner_type).or_insert_with(|| {
            warn!(banner_type = %wish.banner_type, "wish on unknown banner type");
            Counter::default()
        });
        let category = StatCategory::for_wish(wish.rarity, wish.item_type);
        let mut obtained_at = None;

        if wish.rarity == 5 {
            let current = counter.pity5 + 1;
            obtained_at = Some(current);
            low_pity.push(LowPityEntry {
                name: wish.name.clone(),
                pity: current,
            });
            counter.pity5 = 0;
        } else {
            counter.pity5 += 1;
        }

        if wish.rarity == 4 {
            obtained_at = Some(counter.pity4 + 1);
            counter.pity4 = 0;
        } else {
            counter.pity4 += 1;
        }

        if let Some(category) = category {
            *totals.entry(category).or_default() += 1;
            if let (true, Some(pity)) = (category.tracks_pity(), obtained_at) {
                samples.entry(category).or_default().push(pity);
            }
        }

        history.push((
            wish.id,
            WishEvent {
                name: wish.name.clone(),
                rarity: wish.rarity,
                item_type: wish.item_type,
                banner_type: wish.banner_type,
                banner_type_name: banner_name(banner_types, wish.banner_type),
                time: wish.time,
                pity: obtained_at,
            },
        ));
    }

    let statistics = totals
        .into_iter()
        .map(|(category, total)| {
            let average_pity = category
                .tracks_pity()
                .then(|| average(samples.get(&category).map(Vec::as_slice).unwrap_or(&[])));
            (
                category,
                CategoryStats {
                    total,
                    average_pity,
                },
            )
        })
        .collect();

    let pity = counters
        .into_iter()
        .filter(|(id, _)| *id != BannerTypeId::NOVICE)
        .map(|(id, counter)| PityCounter {
            name: banner_name(banner_types, id),
            pity4: counter.pity4,
            pity5: counter.pity5,
        })
        .collect();

    low_pity.sort_by_key(|entry| entry.pity);
    low_pity.truncate(LOW_PITY_LIMIT);

    history.reverse();
    let wish_history: Vec<WishEvent> = history.into_iter().map(|(_, event)| event).collect();

    AccountDataset {
        statistics,
        pity,
        low_pity,
        total_wishes: wish_history.len() as u64,
        wish_history,
    }
}

fn banner_name(banner_types: &BTreeMap<BannerTypeId, String>, id: BannerTypeId) -> String {
    banner_types
        .get(&id)
        .cloned()
        .unwrap_or_else(|| id.to_string())
}

fn average(samples: &[u32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: u64 = samples.iter().map(|value| u64::from(*value)).sum();
    sum as f64 / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::build_account;
    use crate::{BannerTypeId, ItemType, RawWish, StatCategory, WishId};
    use std::collections::BTreeMap;
    use time::PrimitiveDateTime;
    use time::macros::datetime;

    const CHARACTER_EVENT: i64 = 301;
    const PERMANENT: i64 = 200;

    fn banners() -> BTreeMap<BannerTypeId, String> {
        BTreeMap::from([
            (BannerTypeId::NOVICE, "Novice Wishes".to_owned()),
            (BannerTypeId::new(PERMANENT), "Permanent Wish".to_owned()),
            (
                BannerTypeId::new(CHARACTER_EVENT),
                "Character Event Wish".to_owned(),
            ),
        ])
    }

    fn at(minute: u8) -> PrimitiveDateTime {
        datetime!(2021-10-01 10:00:00)
            .replace_minute(minute)
            .expect("minute in range")
    }

    fn raw(id: i64, banner: i64, rarity: u8, item_type: ItemType, name: &str) -> RawWish {
        RawWish {
            id: WishId::new(id),
            banner_type: BannerTypeId::new(banner),
            item_type,
            rarity,
            time: at((id % 60) as u8),
            name: name.to_owned(),
        }
    }

    #[test]
    fn pity_counts_reset_on_hits_per_banner() {
        let wishes = vec![
            raw(1, CHARACTER_EVENT, 3, ItemType::Weapon, "Slingshot"),
            raw(2, CHARACTER_EVENT, 4, ItemType::Character, "Bennett"),
            raw(3, PERMANENT, 3, ItemType::Weapon, "Cool Steel"),
            raw(4, CHARACTER_EVENT, 3, ItemType::Weapon, "Slingshot"),
            raw(5, CHARACTER_EVENT, 5, ItemType::Character, "Venti"),
        ];
        let dataset = build_account(&banners(), &wishes);

        assert_eq!(dataset.total_wishes, 5);
        let newest = &dataset.wish_history[0];
        assert_eq!(newest.name, "Venti");
        assert_eq!(newest.pity, Some(4));
        assert_eq!(newest.banner_type_name, "Character Event Wish");

        let bennett = &dataset.wish_history[3];
        assert_eq!(bennett.name, "Bennett");
        assert_eq!(bennett.pity, Some(2));
        assert_eq!(dataset.wish_history[4].pity, None);

        let event_counter = dataset
            .pity
            .iter()
            .find(|counter| counter.name == "Character Event Wish")
            .expect("event banner counter");
        assert_eq!(event_counter.pity5, 0);
        assert_eq!(event_counter.pity4, 2);

        let permanent = dataset
            .pity
            .iter()
            .find(|counter| counter.name == "Permanent Wish")
            .expect("permanent banner counter");
        assert_eq!((permanent.pity4, permanent.pity5), (1, 1));
    }

    #[test]
    fn novice_banner_is_left_out_of_pity_list() {
        let dataset = build_account(&banners(), &[]);
        assert_eq!(dataset.pity.len(), 2);
        assert!(dataset.pity.iter().all(|counter| counter.name != "Novice Wishes"));
    }

    #[test]
    fn statistics_track_totals_and_average_pity() {
        let mut wishes = Vec::new();
        let mut id = 0;
        for _ in 0..2 {
            for _ in 0..9 {
                id += 1;
                wishes.push(raw(id, CHARACTER_EVENT, 3, ItemType::Weapon, "Debate Club"));
            }
            id += 1;
            wishes.push(raw(id, CHARACTER_EVENT, 4, ItemType::Character, "Xingqiu"));
        }
        id += 1;
        wishes.push(raw(id, CHARACTER_EVENT, 4, ItemType::Weapon, "Rust"));

        let dataset = build_account(&banners(), &wishes);
        let stats = &dataset.statistics;
        assert_eq!(stats[&StatCategory::Weapons3].total, 18);
        assert_eq!(stats[&StatCategory::Weapons3].average_pity, None);
        assert_eq!(stats[&StatCategory::Characters4].total, 2);
        assert_eq!(stats[&StatCategory::Characters4].average_pity, Some(10.0));
        assert_eq!(stats[&StatCategory::Weapons4].average_pity, Some(1.0));
        assert_eq!(stats[&StatCategory::Characters5].total, 0);
        assert_eq!(stats[&StatCategory::Characters5].average_pity, Some(0.0));
    }

    #[test]
    fn low_pity_keeps_five_luckiest_in_ascending_order() {
        let mut wishes = Vec::new();
        let mut id = 0;
        for (index, gap) in [30_u32, 2, 50, 7, 12, 1, 80].iter().enumerate() {
            for _ in 1..*gap {
                id += 1;
                wishes.push(raw(id, PERMANENT, 3, ItemType::Weapon, "Black Tassel"));
            }
            id += 1;
            wishes.push(raw(
                id,
                PERMANENT,
                5,
                ItemType::Character,
                &format!("five star {index}"),
            ));
        }

        let dataset = build_account(&banners(), &wishes);
        let pities: Vec<u32> = dataset.low_pity.iter().map(|entry| entry.pity).collect();
        assert_eq!(pities, vec![1, 2, 7, 12, 30]);
    }

    #[test]
    fn records_are_ordered_by_id_before_counting() {
        let wishes = vec![
            raw(3, CHARACTER_EVENT, 5, ItemType::Character, "Klee"),
            raw(1, CHARACTER_EVENT, 3, ItemType::Weapon, "Slingshot"),
            raw(2, CHARACTER_EVENT, 3, ItemType::Weapon, "Slingshot"),
        ];
        let dataset = build_account(&banners(), &wishes);
        assert_eq!(dataset.wish_history[0].name, "Klee");
        assert_eq!(dataset.wish_history[0].pity, Some(3));
    }

    #[test]
    fn unknown_banner_gets_counter_named_after_id() {
        let wishes = vec![raw(1, 999, 3, ItemType::Weapon, "Slingshot")];
        let dataset = build_account(&banners(), &wishes);
        assert_eq!(dataset.wish_history[0].banner_type_name, "999");
        assert!(dataset.pity.iter().any(|counter| counter.name == "999"));
    }
}
