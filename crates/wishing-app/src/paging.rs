// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Serialize;
use std::num::NonZeroUsize;

use crate::{ViewerError, WishEvent};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Marker used for every field of a padding row.
pub const PLACEHOLDER: &str = "\u{2013}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    pub name: String,
    pub rarity_text: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub banner_type_name: String,
    pub time: String,
    pub pity: String,
    #[serde(skip)]
    pub placeholder: bool,
}

impl DisplayRow {
    pub fn placeholder() -> Self {
        Self {
            name: PLACEHOLDER.to_owned(),
            rarity_text: PLACEHOLDER.to_owned(),
            item_type: PLACEHOLDER.to_owned(),
            banner_type_name: PLACEHOLDER.to_owned(),
            time: PLACEHOLDER.to_owned(),
            pity: PLACEHOLDER.to_owned(),
            placeholder: true,
        }
    }

    pub fn from_wish(event: &WishEvent) -> Self {
        Self {
            name: event.name.clone(),
            rarity_text: event.rarity_text(),
            item_type: event.item_type.as_str().to_owned(),
            banner_type_name: event.banner_type_name.clone(),
            time: event.time_text(),
            pity: event.pity.map(|pity| pity.to_string()).unwrap_or_default(),
            placeholder: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    pub fn new(value: usize) -> Result<Self, ViewerError> {
        NonZeroUsize::new(value)
            .map(Self)
            .ok_or(ViewerError::InvalidPageSize)
    }

    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(NonZeroUsize::MIN.saturating_add(DEFAULT_PAGE_SIZE - 1))
    }
}

/// `max(0, ceil(count / page_size) - 1)`
pub fn last_page_index(count: usize, page_size: PageSize) -> usize {
    count.div_ceil(page_size.get()).saturating_sub(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub rows: Vec<DisplayRow>,
    pub real_rows: usize,
    pub page_index: usize,
    pub last_page_index: usize,
}

/// Cuts the requested window out of `filtered` and pads it to exactly
/// `page_size` rows. Out-of-range requests clamp to the last page.
pub fn paginate(filtered: &[&WishEvent], page_size: PageSize, requested: usize) -> Page {
    let size = page_size.get();
    let last_page_index = last_page_index(filtered.len(), page_size);
    let page_index = requested.min(last_page_index);

    let start = (page_index * size).min(filtered.len());
    let end = (start + size).min(filtered.len());

    let mut rows: Vec<DisplayRow> = filtered[start..end]
        .iter()
        .map(|event| DisplayRow::from_wish(event))
        .collect();
    let real_rows = rows.len();
    rows.resize_with(size, DisplayRow::placeholder);

    Page {
        rows,
        real_rows,
        page_index,
        last_page_index,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    First,
    Previous,
    Next,
    Last,
    Goto(usize),
}

impl Navigation {
    /// Index to request from [`paginate`]; never below zero and, except for
    /// `Goto`, never past `last`.
    pub fn requested_index(self, current: usize, last: usize) -> usize {
        match self {
            Self::First => 0,
            Self::Previous => current.saturating_sub(1),
            Self::Next => current.saturating_add(1).min(last),
            Self::Last => last,
            Self::Goto(index) => index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub page_size: PageSize,
    pub current: usize,
    pub last: usize,
}

impl PageState {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            current: 0,
            last: 0,
        }
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}
