// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde_json::json;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use wishing_app::history::build_snapshot;
use wishing_app::{
    AccountView, DataSnapshot, DataSource, DisplayRow, RawHistory, RefreshResponse, ViewerError,
    ViewerState,
};

const READ_FAILED_STATUS: u16 = 404;
const PARSE_FAILED_STATUS: u16 = 500;

/// Wish history stored as one JSON document on disk.
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
    known_wishes: Option<usize>,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            known_wishes: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path).with_context(|| {
            format!(
                "read history file {} -- if this path is wrong, set [data].history_path or WISHING_WELL_DATA_PATH",
                self.path.display()
            )
        })
    }

    fn parse(&self, raw: &str) -> Result<RawHistory> {
        serde_json::from_str(raw)
            .with_context(|| format!("parse history file {}", self.path.display()))
    }
}

impl DataSource for HistoryFile {
    fn load(&mut self) -> Result<DataSnapshot> {
        let history = self.parse(&self.read()?)?;
        let wishes = history.wish_count();
        debug!(path = %self.path.display(), wishes, "history file read");
        self.known_wishes = Some(wishes);
        Ok(build_snapshot(&history))
    }

    /// Re-reads the file and reports how many records appeared since the
    /// last load. An unreadable or unparsable file is a failed status
    /// carrying the reason.
    fn refresh(&mut self) -> Result<RefreshResponse> {
        let raw = match self.read() {
            Ok(raw) => raw,
            Err(error) => {
                return Ok(RefreshResponse {
                    status: READ_FAILED_STATUS,
                    message: Some(format!("{error:#}")),
                });
            }
        };
        let history = match self.parse(&raw) {
            Ok(history) => history,
            Err(error) => {
                return Ok(RefreshResponse {
                    status: PARSE_FAILED_STATUS,
                    message: Some(format!("{error:#}")),
                });
            }
        };

        let wishes = history.wish_count();
        let added = wishes.saturating_sub(self.known_wishes.unwrap_or(0));
        info!(added, total = wishes, "history file refreshed");
        Ok(RefreshResponse::ok(retrieved_message(added)))
    }
}

pub fn retrieved_message(count: usize) -> String {
    let noun = if count == 1 { "wish" } else { "wishes" };
    format!("Retrieved {count} new {noun}.")
}

const HEADERS: [&str; 6] = ["Name", "Rarity", "Type", "Banner", "Time", "Pity"];

fn row_cells(row: &DisplayRow) -> [&str; 6] {
    [
        &row.name,
        &row.rarity_text,
        &row.item_type,
        &row.banner_type_name,
        &row.time,
        &row.pity,
    ]
}

/// Plain-text rendering of the current page, padding rows included.
pub fn render_page(state: &ViewerState) -> String {
    let mut out = String::new();
    let account = state
        .selected_account()
        .map_or_else(|| "none".to_owned(), ToString::to_string);
    let _ = writeln!(
        out,
        "Account {account}  page {}/{}  ({} matching wishes)",
        state.current_page_index() + 1,
        state.last_page_index() + 1,
        state.filtered_count(),
    );

    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in state.page_rows() {
        for (width, cell) in widths.iter_mut().zip(row_cells(row)) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_line(&mut out, &HEADERS, &widths);
    for row in state.page_rows() {
        write_line(&mut out, &row_cells(row), &widths);
    }
    out
}

fn write_line(out: &mut String, cells: &[&str; 6], widths: &[usize; 6]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}

/// Statistics, pity counters and luckiest pulls for the active account.
pub fn render_stats(state: &ViewerState) -> Result<String, ViewerError> {
    let (account, view) = state.active_account()?;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Account {account}: {} wishes",
        view.dataset.total_wishes
    );
    write_summaries(&mut out, view);

    if !view.dataset.pity.is_empty() {
        let _ = writeln!(out, "Pity");
        for counter in &view.dataset.pity {
            let _ = writeln!(
                out,
                "  {:<24} 4\u{2605} {:>3}  5\u{2605} {:>3}",
                counter.name, counter.pity4, counter.pity5
            );
        }
    }

    if !view.dataset.low_pity.is_empty() {
        let _ = writeln!(out, "Luckiest 5\u{2605}");
        for entry in &view.dataset.low_pity {
            let _ = writeln!(out, "  {:<32} {:>3}", entry.name, entry.pity);
        }
    }
    Ok(out)
}

fn write_summaries(out: &mut String, view: &AccountView) {
    for summary in &view.summaries {
        let _ = write!(
            out,
            "  {:<16} {:>6}  {:>6}%",
            summary.category.label(),
            summary.total,
            summary.percent
        );
        if let Some(average) = &summary.average_pity {
            let _ = write!(out, "  avg pity {average}");
        }
        out.push('\n');
    }
}

/// Banner types and every column's filter flags, as shown next to the table.
pub fn render_filters(state: &ViewerState) -> String {
    let mut out = String::new();
    if !state.banner_types().is_empty() {
        let _ = writeln!(out, "Banner types");
        for banner in state.banner_types() {
            let _ = writeln!(out, "  {:>4}  {}", banner.id.get(), banner.name);
        }
    }

    let _ = writeln!(out, "Filters");
    for (column, filter) in state.filters().columns() {
        let flags = filter
            .flags()
            .map(|(key, enabled)| format!("[{}] {key}", if enabled { 'x' } else { ' ' }))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "  {:<10} {flags}", column.as_str());
    }
    out
}

/// The current page as JSON, for scripting.
pub fn render_json(state: &ViewerState) -> Result<String> {
    let document = json!({
        "account": state.selected_account(),
        "page": state.current_page_index(),
        "lastPage": state.last_page_index(),
        "filtered": state.filtered_count(),
        "rows": state.page_rows(),
    });
    serde_json::to_string_pretty(&document).context("encode page as JSON")
}
