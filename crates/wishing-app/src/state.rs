// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::source::{
    CONNECTION_FAILED_MESSAGE, CONNECTION_FAILED_STATUS, RefreshOutcome, ReloadSequencer,
    ReloadTicket, UNKNOWN_ERROR_MESSAGE,
};
use crate::stats::{CategorySummary, summarize};
use crate::{
    AccountDataset, AccountId, BannerType, Column, ColumnFilterSet, DataSnapshot, DisplayRow,
    Navigation, PageSize, PageState, ViewerError, paginate,
};

/// One account's data plus its display-ready statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountView {
    pub dataset: AccountDataset,
    pub summaries: Vec<CategorySummary>,
}

impl From<AccountDataset> for AccountView {
    fn from(dataset: AccountDataset) -> Self {
        let summaries = summarize(&dataset);
        Self { dataset, summaries }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub status: u16,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerCommand {
    SetFilter {
        column: Column,
        key: String,
        enabled: bool,
    },
    ToggleFilter {
        column: Column,
        key: String,
    },
    SelectAccount(AccountId),
    Navigate(Navigation),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    FilterChanged {
        column: Column,
        key: String,
        enabled: bool,
    },
    FilterKeyAdded {
        column: Column,
        key: String,
    },
    AccountSelected(AccountId),
    PageChanged {
        index: usize,
        last: usize,
    },
    DataLoaded {
        accounts: usize,
    },
    LoadFailed(String),
    StaleReloadDiscarded(ReloadTicket),
    RefreshStarted,
    RefreshFinished(StatusLine),
    ReloadRequested,
}

/// Filter flags, active account and page position for the wish table.
///
/// Every mutator ends with a recompute, so [`ViewerState::page_rows`] always
/// reflects the current inputs.
#[derive(Debug, Clone)]
pub struct ViewerState {
    banner_types: Vec<BannerType>,
    accounts: BTreeMap<AccountId, AccountView>,
    selected: Option<AccountId>,
    preferred_account: Option<AccountId>,
    filters: ColumnFilterSet,
    page: PageState,
    displayed: Vec<DisplayRow>,
    filtered_count: usize,
    data_loaded: bool,
    load_failed: bool,
    request_in_progress: bool,
    status: Option<StatusLine>,
    reloads: ReloadSequencer,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

impl ViewerState {
    pub fn new(page_size: PageSize) -> Self {
        let mut state = Self {
            banner_types: Vec::new(),
            accounts: BTreeMap::new(),
            selected: None,
            preferred_account: None,
            filters: ColumnFilterSet::default(),
            page: PageState::new(page_size),
            displayed: Vec::new(),
            filtered_count: 0,
            data_loaded: false,
            load_failed: false,
            request_in_progress: false,
            status: None,
            reloads: ReloadSequencer::default(),
        };
        state.recompute();
        state
    }

    /// Account to select after a load when the current one disappears.
    pub fn with_preferred_account(mut self, account: Option<AccountId>) -> Self {
        self.preferred_account = account;
        self
    }

    pub fn dispatch(&mut self, command: ViewerCommand) -> Result<Vec<ViewerEvent>, ViewerError> {
        match command {
            ViewerCommand::SetFilter {
                column,
                key,
                enabled,
            } => self.set_filter(column, key, enabled),
            ViewerCommand::ToggleFilter { column, key } => {
                let key = self.canonical_key(column, key)?;
                let enabled = !self
                    .filters
                    .column(column)
                    .and_then(|filter| filter.is_enabled(&key))
                    .unwrap_or(false);
                self.set_filter(column, key, enabled)
            }
            ViewerCommand::SelectAccount(account) => self.select_account(account),
            ViewerCommand::Navigate(navigation) => {
                self.page.current = navigation.requested_index(self.page.current, self.page.last);
                Ok(vec![self.recompute()])
            }
        }
    }

    /// Starts a reload; pass the ticket back with its result.
    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.reloads.issue()
    }

    /// Replaces all account data. Completions older than an already applied
    /// reload are dropped.
    pub fn apply_snapshot(
        &mut self,
        ticket: ReloadTicket,
        snapshot: DataSnapshot,
    ) -> Vec<ViewerEvent> {
        if !self.reloads.accept(ticket) {
            warn!(ticket = ticket.sequence(), "discarding stale reload result");
            return vec![ViewerEvent::StaleReloadDiscarded(ticket)];
        }

        let mut events = self.discover_filter_keys(&snapshot);

        self.banner_types = snapshot.banner_type_list();
        self.accounts = snapshot
            .uids
            .into_iter()
            .map(|(account, dataset)| (account, AccountView::from(dataset)))
            .collect();
        self.data_loaded = true;
        self.load_failed = false;
        info!(
            accounts = self.accounts.len(),
            banner_types = self.banner_types.len(),
            "wish history loaded"
        );
        events.push(ViewerEvent::DataLoaded {
            accounts: self.accounts.len(),
        });

        let keep_current = self
            .selected
            .as_ref()
            .is_some_and(|account| self.accounts.contains_key(account));
        if keep_current {
            events.push(self.recompute());
            return events;
        }

        let next = self
            .preferred_account
            .as_ref()
            .filter(|account| self.accounts.contains_key(*account))
            .or_else(|| self.accounts.keys().next())
            .cloned();
        self.selected = None;
        self.page.current = 0;
        match next {
            Some(account) => {
                info!(%account, "selecting account");
                self.selected = Some(account.clone());
                events.push(ViewerEvent::AccountSelected(account));
                events.push(self.recompute());
            }
            None => events.push(self.recompute()),
        }
        events
    }

    /// Records a failed reload. Loaded data, filters and page stay as they were.
    pub fn fail_reload(&mut self, ticket: ReloadTicket, message: &str) -> Vec<ViewerEvent> {
        if !self.reloads.accept(ticket) {
            warn!(ticket = ticket.sequence(), "discarding stale reload failure");
            return vec![ViewerEvent::StaleReloadDiscarded(ticket)];
        }
        warn!(error = message, "wish history could not be loaded");
        self.load_failed = true;
        vec![ViewerEvent::LoadFailed(message.to_owned())]
    }

    pub fn begin_refresh(&mut self) -> Vec<ViewerEvent> {
        self.status = None;
        self.request_in_progress = true;
        vec![ViewerEvent::RefreshStarted]
    }

    /// Shows the updater's answer. A reachable updater always triggers a
    /// reload, whatever status it reported.
    pub fn finish_refresh(&mut self, outcome: RefreshOutcome) -> Vec<ViewerEvent> {
        self.request_in_progress = false;
        let (line, reload) = match outcome {
            RefreshOutcome::Completed(response) => (
                StatusLine {
                    status: response.status,
                    message: response
                        .message
                        .filter(|message| !message.is_empty())
                        .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_owned()),
                },
                true,
            ),
            RefreshOutcome::Unreachable => {
                warn!("history updater unreachable");
                (
                    StatusLine {
                        status: CONNECTION_FAILED_STATUS,
                        message: CONNECTION_FAILED_MESSAGE.to_owned(),
                    },
                    false,
                )
            }
        };

        self.status = Some(line.clone());
        let mut events = vec![ViewerEvent::RefreshFinished(line)];
        if reload {
            events.push(ViewerEvent::ReloadRequested);
        }
        events
    }

    /// Filters the active account's events and cuts out the current page.
    pub fn recompute(&mut self) -> ViewerEvent {
        let evaluator = self.filters.compile();
        let events = self
            .selected
            .as_ref()
            .and_then(|account| self.accounts.get(account))
            .map(|view| view.dataset.wish_history.as_slice())
            .unwrap_or(&[]);
        let filtered = evaluator.apply(events);
        let page = paginate(&filtered, self.page.page_size, self.page.current);

        debug!(
            total = events.len(),
            filtered = filtered.len(),
            page = page.page_index,
            last_page = page.last_page_index,
            "recomputed wish page"
        );

        self.filtered_count = filtered.len();
        self.page.current = page.page_index;
        self.page.last = page.last_page_index;
        self.displayed = page.rows;
        ViewerEvent::PageChanged {
            index: self.page.current,
            last: self.page.last,
        }
    }

    pub fn page_rows(&self) -> &[DisplayRow] {
        &self.displayed
    }

    pub fn current_page_index(&self) -> usize {
        self.page.current
    }

    pub fn last_page_index(&self) -> usize {
        self.page.last
    }

    pub fn page_size(&self) -> PageSize {
        self.page.page_size
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered_count
    }

    pub fn banner_types(&self) -> &[BannerType] {
        &self.banner_types
    }

    pub fn filters(&self) -> &ColumnFilterSet {
        &self.filters
    }

    pub fn account_ids(&self) -> impl Iterator<Item = &AccountId> {
        self.accounts.keys()
    }

    pub fn selected_account(&self) -> Option<&AccountId> {
        self.selected.as_ref()
    }

    pub fn active_account(&self) -> Result<(&AccountId, &AccountView), ViewerError> {
        self.selected
            .as_ref()
            .and_then(|account| self.accounts.get_key_value(account))
            .ok_or(ViewerError::NoDataLoaded)
    }

    pub fn data_loaded(&self) -> bool {
        self.data_loaded
    }

    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    pub fn request_in_progress(&self) -> bool {
        self.request_in_progress
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    fn set_filter(
        &mut self,
        column: Column,
        key: String,
        enabled: bool,
    ) -> Result<Vec<ViewerEvent>, ViewerError> {
        let key = self.canonical_key(column, key)?;
        self.filters.set_enabled(column, &key, enabled);
        Ok(vec![
            ViewerEvent::FilterChanged {
                column,
                key,
                enabled,
            },
            self.recompute(),
        ])
    }

    fn canonical_key(&self, column: Column, key: String) -> Result<String, ViewerError> {
        match self.filters.canonical_key(column, &key) {
            Some(canonical) => Ok(canonical),
            None => Err(ViewerError::MalformedKey { column, key }),
        }
    }

    fn select_account(&mut self, account: AccountId) -> Result<Vec<ViewerEvent>, ViewerError> {
        if !self.accounts.contains_key(&account) {
            return Err(ViewerError::UnknownAccount(account));
        }

        if self.selected.as_ref() != Some(&account) {
            info!(%account, "selecting account");
            self.page.current = 0;
            self.selected = Some(account.clone());
        }
        Ok(vec![ViewerEvent::AccountSelected(account), self.recompute()])
    }

    fn discover_filter_keys(&mut self, snapshot: &DataSnapshot) -> Vec<ViewerEvent> {
        let mut observed: BTreeSet<(Column, String)> = snapshot
            .banner_types
            .keys()
            .map(|id| (Column::BannerType, id.to_string()))
            .collect();
        for dataset in snapshot.uids.values() {
            for event in &dataset.wish_history {
                for column in Column::ALL {
                    observed.insert((column, column.key_for(event)));
                }
            }
        }

        observed
            .into_iter()
            .filter(|(column, key)| self.filters.add_key(*column, key, true))
            .map(|(column, key)| {
                debug!(%column, key = %key, "new filter key");
                ViewerEvent::FilterKeyAdded { column, key }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{StatusLine, ViewerCommand, ViewerEvent, ViewerState};
    use crate::source::{RefreshOutcome, RefreshResponse};
    use crate::{
        AccountDataset, AccountId, BannerTypeId, Column, DataSnapshot, ItemType, Navigation,
        PageSize, ViewerError, WishEvent,
    };
    use std::collections::BTreeMap;
    use time::macros::datetime;

    fn wish(index: usize, rarity: u8, item_type: ItemType) -> WishEvent {
        WishEvent {
            name: format!("wish {index}"),
            rarity,
            item_type,
            banner_type: BannerTypeId::new(301),
            banner_type_name: "Character Event Wish".to_owned(),
            time: datetime!(2022-01-01 00:00:00),
            pity: None,
        }
    }

    fn snapshot(accounts: &[(&str, usize)]) -> DataSnapshot {
        DataSnapshot {
            banner_types: BTreeMap::from([(
                BannerTypeId::new(301),
                "Character Event Wish".to_owned(),
            )]),
            uids: accounts
                .iter()
                .map(|(account, count)| {
                    let wish_history: Vec<WishEvent> = (0..*count)
                        .map(|index| wish(index, 3 + (index % 3) as u8, ItemType::Weapon))
                        .collect();
                    (
                        AccountId::from(*account),
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

    fn loaded(accounts: &[(&str, usize)]) -> ViewerState {
        let mut state = ViewerState::default();
        let ticket = state.begin_reload();
        state.apply_snapshot(ticket, snapshot(accounts));
        state
    }

    #[test]
    fn empty_state_shows_placeholder_page() {
        let state = ViewerState::default();
        assert_eq!(state.page_rows().len(), 10);
        assert!(state.page_rows().iter().all(|row| row.placeholder));
        assert!(!state.data_loaded());
        assert_eq!(
            state.active_account().expect_err("nothing loaded"),
            ViewerError::NoDataLoaded
        );
    }

    #[test]
    fn load_selects_first_account() {
        let state = loaded(&[("800000002", 3), ("700000001", 12)]);
        assert_eq!(state.selected_account(), Some(&AccountId::from("700000001")));
        assert_eq!(state.filtered_count(), 12);
        assert_eq!(state.last_page_index(), 1);
    }

    #[test]
    fn preferred_account_wins_on_first_load() {
        let mut state =
            ViewerState::default().with_preferred_account(Some(AccountId::from("800000002")));
        let ticket = state.begin_reload();
        state.apply_snapshot(ticket, snapshot(&[("700000001", 1), ("800000002", 2)]));
        assert_eq!(state.selected_account(), Some(&AccountId::from("800000002")));
    }

    #[test]
    fn navigation_walks_pages_and_stays_in_bounds() -> Result<(), ViewerError> {
        let mut state = loaded(&[("700000001", 25)]);

        state.dispatch(ViewerCommand::Navigate(Navigation::Previous))?;
        assert_eq!(state.current_page_index(), 0);

        state.dispatch(ViewerCommand::Navigate(Navigation::Next))?;
        state.dispatch(ViewerCommand::Navigate(Navigation::Next))?;
        state.dispatch(ViewerCommand::Navigate(Navigation::Next))?;
        assert_eq!(state.current_page_index(), 2);
        assert_eq!(
            state.page_rows().iter().filter(|row| !row.placeholder).count(),
            5
        );

        state.dispatch(ViewerCommand::Navigate(Navigation::First))?;
        assert_eq!(state.current_page_index(), 0);

        let events = state.dispatch(ViewerCommand::Navigate(Navigation::Last))?;
        assert_eq!(events, vec![ViewerEvent::PageChanged { index: 2, last: 2 }]);
        Ok(())
    }

    #[test]
    fn goto_past_end_clamps() -> Result<(), ViewerError> {
        let mut state = loaded(&[("700000001", 4)]);
        state.dispatch(ViewerCommand::Navigate(Navigation::Goto(99)))?;
        assert_eq!(state.current_page_index(), 0);
        Ok(())
    }

    #[test]
    fn filter_toggle_keeps_page_unless_clamped() -> Result<(), ViewerError> {
        let mut state = loaded(&[("700000001", 30)]);
        state.dispatch(ViewerCommand::Navigate(Navigation::Goto(1)))?;

        state.dispatch(ViewerCommand::SetFilter {
            column: Column::Rarity,
            key: "4".to_owned(),
            enabled: false,
        })?;
        assert_eq!(state.filtered_count(), 20);
        assert_eq!(state.current_page_index(), 1);

        state.dispatch(ViewerCommand::SetFilter {
            column: Column::Rarity,
            key: "5".to_owned(),
            enabled: false,
        })?;
        assert_eq!(state.filtered_count(), 10);
        assert_eq!(state.current_page_index(), 0);
        Ok(())
    }

    #[test]
    fn toggle_flips_flag() -> Result<(), ViewerError> {
        let mut state = loaded(&[("700000001", 3)]);
        let events = state.dispatch(ViewerCommand::ToggleFilter {
            column: Column::ItemType,
            key: "Weapon".to_owned(),
        })?;
        assert_eq!(
            events[0],
            ViewerEvent::FilterChanged {
                column: Column::ItemType,
                key: "Weapon".to_owned(),
                enabled: false,
            }
        );
        assert_eq!(state.filtered_count(), 0);

        state.dispatch(ViewerCommand::ToggleFilter {
            column: Column::ItemType,
            key: "Weapon".to_owned(),
        })?;
        assert_eq!(state.filtered_count(), 3);
        Ok(())
    }

    #[test]
    fn malformed_filter_key_is_rejected_without_state_change() {
        let mut state = loaded(&[("700000001", 3)]);
        let error = state
            .dispatch(ViewerCommand::SetFilter {
                column: Column::Rarity,
                key: "_x".to_owned(),
                enabled: false,
            })
            .expect_err("non-numeric rarity");
        assert!(matches!(error, ViewerError::MalformedKey { .. }));
        assert_eq!(state.filtered_count(), 3);
    }

    #[test]
    fn equivalent_key_spellings_disable_the_same_flag() -> Result<(), ViewerError> {
        for spelling in [" 4", "04"] {
            let mut state = loaded(&[("700000001", 30)]);
            let events = state.dispatch(ViewerCommand::SetFilter {
                column: Column::Rarity,
                key: spelling.to_owned(),
                enabled: false,
            })?;
            assert_eq!(
                events[0],
                ViewerEvent::FilterChanged {
                    column: Column::Rarity,
                    key: "4".to_owned(),
                    enabled: false,
                }
            );
            assert_eq!(state.filtered_count(), 20, "spelling {spelling:?}");
            assert!(
                state
                    .page_rows()
                    .iter()
                    .all(|row| row.rarity_text.chars().count() != 4)
            );
            let rarity = state.filters().column(Column::Rarity).expect("rarity column");
            assert_eq!(rarity.flags().count(), 3);
        }
        Ok(())
    }

    #[test]
    fn toggle_with_padded_key_flips_existing_flag() -> Result<(), ViewerError> {
        let mut state = loaded(&[("700000001", 3)]);
        state.dispatch(ViewerCommand::ToggleFilter {
            column: Column::ItemType,
            key: " Weapon".to_owned(),
        })?;
        assert_eq!(state.filtered_count(), 0);
        Ok(())
    }

    #[test]
    fn selecting_unknown_account_fails() {
        let mut state = loaded(&[("700000001", 3)]);
        let error = state
            .dispatch(ViewerCommand::SelectAccount(AccountId::from("1")))
            .expect_err("unknown account");
        assert_eq!(error, ViewerError::UnknownAccount(AccountId::from("1")));
    }

    #[test]
    fn reselecting_current_account_keeps_page() -> Result<(), ViewerError> {
        let mut state = loaded(&[("700000001", 30)]);
        state.dispatch(ViewerCommand::Navigate(Navigation::Last))?;
        state.dispatch(ViewerCommand::SelectAccount(AccountId::from("700000001")))?;
        assert_eq!(state.current_page_index(), 2);
        Ok(())
    }

    #[test]
    fn reload_keeps_selected_account_and_page() -> Result<(), ViewerError> {
        let mut state = loaded(&[("700000001", 30), ("800000002", 5)]);
        state.dispatch(ViewerCommand::SelectAccount(AccountId::from("800000002")))?;

        let ticket = state.begin_reload();
        state.apply_snapshot(ticket, snapshot(&[("700000001", 30), ("800000002", 25)]));
        state.dispatch(ViewerCommand::Navigate(Navigation::Last))?;

        let ticket = state.begin_reload();
        state.apply_snapshot(ticket, snapshot(&[("700000001", 30), ("800000002", 26)]));
        assert_eq!(state.selected_account(), Some(&AccountId::from("800000002")));
        assert_eq!(state.current_page_index(), 2);
        assert_eq!(state.filtered_count(), 26);
        Ok(())
    }

    #[test]
    fn failed_reload_keeps_previous_data() {
        let mut state = loaded(&[("700000001", 12)]);
        let before = state.page_rows().to_vec();

        let ticket = state.begin_reload();
        let events = state.fail_reload(ticket, "backend returned 500");
        assert_eq!(
            events,
            vec![ViewerEvent::LoadFailed("backend returned 500".to_owned())]
        );
        assert!(state.load_failed());
        assert_eq!(state.page_rows(), before.as_slice());
        assert_eq!(state.filtered_count(), 12);
    }

    #[test]
    fn refresh_completion_reports_status_and_requests_reload() {
        let mut state = ViewerState::default();
        state.begin_refresh();
        assert!(state.request_in_progress());

        let events = state.finish_refresh(RefreshOutcome::Completed(RefreshResponse {
            status: 500,
            message: None,
        }));
        let expected = StatusLine {
            status: 500,
            message: "An unknown error has occurred.".to_owned(),
        };
        assert_eq!(
            events,
            vec![
                ViewerEvent::RefreshFinished(expected.clone()),
                ViewerEvent::ReloadRequested,
            ]
        );
        assert!(!state.request_in_progress());
        assert_eq!(state.status(), Some(&expected));
    }

    #[test]
    fn unreachable_refresh_does_not_request_reload() {
        let mut state = loaded(&[("700000001", 3)]);
        state.begin_refresh();
        let events = state.finish_refresh(RefreshOutcome::Unreachable);
        assert_eq!(events.len(), 1);
        assert!(!state.request_in_progress());
        let status = state.status().expect("status shown");
        assert_eq!(status.status, 400);
        assert!(status.message.starts_with("Connection failed!"));
        assert_eq!(state.filtered_count(), 3);
    }

    #[test]
    fn begin_refresh_clears_previous_status() {
        let mut state = ViewerState::default();
        state.begin_refresh();
        state.finish_refresh(RefreshOutcome::Completed(RefreshResponse::ok("Retrieved 2 new wishes.")));
        assert!(state.status().is_some());

        state.begin_refresh();
        assert_eq!(state.status(), None);
    }

    #[test]
    fn small_page_size_is_honored() -> Result<(), ViewerError> {
        let mut state = ViewerState::new(PageSize::new(3)?);
        let ticket = state.begin_reload();
        state.apply_snapshot(ticket, snapshot(&[("700000001", 7)]));
        assert_eq!(state.page_rows().len(), 3);
        assert_eq!(state.last_page_index(), 2);
        Ok(())
    }
}
