// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::DataSnapshot;

pub const CONNECTION_FAILED_STATUS: u16 = 400;
pub const CONNECTION_FAILED_MESSAGE: &str = "Connection failed! Try restarting Wishing Well.";
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error has occurred.";

/// What the history updater answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshResponse {
    pub status: u16,
    pub message: Option<String>,
}

impl RefreshResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: 200,
            message: Some(message.into()),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed(RefreshResponse),
    /// The updater could not be reached at all.
    Unreachable,
}

/// Where wish history comes from.
pub trait DataSource {
    fn load(&mut self) -> Result<DataSnapshot>;

    /// Asks the source to pull new history. `Err` means the request itself
    /// failed; a reachable updater reporting a problem is a `RefreshResponse`
    /// with a non-success status.
    fn refresh(&mut self) -> Result<RefreshResponse>;
}

/// Identifies one reload request. Later tickets compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReloadTicket(u64);

impl ReloadTicket {
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

/// Hands out reload tickets and decides whether a completion is stale.
#[derive(Debug, Clone, Default)]
pub struct ReloadSequencer {
    issued: u64,
    applied: Option<ReloadTicket>,
}

impl ReloadSequencer {
    pub fn issue(&mut self) -> ReloadTicket {
        self.issued += 1;
        ReloadTicket(self.issued)
    }

    /// Records `ticket` as completed unless a newer one already completed.
    pub fn accept(&mut self, ticket: ReloadTicket) -> bool {
        if self.applied.is_some_and(|applied| ticket < applied) {
            return false;
        }
        self.applied = Some(ticket);
        true
    }
}
