// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::{AccountId, Column};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewerError {
    #[error("no data for account {0}")]
    UnknownAccount(AccountId),

    #[error("page size must be positive")]
    InvalidPageSize,

    #[error("filter key {key:?} for column {column} cannot be normalized")]
    MalformedKey { column: Column, key: String },

    #[error("loading wish history failed: {0}")]
    LoadFailure(String),

    #[error("update failed ({status}): {message}")]
    RefreshFailure { status: u16, message: String },

    #[error("no wish history loaded yet")]
    NoDataLoaded,
}
