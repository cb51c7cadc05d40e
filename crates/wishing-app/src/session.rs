// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::warn;

use crate::source::{DataSource, RefreshOutcome};
use crate::{ViewerError, ViewerEvent, ViewerState};

/// Drives a [`ViewerState`] from a [`DataSource`], one request at a time.
pub struct ViewerSession<S> {
    source: S,
    state: ViewerState,
}

impl<S: DataSource> ViewerSession<S> {
    pub fn new(source: S, state: ViewerState) -> Self {
        Self { source, state }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ViewerState {
        &mut self.state
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_parts(self) -> (S, ViewerState) {
        (self.source, self.state)
    }

    pub fn reload(&mut self) -> Result<Vec<ViewerEvent>, ViewerError> {
        let ticket = self.state.begin_reload();
        match self.source.load() {
            Ok(snapshot) => Ok(self.state.apply_snapshot(ticket, snapshot)),
            Err(error) => {
                let message = format!("{error:#}");
                self.state.fail_reload(ticket, &message);
                Err(ViewerError::LoadFailure(message))
            }
        }
    }

    /// Asks the source for new history, then reloads when the source was
    /// reachable. Non-success statuses are returned as errors after the
    /// reload has run.
    pub fn refresh(&mut self) -> Result<Vec<ViewerEvent>, ViewerError> {
        let mut events = self.state.begin_refresh();

        let outcome = match self.source.refresh() {
            Ok(response) => RefreshOutcome::Completed(response),
            Err(error) => {
                warn!(error = %format!("{error:#}"), "refresh request failed");
                RefreshOutcome::Unreachable
            }
        };
        let succeeded = matches!(&outcome, RefreshOutcome::Completed(response) if response.is_success());

        let finished = self.state.finish_refresh(outcome);
        let reload = finished.contains(&ViewerEvent::ReloadRequested);
        events.extend(finished);
        if reload {
            events.extend(self.reload()?);
        }

        if succeeded {
            return Ok(events);
        }
        let (status, message) = self
            .state
            .status()
            .map(|line| (line.status, line.message.clone()))
            .unwrap_or_default();
        Err(ViewerError::RefreshFailure { status, message })
    }
}
