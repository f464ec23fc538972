//! SQL console: submission state machine, history, charts, export.
//!
//! ```text
//! Idle ──begin──▶ Submitting ──complete(Ok)──▶ Succeeded ─┐
//!   ▲                  │                                   │
//!   │                  └──complete(Err)──▶ Failed ─────────┤
//!   └──────────────── reset / next begin ◀─────────────────┘
//! ```
//!
//! The console does no I/O. The caller sends the query returned by
//! [`SqlConsole::begin`], measures elapsed time, and hands the outcome back
//! through [`SqlConsole::complete`].

pub mod chart;
pub mod export;
pub mod history;
pub mod sql;

use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

pub use chart::{CHART_ROW_LIMIT, ChartPoint, ViewMode, chart_points, charts_available};
pub use export::{to_csv, to_json};
pub use history::{HISTORY_KEY, HISTORY_LIMIT, QueryHistory, QueryHistoryItem};
pub use sql::{AdmissionError, QueryResult, Row, SqlRequest, SqlResponse, admit_query};

/// Invalid console transitions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// A query is already in flight.
    #[error("a query is already running")]
    Busy,
    /// `complete` was called with nothing in flight.
    #[error("no query is running")]
    NotSubmitting,
    /// The query text is empty.
    #[error("query is empty")]
    EmptyQuery,
}

/// Console state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConsoleState {
    #[default]
    Idle,
    Submitting {
        query: String,
    },
    Succeeded(QueryResult),
    Failed(String),
}

impl ConsoleState {
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting { .. })
    }
}

/// An SQL console session.
#[derive(Debug, Clone, Default)]
pub struct SqlConsole {
    state: ConsoleState,
    history: QueryHistory,
    view: ViewMode,
}

impl SqlConsole {
    #[must_use]
    pub fn new(history: QueryHistory) -> Self {
        Self {
            state: ConsoleState::Idle,
            history,
            view: ViewMode::Table,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ConsoleState {
        &self.state
    }

    #[must_use]
    pub const fn history(&self) -> &QueryHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// The last successful result, if the console is showing one.
    #[must_use]
    pub const fn result(&self) -> Option<&QueryResult> {
        match &self.state {
            ConsoleState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    /// The current view. Falls back to the table when charts are unavailable.
    #[must_use]
    pub fn view(&self) -> ViewMode {
        match self.result() {
            Some(result) if self.view.is_chart() && charts_available(result) => self.view,
            _ => ViewMode::Table,
        }
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
    }

    /// Start a submission. Any previous result or error is discarded.
    ///
    /// # Errors
    ///
    /// Returns `ConsoleError::Busy` while a query is in flight and
    /// `ConsoleError::EmptyQuery` for blank input.
    pub fn begin(&mut self, query: &str) -> Result<SqlRequest, ConsoleError> {
        if self.state.is_submitting() {
            return Err(ConsoleError::Busy);
        }
        if query.trim().is_empty() {
            return Err(ConsoleError::EmptyQuery);
        }
        self.state = ConsoleState::Submitting {
            query: query.to_string(),
        };
        Ok(SqlRequest {
            query: query.to_string(),
        })
    }

    /// Finish the in-flight submission.
    ///
    /// On success the result is kept and a history entry is recorded.
    ///
    /// # Errors
    ///
    /// Returns `ConsoleError::NotSubmitting` if nothing is in flight.
    pub fn complete(
        &mut self,
        outcome: Result<SqlResponse, String>,
        elapsed: Duration,
    ) -> Result<&ConsoleState, ConsoleError> {
        let ConsoleState::Submitting { query } = std::mem::take(&mut self.state) else {
            return Err(ConsoleError::NotSubmitting);
        };

        self.state = match outcome {
            Ok(response) => {
                let execution_time = elapsed.as_secs_f64() * 1000.0;
                let result = QueryResult::from_response(response, execution_time);
                self.history.record(QueryHistoryItem {
                    id: Uuid::new_v4().to_string(),
                    query,
                    timestamp: Utc::now(),
                    execution_time,
                    row_count: result.row_count,
                });
                ConsoleState::Succeeded(result)
            }
            Err(message) => ConsoleState::Failed(message),
        };
        Ok(&self.state)
    }

    /// Return to idle, dropping any result or error.
    pub fn reset(&mut self) {
        self.state = ConsoleState::Idle;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response() -> SqlResponse {
        serde_json::from_value(json!({
            "columns": ["id", "name"],
            "rows": [{"id": 1, "name": "a"}],
            "rowCount": 1
        }))
        .unwrap()
    }

    #[test]
    fn test_success_cycle_records_history() {
        let mut console = SqlConsole::default();
        let request = console.begin("select * from users").unwrap();
        assert_eq!(request.query, "select * from users");
        assert!(console.state().is_submitting());

        console
            .complete(Ok(response()), Duration::from_millis(42))
            .unwrap();
        let result = console.result().unwrap();
        assert_eq!(result.row_count, 1);
        assert!((result.execution_time - 42.0).abs() < 1e-6);

        let item = &console.history().items()[0];
        assert_eq!(item.query, "select * from users");
        assert_eq!(item.row_count, 1);

        console.reset();
        assert_eq!(console.state(), &ConsoleState::Idle);
    }

    #[test]
    fn test_failure_does_not_touch_history() {
        let mut console = SqlConsole::default();
        console.begin("select broken").unwrap();
        let state = console
            .complete(Err("syntax error".to_string()), Duration::ZERO)
            .unwrap();
        assert_eq!(state, &ConsoleState::Failed("syntax error".to_string()));
        assert!(console.history().is_empty());
    }

    #[test]
    fn test_busy_while_submitting() {
        let mut console = SqlConsole::default();
        console.begin("select 1").unwrap();
        assert_eq!(console.begin("select 2"), Err(ConsoleError::Busy));
    }

    #[test]
    fn test_complete_without_begin() {
        let mut console = SqlConsole::default();
        assert_eq!(
            console.complete(Ok(response()), Duration::ZERO),
            Err(ConsoleError::NotSubmitting)
        );
    }

    #[test]
    fn test_new_submission_from_terminal_state() {
        let mut console = SqlConsole::default();
        console.begin("select 1").unwrap();
        console
            .complete(Err("boom".to_string()), Duration::ZERO)
            .unwrap();
        assert!(console.begin("select 2").is_ok());
        assert!(console.result().is_none());
    }

    #[test]
    fn test_blank_query_rejected() {
        let mut console = SqlConsole::default();
        assert_eq!(console.begin("   "), Err(ConsoleError::EmptyQuery));
        assert_eq!(console.state(), &ConsoleState::Idle);
    }

    #[test]
    fn test_history_capped_through_console() {
        let mut console = SqlConsole::default();
        for n in 0..=HISTORY_LIMIT {
            console.begin(&format!("select {n}")).unwrap();
            console.complete(Ok(response()), Duration::ZERO).unwrap();
        }
        assert_eq!(console.history().len(), HISTORY_LIMIT);
        assert_eq!(
            console.history().items()[0].query,
            format!("select {HISTORY_LIMIT}")
        );
        assert!(
            !console
                .history()
                .items()
                .iter()
                .any(|i| i.query == "select 0")
        );
    }

    #[test]
    fn test_view_falls_back_to_table() {
        let mut console = SqlConsole::default();
        console.set_view(ViewMode::Bar);
        assert_eq!(console.view(), ViewMode::Table);

        console.begin("select name from t").unwrap();
        let text_only = serde_json::from_value(json!({
            "columns": ["name"],
            "rows": [{"name": "a"}],
            "rowCount": 1
        }))
        .unwrap();
        console.complete(Ok(text_only), Duration::ZERO).unwrap();
        assert_eq!(console.view(), ViewMode::Table);

        console.begin("select * from users").unwrap();
        console.complete(Ok(response()), Duration::ZERO).unwrap();
        assert_eq!(console.view(), ViewMode::Bar);
    }
}
