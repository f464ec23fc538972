//! SQL console commands.
//!
//! # Usage
//!
//! ```bash
//! # Run a query through the admin service and print a table
//! thala-cli sql run "select region, count(*) from communities group by region"
//!
//! # Plot the result, or export it
//! thala-cli sql run "select ..." --view bar
//! thala-cli sql run "select ..." --export csv --output result.csv
//!
//! # Show or clear the query history
//! thala-cli sql history
//! thala-cli sql history --clear
//! ```
//!
//! # Environment Variables
//!
//! - `THALA_ADMIN_URL` - Admin service base URL (default `http://127.0.0.1:3001`)
//! - `THALA_ADMIN_SESSION` - Value of the `thala_admin_session` cookie
//! - `THALA_HOME` - Directory holding the history file (default `~/.thala`)

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use reqwest::header::COOKIE;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;

use thala_admin::middleware::SESSION_COOKIE_NAME;
use thala_core::console::{
    ConsoleError, ConsoleState, HISTORY_KEY, QueryHistory, QueryResult, SqlConsole, SqlResponse,
    ViewMode, chart_points, to_csv, to_json,
};

/// Errors that can occur while running console commands.
#[derive(Debug, Error)]
pub enum SqlError {
    /// Console refused the submission.
    #[error(transparent)]
    Console(#[from] ConsoleError),

    /// The admin service or backend rejected the query.
    #[error("Query failed: {0}")]
    Query(String),

    /// Neither `THALA_HOME` nor `HOME` is set.
    #[error("Cannot locate history directory: set THALA_HOME or HOME")]
    NoHome,

    /// Reading or writing files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// History file or export could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Export format for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown export format: {s}")),
        }
    }
}

/// Options for `sql run`.
#[derive(Debug)]
pub struct RunOptions {
    pub admin_url: String,
    pub session: Option<SecretString>,
    pub view: ViewMode,
    pub export: Option<ExportFormat>,
    pub output: Option<PathBuf>,
}

// =============================================================================
// History file
// =============================================================================

/// Directory holding CLI state: `$THALA_HOME`, else `$HOME/.thala`.
fn thala_home() -> Result<PathBuf, SqlError> {
    if let Some(home) = std::env::var_os("THALA_HOME") {
        return Ok(PathBuf::from(home));
    }
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".thala"))
        .ok_or(SqlError::NoHome)
}

/// Path of the persisted history.
///
/// # Errors
///
/// Returns `SqlError::NoHome` if no home directory can be found.
pub fn history_path() -> Result<PathBuf, SqlError> {
    Ok(thala_home()?.join(format!("{HISTORY_KEY}.json")))
}

/// Load history; a missing file is an empty history, a corrupt one is
/// reported and ignored.
#[must_use]
pub fn load_history(path: &Path) -> QueryHistory {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return QueryHistory::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read query history");
            return QueryHistory::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(items) => QueryHistory::from_items(items),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed query history");
            QueryHistory::new()
        }
    }
}

/// Persist history as a JSON array, newest first.
///
/// # Errors
///
/// Returns `SqlError` if the file cannot be written.
pub fn save_history(path: &Path, history: &QueryHistory) -> Result<(), SqlError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(history.items())?)?;
    Ok(())
}

// =============================================================================
// Transport
// =============================================================================

/// Submit a query to the admin service's SQL endpoint.
///
/// Returns the response or the `error` message of a failure body.
async fn submit(
    client: &reqwest::Client,
    options: &RunOptions,
    query: &str,
) -> Result<SqlResponse, String> {
    let url = format!("{}/api/admin/sql", options.admin_url.trim_end_matches('/'));
    let mut request = client.post(&url).json(&serde_json::json!({ "query": query }));
    if let Some(session) = &options.session {
        request = request.header(
            COOKIE,
            format!("{SESSION_COOKIE_NAME}={}", session.expose_secret()),
        );
    }

    let response = request.send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    if status.is_success() {
        return response
            .json::<SqlResponse>()
            .await
            .map_err(|e| format!("Failed to parse response: {e}"));
    }

    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("error").and_then(Value::as_str).map(String::from));
    Err(message.unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16())))
}

// =============================================================================
// Rendering
// =============================================================================

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "NULL".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Plain-text table with padded columns.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn render_table(result: &QueryResult, out: &mut impl Write) -> std::io::Result<()> {
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .map(|column| cell_text(row.get(column)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let line = |values: &mut dyn Iterator<Item = &String>| {
        values
            .zip(widths.iter().copied())
            .map(|(value, width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    writeln!(out, "{}", line(&mut result.columns.iter()))?;
    writeln!(
        out,
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    )?;
    for row in &cells {
        writeln!(out, "{}", line(&mut row.iter()))?;
    }
    writeln!(
        out,
        "({} rows, {:.0} ms)",
        result.row_count, result.execution_time
    )
}

/// Horizontal bars scaled to the largest value.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn render_chart(result: &QueryResult, view: ViewMode, out: &mut impl Write) -> std::io::Result<()> {
    const WIDTH: f64 = 40.0;

    let points = chart_points(result);
    let max = points
        .iter()
        .map(|p| p.value.abs())
        .fold(0.0_f64, f64::max);
    let label_width = points
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or_default();

    writeln!(out, "[{view:?}]")?;
    for point in &points {
        let bar = if max > 0.0 {
            // Bounded by WIDTH.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let len = (point.value.abs() / max * WIDTH).round() as usize;
            "#".repeat(len)
        } else {
            String::new()
        };
        writeln!(out, "{:<label_width$} {bar} {}", point.name, point.value)?;
    }
    Ok(())
}

// =============================================================================
// Commands
// =============================================================================

/// Run a query through the console state machine and print or export it.
///
/// History is recorded on success only.
///
/// # Errors
///
/// Returns `SqlError::Query` if the query fails, or another `SqlError` if
/// output or history cannot be written.
pub async fn run(query: &str, options: &RunOptions, out: &mut impl Write) -> Result<(), SqlError> {
    let path = history_path()?;
    let mut console = SqlConsole::new(load_history(&path));
    console.set_view(options.view);

    let request = console.begin(query)?;
    tracing::debug!(admin_url = %options.admin_url, "Submitting query");

    let client = reqwest::Client::new();
    let started = Instant::now();
    let outcome = submit(&client, options, &request.query).await;
    let state = console.complete(outcome, started.elapsed())?;

    let result = match state {
        ConsoleState::Succeeded(result) => result.clone(),
        ConsoleState::Failed(message) => return Err(SqlError::Query(message.clone())),
        ConsoleState::Idle | ConsoleState::Submitting { .. } => {
            return Err(SqlError::Query("Query did not complete".to_string()));
        }
    };

    save_history(&path, console.history())?;

    if let Some(format) = options.export {
        let body = match format {
            ExportFormat::Csv => to_csv(&result),
            ExportFormat::Json => to_json(&result)?,
        };
        match &options.output {
            Some(file) => {
                std::fs::write(file, body)?;
                tracing::info!(file = %file.display(), rows = result.row_count, "Result exported");
            }
            None => writeln!(out, "{body}")?,
        }
        return Ok(());
    }

    let view = console.view();
    if view != options.view {
        tracing::warn!("Result has no numeric column; showing table");
    }
    if view.is_chart() {
        render_chart(&result, view, out)?;
    } else {
        render_table(&result, out)?;
    }
    Ok(())
}

/// List the history, or clear it.
///
/// # Errors
///
/// Returns `SqlError` if the history file cannot be located or written.
pub fn history(clear: bool, out: &mut impl Write) -> Result<(), SqlError> {
    let path = history_path()?;
    let mut history = load_history(&path);

    if clear {
        history.clear();
        save_history(&path, &history)?;
        tracing::info!("Query history cleared");
        return Ok(());
    }

    if history.is_empty() {
        tracing::info!("No queries yet");
    }
    for item in history.items() {
        writeln!(
            out,
            "{}  {:>6} rows  {:>7.0} ms  {}",
            item.timestamp.format("%Y-%m-%d %H:%M:%S"),
            item.row_count,
            item.execution_time,
            item.query
        )?;
    }
    Ok(())
}
