/*!
 * bucketscan CLI style system
 *
 * Themed text, tables and the scan spinner shared by every subcommand.
 */

use std::time::Duration;

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};
use scan_ledger::{OpenBucketRecord, RunProgress, Stored};

// ============================================================================
// THEME COLORS
// ============================================================================

/// Brand colors for consistent styling
pub struct Theme;

impl Theme {
    /// Primary accent color (cyan)
    pub fn primary<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan()
    }

    pub fn success<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).green()
    }

    pub fn warning<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).yellow()
    }

    pub fn error<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).red()
    }

    /// Muted/secondary text (dim)
    pub fn muted<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).dim()
    }

    /// Header style (bold cyan)
    pub fn header<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan().bold()
    }
}

// ============================================================================
// ICONS
// ============================================================================

/// Unicode icons for visual feedback
pub struct Icons;

impl Icons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "⚠";
    pub const INFO: &'static str = "ℹ";
    pub const ARROW_RIGHT: &'static str = "→";
}

// ============================================================================
// TABLES
// ============================================================================

/// Create a styled data table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Create a minimal table (no outer borders)
pub fn create_minimal_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_NO_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Create a key-value table for stats
pub fn stats_table(items: &[(&str, String)]) -> Table {
    let mut table = create_minimal_table();

    for (key, value) in items {
        table.add_row(vec![
            Cell::new(key).fg(Color::Cyan),
            Cell::new(value)
                .fg(Color::White)
                .add_attribute(Attribute::Bold),
        ]);
    }

    table
}

/// Table of progress rows, newest first
pub fn runs_table(runs: &[RunProgress]) -> Table {
    let mut table = create_table();
    table.set_header(vec![
        header_cell("Run"),
        header_cell("Input"),
        header_cell("Kind"),
        header_cell("Last Line"),
        header_cell("Candidate"),
        header_cell("Status"),
        header_cell("Updated"),
    ]);

    for run in runs {
        let status = match &run.failure {
            Some(msg) => Cell::new(format!("{} {}", Icons::ERROR, msg)).fg(Color::Red),
            None => Cell::new(format!("{} ok", Icons::SUCCESS)).fg(Color::Green),
        };
        table.add_row(vec![
            Cell::new(run.id),
            Cell::new(&run.input_id),
            Cell::new(&run.process_kind).fg(Color::DarkGrey),
            Cell::new(
                run.current_line
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(run.current_candidate.as_deref().unwrap_or("-")),
            status,
            Cell::new(format_timestamp(run.updated_at)).fg(Color::DarkGrey),
        ]);
    }

    table
}

/// Table of discovered open buckets
pub fn open_buckets_table(buckets: &[Stored<OpenBucketRecord>]) -> Table {
    let mut table = create_table();
    table.set_header(vec![
        header_cell("Bucket"),
        header_cell("Region"),
        header_cell("Endpoint"),
        header_cell("Found"),
    ]);

    for bucket in buckets {
        let detail = |key: &str| {
            bucket
                .record
                .details
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or("-")
                .to_string()
        };
        table.add_row(vec![
            Cell::new(&bucket.record.bucket_name)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
            Cell::new(detail("region")),
            Cell::new(detail("url")).fg(Color::DarkGrey),
            Cell::new(format_timestamp(bucket.created_at)).fg(Color::DarkGrey),
        ]);
    }

    table
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).fg(Color::Cyan).add_attribute(Attribute::Bold)
}

// ============================================================================
// PROGRESS
// ============================================================================

/// Spinner shown while a scan runs
pub fn scan_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Format Unix epoch seconds as a UTC timestamp
pub fn format_timestamp(epoch_secs: i64) -> String {
    chrono::DateTime::from_timestamp(epoch_secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch_secs.to_string())
}

/// Format duration into human-readable string
pub fn format_duration(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor();
        let remaining = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining)
    } else {
        let hours = (secs / 3600.0).floor();
        let mins = ((secs % 3600.0) / 60.0).floor();
        format!("{}h {}m", hours, mins)
    }
}

/// Print a styled error message with optional suggestion
pub fn print_error(message: &str, suggestion: Option<&str>) {
    eprintln!(
        "\n{} {}",
        Theme::error(format!("{} Error:", Icons::ERROR)),
        message
    );

    if let Some(hint) = suggestion {
        eprintln!(
            "  {} {}",
            Theme::muted(Icons::ARROW_RIGHT),
            Theme::muted(hint)
        );
    }
    eprintln!();
}

pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        Theme::warning(Icons::WARNING.to_string()),
        Theme::warning(message)
    );
}

pub fn print_success(message: &str) {
    println!(
        "{} {}",
        Theme::success(Icons::SUCCESS.to_string()),
        Theme::success(message)
    );
}

pub fn print_info(message: &str) {
    println!("{} {}", Theme::primary(Icons::INFO.to_string()), message);
}
