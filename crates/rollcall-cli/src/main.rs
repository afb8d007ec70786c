//! rollcall - command-line front end
//!
//! The administrative surface of the system: database initialization,
//! bulk student import, enrollment sync, roster reports and the audit
//! trail. Identities come from the operator, so every command here runs
//! as the admin principal.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rollcall_api::ImportRow;
use rollcall_config::{load_config, Settings};
use rollcall_core::{EnrollmentSync, Reporter};
use rollcall_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use rollcall_util::{default_config_path, CourseId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// rollcall - course enrollment and attendance tracking
#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(about = "Course enrollment and attendance tracking", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/rollcall/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set ROLLCALL_DATA_DIR env var)
    #[arg(short, long, env = "ROLLCALL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and its schema
    Init,

    /// Bulk-import students from a CSV file
    /// (columns: name, matric_number, entry_year, department[, transfer])
    Import {
        /// CSV file to import
        file: PathBuf,
    },

    /// Derive enrollments for every student from their placement
    Sync,

    /// Print a course roster as CSV on stdout
    Report {
        /// Course id to report on
        #[arg(long)]
        course: i64,
    },

    /// Show recent audit events, newest first
    Audit {
        /// Maximum number of events to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let settings = load_settings(&args.config)?;
    let store = open_store(&args, &settings)?;

    match args.command {
        Command::Init => cmd_init(store),
        Command::Import { file } => cmd_import(store, &settings, &file),
        Command::Sync => cmd_sync(store, &settings),
        Command::Report { course } => cmd_report(store, course),
        Command::Audit { limit } => cmd_audit(store, limit),
    }
}

/// A missing config file at the default location means defaults; a missing
/// file the operator pointed at explicitly is still an error via the
/// read failure below.
fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() && *path == default_config_path() {
        info!("No config file, using defaults");
        return Ok(Settings::default());
    }

    load_config(path).with_context(|| format!("Failed to load config from {}", path.display()))
}

fn open_store(args: &Args, settings: &Settings) -> Result<Arc<SqliteStore>> {
    let data_dir = args.data_dir.clone().unwrap_or_else(|| settings.data_dir());
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let db_path = data_dir.join("rollcall.db");
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open store at {}", db_path.display()))?;

    Ok(Arc::new(store))
}

fn cmd_init(store: Arc<SqliteStore>) -> Result<()> {
    store
        .append_audit(AuditEvent::new(AuditEventType::ServiceStarted))
        .context("Failed to write to the new database")?;

    println!("Database ready");
    Ok(())
}

fn cmd_import(store: Arc<SqliteStore>, settings: &Settings, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let rows = parse_import_csv(&content)?;

    let sync = EnrollmentSync::new(
        store,
        settings.calendar,
        settings.matric_codes.clone(),
    );
    let summary = sync.import(&rows, Utc::now().date_naive())?;

    println!(
        "Imported {} students ({} already on file, {} errors)",
        summary.added,
        summary.skipped,
        summary.errors.len()
    );
    for error in summary.errors.iter().take(10) {
        println!("  error: {error}");
    }
    if summary.errors.len() > 10 {
        println!("  ... and {} more", summary.errors.len() - 10);
    }

    Ok(())
}

fn cmd_sync(store: Arc<SqliteStore>, settings: &Settings) -> Result<()> {
    let sync = EnrollmentSync::new(
        store,
        settings.calendar,
        settings.matric_codes.clone(),
    );
    let added = sync.sync_all()?;

    println!("Added {added} enrollments");
    Ok(())
}

fn cmd_report(store: Arc<SqliteStore>, course: i64) -> Result<()> {
    let reporter = Reporter::new(store);
    let roster = reporter.roster(CourseId::new(course))?;

    let mut header = vec!["Name".to_string(), "Matric".to_string()];
    header.extend(roster.session_dates.iter().map(|d| d.to_string()));
    header.push("Present".to_string());
    header.push("Sessions".to_string());
    header.push("Percentage".to_string());
    println!("{}", csv_line(&header));

    for row in &roster.rows {
        let mut fields = vec![
            row.student_name.clone(),
            row.matric_number.clone().unwrap_or_default(),
        ];
        fields.extend(row.cells.iter().map(|c| c.as_str().to_string()));
        fields.push(row.present_count.to_string());
        fields.push(roster.session_dates.len().to_string());
        fields.push(format!("{:.1}", row.percentage));
        println!("{}", csv_line(&fields));
    }

    Ok(())
}

fn cmd_audit(store: Arc<SqliteStore>, limit: usize) -> Result<()> {
    for event in store.recent_audits(limit)? {
        let detail = serde_json::to_string(&event.event)?;
        println!("{}  {}", event.timestamp.to_rfc3339(), detail);
    }
    Ok(())
}

/// Parse the import CSV. The header row is required and matched by name,
/// so column order does not matter; `transfer` is optional.
fn parse_import_csv(content: &str) -> Result<Vec<ImportRow>> {
    let mut lines = content.lines().enumerate();

    let Some((_, header)) = lines.next() else {
        bail!("Empty import file");
    };
    let columns: Vec<String> = split_csv_line(header)
        .iter()
        .map(|c| c.trim().to_lowercase())
        .collect();

    let position = |name: &str| -> Result<usize> {
        columns
            .iter()
            .position(|c| c == name)
            .with_context(|| format!("Missing column: {name}"))
    };
    let name_col = position("name")?;
    let matric_col = position("matric_number")?;
    let year_col = position("entry_year")?;
    let dept_col = position("department")?;
    let transfer_col = columns.iter().position(|c| c == "transfer");

    let mut rows = Vec::new();
    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_csv_line(line);
        let field = |col: usize| -> Result<&str> {
            fields
                .get(col)
                .map(|s| s.trim())
                .with_context(|| format!("Line {}: too few fields", index + 1))
        };

        let entry_year: i32 = field(year_col)?
            .parse()
            .with_context(|| format!("Line {}: bad entry year", index + 1))?;
        let transfer = match transfer_col {
            Some(col) => matches!(field(col)?, "1" | "true" | "yes"),
            None => false,
        };

        rows.push(ImportRow {
            name: field(name_col)?.to_string(),
            matric_number: field(matric_col)?.to_string(),
            entry_year,
            department: field(dept_col)?.to_string(),
            transfer,
        });
    }

    Ok(rows)
}

/// Split one CSV line, honoring double-quoted fields.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

/// Join fields into one CSV line, quoting where needed.
fn csv_line(fields: &[String]) -> String {
    let escaped: Vec<String> = fields
        .iter()
        .map(|f| {
            if f.contains(',') || f.contains('"') || f.contains('\n') {
                format!("\"{}\"", f.replace('"', "\"\""))
            } else {
                f.clone()
            }
        })
        .collect();
    escaped.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_import_csv_with_header() {
        let csv = "name,matric_number,entry_year,department,transfer\n\
                   Ada,UNI/CSC/21/0001,2021,Computer Science,0\n\
                   \n\
                   Grace,UNI/CSC/21/0002,2021,Computer Science,yes\n";

        let rows = parse_import_csv(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Ada");
        assert!(!rows[0].transfer);
        assert!(rows[1].transfer);
    }

    #[test]
    fn header_order_does_not_matter() {
        let csv = "department,name,entry_year,matric_number\n\
                   Physics,Ada,2022,UNI/PHY/22/0001\n";

        let rows = parse_import_csv(csv).unwrap();
        assert_eq!(rows[0].department, "Physics");
        assert_eq!(rows[0].entry_year, 2022);
        assert!(!rows[0].transfer);
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "name,matric_number\nAda,UNI/CSC/21/0001\n";
        assert!(parse_import_csv(csv).is_err());
    }

    #[test]
    fn bad_year_names_the_line() {
        let csv = "name,matric_number,entry_year,department\n\
                   Ada,UNI/CSC/21/0001,twenty-one,Computer Science\n";

        let err = parse_import_csv(csv).unwrap_err();
        assert!(err.to_string().contains("Line 2"));
    }

    #[test]
    fn quoted_fields_round_trip() {
        let fields = split_csv_line("\"Doe, Jane\",UNI/CSC/21/0001,\"say \"\"hi\"\"\"");
        assert_eq!(fields[0], "Doe, Jane");
        assert_eq!(fields[2], "say \"hi\"");

        let line = csv_line(&[
            "Doe, Jane".to_string(),
            "plain".to_string(),
            "with \"quotes\"".to_string(),
        ]);
        assert_eq!(line, "\"Doe, Jane\",plain,\"with \"\"quotes\"\"\"");
    }
}
