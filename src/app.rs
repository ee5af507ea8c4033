use std::path::{Path, PathBuf};

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use itertools::Itertools;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::export::{self, ExportFormat, ExportOptions, COLUMN_COUNT};
use crate::store::{EmissionRecord, RecordStore, Status};
use crate::view::{SortDirection, SortKey, StatusFilter, Summary, ViewState};

fn print_banner() {
    println!(
        "{} {}",
        "CarbonWise".bold().green(),
        format!("v{} - emission reports", env!("CARGO_PKG_VERSION")).white()
    );
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn format_opt_value<'a>(v: &'a str, default: &'a str) -> &'a str {
    if v.trim().is_empty() {
        default
    } else {
        v
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    verbose: u8,
    no_color: bool,
    records_path: Option<String>,
    state: ViewState,
    toggles: Vec<SortKey>,
    export_path: Option<PathBuf>,
    export: ExportOptions,
}

fn parse_setting<T: std::str::FromStr>(
    raw: Option<String>,
    default: T,
    flag: &str,
) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| format!("invalid {flag}: {e}")),
        None => Ok(default),
    }
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let records_path = args
        .records
        .or(cfg.records)
        .filter(|p| !p.trim().is_empty())
        .map(|p| config::expand_tilde_string(&p));

    let search = args.search.or(cfg.search).unwrap_or_default();
    let status_filter = parse_setting(args.status.or(cfg.status), StatusFilter::All, "status")?;
    let sort_key = parse_setting(args.sort.or(cfg.sort), SortKey::Date, "sort")?;
    let direction = parse_setting(
        args.direction.or(cfg.direction),
        SortDirection::Descending,
        "direction",
    )?;

    let mut state = ViewState {
        search,
        status_filter,
        sort_key,
        direction,
    };
    let mut toggles: Vec<SortKey> = Vec::with_capacity(args.toggle.len());
    for raw in args.toggle.iter() {
        let key = parse_setting(Some(raw.clone()), SortKey::Date, "toggle")?;
        state.toggle_sort(key);
        toggles.push(key);
    }

    let export_path = match args.output.or(cfg.output) {
        Some(path) => Some(config::expand_tilde(&path)),
        None if args.export => Some(PathBuf::from(export::DEFAULT_FILE_NAME)),
        None => None,
    };

    let format = match args.output_format.or(cfg.output_format) {
        Some(raw) => raw
            .parse::<ExportFormat>()
            .map_err(|e| format!("invalid output format: {e}"))?,
        None => export_path
            .as_ref()
            .and_then(|p| export::infer_format_from_path(&p.to_string_lossy()))
            .unwrap_or_default(),
    };

    let date_format = args
        .date_format
        .or(cfg.date_format)
        .unwrap_or_else(|| export::DEFAULT_DATE_FORMAT.to_string());
    export::check_date_format(&date_format).map_err(|e| e.to_string())?;

    let export = ExportOptions {
        format,
        title: args
            .title
            .or(cfg.title)
            .unwrap_or_else(|| export::DEFAULT_TITLE.to_string()),
        unit: Some(
            args.unit
                .or(cfg.emission_unit)
                .unwrap_or_else(|| export::DEFAULT_UNIT.to_string()),
        ),
        date_format,
    };

    Ok(RunConfig {
        verbose: args.verbose,
        no_color,
        records_path,
        state,
        toggles,
        export_path,
        export,
    })
}

fn status_cell(status: Status, padded: String, color: bool) -> String {
    if !color {
        return padded;
    }
    match status {
        Status::Critical => padded.red().bold().to_string(),
        Status::High => padded.bright_red().to_string(),
        Status::Medium => padded.yellow().to_string(),
        Status::Low => padded.green().to_string(),
    }
}

fn summary_line(summary: &Summary) -> String {
    format!(
        "Total Records: {}  Critical Alerts: {}  Safe Levels: {}",
        summary.total, summary.critical, summary.low
    )
}

fn table_lines(visible: &[&EmissionRecord], unit: Option<&str>, color: bool) -> Vec<String> {
    let columns = export::column_headers(unit);
    let rows: Vec<[String; COLUMN_COUNT]> = visible.iter().map(|r| export::format_row(r)).collect();
    let widths = export::text_widths(&columns, &rows);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let header = export::pad_cells(&columns, &widths).join("  ");
    lines.push(if color {
        header.bold().to_string()
    } else {
        header
    });
    lines.push(export::rule_line(&widths));
    for (record, row) in visible.iter().zip(rows.iter()) {
        let line = export::pad_cells(row, &widths)
            .enumerate()
            .map(|(i, cell)| {
                if i == COLUMN_COUNT - 1 {
                    status_cell(record.status, cell, color)
                } else {
                    cell
                }
            })
            .join("  ");
        lines.push(line.trim_end().to_string());
    }
    lines
}

fn print_settings(run: &RunConfig, store: &RecordStore) {
    format_kv_line(
        "Records",
        &format!(
            "{} ({})",
            store.len(),
            run.records_path.as_deref().unwrap_or("built-in sample")
        ),
    );
    format_kv_line("Search", format_opt_value(&run.state.search, "-"));
    format_kv_line("Status", run.state.status_filter.label());
    format_kv_line(
        "Sort",
        &format!("{} {}", run.state.sort_key, run.state.direction),
    );
    if let Some(path) = run.export_path.as_ref() {
        format_kv_line(
            "Export",
            &format!("{} ({})", path.display(), run.export.format.label()),
        );
    }
    println!();
}

fn run_report(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();

    let store = match run.records_path.as_deref() {
        Some(path) => RecordStore::load(Path::new(path))
            .map_err(|e| format!("failed to load records '{path}': {e}"))?,
        None => RecordStore::sample(),
    };

    if run.verbose > 0 {
        print_settings(&run, &store);
    }
    if run.verbose > 1 {
        for key in run.toggles.iter() {
            println!(":: header click: {key}");
        }
    }

    let visible = run.state.apply(store.records());
    let summary = Summary::of(&visible);

    println!("{}", summary_line(&summary).bold());
    println!();
    if visible.is_empty() {
        println!("{}", "No records match your filters.".dimmed());
    } else {
        for line in table_lines(&visible, run.export.unit.as_deref(), !run.no_color) {
            println!("{line}");
        }
    }

    if let Some(path) = run.export_path.as_ref() {
        let saved = export::export(&visible, run.state.status_filter, &run.export, path)
            .map_err(|e| format!("export failed: {e}"))?;
        println!();
        println!(
            ":: {} :: {} rows written to {} ::",
            "Exported".green(),
            visible.len(),
            saved.display()
        );
    }

    Ok(())
}

fn init_config() -> Result<(), String> {
    let path = config::default_config_path()
        .ok_or_else(|| "could not determine home directory".to_string())?;
    if config::ensure_default_config_file(&path)? {
        println!(":: wrote default config to {}", path.display());
    } else {
        println!(":: config already exists at {}", path.display());
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    if args.init_config {
        return init_config();
    }

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => ConfigFile::default(),
    };

    let run = build_run_config(args, cfg)?;
    run_report(run)
}
