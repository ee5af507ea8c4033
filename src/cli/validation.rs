use crate::cli::args::CliArgs;
use crate::export::{self, ExportFormat};
use crate::view::{SortDirection, SortKey, StatusFilter};

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.status.as_deref() {
        raw.parse::<StatusFilter>()
            .map_err(|e| format!("invalid --status: {e}"))?;
    }
    if let Some(raw) = args.sort.as_deref() {
        raw.parse::<SortKey>()
            .map_err(|e| format!("invalid --sort: {e}"))?;
    }
    if let Some(raw) = args.direction.as_deref() {
        raw.parse::<SortDirection>()
            .map_err(|e| format!("invalid --direction: {e}"))?;
    }
    for raw in args.toggle.iter() {
        raw.parse::<SortKey>()
            .map_err(|e| format!("invalid --toggle: {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        raw.parse::<ExportFormat>()
            .map_err(|e| format!("invalid --format: {e}"))?;
    }
    if let Some(raw) = args.date_format.as_deref() {
        export::check_date_format(raw).map_err(|e| format!("invalid --date-format: {e}"))?;
    }
    if let Some(raw) = args.output.as_deref() {
        if raw.trim().is_empty() {
            return Err("invalid --output, expected a file path".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> CliArgs {
        let mut full = vec!["carbonwise"];
        full.extend_from_slice(argv);
        CliArgs::parse_from(full)
    }

    #[test]
    fn accepts_known_values() {
        let args = parse(&[
            "--status", "critical", "--sort", "emission", "-d", "asc", "-t", "location",
        ]);
        assert!(validate(&args).is_ok());
    }

    #[test]
    fn rejects_unknown_status() {
        let err = validate(&parse(&["--status", "severe"])).unwrap_err();
        assert!(err.starts_with("invalid --status"));
    }

    #[test]
    fn rejects_unknown_toggle_key() {
        let err = validate(&parse(&["-t", "date", "-t", "size"])).unwrap_err();
        assert!(err.contains("'size'"));
    }

    #[test]
    fn rejects_bad_date_format_and_empty_output() {
        assert!(validate(&parse(&["--date-format", "%Q"])).is_err());
        assert!(validate(&parse(&["-o", " "])).is_err());
    }

    #[test]
    fn rejects_date_format_chrono_cannot_render() {
        let err = validate(&parse(&["--date-format", "%#z"])).unwrap_err();
        assert!(err.starts_with("invalid --date-format"));
    }
}
