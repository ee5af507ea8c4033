use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "carbonwise",
    version,
    about = "carbon-emission report viewer",
    long_about = "CarbonWise lists, searches, filters and sorts carbon-emission records and exports the visible rows to a PDF report.\n\nExamples:\n  carbonwise\n  carbonwise -S Critical -k emission -d asc\n  carbonwise -s vehicle -t location -t location --export\n  carbonwise -r ./records.json -o ./report.pdf --unit tCO2e\n\nTip: Use --config to persist view settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.carbonwise/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Input",
        help = "Write a default config file to ~/.carbonwise/config.yml if none exists."
    )]
    pub init_config: bool,

    #[arg(
        short = 'r',
        long = "rec",
        visible_alias = "records",
        value_name = "FILE",
        help_heading = "Input",
        help = "Load records from a JSON or YAML file instead of the built-in sample."
    )]
    pub records: Option<String>,

    #[arg(
        short = 's',
        long = "srch",
        visible_alias = "search",
        value_name = "TERM",
        help_heading = "View",
        help = "Case-insensitive search over location and source type."
    )]
    pub search: Option<String>,

    #[arg(
        short = 'S',
        long = "st",
        visible_alias = "status",
        value_name = "STATUS",
        help_heading = "View",
        help = "Status filter (All, Low, Medium, High, Critical)."
    )]
    pub status: Option<String>,

    #[arg(
        short = 'k',
        long = "sk",
        visible_alias = "sort",
        value_name = "KEY",
        help_heading = "View",
        help = "Sort key (date, category, location, emission)."
    )]
    pub sort: Option<String>,

    #[arg(
        short = 'd',
        long = "dir",
        visible_alias = "direction",
        value_name = "DIR",
        help_heading = "View",
        help = "Sort direction (asc or desc)."
    )]
    pub direction: Option<String>,

    #[arg(
        short = 't',
        long = "tg",
        visible_alias = "toggle",
        value_name = "KEY",
        action = ArgAction::Append,
        help_heading = "View",
        help = "Click a column header (repeatable): a new column sorts ascending, the same column flips direction."
    )]
    pub toggle: Vec<String>,

    #[arg(
        short = 'e',
        long = "ex",
        visible_alias = "export",
        help_heading = "Export",
        help = "Export the visible rows to carbon-emission-report.pdf."
    )]
    pub export: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Export",
        help = "Export the visible rows to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'F',
        long = "of",
        visible_alias = "format",
        value_name = "FORMAT",
        help_heading = "Export",
        help = "Export format (pdf, json, text); inferred from the file extension when omitted."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'u',
        long = "un",
        visible_alias = "unit",
        value_name = "LABEL",
        help_heading = "Export",
        help = "Emission unit label (e.g. kg, tCO2e)."
    )]
    pub unit: Option<String>,

    #[arg(
        long = "dtf",
        visible_alias = "date-format",
        value_name = "FMT",
        help_heading = "Export",
        help = "strftime format for the report generation date."
    )]
    pub date_format: Option<String>,

    #[arg(
        long = "ttl",
        visible_alias = "title",
        value_name = "TEXT",
        help_heading = "Export",
        help = "Report title."
    )]
    pub title: Option<String>,
}
