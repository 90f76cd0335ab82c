//! CLI entry point for the survey chart pipeline.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use survey_charts::{
    Aggregation, ChartConfig, ChartOutcome, ChartSpec, ChartSpecBuilder, ChartType, Dataset,
    DatasetProfile, DateNormalizer, Datum, Filter, FilterSet, Incompatibility, Period,
    PipelineConfig, SectionRules, utils::format_number,
};
use std::path::Path;
use tracing::{debug, info, warn};

/// CLI-compatible chart type enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliChartType {
    /// Binned counts of a numeric column
    Histogram,
    /// One bar per category, bin, or period
    Bar,
    /// Aggregated series in X order
    Line,
    /// Raw (x, y) pairs
    Scatter,
    /// Five-number summaries per category or bin
    Box,
}

impl From<CliChartType> for ChartType {
    fn from(cli: CliChartType) -> Self {
        match cli {
            CliChartType::Histogram => ChartType::Histogram,
            CliChartType::Bar => ChartType::Bar,
            CliChartType::Line => ChartType::Line,
            CliChartType::Scatter => ChartType::Scatter,
            CliChartType::Box => ChartType::Box,
        }
    }
}

/// CLI-compatible aggregation enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliAggregation {
    Count,
    Sum,
    Mean,
    Median,
}

impl From<CliAggregation> for Aggregation {
    fn from(cli: CliAggregation) -> Self {
        match cli {
            CliAggregation::Count => Aggregation::Count,
            CliAggregation::Sum => Aggregation::Sum,
            CliAggregation::Mean => Aggregation::Mean,
            CliAggregation::Median => Aggregation::Median,
        }
    }
}

/// CLI-compatible date period enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPeriod {
    Day,
    /// ISO week, keyed by its Monday
    Week,
    Month,
    Quarter,
    Year,
}

impl From<CliPeriod> for Period {
    fn from(cli: CliPeriod) -> Self {
        match cli {
            CliPeriod::Day => Period::Day,
            CliPeriod::Week => Period::Week,
            CliPeriod::Month => Period::Month,
            CliPeriod::Quarter => Period::Quarter,
            CliPeriod::Year => Period::Year,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Survey chart specification builder",
    long_about = "Builds a renderable chart specification from a survey CSV.\n\n\
                  EXAMPLES:\n  \
                  # Mean income per age group, with 95% confidence bounds\n  \
                  survey-charts -i survey.csv --x age_group --y income --chart bar \\\n    \
                  --aggregation mean --show-confidence\n\n  \
                  # Monthly sample counts for vaccinated participants\n  \
                  survey-charts -i survey.csv --x sample_date --chart line \\\n    \
                  --filter 'vaccinated=true'\n\n  \
                  # Inferred column types, grouped by section\n  \
                  survey-charts -i survey.csv --profile"
)]
struct Args {
    /// Path to the CSV file to chart
    #[arg(short, long)]
    input: String,

    /// X column
    #[arg(long)]
    x: Option<String>,

    /// Y column (omit for count-based charts)
    #[arg(long)]
    y: Option<String>,

    /// Chart type
    #[arg(short, long, value_enum, default_value = "bar")]
    chart: CliChartType,

    /// Aggregation applied to Y per group (forced to count without Y)
    #[arg(short, long, value_enum, default_value = "count")]
    aggregation: CliAggregation,

    /// Bin count for numeric X (defaults to the pipeline setting)
    #[arg(long)]
    bins: Option<usize>,

    /// Period for date X
    #[arg(long, value_enum, default_value = "month")]
    period: CliPeriod,

    /// Map categorical scatter axes to jittered integer positions
    #[arg(long)]
    encode_categorical: bool,

    /// Attach confidence bounds to mean aggregations
    #[arg(long)]
    show_confidence: bool,

    /// Row filter as `column=<json selection>`, repeatable
    ///
    /// Examples: `age={"min":18,"max":65}`, `sex=["f","d"]`, `vaccinated=true`,
    /// `sample_date={"start":"2021-01-01"}`. A selection that is not valid
    /// JSON is taken as a single category label.
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    /// JSON file with pipeline settings (thresholds, year window, range table)
    #[arg(short, long)]
    settings: Option<String>,

    /// Print the inferred column profile instead of building a chart
    #[arg(long)]
    profile: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the chart outcome is written.
    #[arg(long)]
    json: bool,

    /// Write the chart outcome as JSON to this file
    #[arg(short, long)]
    output: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = load_settings(args.settings.as_deref())?;
    let builder = ChartSpecBuilder::new(config);

    let dataset = Dataset::read_csv(&args.input)?;
    let profile = builder.profile(&dataset);

    if args.profile {
        return print_profile(&args, &dataset, &profile);
    }

    let chart = chart_config(&args)?;
    let filters = parse_filters(&args.filters, &profile, builder.config())?;
    if !filters.is_empty() {
        info!("Applying {} filter(s)", filters.len());
    }

    let rows = filters.apply(dataset.rows());
    let outcome = builder.build(&rows, &profile, &chart)?;

    if let Some(ref path) = args.output {
        let json = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(path, json).with_context(|| format!("Writing {path}"))?;
        info!("Chart outcome written to: {}", path);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match &outcome {
        ChartOutcome::Rendered(spec) => print_spec_summary(spec, rows.len(), dataset.len()),
        ChartOutcome::Rejected(rejection) => print_rejection(rejection),
    }
    Ok(())
}

/// Pipeline settings from `path`, or the defaults.
fn load_settings(path: Option<&str>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };

    let raw = std::fs::read_to_string(path).with_context(|| format!("Reading settings {path}"))?;
    let config: PipelineConfig =
        serde_json::from_str(&raw).with_context(|| format!("Parsing settings {path}"))?;
    config.validate()?;
    debug!("Loaded settings from {}", path);
    Ok(config)
}

fn chart_config(args: &Args) -> Result<ChartConfig> {
    let Some(ref x) = args.x else {
        bail!("--x is required unless --profile is given");
    };

    let mut chart = ChartConfig::new(x, args.chart.into())
        .with_aggregation(args.aggregation.into())
        .with_period(args.period.into())
        .with_encoded_categories(args.encode_categorical)
        .with_confidence(args.show_confidence);
    if let Some(ref y) = args.y {
        chart = chart.with_y(y);
    }
    if let Some(bins) = args.bins {
        chart = chart.with_bins(bins);
    }
    Ok(chart)
}

/// Resolve `column=<json>` arguments against the profiled column types.
fn parse_filters(
    raw: &[String],
    profile: &DatasetProfile,
    config: &PipelineConfig,
) -> Result<FilterSet> {
    let dates = DateNormalizer::from_config(config);
    let mut filters = FilterSet::new(config);

    for arg in raw {
        let (column, selection) = arg
            .split_once('=')
            .ok_or_else(|| anyhow!("Filter '{arg}' must look like column=<selection>"))?;
        let column = column.trim();
        if profile.get(column).is_none() {
            bail!("Filter column '{column}' not found in dataset");
        }

        let selection: serde_json::Value = serde_json::from_str(selection)
            .unwrap_or_else(|_| serde_json::Value::String(selection.to_string()));

        match Filter::resolve_with(column, profile.column_type(column), &selection, &dates)? {
            Some(filter) => {
                debug!(column = %filter.column, condition = ?filter.condition, "Resolved filter");
                filters.push(filter);
            }
            None => warn!("Filter on '{}' selects everything; ignored", column),
        }
    }

    Ok(filters)
}

/// Print the column profile grouped by section.
///
/// Uses `println!` for user-facing output regardless of log level.
fn print_profile(args: &Args, dataset: &Dataset, profile: &DatasetProfile) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(profile)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("COLUMN PROFILE");
    println!("{}\n", "=".repeat(80));

    println!("  File: {}", args.input);
    println!("  Rows: {}", dataset.len());
    println!("  Columns: {}", dataset.columns().len());
    println!();

    let rules = SectionRules::epidemiological();
    for section in rules.group_columns(dataset.columns()) {
        println!("{}", section.label.to_uppercase());
        println!("{}", "-".repeat(40));
        println!(
            "{:<28} {:<12} {:<10} {:<10} {:<10}",
            "Column", "Type", "Sampled", "Distinct", "Missing"
        );
        println!("{}", "-".repeat(74));
        for name in &section.columns {
            if let Some(col) = profile.get(name) {
                println!(
                    "{:<28} {:<12} {:<10} {:<10} {:<10}",
                    truncate_str(&col.name, 27),
                    col.column_type,
                    col.sampled,
                    col.distinct,
                    col.missing
                );
            }
        }
        println!();
    }

    println!("{}", "=".repeat(80));
    Ok(())
}

fn print_spec_summary(spec: &ChartSpec, retained: usize, total: usize) {
    println!();
    println!("{}", "=".repeat(80));
    println!("{} CHART", spec.chart_type.as_str().to_uppercase());
    println!("{}", "=".repeat(80));
    println!();

    println!("  Rows: {retained} of {total} after filters");
    println!("  X axis: {}", spec.x_axis.title);
    println!("  Y axis: {}", spec.y_axis.title);
    println!();

    for series in &spec.series {
        println!("Series '{}' ({} points)", series.label, series.len());
        println!("{}", "-".repeat(40));
        for (i, (x, y)) in series.x.iter().zip(&series.y).enumerate().take(25) {
            let n = series
                .counts
                .as_ref()
                .and_then(|c| c.get(i))
                .map(|n| format!("  (n={n})"))
                .unwrap_or_default();
            println!(
                "  {:<24} {}{}",
                truncate_str(&datum_text(x), 23),
                datum_text(y),
                n
            );
        }
        if series.len() > 25 {
            println!("  ... {} more", series.len() - 25);
        }
        println!();
    }

    if !spec.warnings.is_empty() {
        println!("Warnings:");
        for warning in &spec.warnings {
            println!("  - {warning}");
        }
        println!();
    }
    println!("{}", "=".repeat(80));
}

fn print_rejection(rejection: &Incompatibility) {
    println!();
    println!("{}", "=".repeat(80));
    println!("CHART REJECTED");
    println!("{}", "=".repeat(80));
    println!("  {}", rejection.reason);
    if !rejection.valid_types.is_empty() {
        let names: Vec<&str> = rejection.valid_types.iter().map(|t| t.as_str()).collect();
        println!("  Try: {}", names.join(", "));
    }
    println!("{}", "=".repeat(80));
}

fn datum_text(datum: &Datum) -> String {
    match datum {
        Datum::Number(v) => format_number(*v),
        Datum::Text(s) => s.clone(),
        Datum::Null => "-".to_string(),
    }
}

/// Truncate a string to a maximum length, adding "..." if truncated.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
