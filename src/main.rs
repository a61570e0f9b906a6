use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use toolchart::analysis::analyze_data;
use toolchart::config::{EngineConfig, FailurePolicy};
use toolchart::csv_reader;
use toolchart::graph::{self, Canvas};
use toolchart::normalize::{normalize_metric, MetricSpec};
use toolchart::payload::{series_from_value, ChartRequest};
use toolchart::resolve::prepare_request;
use toolchart::runtime::{render_or_placeholder, Rendered};

#[derive(Parser, Debug)]
#[command(name = "toolchart")]
#[command(about = "Render chart payloads from tool results to JSON scenes, SVG or PNG", long_about = None)]
struct Cli {
    #[arg(short, long, global = true, help = "Log engine decisions to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a chart payload (or CSV) to a scene
    Render(RenderArgs),
    /// Normalize a metric tool result
    Metric(MetricArgs),
    /// Infer field types and a chart payload for raw data
    Analyze(AnalyzeArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Svg,
    Png,
}

#[derive(Args, Debug)]
struct EngineArgs {
    #[arg(long = "config", help = "TOML engine configuration")]
    config: Option<PathBuf>,

    #[arg(long = "fail-fast", help = "Error on unparseable values instead of coercing them")]
    fail_fast: bool,
}

impl EngineArgs {
    fn load(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if self.fail_fast {
            config.failure_policy = FailurePolicy::FailFast;
        }
        Ok(config)
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(short, long, help = "Input file (defaults to stdin)")]
    input: Option<PathBuf>,

    #[arg(long = "csv", help = "Read CSV rows instead of a JSON payload")]
    csv: bool,

    #[arg(short = 'c', long = "chart-type", help = "Chart type (line, bar, pie, scatter, multi-line, multi-bar, auto)")]
    chart_type: Option<String>,

    #[arg(short = 'x', long = "x", help = "X field (for CSV: name or 0-based index)")]
    x_field: Option<String>,

    #[arg(short = 'y', long = "y", help = "Y field (for CSV: name or 0-based index)")]
    y_field: Option<String>,

    #[arg(short = 't', long = "title", help = "Chart title")]
    title: Option<String>,

    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    format: OutputFormat,

    #[arg(long = "width", help = "Output width in pixels")]
    width: Option<u32>,

    #[arg(long = "height", help = "Output height in pixels")]
    height: Option<u32>,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct MetricArgs {
    #[arg(long = "field", required = true, help = "Metric value field, e.g. churn_rate")]
    field: String,

    #[arg(long = "trend-value", default_value = "rate", help = "Value field of trend entries")]
    trend_value: String,

    #[arg(long = "trend-label", default_value = "date", help = "Label field of trend entries")]
    trend_label: String,

    #[arg(short, long, help = "Input file (defaults to stdin)")]
    input: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[arg(short, long, help = "Input file (defaults to stdin)")]
    input: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Render(args) => handle_render(args),
        Command::Metric(args) => handle_metric(args),
        Command::Analyze(args) => handle_analyze(args),
    }
}

fn handle_render(args: RenderArgs) -> Result<()> {
    let mut config = args.engine.load()?;
    if let Some(width) = args.width {
        config.frame.width = width;
    }
    if let Some(height) = args.height {
        config.frame.height = height;
    }
    config.validate()?;

    let input = read_input(args.input.as_ref())?;
    let mut request = if args.csv {
        csv_request(&input, &args)?
    } else {
        ChartRequest::from_json_str(&input).context("Failed to parse chart payload")?
    };

    if !args.csv {
        if let Some(kind) = &args.chart_type {
            request.chart_type = kind.clone();
        }
        if let Some(x) = &args.x_field {
            request.config.x_field = Some(x.clone());
        }
        if let Some(y) = &args.y_field {
            request.config.y_field = Some(y.clone());
        }
    }
    if args.title.is_some() {
        request.title = args.title.clone();
    }

    let rendered = render_or_placeholder(&request, &config);
    let canvas = Canvas {
        width: config.frame.width,
        height: config.frame.height,
    };

    match args.format {
        OutputFormat::Json => write_json(&rendered)?,
        OutputFormat::Svg => {
            let svg = graph::render_svg(&rendered, &canvas).context("Failed to generate SVG")?;
            write_stdout(svg.as_bytes())?;
        }
        OutputFormat::Png => {
            let png = graph::render_png(&rendered, &canvas).context("Failed to generate PNG")?;
            write_stdout(&png)?;
        }
    }

    if let Rendered::Placeholder(placeholder) = &rendered {
        tracing::warn!(reason = placeholder.reason, "{}", placeholder.message);
    }
    Ok(())
}

/// CSV rows become the series; columns may be picked by index
fn csv_request(input: &str, args: &RenderArgs) -> Result<ChartRequest> {
    let data = csv_reader::read_csv(input.as_bytes()).context("Failed to read CSV input")?;

    let x_field = args
        .x_field
        .as_deref()
        .map(|x| data.column_name(csv_reader::parse_column_selector(x)))
        .transpose()
        .context("Failed to resolve X column")?;
    let y_field = args
        .y_field
        .as_deref()
        .map(|y| data.column_name(csv_reader::parse_column_selector(y)))
        .transpose()
        .context("Failed to resolve Y column")?;

    Ok(ChartRequest {
        chart_type: args.chart_type.clone().unwrap_or_else(|| "auto".to_string()),
        data: data.into_series(),
        config: toolchart::payload::FieldConfig {
            x_field,
            y_field,
            ..Default::default()
        },
        ..ChartRequest::default()
    })
}

fn handle_metric(args: MetricArgs) -> Result<()> {
    let config = args.engine.load()?;
    let input = read_input(args.input.as_ref())?;
    let result: Value = serde_json::from_str(&input).context("Failed to parse tool result")?;

    let spec = MetricSpec {
        trend_value_field: args.trend_value,
        trend_label_field: args.trend_label,
        ..MetricSpec::new(&args.field)
    };
    let metric = normalize_metric(&result, &spec, config.failure_policy)
        .with_context(|| format!("Failed to normalize metric '{}'", args.field))?;

    let chart = (!metric.series.is_empty())
        .then(|| render_or_placeholder(&metric.trend_chart(&spec), &config));
    write_json(&json!({ "metric": metric, "trend_chart": chart }))
}

fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let input = read_input(args.input.as_ref())?;
    let data: Value = serde_json::from_str(&input)
        .unwrap_or_else(|_| Value::String(input.clone()));

    let series = series_from_value(&data).context("Failed to read records")?;
    let analysis = analyze_data(&series);
    let payload = match prepare_request(&data, None, None, None, None, None) {
        Ok((request, _)) => serde_json::to_value(request)?,
        Err(err) => json!({ "error": err.reason(), "message": err.to_string() }),
    };
    write_json(&json!({ "analysis": analysis, "payload": payload }))
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file '{}'", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            if text.trim().is_empty() {
                return Err(anyhow!("No input on stdin"));
            }
            Ok(text)
        }
    }
}

fn write_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    write_stdout(text.as_bytes())?;
    write_stdout(b"\n")
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(bytes)
        .context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
