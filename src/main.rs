use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use engine::overlay::{DateFormat, GenerateOptions, generate_with};
use engine::record::{GenerationRecord, RecordError};
use engine::render::{DocumentRenderer, JsonRenderer, RenderError};
use engine::template::{Template, TemplateError, parse_template};
use engine::transform::PageDimensions;
use pdfmapper::config::{AppConfig, ConfigError, parse_date_format, parse_page_override, parse_page_size};
use pdfmapper::preview::PreviewWriter;
use pdfmapper::session::{EditorSession, SessionError};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{path}: {source}")]
    Io { path: String, source: io::Error },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "pdfmapper", about = "Fill document templates from JSON data")]
struct Cli {
    /// Log at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate overlay instructions for one data record.
    Generate(GenerateArgs),
    /// Summarize a template's fields.
    Inspect {
        #[arg(long)]
        template: PathBuf,
    },
    /// Read one JSON record per stdin line and keep a debounced preview on disk.
    Preview(PreviewArgs),
}

#[derive(Args, Debug)]
struct PageArgs {
    /// Default page size in points.
    #[arg(long, env = "PDFMAPPER_DEFAULT_PAGE_SIZE", default_value = "612x792", value_parser = parse_page_size)]
    page_size: PageDimensions,

    /// Per-page size override, e.g. `--page 2=842x595`. Repeatable.
    #[arg(long = "page", value_parser = parse_page_override)]
    pages: Vec<(u32, PageDimensions)>,

    /// How date fields are written: `as_is` or `us`.
    #[arg(long, env = "PDFMAPPER_DATE_FORMAT", default_value = "as_is", value_parser = parse_date_format)]
    date_format: DateFormat,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long)]
    template: PathBuf,

    /// Data record JSON file, or `-` for stdin.
    #[arg(long)]
    data: String,

    #[command(flatten)]
    pages: PageArgs,

    /// Output path, `-` for stdout. Defaults to `<template name>_filled.json`.
    #[arg(long)]
    output: Option<String>,

    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    #[arg(long)]
    template: PathBuf,

    #[command(flatten)]
    pages: PageArgs,

    /// Output path. Defaults to `<template name>_filled.json`.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Inspect { template } => run_inspect(&template),
        Command::Preview(args) => run_preview(args).await,
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_writer(io::stderr).init();
}

fn read_input(path: &str) -> Result<String, CliError> {
    if path == "-" {
        return io::read_to_string(io::stdin()).map_err(|source| CliError::Io { path: "<stdin>".into(), source });
    }
    fs::read_to_string(path).map_err(|source| CliError::Io { path: path.to_owned(), source })
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    fs::write(path, bytes).map_err(|source| CliError::Io { path: path.display().to_string(), source })
}

fn load_template(path: &Path) -> Result<Template, CliError> {
    let text = read_input(&path.to_string_lossy())?;
    Ok(parse_template(&text)?)
}

/// Page sizes for every template page, defaults first, then overrides.
fn page_dims(template: &Template, args: &PageArgs) -> HashMap<u32, PageDimensions> {
    let mut dims: HashMap<u32, PageDimensions> = (1..=template.page_count).map(|p| (p, args.page_size)).collect();
    dims.extend(args.pages.iter().copied());
    dims
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let template = load_template(&args.template)?;
    let record = GenerationRecord::from_json(&read_input(&args.data)?)?;
    let dims = page_dims(&template, &args.pages);

    let options = GenerateOptions { date_format: args.pages.date_format };
    let instructions = generate_with(&template.fields, &dims, &record, options);
    let renderer = JsonRenderer { pretty: args.pretty };
    let bytes = renderer.render(&instructions)?;

    match args.output.as_deref() {
        Some("-") => io::stdout()
            .write_all(&bytes)
            .map_err(|source| CliError::Io { path: "<stdout>".into(), source })?,
        Some(path) => write_output(Path::new(path), &bytes)?,
        None => write_output(Path::new(&template.output_file_name(renderer.file_extension())), &bytes)?,
    }
    info!(fields = template.fields.len(), instructions = instructions.len(), "generated");
    Ok(())
}

#[derive(Serialize)]
struct TemplateSummary<'a> {
    name: &'a str,
    version: &'a str,
    created_at: &'a str,
    page_count: u32,
    fields_per_page: BTreeMap<u32, usize>,
    keys: Vec<&'a str>,
}

fn run_inspect(path: &Path) -> Result<(), CliError> {
    let template = load_template(path)?;
    let mut fields_per_page = BTreeMap::new();
    for field in &template.fields {
        *fields_per_page.entry(field.page_number).or_insert(0) += 1;
    }
    let summary = TemplateSummary {
        name: &template.name,
        version: &template.version,
        created_at: &template.created_at,
        page_count: template.page_count,
        fields_per_page,
        keys: template.fields.iter().map(|f| f.key.as_str()).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn run_preview(args: PreviewArgs) -> Result<(), CliError> {
    let mut config = AppConfig::from_env()?;
    config.default_page_size = args.pages.page_size;
    config.date_format = args.pages.date_format;

    let template_text = read_input(&args.template.to_string_lossy())?;
    let mut session = EditorSession::new("template", 0, &config, Arc::new(JsonRenderer { pretty: true }));
    session.import_template(&template_text)?;
    for (page, dims) in &args.pages.pages {
        session.set_document_page(*page, *dims);
    }
    let output = args.output.unwrap_or_else(|| PathBuf::from(session.output_file_name()));

    let writer = PreviewWriter::spawn(session.subscribe_preview(), output.clone());

    let (tx, mut lines) = tokio::sync::mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    while let Some(line) = lines.recv().await {
        if line.trim().is_empty() {
            continue;
        }
        if let Err(e) = session.set_record_json(&line) {
            warn!(error = %e, "record rejected; keeping previous");
        }
    }

    // Only one task may write the output file at a time.
    writer.stop().await;

    if !session.record().is_empty() {
        let out = session.render_now().await?;
        write_output(&output, &out.bytes)?;
        info!(path = %output.display(), "final preview written");
    }
    session.close();
    Ok(())
}
