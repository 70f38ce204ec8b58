//! `textbook`: segment, render and navigate cell-structured documents.
//!
//! Subcommands:
//!   parse   - split a document into cells and write the parsed artifact
//!   render  - render a parsed artifact and write the rendered artifact
//!   locate  - find the cell that owns a source line
//!   select  - pick a cell by index or rendered line, optionally step to a neighbour
mod logging;

use anyhow::Context;
use anyhow::Result;
use clap::ArgGroup;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use textbook::RenderConfig;
use textbook::Renderer;
use textbook::exchange;
use textbook::model::CellRange;
use textbook::model::ParsedDocument;
use textbook::navigate::ArtifactPath;
use textbook::navigate::Navigator;
use textbook::prose::TableStyle;
use textbook::segment::DEFAULT_BOUNDARY_PATTERN;
use textbook::segment::Segmenter;

#[derive(Parser, Debug)]
#[command(name = "textbook", version, about = "Render and navigate cell-structured documents")]
struct Cli {
    /// Log debug diagnostics to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Split a document into cells and write the parsed artifact
    Parse(ParseArgs),
    /// Render a parsed artifact into a rendered artifact
    Render(RenderArgs),
    /// Print the cell that contains a source line
    Locate(LocateArgs),
    /// Select a cell by index or rendered line and print it
    Select(SelectArgs),
}

#[derive(Args, Debug)]
struct ParseArgs {
    /// Document to read, or `-` for stdin
    #[arg(long, value_name = "FILE")]
    input: PathBuf,

    /// Where to write the parsed artifact
    #[arg(long, value_name = "FILE")]
    parsed_path: PathBuf,

    /// Boundary regex with one named group `cell_type`
    #[arg(long, value_name = "REGEX", default_value = DEFAULT_BOUNDARY_PATTERN)]
    boundary_pattern: String,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(long, value_name = "FILE")]
    parsed_path: PathBuf,

    #[arg(long, value_name = "FILE")]
    rendered_path: PathBuf,

    /// YAML file with render settings; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Lexer for code cells (extension or syntax name)
    #[arg(long)]
    lexer: Option<String>,

    /// Highlighting theme, or `none`
    #[arg(long)]
    theme: Option<String>,

    /// Regex removed from the start of every prose line
    #[arg(long, value_name = "REGEX")]
    comment_pattern: Option<String>,

    /// Cell header template with one `{}` slot for the cell number
    #[arg(long, value_name = "TEMPLATE")]
    cell_label: Option<String>,

    /// Header color: name, #rrggbb or 0-255
    #[arg(long, value_name = "COLOR")]
    header_color: Option<String>,

    /// Wrap width for prose and tables
    #[arg(long, value_name = "COLUMNS")]
    width: Option<u16>,

    /// `glow` or `box`
    #[arg(long, value_name = "STYLE")]
    table_style: Option<TableStyle>,

    /// Number code lines
    #[arg(long)]
    line_numbers: bool,

    /// Frame prose cells in a titled box
    #[arg(long)]
    prose_panel: bool,

    /// Write plain text without ANSI escapes
    #[arg(long)]
    no_color: bool,
}

impl RenderArgs {
    fn config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::load(path)?,
            None => RenderConfig::default(),
        };
        if let Some(lexer) = &self.lexer {
            config.lexer = lexer.clone();
        }
        if let Some(theme) = &self.theme {
            config.theme = theme.clone();
        }
        if let Some(pattern) = &self.comment_pattern {
            config.comment_pattern = pattern.clone();
        }
        if let Some(label) = &self.cell_label {
            config.cell_label = label.clone();
        }
        if let Some(color) = &self.header_color {
            config.header_color = color.clone();
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(style) = self.table_style {
            config.table_style = style;
        }
        if self.line_numbers {
            config.code_line_numbers = true;
        }
        if self.prose_panel {
            config.prose_panel = true;
        }
        if self.no_color {
            config.color = false;
        }
        Ok(config)
    }
}

#[derive(Args, Debug)]
struct LocateArgs {
    #[arg(long, value_name = "FILE")]
    parsed_path: PathBuf,

    #[arg(long, value_name = "FILE")]
    rendered_path: PathBuf,

    /// Zero-based line in the source document
    #[arg(long, value_name = "N")]
    source_line: usize,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["index", "line"])))]
struct SelectArgs {
    #[arg(long, value_name = "FILE")]
    rendered_path: PathBuf,

    /// Zero-based cell index
    #[arg(long, value_name = "I")]
    index: Option<usize>,

    /// Zero-based line in the rendered output
    #[arg(long, value_name = "N")]
    line: Option<usize>,

    /// Move to a neighbouring cell after selecting
    #[arg(long, value_enum)]
    step: Option<Step>,

    /// Fail unless the artifact was rendered from this source fingerprint
    #[arg(long, value_name = "HEX")]
    fingerprint: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Step {
    Next,
    Prev,
}

/// What navigation commands print.
#[derive(Serialize)]
struct Selection {
    index: usize,
    start: usize,
    end: usize,
}

impl Selection {
    fn new(index: usize, range: CellRange) -> Self {
        Self {
            index,
            start: range.start,
            end: range.end,
        }
    }

    fn print(&self) -> Result<()> {
        println!("{}", serde_json::to_string(self)?);
        Ok(())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Cmd::Parse(args) => cmd_parse(&args),
        Cmd::Render(args) => cmd_render(&args),
        Cmd::Locate(args) => cmd_locate(&args),
        Cmd::Select(args) => cmd_select(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    let mut text = String::new();
    if path.as_os_str() == "-" {
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
    } else {
        text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
    }
    Ok(text)
}

fn cmd_parse(args: &ParseArgs) -> Result<()> {
    let text = read_input(&args.input)?;
    // A final newline terminates the last line rather than starting a new one.
    let text = text.strip_suffix('\n').unwrap_or(&text);

    let segmenter = Segmenter::with_pattern(&args.boundary_pattern)?;
    let parsed = segmenter
        .segment_text(text)
        .with_context(|| format!("failed to segment {}", args.input.display()))?;
    exchange::save_file(&parsed, &args.parsed_path)?;
    tracing::info!(cells = parsed.len(), "wrote parsed artifact");
    Ok(())
}

fn cmd_render(args: &RenderArgs) -> Result<()> {
    let parsed: ParsedDocument = exchange::load_file(&args.parsed_path)?;
    let renderer = Renderer::new(args.config()?).context("invalid render configuration")?;
    let rendered = renderer.render(&parsed)?;
    exchange::save_file(&rendered, &args.rendered_path)?;
    tracing::info!(
        cells = rendered.len(),
        lines = rendered.line_count(),
        "wrote rendered artifact"
    );
    Ok(())
}

fn cmd_locate(args: &LocateArgs) -> Result<()> {
    let parsed: ParsedDocument = exchange::load_file(&args.parsed_path)?;
    let nav = Navigator::open(
        ArtifactPath::new(&args.rendered_path),
        &parsed,
        args.source_line,
    )?
    .with_expected_fingerprint(parsed.source_fingerprint.clone());
    Selection::new(nav.active_index(), nav.active_range()?).print()
}

fn cmd_select(args: &SelectArgs) -> Result<()> {
    let source = ArtifactPath::new(&args.rendered_path);
    let mut nav = Navigator::at_index(source, 0)?;
    if let Some(fingerprint) = &args.fingerprint {
        nav = nav.with_expected_fingerprint(fingerprint.clone());
    }

    if let Some(index) = args.index {
        nav.select_by_index(index)?;
    } else if let Some(line) = args.line {
        nav.select_by_line(line)?;
    }
    match args.step {
        Some(Step::Next) => nav.next()?,
        Some(Step::Prev) => nav.prev()?,
        None => nav.active_index(),
    };
    Selection::new(nav.active_index(), nav.active_range()?).print()
}
