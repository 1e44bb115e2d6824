//! CLI binary for edgequake-doctools.
//!
//! A thin shim over the library crate: each subcommand maps its flags to a
//! `ToolsConfig`, drives one `ToolSession`, and writes the outputs.

use anyhow::{anyhow, bail, Context, Result};
use clap::builder::TypedValueParser;
use clap::{Args, Parser, Subcommand};
use edgequake_doctools::icon::{
    export_icon, Color, Fill, Glyph, IconSpec, IconTemplate, Shape, TextGlyph, VectorGlyph,
    DEFAULT_GRADIENT_ANGLE, TEMPLATES,
};
use edgequake_doctools::output::{format_file_size, write_output};
use edgequake_doctools::pipeline::input::check_batch_size;
use edgequake_doctools::{
    compress_files, convert_to_images, convert_to_text, inspect, merge, parse_custom_ranges,
    read_input, read_pdf, split, ConversionMode, DocToolsError, ImageFormat, InputFile,
    LopdfEngine, MarkdownClient, OutputFile, PageRenderer, PdfiumRenderer, ProgressCallback,
    ProgressTracker, QualityTier, SplitPlan, ToolProgressCallback, ToolSession, ToolState,
    ToolsConfig, ToolsConfigBuilder,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────

/// Percentage bar plus one log line per finished file.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Instant,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            started: Instant::now(),
        })
    }
}

impl ToolProgressCallback for CliProgressCallback {
    fn on_operation_start(&self, tool: &str, total_files: usize) {
        self.bar.set_prefix(tool.to_string());
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Starting {tool} of {total_files} file(s)…"))
        ));
    }

    fn on_file_start(&self, _index: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_progress(&self, percent: f32) {
        self.bar.set_position(percent.round() as u64);
    }

    fn on_file_complete(&self, index: usize, name: &str) {
        self.bar.println(format!(
            "  {} {:>3}  {}  {}",
            green("✓"),
            index,
            name,
            dim(&format!("{:.1}s", self.started.elapsed().as_secs_f64())),
        ));
    }

    fn on_operation_complete(&self, outputs: usize) {
        self.bar.finish_and_clear();
        if outputs > 0 {
            eprintln!(
                "{} {} output file(s) in {:.1}s",
                green("✔"),
                bold(&outputs.to_string()),
                self.started.elapsed().as_secs_f64()
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Compress two PDFs at low quality into ./out
  doctools compress --quality low a.pdf b.pdf -o out

  # Every page of a PDF as JPEG
  doctools convert --format jpeg report.pdf

  # PDF to Markdown through the conversion service
  doctools convert --mode text report.pdf

  # Merge in the given order
  doctools merge intro.pdf body.pdf appendix.pdf --name book.pdf

  # Split by custom ranges, or into three equal parts
  doctools split --ranges "1-3, 5, 8-10" book.pdf
  doctools split --parts 3 book.pdf

  # Any supported document to Markdown, printed to stdout
  doctools markdown --stdout notes.docx

  # 256 px icon from a template, with text instead of the default star
  doctools icon --template neon --text AB --size 256

  # Page count, version and title
  doctools inspect book.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         pdfium shared library (file or directory) for compress/convert
  DOCTOOLS_OUT_DIR        Output directory (default: current directory)
  DOCTOOLS_API_BASE       Markdown conversion service base URL
  DOCTOOLS_API_TIMEOUT    HTTP timeout in seconds for the conversion service
  RUST_LOG                Overrides the log filter

SETUP:
  compress and convert rasterise pages with pdfium. Install a pdfium build
  (e.g. from bblanchon/pdfium-binaries) and point PDFIUM_LIB_PATH at it, or
  place libpdfium on the system library path. merge, split, inspect, markdown
  and icon work without it.
"#;

/// PDF compress / convert / merge / split, file-to-Markdown, and icons.
#[derive(Parser, Debug)]
#[command(
    name = "doctools",
    version,
    about = "PDF compress/convert/merge/split, file-to-Markdown, and icon export",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Directory that receives output files.
    #[arg(short, long, global = true, env = "DOCTOOLS_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Print results as JSON on stdout.
    #[arg(long, global = true, env = "DOCTOOLS_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "DOCTOOLS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCTOOLS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCTOOLS_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rasterise each page and rebuild an image-only PDF.
    Compress {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Quality tier.
        #[arg(long, env = "DOCTOOLS_COMPRESSION_QUALITY", value_enum, default_value = "medium")]
        quality: QualityArg,

        #[command(flatten)]
        pdfium: PdfiumArgs,
    },

    /// Every page to an image, or the whole PDF to Markdown.
    Convert {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long, env = "DOCTOOLS_CONVERT_MODE", value_enum, default_value = "image")]
        mode: ModeArg,

        /// Image format (image mode).
        #[arg(long, env = "DOCTOOLS_IMAGE_FORMAT", value_enum, default_value = "png")]
        format: FormatArg,

        /// JPEG quality tier (image mode).
        #[arg(long, env = "DOCTOOLS_IMAGE_QUALITY", value_enum, default_value = "high")]
        quality: QualityArg,

        #[command(flatten)]
        pdfium: PdfiumArgs,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Merge PDFs in the order given.
    Merge {
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,

        /// Name of the merged file.
        #[arg(long, env = "DOCTOOLS_MERGE_NAME", default_value = "merged_document.pdf")]
        name: String,
    },

    /// Split one PDF by single pages (default), custom ranges, or equal parts.
    Split {
        file: PathBuf,

        /// Comma-separated ranges, e.g. "1-3, 5, 8-10".
        #[arg(long, conflicts_with = "parts")]
        ranges: Option<String>,

        /// Number of equal parts (at least 2).
        #[arg(long)]
        parts: Option<usize>,
    },

    /// Upload documents to the Markdown conversion service.
    Markdown {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print Markdown to stdout instead of writing `.md` files.
        #[arg(long)]
        stdout: bool,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Render an icon and export it as PNG.
    Icon(IconArgs),

    /// Print page count, PDF version and title.
    Inspect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct PdfiumArgs {
    /// pdfium shared library, or the directory holding it.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,
}

impl PdfiumArgs {
    fn renderer(&self) -> Arc<dyn PageRenderer> {
        match &self.pdfium_lib {
            Some(path) => Arc::new(PdfiumRenderer::with_library_path(path)),
            None => Arc::new(PdfiumRenderer::default()),
        }
    }
}

#[derive(Args, Debug)]
struct ApiArgs {
    /// Base URL of the Markdown conversion service.
    #[arg(long, env = "DOCTOOLS_API_BASE", default_value = "http://localhost:8000")]
    api_base: String,

    /// HTTP timeout in seconds (none by default).
    #[arg(long, env = "DOCTOOLS_API_TIMEOUT")]
    api_timeout: Option<u64>,
}

impl ApiArgs {
    fn apply(&self, mut builder: ToolsConfigBuilder) -> ToolsConfigBuilder {
        builder = builder.markdown_api_base(self.api_base.clone());
        if let Some(secs) = self.api_timeout {
            builder = builder.api_timeout_secs(secs);
        }
        builder
    }
}

#[derive(Args, Debug)]
struct IconArgs {
    /// Start from a JSON icon spec file.
    #[arg(long)]
    spec: Option<PathBuf>,

    /// Apply a named template (see --list-templates).
    #[arg(long)]
    template: Option<String>,

    /// List the templates and exit.
    #[arg(long)]
    list_templates: bool,

    /// Text glyph instead of the default star.
    #[arg(long, conflicts_with = "glyph_path")]
    text: Option<String>,

    /// SVG path data for a vector glyph.
    #[arg(long)]
    glyph_path: Option<String>,

    /// View box of --glyph-path as WIDTHxHEIGHT.
    #[arg(long, default_value = "512x512")]
    glyph_box: String,

    /// Glyph colour (#rgb, #rrggbb, #rrggbbaa, rgb(), rgba()).
    #[arg(long)]
    color: Option<String>,

    /// Glyph size as a percentage of the canvas.
    #[arg(long)]
    scale: Option<f32>,

    /// Clockwise glyph rotation in degrees.
    #[arg(long, allow_negative_numbers = true)]
    rotation: Option<f32>,

    /// circle, square, rounded-square or hexagon.
    #[arg(long)]
    shape: Option<Shape>,

    /// Solid background colour.
    #[arg(long, conflicts_with_all = ["gradient", "radial"])]
    background: Option<String>,

    /// Linear gradient background as START,END.
    #[arg(long, conflicts_with = "radial")]
    gradient: Option<String>,

    /// Linear gradient angle in degrees.
    #[arg(long, allow_negative_numbers = true)]
    angle: Option<f32>,

    /// Radial gradient background as START,END.
    #[arg(long)]
    radial: Option<String>,

    /// Export size in pixels.
    #[arg(long, default_value_t = 512,
          value_parser = clap::builder::PossibleValuesParser::new(["64", "128", "256", "512"])
              .map(|s| s.parse::<u32>().unwrap_or(512)))]
    size: u32,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum QualityArg {
    High,
    Medium,
    Low,
}

impl From<QualityArg> for QualityTier {
    fn from(v: QualityArg) -> Self {
        match v {
            QualityArg::High => QualityTier::High,
            QualityArg::Medium => QualityTier::Medium,
            QualityArg::Low => QualityTier::Low,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Jpeg,
    Webp,
}

impl From<FormatArg> for ImageFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Jpeg => ImageFormat::Jpeg,
            FormatArg::Webp => ImageFormat::Webp,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Image,
    Text,
}

impl From<ModeArg> for ConversionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Image => ConversionMode::PdfToImage,
            ModeArg::Text => ConversionMode::PdfToText,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let g = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs are muted while the progress bar is drawing.
    let show_progress = !g.quiet && !g.no_progress && !g.json;
    let filter = if g.verbose {
        "debug"
    } else if g.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Compress {
            files,
            quality,
            pdfium,
        } => {
            let renderer = pdfium.renderer();
            let builder = ToolsConfig::builder().compression_quality((*quality).into());
            let results = run_tool("compress", files.len(), builder, show_progress, |config| {
                async move {
                    let inputs = read_all(files, config.limits.pdf_max_bytes)?;
                    compress_files(inputs, renderer, &config).await
                }
            })
            .await?;

            if g.json {
                print_json(&results)?;
            }
            for r in &results {
                let path = save(&g.out_dir, &r.file)?;
                if !g.quiet && !g.json {
                    let ratio = format!("{:.1}%", r.ratio_percent);
                    eprintln!(
                        "{}  {} → {}  {}  →  {}",
                        if r.ratio_percent >= 0.0 { green("✔") } else { cyan("⚠") },
                        format_file_size(r.original_size),
                        format_file_size(r.compressed_size),
                        if r.ratio_percent >= 0.0 { dim(&ratio) } else { red(&ratio) },
                        bold(&path.display().to_string()),
                    );
                }
            }
        }

        Command::Convert {
            files,
            mode,
            format,
            quality,
            pdfium,
            api,
        } => {
            let builder = api.apply(
                ToolsConfig::builder()
                    .image_format((*format).into())
                    .image_quality((*quality).into()),
            );

            if ConversionMode::from(*mode) == ConversionMode::PdfToText {
                let results = run_tool("convert", files.len(), builder, show_progress, |config| {
                    async move {
                        let inputs = read_all(files, config.limits.pdf_max_bytes)?;
                        let client = MarkdownClient::new(&config)?;
                        convert_to_text(inputs, &client, &config).await
                    }
                })
                .await?;
                if g.json {
                    print_json(&results)?;
                }
                for r in &results {
                    let path = save(&g.out_dir, &r.to_output_file())?;
                    report_written(g, &path, &r.success_message());
                }
            } else {
                let renderer = pdfium.renderer();
                let documents =
                    run_tool("convert", files.len(), builder, show_progress, |config| {
                        async move {
                            let inputs = read_all(files, config.limits.pdf_max_bytes)?;
                            convert_to_images(inputs, renderer, &config).await
                        }
                    })
                    .await?;
                if g.json {
                    print_json(&documents)?;
                }
                for doc in &documents {
                    for page in &doc.pages {
                        let path = save(&g.out_dir, page)?;
                        report_written(g, &path, &format_file_size(page.size()));
                    }
                }
            }
        }

        Command::Merge { files, name } => {
            let builder = ToolsConfig::builder().merge_output_name(name.clone());
            let paths = files.clone();
            let merged = run_tool("merge", files.len(), builder, show_progress, |config| {
                blocking(move || {
                    let limit = config.limits.merge_total_max_bytes;
                    check_batch_size(&paths, limit)?;
                    let inputs = read_all(&paths, limit)?;
                    let tracker = tracker_for(&config);
                    merge(
                        &LopdfEngine,
                        &inputs,
                        &config.merge_output_name,
                        &config.limits,
                        &tracker,
                    )
                })
            })
            .await?;

            if g.json {
                print_json(&merged)?;
            }
            let path = save(&g.out_dir, &merged)?;
            report_written(g, &path, &format_file_size(merged.size()));
        }

        Command::Split {
            file,
            ranges,
            parts,
        } => {
            let plan = match (ranges, parts) {
                (Some(r), _) => SplitPlan::CustomRanges(
                    parse_custom_ranges(r).context("Invalid --ranges")?,
                ),
                (None, Some(n)) => SplitPlan::EqualParts(*n),
                (None, None) => SplitPlan::SinglePages,
            };
            let path = file.clone();
            let outputs = run_tool("split", 1, ToolsConfig::builder(), show_progress, |config| {
                blocking(move || {
                    let input = read_pdf(&path, config.limits.pdf_max_bytes)?;
                    let tracker = tracker_for(&config);
                    split(&LopdfEngine, &input, &plan, &config.limits, &tracker)
                })
            })
            .await?;

            if g.json {
                print_json(&outputs)?;
            }
            for out in &outputs {
                let path = save(&g.out_dir, out)?;
                report_written(g, &path, &format_file_size(out.size()));
            }
        }

        Command::Markdown { files, stdout, api } => {
            let builder = api.apply(ToolsConfig::builder());
            let paths = files.clone();
            let results = run_tool("markdown", files.len(), builder, show_progress, |config| {
                async move {
                    let client = MarkdownClient::new(&config)?;
                    let callback = config.progress_callback.clone();
                    let tracker = ProgressTracker::new(callback, config.cancel.clone());
                    tracker.callback().on_operation_start("markdown", paths.len());
                    let mut results = Vec::with_capacity(paths.len());
                    for (i, path) in paths.iter().enumerate() {
                        tracker.checkpoint()?;
                        let name = path.display().to_string();
                        tracker.callback().on_file_start(i + 1, &name);
                        results.push(client.convert_path(path).await?);
                        tracker.file(i, paths.len()).finished();
                        tracker.callback().on_file_complete(i + 1, &name);
                    }
                    tracker.callback().on_operation_complete(results.len());
                    Ok::<_, DocToolsError>(results)
                }
            })
            .await?;

            if g.json {
                print_json(&results)?;
            } else if *stdout {
                for r in &results {
                    println!("{}", r.markdown.trim_end_matches('\n'));
                }
            }
            if !*stdout {
                for r in &results {
                    let path = save(&g.out_dir, &r.to_output_file())?;
                    report_written(g, &path, &r.success_message());
                }
            }
        }

        Command::Icon(args) => run_icon(g, args)?,

        Command::Inspect { files } => {
            let limits = ToolsConfig::default().limits;
            let mut infos = Vec::with_capacity(files.len());
            for path in files {
                let input = read_pdf(path, limits.pdf_max_bytes)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                infos.push(inspect(&input).context("Failed to inspect PDF")?);
            }
            if g.json {
                print_json(&infos)?;
            } else {
                for info in &infos {
                    println!("File:         {}", info.name);
                    if let Some(ref t) = info.title {
                        println!("Title:        {}", t);
                    }
                    println!("Pages:        {}", info.page_count);
                    println!("PDF Version:  {}", info.pdf_version);
                    println!("Size:         {}", format_file_size(info.size));
                }
            }
        }
    }

    Ok(())
}

/// Drive one tool run through a [`ToolSession`]; Ctrl-C cancels it.
async fn run_tool<R, F, Fut>(
    tool: &'static str,
    files: usize,
    builder: ToolsConfigBuilder,
    show_progress: bool,
    op: F,
) -> Result<R>
where
    F: FnOnce(ToolsConfig) -> Fut,
    Fut: Future<Output = Result<R, DocToolsError>>,
{
    let mut session = ToolSession::new(tool);
    session.select_files(files)?;
    let token = session.begin()?;

    let mut builder = builder.cancel_token(token);
    if show_progress {
        builder = builder.progress_callback(CliProgressCallback::new() as ProgressCallback);
    }
    let config = builder.build().context("Invalid configuration")?;

    let op = op(config);
    tokio::pin!(op);
    let outcome = tokio::select! {
        out = &mut op => out,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("{} cancelling after the current step…", cyan("⚠"));
            session.cancel()?;
            op.await
        }
    };

    session.complete(outcome)?;
    match session.into_state() {
        ToolState::Succeeded(r) => Ok(r),
        ToolState::Failed(msg) => Err(anyhow!("{tool} failed: {msg}")),
        _ => bail!("{tool} cancelled"),
    }
}

/// Run a synchronous lopdf operation off the async executor.
async fn blocking<R, F>(f: F) -> Result<R, DocToolsError>
where
    F: FnOnce() -> Result<R, DocToolsError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DocToolsError::Internal(format!("spawn_blocking panicked: {e}")))?
}

fn tracker_for(config: &ToolsConfig) -> ProgressTracker {
    ProgressTracker::new(config.progress_callback.clone(), config.cancel.clone())
}

fn read_all(paths: &[PathBuf], limit: u64) -> Result<Vec<InputFile>, DocToolsError> {
    paths.iter().map(|p| read_input(p, limit)).collect()
}

fn save(dir: &Path, file: &OutputFile) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    Ok(write_output(dir, file)?)
}

fn report_written(g: &GlobalArgs, path: &Path, detail: &str) {
    if !g.quiet && !g.json {
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&path.display().to_string()),
            dim(detail)
        );
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialise output")?
    );
    Ok(())
}

// ── icon ─────────────────────────────────────────────────────────────────

fn run_icon(g: &GlobalArgs, args: &IconArgs) -> Result<()> {
    if args.list_templates {
        for t in &TEMPLATES {
            println!("{:<14} {:?}  scale {}%", t.name, t.shape, t.glyph_scale_percent);
        }
        return Ok(());
    }

    let spec = icon_spec(args)?;
    let export = export_icon(&spec, args.size).context("Icon export failed")?;

    if g.json {
        print_json(&export)?;
    }
    let file = OutputFile::new(export.filename.clone(), "image/png", export.png.clone());
    let path = save(&g.out_dir, &file)?;
    report_written(
        g,
        &path,
        &format!("{}×{} {}", export.size, export.size, format_file_size(file.size())),
    );
    Ok(())
}

/// Spec file (or default), then template, then individual flags.
fn icon_spec(args: &IconArgs) -> Result<IconSpec> {
    let mut spec = match &args.spec {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read icon spec {}", path.display()))?;
            serde_json::from_str(&json).context("Invalid icon spec JSON")?
        }
        None => IconSpec::default(),
    };

    if let Some(name) = &args.template {
        let template = IconTemplate::by_name(name).ok_or_else(|| {
            let names: Vec<_> = TEMPLATES.iter().map(|t| t.name).collect();
            anyhow!("Unknown template '{name}' (available: {})", names.join(", "))
        })?;
        template.apply(&mut spec);
    }

    if let Some(text) = &args.text {
        spec.glyph = Glyph::Text(TextGlyph::new(text.clone()));
    } else if let Some(path) = &args.glyph_path {
        let (width, height) = parse_box(&args.glyph_box)?;
        spec.glyph = Glyph::Vector(VectorGlyph {
            width,
            height,
            path: path.clone(),
        });
    }

    if let Some(c) = &args.color {
        spec.glyph_color = parse_color(c)?;
    }
    if let Some(s) = args.scale {
        spec.glyph_scale_percent = s;
    }
    if let Some(r) = args.rotation {
        spec.rotation_degrees = r;
    }
    if let Some(shape) = args.shape {
        spec.shape = shape;
    }

    let current_angle = match spec.fill {
        Fill::LinearGradient { angle, .. } => angle,
        _ => DEFAULT_GRADIENT_ANGLE,
    };
    if let Some(c) = &args.background {
        spec.fill = Fill::Solid {
            color: parse_color(c)?,
        };
    } else if let Some(pair) = &args.gradient {
        let (start, end) = parse_pair(pair)?;
        spec.fill = Fill::LinearGradient {
            start,
            end,
            angle: args.angle.unwrap_or(current_angle),
        };
    } else if let Some(pair) = &args.radial {
        let (start, end) = parse_pair(pair)?;
        spec.fill = Fill::RadialGradient { start, end };
    } else if let (Some(a), Fill::LinearGradient { angle, .. }) = (args.angle, &mut spec.fill) {
        *angle = a;
    }

    spec.validate().context("Invalid icon spec")?;
    Ok(spec)
}

fn parse_color(s: &str) -> Result<Color> {
    s.parse::<Color>()
        .with_context(|| format!("Invalid colour '{s}'"))
}

/// `START,END` where either colour may itself be `rgb(...)`.
fn parse_pair(s: &str) -> Result<(Color, Color)> {
    let mut depth = 0usize;
    let split_at = s.char_indices().find_map(|(i, c)| {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some(i),
            _ => {}
        }
        None
    });
    let i = split_at.ok_or_else(|| anyhow!("Expected START,END colours, got '{s}'"))?;
    Ok((parse_color(&s[..i])?, parse_color(&s[i + 1..])?))
}

fn parse_box(s: &str) -> Result<(u32, u32)> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("Expected WIDTHxHEIGHT, got '{s}'"))?;
    Ok((
        w.trim().parse().context("Invalid glyph box width")?,
        h.trim().parse().context("Invalid glyph box height")?,
    ))
}
