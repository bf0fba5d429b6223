//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use topicpress_core::pipeline::{BuildOptions, BuildResult, ProgressReporter};
use topicpress_core::render::{RenderOptions, RenderRequest};
use topicpress_core::walker::WalkPlan;
use topicpress_shared::{AppConfig, SourceLayout, TopicNode, init_config, load_config};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// topicpress: turn a documentation checkout into a single PDF.
#[derive(Parser)]
#[command(
    name = "topicpress",
    version,
    about = "Combine a product's markdown topics into one print-ready document and render it to PDF.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Transform all topics, write the combined markdown and render the PDF.
    Build {
        /// Product identifier (defaults to the configured product).
        #[arg(short, long, env = "TOPICPRESS_PRODUCT")]
        product: Option<String>,

        /// Comma-separated document ids to exclude.
        #[arg(short, long)]
        ignore: Option<String>,

        /// Documentation checkout (defaults to <work_dir>/<product>-documentation).
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// PDF destination (defaults to <build_dir>/<product>-docs.pdf).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop after writing the combined markdown.
        #[arg(long)]
        no_render: bool,
    },

    /// Print the parsed topic tree and the documents a build would include.
    Tree {
        /// Product identifier (defaults to the configured product).
        #[arg(short, long, env = "TOPICPRESS_PRODUCT")]
        product: Option<String>,

        /// Comma-separated document ids to exclude.
        #[arg(short, long)]
        ignore: Option<String>,

        /// Documentation checkout (defaults to <work_dir>/<product>-documentation).
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = format!(
        "topicpress={level},topicpress_core={level},topicpress_markdown={level},topicpress_shared={level}"
    );

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so stdout carries only command output.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            product,
            ignore,
            source,
            output,
            no_render,
        } => {
            cmd_build(
                product.as_deref(),
                ignore.as_deref(),
                source.as_deref(),
                output.as_deref(),
                no_render,
            )
            .await
        }
        Command::Tree {
            product,
            ignore,
            source,
        } => cmd_tree(product.as_deref(), ignore.as_deref(), source.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Resolve the product and its checkout layout from flags and config.
fn resolve_source(
    config: &AppConfig,
    product: Option<&str>,
    source: Option<&Path>,
) -> Result<(String, SourceLayout)> {
    let product = product
        .map(str::trim)
        .unwrap_or(config.defaults.product.as_str())
        .to_string();
    if product.is_empty() {
        return Err(eyre!("product identifier must not be empty"));
    }

    let root = source
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.source_root(&product));
    if !root.is_dir() {
        return Err(eyre!(
            "documentation checkout '{}' is not a directory",
            root.display()
        ));
    }

    Ok((product, SourceLayout::resolve(root, &config.layout)))
}

async fn cmd_build(
    product: Option<&str>,
    ignore: Option<&str>,
    source: Option<&Path>,
    output: Option<&Path>,
    no_render: bool,
) -> Result<()> {
    let config = load_config()?;
    let (product, layout) = resolve_source(&config, product, source)?;

    let cwd = std::env::current_dir()
        .map_err(|e| eyre!("cannot determine working directory: {e}"))?;

    // The title page is rendered from the topics directory, so the logo needs
    // a path that does not depend on the working directory.
    let logo = cwd.join(config.logo_path(&product));
    if !logo.exists() {
        tracing::warn!(logo = %logo.display(), "logo image not found; title page will show a broken image");
    }

    let options = BuildOptions {
        product: product.clone(),
        layout,
        excluded: config.exclusions(ignore),
        logo,
        generated_on: chrono::Local::now().date_naive(),
    };

    info!(
        product = %product,
        source = %options.layout.root.display(),
        excluded = options.excluded.len(),
        "building documentation"
    );

    let reporter = CliProgress::new();
    let result = topicpress_core::pipeline::build_combined(&options, &reporter).await;
    if result.is_err() {
        reporter.spinner.finish_and_clear();
    }
    let result = result?;

    let pdf = if no_render || !config.render.enabled {
        None
    } else {
        let destination = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.default_pdf_path(&product));
        let request = RenderRequest {
            source: result.combined_path.clone(),
            destination: destination.clone(),
            working_dir: result.topics_dir.clone(),
            options: RenderOptions::from(&config.render),
        };

        let spinner = CliProgress::new();
        spinner.phase("Rendering PDF");
        let rendered = topicpress_core::render::render_pdf(&request).await;
        spinner.spinner.finish_and_clear();
        rendered?;

        Some(destination)
    };

    // Print summary
    println!();
    println!("  Documentation combined successfully!");
    println!("  Product:   {} {}", result.display_name, result.version);
    println!("  Documents: {}", result.documents_processed);
    println!("  Excluded:  {}", result.excluded_skipped);
    println!("  Markdown:  {}", result.combined_path.display());
    match &pdf {
        Some(path) => println!("  PDF:       {}", path.display()),
        None => println!("  PDF:       (not rendered)"),
    }
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_tree(
    product: Option<&str>,
    ignore: Option<&str>,
    source: Option<&Path>,
) -> Result<()> {
    let config = load_config()?;
    let (product, layout) = resolve_source(&config, product, source)?;

    let tree = topicpress_core::tree::load_topic_tree(&layout.tree_file).await?;
    let plan = topicpress_core::walker::collect_documents(&tree, &config.exclusions(ignore));

    info!(product = %product, nodes = tree.node_count(), "topic tree loaded");

    println!("{}", tree_report(&product, &tree, &plan)?);

    Ok(())
}

/// Pretty-printed JSON describing the tree and the documents a build would include.
fn tree_report(product: &str, tree: &TopicNode, plan: &WalkPlan) -> Result<String> {
    let report = serde_json::json!({
        "product": product,
        "tree": tree,
        "documents": plan.documents,
        "excluded": plan.excluded,
        "duplicates": plan.duplicates,
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_processed(&self, id: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Transforming [{current}/{total}] {id}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}
