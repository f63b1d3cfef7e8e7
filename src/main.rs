use clap::{Parser, Subcommand};
use static_press::{config, corpus, css, html, images, links, minify, output, pipeline};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "static-press")]
#[command(about = "Turns a CMS export into a deploy-ready static site")]
#[command(long_about = "\
Turns a CMS export into a deploy-ready static site

The corpus root is an ordinary directory tree — HTML documents anywhere,
images under an uploads subtree, stylesheets and scripts wherever the
export put them. No manifest is needed; membership is discovered by file
extension. Files are mutated in place, and only when a stage's acceptance
condition holds (images and minified text must come out strictly smaller).

Stages, in order:

  1. links    rewrite source-domain and root-relative references
  2. images   resize wide images, flatten alpha, re-encode (size-gated)
  3. html     lazy-loading, priority hints, srcset pruning, comment and
              empty-element cleanup, script deferral
  4. css      font-display: swap for @font-face blocks
  5. minify   best-effort HTML/CSS/JS compaction (size-gated)

Configuration is read from <root>/config.toml; every option has a stock
default. Run 'static-press gen-config' to print a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Corpus root directory
    #[arg(long, default_value = "docs", global = true)]
    root: PathBuf,

    /// Source domain to rewrite away from (overrides config.toml)
    #[arg(long, global = true)]
    domain: Option<String>,

    /// Deployment base path, e.g. /blog (overrides config.toml)
    #[arg(long, global = true)]
    base_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: links → images → html → css → minify
    Run {
        /// Write the machine-readable run report as JSON
        #[arg(long)]
        report_json: Option<PathBuf>,
    },
    /// Rewrite domain and base-path references only
    Links,
    /// Normalize images under the uploads subtree only
    Images,
    /// Run the HTML mutation engine only
    Html,
    /// Inject font-display into stylesheets only
    Css,
    /// Run the minification stage only
    Minify,
    /// Report corpus composition without mutating anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if matches!(cli.command, Command::GenConfig) {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut config = config::load_config(&cli.root)?;
    if let Some(domain) = cli.domain {
        config.domain = domain;
    }
    if let Some(base_path) = cli.base_path {
        config.base_path = base_path;
    }
    config.validate()?;
    init_thread_pool(&config.processing);

    match cli.command {
        Command::Run { report_json } => {
            let stats = pipeline::run(&cli.root, &config)?;
            println!("==> Done");
            output::print_report(&stats);
            if let Some(path) = report_json {
                let json = serde_json::to_string_pretty(&stats)?;
                std::fs::write(&path, json)?;
                println!("Report written to {}", path.display());
            }
        }
        Command::Links => {
            let stats = links::rewrite_links(&cli.root, &config);
            output::print_report(&stats);
        }
        Command::Images => {
            let stats = images::normalize_images(&cli.root, &config);
            output::print_report(&stats);
        }
        Command::Html => {
            let stats = html::rewrite_documents(&cli.root, &config);
            output::print_report(&stats);
        }
        Command::Css => {
            let stats = css::rewrite_stylesheets(&cli.root);
            output::print_report(&stats);
        }
        Command::Minify => {
            let missing = minify::Capabilities::detect().missing();
            if !missing.is_empty() {
                println!("Unavailable minifiers: {}", missing.join(", "));
            }
            let stats = minify::minify_corpus(&cli.root);
            output::print_report(&stats);
        }
        Command::Check => {
            let uploads = cli.root.join(&config.uploads_dir);
            output::print_check(
                corpus::files_of_class(&cli.root, corpus::FileClass::Html).len(),
                corpus::files_of_class(&cli.root, corpus::FileClass::Stylesheet).len(),
                corpus::files_of_class(&cli.root, corpus::FileClass::Script).len(),
                corpus::files_of_class(&uploads, corpus::FileClass::Image).len(),
            );
        }
        Command::GenConfig => unreachable!("handled above"),
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
