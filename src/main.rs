use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use viewgen::builtin::ViewRegistry;
use viewgen::config::{self, SiteConfig};
use viewgen::output;
use viewgen::site::Site;

#[derive(Parser)]
#[command(name = "viewgen")]
#[command(about = "Serve a site live or generate it as static files")]
#[command(long_about = "\
Serve a site live or generate it as static files

A site is a list of files in site.toml, each bound to a view that
produces its contents. `serve` renders them on every request; `generate`
writes them once into a directory tree.

Project structure:

  site.toml                 # Manifest and settings
  templates/                # Templates for the `template` view
  static/                   # Files for `static_file` entries or [[directories]]

Paths ending in / (and the empty path) are completed with index_file:
  \"\"       → index.html
  \"docs/\"  → docs/index.html

Run 'viewgen gen-config' to generate a documented site.toml.")]
#[command(version)]
struct Cli {
    /// Project directory containing site.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log per-file and per-request detail (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write every file into an output directory (its contents are replaced)
    Generate {
        /// Output directory [default: generate.output from site.toml]
        outdir: Option<PathBuf>,
    },
    /// Serve the site over HTTP, rendering on every request
    Serve {
        /// Listen address [default: serve.bind from site.toml]
        addr: Option<SocketAddr>,
    },
    /// Load site.toml, build and complete the manifest, and list it
    Check,
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Generate { outdir } => {
            let (config, site) = load_site(&cli.root)?;
            let outdir = outdir.unwrap_or_else(|| cli.root.join(&config.generate.output));
            let report = site.generate(&outdir)?;
            output::print_generate_output(&report, &outdir);
        }
        Command::Serve { addr } => {
            let (config, site) = load_site(&cli.root)?;
            let addr = match addr {
                Some(addr) => addr,
                None => config.serve.bind_addr()?,
            };
            println!("Serving on http://{addr}/ (Ctrl-C to stop)");
            site.serve(addr)?;
        }
        Command::Check => {
            let (_, mut site) = load_site(&cli.root)?;
            site.complete()?;
            output::print_manifest(site.manifest(), site.index_file());
            println!("==> Site is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_site(root: &Path) -> Result<(SiteConfig, Site), config::ConfigError> {
    let config = config::load_config(root)?;
    let site = config::build_site(&config, root, &ViewRegistry::builtin())?;
    Ok((config, site))
}

/// Logs go to stderr so `gen-config` output can be redirected cleanly.
fn init_tracing(verbose: bool) {
    let default = if verbose { "viewgen=debug" } else { "viewgen=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
