//! bundle-config CLI
//!
//! Entry point for the `bundle-config` command-line tool.

use bundle_config::config::{BaseOptions, EffectiveConfig};
use bundle_config::output::{placeholder_contents, MAX_PLACEHOLDER_SIZE};
use bundle_config::plugin::apply_plugins;
use bundle_config::signal::ShutdownSignal;
use bundle_config::{Asset, AssetRouter, Mode};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bundle-config")]
#[command(about = "Compose bundler configurations for production builds and the dev server", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the production configuration and prepare the output directory
    Build {
        /// Project root (default: current directory)
        #[arg(long, short = 'r', default_value = ".")]
        root: PathBuf,

        /// Write the effective configuration here instead of stdout
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Compose the development configuration and stay resident
    Serve {
        /// Project root (default: current directory)
        #[arg(long, short = 'r', default_value = ".")]
        root: PathBuf,
    },

    /// Explain how one asset would be routed
    Route {
        /// Project root (default: current directory)
        #[arg(long, short = 'r', default_value = ".")]
        root: PathBuf,

        /// Which configuration to route against
        #[arg(long, value_enum, default_value_t = ModeArg::Build)]
        mode: ModeArg,

        /// Asset size in bytes when the file does not exist
        #[arg(long)]
        size: Option<u64>,

        /// Output in human-readable format instead of JSON
        #[arg(long)]
        human: bool,

        /// Asset path, relative to the root
        path: String,
    },

    /// Validate an overlay file and show its composition
    Check {
        /// Project root (default: current directory)
        #[arg(long, short = 'r', default_value = ".")]
        root: PathBuf,

        /// Which configuration to compose the overlay onto
        #[arg(long, value_enum, default_value_t = ModeArg::Build)]
        mode: ModeArg,

        /// Overlay file (.toml or .json)
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Build,
    Serve,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Build => Mode::Production,
            ModeArg::Serve => Mode::Development,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build { root, out } => run_build(&root, out),
        Commands::Serve { root } => run_serve(&root),
        Commands::Route {
            root,
            mode,
            size,
            human,
            path,
        } => run_route(&root, mode.into(), size, human, &path),
        Commands::Check { root, mode, file } => run_check(&root, mode.into(), file),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn compose_or_exit(mode: Mode, root: &Path, extra: &[PathBuf]) -> EffectiveConfig {
    match EffectiveConfig::build(mode, root, &BaseOptions::default(), extra) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Composition error: {}", e);
            process::exit(1);
        }
    }
}

fn print_json(config: &EffectiveConfig) {
    match config.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_build(root: &Path, out: Option<PathBuf>) {
    let config = compose_or_exit(Mode::Production, root, &[]);

    if let Err(e) = apply_plugins(&config.descriptor) {
        eprintln!("Plugin error: {}", e);
        process::exit(1);
    }

    match out {
        Some(path) => {
            if let Err(e) = config.write_to_file(&path) {
                eprintln!("Error writing {}: {}", path.display(), e);
                process::exit(1);
            }
            info!(path = %path.display(), "wrote effective config");
        }
        None => print_json(&config),
    }
}

fn run_serve(root: &Path) {
    let config = compose_or_exit(Mode::Development, root, &[]);

    if let Err(e) = apply_plugins(&config.descriptor) {
        eprintln!("Plugin error: {}", e);
        process::exit(1);
    }
    print_json(&config);

    let signal = ShutdownSignal::new();
    if let Err(e) = signal.install() {
        eprintln!("Error installing signal handler: {}", e);
        process::exit(1);
    }

    if let Some(server) = config.descriptor.dev_server() {
        let scheme = if server.tls { "https" } else { "http" };
        info!(
            "dev server configuration ready at {}://localhost:{}{}",
            scheme, server.port, server.public_path
        );
    }
    info!("press Ctrl-C to stop");

    signal.wait();
    info!("stopped");
}

fn run_route(root: &Path, mode: Mode, size: Option<u64>, human: bool, path: &str) {
    let config = compose_or_exit(mode, root, &[]);

    let on_disk = config.descriptor.context().join(path);
    let contents = if on_disk.is_file() {
        match fs::read(&on_disk) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error reading {}: {}", on_disk.display(), e);
                process::exit(1);
            }
        }
    } else {
        let size = size.unwrap_or(0);
        match placeholder_contents(size) {
            Some(contents) => contents,
            None => {
                eprintln!(
                    "Asset size {} exceeds the {} byte limit for --size",
                    size, MAX_PLACEHOLDER_SIZE
                );
                process::exit(1);
            }
        }
    };

    let router = AssetRouter::new(&config.descriptor);
    let decision = router.route(&Asset::new(path, &contents));

    if human {
        println!("{}", decision.to_human(path));
    } else {
        match serde_json::to_string_pretty(&decision) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    }
}

fn run_check(root: &Path, mode: Mode, file: PathBuf) {
    let config = compose_or_exit(mode, root, &[file.clone()]);
    let descriptor = &config.descriptor;

    println!("Overlay valid: {}", file.display());
    println!();
    println!("  Mode: {}", config.mode);
    println!("  Rules: {}", descriptor.rules().len());
    for rule in descriptor.rules() {
        let loaders: Vec<&str> = rule.chain().iter().map(|t| t.loader.as_str()).collect();
        println!(
            "    {} [{}] {}",
            rule.test(),
            rule.category().as_str(),
            loaders.join(" -> ")
        );
    }
    let plugins: Vec<&str> = descriptor.plugins().iter().map(|p| p.name()).collect();
    println!("  Plugins: {}", plugins.join(", "));
    println!("  Fail fast: {}", descriptor.bail());
    println!("  Digest: {}", config.digest);
}
