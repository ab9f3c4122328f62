use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use templates_core::config::{GenerateArgs, GeneratorConfig};
use templates_core::protocol;
use templates_core::services::{
    pipeline::{self, GenerateOutcome},
    verify,
};

#[derive(Debug, Parser)]
#[command(
    name = "templates-core",
    about = "Generate sources templates from the extension index",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    generate: GenerateArgs,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the index and publish templates (default)
    Generate(GenerateArgs),
    /// Check a published directory's checksums
    Verify {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Answer JSON requests line by line on stdin
    Serve,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Generate(args)) => run_generate(args.into()),
        None => run_generate(cli.generate.into()),
        Some(Commands::Verify { dir }) => {
            init_tracing(false);
            run_verify(dir)
        }
        Some(Commands::Serve) => {
            init_tracing(false);
            serve();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run_generate(cfg: GeneratorConfig) -> anyhow::Result<()> {
    init_tracing(cfg.verbose);
    std::fs::create_dir_all(&cfg.cache_dir)
        .with_context(|| format!("creating cache dir {}", cfg.cache_dir.display()))?;

    match pipeline::generate(&cfg).context("template generation failed")? {
        GenerateOutcome::NotModified { .. } => println!("No changes"),
        GenerateOutcome::Published(report) => println!("{}", report.summary()),
    }
    Ok(())
}

fn run_verify(dir: PathBuf) -> anyhow::Result<()> {
    let report = verify::verify_dir(&dir)
        .with_context(|| format!("verifying {}", dir.display()))?;
    println!(
        "OK: version {} with {} templates (sha256 {})",
        report.version, report.count, report.compact_sha256
    );
    Ok(())
}

fn serve() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };

        if line.trim().is_empty() {
            continue;
        }

        let result = std::panic::catch_unwind(|| protocol::handle(&line));

        let response = match result {
            Ok(resp) => resp,
            Err(_) => serde_json::json!({
                "status": "error",
                "message": "internal core error"
            })
            .to_string(),
        };

        if writeln!(stdout, "{response}").is_err() {
            break;
        }

        let _ = stdout.flush();
    }
}
