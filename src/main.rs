//! `content-md`: convert the main content of an HTML page to Markdown.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use content_markdown_converter::{Pipeline, PipelineConfig, PipelineError};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "content_markdown_converter=info";

#[derive(Parser, Debug)]
#[command(
    name = "content-md",
    version,
    about = "Extract the main content of an HTML page as Markdown."
)]
struct Cli {
    /// HTML file to convert, `-` or nothing for stdin
    input: Option<PathBuf>,

    /// Write Markdown here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content selector, tried in the order given. Replaces the configured list.
    #[arg(short = 's', long = "selector")]
    selectors: Vec<String>,

    /// Content-Type header value of the input, used to pick its charset
    #[arg(long)]
    content_type: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = err
                .downcast_ref::<PipelineError>()
                .map_or(1, PipelineError::code);
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = match cli.config {
        Some(ref path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if !cli.selectors.is_empty() {
        config.locator.selectors = cli.selectors.clone();
    }
    let pipeline = Pipeline::from_config(&config).context("invalid configuration")?;

    let input = read_input(cli.input.as_deref())?;
    let markdown = pipeline.run_bytes(&input, cli.content_type.as_deref())?;
    write_output(cli.output.as_deref(), &markdown)?;

    info!(
        input_bytes = input.len(),
        markdown_len = markdown.len(),
        "Conversion complete"
    );
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => {
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        _ => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn write_output(path: Option<&Path>, markdown: &str) -> Result<()> {
    let mut text = String::with_capacity(markdown.len() + 1);
    text.push_str(markdown);
    if !text.is_empty() {
        text.push('\n');
    }

    match path {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.flush())
                .context("failed to write stdout")
        }
    }
}
