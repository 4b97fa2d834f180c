//! CLI entry point for the product image pipeline.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use product_images::{Pipeline, RembgCommand};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::field::RecordFields;
use tracing_subscriber::fmt::FormatFields;
use tracing_subscriber::fmt::format::{DefaultFields, Writer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod app_config;
mod cli;
mod config_runtime;

use cli::Args;
use config_runtime::{default_log_level, resolve_settings, select_images};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let file_config = app_config::load_default_file_config()?;
    let settings = resolve_settings(&args, file_config.as_ref());

    init_tracing(&args, settings.log_file.as_deref())?;
    debug!(?args, "CLI arguments parsed");
    debug!(?settings, from_file = file_config.is_some(), "settings resolved");

    let remover = RembgCommand::with_program(&settings.rembg);
    let pipeline = Pipeline::new(&settings.options, Box::new(remover))?;
    let result = pipeline.run(&args.input, &settings.output_dir).await?;

    let selected = select_images(&result.processed_images, &args.select);
    info!(
        product_id = %result.product_id,
        processed = result.processed_images.len(),
        selected = selected.len(),
        "pipeline complete"
    );

    let report = json!({
        "product_id": result.product_id.as_str(),
        "processed_images": selected
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Logs go to stderr, and also to `log_file` without ANSI colors when set.
///
/// `RUST_LOG` takes priority over the `-q`/`-v` flags.
fn init_tracing(args: &Args, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(args.verbose, args.quiet)));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory '{}'", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
            Some(
                fmt::layer()
                    .fmt_fields(PlainFields(DefaultFields::new()))
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

/// Field formatter for the log file.
///
/// Span fields are cached per formatter type, so sharing `DefaultFields` with
/// the stderr layer would copy its ANSI-colored span fields into the file.
#[derive(Debug)]
struct PlainFields(DefaultFields);

impl<'writer> FormatFields<'writer> for PlainFields {
    fn format_fields<R: RecordFields>(&self, writer: Writer<'writer>, fields: R) -> std::fmt::Result {
        self.0.format_fields(writer, fields)
    }
}
