//! Emoji Art command-line entry point.

use clap::Parser;
use emoji_art_cli::CliArgs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing on stderr; stdout carries the command output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,emoji_art_document=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    // Use JSON format in production (RUST_LOG_FORMAT=json)
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_tracing();

    let runtime = tokio::runtime::Runtime::new()?;
    let output = runtime.block_on(emoji_art_cli::run(&args))?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
