//! topicpress CLI: documentation checkout to print-ready PDF.
//!
//! Walks a product's table of contents, normalizes every topic, writes one
//! combined markdown file and hands it to the PDF renderer.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
