//! texforge CLI — scholarly paper build tool.
//!
//! Assembles a paper directory of LaTeX fragments and metadata into a
//! single build unit and compiles it to PDF through the external TeX
//! toolchain.

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
