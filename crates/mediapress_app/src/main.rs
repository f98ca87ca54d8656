mod cli;
mod effects;
mod logging;
mod render;
mod run;

use clap::Parser;

use cli::{Cli, Command};
use mediapress_core::MediaKind;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Images { files, options } => run::run(MediaKind::Image, files, options),
        Command::Videos { files, options } => run::run(MediaKind::Video, files, options),
    }
}
