use crate::actions::{print_info, read_sectors, rip_audio};
use crate::commands::audio::AudioCommands;
use crate::commands::image::ImageCommands;
use crate::commands::{Cli, Commands};
use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

mod actions;
mod commands;

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let logger = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .build();

    let level = logger.filter();
    let pb = MultiProgress::new();

    LogWrapper::new(pb.clone(), logger).try_init()?;
    log::set_max_level(level);

    let cli = Cli::parse();

    match cli.command {
        Commands::Image(inner) => match inner {
            ImageCommands::Info(cmd) => print_info(cmd)?,
            ImageCommands::Read(cmd) => read_sectors(pb.clone(), cmd)?,
        },
        Commands::Audio(inner) => match inner {
            AudioCommands::Rip(cmd) => rip_audio(pb.clone(), cmd)?,
        },
    }

    Ok(())
}
