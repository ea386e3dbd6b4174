use crate::commands::audio::AudioCommands;
use crate::commands::image::ImageCommands;
use clap::{Parser, Subcommand};

pub mod audio;
pub mod image;

/// CLI for inspecting CD images, dumping sectors and ripping Redbook audio.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(subcommand)]
    Image(ImageCommands),
    #[command(subcommand)]
    Audio(AudioCommands),
}
