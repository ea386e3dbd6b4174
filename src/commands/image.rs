use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Commands working on the data side of an image
#[derive(Subcommand, Debug, Eq, PartialEq)]
pub enum ImageCommands {
    Info(InfoCommand),
    Read(ReadCommand),
}

/// Loads a .cue or .iso file and prints its track layout.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct InfoCommand {
    /// Path to the .cue sheet or ISO image
    #[arg(value_name = "PATH")]
    pub input: PathBuf,
}

/// Dumps sectors of an image to a file.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct ReadCommand {
    /// Path to the .cue sheet or ISO image
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Output file path
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// First sector to read
    #[arg(long, short = 's', value_name = "SECTOR", default_value_t = 0)]
    pub start: u32,

    /// Number of sectors to read, defaults to everything up to the lead-out
    #[arg(long, short = 'n', value_name = "COUNT")]
    pub count: Option<u32>,

    /// Force overwrite of the output file if it already exists
    #[arg(long, short = 'f', value_name = "FORCE", default_value_t = false)]
    pub force: bool,

    /// Read whole 2352-byte sectors instead of 2048 bytes of user data
    #[arg(long, short = 'r', default_value_t = false)]
    pub raw: bool,
}
