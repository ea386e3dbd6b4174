use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Commands driving the CD audio player
#[derive(Subcommand, Debug, Eq, PartialEq)]
pub enum AudioCommands {
    Rip(RipCommand),
}

/// Plays a track or sector range through the audio player and saves what it
/// produced as a 16-bit WAV file.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct RipCommand {
    /// Path to the .cue sheet
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Output WAV file path
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Track number to rip
    #[arg(
        long,
        short = 't',
        value_name = "TRACK",
        conflicts_with_all = ["start", "length"],
        required_unless_present = "start"
    )]
    pub track: Option<u8>,

    /// Absolute start sector
    #[arg(long, short = 's', value_name = "SECTOR", requires = "length")]
    pub start: Option<u32>,

    /// Number of sectors to play
    #[arg(long, short = 'l', value_name = "SECTORS", requires = "start")]
    pub length: Option<u32>,

    /// Force overwrite of the output file if it already exists
    #[arg(long, short = 'f', value_name = "FORCE", default_value_t = false)]
    pub force: bool,

    /// PCM frames requested per mixer pull
    #[arg(long, value_name = "FRAMES", default_value_t = 4096)]
    pub frames: usize,
}
