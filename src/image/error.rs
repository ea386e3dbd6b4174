use crate::image::cue::error::CueError;
use crate::image::iso::error::IsoError;
use crate::image::source::error::SourceError;
use crate::player::error::PlayerError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdromError {
    #[error("Could not load {path} as a cue sheet ({cue}) or as an ISO image ({iso})")]
    Load {
        path: PathBuf,
        cue: CueError,
        iso: IsoError,
    },

    #[error("Sector {0} is outside the disc")]
    SectorNotFound(u32),

    #[error("Track {0} has no backing source")]
    NoSource(u8),

    #[error("Track {track} stores {sector_size}-byte sectors, raw reads need 2352")]
    RawReadUnsupported { track: u8, sector_size: u32 },

    #[error("Buffer of {len} bytes cannot hold {needed} bytes")]
    BufferTooSmall { needed: usize, len: usize },

    #[error("The disc has too few tracks to describe")]
    NoAudioTracks,

    #[error("Track {0} is out of range")]
    TrackOutOfRange(u8),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Player(#[from] PlayerError),
}

pub type CdromResult<T> = Result<T, CdromError>;
