use crate::image::source::error::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Nothing to play: the request covers zero sectors")]
    EmptyRequest,

    #[error("Sector {0} is not inside any playable track")]
    SectorNotFound(u32),

    #[error("Sectors {start}..{end} lie entirely in the pregap of track {track}")]
    PregapOnly { track: u8, start: u32, end: u64 },

    #[error("Track {0} is a data track")]
    DataTrack(u8),

    #[error("Track {0} has no backing source")]
    NoSource(u8),

    #[error("No mixer channel is attached to the player")]
    NoChannel,

    #[error("Track {track} failed to seek to byte {offset}")]
    Seek {
        track: u8,
        offset: u64,
        #[source]
        source: SourceError,
    },

    #[error("Player lock was poisoned by a panicking thread")]
    LockPoisoned,
}

pub type PlayerResult<T> = Result<T, PlayerError>;
