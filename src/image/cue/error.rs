use crate::image::layout::error::LayoutError;
use crate::image::source::error::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CueError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("Unknown track type: {0}")]
    InvalidTrackType(String),

    #[error("Invalid MSF format: {0}")]
    InvalidMSFFormat(String),

    #[error("Invalid quoted string: {0}")]
    InvalidQuotedString(String),

    #[error("Missing argument for {0}")]
    MissingArgument(&'static str),

    #[error("Unknown cue command: {0}")]
    UnknownCommand(String),

    #[error("Line {0} is longer than {1} bytes, probably not a cue sheet")]
    LineTooLong(usize, usize),

    #[error("Cannot find file '{0}' referenced by the cue sheet")]
    FileNotFound(String),

    #[error("TRACK {0} appears before any FILE")]
    TrackWithoutFile(u8),

    #[error("The cue sheet does not define any track")]
    NoTracks,

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

pub type CueResult<T> = Result<T, CueError>;
