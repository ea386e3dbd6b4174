use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Track {track}: INDEX 00 at frame {prestart} lies after INDEX 01 at frame {start}")]
    PrestartAfterStart { track: u8, prestart: u32, start: u32 },

    #[error("Track {0}: the length of its source cannot be determined")]
    UnknownSourceLength(u8),

    #[error("Track {track}: derived length {length} is negative")]
    NegativeLength { track: u8, length: i64 },

    #[error("Track {track}: sector value {value} is outside the disc address space")]
    OutOfRange { track: u8, value: i64 },

    #[error(
        "Track {number} failed consistency checks against track {previous}: \
         start {start} must be at or after the previous track's end {previous_end}"
    )]
    Inconsistent {
        number: u8,
        previous: u8,
        start: i64,
        previous_end: i64,
    },

    #[error("Track {0} cannot be followed by a lead-out")]
    TrackNumberOverflow(u8),

    #[error("No tracks were added to the layout")]
    Empty,
}

pub type LayoutResult<T> = Result<T, LayoutError>;
