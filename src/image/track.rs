use crate::cd::{
    BYTES_PER_COOKED_REDBOOK_FRAME, BYTES_PER_MODE2_FRAME, BYTES_PER_RAW_REDBOOK_FRAME,
    TRACK_ATTR_AUDIO, TRACK_ATTR_DATA,
};
use crate::image::source::TrackSource;
use std::sync::Arc;

/// Track types accepted by the cue `TRACK` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Audio,
    Mode1_2048,
    Mode1_2352,
    Mode2_2336,
    Mode2_2352,
}

impl TrackType {
    pub fn parse(type_str: &str) -> Option<Self> {
        match type_str {
            "AUDIO" => Some(TrackType::Audio),
            "MODE1/2048" => Some(TrackType::Mode1_2048),
            "MODE1/2352" => Some(TrackType::Mode1_2352),
            "MODE2/2336" => Some(TrackType::Mode2_2336),
            "MODE2/2352" => Some(TrackType::Mode2_2352),
            _ => None,
        }
    }

    pub fn sector_size(self) -> u32 {
        match self {
            TrackType::Mode1_2048 => BYTES_PER_COOKED_REDBOOK_FRAME,
            TrackType::Mode2_2336 => BYTES_PER_MODE2_FRAME,
            TrackType::Audio | TrackType::Mode1_2352 | TrackType::Mode2_2352 => {
                BYTES_PER_RAW_REDBOOK_FRAME
            }
        }
    }

    pub fn attr(self) -> u8 {
        match self {
            TrackType::Audio => TRACK_ATTR_AUDIO,
            _ => TRACK_ATTR_DATA,
        }
    }

    pub fn mode2(self) -> bool {
        matches!(self, TrackType::Mode2_2336 | TrackType::Mode2_2352)
    }
}

/// One contiguous region of the disc.
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub number: u8,
    pub attr: u8,
    /// Absolute start sector, without the 150-sector lead-in.
    pub start: u32,
    /// Length in sectors; zero only for the lead-out.
    pub length: u32,
    /// Byte offset of this track's sector 0 inside its source.
    pub skip: u64,
    pub sector_size: u32,
    pub mode2: bool,
    pub file: Option<Arc<TrackSource>>,
}

impl Track {
    pub fn apply_type(&mut self, track_type: TrackType) {
        self.sector_size = track_type.sector_size();
        self.attr = track_type.attr();
        self.mode2 = track_type.mode2();
    }

    pub fn is_audio(&self) -> bool {
        self.attr == TRACK_ATTR_AUDIO
    }

    pub fn is_data(&self) -> bool {
        self.attr == TRACK_ATTR_DATA
    }

    /// First sector after this track.
    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    pub fn shares_source_with(&self, other: &Track) -> bool {
        match (&self.file, &other.file) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}
