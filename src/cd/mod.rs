// src/cd/mod.rs
use std::fmt::Display;

pub mod pvd;

pub const BYTES_PER_RAW_REDBOOK_FRAME: u32 = 2352;
pub const BYTES_PER_COOKED_REDBOOK_FRAME: u32 = 2048;
pub const BYTES_PER_MODE2_FRAME: u32 = 2336;

pub const REDBOOK_FRAMES_PER_SECOND: u32 = 75;
pub const REDBOOK_FRAMES_PER_MINUTE: u32 = REDBOOK_FRAMES_PER_SECOND * 60;
pub const REDBOOK_PCM_FRAMES_PER_SECOND: u32 = 44_100;
pub const REDBOOK_CHANNELS: u8 = 2;
pub const REDBOOK_BPS: u32 = 2; // bytes per sample
pub const BYTES_PER_REDBOOK_PCM_FRAME: u32 = REDBOOK_CHANNELS as u32 * REDBOOK_BPS;
pub const REDBOOK_PCM_BYTES_PER_MS: f64 =
    (REDBOOK_PCM_FRAMES_PER_SECOND * BYTES_PER_REDBOOK_PCM_FRAME) as f64 / 1000.0;

pub const MAX_REDBOOK_FRAMES: u32 = 400_000;
pub const MAX_REDBOOK_SECTOR: u32 = MAX_REDBOOK_FRAMES - 1;
pub const MAX_REDBOOK_TRACKS: u8 = 99;
pub const MIN_REDBOOK_TRACKS: usize = 2;

/// Sectors of lead-in before logical sector 0, added when reporting absolute MSF.
pub const REDBOOK_LEAD_IN_FRAMES: u32 = 150;

/// Header bytes preceding the user data in a raw mode-1 sector (sync + header).
pub const MODE1_HEADER_SIZE: u64 = 16;
/// Header bytes preceding the user data in a mode-2 sector (sync + header + subheader).
pub const MODE2_HEADER_SIZE: u64 = 24;

pub const TRACK_ATTR_AUDIO: u8 = 0x00;
pub const TRACK_ATTR_DATA: u8 = 0x40;

/// Minute:second:frame position on a disc, 75 frames per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Msf {
    pub min: u8,
    pub sec: u8,
    pub fr: u8,
}

impl Msf {
    pub const fn new(min: u8, sec: u8, fr: u8) -> Self {
        Self { min, sec, fr }
    }

    pub fn to_frames(self) -> u32 {
        (self.min as u32 * 60 + self.sec as u32) * REDBOOK_FRAMES_PER_SECOND + self.fr as u32
    }

    pub fn from_frames(frames: u32) -> Self {
        Self {
            min: (frames / REDBOOK_FRAMES_PER_MINUTE) as u8,
            sec: ((frames % REDBOOK_FRAMES_PER_MINUTE) / REDBOOK_FRAMES_PER_SECOND) as u8,
            fr: (frames % REDBOOK_FRAMES_PER_SECOND) as u8,
        }
    }
}

impl Display for Msf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.min, self.sec, self.fr)
    }
}

/// Absolute disc position of a logical sector, including the lead-in.
pub fn sector_to_absolute_msf(sector: u32) -> Msf {
    Msf::from_frames(sector + REDBOOK_LEAD_IN_FRAMES)
}
