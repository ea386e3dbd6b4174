pub mod audio;
pub mod binary;
pub mod error;

use crate::image::source::audio::AudioFile;
use crate::image::source::binary::BinaryFile;
use crate::image::source::error::SourceResult;
use std::path::Path;

/// Byte order of the PCM a source hands to the mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    #[cfg(target_endian = "little")]
    pub const NATIVE: Endian = Endian::Little;
    #[cfg(target_endian = "big")]
    pub const NATIVE: Endian = Endian::Big;

    pub fn is_native(self) -> bool {
        self == Self::NATIVE
    }
}

/// How the backing file of a cue `FILE` entry is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Binary,
    Audio,
}

impl SourceKind {
    /// `BINARY` is read sector by sector, every other cue file type goes
    /// through the audio decoder.
    pub fn from_cue_type(file_type: &str) -> Self {
        if file_type == "BINARY" {
            SourceKind::Binary
        } else {
            SourceKind::Audio
        }
    }
}

/// Content backing one or more tracks. Tracks sharing a file share one
/// `Arc<TrackSource>`, so identity comparison tells whether two tracks read
/// from the same file.
#[derive(Debug)]
pub enum TrackSource {
    Binary(BinaryFile),
    Audio(AudioFile),
}

impl TrackSource {
    pub fn open(path: impl AsRef<Path>, kind: SourceKind) -> SourceResult<Self> {
        match kind {
            SourceKind::Binary => Ok(TrackSource::Binary(BinaryFile::open(path)?)),
            SourceKind::Audio => Ok(TrackSource::Audio(AudioFile::open(path)?)),
        }
    }

    /// Fills `buffer` with the bytes starting at `offset`.
    pub fn read(&self, buffer: &mut [u8], offset: u64) -> SourceResult<()> {
        match self {
            TrackSource::Binary(file) => file.read(buffer, offset),
            TrackSource::Audio(file) => file.read(buffer, offset),
        }
    }

    /// Length in bytes of the PCM or raw content, if it can be determined.
    pub fn length(&self) -> Option<u64> {
        match self {
            TrackSource::Binary(file) => Some(file.length()),
            TrackSource::Audio(file) => file.length(),
        }
    }

    pub fn seek(&self, offset: u64) -> SourceResult<()> {
        match self {
            TrackSource::Binary(file) => file.seek(offset),
            TrackSource::Audio(file) => file.seek(offset),
        }
    }

    /// Decodes up to `frames` PCM frames of interleaved s16 samples into
    /// `buffer`, returning how many frames were produced. Zero means the
    /// source ran dry.
    pub fn decode(&self, buffer: &mut [u8], frames: usize) -> usize {
        match self {
            TrackSource::Binary(file) => file.decode(buffer, frames),
            TrackSource::Audio(file) => file.decode(buffer, frames),
        }
    }

    pub fn rate(&self) -> u32 {
        match self {
            TrackSource::Binary(file) => file.rate(),
            TrackSource::Audio(file) => file.rate(),
        }
    }

    pub fn channels(&self) -> u8 {
        match self {
            TrackSource::Binary(file) => file.channels(),
            TrackSource::Audio(file) => file.channels(),
        }
    }

    pub fn endian(&self) -> Endian {
        match self {
            TrackSource::Binary(_) => Endian::Little,
            TrackSource::Audio(_) => Endian::NATIVE,
        }
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.channels().max(1) as usize * 2
    }

    pub fn path(&self) -> &Path {
        match self {
            TrackSource::Binary(file) => file.path(),
            TrackSource::Audio(file) => file.path(),
        }
    }
}
