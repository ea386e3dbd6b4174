pub mod cue;
pub mod disc;
pub mod error;
pub mod iso;
pub mod layout;
pub mod source;
pub mod track;

use crate::cd::{
    BYTES_PER_COOKED_REDBOOK_FRAME, BYTES_PER_RAW_REDBOOK_FRAME, TRACK_ATTR_AUDIO,
};
use crate::image::cue::CueParser;
use crate::image::cue::path::{HostPathResolver, PathResolver};
use crate::image::disc::{AudioSub, AudioTracks, Disc, TrackInfo};
use crate::image::error::{CdromError, CdromResult};
use crate::image::iso::{load_iso_file, user_data_offset};
use crate::player::{AudioPlayer, AudioStatus};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaTrayStatus {
    pub present: bool,
    pub changed: bool,
    pub tray_open: bool,
}

/// A disc image mounted as a CD-ROM drive.
pub struct CdromImage {
    disc: Arc<Disc>,
    player: Arc<AudioPlayer>,
    resolver: Arc<dyn PathResolver>,
}

impl CdromImage {
    /// An empty drive; `set_device` loads media into it.
    pub fn new(player: Arc<AudioPlayer>) -> Self {
        Self {
            disc: Arc::new(Disc::default()),
            player,
            resolver: Arc::new(HostPathResolver),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn PathResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn open(path: impl AsRef<Path>, player: Arc<AudioPlayer>) -> CdromResult<Self> {
        let mut image = Self::new(player);
        image.set_device(path)?;
        Ok(image)
    }

    /// Loads `path` as a cue sheet, falling back to a bare ISO. The current
    /// disc stays in place when both fail.
    pub fn set_device(&mut self, path: impl AsRef<Path>) -> CdromResult<()> {
        let path = path.as_ref();

        let disc = match CueParser::new(path)
            .with_resolver(self.resolver.clone())
            .parse()
        {
            Ok(disc) => disc,
            Err(cue) => {
                debug!("{} is not a usable cue sheet: {cue}", path.display());
                load_iso_file(path).map_err(|iso| {
                    warn!("Failed to load {}", path.display());
                    CdromError::Load {
                        path: path.to_path_buf(),
                        cue,
                        iso,
                    }
                })?
            }
        };

        self.player.release_disc(&self.disc);
        self.disc = Arc::new(disc);
        info!(
            "Mounted {} with {} tracks",
            path.display(),
            self.disc.tracks().len().saturating_sub(1)
        );
        Ok(())
    }

    pub fn disc(&self) -> &Arc<Disc> {
        &self.disc
    }

    pub fn player(&self) -> &Arc<AudioPlayer> {
        &self.player
    }

    /// Reads one sector: 2352 bytes when `raw`, otherwise the 2048 bytes of
    /// user data.
    pub fn read_sector(&self, buffer: &mut [u8], raw: bool, sector: u32) -> CdromResult<()> {
        let length = sector_length(raw);
        if buffer.len() < length {
            return Err(CdromError::BufferTooSmall {
                needed: length,
                len: buffer.len(),
            });
        }
        let buffer = &mut buffer[..length];

        let track = self
            .disc
            .get_track(sector)
            .ok_or(CdromError::SectorNotFound(sector))?;
        let source = track
            .file
            .as_ref()
            .ok_or(CdromError::NoSource(track.number))?;
        if raw && track.sector_size != BYTES_PER_RAW_REDBOOK_FRAME {
            return Err(CdromError::RawReadUnsupported {
                track: track.number,
                sector_size: track.sector_size,
            });
        }

        // gap sectors without backing data read as blank
        let Some(relative) = sector.checked_sub(track.start) else {
            buffer.fill(0);
            return Ok(());
        };

        let mut seek = track.skip + relative as u64 * track.sector_size as u64;
        if !raw {
            seek += user_data_offset(track.sector_size, track.mode2);
        }
        source.read(buffer, seek)?;
        Ok(())
    }

    /// Reads `count` consecutive sectors into consecutive slots of `buffer`.
    pub fn read_sectors(
        &self,
        buffer: &mut [u8],
        raw: bool,
        sector: u32,
        count: u32,
    ) -> CdromResult<()> {
        let length = sector_length(raw);
        let needed = length * count as usize;
        if buffer.len() < needed {
            return Err(CdromError::BufferTooSmall {
                needed,
                len: buffer.len(),
            });
        }

        for (i, slot) in buffer[..needed].chunks_exact_mut(length).enumerate() {
            let sector = sector
                .checked_add(i as u32)
                .ok_or(CdromError::SectorNotFound(u32::MAX))?;
            self.read_sector(slot, raw, sector)?;
        }
        Ok(())
    }

    pub fn audio_tracks(&self) -> CdromResult<AudioTracks> {
        self.disc.audio_tracks().ok_or(CdromError::NoAudioTracks)
    }

    pub fn audio_track_info(&self, track: u8) -> CdromResult<TrackInfo> {
        self.disc
            .audio_track_info(track)
            .ok_or(CdromError::TrackOutOfRange(track))
    }

    /// Track attribute and media catalog number.
    pub fn upc(&self) -> (u8, &str) {
        (TRACK_ATTR_AUDIO, self.disc.mcn())
    }

    pub fn has_data_track(&self) -> bool {
        self.disc.has_data_track()
    }

    pub fn media_tray_status(&self) -> MediaTrayStatus {
        MediaTrayStatus {
            present: true,
            changed: false,
            tray_open: false,
        }
    }

    /// Accepted for compatibility; images cannot be ejected.
    pub fn load_unload_media(&self, _unload: bool) -> bool {
        true
    }

    pub fn audio_status(&self) -> AudioStatus {
        self.player.status()
    }

    pub fn audio_sub(&self) -> AudioSub {
        self.disc.audio_sub(self.player.position(&self.disc))
    }

    pub fn play_audio_sector(&self, start: u32, len: u32) -> CdromResult<()> {
        Ok(self.player.play_audio_sector(&self.disc, start, len)?)
    }

    pub fn pause_audio(&self, resume: bool) -> CdromResult<()> {
        Ok(self.player.pause_audio(resume)?)
    }

    pub fn stop_audio(&self) {
        self.player.stop_audio();
    }

    pub fn channel_control(&self, volume: [u8; 2], map: [u8; 2]) {
        self.player.channel_control(volume, map);
    }
}

impl Drop for CdromImage {
    fn drop(&mut self) {
        self.player.release_disc(&self.disc);
    }
}

fn sector_length(raw: bool) -> usize {
    if raw {
        BYTES_PER_RAW_REDBOOK_FRAME as usize
    } else {
        BYTES_PER_COOKED_REDBOOK_FRAME as usize
    }
}
