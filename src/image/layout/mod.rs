pub mod error;

use crate::cd::TRACK_ATTR_AUDIO;
use crate::image::layout::error::{LayoutError, LayoutResult};
use crate::image::track::Track;
use log::{debug, warn};

/// Stitches per-track cue fragments into one gapless sector space.
///
/// Each fragment carries its INDEX 01 position relative to its own file.
/// The builder turns that into an absolute start sector, works out the byte
/// offset (`skip`) of the track inside its source, and fills in the length of
/// the previous track once the next one (or the lead-out) arrives. `shift`
/// accumulates the sectors of all files before the current one and
/// `total_pregap` the PREGAP sectors inserted since the current file began.
#[derive(Debug, Default)]
pub struct TrackLayoutBuilder {
    tracks: Vec<Track>,
    shift: i64,
    total_pregap: i64,
}

impl TrackLayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Appends `curr`, whose `start` is still the raw INDEX 01 frame.
    /// `prestart` is its INDEX 00 frame, if any, and `curr_pregap` its PREGAP.
    pub fn add_track(
        &mut self,
        mut curr: Track,
        prestart: Option<u32>,
        curr_pregap: u32,
    ) -> LayoutResult<()> {
        // frames between index 0 and index 1 are skipped in the source
        let mut skip: i64 = 0;
        if let Some(prestart) = prestart {
            if prestart > curr.start {
                warn!(
                    "AddTrack: prestart {prestart} cannot be after the start {} of track {}",
                    curr.start, curr.number
                );
                return Err(LayoutError::PrestartAfterStart {
                    track: curr.number,
                    prestart,
                    start: curr.start,
                });
            }
            skip = (curr.start - prestart) as i64;
        }

        let curr_pregap = curr_pregap as i64;
        let sector_size = curr.sector_size as i64;
        let mut start = curr.start as i64;

        let Some(prev) = self.tracks.last_mut() else {
            curr.skip = (skip * sector_size) as u64;
            curr.start = to_sector(curr.number, start + curr_pregap)?;
            self.total_pregap = curr_pregap;
            debug!(
                "AddTrack: track {} starts at {} with skip {}",
                curr.number, curr.start, curr.skip
            );
            self.tracks.push(curr);
            return Ok(());
        };

        let curr_skip = if prev.shares_source_with(&curr) {
            start += self.shift;
            if prev.length == 0 {
                let length = start + self.total_pregap - prev.start as i64 - skip;
                if length < 0 {
                    return Err(LayoutError::NegativeLength {
                        track: prev.number,
                        length,
                    });
                }
                prev.length = to_sector(prev.number, length)?;
            }
            let curr_skip =
                prev.skip as i64 + prev.length as i64 * prev.sector_size as i64 + skip * sector_size;
            self.total_pregap += curr_pregap;
            start += self.total_pregap;
            curr_skip
        } else {
            let source_length = prev
                .file
                .as_ref()
                .and_then(|file| file.length())
                .ok_or(LayoutError::UnknownSourceLength(prev.number))?;
            let remaining = source_length as i64 - prev.skip as i64;
            if remaining < 0 {
                return Err(LayoutError::NegativeLength {
                    track: prev.number,
                    length: remaining,
                });
            }
            // a short final sector still counts as a whole one
            let length = (remaining as u64).div_ceil(prev.sector_size as u64) as i64;
            prev.length = to_sector(prev.number, length)?;

            start += prev.start as i64 + prev.length as i64 + curr_pregap;
            self.shift += prev.start as i64 + prev.length as i64;
            self.total_pregap = curr_pregap;
            skip * sector_size
        };

        let previous_end = prev.start as i64 + prev.length as i64;
        if curr.number <= 1 || prev.number.checked_add(1) != Some(curr.number) || start < previous_end
        {
            warn!(
                "AddTrack: failed consistency checks: track {} after track {}, start {} before previous end {}",
                curr.number, prev.number, start, previous_end
            );
            return Err(LayoutError::Inconsistent {
                number: curr.number,
                previous: prev.number,
                start,
                previous_end,
            });
        }

        curr.start = to_sector(curr.number, start)?;
        curr.skip = curr_skip as u64;
        debug!(
            "AddTrack: track {} starts at {} with skip {} (previous length {})",
            curr.number, curr.start, curr.skip, prev.length
        );
        self.tracks.push(curr);
        Ok(())
    }

    /// Closes the layout with the zero-length lead-out, whose start becomes the
    /// disc's total sector count.
    pub fn add_lead_out(&mut self) -> LayoutResult<()> {
        let last = self.tracks.last().ok_or(LayoutError::Empty)?;
        let number = last
            .number
            .checked_add(1)
            .ok_or(LayoutError::TrackNumberOverflow(last.number))?;

        let lead_out = Track {
            number,
            attr: TRACK_ATTR_AUDIO,
            sector_size: last.sector_size,
            ..Track::default()
        };
        self.add_track(lead_out, None, 0)
    }

    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks
    }
}

fn to_sector(track: u8, value: i64) -> LayoutResult<u32> {
    u32::try_from(value).map_err(|_| LayoutError::OutOfRange { track, value })
}
