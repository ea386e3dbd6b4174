use crate::cd::{
    MAX_REDBOOK_SECTOR, MAX_REDBOOK_TRACKS, MIN_REDBOOK_TRACKS, Msf, sector_to_absolute_msf,
};
use crate::image::track::Track;
use log::{debug, trace};

/// First and last playable track numbers plus the lead-out position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioTracks {
    pub first: u8,
    pub last: u8,
    pub lead_out: Msf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackInfo {
    pub start: Msf,
    pub attr: u8,
}

/// Q sub-channel style position report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSub {
    pub attr: u8,
    pub track: u8,
    pub index: u8,
    pub relative: Msf,
    pub absolute: Msf,
}

/// A loaded disc: the ordered track list ending in the lead-out, and the
/// media catalog number from the cue sheet.
#[derive(Debug, Default)]
pub struct Disc {
    tracks: Vec<Track>,
    mcn: String,
}

impl Disc {
    pub fn new(tracks: Vec<Track>, mcn: String) -> Self {
        Self { tracks, mcn }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn mcn(&self) -> &str {
        &self.mcn
    }

    pub fn lead_out(&self) -> Option<&Track> {
        self.tracks.last()
    }

    /// Finds the track owning `sector`. Sectors in the gap before a track's
    /// start belong to that track.
    pub fn get_track(&self, sector: u32) -> Option<&Track> {
        let lead_out = self.tracks.last()?;
        if sector > MAX_REDBOOK_SECTOR
            || self.tracks.len() < MIN_REDBOOK_TRACKS
            || sector >= lead_out.start
        {
            debug!("GetTrack at sector {sector} is outside the playable range");
            return None;
        }

        let mut lower_bound = self.tracks[0].start;
        for track in &self.tracks {
            let upper_bound = track.end();
            if lower_bound <= sector && sector < upper_bound {
                trace!(
                    "GetTrack at sector {sector} => track {} [start {}, end {upper_bound}]",
                    track.number, track.start
                );
                return Some(track);
            }
            lower_bound = upper_bound;
        }

        debug!(
            "GetTrack at sector {sector} fell outside the bounds of our {} tracks",
            self.tracks.len()
        );
        None
    }

    pub fn audio_tracks(&self) -> Option<AudioTracks> {
        if self.tracks.len() < MIN_REDBOOK_TRACKS {
            debug!(
                "GetAudioTracks: image has too few tracks: {}",
                self.tracks.len()
            );
            return None;
        }
        let lead_out = self.tracks.last()?;

        Some(AudioTracks {
            first: 1,
            last: (self.tracks.len() - 1).min(MAX_REDBOOK_TRACKS as usize) as u8,
            lead_out: sector_to_absolute_msf(lead_out.start),
        })
    }

    pub fn audio_track_info(&self, track: u8) -> Option<TrackInfo> {
        if track < 1 || track > MAX_REDBOOK_TRACKS || track as usize >= self.tracks.len() {
            debug!("GetAudioTrackInfo: track {track} is out of range");
            return None;
        }
        let track = &self.tracks[track as usize - 1];

        Some(TrackInfo {
            start: sector_to_absolute_msf(track.start),
            attr: track.attr,
        })
    }

    pub fn has_data_track(&self) -> bool {
        self.tracks.iter().any(Track::is_data)
    }

    /// Position report for the sector the player has reached, or for the
    /// first audio track when nothing has played yet.
    pub fn audio_sub(&self, position: Option<u32>) -> AudioSub {
        let mut sub = AudioSub {
            attr: 0,
            track: 1,
            index: 1,
            relative: Msf::default(),
            absolute: sector_to_absolute_msf(0),
        };
        let Some(first) = self.tracks.first() else {
            return sub;
        };

        let (track, absolute, relative) = match position {
            Some(sector) => match self.get_track(sector) {
                Some(track) => (track, sector, sector.saturating_sub(track.start)),
                None => (first, first.start, 0),
            },
            None => {
                let track = self.tracks.iter().find(|t| t.is_audio()).unwrap_or(first);
                (track, track.start, 0)
            }
        };

        sub.attr = track.attr;
        sub.track = track.number;
        sub.absolute = sector_to_absolute_msf(absolute);
        sub.relative = Msf::from_frames(relative);
        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cd::{TRACK_ATTR_AUDIO, TRACK_ATTR_DATA};

    fn track(number: u8, attr: u8, start: u32, length: u32) -> Track {
        Track {
            number,
            attr,
            start,
            length,
            sector_size: 2352,
            ..Track::default()
        }
    }

    /// Data track 0..1000, audio track with a 150-sector pregap at 1150..2150.
    fn disc() -> Disc {
        Disc::new(
            vec![
                track(1, TRACK_ATTR_DATA, 0, 1000),
                track(2, TRACK_ATTR_AUDIO, 1150, 1000),
                track(3, TRACK_ATTR_AUDIO, 2150, 0),
            ],
            "0000000000000".to_string(),
        )
    }

    #[test]
    fn sectors_resolve_to_owning_track() {
        let disc = disc();
        assert_eq!(disc.get_track(0).unwrap().number, 1);
        assert_eq!(disc.get_track(999).unwrap().number, 1);
        assert_eq!(disc.get_track(1150).unwrap().number, 2);
        assert_eq!(disc.get_track(2149).unwrap().number, 2);
    }

    #[test]
    fn pregap_sectors_resolve_to_following_track() {
        let disc = disc();
        assert_eq!(disc.get_track(1000).unwrap().number, 2);
        assert_eq!(disc.get_track(1149).unwrap().number, 2);
    }

    #[test]
    fn lead_out_and_beyond_are_unresolved() {
        let disc = disc();
        assert!(disc.get_track(2150).is_none());
        assert!(disc.get_track(MAX_REDBOOK_SECTOR + 1).is_none());
        assert!(Disc::default().get_track(0).is_none());
        assert!(Disc::new(vec![track(1, TRACK_ATTR_DATA, 0, 10)], String::new())
            .get_track(0)
            .is_none());
    }

    #[test]
    fn resolved_sector_lies_inside_track_span() {
        let disc = disc();
        for sector in (0..2150).step_by(37) {
            let track = disc.get_track(sector).unwrap();
            assert!(sector < track.start + track.length);
        }
    }

    #[test]
    fn audio_tracks_reports_lead_out_with_lead_in() {
        let tracks = disc().audio_tracks().unwrap();
        assert_eq!(tracks.first, 1);
        assert_eq!(tracks.last, 2);
        assert_eq!(tracks.lead_out, Msf::from_frames(2150 + 150));
        assert!(Disc::default().audio_tracks().is_none());
    }

    #[test]
    fn audio_track_info_bounds() {
        let disc = disc();
        let info = disc.audio_track_info(2).unwrap();
        assert_eq!(info.start, Msf::from_frames(1300));
        assert_eq!(info.attr, TRACK_ATTR_AUDIO);

        assert!(disc.audio_track_info(0).is_none());
        // lead-out is not a queryable track
        assert!(disc.audio_track_info(3).is_none());
        assert!(disc.audio_track_info(100).is_none());
    }

    #[test]
    fn data_track_detection() {
        assert!(disc().has_data_track());
        let audio_only = Disc::new(
            vec![
                track(1, TRACK_ATTR_AUDIO, 0, 10),
                track(2, TRACK_ATTR_AUDIO, 10, 0),
            ],
            String::new(),
        );
        assert!(!audio_only.has_data_track());
    }

    #[test]
    fn audio_sub_defaults_to_first_audio_track() {
        let sub = disc().audio_sub(None);
        assert_eq!(sub.track, 2);
        assert_eq!(sub.attr, TRACK_ATTR_AUDIO);
        assert_eq!(sub.absolute, Msf::from_frames(1150 + 150));
        assert_eq!(sub.relative, Msf::default());
    }

    #[test]
    fn audio_sub_reports_player_position() {
        let sub = disc().audio_sub(Some(1225));
        assert_eq!(sub.track, 2);
        assert_eq!(sub.index, 1);
        assert_eq!(sub.relative, Msf::new(0, 1, 0));
        assert_eq!(sub.absolute, Msf::from_frames(1375));
    }

    #[test]
    fn audio_sub_in_pregap_has_zero_relative_position() {
        let sub = disc().audio_sub(Some(1100));
        assert_eq!(sub.track, 2);
        assert_eq!(sub.relative, Msf::default());
    }

    #[test]
    fn audio_sub_outside_disc_falls_back_to_first_track() {
        let sub = disc().audio_sub(Some(5000));
        assert_eq!(sub.track, 1);
        assert_eq!(sub.attr, TRACK_ATTR_DATA);
        assert_eq!(sub.absolute, Msf::from_frames(150));
    }
}
