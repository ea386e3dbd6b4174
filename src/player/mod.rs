pub mod capture;
pub mod error;
pub mod mixer;

use crate::cd::{REDBOOK_FRAMES_PER_SECOND, REDBOOK_PCM_FRAMES_PER_SECOND};
use crate::image::disc::Disc;
use crate::image::source::TrackSource;
use crate::player::error::{PlayerError, PlayerResult};
use crate::player::mixer::{AddFrames, Mixer, MixerChannel, select_add_frames};
use log::{debug, trace, warn};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

pub const CHANNEL_NAME: &str = "CDAUDIO";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioStatus {
    pub playing: bool,
    pub paused: bool,
}

#[derive(Default)]
struct PlayerState {
    disc: Option<Arc<Disc>>,
    source: Option<Arc<TrackSource>>,
    start_sector: u32,
    total_redbook_frames: u32,
    total_track_frames: u64,
    played_track_frames: u64,
    playing: bool,
    paused: bool,
    add_frames: Option<AddFrames>,
    buffer: Vec<u8>,
}

/// Redbook audio player shared by every mounted image.
///
/// The control path (`play_audio_sector`, `pause_audio`, `stop_audio`) and the
/// mixer thread (`mixer_callback`) share one lock over the player state. When a
/// track runs dry before the requested span is done, the callback releases the
/// lock and starts a new segment at the first sector it has not played yet,
/// which carries playback across track and file boundaries.
pub struct AudioPlayer {
    state: Mutex<PlayerState>,
    channel: Option<Arc<dyn MixerChannel>>,
}

impl AudioPlayer {
    /// Creates a player with its own mixer channel. The channel's handler only
    /// holds a weak reference, so dropping the player silences it.
    pub fn attach(mixer: &dyn Mixer) -> Arc<Self> {
        Arc::new_cyclic(|player: &Weak<AudioPlayer>| {
            let player = player.clone();
            let channel = mixer.add_channel(
                Box::new(move |frames| {
                    if let Some(player) = player.upgrade() {
                        player.mixer_callback(frames);
                    }
                }),
                REDBOOK_PCM_FRAMES_PER_SECOND,
                CHANNEL_NAME,
            );
            AudioPlayer {
                state: Mutex::new(PlayerState::default()),
                channel: Some(channel),
            }
        })
    }

    /// A player without output; every playback request fails.
    pub fn detached() -> Arc<Self> {
        Arc::new(AudioPlayer {
            state: Mutex::new(PlayerState::default()),
            channel: None,
        })
    }

    pub fn channel(&self) -> Option<&Arc<dyn MixerChannel>> {
        self.channel.as_ref()
    }

    fn lock(&self) -> PlayerResult<MutexGuard<'_, PlayerState>> {
        self.state.lock().map_err(|_| PlayerError::LockPoisoned)
    }

    /// Plays `len` sectors of `disc` starting at absolute sector `start`.
    /// Any failure leaves the player stopped.
    pub fn play_audio_sector(&self, disc: &Arc<Disc>, start: u32, len: u32) -> PlayerResult<()> {
        let result = self.start_segment(disc, start, len);
        if let Err(e) = &result {
            debug!("PlayAudioSector at sector {start} for {len} sectors failed: {e}");
            self.stop_audio();
        }
        result
    }

    fn start_segment(&self, disc: &Arc<Disc>, start: u32, len: u32) -> PlayerResult<()> {
        if len == 0 {
            return Err(PlayerError::EmptyRequest);
        }
        let track = disc
            .get_track(start)
            .ok_or(PlayerError::SectorNotFound(start))?;
        if track.is_data() {
            return Err(PlayerError::DataTrack(track.number));
        }
        let source = track
            .file
            .clone()
            .ok_or(PlayerError::NoSource(track.number))?;
        let channel = self.channel.as_ref().ok_or(PlayerError::NoChannel)?;

        // a start inside the pregap keeps the end sector and begins at the track
        let relative_start = start as i64 - track.start as i64;
        let (start, len) = if relative_start < 0 {
            let pregap = relative_start.unsigned_abs();
            if len as u64 <= pregap {
                return Err(PlayerError::PregapOnly {
                    track: track.number,
                    start,
                    end: start as u64 + len as u64,
                });
            }
            (track.start, len - pregap as u32)
        } else {
            (start, len)
        };

        let max_relative = track.length.saturating_sub(1) as i64;
        let offset =
            track.skip + relative_start.clamp(0, max_relative) as u64 * track.sector_size as u64;
        source.seek(offset).map_err(|source| {
            warn!(
                "Track {} failed to seek to byte {offset}, so cancelling playback",
                track.number
            );
            PlayerError::Seek {
                track: track.number,
                offset,
                source,
            }
        })?;

        let channels = source.channels();
        let rate = source.rate();
        let native = source.endian().is_native();

        let mut state = self.lock()?;
        state.disc = Some(disc.clone());
        state.source = Some(source);
        state.start_sector = start;
        state.total_redbook_frames = len;
        state.playing = true;
        state.paused = false;
        state.add_frames = Some(select_add_frames(channels, native));
        state.played_track_frames = 0;
        state.total_track_frames =
            (rate as u64 * len as u64).div_ceil(REDBOOK_FRAMES_PER_SECOND as u64);

        debug!(
            "Play sector {start} to {} in track {} [start {}, end {}] for {} PCM frames at rate {rate}",
            start as u64 + len as u64,
            track.number,
            track.start,
            track.end(),
            state.total_track_frames
        );

        channel.set_freq(rate);
        channel.enable(true);
        Ok(())
    }

    pub fn pause_audio(&self, resume: bool) -> PlayerResult<()> {
        let mut state = match self.lock() {
            Ok(state) => state,
            Err(e) => {
                self.stop_audio();
                return Err(e);
            }
        };
        state.paused = !resume;
        if let Some(channel) = &self.channel {
            channel.enable(resume);
        }
        debug!(
            "PauseAudio => audio is now {}",
            if resume { "unpaused" } else { "paused" }
        );
        Ok(())
    }

    pub fn stop_audio(&self) {
        // clearing the flags is safe even after a panic elsewhere
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.stop_locked(&mut state);
    }

    fn stop_locked(&self, state: &mut PlayerState) {
        state.playing = false;
        state.paused = false;
        if let Some(channel) = &self.channel {
            channel.enable(false);
        }
        trace!("StopAudio => stopped playback and halted the mixer");
    }

    /// Applies per-side volume (0..=255) and output routing.
    pub fn channel_control(&self, volume: [u8; 2], map: [u8; 2]) {
        let Some(channel) = &self.channel else {
            debug!("ChannelControl before any output channel exists");
            return;
        };
        channel.set_scale(volume[0] as f32 / 255.0, volume[1] as f32 / 255.0);
        channel.map_channels(map[0], map[1]);
    }

    pub fn status(&self) -> AudioStatus {
        self.lock()
            .map(|state| AudioStatus {
                playing: state.playing,
                paused: state.paused,
            })
            .unwrap_or_default()
    }

    /// Sector the player has reached, if a segment of `disc` has been started.
    pub fn position(&self, disc: &Arc<Disc>) -> Option<u32> {
        let state = self.lock().ok()?;
        let playing_disc = state.disc.as_ref()?;
        if !Arc::ptr_eq(playing_disc, disc) {
            return None;
        }
        let rate = state.source.as_ref()?.rate().max(1) as u64;
        let played = (state.played_track_frames * REDBOOK_FRAMES_PER_SECOND as u64).div_ceil(rate);
        u32::try_from(state.start_sector as u64 + played).ok()
    }

    /// Stops and forgets `disc` if it is the one being played.
    pub fn release_disc(&self, disc: &Arc<Disc>) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if state
            .disc
            .as_ref()
            .is_some_and(|playing| Arc::ptr_eq(playing, disc))
        {
            self.stop_locked(&mut state);
            state.disc = None;
            state.source = None;
            state.add_frames = None;
        }
    }

    /// Pull handler run on the mixer thread.
    pub fn mixer_callback(&self, frames: usize) {
        if frames == 0 {
            return;
        }
        let mut guard = match self.lock() {
            Ok(guard) => guard,
            Err(e) => {
                warn!("CD audio callback could not lock the player: {e}");
                self.stop_audio();
                return;
            }
        };
        let state = &mut *guard;
        if !state.playing || state.paused {
            return;
        }
        let (Some(disc), Some(source), Some(add_frames), Some(channel)) = (
            state.disc.clone(),
            state.source.clone(),
            state.add_frames,
            self.channel.as_ref(),
        ) else {
            return;
        };

        let frame_size = source.bytes_per_frame();
        let wanted = frames * frame_size;
        if state.buffer.len() < wanted {
            state.buffer.resize(wanted, 0);
        }
        let decoded = source.decode(&mut state.buffer[..wanted], frames);
        state.played_track_frames += decoded as u64;
        add_frames(channel.as_ref(), decoded, &state.buffer[..decoded * frame_size]);

        if state.played_track_frames >= state.total_track_frames {
            trace!(
                "Callback stopping because played frames ({}) >= total frames ({})",
                state.played_track_frames, state.total_track_frames
            );
            self.stop_locked(state);
            return;
        }
        if decoded > 0 {
            return;
        }

        // the source ran dry before the span did: continue on the next track
        let len = state.total_redbook_frames as u128;
        let completed = (state.played_track_frames as u128 * len)
            .div_ceil(state.total_track_frames as u128) as u32;
        if completed == 0 {
            warn!(
                "Track source at sector {} produced no audio, stopping playback",
                state.start_sector
            );
            self.stop_locked(state);
            return;
        }
        let next_start = state.start_sector + completed;
        let remaining = state.total_redbook_frames - completed;
        drop(guard);

        debug!("Continuing playback at sector {next_start} for {remaining} sectors");
        // play_audio_sector has already stopped the player on failure
        if let Err(e) = self.play_audio_sector(&disc, next_start, remaining) {
            debug!("Continuation at sector {next_start} ended playback: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::layout::TrackLayoutBuilder;
    use crate::image::source::SourceKind;
    use crate::image::track::{Track, TrackType};
    use crate::player::capture::{CaptureChannel, CaptureMixer};
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use tempfile::{TempDir, tempdir};

    const SECTOR: usize = 2352;
    const FRAMES_PER_SECTOR: usize = 588;

    fn source(dir: &TempDir, name: &str, sectors: usize, fill: u8) -> Arc<TrackSource> {
        let path = dir.path().join(name);
        fs::write(&path, vec![fill; sectors * SECTOR]).unwrap();
        Arc::new(TrackSource::open(path, SourceKind::Binary).unwrap())
    }

    fn track(number: u8, track_type: TrackType, index1: u32, file: &Arc<TrackSource>) -> Track {
        let mut track = Track {
            number,
            start: index1,
            file: Some(file.clone()),
            ..Track::default()
        };
        track.apply_type(track_type);
        track
    }

    fn build(entries: Vec<(Track, u32)>) -> Arc<Disc> {
        let mut builder = TrackLayoutBuilder::new();
        for (track, pregap) in entries {
            builder.add_track(track, None, pregap).unwrap();
        }
        builder.add_lead_out().unwrap();
        Arc::new(Disc::new(builder.into_tracks(), String::new()))
    }

    fn attached() -> (CaptureMixer, Arc<AudioPlayer>, Arc<CaptureChannel>) {
        let mixer = CaptureMixer::new();
        let player = AudioPlayer::attach(&mixer);
        let channel = mixer.channels()[0].clone();
        (mixer, player, channel)
    }

    fn pump_until_stopped(channel: &CaptureChannel, frames: usize) -> usize {
        let mut pumps = 0;
        while channel.pump(frames) {
            pumps += 1;
            assert!(pumps < 10_000, "playback never stopped");
        }
        pumps
    }

    #[test]
    fn playback_stops_exactly_when_span_is_exhausted() {
        let dir = tempdir().unwrap();
        let file = source(&dir, "audio.bin", 75, 0x11);
        let disc = build(vec![(track(1, TrackType::Audio, 0, &file), 0)]);
        let (_mixer, player, channel) = attached();

        player.play_audio_sector(&disc, 0, 15).unwrap();
        assert!(channel.is_enabled());
        assert_eq!(channel.freq(), 44_100);

        // 15 sectors are 8820 PCM frames
        for _ in 0..8 {
            assert!(channel.pump(1000));
            assert!(player.status().playing);
        }
        assert!(channel.pump(1000));
        assert_eq!(player.status(), AudioStatus::default());
        assert!(!channel.is_enabled());
        assert_eq!(channel.frames(), 9000);
        assert!(!channel.pump(1000));
    }

    #[test]
    fn whole_track_plays_to_the_end_of_its_file() {
        let dir = tempdir().unwrap();
        let file = source(&dir, "audio.bin", 75, 0x11);
        let disc = build(vec![(track(1, TrackType::Audio, 0, &file), 0)]);
        let (_mixer, player, channel) = attached();

        player.play_audio_sector(&disc, 0, 75).unwrap();
        pump_until_stopped(&channel, 1000);

        let samples = channel.take_samples();
        assert_eq!(samples.len() / 2, 75 * FRAMES_PER_SECTOR);
        assert!(samples.iter().all(|&s| s == 0x1111));
    }

    #[test]
    fn pause_keeps_counters_and_resume_continues() {
        let dir = tempdir().unwrap();
        let file = source(&dir, "audio.bin", 75, 0x11);
        let disc = build(vec![(track(1, TrackType::Audio, 0, &file), 0)]);
        let (_mixer, player, channel) = attached();

        player.play_audio_sector(&disc, 0, 75).unwrap();
        assert!(channel.pump(FRAMES_PER_SECTOR * 10));
        let position = player.position(&disc);
        assert_eq!(position, Some(10));

        player.pause_audio(false).unwrap();
        assert_eq!(
            player.status(),
            AudioStatus {
                playing: true,
                paused: true
            }
        );
        assert!(!channel.pump(1000));
        player.mixer_callback(1000);
        assert_eq!(player.position(&disc), position);

        player.pause_audio(true).unwrap();
        assert!(channel.pump(FRAMES_PER_SECTOR * 5));
        assert_eq!(player.position(&disc), Some(15));
        assert_eq!(channel.frames(), FRAMES_PER_SECTOR * 15);
    }

    #[test]
    fn pregap_start_is_clamped_to_track_start() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("disc.bin");
        let mut data = vec![0x11u8; 75 * SECTOR];
        data.extend(vec![0x22u8; 75 * SECTOR]);
        fs::write(&path, data).unwrap();
        let file = Arc::new(TrackSource::open(path, SourceKind::Binary).unwrap());

        let disc = build(vec![
            (track(1, TrackType::Audio, 0, &file), 0),
            (track(2, TrackType::Audio, 75, &file), 150),
        ]);
        assert_eq!(disc.tracks()[1].start, 225);
        let (_mixer, player, channel) = attached();

        player.play_audio_sector(&disc, 150, 100).unwrap();
        assert_eq!(player.position(&disc), Some(225));

        pump_until_stopped(&channel, 1000);
        let samples = channel.take_samples();
        assert!(samples.iter().all(|&s| s == 0x2222));
        // 25 sectors remain after the 75 pregap sectors
        assert!(samples.len() / 2 >= 25 * FRAMES_PER_SECTOR);
        assert!(samples.len() / 2 < 25 * FRAMES_PER_SECTOR + 1000);
    }

    #[test]
    fn request_inside_pregap_only_fails() {
        let dir = tempdir().unwrap();
        let file = source(&dir, "disc.bin", 150, 0x11);
        let disc = build(vec![
            (track(1, TrackType::Audio, 0, &file), 0),
            (track(2, TrackType::Audio, 75, &file), 150),
        ]);
        let (_mixer, player, _channel) = attached();

        assert!(matches!(
            player.play_audio_sector(&disc, 150, 50),
            Err(PlayerError::PregapOnly { track: 2, .. })
        ));
        assert!(!player.status().playing);
    }

    #[test]
    fn playback_continues_into_next_file() {
        let dir = tempdir().unwrap();
        let first = source(&dir, "01.bin", 75, 0x11);
        let second = source(&dir, "02.bin", 75, 0x22);
        let disc = build(vec![
            (track(1, TrackType::Audio, 0, &first), 0),
            (track(2, TrackType::Audio, 0, &second), 0),
        ]);
        let (_mixer, player, channel) = attached();

        player.play_audio_sector(&disc, 0, 150).unwrap();
        pump_until_stopped(&channel, 1000);

        let samples = channel.take_samples();
        assert_eq!(samples.len() / 2, 150 * FRAMES_PER_SECTOR);
        let (head, tail) = samples.split_at(75 * FRAMES_PER_SECTOR * 2);
        assert!(head.iter().all(|&s| s == 0x1111));
        assert!(tail.iter().all(|&s| s == 0x2222));
    }

    #[test]
    fn decoded_audio_files_play_in_sequence() {
        let dir = tempdir().unwrap();
        let mut files = Vec::new();
        for (name, value) in [("01.wav", 1000i16), ("02.wav", -1000i16)] {
            let path = dir.path().join(name);
            let mut out = fs::File::create(&path).unwrap();
            crate::wav::write_wav(&mut out, 2, 44_100, &vec![value; 44_100 * 2]).unwrap();
            files.push(Arc::new(TrackSource::open(path, SourceKind::Audio).unwrap()));
        }

        let disc = build(vec![
            (track(1, TrackType::Audio, 0, &files[0]), 0),
            (track(2, TrackType::Audio, 0, &files[1]), 0),
        ]);
        assert_eq!(disc.tracks()[1].start, 75);
        let (_mixer, player, channel) = attached();

        player.play_audio_sector(&disc, 0, 150).unwrap();
        pump_until_stopped(&channel, 4096);

        let samples = channel.take_samples();
        assert_eq!(samples.len() / 2, 88_200);
        assert_eq!(samples[0], 1000);
        assert_eq!(samples[samples.len() - 1], -1000);
    }

    #[test]
    fn continuation_into_data_track_stops_playback() {
        let dir = tempdir().unwrap();
        let audio = source(&dir, "01.bin", 75, 0x11);
        let data = source(&dir, "02.bin", 75, 0);
        let disc = build(vec![
            (track(1, TrackType::Audio, 0, &audio), 0),
            (track(2, TrackType::Mode1_2352, 0, &data), 0),
        ]);
        let (_mixer, player, channel) = attached();

        player.play_audio_sector(&disc, 0, 150).unwrap();
        pump_until_stopped(&channel, 1000);

        assert_eq!(player.status(), AudioStatus::default());
        assert!(!channel.is_enabled());
        let samples = channel.take_samples();
        assert_eq!(samples.len() / 2, 75 * FRAMES_PER_SECTOR);
        assert!(samples.iter().all(|&s| s == 0x1111));
    }

    #[test]
    fn mixer_thread_and_control_calls_interleave_cleanly() {
        let dir = tempdir().unwrap();
        let first = source(&dir, "01.bin", 75, 0x11);
        let second = source(&dir, "02.bin", 75, 0x22);
        let third = source(&dir, "03.bin", 75, 0x33);
        let disc = build(vec![
            (track(1, TrackType::Audio, 0, &first), 0),
            (track(2, TrackType::Audio, 0, &second), 0),
            (track(3, TrackType::Audio, 0, &third), 0),
        ]);
        let (_mixer, player, channel) = attached();
        let done = AtomicBool::new(false);

        thread::scope(|scope| {
            let mixer_thread = scope.spawn(|| {
                let mut pumps = 0usize;
                while !done.load(Ordering::Acquire) {
                    if channel.pump(FRAMES_PER_SECTOR) {
                        pumps += 1;
                    } else {
                        thread::yield_now();
                    }
                }
                pumps
            });

            for round in 0..2_000u32 {
                let start = (round * 37) % 225;
                let len = 1 + (round * 11) % 150;
                player.play_audio_sector(&disc, start, len).unwrap();
                if round % 3 == 0 {
                    player.pause_audio(false).unwrap();
                    let _ = player.position(&disc);
                    player.pause_audio(true).unwrap();
                }
                if let Some(sector) = player.position(&disc) {
                    assert!(sector <= 225);
                }
                if round % 5 == 0 {
                    player.stop_audio();
                }
            }

            done.store(true, Ordering::Release);
            mixer_thread.join().unwrap();
        });

        player.stop_audio();
        assert_eq!(player.status(), AudioStatus::default());
        assert!(!channel.is_enabled());
        assert!(!channel.pump(FRAMES_PER_SECTOR));

        let samples = channel.take_samples();
        assert!(
            samples
                .iter()
                .all(|&s| s == 0x1111 || s == 0x2222 || s == 0x3333)
        );
    }

    #[test]
    fn data_track_cannot_be_played() {
        let dir = tempdir().unwrap();
        let file = source(&dir, "game.bin", 20, 0);
        let disc = build(vec![(track(1, TrackType::Mode1_2352, 0, &file), 0)]);
        let (_mixer, player, _channel) = attached();

        assert!(matches!(
            player.play_audio_sector(&disc, 0, 10),
            Err(PlayerError::DataTrack(1))
        ));
    }

    #[test]
    fn invalid_requests_leave_player_stopped() {
        let dir = tempdir().unwrap();
        let file = source(&dir, "audio.bin", 75, 0x11);
        let disc = build(vec![(track(1, TrackType::Audio, 0, &file), 0)]);
        let (_mixer, player, channel) = attached();

        player.play_audio_sector(&disc, 0, 75).unwrap();
        assert!(matches!(
            player.play_audio_sector(&disc, 0, 0),
            Err(PlayerError::EmptyRequest)
        ));
        assert!(!player.status().playing);
        assert!(!channel.is_enabled());

        assert!(matches!(
            player.play_audio_sector(&disc, 75, 10),
            Err(PlayerError::SectorNotFound(75))
        ));
    }

    #[test]
    fn detached_player_has_no_output() {
        let dir = tempdir().unwrap();
        let file = source(&dir, "audio.bin", 75, 0x11);
        let disc = build(vec![(track(1, TrackType::Audio, 0, &file), 0)]);
        let player = AudioPlayer::detached();

        assert!(matches!(
            player.play_audio_sector(&disc, 0, 10),
            Err(PlayerError::NoChannel)
        ));
        // no channel to adjust, must not panic
        player.channel_control([255, 255], [0, 1]);
    }

    #[test]
    fn stop_is_idempotent() {
        let (_mixer, player, channel) = attached();
        player.stop_audio();
        player.stop_audio();
        assert_eq!(player.status(), AudioStatus::default());
        assert!(!channel.is_enabled());
    }

    #[test]
    fn channel_control_scales_volume() {
        let (_mixer, player, channel) = attached();
        player.channel_control([255, 0], [1, 0]);
        assert_eq!(channel.scale(), [1.0, 0.0]);
        assert_eq!(channel.map(), [1, 0]);
    }

    #[test]
    fn position_is_only_reported_for_the_playing_disc() {
        let dir = tempdir().unwrap();
        let file = source(&dir, "audio.bin", 75, 0x11);
        let disc = build(vec![(track(1, TrackType::Audio, 0, &file), 0)]);
        let other = build(vec![(track(1, TrackType::Audio, 0, &file), 0)]);
        let (_mixer, player, _channel) = attached();

        assert_eq!(player.position(&disc), None);
        player.play_audio_sector(&disc, 10, 20).unwrap();
        assert_eq!(player.position(&disc), Some(10));
        assert_eq!(player.position(&other), None);

        player.release_disc(&disc);
        assert_eq!(player.position(&disc), None);
        assert!(!player.status().playing);
    }
}
