use crate::cd::REDBOOK_PCM_BYTES_PER_MS;
use crate::image::source::error::{SourceError, SourceResult};
use byteorder::{ByteOrder, NativeEndian};
use log::{debug, info, trace, warn};
use std::fmt;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::Time;

/// A compressed or PCM audio file (WAVE, FLAC, OGG, MP3, ...) decoded to
/// interleaved native-endian s16 frames.
pub struct AudioFile {
    path: PathBuf,
    rate: u32,
    channels: u8,
    duration_ms: Option<u64>,
    stream: Mutex<AudioStream>,
}

struct AudioStream {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_buf: Option<SampleBuffer<i16>>,
    pending: Vec<i16>,
    pending_pos: usize,
    channels: usize,
    // Frames between the packet a seek landed on and the requested time.
    skip_frames: u64,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref().to_path_buf();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::open_stream(&path)
            .inspect(|file| {
                info!(
                    "Loaded {display_name} [{} Hz, {}-channel, {:.1} minutes]",
                    file.rate,
                    file.channels,
                    file.duration_ms.unwrap_or(0) as f64 / 60_000.0
                )
            })
            .inspect_err(|e| warn!("Failed adding '{display_name}' as CDDA track: {e}"))
    }

    fn open_stream(path: &Path) -> SourceResult<Self> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let format_opts = FormatOptions {
            enable_gapless: true,
            ..Default::default()
        };
        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &format_opts,
            &MetadataOptions::default(),
        )?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| SourceError::NoAudioStream(path.to_path_buf()))?;

        let track_id = track.id;
        let rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| SourceError::UnknownSampleRate(path.to_path_buf()))?;
        let channels = track.codec_params.channels.map_or(2, |c| c.count()) as u8;
        let duration_ms = track
            .codec_params
            .time_base
            .zip(track.codec_params.n_frames)
            .map(|(base, frames)| {
                let time = base.calc_time(frames);
                time.seconds * 1000 + (time.frac * 1000.0).round() as u64
            });

        let decoder =
            symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        debug!("Audio stream {path:?}: id={track_id}, rate={rate}, channels={channels}");

        Ok(Self {
            path: path.to_path_buf(),
            rate,
            channels,
            duration_ms,
            stream: Mutex::new(AudioStream {
                format,
                decoder,
                track_id,
                sample_buf: None,
                pending: Vec::new(),
                pending_pos: 0,
                channels: channels.max(1) as usize,
                skip_frames: 0,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Duration expressed as Redbook PCM bytes, so it can be measured in
    /// sectors like a binary track.
    pub fn length(&self) -> Option<u64> {
        self.duration_ms
            .map(|ms| (ms as f64 * REDBOOK_PCM_BYTES_PER_MS) as u64)
    }

    /// Converts the Redbook byte offset to a time and seeks the decoder there.
    pub fn seek(&self, offset: u64) -> SourceResult<()> {
        let ms = (offset as f64 / REDBOOK_PCM_BYTES_PER_MS).round() as u64;
        let mut stream = self.stream.lock().map_err(|_| SourceError::LockPoisoned)?;
        stream.seek_ms(ms)
    }

    /// Raw sector reads on a decoded track yield its PCM.
    pub fn read(&self, buffer: &mut [u8], offset: u64) -> SourceResult<()> {
        let mut stream = self.stream.lock().map_err(|_| SourceError::LockPoisoned)?;
        stream.seek_ms((offset as f64 / REDBOOK_PCM_BYTES_PER_MS).round() as u64)?;

        let frame_size = stream.channels * 2;
        let frames = buffer.len() / frame_size;
        let decoded = stream.fill(buffer, frames);
        if decoded == 0 {
            return Err(SourceError::NoData(offset));
        }
        buffer[decoded * frame_size..].fill(0);
        Ok(())
    }

    pub fn decode(&self, buffer: &mut [u8], frames: usize) -> usize {
        match self.stream.lock() {
            Ok(mut stream) => stream.fill(buffer, frames),
            Err(_) => 0,
        }
    }
}

impl fmt::Debug for AudioFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioFile")
            .field("path", &self.path)
            .field("rate", &self.rate)
            .field("channels", &self.channels)
            .field("duration_ms", &self.duration_ms)
            .finish_non_exhaustive()
    }
}

impl AudioStream {
    fn seek_ms(&mut self, ms: u64) -> SourceResult<()> {
        let time = Time::new(ms / 1000, (ms % 1000) as f64 / 1000.0);
        let seeked = self.format.seek(
            SeekMode::Accurate,
            SeekTo::Time {
                time,
                track_id: Some(self.track_id),
            },
        )?;

        self.decoder.reset();
        self.pending.clear();
        self.pending_pos = 0;
        self.skip_frames = seeked.required_ts.saturating_sub(seeked.actual_ts);
        trace!(
            "Seeked to {ms} ms, skipping {} frames of pre-roll",
            self.skip_frames
        );
        Ok(())
    }

    /// Copies up to `frames` frames into `out`, decoding packets as needed.
    fn fill(&mut self, out: &mut [u8], frames: usize) -> usize {
        let wanted = (frames * self.channels).min(out.len() / 2);
        let mut written = 0;

        while written < wanted {
            if self.pending_pos >= self.pending.len() && !self.decode_packet() {
                break;
            }

            let available = self.pending.len() - self.pending_pos;
            let take = available.min(wanted - written);
            NativeEndian::write_i16_into(
                &self.pending[self.pending_pos..self.pending_pos + take],
                &mut out[written * 2..(written + take) * 2],
            );
            self.pending_pos += take;
            written += take;
        }

        written / self.channels
    }

    /// Decodes the next packet of our track into `pending`. Returns false at
    /// the end of the stream.
    fn decode_packet(&mut self) -> bool {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    return false;
                }
                Err(e) => {
                    warn!("Failed to read audio packet: {e}");
                    return false;
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!("Skipping corrupt audio packet: {e}");
                    continue;
                }
                Err(e) => {
                    warn!("Audio decode failed: {e}");
                    return false;
                }
            };

            let spec = *decoded.spec();
            let needed = decoded.capacity() * spec.channels.count();
            if self
                .sample_buf
                .as_ref()
                .is_none_or(|buf| buf.capacity() < needed)
            {
                self.sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
            }
            let Some(sample_buf) = self.sample_buf.as_mut() else {
                return false;
            };
            sample_buf.copy_interleaved_ref(decoded);

            let samples = sample_buf.samples();
            let skip = (self.skip_frames as usize * self.channels).min(samples.len());
            self.skip_frames -= (skip / self.channels) as u64;

            self.pending.clear();
            self.pending.extend_from_slice(&samples[skip..]);
            self.pending_pos = 0;

            if !self.pending.is_empty() {
                return true;
            }
        }
    }
}
