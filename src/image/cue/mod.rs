use crate::image::cue::error::{CueError, CueResult};
use crate::image::cue::line::CueLine;
use crate::image::cue::path::{HostPathResolver, PathResolver};
use crate::image::disc::Disc;
use crate::image::layout::TrackLayoutBuilder;
use crate::image::source::{SourceKind, TrackSource};
use crate::image::track::{Track, TrackType};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod error;
pub mod line;
pub mod path;

/// Longest line accepted before the file is treated as something other than a cue sheet.
pub const MAX_LINE_LENGTH: usize = 512;

pub struct CueParser {
    cue_path: PathBuf,
    resolver: Arc<dyn PathResolver>,
}

/// Parser state between two lines.
#[derive(Default)]
struct CueState {
    builder: TrackLayoutBuilder,
    file: Option<Arc<TrackSource>>,
    pending: Option<Track>,
    prestart: Option<u32>,
    curr_pregap: u32,
    mcn: String,
}

impl CueState {
    fn finalize_pending(&mut self) -> CueResult<()> {
        if let Some(track) = self.pending.take() {
            self.builder
                .add_track(track, self.prestart, self.curr_pregap)?;
        }
        Ok(())
    }
}

impl CueParser {
    pub fn new(cue_path: impl AsRef<Path>) -> Self {
        Self {
            cue_path: cue_path.as_ref().to_path_buf(),
            resolver: Arc::new(HostPathResolver),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn PathResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn parse(&self) -> CueResult<Disc> {
        let mut reader = BufReader::new(File::open(&self.cue_path)?);
        let cue_dir = self
            .cue_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut state = CueState::default();

        let mut buf = Vec::with_capacity(MAX_LINE_LENGTH + 1);
        let mut number = 0;
        loop {
            buf.clear();
            // never buffer more than one over-long line's worth of a binary file
            let read = reader
                .by_ref()
                .take(MAX_LINE_LENGTH as u64 + 1)
                .read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }
            number += 1;
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }
            if buf.len() > MAX_LINE_LENGTH {
                return Err(CueError::LineTooLong(number, MAX_LINE_LENGTH));
            }
            let line = String::from_utf8_lossy(&buf);
            self.parse_line(&mut state, &line, &cue_dir)?;
        }

        state.finalize_pending()?;
        if state.builder.tracks().is_empty() {
            return Err(CueError::NoTracks);
        }
        state.builder.add_lead_out()?;

        let tracks = state.builder.into_tracks();
        debug!(
            "Loaded cue sheet {} with {} tracks",
            self.cue_path.display(),
            tracks.len()
        );
        Ok(Disc::new(tracks, state.mcn))
    }

    fn parse_line(&self, state: &mut CueState, line: &str, cue_dir: &Path) -> CueResult<()> {
        let mut line = CueLine::new(line);
        let command = line.keyword();

        match command.as_str() {
            "TRACK" => {
                state.finalize_pending()?;
                state.prestart = None;
                state.curr_pregap = 0;

                let number = line.int::<u8>("TRACK")?;
                let type_str = line.keyword();
                let track_type = TrackType::parse(&type_str)
                    .ok_or(CueError::InvalidTrackType(type_str))?;
                let file = state
                    .file
                    .clone()
                    .ok_or(CueError::TrackWithoutFile(number))?;

                let mut track = Track {
                    number,
                    file: Some(file),
                    ..Track::default()
                };
                track.apply_type(track_type);
                state.pending = Some(track);
            }
            "INDEX" => {
                let index = line.int::<u32>("INDEX")?;
                let frame = line.frames("INDEX")?;
                match index {
                    1 => {
                        if let Some(track) = state.pending.as_mut() {
                            track.start = frame;
                        }
                    }
                    0 => state.prestart = Some(frame),
                    _ => {}
                }
            }
            "FILE" => {
                state.finalize_pending()?;

                let filename = line.string("FILE")?;
                let kind = SourceKind::from_cue_type(&line.keyword());
                let path = self
                    .resolver
                    .resolve(&filename, cue_dir)
                    .ok_or_else(|| {
                        warn!("Cannot find '{filename}' next to {}", self.cue_path.display());
                        CueError::FileNotFound(filename.clone())
                    })?;
                state.file = Some(Arc::new(TrackSource::open(path, kind)?));
            }
            "PREGAP" => state.curr_pregap = line.frames("PREGAP")?,
            "CATALOG" => state.mcn = line.string("CATALOG")?,
            // ignored
            "CDTEXTFILE" | "FLAGS" | "ISRC" | "PERFORMER" | "POSTGAP" | "REM"
            | "SONGWRITER" | "TITLE" | "" => {}
            _ => return Err(CueError::UnknownCommand(command)),
        }

        Ok(())
    }
}
