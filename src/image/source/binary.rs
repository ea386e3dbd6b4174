use crate::cd::{BYTES_PER_REDBOOK_PCM_FRAME, REDBOOK_CHANNELS, REDBOOK_PCM_FRAMES_PER_SECOND};
use crate::image::source::error::{SourceError, SourceResult};
use log::warn;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A raw sector dump (`.bin`/`.iso`). Audio tracks inside it are 44.1 kHz
/// stereo little-endian PCM.
#[derive(Debug)]
pub struct BinaryFile {
    path: PathBuf,
    file: Mutex<File>,
    length: u64,
}

impl BinaryFile {
    pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let length = file.metadata()?.len();

        Ok(Self {
            path,
            file: Mutex::new(file),
            length,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn rate(&self) -> u32 {
        REDBOOK_PCM_FRAMES_PER_SECOND
    }

    pub fn channels(&self) -> u8 {
        REDBOOK_CHANNELS
    }

    pub fn read(&self, buffer: &mut [u8], offset: u64) -> SourceResult<()> {
        let mut file = self.file.lock().map_err(|_| SourceError::LockPoisoned)?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buffer)?;
        Ok(())
    }

    /// Like `read`, but stops quietly at end of file. Returns the bytes read.
    pub fn read_available(&self, buffer: &mut [u8], offset: u64) -> SourceResult<usize> {
        let mut file = self.file.lock().map_err(|_| SourceError::LockPoisoned)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buffer.len() {
            match file.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    pub fn seek(&self, offset: u64) -> SourceResult<()> {
        let mut file = self.file.lock().map_err(|_| SourceError::LockPoisoned)?;
        file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Reads from the current position, rounding a partial trailing PCM frame
    /// up to a whole (zero-padded) frame.
    pub fn decode(&self, buffer: &mut [u8], frames: usize) -> usize {
        let frame_size = BYTES_PER_REDBOOK_PCM_FRAME as usize;
        let wanted = (frames * frame_size).min(buffer.len() - buffer.len() % frame_size);

        let Ok(mut file) = self.file.lock() else {
            return 0;
        };

        // one read per call; a short read yields fewer frames
        let filled = loop {
            match file.read(&mut buffer[..wanted]) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Read of {:?} failed during playback: {e}", self.path);
                    break 0;
                }
            }
        };

        let decoded = filled.div_ceil(frame_size);
        buffer[filled..decoded * frame_size].fill(0);
        decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn binary_with(data: &[u8]) -> (NamedTempFile, BinaryFile) {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(data).unwrap();
        let file = BinaryFile::open(tmp.path()).unwrap();
        (tmp, file)
    }

    #[test]
    fn read_is_positioned() {
        let data: Vec<u8> = (0..=255).collect();
        let (_tmp, file) = binary_with(&data);

        let mut buf = [0u8; 4];
        file.read(&mut buf, 10).unwrap();
        assert_eq!(buf, [10, 11, 12, 13]);
        file.read(&mut buf, 0).unwrap();
        assert_eq!(buf, [0, 1, 2, 3]);
    }

    #[test]
    fn read_past_end_fails() {
        let (_tmp, file) = binary_with(&[0u8; 16]);
        let mut buf = [0u8; 8];
        assert!(file.read(&mut buf, 12).is_err());
    }

    #[test]
    fn read_available_stops_at_end_of_file() {
        let (_tmp, file) = binary_with(&[3u8; 16]);
        let mut buf = [0u8; 8];
        assert_eq!(file.read_available(&mut buf, 12).unwrap(), 4);
        assert_eq!(buf, [3, 3, 3, 3, 0, 0, 0, 0]);
        assert_eq!(file.read_available(&mut buf, 64).unwrap(), 0);
    }

    #[test]
    fn length_is_file_size() {
        let (_tmp, file) = binary_with(&[0u8; 2352 * 3]);
        assert_eq!(file.length(), 2352 * 3);
    }

    #[test]
    fn decode_reads_from_seek_position() {
        let data: Vec<u8> = (0..64).collect();
        let (_tmp, file) = binary_with(&data);

        file.seek(8).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(file.decode(&mut buf, 2), 2);
        assert_eq!(buf, [8, 9, 10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn decode_rounds_partial_frame_up_and_pads() {
        let (_tmp, file) = binary_with(&[7u8; 10]);

        let mut buf = [0xFFu8; 16];
        assert_eq!(file.decode(&mut buf, 4), 3);
        assert_eq!(&buf[..10], &[7u8; 10]);
        assert_eq!(&buf[10..12], &[0, 0]);
        assert_eq!(file.decode(&mut buf, 4), 0);
    }

    #[test]
    fn consecutive_decodes_continue_from_cursor() {
        let data: Vec<u8> = (0..24).collect();
        let (_tmp, file) = binary_with(&data);

        file.seek(0).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(file.decode(&mut buf, 4), 4);
        assert_eq!(buf[..], data[..16]);

        assert_eq!(file.decode(&mut buf, 4), 2);
        assert_eq!(buf[..8], data[16..24]);
    }
}
