use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    DecodeError(#[from] symphonia::core::errors::Error),

    #[error("No decodable audio stream in {0}")]
    NoAudioStream(PathBuf),

    #[error("Audio stream in {0} does not declare a sample rate")]
    UnknownSampleRate(PathBuf),

    #[error("Audio source produced no PCM data at byte {0}")]
    NoData(u64),

    #[error("Track source lock was poisoned by a panicking thread")]
    LockPoisoned,
}

pub type SourceResult<T> = Result<T, SourceError>;
