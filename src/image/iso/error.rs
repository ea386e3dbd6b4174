use crate::image::source::error::SourceError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IsoError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("No ISO9660 or High Sierra volume descriptor found in {0}")]
    NoVolumeDescriptor(PathBuf),

    #[error("{0} is too large for a CD-ROM")]
    TooLarge(PathBuf),
}

pub type IsoResult<T> = Result<T, IsoError>;
