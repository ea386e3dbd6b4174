use crate::image::error::CdromError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Drive index {0} is out of range, only A: to Z: exist")]
    InvalidDrive(usize),

    #[error("Drive {0}: already has an image mounted")]
    DriveInUse(char),

    #[error("Drive {0}: has no image mounted")]
    NotMounted(char),

    #[error(transparent)]
    Cdrom(#[from] CdromError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
