pub mod error;

use crate::cd::pvd::{FIRST_VOLUME_DESCRIPTOR_SECTOR, is_primary_volume_descriptor};
use crate::cd::{
    BYTES_PER_COOKED_REDBOOK_FRAME, BYTES_PER_MODE2_FRAME, BYTES_PER_RAW_REDBOOK_FRAME,
    MODE1_HEADER_SIZE, MODE2_HEADER_SIZE, TRACK_ATTR_AUDIO, TRACK_ATTR_DATA,
};
use crate::image::disc::Disc;
use crate::image::iso::error::{IsoError, IsoResult};
use crate::image::source::TrackSource;
use crate::image::source::binary::BinaryFile;
use crate::image::track::Track;
use log::debug;
use std::path::Path;
use std::sync::Arc;

/// Sector layouts tried in order, as (sector size, mode2).
const LAYOUT_CANDIDATES: [(u32, bool); 4] = [
    (BYTES_PER_COOKED_REDBOOK_FRAME, false),
    (BYTES_PER_RAW_REDBOOK_FRAME, false),
    (BYTES_PER_MODE2_FRAME, true),
    (BYTES_PER_RAW_REDBOOK_FRAME, true),
];

/// Offset of the cooked user data inside a sector of the given layout.
pub fn user_data_offset(sector_size: u32, mode2: bool) -> u64 {
    if mode2 {
        MODE2_HEADER_SIZE
    } else if sector_size == BYTES_PER_RAW_REDBOOK_FRAME {
        MODE1_HEADER_SIZE
    } else {
        0
    }
}

/// Whether a primary volume descriptor shows up where the layout puts sector 16.
pub fn can_read_pvd(file: &BinaryFile, sector_size: u32, mode2: bool) -> bool {
    let mut pvd = [0u8; BYTES_PER_COOKED_REDBOOK_FRAME as usize];
    let seek =
        FIRST_VOLUME_DESCRIPTOR_SECTOR * sector_size as u64 + user_data_offset(sector_size, mode2);

    // short reads leave the tail zeroed
    if file.read_available(&mut pvd, seek).is_err() {
        return false;
    }
    is_primary_volume_descriptor(&pvd)
}

/// Loads a bare ISO or BIN as a single data track followed by the lead-out.
pub fn load_iso_file(path: impl AsRef<Path>) -> IsoResult<Disc> {
    let path = path.as_ref();
    let file = BinaryFile::open(path)?;

    let (sector_size, mode2) = LAYOUT_CANDIDATES
        .into_iter()
        .find(|&(sector_size, mode2)| can_read_pvd(&file, sector_size, mode2))
        .ok_or_else(|| IsoError::NoVolumeDescriptor(path.to_path_buf()))?;

    let length = u32::try_from(file.length() / sector_size as u64)
        .map_err(|_| IsoError::TooLarge(path.to_path_buf()))?;

    debug!(
        "Loaded {} as track 1, sector size {sector_size}, mode2 {mode2}, {length} sectors",
        path.display()
    );

    let data = Track {
        number: 1,
        attr: TRACK_ATTR_DATA,
        start: 0,
        length,
        skip: 0,
        sector_size,
        mode2,
        file: Some(Arc::new(TrackSource::Binary(file))),
    };
    let lead_out = Track {
        number: 2,
        attr: TRACK_ATTR_AUDIO,
        start: length,
        ..Track::default()
    };

    Ok(Disc::new(vec![data, lead_out], String::new()))
}
