use binrw::BinRead;
use std::io::Cursor;

/// The first volume descriptor lives at sector 16 of the data track.
pub const FIRST_VOLUME_DESCRIPTOR_SECTOR: u64 = 16;

const PRIMARY_VOLUME_DESCRIPTOR: u8 = 1;
const DESCRIPTOR_VERSION: u8 = 1;

/// Leading bytes of an ISO9660 volume descriptor.
#[derive(Debug, BinRead)]
#[br(little)]
pub struct IsoDescriptorHeader {
    pub descriptor_type: u8,
    pub identifier: [u8; 5],
    pub version: u8,
}

/// Leading bytes of a High Sierra volume descriptor, which prefixes the ISO
/// layout with the descriptor's own logical block number.
#[derive(Debug, BinRead)]
#[br(little)]
pub struct HighSierraDescriptorHeader {
    pub volume_lbn: [u8; 8],
    pub descriptor_type: u8,
    pub identifier: [u8; 5],
    pub version: u8,
}

impl IsoDescriptorHeader {
    pub fn is_primary(&self) -> bool {
        self.descriptor_type == PRIMARY_VOLUME_DESCRIPTOR
            && &self.identifier == b"CD001"
            && self.version == DESCRIPTOR_VERSION
    }
}

impl HighSierraDescriptorHeader {
    pub fn is_primary(&self) -> bool {
        self.descriptor_type == PRIMARY_VOLUME_DESCRIPTOR
            && &self.identifier == b"CDROM"
            && self.version == DESCRIPTOR_VERSION
    }
}

/// Checks whether the buffer starts with an ISO9660 or High Sierra primary
/// volume descriptor.
pub fn is_primary_volume_descriptor(data: &[u8]) -> bool {
    let iso = IsoDescriptorHeader::read(&mut Cursor::new(data))
        .map(|header| header.is_primary())
        .unwrap_or(false);

    iso || HighSierraDescriptorHeader::read(&mut Cursor::new(data))
        .map(|header| header.is_primary())
        .unwrap_or(false)
}
