// src/wav/mod.rs
use binrw::{BinResult, BinWrite, binrw};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, ErrorKind, Seek, Write};

const PCM_FORMAT_TAG: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;

/// Canonical 44-byte header of a 16-bit PCM RIFF/WAVE file.
#[binrw]
#[brw(little, magic = b"RIFF")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavHeader {
    /// Size of everything after this field.
    pub riff_size: u32,

    #[brw(magic = b"WAVEfmt ")]
    pub fmt_size: u32,
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,

    #[brw(magic = b"data")]
    pub data_size: u32,
}

impl WavHeader {
    pub const SIZE: u32 = 44;

    /// Byte size of the data chunk for `samples` s16 samples, if the RIFF
    /// sizes can still express it.
    pub fn data_size_for(samples: usize) -> Option<u32> {
        let size = u32::try_from(samples.checked_mul(2)?).ok()?;
        (size <= u32::MAX - (Self::SIZE - 8)).then_some(size)
    }

    pub fn pcm16(channels: u16, sample_rate: u32, data_size: u32) -> Self {
        let block_align = channels * 2;
        Self {
            riff_size: Self::SIZE - 8 + data_size,
            fmt_size: FMT_CHUNK_SIZE,
            format_tag: PCM_FORMAT_TAG,
            channels,
            sample_rate,
            byte_rate: sample_rate * block_align as u32,
            block_align,
            bits_per_sample: 16,
            data_size,
        }
    }
}

/// Writes interleaved s16 samples as a little-endian PCM WAVE file.
pub fn write_wav<W: Write + Seek>(
    writer: &mut W,
    channels: u16,
    sample_rate: u32,
    samples: &[i16],
) -> BinResult<()> {
    let data_size = WavHeader::data_size_for(samples.len()).ok_or_else(|| {
        io::Error::new(
            ErrorKind::InvalidInput,
            format!("{} samples do not fit in a WAVE file", samples.len()),
        )
    })?;
    let header = WavHeader::pcm16(channels, sample_rate, data_size);
    header.write(writer)?;

    for sample in samples {
        writer.write_i16::<LittleEndian>(*sample)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::BinRead;
    use std::io::Cursor;

    #[test]
    fn header_is_44_bytes_and_reads_back() {
        let mut cursor = Cursor::new(Vec::new());
        write_wav(&mut cursor, 2, 44_100, &[1, -1, 2, -2]).unwrap();

        let bytes = cursor.into_inner();
        assert_eq!(bytes.len(), 44 + 8);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(&bytes[36..40], b"data");

        let header = WavHeader::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(header, WavHeader::pcm16(2, 44_100, 8));
        assert_eq!(header.byte_rate, 176_400);
        assert_eq!(header.riff_size, 44);
    }

    #[test]
    fn data_size_is_limited_by_riff_fields() {
        assert_eq!(WavHeader::data_size_for(4), Some(8));
        let largest = (u32::MAX - 36) as usize / 2;
        assert_eq!(
            WavHeader::data_size_for(largest),
            Some(largest as u32 * 2)
        );
        assert_eq!(WavHeader::data_size_for(largest + 1), None);
        assert_eq!(WavHeader::data_size_for(usize::MAX), None);
    }

    #[test]
    fn samples_are_little_endian() {
        let mut cursor = Cursor::new(Vec::new());
        write_wav(&mut cursor, 1, 22_050, &[0x0102]).unwrap();
        assert_eq!(&cursor.get_ref()[44..], &[0x02, 0x01]);
    }
}
