//! OMC/OJM dual-stream containers.
//!
//! ```text
//! header (20 bytes, after the 4-byte magic):
//!   wav_count u16, ogg_count u16, wav_start u32, ogg_start u32, file_size u32
//! WAV region, until ogg_start:
//!   name [u8; 32], audio_format u16, channels u16, sample_rate u32,
//!   byte_rate u32, block_align u16, bits_per_sample u16, reserved u32,
//!   chunk_size u32, chunk [u8; chunk_size]
//! OGG region, until file_size:
//!   name [u8; 32], size u32, payload [u8; size]
//! ```

use tracing::debug;

use super::wav::{WavFormat, wav_to_vec};
use super::{Extension, OGG_ID_OFFSET, SampleBlob, SampleSet, cipher};
use crate::bytes::ByteCursor;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::Result;

const NAME_SIZE: usize = 32;
const WAV_SUB_HEADER_SIZE: usize = NAME_SIZE + 24;
const OGG_SUB_HEADER_SIZE: usize = NAME_SIZE + 4;

/// First id of the OGG region.
const FIRST_OGG_ID: u32 = OGG_ID_OFFSET + 1;

struct Header {
    wav_count: u16,
    ogg_count: u16,
    ogg_start: usize,
    file_size: usize,
}

fn read_wav_sub_header(cursor: &mut ByteCursor<'_>) -> Result<(WavFormat, usize)> {
    cursor.skip(NAME_SIZE)?;
    let format = WavFormat {
        audio_format: cursor.read_u16()?,
        channels: cursor.read_u16()?,
        sample_rate: cursor.read_u32()?,
        byte_rate: cursor.read_u32()?,
        block_align: cursor.read_u16()?,
        bits_per_sample: cursor.read_u16()?,
    };
    let _reserved = cursor.read_u32()?;
    let chunk_size = cursor.read_u32()? as usize;
    Ok((format, chunk_size))
}

/// Recovers the PCM data of one scrambled WAV chunk.
fn decrypt_wav_chunk(chunk: &[u8]) -> Vec<u8> {
    let mut plain = cipher::rearrange(chunk);
    cipher::acc_xor(&mut plain);
    plain
}

pub(super) fn parse(
    cursor: &mut ByteCursor<'_>,
    samples: &mut SampleSet,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let wav_count = cursor.read_u16()?;
    let ogg_count = cursor.read_u16()?;
    // the WAV region always follows the header directly
    let _wav_start = cursor.read_u32()?;
    let ogg_start = cursor.read_u32()? as usize;
    let file_size = cursor.read_u32()? as usize;
    let header = Header {
        wav_count,
        ogg_count,
        ogg_start,
        file_size,
    };

    debug!(
        "OMC container: {} wav, {} ogg, ogg region at {}, {} bytes",
        header.wav_count, header.ogg_count, header.ogg_start, header.file_size
    );

    parse_wav_region(cursor, &header, samples, diagnostics)?;
    parse_ogg_region(cursor, &header, samples, diagnostics)
}

fn parse_wav_region(
    cursor: &mut ByteCursor<'_>,
    header: &Header,
    samples: &mut SampleSet,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let mut id = 0u32;

    while cursor.position() < header.ogg_start {
        if cursor.remaining() < WAV_SUB_HEADER_SIZE {
            diagnostics.push(Diagnostic::TruncatedSampleStream {
                declared: u32::from(header.wav_count),
                decoded: id,
            });
            break;
        }
        let (format, chunk_size) = read_wav_sub_header(cursor)?;

        if chunk_size == 0 {
            id += 1;
            continue;
        }

        let Ok(chunk) = cursor.read_bytes(chunk_size) else {
            diagnostics.push(Diagnostic::TruncatedSampleStream {
                declared: u32::from(header.wav_count),
                decoded: id,
            });
            break;
        };

        let pcm = decrypt_wav_chunk(chunk);
        samples.insert(SampleBlob {
            id,
            bytes: wav_to_vec(&format, &pcm),
            extension: Extension::Wav,
        });
        id += 1;
    }

    Ok(())
}

fn parse_ogg_region(
    cursor: &mut ByteCursor<'_>,
    header: &Header,
    samples: &mut SampleSet,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    if header.ogg_start > cursor.len() {
        if header.ogg_count > 0 {
            diagnostics.push(Diagnostic::TruncatedSampleStream {
                declared: u32::from(header.ogg_count),
                decoded: 0,
            });
        }
        return Ok(());
    }
    cursor.skip(header.ogg_start.saturating_sub(cursor.position()))?;

    let mut id = FIRST_OGG_ID;
    let end = header.file_size.min(cursor.len());

    while cursor.position() < end {
        if cursor.remaining() < OGG_SUB_HEADER_SIZE {
            diagnostics.push(Diagnostic::TruncatedSampleStream {
                declared: u32::from(header.ogg_count),
                decoded: id - FIRST_OGG_ID,
            });
            break;
        }
        cursor.skip(NAME_SIZE)?;
        let size = cursor.read_u32()? as usize;

        if size == 0 {
            id += 1;
            continue;
        }

        let Ok(payload) = cursor.read_bytes(size) else {
            diagnostics.push(Diagnostic::TruncatedSampleStream {
                declared: u32::from(header.ogg_count),
                decoded: id - FIRST_OGG_ID,
            });
            break;
        };

        samples.insert(SampleBlob {
            id,
            bytes: payload.to_vec(),
            extension: Extension::Ogg,
        });
        id += 1;
    }

    Ok(())
}
