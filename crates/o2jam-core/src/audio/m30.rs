//! M30 single-stream containers.
//!
//! ```text
//! header (28 bytes, after the 4-byte magic):
//!   version u32, encryption_flag u32, sample_count u32,
//!   samples_offset u32, payload_size u32, padding u32
//! sample (repeated sample_count times):
//!   name [u8; 32]
//!   size u32, codec u16, reserved u16, music_flag u32,
//!   ref_id u16, reserved u16, pcm_samples u32
//!   payload [u8; size]
//! ```

use tracing::debug;

use super::{Extension, OGG_ID_OFFSET, SampleBlob, SampleSet, cipher};
use crate::bytes::ByteCursor;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::Result;

const NAME_SIZE: usize = 32;
const SUB_HEADER_SIZE: usize = NAME_SIZE + 20;

/// Payload masked with the nami XOR.
const FLAG_NAMI: u32 = 16;

const CODEC_BACKGROUND: u16 = 0;
const CODEC_NORMAL: u16 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encryption {
    Nami,
    Plain,
}

impl Encryption {
    fn from_flag(flag: u32) -> Option<Self> {
        match flag {
            FLAG_NAMI => Some(Self::Nami),
            f if f > FLAG_NAMI => Some(Self::Plain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SampleHeader {
    size: u32,
    codec: u16,
    ref_id: u16,
}

impl SampleHeader {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        cursor.skip(NAME_SIZE)?;
        let size = cursor.read_u32()?;
        let codec = cursor.read_u16()?;
        let _reserved = cursor.read_u16()?;
        let _music_flag = cursor.read_u32()?;
        let ref_id = cursor.read_u16()?;
        let _reserved = cursor.read_u16()?;
        let _pcm_samples = cursor.read_u32()?;
        Ok(Self {
            size,
            codec,
            ref_id,
        })
    }
}

pub(super) fn parse(
    cursor: &mut ByteCursor<'_>,
    samples: &mut SampleSet,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let version = cursor.read_u32()?;
    let encryption_flag = cursor.read_u32()?;
    let sample_count = cursor.read_u32()?;
    let _samples_offset = cursor.read_u32()?;
    let _payload_size = cursor.read_u32()?;
    let _padding = cursor.read_u32()?;

    debug!(
        "M30 container: version {}, encryption flag {}, {} samples",
        version, encryption_flag, sample_count
    );

    let Some(encryption) = Encryption::from_flag(encryption_flag) else {
        diagnostics.push(Diagnostic::UnknownEncryptionFlag(encryption_flag));
        return Ok(());
    };

    for index in 0..sample_count {
        if cursor.remaining() < SUB_HEADER_SIZE {
            diagnostics.push(Diagnostic::TruncatedSampleStream {
                declared: sample_count,
                decoded: index,
            });
            break;
        }
        let header = SampleHeader::read(cursor)?;

        let id = match header.codec {
            CODEC_BACKGROUND => u32::from(header.ref_id) + OGG_ID_OFFSET,
            CODEC_NORMAL => u32::from(header.ref_id),
            codec => {
                let id = u32::from(header.ref_id);
                diagnostics.push(Diagnostic::UnknownCodec {
                    codec,
                    sample_id: id,
                });
                id
            }
        };

        let Ok(payload) = cursor.read_bytes(header.size as usize) else {
            diagnostics.push(Diagnostic::TruncatedSampleStream {
                declared: sample_count,
                decoded: index,
            });
            break;
        };

        if payload.is_empty() {
            diagnostics.push(Diagnostic::EmptySample { sample_id: id });
            continue;
        }

        let mut bytes = payload.to_vec();
        if encryption == Encryption::Nami {
            cipher::nami_xor(&mut bytes);
        }

        samples.insert(SampleBlob {
            id,
            bytes,
            extension: Extension::Ogg,
        });
    }

    Ok(())
}
