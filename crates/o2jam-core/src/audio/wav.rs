//! Canonical RIFF/WAVE packaging for decrypted OMC/OJM chunks.

use std::io::{self, Write};

/// Format fields carried by an OMC/OJM WAV sub-header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WavFormat {
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

/// Size of the header written by [`write_wav`].
pub const WAV_HEADER_SIZE: usize = 44;

/// Writes a minimal 44-byte WAV header followed by `pcm_data`.
pub fn write_wav<W: Write>(writer: &mut W, format: &WavFormat, pcm_data: &[u8]) -> io::Result<()> {
    let data_size = pcm_data.len() as u32;

    // RIFF header
    writer.write_all(b"RIFF")?;
    writer.write_all(&(data_size + 36).to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    // fmt chunk
    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&format.audio_format.to_le_bytes())?;
    writer.write_all(&format.channels.to_le_bytes())?;
    writer.write_all(&format.sample_rate.to_le_bytes())?;
    writer.write_all(&format.byte_rate.to_le_bytes())?;
    writer.write_all(&format.block_align.to_le_bytes())?;
    writer.write_all(&format.bits_per_sample.to_le_bytes())?;

    // data chunk
    writer.write_all(b"data")?;
    writer.write_all(&data_size.to_le_bytes())?;
    writer.write_all(pcm_data)?;

    Ok(())
}

/// Packages `pcm_data` as a complete WAV file in memory.
pub fn wav_to_vec(format: &WavFormat, pcm_data: &[u8]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(WAV_HEADER_SIZE + pcm_data.len());
    write_wav(&mut buffer, format, pcm_data).expect("writing to Vec should not fail");
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let format = WavFormat {
            audio_format: 1,
            channels: 2,
            sample_rate: 44100,
            byte_rate: 176400,
            block_align: 4,
            bits_per_sample: 16,
        };
        let wav = wav_to_vec(&format, &[1, 2, 3, 4]);

        assert_eq!(wav.len(), WAV_HEADER_SIZE + 4);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 40);
        assert_eq!(&wav[8..16], b"WAVEfmt ");
        assert_eq!(u32::from_le_bytes(wav[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes([wav[20], wav[21]]), 1);
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 2);
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 44100);
        assert_eq!(u32::from_le_bytes(wav[28..32].try_into().unwrap()), 176400);
        assert_eq!(u16::from_le_bytes([wav[32], wav[33]]), 4);
        assert_eq!(u16::from_le_bytes([wav[34], wav[35]]), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 4);
        assert_eq!(&wav[44..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_write_wav_propagates_writer_errors() {
        // Room for the RIFF tag only
        let mut storage = [0u8; 4];
        let mut writer = &mut storage[..];
        let result = write_wav(&mut writer, &WavFormat::default(), &[1, 2]);

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::WriteZero);
        assert_eq!(&storage, b"RIFF");
    }

    #[test]
    fn test_wav_to_vec_matches_write_wav() {
        let format = WavFormat {
            audio_format: 1,
            channels: 1,
            sample_rate: 22050,
            byte_rate: 44100,
            block_align: 2,
            bits_per_sample: 16,
        };
        let mut written = Vec::new();
        write_wav(&mut written, &format, &[9, 9]).unwrap();
        assert_eq!(wav_to_vec(&format, &[9, 9]), written);
    }
}
