//! Synthetic container builders shared by the integration tests.

#![allow(dead_code)]

use o2jam_core::audio::cipher;

pub const REST: [u8; 4] = [0, 0, 0, 0];

pub const TAP: u8 = 0;
pub const HOLD_HEAD: u8 = 2;
pub const HOLD_TAIL: u8 = 3;
pub const OGG_TAP: u8 = 4;

pub fn note(sample: u16, note_type: u8) -> [u8; 4] {
    let [lo, hi] = sample.to_le_bytes();
    [lo, hi, 0x00, note_type]
}

pub fn float(value: f32) -> [u8; 4] {
    value.to_le_bytes()
}

pub fn package(measure: u32, channel: u16, events: &[[u8; 4]]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&measure.to_le_bytes());
    bytes.extend_from_slice(&channel.to_le_bytes());
    bytes.extend_from_slice(&(events.len() as u16).to_le_bytes());
    for event in events {
        bytes.extend_from_slice(event);
    }
    bytes
}

fn put(buffer: &mut [u8], offset: usize, bytes: &[u8]) {
    buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn put_u32x3(buffer: &mut [u8], offset: usize, values: [u32; 3]) {
    for (i, value) in values.iter().enumerate() {
        put(buffer, offset + i * 4, &value.to_le_bytes());
    }
}

/// Chart container with up to three regions and a cover image.
pub struct ChartBuilder {
    pub song_id: u32,
    pub version: f32,
    pub genre: u32,
    pub bpm: f32,
    pub levels: [u16; 3],
    pub playable_notes: [u32; 3],
    pub title: Vec<u8>,
    pub artist: Vec<u8>,
    pub noter: Vec<u8>,
    pub audio_file: Vec<u8>,
    pub durations: [u32; 3],
    pub regions: [Vec<u8>; 3],
    pub package_counts: [u32; 3],
    pub cover: Vec<u8>,
}

impl Default for ChartBuilder {
    fn default() -> Self {
        Self {
            song_id: 100,
            version: 2.9,
            genre: 3,
            bpm: 120.0,
            levels: [10, 30, 50],
            playable_notes: [1, 2, 3],
            title: b"Test Song".to_vec(),
            artist: b"Test Artist".to_vec(),
            noter: b"Noter".to_vec(),
            audio_file: b"o2ma100.ojm".to_vec(),
            durations: [90, 90, 90],
            regions: [Vec::new(), Vec::new(), Vec::new()],
            package_counts: [0; 3],
            cover: Vec::new(),
        }
    }
}

impl ChartBuilder {
    pub fn region(mut self, index: usize, packages: &[Vec<u8>]) -> Self {
        self.regions[index] = packages.concat();
        self.package_counts[index] = packages.len() as u32;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; 300];
        put(&mut buffer, 0, &self.song_id.to_le_bytes());
        put(&mut buffer, 4, b"ojn\0");
        put(&mut buffer, 8, &self.version.to_le_bytes());
        put(&mut buffer, 12, &self.genre.to_le_bytes());
        put(&mut buffer, 16, &self.bpm.to_le_bytes());
        for (i, level) in self.levels.iter().enumerate() {
            put(&mut buffer, 20 + i * 2, &level.to_le_bytes());
        }
        put_u32x3(&mut buffer, 28, self.playable_notes.map(|n| n + 10));
        put_u32x3(&mut buffer, 40, self.playable_notes);
        put_u32x3(&mut buffer, 52, [16, 16, 16]);
        put_u32x3(&mut buffer, 64, self.package_counts);
        put(&mut buffer, 108, &self.title);
        put(&mut buffer, 172, &self.artist);
        put(&mut buffer, 204, &self.noter);
        put(&mut buffer, 236, &self.audio_file);
        put(&mut buffer, 268, &(self.cover.len() as u32).to_le_bytes());
        put_u32x3(&mut buffer, 272, self.durations);

        let mut offsets = [0u32; 3];
        let mut end = 300u32;
        for (i, region) in self.regions.iter().enumerate() {
            offsets[i] = end;
            end += region.len() as u32;
        }
        put_u32x3(&mut buffer, 284, offsets);
        put(&mut buffer, 296, &end.to_le_bytes());

        for region in &self.regions {
            buffer.extend_from_slice(region);
        }
        buffer.extend_from_slice(&self.cover);
        buffer
    }
}

/// M30 container; nami-flagged payloads are given in plain text and masked here.
pub fn m30(flag: u32, samples: &[(u16, u16, &[u8])]) -> Vec<u8> {
    let mut buffer = b"M30\0".to_vec();
    buffer.extend_from_slice(&0u32.to_le_bytes());
    buffer.extend_from_slice(&flag.to_le_bytes());
    buffer.extend_from_slice(&(samples.len() as u32).to_le_bytes());
    buffer.extend_from_slice(&28u32.to_le_bytes());
    buffer.extend_from_slice(&0u32.to_le_bytes());
    buffer.extend_from_slice(&0u32.to_le_bytes());

    for &(codec, ref_id, payload) in samples {
        let mut payload = payload.to_vec();
        if flag == 16 {
            cipher::nami_xor(&mut payload);
        }
        buffer.extend_from_slice(&[0u8; 32]);
        buffer.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buffer.extend_from_slice(&codec.to_le_bytes());
        buffer.extend_from_slice(&0u16.to_le_bytes());
        buffer.extend_from_slice(&0u32.to_le_bytes());
        buffer.extend_from_slice(&ref_id.to_le_bytes());
        buffer.extend_from_slice(&0u16.to_le_bytes());
        buffer.extend_from_slice(&0u32.to_le_bytes());
        buffer.extend_from_slice(&payload);
    }
    buffer
}

/// 16-bit mono 22050 Hz sub-header for an OMC WAV entry.
pub fn omc_wav_entry(chunk: &[u8]) -> Vec<u8> {
    let mut entry = vec![0u8; 32];
    entry.extend_from_slice(&1u16.to_le_bytes());
    entry.extend_from_slice(&1u16.to_le_bytes());
    entry.extend_from_slice(&22050u32.to_le_bytes());
    entry.extend_from_slice(&44100u32.to_le_bytes());
    entry.extend_from_slice(&2u16.to_le_bytes());
    entry.extend_from_slice(&16u16.to_le_bytes());
    entry.extend_from_slice(&0u32.to_le_bytes());
    entry.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    entry.extend_from_slice(chunk);
    entry
}

pub fn omc_ogg_entry(payload: &[u8]) -> Vec<u8> {
    let mut entry = vec![0u8; 32];
    entry.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    entry.extend_from_slice(payload);
    entry
}

/// OMC/OJM container from pre-built WAV and OGG entries.
pub fn omc(magic: &[u8; 4], wav: &[Vec<u8>], ogg: &[Vec<u8>]) -> Vec<u8> {
    let wav_region = wav.concat();
    let ogg_region = ogg.concat();
    let wav_start = 24u32;
    let ogg_start = wav_start + wav_region.len() as u32;
    let file_size = ogg_start + ogg_region.len() as u32;

    let mut buffer = magic.to_vec();
    buffer.extend_from_slice(&(wav.len() as u16).to_le_bytes());
    buffer.extend_from_slice(&(ogg.len() as u16).to_le_bytes());
    buffer.extend_from_slice(&wav_start.to_le_bytes());
    buffer.extend_from_slice(&ogg_start.to_le_bytes());
    buffer.extend_from_slice(&file_size.to_le_bytes());
    buffer.extend_from_slice(&wav_region);
    buffer.extend_from_slice(&ogg_region);
    buffer
}
