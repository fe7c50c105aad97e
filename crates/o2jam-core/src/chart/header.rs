use std::ops::Range;

use encoding_rs::{EUC_KR, Encoding};
use serde::Serialize;
use tracing::debug;

use crate::bytes::{ByteCursor, decode_text};
use crate::chart::{Difficulty, Genre};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{Error, Result};

/// Chart container header.
///
/// Per-difficulty arrays are indexed by [`Difficulty::index`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartHeader {
    pub song_id: u32,
    pub version: f32,
    pub genre: Genre,
    pub bpm: f32,
    pub levels: [u16; 3],
    /// Note count including autoplay events
    pub total_notes: [u32; 3],
    pub playable_notes: [u32; 3],
    pub measure_counts: [u32; 3],
    pub package_counts: [u32; 3],
    pub title: String,
    pub artist: String,
    pub noter: String,
    /// File name of the paired audio container
    pub audio_file: String,
    pub cover_size: u32,
    /// Song duration per difficulty, in seconds
    pub durations: [u32; 3],
    pub region_offsets: [u32; 3],
    pub region_sizes: [u32; 3],
    pub cover_offset: u32,
    /// Difficulties whose region duplicates the next one
    pub skip: [bool; 3],
}

impl ChartHeader {
    /// Size of the fixed header; the first region starts here.
    pub const SIZE: usize = 300;

    // Field offsets
    const SONG_ID_OFFSET: usize = 0;
    const VERSION_OFFSET: usize = 8;
    const GENRE_OFFSET: usize = 12;
    const BPM_OFFSET: usize = 16;
    const LEVELS_OFFSET: usize = 20; // 3 x u16
    const TOTAL_NOTES_OFFSET: usize = 28; // 3 x u32
    const PLAYABLE_NOTES_OFFSET: usize = 40;
    const MEASURE_COUNT_OFFSET: usize = 52;
    const PACKAGE_COUNT_OFFSET: usize = 64;
    const COVER_SIZE_OFFSET: usize = 268;
    const DURATION_OFFSET: usize = 272;
    const REGION_OFFSET_OFFSET: usize = 284;
    const COVER_OFFSET_OFFSET: usize = 296;

    // String fields (offset, width)
    const TITLE: (usize, usize) = (108, 64);
    const ARTIST: (usize, usize) = (172, 32);
    const NOTER: (usize, usize) = (204, 32);
    const AUDIO_FILE: (usize, usize) = (236, 32);
    const STRING_FIELDS: [(usize, usize); 4] =
        [Self::TITLE, Self::ARTIST, Self::NOTER, Self::AUDIO_FILE];

    /// Parses the header, decoding its strings with `encoding`.
    ///
    /// Duplicate difficulties are reported to `diagnostics`.
    pub fn parse(
        buffer: &[u8],
        encoding: &'static Encoding,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        let cursor = ByteCursor::new(buffer);
        // Fail early on a short file instead of part way through
        cursor.slice_at(0, Self::SIZE)?;

        let read_u32x3 = |offset: usize| -> Result<[u32; 3]> {
            Ok([
                cursor.read_u32_at(offset)?,
                cursor.read_u32_at(offset + 4)?,
                cursor.read_u32_at(offset + 8)?,
            ])
        };
        let read_text = |(offset, width): (usize, usize)| -> Result<String> {
            Ok(decode_text(cursor.slice_at(offset, width)?, encoding).0)
        };

        let region_offsets = read_u32x3(Self::REGION_OFFSET_OFFSET)?;
        let cover_offset = cursor.read_u32_at(Self::COVER_OFFSET_OFFSET)?;
        let region_sizes = region_sizes(region_offsets, cover_offset)?;
        let playable_notes = read_u32x3(Self::PLAYABLE_NOTES_OFFSET)?;

        let skip = duplicate_difficulties(&region_sizes, &playable_notes);
        for difficulty in Difficulty::ALL {
            if skip[difficulty.index()] {
                diagnostics.push(Diagnostic::DuplicateDifficulty(difficulty));
            }
        }

        let header = Self {
            song_id: cursor.read_u32_at(Self::SONG_ID_OFFSET)?,
            version: cursor.read_f32_at(Self::VERSION_OFFSET)?,
            genre: Genre::from_code(cursor.read_u32_at(Self::GENRE_OFFSET)?)?,
            bpm: cursor.read_f32_at(Self::BPM_OFFSET)?,
            levels: [
                cursor.read_u16_at(Self::LEVELS_OFFSET)?,
                cursor.read_u16_at(Self::LEVELS_OFFSET + 2)?,
                cursor.read_u16_at(Self::LEVELS_OFFSET + 4)?,
            ],
            total_notes: read_u32x3(Self::TOTAL_NOTES_OFFSET)?,
            playable_notes,
            measure_counts: read_u32x3(Self::MEASURE_COUNT_OFFSET)?,
            package_counts: read_u32x3(Self::PACKAGE_COUNT_OFFSET)?,
            title: read_text(Self::TITLE)?,
            artist: read_text(Self::ARTIST)?,
            noter: read_text(Self::NOTER)?,
            audio_file: read_text(Self::AUDIO_FILE)?,
            cover_size: cursor.read_u32_at(Self::COVER_SIZE_OFFSET)?,
            durations: read_u32x3(Self::DURATION_OFFSET)?,
            region_offsets,
            region_sizes,
            cover_offset,
            skip,
        };

        debug!(
            "Parsed header: song {} \"{}\" by {}, bpm {}, regions {:?}",
            header.song_id, header.title, header.artist, header.bpm, header.region_sizes
        );

        Ok(header)
    }

    /// Picks the first of `encodings` that decodes every header string cleanly.
    ///
    /// Falls back to the first candidate (EUC-KR when none are given) and
    /// records a [`Diagnostic::LossyText`].
    pub fn detect_encoding(
        buffer: &[u8],
        encodings: &[&'static Encoding],
        diagnostics: &mut Diagnostics,
    ) -> Result<&'static Encoding> {
        let cursor = ByteCursor::new(buffer);
        let fields = Self::STRING_FIELDS
            .iter()
            .map(|&(offset, width)| cursor.slice_at(offset, width))
            .collect::<Result<Vec<_>>>()?;

        let clean = encodings
            .iter()
            .find(|&&encoding| fields.iter().all(|field| !decode_text(field, encoding).1));
        if let Some(&encoding) = clean {
            return Ok(encoding);
        }

        let fallback = encodings.first().copied().unwrap_or(EUC_KR);
        diagnostics.push(Diagnostic::LossyText {
            encoding: fallback.name().to_string(),
        });
        Ok(fallback)
    }

    /// Header version as printed by the game, e.g. "2.90".
    pub fn version_string(&self) -> String {
        format!("{:.2}", self.version)
    }

    pub fn is_skipped(&self, difficulty: Difficulty) -> bool {
        self.skip[difficulty.index()]
    }

    /// Difficulties that carry a distinct chart.
    pub fn kept_difficulties(&self) -> impl Iterator<Item = Difficulty> + '_ {
        Difficulty::ALL
            .into_iter()
            .filter(|d| !self.is_skipped(*d))
    }

    pub fn level(&self, difficulty: Difficulty) -> u16 {
        self.levels[difficulty.index()]
    }

    pub fn region_range(&self, difficulty: Difficulty) -> Range<usize> {
        let start = self.region_offsets[difficulty.index()] as usize;
        start..start + self.region_sizes[difficulty.index()] as usize
    }

    pub fn cover_range(&self) -> Range<usize> {
        let start = self.cover_offset as usize;
        start..start + self.cover_size as usize
    }

    /// Event stream bytes of one difficulty, or `None` if they lie past the end of `buffer`.
    pub fn region<'a>(&self, buffer: &'a [u8], difficulty: Difficulty) -> Option<&'a [u8]> {
        buffer.get(self.region_range(difficulty))
    }

    /// Embedded cover image, or `None` if it lies past the end of `buffer`.
    pub fn cover_bytes<'a>(&self, buffer: &'a [u8]) -> Option<&'a [u8]> {
        buffer.get(self.cover_range())
    }
}

fn region_sizes(offsets: [u32; 3], cover_offset: u32) -> Result<[u32; 3]> {
    let ends = [offsets[1], offsets[2], cover_offset];
    let mut sizes = [0u32; 3];
    for (i, size) in sizes.iter_mut().enumerate() {
        *size = ends[i].checked_sub(offsets[i]).ok_or_else(|| {
            Error::InvalidHeader(format!(
                "region {} ends at {} before it starts at {}",
                i, ends[i], offsets[i]
            ))
        })?;
    }
    Ok(sizes)
}

/// Marks each difficulty that duplicates its cyclic successor.
///
/// Region size alone is not enough; some charts share a size but differ in
/// note count. At least the last difficulty is always kept.
pub fn duplicate_difficulties(region_sizes: &[u32; 3], playable_notes: &[u32; 3]) -> [bool; 3] {
    let mut skip = [false; 3];
    for (i, flag) in skip.iter_mut().enumerate() {
        let next = (i + 1) % 3;
        *flag = region_sizes[i] == region_sizes[next] && playable_notes[i] == playable_notes[next];
    }
    if skip == [true; 3] {
        skip[2] = false;
    }
    skip
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_sizes() {
        assert_eq!(
            region_sizes([300, 145360, 341296], 593564).unwrap(),
            [145060, 195936, 252268]
        );
        assert_eq!(region_sizes([300, 300, 300], 300).unwrap(), [0, 0, 0]);
    }

    #[test]
    fn test_region_sizes_rejects_decreasing_offsets() {
        assert!(matches!(
            region_sizes([300, 200, 400], 500),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_all_duplicates_keeps_last() {
        assert_eq!(
            duplicate_difficulties(&[10, 10, 10], &[5, 5, 5]),
            [true, true, false]
        );
    }

    #[test]
    fn test_duplicate_needs_same_note_count() {
        assert_eq!(
            duplicate_difficulties(&[10, 10, 20], &[5, 6, 7]),
            [false, false, false]
        );
        assert_eq!(
            duplicate_difficulties(&[10, 10, 20], &[5, 5, 7]),
            [true, false, false]
        );
    }

    #[test]
    fn test_duplicate_wraps_around() {
        // Hard duplicates Easy
        assert_eq!(
            duplicate_difficulties(&[10, 20, 10], &[5, 7, 5]),
            [false, false, true]
        );
    }
}
