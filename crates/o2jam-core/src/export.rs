//! Writing decoded artefacts to a directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::audio::SampleSet;
use crate::chart::{ChartHeader, Genre};
use crate::error::Result;
use crate::song::{Chart, Song};

/// Writes every sample as `<id>.<ext>`; returns the number written.
pub fn write_samples<P: AsRef<Path>>(dir: P, samples: &SampleSet) -> Result<usize> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    for sample in samples.iter() {
        let path = dir.join(sample.file_name());
        debug!("Writing {} ({} bytes)", path.display(), sample.bytes.len());
        fs::write(path, &sample.bytes)?;
    }

    info!("Wrote {} samples to {}", samples.len(), dir.display());
    Ok(samples.len())
}

/// Writes the cover image as `background_<song_id>.jpg`.
///
/// Nothing is written for an empty cover.
pub fn write_cover<P: AsRef<Path>>(dir: P, song_id: u32, bytes: &[u8]) -> Result<Option<PathBuf>> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let path = dir.join(format!("background_{}.jpg", song_id));
    fs::write(&path, bytes)?;
    Ok(Some(path))
}

/// One chart as handed to a beatmap exporter
#[derive(Debug, Serialize)]
pub struct ChartDocument<'a> {
    pub song_id: u32,
    pub title: &'a str,
    pub artist: &'a str,
    pub noter: &'a str,
    pub genre: Genre,
    pub bpm: f32,
    #[serde(flatten)]
    pub chart: &'a Chart,
}

impl<'a> ChartDocument<'a> {
    pub fn new(header: &'a ChartHeader, chart: &'a Chart) -> Self {
        Self {
            song_id: header.song_id,
            title: &header.title,
            artist: &header.artist,
            noter: &header.noter,
            genre: header.genre,
            bpm: header.bpm,
            chart,
        }
    }

    /// e.g. `100_hard.json`
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.json",
            self.song_id,
            self.chart.difficulty.name().to_lowercase()
        )
    }
}

/// Writes one JSON document per decoded difficulty; returns the paths written.
pub fn write_chart_json<P: AsRef<Path>>(dir: P, song: &Song) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(song.charts.len());
    for chart in &song.charts {
        let document = ChartDocument::new(&song.header, chart);
        let path = dir.join(document.file_name());
        fs::write(&path, serde_json::to_string_pretty(&document)?)?;
        written.push(path);
    }
    Ok(written)
}
