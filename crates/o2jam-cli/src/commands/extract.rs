//! Extract command: decode a chart and its audio container to disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use o2jam_core::export::{write_chart_json, write_cover, write_samples};
use o2jam_core::{Config, Song};
use owo_colors::OwoColorize;
use tracing::warn;

use super::{format_colored_difficulty, print_diagnostics};

/// Default audio container path: the chart path with an `.ojm` extension
pub fn default_audio_path(chart: &Path) -> PathBuf {
    chart.with_extension("ojm")
}

pub fn run(chart: &Path, audio: Option<&Path>, output: &Path, config: &Config) -> Result<()> {
    let current_version = env!("CARGO_PKG_VERSION");
    eprintln!("o2jam {} - Extract Mode", current_version);

    let chart_bytes =
        fs::read(chart).with_context(|| format!("Failed to read {}", chart.display()))?;

    let audio_path = audio.map_or_else(|| default_audio_path(chart), Path::to_path_buf);
    let audio_bytes = match fs::read(&audio_path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(
                "Failed to read audio container {}: {}, decoding chart only",
                audio_path.display(),
                e
            );
            None
        }
    };

    let song = Song::decode(&chart_bytes, audio_bytes.as_deref(), config)?;

    eprintln!(
        "{} - {}",
        song.header.artist,
        song.header.title.bold()
    );
    if let Some(signature) = song.audio_signature {
        eprintln!("Audio: {} container, {} samples", signature, song.samples.len());
    }

    let sample_count = write_samples(output, &song.samples)?;
    let cover = write_cover(output, song.header.song_id, &song.cover)?;
    let charts = write_chart_json(output, &song)?;

    for (decoded, path) in song.charts.iter().zip(&charts) {
        eprintln!(
            "  {} Lv.{:<3} {:>5} notes  {:>4} autoplay  -> {}",
            format_colored_difficulty(decoded.difficulty),
            decoded.level,
            decoded.events.notes.len(),
            decoded.events.autoplay.len(),
            path.display()
        );
    }
    eprintln!("Wrote {} samples to {}", sample_count, output.display());
    if let Some(cover) = cover {
        eprintln!("Wrote cover to {}", cover.display());
    }

    print_diagnostics(&song.diagnostics);
    Ok(())
}
