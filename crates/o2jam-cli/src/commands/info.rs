//! Info command: print a chart header.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use o2jam_core::{ChartHeader, Config, Diagnostics, Difficulty};
use owo_colors::OwoColorize;

use super::{format_colored_difficulty, print_diagnostics};

pub fn run(chart: &Path, config: &Config, json: bool) -> Result<()> {
    let buffer =
        fs::read(chart).with_context(|| format!("Failed to read {}", chart.display()))?;

    let mut diagnostics = Diagnostics::new();
    let encodings = config.resolve_encodings()?;
    let encoding = ChartHeader::detect_encoding(&buffer, &encodings, &mut diagnostics)?;
    let header = ChartHeader::parse(&buffer, encoding, &mut diagnostics)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&header)?);
        return Ok(());
    }

    println!("{}", header.title.bold());
    println!("  Artist:   {}", header.artist);
    println!("  Noter:    {}", header.noter);
    println!("  Genre:    {}", header.genre);
    println!("  BPM:      {}", header.bpm);
    println!("  Song ID:  {}", header.song_id);
    println!("  Version:  {}", header.version_string());
    println!("  Audio:    {}", header.audio_file);
    println!("  Encoding: {}", encoding.name());
    println!("  Cover:    {} bytes", header.cover_size);
    println!();

    for difficulty in Difficulty::ALL {
        let i = difficulty.index();
        let skipped = if header.is_skipped(difficulty) {
            " (duplicate)".dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "  {} Lv.{:<3} {:>5} notes  {:>4} measures  {}:{:02}{}",
            format_colored_difficulty(difficulty),
            header.levels[i],
            header.playable_notes[i],
            header.measure_counts[i],
            header.durations[i] / 60,
            header.durations[i] % 60,
            skipped
        );
    }

    print_diagnostics(&diagnostics);
    Ok(())
}
