//! End-to-end decode of one chart container and its audio container.

use serde::Serialize;
use tracing::{debug, info};

use crate::audio::{self, SampleSet, Signature};
use crate::chart::{ChartHeader, Difficulty, EventStream, EventStreamDecoder, Timeline};
use crate::config::Config;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::Result;

/// One decoded difficulty with offsets resolved.
#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub difficulty: Difficulty,
    pub level: u16,
    #[serde(flatten)]
    pub events: EventStream,
    #[serde(skip)]
    pub timeline: Timeline,
}

#[derive(Debug, Clone)]
pub struct Song {
    pub header: ChartHeader,
    /// `None` when no audio container was given or it could not be decoded
    pub audio_signature: Option<Signature>,
    pub samples: SampleSet,
    /// Distinct difficulties, in Easy/Normal/Hard order
    pub charts: Vec<Chart>,
    pub cover: Vec<u8>,
    pub diagnostics: Diagnostics,
}

impl Song {
    /// Decodes a chart container and, if given, its audio container.
    ///
    /// Only a malformed chart header is fatal. An audio container that fails
    /// to decode leaves the sample set empty and is recorded as a
    /// diagnostic, so the charts still decode.
    pub fn decode(chart: &[u8], audio: Option<&[u8]>, config: &Config) -> Result<Self> {
        let encodings = config.resolve_encodings()?;
        let mut diagnostics = Diagnostics::new();

        let encoding = ChartHeader::detect_encoding(chart, &encodings, &mut diagnostics)?;
        let header = ChartHeader::parse(chart, encoding, &mut diagnostics)?;
        info!(
            "Decoding song {}: {} - {} ({})",
            header.song_id, header.artist, header.title, encoding.name()
        );

        let (audio_signature, samples) = match audio.map(audio::decode) {
            None => (None, SampleSet::new()),
            Some(Ok(container)) => {
                diagnostics.append(container.diagnostics);
                (container.signature, container.samples)
            }
            Some(Err(e)) => {
                diagnostics.push(Diagnostic::AudioUnavailable(e.to_string()));
                (None, SampleSet::new())
            }
        };

        let charts = header
            .kept_difficulties()
            .filter_map(|difficulty| {
                decode_chart(chart, &header, difficulty, &samples, config, &mut diagnostics)
            })
            .collect();

        let cover = match header.cover_bytes(chart) {
            Some(bytes) => bytes.to_vec(),
            None => {
                diagnostics.push(Diagnostic::RegionOutOfBounds {
                    label: "cover".to_string(),
                    offset: header.cover_offset as usize,
                    size: header.cover_size as usize,
                    file_len: chart.len(),
                });
                Vec::new()
            }
        };

        Ok(Self {
            header,
            audio_signature,
            samples,
            charts,
            cover,
            diagnostics,
        })
    }

    pub fn chart(&self, difficulty: Difficulty) -> Option<&Chart> {
        self.charts.iter().find(|c| c.difficulty == difficulty)
    }
}

/// Decodes one difficulty region and resolves its timeline.
///
/// Returns `None` when the region lies outside `buffer`.
pub fn decode_chart(
    buffer: &[u8],
    header: &ChartHeader,
    difficulty: Difficulty,
    samples: &SampleSet,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> Option<Chart> {
    let Some(region) = header.region(buffer, difficulty) else {
        let range = header.region_range(difficulty);
        diagnostics.push(Diagnostic::RegionOutOfBounds {
            label: format!("{} region", difficulty),
            offset: range.start,
            size: range.len(),
            file_len: buffer.len(),
        });
        return None;
    };

    let package_count = header.package_counts[difficulty.index()];
    debug!(
        "[{}] decoding {} packages from {} bytes",
        difficulty,
        package_count,
        region.len()
    );

    let mut events = EventStreamDecoder::new(difficulty, samples, config).decode(
        region,
        package_count,
        header.bpm,
        diagnostics,
    );
    let timeline = Timeline::resolve(
        events.tempo.clone(),
        &events.frac_measures,
        header.bpm,
        events.divisor,
        diagnostics,
    );
    timeline.annotate(&mut events);

    Some(Chart {
        difficulty,
        level: header.level(difficulty),
        events,
        timeline,
    })
}
