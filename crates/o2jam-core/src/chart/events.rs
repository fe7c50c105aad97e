//! Event stream replay for one difficulty region.
//!
//! A region is a run of packages:
//!
//! ```text
//! measure u32, channel u16, event_count u16, events [[u8; 4]; event_count]
//! ```
//!
//! | channel | meaning                                   |
//! |---------|-------------------------------------------|
//! | 0       | fractional measure length (f32)           |
//! | 1       | tempo change (f32 per event)              |
//! | 2..=8   | playable note on lane `channel - 2`       |
//! | 9..=22  | autoplay sample                           |
//!
//! Note and autoplay events are `sample u16, volume:4 | pan:4, note_type u8`.

use serde::Serialize;
use tracing::debug;

use crate::audio::{Extension, OGG_ID_OFFSET, SampleSet};
use crate::bytes::ByteCursor;
use crate::chart::Difficulty;
use crate::config::Config;
use crate::diagnostics::{Diagnostic, Diagnostics};

const EVENT_SIZE: usize = 4;

const CHANNEL_FRAC_MEASURE: u16 = 0;
const CHANNEL_TEMPO: u16 = 1;
const CHANNEL_FIRST_LANE: u16 = 2;
const CHANNEL_LAST_LANE: u16 = 8;
const CHANNEL_FIRST_AUTOPLAY: u16 = 9;
const CHANNEL_LAST_AUTOPLAY: u16 = 22;

const NOTE_TAP: u8 = 0;
const NOTE_HOLD_HEAD: u8 = 2;
const NOTE_HOLD_TAIL: u8 = 3;
/// Tap note whose sample lives in the OGG id range.
const NOTE_OGG_TAP: u8 = 4;

/// Raw autoplay value some charts use as a placeholder.
const FILLER_SAMPLE: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum NoteKind {
    Tap,
    Hold { measure_end: f64, end_offset_ms: i64 },
}

/// Sample file a note plays, in the audio container's id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Keysound {
    pub id: u32,
    pub extension: Extension,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub kind: NoteKind,
    /// 0..=6
    pub lane: u8,
    /// Raw chart value; see [`Note::keysound_id`]
    pub sample_id: u32,
    /// `None` when the audio container has no sample for this note
    pub keysound: Option<Keysound>,
    /// 0..=15, 0 is loudest
    pub volume: u8,
    /// 0..=15, 0 and 8 are centred
    pub pan: u8,
    pub measure_start: f64,
    /// Filled in by [`Timeline::annotate`](crate::chart::Timeline::annotate)
    pub offset_ms: i64,
}

impl Note {
    pub fn is_hold(&self) -> bool {
        matches!(self.kind, NoteKind::Hold { .. })
    }

    pub fn measure_end(&self) -> Option<f64> {
        match self.kind {
            NoteKind::Tap => None,
            NoteKind::Hold { measure_end, .. } => Some(measure_end),
        }
    }

    /// Id of the keysound in the audio container.
    pub fn keysound_id(&self) -> u32 {
        self.sample_id + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TempoBreakpoint {
    pub bpm: f32,
    pub measure: f64,
    pub offset_ms: i64,
    /// Beat length in milliseconds after clamping
    pub beat_ms: f64,
}

impl TempoBreakpoint {
    pub fn new(bpm: f32, measure: f64) -> Self {
        Self {
            bpm,
            measure,
            offset_ms: 0,
            beat_ms: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FracMeasure {
    pub measure: u32,
    pub fraction: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoplaySample {
    /// Already shifted into the audio container's id space
    pub sample_id: u32,
    pub volume: u8,
    pub measure: f64,
    pub offset_ms: i64,
}

/// Everything replayed from one region.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventStream {
    pub divisor: u32,
    /// Sorted by `measure_start`
    pub notes: Vec<Note>,
    /// Deduplicated, sorted by `measure`
    pub tempo: Vec<TempoBreakpoint>,
    pub frac_measures: Vec<FracMeasure>,
    pub autoplay: Vec<AutoplaySample>,
}

#[derive(Debug, Clone, Copy)]
struct Package<'a> {
    measure: u32,
    channel: u16,
    events: &'a [u8],
}

impl Package<'_> {
    fn event_count(&self) -> usize {
        self.events.len() / EVENT_SIZE
    }

    fn event(&self, index: usize) -> [u8; 4] {
        let mut event = [0u8; EVENT_SIZE];
        event.copy_from_slice(&self.events[index * EVENT_SIZE..(index + 1) * EVENT_SIZE]);
        event
    }

    /// Measure position of event `index`.
    fn position(&self, index: usize) -> f64 {
        f64::from(self.measure) + index as f64 / self.event_count() as f64
    }
}

/// Iterates over at most `limit` packages; stops at the first one cut short.
struct Packages<'a> {
    cursor: ByteCursor<'a>,
    remaining: u32,
    truncated: bool,
}

impl<'a> Packages<'a> {
    fn new(region: &'a [u8], limit: u32) -> Self {
        Self {
            cursor: ByteCursor::new(region),
            remaining: limit,
            truncated: false,
        }
    }

    fn read(&mut self) -> Option<Package<'a>> {
        let measure = self.cursor.read_u32().ok()?;
        let channel = self.cursor.read_u16().ok()?;
        let count = self.cursor.read_u16().ok()?;
        let events = self.cursor.read_bytes(usize::from(count) * EVENT_SIZE).ok()?;
        Some(Package {
            measure,
            channel,
            events,
        })
    }
}

impl<'a> Iterator for Packages<'a> {
    type Item = Package<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.truncated {
            return None;
        }
        match self.read() {
            Some(package) => {
                self.remaining -= 1;
                Some(package)
            }
            None => {
                self.truncated = true;
                None
            }
        }
    }
}

/// Guesses the subdivisions per measure from the first multi-event package.
///
/// Event counts divisible by 4 give 4, otherwise divisible by 3 give 3.
/// This is a heuristic and returns `None` when no package qualifies.
pub fn infer_divisor(region: &[u8], package_count: u32) -> Option<u32> {
    Packages::new(region, package_count)
        .map(|package| package.event_count())
        .filter(|&count| count != 1)
        .find_map(|count| match count {
            c if c % 4 == 0 => Some(4),
            c if c % 3 == 0 => Some(3),
            _ => None,
        })
}

#[derive(Debug, Clone)]
struct PendingHead {
    lane: u8,
    sample_id: u32,
    volume: u8,
    pan: u8,
    measure_start: f64,
}

/// Replays the packages of one difficulty region.
pub struct EventStreamDecoder<'a> {
    difficulty: Difficulty,
    samples: &'a SampleSet,
    config: &'a Config,
    notes: Vec<Note>,
    pending: Vec<PendingHead>,
    tempo: Vec<TempoBreakpoint>,
    frac_measures: Vec<FracMeasure>,
    autoplay: Vec<AutoplaySample>,
}

impl<'a> EventStreamDecoder<'a> {
    pub fn new(difficulty: Difficulty, samples: &'a SampleSet, config: &'a Config) -> Self {
        Self {
            difficulty,
            samples,
            config,
            notes: Vec::new(),
            pending: Vec::new(),
            tempo: Vec::new(),
            frac_measures: Vec::new(),
            autoplay: Vec::new(),
        }
    }

    /// Decodes up to `package_count` packages of `region`.
    ///
    /// `bpm` is the header tempo, in force from measure 0 until the first
    /// tempo change.
    pub fn decode(
        mut self,
        region: &[u8],
        package_count: u32,
        bpm: f32,
        diagnostics: &mut Diagnostics,
    ) -> EventStream {
        let divisor = infer_divisor(region, package_count).unwrap_or_else(|| {
            diagnostics.push(Diagnostic::DivisorInferenceFailure {
                difficulty: self.difficulty,
                fallback: self.config.default_divisor,
            });
            self.config.default_divisor
        });

        self.tempo.push(TempoBreakpoint::new(bpm, 0.0));

        let mut packages = Packages::new(region, package_count);
        let mut decoded = 0u32;
        for package in packages.by_ref() {
            self.replay(&package, diagnostics);
            decoded += 1;
        }
        if packages.truncated {
            diagnostics.push(Diagnostic::TruncatedRegion {
                difficulty: self.difficulty,
                declared: package_count,
                decoded,
            });
        }

        for head in self.pending.drain(..) {
            diagnostics.push(Diagnostic::PendingHeadAtEndOfStream {
                difficulty: self.difficulty,
                lane: head.lane,
                measure: head.measure_start,
            });
        }

        self.notes
            .sort_by(|a, b| a.measure_start.total_cmp(&b.measure_start));

        debug!(
            "[{}] {} notes, {} tempo changes, {} autoplay samples, divisor {}",
            self.difficulty,
            self.notes.len(),
            self.tempo.len(),
            self.autoplay.len(),
            divisor
        );

        EventStream {
            divisor,
            notes: self.notes,
            tempo: dedup_tempo(self.tempo),
            frac_measures: self.frac_measures,
            autoplay: self.autoplay,
        }
    }

    fn replay(&mut self, package: &Package<'_>, diagnostics: &mut Diagnostics) {
        match package.channel {
            CHANNEL_FRAC_MEASURE => {
                if package.event_count() > 0 {
                    let fraction = f32::from_le_bytes(package.event(0));
                    self.frac_measures.push(FracMeasure {
                        measure: package.measure,
                        fraction,
                    });
                }
            }
            CHANNEL_TEMPO => {
                for i in 0..package.event_count() {
                    let bpm = f32::from_le_bytes(package.event(i));
                    if bpm == 0.0 {
                        continue;
                    }
                    self.tempo
                        .push(TempoBreakpoint::new(bpm, package.position(i)));
                }
            }
            CHANNEL_FIRST_LANE..=CHANNEL_LAST_LANE => {
                let lane = (package.channel - CHANNEL_FIRST_LANE) as u8;
                for i in 0..package.event_count() {
                    self.replay_note(lane, package.event(i), package.position(i), diagnostics);
                }
            }
            CHANNEL_FIRST_AUTOPLAY..=CHANNEL_LAST_AUTOPLAY => {
                for i in 0..package.event_count() {
                    self.replay_autoplay(package.event(i), package.position(i));
                }
            }
            channel => {
                debug!(
                    "[{}] ignoring package on unknown channel {} at measure {}",
                    self.difficulty, channel, package.measure
                );
            }
        }
    }

    fn replay_note(
        &mut self,
        lane: u8,
        event: [u8; 4],
        position: f64,
        diagnostics: &mut Diagnostics,
    ) {
        let raw_sample = u16::from_le_bytes([event[0], event[1]]);
        if raw_sample == 0 {
            return;
        }
        let volume = event[2] >> 4;
        let pan = event[2] & 0x0F;
        let (note_type, sample_id) = match event[3] {
            NOTE_OGG_TAP => (NOTE_TAP, u32::from(raw_sample) + OGG_ID_OFFSET),
            t => (t, u32::from(raw_sample)),
        };

        match note_type {
            NOTE_TAP => self.notes.push(Note {
                kind: NoteKind::Tap,
                lane,
                sample_id,
                keysound: resolve_keysound(self.samples, sample_id),
                volume,
                pan,
                measure_start: position,
                offset_ms: 0,
            }),
            NOTE_HOLD_HEAD => self.pending.push(PendingHead {
                lane,
                sample_id,
                volume,
                pan,
                measure_start: position,
            }),
            NOTE_HOLD_TAIL => match self.pair_tail(lane, position) {
                Some(head) => self.notes.push(Note {
                    kind: NoteKind::Hold {
                        measure_end: position,
                        end_offset_ms: 0,
                    },
                    lane,
                    sample_id: head.sample_id,
                    keysound: resolve_keysound(self.samples, head.sample_id),
                    volume: head.volume,
                    pan: head.pan,
                    measure_start: head.measure_start,
                    offset_ms: 0,
                }),
                None => diagnostics.push(Diagnostic::LnPairingFailure {
                    difficulty: self.difficulty,
                    lane,
                    measure: position,
                }),
            },
            other => debug!(
                "[{}] ignoring note type {} on lane {} at measure {}",
                self.difficulty, other, lane, position
            ),
        }
    }

    /// Takes the latest pending head on `lane` that starts before `tail`.
    ///
    /// Every other head on the lane starting before `tail` can no longer be
    /// closed and is dropped. Heads sharing the latest start resolve to the
    /// first one pushed.
    fn pair_tail(&mut self, lane: u8, tail: f64) -> Option<PendingHead> {
        let mut best: Option<usize> = None;
        for (i, head) in self.pending.iter().enumerate() {
            if head.lane != lane || head.measure_start >= tail {
                continue;
            }
            match best {
                Some(b) if self.pending[b].measure_start >= head.measure_start => {}
                _ => best = Some(i),
            }
        }

        let head = self.pending[best?].clone();
        self.pending
            .retain(|h| h.lane != lane || h.measure_start >= tail);
        Some(head)
    }

    fn replay_autoplay(&mut self, event: [u8; 4], position: f64) {
        let raw_sample = u16::from_le_bytes([event[0], event[1]]);
        if raw_sample == 0 {
            return;
        }
        if self.config.skip_filler_autoplay && raw_sample == FILLER_SAMPLE {
            return;
        }
        let sample_id = match event[3] {
            NOTE_OGG_TAP => u32::from(raw_sample) + OGG_ID_OFFSET,
            NOTE_TAP => u32::from(raw_sample),
            _ => return,
        } + 1;

        // Only keep events with a sample to play
        if !self.samples.contains(sample_id) {
            return;
        }

        self.autoplay.push(AutoplaySample {
            sample_id,
            volume: event[2] >> 4,
            measure: position,
            offset_ms: 0,
        });
    }
}

fn resolve_keysound(samples: &SampleSet, sample_id: u32) -> Option<Keysound> {
    let id = sample_id + 1;
    samples
        .extension_of(id)
        .map(|extension| Keysound { id, extension })
}

/// Collapses breakpoints sharing a measure, the later tempo winning, then sorts by measure.
pub fn dedup_tempo(breakpoints: Vec<TempoBreakpoint>) -> Vec<TempoBreakpoint> {
    let mut deduped: Vec<TempoBreakpoint> = Vec::with_capacity(breakpoints.len());
    for breakpoint in breakpoints {
        match deduped.iter_mut().find(|b| b.measure == breakpoint.measure) {
            Some(existing) => existing.bpm = breakpoint.bpm,
            None => deduped.push(breakpoint),
        }
    }
    deduped.sort_by(|a, b| a.measure.total_cmp(&b.measure));
    deduped
}
