use serde::Serialize;
use tracing::debug;

use crate::chart::events::{EventStream, FracMeasure, NoteKind, TempoBreakpoint};
use crate::diagnostics::{Diagnostic, Diagnostics};

/// Shortest beat length accepted, in milliseconds.
const MIN_BEAT_MS: f64 = 1.0;

/// Beat length for `bpm`, or `Err(MIN_BEAT_MS)` when the tempo is degenerate.
fn beat_ms(bpm: f32) -> Result<f64, f64> {
    let ms = 60000.0 / f64::from(bpm);
    if ms.is_finite() && ms >= MIN_BEAT_MS {
        Ok(ms)
    } else {
        Err(MIN_BEAT_MS)
    }
}

/// Maps measure positions to milliseconds for one difficulty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    divisor: u32,
    /// Sorted by measure, offsets resolved
    breakpoints: Vec<TempoBreakpoint>,
}

impl Timeline {
    /// Resolves the absolute offset of every tempo breakpoint.
    ///
    /// `breakpoints` is the deduplicated tempo list of a region. Each
    /// fractional measure `m` gets a breakpoint at `m + 1` carrying the tempo
    /// in force there, so the shortened measure does not shift the tempo
    /// that follows it.
    pub fn resolve(
        mut breakpoints: Vec<TempoBreakpoint>,
        frac_measures: &[FracMeasure],
        header_bpm: f32,
        divisor: u32,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        breakpoints.sort_by(|a, b| a.measure.total_cmp(&b.measure));
        if breakpoints.first().is_none_or(|b| b.measure > 0.0) {
            breakpoints.insert(0, TempoBreakpoint::new(header_bpm, 0.0));
        }
        insert_frac_breakpoints(&mut breakpoints, frac_measures);

        let divisor_f = f64::from(divisor);
        let header_span = beat_ms(header_bpm).unwrap_or_else(|floor| floor) * divisor_f;
        // (measure, offset, measure span in ms) of the previous breakpoint
        let mut previous: Option<(f64, i64, f64)> = None;

        for breakpoint in &mut breakpoints {
            breakpoint.beat_ms = beat_ms(breakpoint.bpm).unwrap_or_else(|floor| {
                diagnostics.push(Diagnostic::DegenerateTempo {
                    bpm: breakpoint.bpm,
                    measure: breakpoint.measure,
                });
                floor
            });

            breakpoint.offset_ms = match previous {
                None => (breakpoint.measure * header_span).round() as i64,
                Some((measure, offset, span)) => {
                    let shortened: f64 = frac_measures
                        .iter()
                        .filter(|f| {
                            let end = f64::from(f.measure) + f64::from(f.fraction);
                            measure <= end && end < breakpoint.measure
                        })
                        .map(|f| 1.0 - f64::from(f.fraction))
                        .sum();
                    (offset as f64 + span * (breakpoint.measure - measure - shortened)).round()
                        as i64
                }
            };

            previous = Some((
                breakpoint.measure,
                breakpoint.offset_ms,
                breakpoint.beat_ms * divisor_f,
            ));
        }

        debug!(
            "Resolved {} breakpoints, divisor {}",
            breakpoints.len(),
            divisor
        );

        Self {
            divisor,
            breakpoints,
        }
    }

    pub fn divisor(&self) -> u32 {
        self.divisor
    }

    pub fn breakpoints(&self) -> &[TempoBreakpoint] {
        &self.breakpoints
    }

    /// Offset of `measure` in milliseconds.
    ///
    /// Extrapolates from the latest breakpoint at or before `measure`, or from
    /// the first breakpoint when `measure` precedes all of them.
    pub fn offset_of(&self, measure: f64) -> i64 {
        let Some(breakpoint) = self
            .breakpoints
            .iter()
            .rev()
            .find(|b| measure >= b.measure)
            .or_else(|| self.breakpoints.first())
        else {
            return 0;
        };

        let delta = (measure - breakpoint.measure) * breakpoint.beat_ms * f64::from(self.divisor);
        (breakpoint.offset_ms as f64 + delta).floor() as i64
    }

    /// Writes offsets onto every note and autoplay sample, and replaces the
    /// stream's tempo list with the resolved breakpoints.
    pub fn annotate(&self, stream: &mut EventStream) {
        for note in &mut stream.notes {
            note.offset_ms = self.offset_of(note.measure_start);
            if let NoteKind::Hold {
                measure_end,
                end_offset_ms,
            } = &mut note.kind
            {
                *end_offset_ms = self.offset_of(*measure_end);
            }
        }
        for sample in &mut stream.autoplay {
            sample.offset_ms = self.offset_of(sample.measure);
        }
        stream.tempo = self.breakpoints.clone();
    }
}

/// Inserts a breakpoint at the measure after each fractional one, unless one exists.
///
/// `breakpoints` must be sorted by measure and start at measure 0.
fn insert_frac_breakpoints(breakpoints: &mut Vec<TempoBreakpoint>, frac_measures: &[FracMeasure]) {
    for frac in frac_measures {
        let target = f64::from(frac.measure) + 1.0;
        let at = breakpoints.partition_point(|b| b.measure < target);
        if breakpoints.get(at).is_some_and(|b| b.measure == target) {
            continue;
        }
        let Some(bpm) = at.checked_sub(1).map(|i| breakpoints[i].bpm) else {
            continue;
        };
        breakpoints.insert(at, TempoBreakpoint::new(bpm, target));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(tempo: &[(f32, f64)], fracs: &[(u32, f32)], divisor: u32) -> (Timeline, Diagnostics) {
        let breakpoints = tempo
            .iter()
            .map(|&(bpm, measure)| TempoBreakpoint::new(bpm, measure))
            .collect();
        let fracs: Vec<_> = fracs
            .iter()
            .map(|&(measure, fraction)| FracMeasure { measure, fraction })
            .collect();
        let mut diagnostics = Diagnostics::new();
        let timeline = Timeline::resolve(
            breakpoints,
            &fracs,
            tempo.first().map_or(120.0, |t| t.0),
            divisor,
            &mut diagnostics,
        );
        (timeline, diagnostics)
    }

    fn offsets(timeline: &Timeline) -> Vec<(f64, i64)> {
        timeline
            .breakpoints()
            .iter()
            .map(|b| (b.measure, b.offset_ms))
            .collect()
    }

    #[test]
    fn test_constant_tempo() {
        // 120 bpm, 4 beats per measure: 2000 ms per measure
        let (timeline, diagnostics) = resolve(&[(120.0, 0.0)], &[], 4);
        assert!(diagnostics.is_empty());
        assert_eq!(timeline.offset_of(0.0), 0);
        assert_eq!(timeline.offset_of(1.0), 2000);
        assert_eq!(timeline.offset_of(2.25), 4500);
    }

    #[test]
    fn test_tempo_change() {
        let (timeline, _) = resolve(&[(120.0, 0.0), (60.0, 2.0)], &[], 4);
        assert_eq!(offsets(&timeline), vec![(0.0, 0), (2.0, 4000)]);
        assert_eq!(timeline.offset_of(3.0), 8000);
        assert_eq!(timeline.offset_of(1.5), 3000);
    }

    #[test]
    fn test_divisor_three() {
        let (timeline, _) = resolve(&[(120.0, 0.0)], &[], 3);
        assert_eq!(timeline.offset_of(1.0), 1500);
    }

    #[test]
    fn test_frac_measure_inserts_breakpoint() {
        let (timeline, _) = resolve(&[(120.0, 0.0), (60.0, 4.0)], &[(1, 0.5)], 4);
        // measure 1 is half length, so measure 2 starts 1000 ms early
        assert_eq!(
            offsets(&timeline),
            vec![(0.0, 0), (2.0, 3000), (4.0, 7000)]
        );
        assert_eq!(timeline.breakpoints()[1].bpm, 120.0);
        assert_eq!(timeline.offset_of(1.25), 2500);
        assert_eq!(timeline.offset_of(2.5), 4000);
        assert_eq!(timeline.offset_of(5.0), 11000);
    }

    #[test]
    fn test_frac_measure_keeps_existing_breakpoint() {
        let (timeline, _) = resolve(&[(120.0, 0.0), (240.0, 1.0)], &[(0, 0.75)], 4);
        assert_eq!(offsets(&timeline), vec![(0.0, 0), (1.0, 1500)]);
        assert_eq!(timeline.breakpoints()[1].bpm, 240.0);
    }

    #[test]
    fn test_degenerate_tempo_clamped() {
        let (timeline, diagnostics) = resolve(&[(120.0, 0.0), (1.0e9, 1.0)], &[], 4);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics.iter().next(),
            Some(Diagnostic::DegenerateTempo { measure, .. }) if *measure == 1.0
        ));
        assert_eq!(timeline.breakpoints()[1].beat_ms, 1.0);
        assert_eq!(timeline.offset_of(2.0), 2004);
    }

    #[test]
    fn test_missing_initial_breakpoint_uses_header_bpm() {
        let mut diagnostics = Diagnostics::new();
        let timeline = Timeline::resolve(
            vec![TempoBreakpoint::new(60.0, 1.0)],
            &[],
            120.0,
            4,
            &mut diagnostics,
        );
        assert_eq!(offsets(&timeline), vec![(0.0, 0), (1.0, 2000)]);
    }

    #[test]
    fn test_offset_of_is_monotonic() {
        let (timeline, _) = resolve(
            &[(150.0, 0.0), (90.0, 3.5), (200.0, 7.25), (140.0, 12.0)],
            &[],
            4,
        );
        let mut last = i64::MIN;
        for step in 0..=64 {
            let offset = timeline.offset_of(step as f64 * 0.25);
            assert!(offset >= last, "offset went backwards at step {}", step);
            last = offset;
        }
    }
}
