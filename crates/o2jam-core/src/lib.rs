pub mod audio;
pub mod bytes;
pub mod chart;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod song;

pub use audio::{AudioContainer, Extension, SampleBlob, SampleSet, Signature};
pub use chart::{
    AutoplaySample, ChartHeader, Difficulty, EventStream, EventStreamDecoder, FracMeasure, Genre,
    Keysound, Note, NoteKind, TempoBreakpoint, Timeline,
};
pub use config::Config;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{Error, Result};
pub use song::{Chart, Song};
