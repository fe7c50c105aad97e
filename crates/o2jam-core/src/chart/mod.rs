//! Chart container decoding.
//!
//! - `ChartHeader` - fixed 300-byte header, region layout and metadata
//! - `EventStreamDecoder` - per-difficulty event replay
//! - `Timeline` - measure to millisecond conversion
//! - `Difficulty`, `Genre` - header enums

mod difficulty;
mod events;
mod genre;
mod header;
mod timeline;

pub use difficulty::*;
pub use events::*;
pub use genre::*;
pub use header::*;
pub use timeline::*;
