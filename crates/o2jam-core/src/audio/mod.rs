//! Audio container decoding.
//!
//! Three container layouts exist, told apart by their first four bytes:
//! - `M30\0` - a single OGG stream, optionally masked with [`cipher::nami_xor`]
//! - `OMC\0` / `OJM\0` - a scrambled WAV region followed by a plain OGG region
//!
//! Decoding yields a [`SampleSet`] keyed by the sample id the chart refers
//! to. Ids below 1000 come from WAV chunks, ids from 1000 up are OGG.

pub mod cipher;
mod m30;
mod omc;
pub mod wav;

use std::collections::BTreeMap;

use serde::Serialize;
use strum::IntoStaticStr;
use tracing::debug;

use crate::bytes::ByteCursor;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};

/// Offset added to the id of every OGG-origin sample.
pub const OGG_ID_OFFSET: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Extension {
    Ogg,
    Wav,
}

impl Extension {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl std::fmt::Display for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded, playable sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBlob {
    pub id: u32,
    pub bytes: Vec<u8>,
    pub extension: Extension,
}

impl SampleBlob {
    /// File name the sample is exported under, e.g. `1002.ogg`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, self.extension)
    }
}

/// Decoded samples ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSet {
    samples: BTreeMap<u32, SampleBlob>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sample, replacing any earlier sample with the same id.
    pub fn insert(&mut self, sample: SampleBlob) {
        if self.samples.contains_key(&sample.id) {
            debug!("Sample {} declared twice, keeping the later one", sample.id);
        }
        self.samples.insert(sample.id, sample);
    }

    pub fn get(&self, id: u32) -> Option<&SampleBlob> {
        self.samples.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.samples.contains_key(&id)
    }

    pub fn extension_of(&self, id: u32) -> Option<Extension> {
        self.samples.get(&id).map(|s| s.extension)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.samples.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleBlob> {
        self.samples.values()
    }
}

impl FromIterator<SampleBlob> for SampleSet {
    fn from_iter<I: IntoIterator<Item = SampleBlob>>(iter: I) -> Self {
        let mut set = Self::new();
        for sample in iter {
            set.insert(sample);
        }
        set
    }
}

/// Container layout, identified by the leading magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoStaticStr)]
pub enum Signature {
    #[strum(serialize = "M30")]
    M30,
    #[strum(serialize = "OMC")]
    Omc,
    #[strum(serialize = "OJM")]
    Ojm,
}

impl Signature {
    pub const fn magic(&self) -> [u8; 4] {
        match self {
            Self::M30 => *b"M30\0",
            Self::Omc => *b"OMC\0",
            Self::Ojm => *b"OJM\0",
        }
    }

    /// Identifies the layout of `buffer` from its first four bytes.
    pub fn detect(buffer: &[u8]) -> Result<Self> {
        let mut magic = [0u8; 4];
        let len = buffer.len().min(4);
        magic[..len].copy_from_slice(&buffer[..len]);

        [Self::M30, Self::Omc, Self::Ojm]
            .into_iter()
            .find(|s| len == 4 && s.magic() == magic)
            .ok_or(Error::UnknownSignature(magic))
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.into())
    }
}

/// Result of decoding one audio container.
#[derive(Debug, Clone, Default)]
pub struct AudioContainer {
    pub signature: Option<Signature>,
    pub samples: SampleSet,
    pub diagnostics: Diagnostics,
}

/// Decodes an audio container into its samples.
///
/// Fails only when the signature is unrecognised or the container header
/// itself is cut short. Problems inside the sample stream stop or skip the
/// affected samples and are reported in `diagnostics`.
pub fn decode(buffer: &[u8]) -> Result<AudioContainer> {
    let signature = Signature::detect(buffer)?;
    let mut cursor = ByteCursor::new(buffer);
    cursor.skip(4)?;

    let mut samples = SampleSet::new();
    let mut diagnostics = Diagnostics::new();

    match signature {
        Signature::M30 => m30::parse(&mut cursor, &mut samples, &mut diagnostics)?,
        Signature::Omc | Signature::Ojm => {
            omc::parse(&mut cursor, &mut samples, &mut diagnostics)?
        }
    }

    debug!("Decoded {} samples from {} container", samples.len(), signature);

    Ok(AudioContainer {
        signature: Some(signature),
        samples,
        diagnostics,
    })
}
