use serde::{Deserialize, Serialize};
use strum::{FromRepr, IntoStaticStr};

use crate::error::{Error, Result};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRepr, IntoStaticStr,
)]
#[repr(u32)]
pub enum Genre {
    Ballad = 0,
    Rock = 1,
    Dance = 2,
    Techno = 3,
    #[strum(serialize = "Hip-hop")]
    HipHop = 4,
    #[strum(serialize = "Soul/R&B")]
    SoulRnb = 5,
    Jazz = 6,
    Funk = 7,
    Classical = 8,
    Traditional = 9,
    Etc = 10,
}

impl Genre {
    pub fn from_code(code: u32) -> Result<Self> {
        Self::from_repr(code).ok_or(Error::UnknownGenre(code))
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
