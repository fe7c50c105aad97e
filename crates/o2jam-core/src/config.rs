//! Decode configuration.
//!
//! Everything a decode depends on besides the two input buffers lives here
//! and is passed explicitly. The struct deserializes from TOML with every
//! field optional:
//!
//! ```toml
//! encodings = ["gb18030", "euc-kr"]
//! default_divisor = 4
//! skip_filler_autoplay = false
//! ```

use std::fs;
use std::path::Path;

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `encoding_rs` labels tried in order for the header strings.
    pub encodings: Vec<String>,
    /// Divisor used when a region gives no usable event counts.
    pub default_divisor: u32,
    /// Treat a raw autoplay sample value of 1 as a no-op filler.
    pub skip_filler_autoplay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            encodings: vec!["euc-kr".to_string(), "gb18030".to_string()],
            default_divisor: 4,
            skip_filler_autoplay: false,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.default_divisor == 0 {
            return Err(Error::ConfigParse(
                "default_divisor must be positive".to_string(),
            ));
        }
        Ok(config)
    }

    /// Resolves the configured labels, failing on the first unknown one.
    pub fn resolve_encodings(&self) -> Result<Vec<&'static Encoding>> {
        self.encodings
            .iter()
            .map(|label| {
                Encoding::for_label(label.trim().as_bytes())
                    .ok_or_else(|| Error::UnknownEncoding(label.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{EUC_KR, GB18030, SHIFT_JIS};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_divisor, 4);
        assert!(!config.skip_filler_autoplay);
        assert_eq!(config.resolve_encodings().unwrap(), vec![EUC_KR, GB18030]);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::parse("encodings = [\"shift_jis\"]\n").unwrap();
        assert_eq!(config.resolve_encodings().unwrap(), vec![SHIFT_JIS]);
        assert_eq!(config.default_divisor, 4);
    }

    #[test]
    fn test_parse_rejects_zero_divisor() {
        assert!(matches!(
            Config::parse("default_divisor = 0"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_unknown_encoding_label() {
        let config = Config {
            encodings: vec!["klingon".to_string()],
            ..Config::default()
        };
        assert!(matches!(
            config.resolve_encodings(),
            Err(Error::UnknownEncoding(label)) if label == "klingon"
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("o2jam.toml");
        fs::write(&path, "skip_filler_autoplay = true\ndefault_divisor = 3\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.skip_filler_autoplay);
        assert_eq!(config.default_divisor, 3);
    }
}
