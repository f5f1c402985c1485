//! Field keys addressing run data
//!
//! A key names a field by section and name, written `section:name` in its
//! string form (e.g. `config:lr`, `summary:acc`, `tags:hidden`).

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespace a field key belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Section {
    /// Built-in run fields (name, state, host, ...)
    Run,
    /// Flattened config dot-paths
    Config,
    /// Summary metrics
    Summary,
    /// Tag membership
    Tags,
    /// A section name that is not recognized; never matches anything
    Unknown(String),
}

impl Section {
    pub fn as_str(&self) -> &str {
        match self {
            Section::Run => "run",
            Section::Config => "config",
            Section::Summary => "summary",
            Section::Tags => "tags",
            Section::Unknown(name) => name,
        }
    }

    /// Returns true unless this is `Section::Unknown`
    pub fn is_known(&self) -> bool {
        !matches!(self, Section::Unknown(_))
    }
}

impl From<String> for Section {
    fn from(name: String) -> Self {
        match name.as_str() {
            "run" => Section::Run,
            "config" => Section::Config,
            "summary" => Section::Summary,
            "tags" => Section::Tags,
            _ => Section::Unknown(name),
        }
    }
}

impl From<Section> for String {
    fn from(section: Section) -> Self {
        section.as_str().to_string()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to one field of a run
///
/// Serializes as `{"section": ..., "name": ...}` and deserializes from that
/// shape or from the `section:name` string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawKey")]
pub struct RunKey {
    pub section: Section,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawKey {
    Text(String),
    Parts { section: Section, name: String },
}

impl TryFrom<RawKey> for RunKey {
    type Error = CoreError;

    fn try_from(raw: RawKey) -> Result<Self> {
        match raw {
            RawKey::Text(text) => text.parse(),
            RawKey::Parts { section, name } => Ok(RunKey { section, name }),
        }
    }
}

impl RunKey {
    pub fn new(section: Section, name: impl Into<String>) -> Self {
        Self {
            section,
            name: name.into(),
        }
    }

    pub fn run(name: impl Into<String>) -> Self {
        Self::new(Section::Run, name)
    }

    pub fn config(name: impl Into<String>) -> Self {
        Self::new(Section::Config, name)
    }

    pub fn summary(name: impl Into<String>) -> Self {
        Self::new(Section::Summary, name)
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self::new(Section::Tags, name)
    }

    /// The `section:name` display form
    pub fn display_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.section, self.name)
    }
}

/// Parses `section:name`. Text without a recognized section prefix is a run
/// field, so `name` and `run:name` are the same key.
impl FromStr for RunKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(CoreError::InvalidKey(s.to_string()));
        }
        match s.split_once(':') {
            Some((section, name)) => {
                let section = Section::from(section.to_string());
                if !section.is_known() {
                    return Ok(RunKey::run(s));
                }
                if name.is_empty() {
                    return Err(CoreError::InvalidKey(s.to_string()));
                }
                Ok(RunKey::new(section, name))
            }
            None => Ok(RunKey::run(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_string() {
        let key: RunKey = "config:akey.subkey".parse().unwrap();
        assert_eq!(key, RunKey::config("akey.subkey"));

        let key: RunKey = "name".parse().unwrap();
        assert_eq!(key, RunKey::run("name"));

        let key: RunKey = "summary:val:loss".parse().unwrap();
        assert_eq!(key, RunKey::summary("val:loss"));
    }

    #[test]
    fn test_key_from_string_invalid() {
        assert!("".parse::<RunKey>().is_err());
        assert!("config:".parse::<RunKey>().is_err());
    }

    #[test]
    fn test_display_key_round_trip() {
        let key = RunKey::summary("acc");
        assert_eq!(key.display_key(), "summary:acc");
        assert_eq!(key.display_key().parse::<RunKey>().unwrap(), key);
    }

    #[test]
    fn test_section_serde() {
        let key: RunKey = serde_json::from_str(r#"{"section":"tags","name":"hidden"}"#).unwrap();
        assert_eq!(key.section, Section::Tags);

        let key: RunKey = serde_json::from_str(r#"{"section":"bogus","name":"x"}"#).unwrap();
        assert_eq!(key.section, Section::Unknown("bogus".to_string()));
        assert!(!key.section.is_known());

        let json = serde_json::to_string(&RunKey::config("lr")).unwrap();
        assert_eq!(json, r#"{"section":"config","name":"lr"}"#);

        let key: RunKey = serde_json::from_str(r#""summary:acc""#).unwrap();
        assert_eq!(key, RunKey::summary("acc"));
        assert!(serde_json::from_str::<RunKey>(r#""""#).is_err());
    }
}
