//! `Config`: a single parsed config file, preserving original formatting.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use bstr::{BStr, BString, ByteSlice, ByteVec};

use crate::error::ConfigError;
use crate::key::ConfigKey;
use crate::parse::{self, ConfigEvent};
use crate::types;

/// A single repository config file (`.pygit/config`).
pub struct Config {
    path: Option<PathBuf>,
    events: Vec<ConfigEvent>,
}

impl Config {
    /// An empty, in-memory config with no backing file.
    pub fn new() -> Self {
        Config {
            path: None,
            events: Vec::new(),
        }
    }

    /// Parse a config file's bytes.
    pub fn parse(content: &[u8], path: Option<&Path>) -> Result<Self, ConfigError> {
        let filename = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string());
        let events = parse::parse_config(content, &filename)?;

        Ok(Config {
            path: path.map(|p| p.to_path_buf()),
            events,
        })
    }

    /// Load `path`. A missing file is not an error — it loads as empty, since
    /// every repository starts without a config until the first `config` set.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read(path) {
            Ok(content) => Self::parse(&content, Some(path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config {
                path: Some(path.to_path_buf()),
                events: Vec::new(),
            }),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get the first value for a key. `Some(None)` means the key is present
    /// as a bare boolean (no `=`); `None` means the key is absent entirely.
    pub fn get(&self, key: &ConfigKey) -> Option<Option<&BStr>> {
        let mut current_section = BString::new(Vec::new());
        let mut current_subsection: Option<BString> = None;
        let mut found = None;

        for event in &self.events {
            match event {
                ConfigEvent::SectionHeader {
                    section,
                    subsection,
                    ..
                } => {
                    current_section = section.clone();
                    current_subsection = subsection.clone();
                }
                ConfigEvent::Entry {
                    key: entry_key,
                    value,
                    ..
                } => {
                    if key.section == current_section
                        && key.subsection == current_subsection
                        && key.name == *entry_key
                    {
                        // Last occurrence wins, matching assignment order.
                        found = Some(value.as_deref().map(|v| v.as_bstr()));
                    }
                }
                _ => {}
            }
        }

        found
    }

    /// Get a value as a string.
    pub fn get_string(&self, key_str: &str) -> Result<Option<String>, ConfigError> {
        let key = ConfigKey::parse(key_str)?;
        Ok(self
            .get(&key)
            .map(|v| v.map(|v| v.to_str_lossy().to_string()).unwrap_or_default()))
    }

    /// Get a value as a boolean, per `.pygit/config`'s INI-boolean rules.
    pub fn get_bool(&self, key_str: &str) -> Result<Option<bool>, ConfigError> {
        let key = ConfigKey::parse(key_str)?;
        match self.get(&key) {
            Some(value) => types::parse_bool(value).map(Some),
            None => Ok(None),
        }
    }

    /// Set a value, by string key. If the key exists, updates the last
    /// occurrence; otherwise appends to the matching section, creating the
    /// section if necessary.
    pub fn set_string(&mut self, key_str: &str, value: &str) -> Result<(), ConfigError> {
        let key = ConfigKey::parse(key_str)?;
        self.set(&key, BStr::new(value.as_bytes()));
        Ok(())
    }

    fn set(&mut self, key: &ConfigKey, value: &BStr) {
        let mut current_section = BString::new(Vec::new());
        let mut current_subsection: Option<BString> = None;
        let mut last_match_idx: Option<usize> = None;
        let mut last_section_idx: Option<usize> = None;
        let mut last_entry_in_section_idx: Option<usize> = None;

        for (i, event) in self.events.iter().enumerate() {
            match event {
                ConfigEvent::SectionHeader {
                    section,
                    subsection,
                    ..
                } => {
                    current_section = section.clone();
                    current_subsection = subsection.clone();
                    if key.section == current_section && key.subsection == current_subsection {
                        last_section_idx = Some(i);
                        last_entry_in_section_idx = None;
                    }
                }
                ConfigEvent::Entry {
                    key: entry_key, ..
                } => {
                    if key.section == current_section && key.subsection == current_subsection {
                        last_entry_in_section_idx = Some(i);
                        if key.name == *entry_key {
                            last_match_idx = Some(i);
                        }
                    }
                }
                _ => {}
            }
        }

        let new_raw = format_entry(key.name.as_ref(), value);

        if let Some(idx) = last_match_idx {
            self.events[idx] = ConfigEvent::Entry {
                raw: new_raw,
                key: key.name.clone(),
                value: Some(value.to_owned()),
                line_number: 0,
            };
        } else if last_section_idx.is_some() {
            let insert_at = last_entry_in_section_idx.or(last_section_idx).unwrap() + 1;
            self.events.insert(
                insert_at,
                ConfigEvent::Entry {
                    raw: new_raw,
                    key: key.name.clone(),
                    value: Some(value.to_owned()),
                    line_number: 0,
                },
            );
        } else {
            let section_header = format_section_header(
                key.section.as_ref(),
                key.subsection.as_ref().map(|s| s.as_ref()),
            );
            self.events.push(ConfigEvent::SectionHeader {
                raw: section_header,
                section: key.section.clone(),
                subsection: key.subsection.clone(),
            });
            self.events.push(ConfigEvent::Entry {
                raw: new_raw,
                key: key.name.clone(),
                value: Some(value.to_owned()),
                line_number: 0,
            });
        }
    }

    /// Remove the first occurrence of a key. Returns true if it was present.
    pub fn remove(&mut self, key_str: &str) -> Result<bool, ConfigError> {
        let key = ConfigKey::parse(key_str)?;
        let mut current_section = BString::new(Vec::new());
        let mut current_subsection: Option<BString> = None;

        for (i, event) in self.events.iter().enumerate() {
            match event {
                ConfigEvent::SectionHeader {
                    section,
                    subsection,
                    ..
                } => {
                    current_section = section.clone();
                    current_subsection = subsection.clone();
                }
                ConfigEvent::Entry {
                    key: entry_key, ..
                } => {
                    if key.section == current_section
                        && key.subsection == current_subsection
                        && key.name == *entry_key
                    {
                        self.events.remove(i);
                        return Ok(true);
                    }
                }
                _ => {}
            }
        }
        Ok(false)
    }

    /// All entries as `(canonical key, value)` pairs, in file order.
    pub fn entries(&self) -> Vec<(String, Option<String>)> {
        let mut out = Vec::new();
        let mut current_section = BString::new(Vec::new());
        let mut current_subsection: Option<BString> = None;

        for event in &self.events {
            match event {
                ConfigEvent::SectionHeader {
                    section,
                    subsection,
                    ..
                } => {
                    current_section = section.clone();
                    current_subsection = subsection.clone();
                }
                ConfigEvent::Entry { key, value, .. } => {
                    let config_key = ConfigKey {
                        section: current_section.clone(),
                        subsection: current_subsection.clone(),
                        name: key.clone(),
                    };
                    out.push((
                        config_key.to_canonical(),
                        value.as_ref().map(|v| v.to_str_lossy().to_string()),
                    ));
                }
                _ => {}
            }
        }

        out
    }

    /// Serialize to bytes, preserving original formatting of untouched lines.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for event in &self.events {
            match event {
                ConfigEvent::SectionHeader { raw, .. } => out.extend_from_slice(raw.as_ref()),
                ConfigEvent::Entry { raw, .. } => out.extend_from_slice(raw.as_ref()),
                ConfigEvent::Comment(raw) => out.extend_from_slice(raw.as_ref()),
                ConfigEvent::Blank(raw) => out.extend_from_slice(raw.as_ref()),
            }
        }
        out
    }

    /// Write to `path` atomically via a lock file.
    pub fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut lock = pygit_utils::lockfile::LockFile::acquire(path)?;
        let content = self.to_bytes();
        lock.write_all(&content)?;
        lock.commit()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .field("events_count", &self.events.len())
            .finish()
    }
}

fn format_entry(key: &BStr, value: &BStr) -> BString {
    let needs_quote = value.is_empty()
        || value.first() == Some(&b' ')
        || value.last() == Some(&b' ')
        || value.contains(&b';')
        || value.contains(&b'#')
        || value.contains(&b'\r');

    let mut out = BString::new(Vec::new());
    out.push_str(b"\t");
    out.push_str(key.as_bytes());
    out.push_str(b" = ");

    if needs_quote {
        out.push_byte(b'"');
    }
    for &b in value.as_bytes() {
        match b {
            b'\\' => out.push_str(b"\\\\"),
            b'"' => out.push_str(b"\\\""),
            b'\n' => out.push_str(b"\\n"),
            b'\t' => out.push_str(b"\\t"),
            _ => out.push_byte(b),
        }
    }
    if needs_quote {
        out.push_byte(b'"');
    }

    out.push_byte(b'\n');
    out
}

fn format_section_header(section: &BStr, subsection: Option<&BStr>) -> BString {
    let mut out = BString::new(Vec::new());
    out.push_byte(b'[');
    out.push_str(section.as_bytes());

    if let Some(sub) = subsection {
        out.push_str(b" \"");
        for &b in sub.as_bytes() {
            match b {
                b'\\' => out.push_str(b"\\\\"),
                b'"' => out.push_str(b"\\\""),
                _ => out.push_byte(b),
            }
        }
        out.push_byte(b'"');
    }

    out.push_str(b"]\n");
    out
}
