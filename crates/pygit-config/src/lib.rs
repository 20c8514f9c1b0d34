//! Repository configuration: `<repo>/.pygit/config`.
//!
//! A single INI-style file — `[section]` / `[section "subsection"]` headers
//! followed by `name = value` lines, with a bare `name` read as boolean
//! `true`. There is exactly one file and one scope; the multi-scope lookup
//! chain (`/etc/gitconfig`, `~/.gitconfig`, `-c` overrides) that C git layers
//! on top of this format is out of scope here.

pub mod error;
mod file;
pub mod key;
pub mod parse;
pub mod types;

pub use error::ConfigError;
pub use file::Config;
pub use key::ConfigKey;
pub use types::parse_bool;
