//! Engine-wide configuration for the dataqueue engine.
//!
//! The spec leaves a handful of process-wide tunables as implementation
//! choices rather than baking them into the on-disk format: where queue
//! directories live, how many handles a process may have open at once, and
//! what the default log verbosity is. Those live here, loaded from a TOML
//! file the same way `onyx-config`/`obsidian-config` load theirs.

pub mod config;

pub use config::{ConfigError, EngineConfig};
