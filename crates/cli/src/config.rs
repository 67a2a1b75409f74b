//! Optional settings file.
//!
//! Looked up at `--config`, then `$TIRPK_CONFIG`, then
//! `$XDG_CONFIG_HOME/tirpk/config.toml`. Only the default location may be
//! absent.
//!
//! ```toml
//! compression_level = 9
//! overwrite = false
//! strict = false
//! log = "tirpk_rpk=debug"
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::Deserialize;

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "TIRPK_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	/// Deflate level for written RPKs, 0 to 9.
	pub compression_level: u8,
	/// Replace existing RPKs without `--force`.
	pub overwrite: bool,
	/// Treat extra content as a failure, as `--strict` does.
	pub strict: bool,
	/// Log filter, used when `RUST_LOG` is unset.
	pub log: Option<String>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			compression_level: 9,
			overwrite: false,
			strict: false,
			log: None,
		}
	}
}

impl Settings {
	pub fn parse(text: &str) -> anyhow::Result<Self> {
		let settings: Self = toml::from_str(text)?;
		if settings.compression_level > 9 {
			bail!("compression_level must be between 0 and 9, got {}", settings.compression_level);
		}
		Ok(settings)
	}

	pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
		let requested = explicit
			.map(Path::to_path_buf)
			.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
		let required = requested.is_some();
		let Some(path) = requested.or_else(default_path) else {
			return Ok(Self::default());
		};

		match std::fs::read_to_string(&path) {
			Ok(text) => {
				let settings = Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))?;
				tracing::debug!(path = %path.display(), "loaded config");
				Ok(settings)
			}
			Err(err) if !required && err.kind() == ErrorKind::NotFound => Ok(Self::default()),
			Err(err) => Err(err).with_context(|| format!("failed to read config {}", path.display())),
		}
	}
}

pub fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("tirpk").join("config.toml"))
}
