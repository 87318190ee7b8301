//! Layered configuration for refile.
//!
//! Values are merged, last one wins:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A configuration file: TOML, YAML or JSON, chosen by file extension.
//!    Either passed explicitly or looked up in the platform configuration
//!    directory ([`default_path`]).
//! 3. Environment variables prefixed with `REFILE_`. Nested keys use a
//!    double underscore, e.g. `REFILE_EXTENSIONS__SOURCE=spl`.
//!
//! ```toml
//! roots = ["/mnt/archive/cdv3/bol/z1", "/mnt/archive/cdv3/bol/z2"]
//! interval = 60
//! unknown = "spool"
//!
//! [converter]
//! executable = "/usr/bin/gs"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "REFILE_";
const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_INTERVAL_SECS: u64 = 60;

/// What to do with a file whose content matched no signature at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    /// Assume it is spooled PostScript: rename to the source extension and
    /// let the converter decide.
    #[default]
    Spool,
    /// Leave the file without an extension.
    Skip,
}

/// Extension families, all without the leading dot.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Extensions {
    /// Spooled source format handed to the converter.
    pub source: String,
    /// Generic unknown-binary format, also handed to the converter.
    pub binary: String,
    /// What the converter produces.
    pub output: String,
}
impl Default for Extensions {
    fn default() -> Self {
        Self {
            source: "ps".to_string(),
            binary: "bin".to_string(),
            output: "pdf".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Ghostscript executable; discovered from `PATH` when omitted.
    pub executable: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Archive root directories. Scanned recursively.
    pub roots: Vec<PathBuf>,
    /// Seconds between scheduled runs.
    pub interval: u64,
    /// Files per batch, the unit of concurrent dispatch.
    pub batch_size: usize,
    /// Upper bound on tasks in flight at once, per stage.
    pub concurrency: usize,
    pub unknown: UnknownPolicy,
    pub extensions: Extensions,
    pub converter: ConverterConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            interval: DEFAULT_INTERVAL_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: default_concurrency(),
            unknown: UnknownPolicy::default(),
            extensions: Extensions::default(),
            converter: ConverterConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, a file and the environment.
    ///
    /// An explicit `path` must exist. Without one, the file at
    /// [`default_path`] is used if present and silently skipped otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => figment = figment.merge(file_provider(path)?),
            None => match default_path() {
                Some(path) if path.is_file() => {
                    tracing::debug!(path = %path.display(), "Using configuration file from default location");
                    figment = figment.merge(file_provider(&path)?);
                },
                _ => tracing::debug!("No configuration file found; using defaults and environment"),
            },
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate from an already-assembled [`Figment`].
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().map_err(|e| ErrorKind::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            exn::bail!(invalid("interval", "must be at least one second"));
        }
        if self.batch_size == 0 {
            exn::bail!(invalid("batch_size", "must be greater than zero"));
        }
        if self.concurrency == 0 {
            exn::bail!(invalid("concurrency", "must be greater than zero"));
        }
        if let Some(root) = self.roots.iter().find(|r| !r.is_absolute()) {
            exn::bail!(invalid("roots", format!("`{}` is not an absolute path", root.display())));
        }
        if self.roots.is_empty() {
            // Not fatal: a run over zero roots is a (fast) no-op.
            tracing::warn!("No archive roots configured; runs will find nothing");
        }
        let Extensions { source, binary, output } = &self.extensions;
        for (field, ext) in [("extensions.source", source), ("extensions.binary", binary), ("extensions.output", output)] {
            if ext.is_empty() || ext.contains('.') || ext.contains(['/', '\\']) {
                exn::bail!(invalid(field, format!("`{ext}` is not a bare file extension")));
            }
        }
        if source.eq_ignore_ascii_case(binary)
            || source.eq_ignore_ascii_case(output)
            || binary.eq_ignore_ascii_case(output)
        {
            exn::bail!(invalid("extensions", "source, binary and output must all differ"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ErrorKind {
    ErrorKind::Validation { field, reason: reason.into() }
}

fn file_provider(path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    let figment = Figment::new();
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

/// Platform-specific default configuration file location, e.g.
/// `~/.config/refile/config.toml` on Linux.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "refile").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn default_concurrency() -> usize {
    // Everything is I/O bound against network storage; oversubscribe.
    std::thread::available_parallelism().map(NonZero::get).unwrap_or(1) * 4
}
