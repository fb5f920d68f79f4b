use crate::quirks::{MountQuirk, QuirkTable};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    /// Paths the platform misreports as living on `/`.
    ///
    /// Example in mstat.toml:
    /// ```toml
    /// [[quirks]]
    /// path     = "/storage/emulated/0"
    /// redirect = "/data/media"
    /// ```
    #[serde(default = "QuirkTable::defaults")]
    pub quirks: Vec<MountQuirk>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Usage percentage at or above which the indicator shows the warning colour
    pub warn_pct: u32,
    /// Re-check interval in milliseconds for --watch
    pub update_interval_ms: u64,
    /// How long a one-shot run waits for all passes before giving up
    pub query_timeout_ms: u64,
    /// Color theme: default, dracula, gruvbox, nord
    pub theme: String,
}

// ── Defaults ─────────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            quirks:  QuirkTable::defaults(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            warn_pct:           85,
            update_interval_ms: 2000,
            query_timeout_ms:   5000,
            theme:              "default".into(),
        }
    }
}

// ── Load / Save ───────────────────────────────────────────────────────

impl Config {
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("no config dir, using defaults");
                Config::default()
            }
        }
    }

    /// A missing file is created with the defaults. A file that exists but
    /// does not parse is left alone and the defaults are used for this run.
    pub fn load_from(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(t)  => t,
            Err(e) => {
                tracing::debug!("using default config, {} unreadable: {}", path.display(), e);
                // Write defaults on first run (best-effort)
                if let Err(e) = try_write_defaults(path) {
                    tracing::debug!("could not write default config: {:#}", e);
                }
                return Config::default();
            }
        };
        match Self::parse(&text) {
            Ok(c)  => c,
            Err(e) => {
                tracing::warn!("ignoring {}, using defaults: {:#}", path.display(), e);
                Config::default()
            }
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mstat").join("mstat.toml"))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(text)?;
        Ok(cfg.validated())
    }

    fn validated(mut self) -> Self {
        if self.general.warn_pct > 100 {
            tracing::warn!("warn_pct {} is above 100, clamping", self.general.warn_pct);
            self.general.warn_pct = 100;
        }
        self
    }

    pub fn quirk_table(&self) -> QuirkTable {
        QuirkTable::new(self.quirks.clone())
    }
}

fn try_write_defaults(path: &Path) -> Result<()> {
    if path.exists() { return Ok(()); }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(&Config::default())?;
    fs::write(path, format!("# mstat configuration\n# Generated on first run, edit freely\n\n{}", text))?;
    Ok(())
}
