//! Application configuration
//!
//! Layering, lowest precedence first:
//! 1. `BotSettings::default()`
//! 2. JSON settings file (`ABYSSRUN_CONFIG`, default `config.json`)
//! 3. `ABYSSRUN_*` environment variables (a `.env` file is honoured)

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use abyssrun_domain::BotSettings;
use anyhow::{Context, Result};

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Application configuration loaded from file and environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bot tuning knobs
    pub settings: BotSettings,
    /// Where `settings` were read from (may not exist)
    pub config_path: PathBuf,
    /// Recorded cassette to replay instead of driving a live game
    pub replay_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from `.env`, the settings file and the environment
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to load .env");
            }
        }

        let config_path = env::var("ABYSSRUN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut settings = load_settings_file(&config_path)?;
        apply_env_overrides(&mut settings, |key| env::var(key).ok())?;
        settings
            .validate()
            .context("configuration failed validation")?;

        Ok(Self {
            settings,
            config_path,
            replay_path: env::var("ABYSSRUN_REPLAY")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

/// Load `.env.local` then `.env` from `dir`, earlier files winning.
///
/// Missing files are skipped. Files that fail to parse are returned so the
/// caller can report them once logging is up.
pub fn load_env_files(dir: &Path) -> Vec<(PathBuf, dotenvy::Error)> {
    let mut failures = Vec::new();
    for filename in [".env.local", ".env"] {
        let path = dir.join(filename);
        if path.exists() {
            if let Err(e) = dotenvy::from_path(&path) {
                failures.push((path, e));
            }
        }
    }
    failures
}

/// Read settings from `path`. A missing file yields defaults; a malformed
/// one is an error.
pub fn load_settings_file(path: &Path) -> Result<BotSettings> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "No settings file, using defaults");
        return Ok(BotSettings::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded settings file");
    Ok(settings)
}

/// Apply `ABYSSRUN_*` overrides looked up through `lookup`.
pub fn apply_env_overrides<F>(settings: &mut BotSettings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    override_with(&lookup, "ABYSSRUN_STATE_TIMEOUT_SECS", &mut settings.timeouts.state_timeout_secs)?;
    override_with(&lookup, "ABYSSRUN_VISION_INTERVAL_MS", &mut settings.vision.interval_ms)?;
    override_with(
        &lookup,
        "ABYSSRUN_CONFIDENCE_THRESHOLD",
        &mut settings.vision.confidence_threshold,
    )?;
    override_with(
        &lookup,
        "ABYSSRUN_MONSTER_DETECTION_RANGE",
        &mut settings.battle.monster_detection_range,
    )?;
    override_with(
        &lookup,
        "ABYSSRUN_APPROACH_DISTANCE",
        &mut settings.battle.approach_distance,
    )?;
    override_with(&lookup, "ABYSSRUN_ATTACK_COUNT", &mut settings.battle.attack_count)?;
    Ok(())
}

fn override_with<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number, got {raw:?}"))?;
    }
    Ok(())
}
