//! Application-level configuration loading: workbook layout, seeding and media encoding limits.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::dao::models::Category;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MATCHBOOK_CONFIG_PATH";
const LOGIN_ID_ENV: &str = "MATCHBOOK_LOGIN_ID";
const LOGIN_PASS_ENV: &str = "MATCHBOOK_LOGIN_PASS";

/// Names of the sheets and the cell holding the results blob.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    /// Sheet holding the master match list.
    pub list: String,
    /// Sheet holding the results blob.
    pub results: String,
    /// Cell of the results sheet holding the blob, in A1 notation.
    pub results_cell: String,
    /// Sheet holding one row per attachment.
    pub media: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            list: "matches".into(),
            results: "results".into(),
            results_cell: "A2".into(),
            media: "media".into(),
        }
    }
}

/// Parameters of the shrink-until-it-fits loop used for image uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MediaEncodingConfig {
    /// Maximum encoded size (base64 characters) of a stored payload.
    pub budget: usize,
    /// Bounding box side of the first attempt.
    pub initial_width: u32,
    /// JPEG quality of the first attempt.
    pub initial_quality: u8,
    /// Width removed after each attempt.
    pub width_step: u32,
    /// Quality removed after each attempt.
    pub quality_step: u8,
    /// The loop gives up once the width drops below this value.
    pub min_width: u32,
    /// The loop gives up once the quality drops below this value.
    pub min_quality: u8,
}

impl Default for MediaEncodingConfig {
    fn default() -> Self {
        Self {
            budget: 40_000,
            initial_width: 800,
            initial_quality: 70,
            width_step: 100,
            quality_step: 10,
            min_width: 100,
            min_quality: 5,
        }
    }
}

impl MediaEncodingConfig {
    /// Clamp values so every step shrinks the output and qualities stay in JPEG range.
    pub fn sanitized(self) -> Self {
        Self {
            width_step: self.width_step.max(1),
            quality_step: self.quality_step.max(1),
            initial_quality: self.initial_quality.clamp(1, 100),
            min_quality: self.min_quality.clamp(1, 100),
            min_width: self.min_width.max(1),
            ..self
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Sheet names and the results cell.
    pub sheets: SheetLayout,
    /// Number of blank records written when the list sheet is empty.
    pub seed_rows: u32,
    /// Category given to seeded records.
    pub default_category: Category,
    /// Number of games that can be recorded per match.
    pub game_slots: u32,
    /// Image encoding loop parameters.
    pub media: MediaEncodingConfig,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        game_slots = app_config.game_slots,
                        media_budget = app_config.media.budget,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    sheets: SheetLayout,
    seed_rows: u32,
    default_category: Category,
    game_slots: u32,
    media: MediaEncodingConfig,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            sheets: SheetLayout::default(),
            seed_rows: 100,
            default_category: Category::U12,
            game_slots: 15,
            media: MediaEncodingConfig::default(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            sheets: value.sheets,
            seed_rows: value.seed_rows,
            default_category: value.default_category,
            game_slots: value.game_slots.max(1),
            media: value.media.sanitized(),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Error raised when the shared login secrets are not configured.
#[derive(Debug, Error)]
#[error("missing login environment variable `{var}`")]
pub struct MissingCredential {
    /// Name of the missing variable.
    pub var: &'static str,
}

/// The single shared login accepted by the service.
#[derive(Clone)]
pub struct Credentials {
    login_id: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login_id", &self.login_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Login accepted by the service.
    pub fn new(login_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login_id: login_id.into(),
            password: password.into(),
        }
    }

    /// Read the secrets from `MATCHBOOK_LOGIN_ID` and `MATCHBOOK_LOGIN_PASS`.
    pub fn from_env() -> Result<Self, MissingCredential> {
        let login_id = env::var(LOGIN_ID_ENV).map_err(|_| MissingCredential { var: LOGIN_ID_ENV })?;
        let password =
            env::var(LOGIN_PASS_ENV).map_err(|_| MissingCredential { var: LOGIN_PASS_ENV })?;
        Ok(Self::new(login_id, password))
    }

    /// Compare submitted values with the configured ones.
    pub fn matches(&self, login_id: &str, password: &str) -> bool {
        self.login_id == login_id && self.password == password
    }
}
