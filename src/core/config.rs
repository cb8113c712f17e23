use super::DomainError;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Default radius of the high-pass mask in index units
pub const DEFAULT_CUTOFF: f64 = 0.005;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("can't read config file {0}")]
    Read(String, #[source] std::io::Error),

    #[error("malformed config")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] DomainError),
}

/// Neighbourhood used to find local maxima and to erode the background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Direct neighbours only (cross-shaped)
    Four,
    /// Direct and diagonal neighbours (full 3x3 square)
    #[default]
    Eight,
}

impl Connectivity {
    /// Offsets of the neighbourhood, center included
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &[(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)],
            Connectivity::Eight => &[
                (-1, -1), (-1, 0), (-1, 1),
                (0, -1), (0, 0), (0, 1),
                (1, -1), (1, 0), (1, 1),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeakConfig {
    pub cutoff: f64,
    pub connectivity: Connectivity,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            connectivity: Connectivity::Eight,
        }
    }
}

impl PeakConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.cutoff.is_finite() || self.cutoff < 0.0 {
            return Err(DomainError::Cutoff(self.cutoff));
        }
        Ok(())
    }
}

/// Settings of a whole analysis run, usually read from a TOML file.
///
/// ```toml
/// log_every = 50
/// max_frames = 0
///
/// [peaks]
/// cutoff = 0.01
/// connectivity = "four"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Progress is logged every that many covariance windows
    pub log_every: usize,
    /// Maximal number of covariance matrices to keep for export, 0 for all
    pub max_frames: usize,
    pub peaks: PeakConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            log_every: 100,
            max_frames: 100,
            peaks: PeakConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(fname: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(fname.as_ref())
            .map_err(|e| ConfigError::Read(fname.as_ref().display().to_string(), e))?;
        Self::from_toml(&s)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.peaks.validate()
    }
}
