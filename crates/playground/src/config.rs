//! Playground configuration

use config::{Config, Environment, File};
use joint_mapper::MapperConfig;
use pose_capture::CaptureConfig;
use robot_model::ModelConfig;
use serde::{Deserialize, Serialize};
use session_recorder::RecorderConfig;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::PlaygroundError;

/// Environment variable prefix (`PLAYGROUND__MODEL__ROBOT_ID=trial`)
pub const ENV_PREFIX: &str = "PLAYGROUND";

/// Named starting point for a configuration, before file and env overrides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Standard,
    /// Upper body only
    Seated,
    /// Drop jitter and poorly tracked landmarks
    Steady,
    /// Larger frames at a lower rate, for slow detectors
    Detailed,
}

impl Profile {
    pub const ALL: [Profile; 4] = [Self::Standard, Self::Seated, Self::Steady, Self::Detailed];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Seated => "seated",
            Self::Steady => "steady",
            Self::Detailed => "detailed",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(Profile::name).collect();
                format!("unknown profile '{}', expected one of {}", s, names.join(", "))
            })
    }
}

/// Complete playground configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    pub capture: CaptureConfig,
    pub mapper: MapperConfig,
    pub model: ModelConfig,
    pub recorder: RecorderConfig,
    /// Max log level for binaries (`trace`..`error`)
    pub log_level: String,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            mapper: MapperConfig::default(),
            model: ModelConfig::default(),
            recorder: RecorderConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl PlaygroundConfig {
    /// Defaults, then an optional TOML file, then `PLAYGROUND__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self, PlaygroundError> {
        Self::load_profile(Profile::Standard, path)
    }

    /// Like [`load`](Self::load), starting from `profile` instead of the defaults
    pub fn load_profile(profile: Profile, path: Option<&Path>) -> Result<Self, PlaygroundError> {
        let defaults = Config::try_from(&Self::from_profile(profile)).map_err(config_error)?;
        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error)
    }

    pub fn from_profile(profile: Profile) -> Self {
        match profile {
            Profile::Standard => Self::default(),
            Profile::Seated => Self::seated(),
            Profile::Steady => Self {
                mapper: MapperConfig::steady(),
                ..Default::default()
            },
            Profile::Detailed => Self {
                capture: CaptureConfig::detailed(),
                ..Default::default()
            },
        }
    }

    /// Upper-body tracking only (seated use)
    pub fn seated() -> Self {
        Self {
            mapper: MapperConfig::upper_body(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), PlaygroundError> {
        self.mapper.validate()?;
        self.model.validate()?;
        Ok(())
    }
}

fn config_error(e: config::ConfigError) -> PlaygroundError {
    PlaygroundError::Config(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_without_file() {
        let config = PlaygroundConfig::load(None).unwrap();
        assert_eq!(config.capture.throttle_ms, 16);
        assert_eq!(config.recorder.sample_period_ms, 33);
        assert_eq!(config.model.robot_id, "hexapod_robot");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_optional() {
        let config = PlaygroundConfig::load(Some(Path::new("/nonexistent/playground.toml"))).unwrap();
        assert!(config.mapper.enable_legs);
    }

    #[test]
    fn test_profiles_pick_presets() {
        let seated = PlaygroundConfig::from_profile(Profile::Seated);
        assert!(!seated.mapper.enable_legs);

        let steady = PlaygroundConfig::from_profile(Profile::Steady);
        assert_eq!(steady.mapper.min_visibility, 0.5);
        assert!(steady.mapper.enable_legs);

        let detailed = PlaygroundConfig::load_profile(Profile::Detailed, None).unwrap();
        assert_eq!((detailed.capture.width, detailed.capture.height), (640, 480));
        assert_eq!(detailed.capture.throttle_ms, 33);
        assert_eq!(detailed.recorder.sample_period_ms, 33);
    }

    #[test]
    fn test_profile_names() {
        assert_eq!("Seated".parse::<Profile>(), Ok(Profile::Seated));
        for profile in Profile::ALL {
            assert_eq!(profile.to_string().parse::<Profile>(), Ok(profile));
        }
        let err = "lying".parse::<Profile>().unwrap_err();
        assert!(err.contains("standard, seated, steady, detailed"));
    }
}
