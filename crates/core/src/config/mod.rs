use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{AnimError, Ease, Point, RendererKind, Result, Settings};

/// Top-level configuration structure, usually read from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimConfig {
    pub defaults: SettingsConfig,
    /// Frames per second used by the interpolating renderer.
    pub frame_rate: u32,
}

impl Default for AnimConfig {
    fn default() -> Self {
        Self {
            defaults: SettingsConfig::default(),
            frame_rate: 60,
        }
    }
}

impl AnimConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        if config.frame_rate == 0 {
            return Err(AnimError::invalid("frame_rate", "must be at least 1"));
        }
        Ok(config)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }
}

/// Serializable form of [`Settings`]. Times are in seconds.
///
/// The completion block has no serialized form; settings built from a config
/// never carry one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    pub delay: f64,
    pub duration: f64,
    pub ease: EaseSpec,
    pub user_interaction: bool,
    pub renderer: RendererKind,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        let settings = Settings::default();
        Self::from_settings(&settings)
    }
}

impl SettingsConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let ease = match settings.ease.preset_name() {
            Some(name) => EaseSpec::Named(name.to_string()),
            None => EaseSpec::Points {
                p1: settings.ease.p1(),
                p2: settings.ease.p2(),
            },
        };
        Self {
            delay: settings.delay.as_secs_f64(),
            duration: settings.duration.as_secs_f64(),
            ease,
            user_interaction: settings.user_interaction,
            renderer: settings.renderer,
        }
    }

    /// Validates the values and builds runtime settings.
    pub fn to_settings(&self) -> Result<Settings> {
        Ok(Settings {
            delay: seconds("delay", self.delay)?,
            duration: seconds("duration", self.duration)?,
            ease: self.ease.resolve()?,
            completion: None,
            user_interaction: self.user_interaction,
            renderer: self.renderer,
        })
    }
}

/// Easing curve as written in a config file: a preset name or two handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EaseSpec {
    Named(String),
    Points { p1: Point, p2: Point },
}

impl EaseSpec {
    pub fn resolve(&self) -> Result<Ease> {
        match self {
            Self::Named(name) => name.parse(),
            Self::Points { p1, p2 } => {
                if [p1.x, p1.y, p2.x, p2.y].iter().any(|v| !v.is_finite()) {
                    return Err(AnimError::invalid("ease", "control points must be finite"));
                }
                if !(0.0..=1.0).contains(&p1.x) || !(0.0..=1.0).contains(&p2.x) {
                    return Err(AnimError::invalid(
                        "ease",
                        "control point x values must lie in [0, 1]",
                    ));
                }
                Ok(Ease::custom(*p1, *p2))
            }
        }
    }
}

fn seconds(field: &'static str, value: f64) -> Result<Duration> {
    if !value.is_finite() || value < 0.0 {
        return Err(AnimError::invalid(
            field,
            format!("expected a non-negative number of seconds, got {value}"),
        ));
    }
    Duration::try_from_secs_f64(value).map_err(|err| AnimError::invalid(field, err.to_string()))
}
