use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub scoring: Scoring,
    pub batch: Batch,
}

/// Hot-score algorithm parameters. Every calculator takes this by reference;
/// there is no process-wide default, so tests can run several configs side
/// by side without leakage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoring {
    pub time_decay: TimeDecay,
    pub freshness: Freshness,
    pub urgency: Urgency,
    pub signals: SignalWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeDecay {
    pub gravity: f64,
    pub base_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Freshness {
    pub multiplier: f64,
    pub window_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Urgency {
    pub bounty_hours: i64,
    pub grant_deadline_days: i64,
    pub fundraise_deadline_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalWeights {
    pub altmetric: SignalWeight,
    pub bounty: SignalWeight,
    pub tip: SignalWeight,
    pub peer_review: SignalWeight,
    pub upvote: SignalWeight,
    pub comment: SignalWeight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalWeight {
    pub weight: f64,
    pub log_base: f64,
    /// Extra factor applied when the signal carries an urgency flag.
    /// Only the bounty signal sets this above 1.0 in practice.
    #[serde(default = "default_urgency_multiplier")]
    pub urgency_multiplier: f64,
}

fn default_urgency_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub workers: usize,
    pub interval_secs: u64,
    pub days_back: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scoring: Scoring {
                time_decay: TimeDecay {
                    gravity: 1.5,
                    base_hours: 6.0,
                },
                freshness: Freshness {
                    multiplier: 4.5,
                    window_hours: 48.0,
                },
                urgency: Urgency {
                    bounty_hours: 48,
                    grant_deadline_days: 7,
                    fundraise_deadline_days: 7,
                },
                signals: SignalWeights {
                    altmetric: SignalWeight::new(2.0),
                    bounty: SignalWeight {
                        weight: 15.0,
                        log_base: std::f64::consts::E,
                        urgency_multiplier: 1.5,
                    },
                    tip: SignalWeight::new(8.0),
                    peer_review: SignalWeight::new(12.0),
                    upvote: SignalWeight::new(10.0),
                    comment: SignalWeight::new(5.0),
                },
            },
            batch: Batch {
                workers: 4,
                interval_secs: 900,
                days_back: 30,
            },
        }
    }
}

impl SignalWeight {
    fn new(weight: f64) -> Self {
        Self {
            weight,
            log_base: std::f64::consts::E,
            urgency_multiplier: 1.0,
        }
    }
}

impl Settings {
    /// Load `settings.default.ron`, then `settings.ron` on top if present.
    /// Both files are optional; the built-in defaults are the base. Invalid
    /// parameter combinations fail here, never during scoring.
    pub fn load() -> Result<Settings, ConfigError> {
        let mut settings = Settings::default();

        for path in ["settings.default.ron", "settings.ron"] {
            let path = Path::new(path);
            if path.exists() {
                settings = Self::load_from(path)?;
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Settings = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        if self.batch.workers == 0 {
            return Err(ConfigError::Invalid(
                "batch.workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Scoring {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_decay.gravity < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "time_decay.gravity must be >= 0, got {}",
                self.time_decay.gravity
            )));
        }
        if self.time_decay.base_hours <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "time_decay.base_hours must be > 0, got {}",
                self.time_decay.base_hours
            )));
        }
        if self.freshness.multiplier <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "freshness.multiplier must be > 0, got {}",
                self.freshness.multiplier
            )));
        }
        if self.freshness.window_hours < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "freshness.window_hours must be >= 0, got {}",
                self.freshness.window_hours
            )));
        }
        for (name, signal) in self.signals.iter() {
            if signal.log_base <= 1.0 {
                return Err(ConfigError::Invalid(format!(
                    "signals.{name}.log_base must be > 1, got {}",
                    signal.log_base
                )));
            }
            if signal.weight < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "signals.{name}.weight must be >= 0, got {}",
                    signal.weight
                )));
            }
            if signal.urgency_multiplier <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "signals.{name}.urgency_multiplier must be > 0, got {}",
                    signal.urgency_multiplier
                )));
            }
        }
        Ok(())
    }
}

impl SignalWeights {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &SignalWeight)> {
        [
            ("altmetric", &self.altmetric),
            ("bounty", &self.bounty),
            ("tip", &self.tip),
            ("peer_review", &self.peer_review),
            ("upvote", &self.upvote),
            ("comment", &self.comment),
        ]
        .into_iter()
    }
}
