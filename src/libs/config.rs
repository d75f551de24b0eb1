//! Configuration management for breakwatch.
//!
//! Settings are stored as pretty-printed JSON (`config.json`) in the
//! platform data directory resolved by [`DataStorage`]. Every section is
//! optional; a missing section, or a missing field inside one, falls back
//! to its `Default`.
//!
//! ## Sections
//!
//! - **Tracking**: policy for users without a schedule, fallback limits,
//!   over-limit grace and which start-time checks run
//! - **Database**: SQLite busy timeout and journal mode
//! - **Notifications**: default cooldown between repeated notifications
//!
//! ## Usage
//!
//! ```rust,no_run
//! use breakwatch::libs::config::Config;
//!
//! let config = Config::read()?;
//! let tracking = config.tracking_or_default();
//! println!("{:?}", tracking.unassigned_policy);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Select};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Break type used by the fallback limits for short breaks.
pub const DEFAULT_BREAK_TYPE: &str = "Break";
/// Break type used by the fallback limits for the lunch break.
pub const DEFAULT_LUNCH_TYPE: &str = "Lunch";

/// What happens when a user without an assigned schedule starts a break.
///
/// The source system let such breaks through and flagged them; whether that
/// is the intended business rule was never settled, so it is a setting.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedPolicy {
    /// Refuse the break.
    Deny,
    /// Allow the break with fallback limits and log a `NO_SCHEDULE` violation.
    #[default]
    AllowAndFlag,
    /// Allow the break with fallback limits, log nothing.
    AllowWithDefaults,
}

impl UnassignedPolicy {
    pub const ALL: [UnassignedPolicy; 3] = [Self::Deny, Self::AllowAndFlag, Self::AllowWithDefaults];
}

impl fmt::Display for UnassignedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deny => "deny",
            Self::AllowAndFlag => "allow_and_flag",
            Self::AllowWithDefaults => "allow_with_defaults",
        };
        write!(f, "{}", name)
    }
}

/// Limit applied to users without a schedule when the policy allows breaks.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DefaultLimit {
    pub break_type: String,
    pub duration_minutes: i64,
    pub daily_count: i64,
}

/// Break policy settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TrackingConfig {
    pub unassigned_policy: UnassignedPolicy,

    /// Fallback limits used when no schedule is assigned.
    pub default_limits: Vec<DefaultLimit>,

    /// Minutes a break may run over its limit before it is flagged.
    ///
    /// With the default of 0 any break longer than its limit is a violation.
    pub over_limit_grace_minutes: i64,

    /// Log `QUOTA_EXCEEDED` when a break starts after the daily count is used up.
    pub check_daily_quota: bool,

    /// Log `OUT_OF_WINDOW` when a break starts outside every window of its type.
    pub check_windows: bool,
}

/// SQLite connection tuning.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub busy_timeout_ms: u64,
    pub wal: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NotificationConfig {
    /// Minimum seconds between two notifications of the same rule and context.
    pub cooldown_secs: i64,
}

/// Root configuration object.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationConfig>,
}

impl Default for TrackingConfig {
    /// Three 15-minute breaks and one 60-minute lunch, no grace.
    fn default() -> Self {
        TrackingConfig {
            unassigned_policy: UnassignedPolicy::default(),
            default_limits: vec![
                DefaultLimit {
                    break_type: DEFAULT_BREAK_TYPE.to_string(),
                    duration_minutes: 15,
                    daily_count: 3,
                },
                DefaultLimit {
                    break_type: DEFAULT_LUNCH_TYPE.to_string(),
                    duration_minutes: 60,
                    daily_count: 1,
                },
            ],
            over_limit_grace_minutes: 0,
            check_daily_quota: true,
            check_windows: true,
        }
    }
}

impl TrackingConfig {
    /// Fallback limit for a break type, matched case-insensitively.
    pub fn default_limit(&self, break_type: &str) -> Option<&DefaultLimit> {
        let wanted = break_type.trim().to_lowercase();
        self.default_limits.iter().find(|l| l.break_type.to_lowercase() == wanted)
    }

    /// Replaces the fallback limit of the same type, or appends a new one.
    ///
    /// Limits for other break types are left untouched.
    pub fn set_default_limit(&mut self, limit: DefaultLimit) {
        let wanted = limit.break_type.trim().to_lowercase();
        match self.default_limits.iter_mut().find(|l| l.break_type.to_lowercase() == wanted) {
            Some(existing) => {
                existing.duration_minutes = limit.duration_minutes;
                existing.daily_count = limit.daily_count;
            }
            None => self.default_limits.push(limit),
        }
    }

    /// Every fallback limit needs a positive length and count; grace may not be negative.
    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self
            .default_limits
            .iter()
            .find(|l| l.duration_minutes <= 0 || l.daily_count <= 0)
        {
            anyhow::bail!("{}", Message::InvalidDefaultLimit(bad.break_type.clone()));
        }
        if self.over_limit_grace_minutes < 0 {
            anyhow::bail!("{}", Message::ValueMustBePositive);
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            busy_timeout_ms: 5000,
            wal: true,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig { cooldown_secs: 600 }
    }
}

impl Config {
    /// Loads the configuration file, or the default configuration when none exists.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;

        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(tracking) = &self.tracking {
            tracking.validate()?;
        }
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Removes the configuration file if present.
    pub fn delete() -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if config_file_path.exists() {
            fs::remove_file(config_file_path)?;
        }
        Ok(())
    }

    pub fn tracking_or_default(&self) -> TrackingConfig {
        self.tracking.clone().unwrap_or_default()
    }

    pub fn database_or_default(&self) -> DatabaseConfig {
        self.database.clone().unwrap_or_default()
    }

    pub fn notifications_or_default(&self) -> NotificationConfig {
        self.notifications.clone().unwrap_or_default()
    }

    /// Interactive setup wizard; existing values are offered as defaults.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let sections = [
            Message::ConfigModuleTracking.to_string(),
            Message::ConfigModuleDatabase.to_string(),
            Message::ConfigModuleNotifications.to_string(),
        ];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&sections)
            .interact()?;

        for &selection in &selected {
            match selection {
                0 => config.tracking = Some(Self::init_tracking(config.tracking_or_default())?),
                1 => {
                    let default = config.database_or_default();
                    msg_print!(Message::ConfigModuleDatabase);
                    config.database = Some(DatabaseConfig {
                        busy_timeout_ms: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptBusyTimeout.to_string())
                            .default(default.busy_timeout_ms)
                            .interact_text()?,
                        wal: Confirm::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptEnableWal.to_string())
                            .default(default.wal)
                            .interact()?,
                    });
                }
                2 => {
                    let default = config.notifications_or_default();
                    msg_print!(Message::ConfigModuleNotifications);
                    config.notifications = Some(NotificationConfig {
                        cooldown_secs: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptNotificationCooldown.to_string())
                            .default(default.cooldown_secs)
                            .interact_text()?,
                    });
                }
                _ => {}
            }
        }

        Ok(config)
    }

    fn init_tracking(default: TrackingConfig) -> Result<TrackingConfig> {
        msg_print!(Message::ConfigModuleTracking);

        let policies: Vec<String> = UnassignedPolicy::ALL.iter().map(|p| p.to_string()).collect();
        let current = UnassignedPolicy::ALL.iter().position(|p| *p == default.unassigned_policy).unwrap_or(1);
        let policy_index = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptUnassignedPolicy.to_string())
            .items(&policies)
            .default(current)
            .interact()?;

        let break_default = default.default_limit(DEFAULT_BREAK_TYPE).cloned().unwrap_or(DefaultLimit {
            break_type: DEFAULT_BREAK_TYPE.to_string(),
            duration_minutes: 15,
            daily_count: 3,
        });
        let lunch_default = default.default_limit(DEFAULT_LUNCH_TYPE).cloned().unwrap_or(DefaultLimit {
            break_type: DEFAULT_LUNCH_TYPE.to_string(),
            duration_minutes: 60,
            daily_count: 1,
        });

        let break_limit = DefaultLimit {
            duration_minutes: Self::positive_input(Message::PromptDefaultBreakMinutes, break_default.duration_minutes)?,
            daily_count: Self::positive_input(Message::PromptDefaultBreakCount, break_default.daily_count)?,
            break_type: break_default.break_type,
        };
        let lunch_limit = DefaultLimit {
            duration_minutes: Self::positive_input(Message::PromptDefaultLunchMinutes, lunch_default.duration_minutes)?,
            daily_count: Self::positive_input(Message::PromptDefaultLunchCount, lunch_default.daily_count)?,
            break_type: lunch_default.break_type,
        };

        let not_negative = Message::ValueMustBePositive.to_string();
        let grace: i64 = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptGraceMinutes.to_string())
            .default(default.over_limit_grace_minutes.max(0))
            .validate_with(|input: &i64| -> Result<(), &str> {
                if *input >= 0 {
                    Ok(())
                } else {
                    Err(&not_negative)
                }
            })
            .interact_text()?;

        let mut tracking = TrackingConfig {
            unassigned_policy: UnassignedPolicy::ALL[policy_index],
            over_limit_grace_minutes: grace,
            ..default
        };
        tracking.set_default_limit(break_limit);
        tracking.set_default_limit(lunch_limit);
        Ok(tracking)
    }

    fn positive_input(prompt: Message, default: i64) -> Result<i64> {
        let must_be_positive = Message::ValueMustBePositive.to_string();
        let value = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt.to_string())
            .default(default.max(1))
            .validate_with(|input: &i64| -> Result<(), &str> {
                if *input > 0 {
                    Ok(())
                } else {
                    Err(&must_be_positive)
                }
            })
            .interact_text()?;
        Ok(value)
    }
}
