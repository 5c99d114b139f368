// src/config.rs

use std::env;

use dotenvy::dotenv;

use crate::engine::rules::RuleConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    /// Completions-per-week needed for the WeekWarrior achievement.
    pub weekly_quiz_target: u32,
    /// A completion within this many days of release counts as "early".
    pub early_completion_days: i64,
    /// Upper bound on the quiz fetch when starting an attempt.
    pub quiz_load_timeout_secs: u64,
    /// Applied when a quiz row carries no explicit time limit.
    pub default_time_limit_secs: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let weekly_quiz_target = env::var("WEEKLY_QUIZ_TARGET")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let early_completion_days = env::var("EARLY_COMPLETION_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2);

        let quiz_load_timeout_secs = env::var("QUIZ_LOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let default_time_limit_secs = env::var("DEFAULT_TIME_LIMIT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(600);

        Self {
            database_url,
            rust_log,
            weekly_quiz_target,
            early_completion_days,
            quiz_load_timeout_secs,
            default_time_limit_secs,
        }
    }

    pub fn rule_config(&self) -> RuleConfig {
        RuleConfig {
            weekly_quiz_target: self.weekly_quiz_target,
        }
    }
}
