use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::leave::validator::HolidayPolicy;
use crate::leave::workflow::LeaveSettings;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_level: tracing::Level,

    // Leave rules
    pub holiday_policy: HolidayPolicy,
    pub fallback_approver_id: Option<u64>,
    pub policy_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: parse_or("ACCESS_TOKEN_TTL", env::var("ACCESS_TOKEN_TTL").ok(), 900)?, // 15 min

            rate_login_per_min: parse_or("RATE_LOGIN_PER_MIN", env::var("RATE_LOGIN_PER_MIN").ok(), 60)?,
            rate_protected_per_min: parse_or(
                "RATE_PROTECTED_PER_MIN",
                env::var("RATE_PROTECTED_PER_MIN").ok(),
                1000,
            )?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_level: parse_or("LOG_LEVEL", env::var("LOG_LEVEL").ok(), tracing::Level::DEBUG)?,

            holiday_policy: parse_or(
                "HOLIDAY_POLICY",
                env::var("HOLIDAY_POLICY").ok(),
                HolidayPolicy::Block,
            )?,
            fallback_approver_id: env::var("FALLBACK_APPROVER_ID")
                .ok()
                .map(|raw| parse_or("FALLBACK_APPROVER_ID", Some(raw), 0))
                .transpose()?,
            policy_cache_ttl: Duration::from_secs(parse_or(
                "POLICY_CACHE_TTL_SECS",
                env::var("POLICY_CACHE_TTL_SECS").ok(),
                300,
            )?),
        })
    }

    pub fn leave_settings(&self) -> LeaveSettings {
        LeaveSettings {
            holiday_policy: self.holiday_policy,
            fallback_approver_id: self.fallback_approver_id,
        }
    }
}

/// Parses `raw` when present, otherwise yields `default`.
fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{value}': {e}")),
        None => Ok(default),
    }
}
