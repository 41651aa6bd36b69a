use crate::domain::sorting::AvailableSortKey;
use crate::domain::time_grid::{DEFAULT_SLOT_PIXEL_HEIGHT, TimeGrid, TimeSlot};
use crate::infrastructure::error::PlannerError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const PLANNER_JSON: &str = "planner.json";
const SUPPORTED_SCHEMA: u64 = 1;
const DEFAULT_USER_ID: &str = "default";

const ENV_REST_URL: [&str; 2] = ["DAYPLAN_REST_URL", "SUPABASE_URL"];
const ENV_API_KEY: [&str; 2] = ["DAYPLAN_API_KEY", "SUPABASE_ANON_KEY"];
const ENV_ACCESS_TOKEN: [&str; 1] = ["DAYPLAN_ACCESS_TOKEN"];

/// Which adapter pair a session is opened against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlannerConfig {
    pub schema: u8,
    pub user_id: String,
    pub day_start: TimeSlot,
    pub day_end: TimeSlot,
    pub slot_pixel_height: f64,
    pub default_sort: AvailableSortKey,
    #[serde(default)]
    pub backend: BackendKind,
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.user_id.trim().is_empty() {
            return Err(PlannerError::InvalidConfig(
                "planner.userId must not be empty".to_string(),
            ));
        }
        self.time_grid().map(|_| ())
    }

    pub fn time_grid(&self) -> Result<TimeGrid, PlannerError> {
        TimeGrid::new(self.day_start, self.day_end, self.slot_pixel_height)
            .map_err(|error| PlannerError::InvalidConfig(format!("planner grid: {error}")))
    }
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([(
        PLANNER_JSON,
        serde_json::json!({
            "schema": 1,
            "userId": DEFAULT_USER_ID,
            "dayStart": "00:00",
            "dayEnd": "23:45",
            "slotPixelHeight": DEFAULT_SLOT_PIXEL_HEIGHT,
            "defaultSort": "order",
            "backend": "sqlite"
        }),
    )])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), PlannerError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, PlannerError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| {
            PlannerError::InvalidConfig(format!("missing schema in {}", path.display()))
        })?;
    if schema != SUPPORTED_SCHEMA {
        return Err(PlannerError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_planner_config(config_dir: &Path) -> Result<PlannerConfig, PlannerError> {
    let path = config_dir.join(PLANNER_JSON);
    let value = read_config(&path)?;
    let config: PlannerConfig = serde_json::from_value(value).map_err(|error| {
        PlannerError::InvalidConfig(format!("invalid {}: {error}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

pub fn save_planner_config(config_dir: &Path, config: &PlannerConfig) -> Result<(), PlannerError> {
    config.validate()?;
    let formatted = serde_json::to_string_pretty(config)?;
    fs::write(config_dir.join(PLANNER_JSON), format!("{formatted}\n"))?;
    Ok(())
}

/// Connection settings for a PostgREST-style backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestBackendConfig {
    pub base_url: String,
    pub api_key: String,
    pub access_token: Option<String>,
}

pub fn load_rest_config_from_env() -> Result<RestBackendConfig, PlannerError> {
    load_rest_config_from_lookup(|key| std::env::var(key).ok())
}

pub fn load_rest_config_from_lookup<F>(lookup: F) -> Result<RestBackendConfig, PlannerError>
where
    F: Fn(&str) -> Option<String>,
{
    let base_url = required_lookup_value(&lookup, &ENV_REST_URL, "backend url")?;
    let api_key = required_lookup_value(&lookup, &ENV_API_KEY, "backend api key")?;
    let access_token = optional_lookup_value(&lookup, &ENV_ACCESS_TOKEN);
    Ok(RestBackendConfig {
        base_url,
        api_key,
        access_token,
    })
}

fn required_lookup_value<F>(
    lookup: &F,
    keys: &[&str],
    field_name: &str,
) -> Result<String, PlannerError>
where
    F: Fn(&str) -> Option<String>,
{
    optional_lookup_value(lookup, keys).ok_or_else(|| {
        PlannerError::InvalidConfig(format!(
            "missing {} (set one of: {})",
            field_name,
            keys.join(", ")
        ))
    })
}

fn optional_lookup_value<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    for key in keys {
        if let Some(value) = lookup(key) {
            let normalized = value.trim();
            if !normalized.is_empty() {
                return Some(normalized.to_string());
            }
        }
    }
    None
}
