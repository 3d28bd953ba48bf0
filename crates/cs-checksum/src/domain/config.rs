//! Checksum engine configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use cs_checksum::domain::ChecksumConfig;
//!
//! let config = ChecksumConfig::default()
//!     .with_max_bytes_per_cycle(4096)
//!     .with_preserve_states(false);
//! config.validate()?;
//! ```

use super::name::NameLimits;
use super::resource_state::ResourceStates;
use super::types::TableResource;
use crate::error::{CsError, CsResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Fixed capacities of the four definition/results tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCapacities {
    pub eeprom: usize,
    pub memory: usize,
    pub tables: usize,
    pub apps: usize,
}

impl Default for TableCapacities {
    fn default() -> Self {
        Self {
            eeprom: 16,
            memory: 16,
            tables: 24,
            apps: 24,
        }
    }
}

impl TableCapacities {
    pub fn get(&self, resource: TableResource) -> usize {
        match resource {
            TableResource::Eeprom => self.eeprom,
            TableResource::Memory => self.memory,
            TableResource::Tables => self.tables,
            TableResource::Apps => self.apps,
        }
    }
}

/// Definition table files tried before the built-in defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionFiles {
    pub eeprom: PathBuf,
    pub memory: PathBuf,
    pub tables: PathBuf,
    pub apps: PathBuf,
}

impl Default for DefinitionFiles {
    fn default() -> Self {
        Self {
            eeprom: PathBuf::from("/cf/cs_eepromtbl.tbl"),
            memory: PathBuf::from("/cf/cs_memorytbl.tbl"),
            tables: PathBuf::from("/cf/cs_tablestbl.tbl"),
            apps: PathBuf::from("/cf/cs_apptbl.tbl"),
        }
    }
}

impl DefinitionFiles {
    pub fn get(&self, resource: TableResource) -> &PathBuf {
        match resource {
            TableResource::Eeprom => &self.eeprom,
            TableResource::Memory => &self.memory,
            TableResource::Tables => &self.tables,
            TableResource::Apps => &self.apps,
        }
    }

    /// All four files under `dir`, keeping the default file names.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            eeprom: dir.join("cs_eepromtbl.tbl"),
            memory: dir.join("cs_memorytbl.tbl"),
            tables: dir.join("cs_tablestbl.tbl"),
            apps: dir.join("cs_apptbl.tbl"),
        }
    }
}

/// Checksum engine configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksumConfig {
    /// Background budget per wakeup cycle, in bytes
    pub max_bytes_per_cycle: usize,
    /// Pause between chunks inside a child task, in milliseconds
    pub child_task_delay_ms: u64,
    /// Save and restore resource states across a processor reset
    pub preserve_states_on_processor_reset: bool,
    pub capacities: TableCapacities,
    /// Resource states applied at every boot before any restore
    pub power_on_states: ResourceStates,
    /// Own application name used for table ownership resolution
    pub app_name: String,
    pub name_limits: NameLimits,
    pub definition_files: DefinitionFiles,
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self {
            max_bytes_per_cycle: 16 * 1024,
            child_task_delay_ms: 0,
            preserve_states_on_processor_reset: true,
            capacities: TableCapacities::default(),
            power_on_states: ResourceStates::default(),
            app_name: "CS".to_string(),
            name_limits: NameLimits::default(),
            definition_files: DefinitionFiles::default(),
        }
    }
}

impl ChecksumConfig {
    /// Defaults overlaid with `CS_MAX_BYTES_PER_CYCLE`,
    /// `CS_CHILD_TASK_DELAY_MS` and `CS_PRESERVE_STATES`.
    pub fn from_env() -> CsResult<Self> {
        let mut config = Self::default();
        if let Some(bytes) = env_number("CS_MAX_BYTES_PER_CYCLE")? {
            config.max_bytes_per_cycle = bytes as usize;
        }
        if let Some(delay) = env_number("CS_CHILD_TASK_DELAY_MS")? {
            config.child_task_delay_ms = delay;
        }
        if let Ok(raw) = std::env::var("CS_PRESERVE_STATES") {
            config.preserve_states_on_processor_reset = parse_flag(&raw)
                .ok_or_else(|| CsError::Config(format!("CS_PRESERVE_STATES={raw}")))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CsResult<()> {
        if self.max_bytes_per_cycle == 0 {
            return Err(CsError::Config(
                "max_bytes_per_cycle cannot be 0".to_string(),
            ));
        }
        for resource in TableResource::ALL {
            if self.capacities.get(resource) == 0 {
                return Err(CsError::Config(format!(
                    "{resource} table capacity cannot be 0"
                )));
            }
        }
        if self.app_name.is_empty() {
            return Err(CsError::Config("app_name cannot be empty".to_string()));
        }
        if self.app_name.chars().count() >= self.name_limits.max_app_name_len {
            return Err(CsError::Config(format!(
                "app_name exceeds {} characters",
                self.name_limits.max_app_name_len
            )));
        }
        Ok(())
    }

    pub fn child_task_delay(&self) -> Duration {
        Duration::from_millis(self.child_task_delay_ms)
    }

    pub fn with_max_bytes_per_cycle(mut self, bytes: usize) -> Self {
        self.max_bytes_per_cycle = bytes;
        self
    }

    pub fn with_child_task_delay(mut self, delay: Duration) -> Self {
        self.child_task_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_preserve_states(mut self, preserve: bool) -> Self {
        self.preserve_states_on_processor_reset = preserve;
        self
    }

    pub fn with_capacities(mut self, capacities: TableCapacities) -> Self {
        self.capacities = capacities;
        self
    }

    pub fn with_power_on_states(mut self, states: ResourceStates) -> Self {
        self.power_on_states = states;
        self
    }

    pub fn with_definition_files(mut self, files: DefinitionFiles) -> Self {
        self.definition_files = files;
        self
    }
}

fn env_number(key: &str) -> CsResult<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CsError::Config(format!("{key}={raw} is not a number"))),
        Err(_) => Ok(None),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ChecksumConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_bytes_per_cycle, 16384);
        assert_eq!(config.capacities.get(TableResource::Apps), 24);
        assert_eq!(config.child_task_delay(), Duration::ZERO);
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = ChecksumConfig::default().with_max_bytes_per_cycle(0);
        assert!(matches!(config.validate(), Err(CsError::Config(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = ChecksumConfig::default().with_capacities(TableCapacities {
            memory: 0,
            ..TableCapacities::default()
        });
        assert!(matches!(config.validate(), Err(CsError::Config(_))));
    }

    #[test]
    fn test_overlong_app_name_rejected() {
        let config = ChecksumConfig {
            app_name: "A".repeat(20),
            ..ChecksumConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_definition_files_in_dir() {
        let files = DefinitionFiles::in_dir("/tmp/cs");
        assert_eq!(
            files.get(TableResource::Tables),
            &PathBuf::from("/tmp/cs/cs_tablestbl.tbl")
        );
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ChecksumConfig =
            serde_json::from_str(r#"{"max_bytes_per_cycle": 512}"#).unwrap();
        assert_eq!(config.max_bytes_per_cycle, 512);
        assert_eq!(config.app_name, "CS");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
