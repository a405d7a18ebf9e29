//! Chain configuration: TOML-based, platform-aware paths.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bus::mock::MOCK_REGISTER_COUNT;
use crate::chain::ChainLayout;
use crate::protocol::REGISTER_BLOCK_LEN;

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# daisyled configuration. Changes made outside the tool may be overwritten.\n\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bus address the chain answers on. Default: 8.
    #[serde(default = "default_bus_address")]
    pub bus_address: u8,

    /// Register base applied to every unit. Default: 0.
    #[serde(default)]
    pub register_base: u16,

    /// Number of units the simulated bus reports. Default: 1.
    #[serde(default = "default_chain_length")]
    pub chain_length: u32,

    /// Chain positions (0-based) with green and blue swapped.
    #[serde(default)]
    pub swapped_units: Vec<u32>,

    /// Interval for blink/fade commands given without a duration. Default: 1000.
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: u64,

    /// Color for commands given without one (hex or name). Default: "#FFFFFF".
    #[serde(default = "default_color")]
    pub default_color: String,
}

fn default_bus_address() -> u8 {
    8
}
fn default_chain_length() -> u32 {
    1
}
fn default_duration_ms() -> u64 {
    1000
}
fn default_color() -> String {
    "#FFFFFF".into()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bus_address: default_bus_address(),
            register_base: 0,
            chain_length: default_chain_length(),
            swapped_units: Vec::new(),
            default_duration_ms: default_duration_ms(),
            default_color: default_color(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// `default_color` could not be parsed.
    InvalidColor(String),
    /// `chain_length` is zero.
    EmptyChain,
    /// A `swapped_units` entry is not a position on the chain.
    SwapOutOfRange { position: u32, chain_length: u32 },
    /// `default_duration_ms` is zero.
    ZeroDuration,
    /// The register block at `register_base` does not fit the simulated register file.
    RegisterBaseOutOfRange { register_base: u16 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidColor(e) => write!(f, "Invalid default color: {e}"),
            ValidationError::EmptyChain => write!(f, "Chain length must be at least 1"),
            ValidationError::SwapOutOfRange {
                position,
                chain_length,
            } => write!(
                f,
                "Swapped unit {position} is out of range (chain has {chain_length} unit{})",
                if *chain_length == 1 { "" } else { "s" }
            ),
            ValidationError::ZeroDuration => write!(f, "Default duration must be non-zero"),
            ValidationError::RegisterBaseOutOfRange { register_base } => write!(
                f,
                "Register base {register_base} leaves no room for the {REGISTER_BLOCK_LEN}-byte block \
                 (highest is {})",
                MOCK_REGISTER_COUNT - REGISTER_BLOCK_LEN as usize
            ),
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("daisyled"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Save config to an arbitrary path atomically (write to temp file, then rename).
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems; fall back to direct write + cleanup
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    pub fn is_swapped(&self, position: u32) -> bool {
        self.swapped_units.contains(&position)
    }

    pub fn default_duration(&self) -> Duration {
        Duration::from_millis(self.default_duration_ms)
    }

    pub fn chain_layout(&self) -> ChainLayout {
        ChainLayout {
            register_base: self.register_base,
            swapped_positions: self.swapped_units.clone(),
        }
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = crate::led::parse_color(&self.default_color) {
            errors.push(ValidationError::InvalidColor(e.to_string()));
        }

        if self.chain_length == 0 {
            errors.push(ValidationError::EmptyChain);
        }

        for &position in &self.swapped_units {
            if position >= self.chain_length {
                errors.push(ValidationError::SwapOutOfRange {
                    position,
                    chain_length: self.chain_length,
                });
            }
        }

        if self.default_duration_ms == 0 {
            errors.push(ValidationError::ZeroDuration);
        }

        if self.register_base as usize + REGISTER_BLOCK_LEN as usize > MOCK_REGISTER_COUNT {
            errors.push(ValidationError::RegisterBaseOutOfRange {
                register_base: self.register_base,
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ──

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.bus_address, 8);
        assert_eq!(c.register_base, 0);
        assert_eq!(c.chain_length, 1);
        assert!(c.swapped_units.is_empty());
        assert_eq!(c.default_duration(), Duration::from_secs(1));
        assert_eq!(c.default_color, "#FFFFFF");
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let c: Config = toml::from_str("").unwrap();
        assert_eq!(c.bus_address, 8);
        assert_eq!(c.default_duration_ms, 1000);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let c: Config = toml::from_str("chain_length = 4\nswapped_units = [1, 3]\n").unwrap();
        assert_eq!(c.chain_length, 4);
        assert!(c.is_swapped(3));
        assert!(!c.is_swapped(0));
        assert_eq!(c.default_color, "#FFFFFF");
    }

    #[test]
    fn chain_layout_mirrors_config() {
        let c = Config {
            register_base: 0x20,
            swapped_units: vec![2],
            chain_length: 3,
            ..Config::default()
        };
        let layout = c.chain_layout();
        assert_eq!(layout.register_base, 0x20);
        assert!(layout.is_swapped(2));
        assert!(!layout.is_swapped(1));
    }

    // ── validate ──

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_invalid_color() {
        let c = Config {
            default_color: "chartreuse".into(),
            ..Config::default()
        };
        let errs = c.validate().unwrap_err();
        assert!(matches!(errs[0], ValidationError::InvalidColor(_)));
    }

    #[test]
    fn validate_swap_out_of_range() {
        let c = Config {
            chain_length: 2,
            swapped_units: vec![1, 2],
            ..Config::default()
        };
        assert_eq!(
            c.validate().unwrap_err(),
            vec![ValidationError::SwapOutOfRange {
                position: 2,
                chain_length: 2
            }]
        );
    }

    #[test]
    fn validate_register_base_must_fit_block() {
        let highest = Config {
            register_base: 237,
            ..Config::default()
        };
        assert!(highest.validate().is_ok());

        let c = Config {
            register_base: 240,
            ..Config::default()
        };
        assert_eq!(
            c.validate().unwrap_err(),
            vec![ValidationError::RegisterBaseOutOfRange { register_base: 240 }]
        );
        assert_eq!(
            c.validate().unwrap_err()[0].to_string(),
            "Register base 240 leaves no room for the 19-byte block (highest is 237)"
        );
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let c = Config {
            default_color: "nope".into(),
            chain_length: 0,
            default_duration_ms: 0,
            ..Config::default()
        };
        let errs = c.validate().unwrap_err();
        assert_eq!(errs.len(), 3);
        assert!(errs.contains(&ValidationError::EmptyChain));
        assert!(errs.contains(&ValidationError::ZeroDuration));
    }

    #[test]
    fn validation_error_display() {
        let e = ValidationError::SwapOutOfRange {
            position: 4,
            chain_length: 1,
        };
        assert_eq!(
            e.to_string(),
            "Swapped unit 4 is out of range (chain has 1 unit)"
        );
        assert_eq!(
            ValidationError::EmptyChain.to_string(),
            "Chain length must be at least 1"
        );
    }

    // ── save_to / load_from ──

    #[test]
    fn save_to_load_from_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            bus_address: 0x21,
            register_base: 8,
            chain_length: 3,
            swapped_units: vec![0, 2],
            default_duration_ms: 250,
            default_color: "cyan".into(),
        };
        config.save_to(&path).unwrap();

        let (loaded, warnings) = Config::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(loaded.bus_address, config.bus_address);
        assert_eq!(loaded.register_base, config.register_base);
        assert_eq!(loaded.chain_length, config.chain_length);
        assert_eq!(loaded.swapped_units, config.swapped_units);
        assert_eq!(loaded.default_duration_ms, config.default_duration_ms);
        assert_eq!(loaded.default_color, config.default_color);
    }

    #[test]
    fn save_to_includes_header_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        Config::default().save_to(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(
            contents.starts_with("# daisyled configuration"),
            "saved file should start with header comment"
        );
    }

    #[test]
    fn save_to_cleans_up_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        Config::default().save_to(&path).unwrap();
        assert!(!dir.path().join("config.toml.tmp").exists());
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = Config::load_from(&dir.path().join("nonexistent.toml"));
        assert!(warnings.is_empty());
        assert_eq!(config.bus_address, 8);
    }

    #[test]
    fn load_from_invalid_toml_returns_defaults_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is { not valid toml").unwrap();

        let (config, warnings) = Config::load_from(&path);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("config parse error"));
        assert_eq!(config.chain_length, 1);
    }
}
