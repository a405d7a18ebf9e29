//! Register snapshots for the simulated chain, persisted as JSON between runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use daisyled_lib::protocol::REGISTER_BLOCK_LEN;

use super::{Config, DaisyledError, MockChain, Result};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub(super) struct ChainSnapshot {
    pub bus_address: u8,
    pub register_base: u16,
    /// One register block per chain position, starting at `register_base`.
    pub units: Vec<Vec<u8>>,
}

/// Preload `chain` from the snapshot at `path`.
///
/// A missing file leaves every unit Off. A snapshot taken with a different
/// bus address or register base is ignored with a warning.
pub(super) fn restore(path: &Path, config: &Config, chain: &MockChain) -> Result<()> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    let snapshot: ChainSnapshot = serde_json::from_str(&contents).map_err(|e| {
        DaisyledError::Config(format!("state file {}: {e}", path.display()))
    })?;

    if snapshot.bus_address != config.bus_address
        || snapshot.register_base != config.register_base
    {
        log::warn!(
            "state file {} was taken on bus 0x{:02X} base 0x{:02X}, ignoring",
            path.display(),
            snapshot.bus_address,
            snapshot.register_base
        );
        return Ok(());
    }
    if snapshot.units.len() != chain.units.len() {
        log::warn!(
            "state file has {} units, chain has {}; restoring the overlap",
            snapshot.units.len(),
            chain.units.len()
        );
    }

    for (position, (bus, block)) in chain.units.iter().zip(&snapshot.units).enumerate() {
        if block.len() != REGISTER_BLOCK_LEN as usize {
            log::warn!(
                "state for unit {position} has {} bytes, expected {REGISTER_BLOCK_LEN}; skipped",
                block.len()
            );
            continue;
        }
        bus.preload(config.register_base, block)?;
    }
    log::debug!("restored chain state from {}", path.display());
    Ok(())
}

/// Write every unit's register block to `path` (temp file, then rename).
pub(super) fn save(path: &Path, config: &Config, chain: &MockChain) -> Result<()> {
    let units = chain
        .units
        .iter()
        .map(|bus| bus.snapshot(config.register_base, REGISTER_BLOCK_LEN as usize))
        .collect::<daisyled_lib::bus::Result<Vec<_>>>()?;
    let snapshot = ChainSnapshot {
        bus_address: config.bus_address,
        register_base: config.register_base,
        units,
    };
    let serialized = serde_json::to_string_pretty(&snapshot).map_err(std::io::Error::other)?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &serialized)?;
    if std::fs::rename(&tmp, path).is_err() {
        std::fs::write(path, &serialized)?;
        let _ = std::fs::remove_file(&tmp);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use daisyled_lib::bus::RegisterAccess;
    use daisyled_lib::protocol::{MODE_BLINK_REPEATING, OFF_CONFIG};

    fn two_units() -> Config {
        Config {
            chain_length: 2,
            ..Config::default()
        }
    }

    #[test]
    fn missing_file_leaves_chain_off() {
        let dir = tempfile::tempdir().unwrap();
        let chain = MockChain::new(2);
        restore(&dir.path().join("none.json"), &two_units(), &chain).unwrap();
        assert_eq!(chain.units[0].read_byte(OFF_CONFIG).unwrap(), 0);
    }

    #[test]
    fn save_then_restore_preserves_registers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let config = two_units();

        let chain = MockChain::new(2);
        chain.units[1]
            .preload(OFF_CONFIG, &[MODE_BLINK_REPEATING, 1, 9, 8, 7])
            .unwrap();
        save(&path, &config, &chain).unwrap();
        assert!(!dir.path().join("state.json.tmp").exists());

        let fresh = MockChain::new(2);
        restore(&path, &config, &fresh).unwrap();
        assert_eq!(
            fresh.units[1].snapshot(OFF_CONFIG, 5).unwrap(),
            vec![MODE_BLINK_REPEATING, 1, 9, 8, 7]
        );
        assert!(fresh.units[1].writes.borrow().is_empty(), "restore is not a write");
        assert_eq!(fresh.units[0].read_byte(OFF_CONFIG).unwrap(), 0);
    }

    #[test]
    fn snapshot_from_other_bus_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let chain = MockChain::new(2);
        chain.units[0]
            .preload(OFF_CONFIG, &[MODE_BLINK_REPEATING])
            .unwrap();
        save(&path, &two_units(), &chain).unwrap();

        let other = Config {
            bus_address: 0x30,
            ..two_units()
        };
        let fresh = MockChain::new(2);
        restore(&path, &other, &fresh).unwrap();
        assert_eq!(fresh.units[0].read_byte(OFF_CONFIG).unwrap(), 0);
    }

    #[test]
    fn block_past_register_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let config = Config {
            register_base: 240,
            ..two_units()
        };
        let snapshot = ChainSnapshot {
            bus_address: config.bus_address,
            register_base: 240,
            units: vec![vec![0; REGISTER_BLOCK_LEN as usize]; 2],
        };
        std::fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let chain = MockChain::new(2);
        assert!(matches!(
            restore(&path, &config, &chain),
            Err(DaisyledError::Transport(_))
        ));
        assert!(matches!(
            save(&path, &config, &chain),
            Err(DaisyledError::Transport(_))
        ));
    }

    #[test]
    fn corrupt_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = restore(&path, &two_units(), &MockChain::new(2)).unwrap_err();
        assert!(matches!(err, DaisyledError::Config(_)));
    }
}
