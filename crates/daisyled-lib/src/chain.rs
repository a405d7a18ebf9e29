//! Chain discovery: build one driver per unit on a daisy-chained bus.
//!
//! Each bus address can be enumerated once. A [`ChainRegistry`] records which
//! addresses have been enumerated and which positions were claimed directly,
//! so a second enumeration, or mixing enumeration with direct claims on the
//! same bus, is reported as a usage error instead of producing two drivers
//! for one unit.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::bus::{self, RegisterAccess};
use crate::error::{DaisyledError, Result};
use crate::led::MulticolorLed;

// ── Error type ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainDiscoveryError {
    /// The bus cannot report its chain (no enumeration support, bus fault).
    Unavailable(String),
    /// The bus address was already enumerated or has directly claimed positions.
    AlreadyConsumed(u8),
}

impl fmt::Display for ChainDiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainDiscoveryError::Unavailable(e) => write!(f, "Chain discovery unavailable: {e}"),
            ChainDiscoveryError::AlreadyConsumed(addr) => {
                write!(f, "Chain on bus 0x{addr:02X} was already claimed")
            }
        }
    }
}

impl std::error::Error for ChainDiscoveryError {}

// ── Enumerator trait ──

/// Bus-side discovery collaborator.
pub trait ChainEnumerator {
    type Access: RegisterAccess;

    /// Number of units chained at `bus_address`.
    fn chain_length(&mut self, bus_address: u8) -> std::result::Result<u32, ChainDiscoveryError>;

    /// Register access for the unit at `position` (0 = nearest the host).
    fn open_unit(&mut self, bus_address: u8, position: u32) -> bus::Result<Self::Access>;
}

// ── Layout ──

/// Per-chain construction options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainLayout {
    /// Register base applied to every unit.
    pub register_base: u16,
    /// Positions whose green and blue lines are swapped.
    pub swapped_positions: Vec<u32>,
}

impl ChainLayout {
    pub fn is_swapped(&self, position: u32) -> bool {
        self.swapped_positions.contains(&position)
    }
}

// ── Registry ──

#[derive(Debug)]
enum BusClaim {
    Enumerated,
    Direct(BTreeSet<u32>),
}

/// Tracks which bus addresses have been consumed.
#[derive(Debug, Default)]
pub struct ChainRegistry {
    buses: Mutex<HashMap<u8, BusClaim>>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry.
    pub fn global() -> &'static ChainRegistry {
        static REGISTRY: OnceLock<ChainRegistry> = OnceLock::new();
        REGISTRY.get_or_init(ChainRegistry::new)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u8, BusClaim>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.buses.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether `bus_address` has been enumerated or has directly claimed positions.
    pub fn is_consumed(&self, bus_address: u8) -> bool {
        self.lock().contains_key(&bus_address)
    }

    /// Mark `bus_address` as enumerated. Fails if anything already claimed it.
    fn consume(&self, bus_address: u8) -> std::result::Result<(), ChainDiscoveryError> {
        let mut buses = self.lock();
        if buses.contains_key(&bus_address) {
            return Err(ChainDiscoveryError::AlreadyConsumed(bus_address));
        }
        buses.insert(bus_address, BusClaim::Enumerated);
        Ok(())
    }

    /// Reserve one position for direct instantiation.
    pub fn claim_position(&self, bus_address: u8, position: u32) -> Result<()> {
        let mut buses = self.lock();
        match buses
            .entry(bus_address)
            .or_insert_with(|| BusClaim::Direct(BTreeSet::new()))
        {
            BusClaim::Enumerated => Err(DaisyledError::ConfigurationMisuse(format!(
                "bus 0x{bus_address:02X} was enumerated; unit {position} cannot be claimed directly"
            ))),
            BusClaim::Direct(positions) => {
                if positions.insert(position) {
                    Ok(())
                } else {
                    Err(DaisyledError::ConfigurationMisuse(format!(
                        "bus 0x{bus_address:02X} unit {position} is already claimed"
                    )))
                }
            }
        }
    }
}

// ── Factory ──

/// Enumerate the chain at `bus_address` and build one driver per unit, nearest first.
///
/// The address is consumed before the enumerator is queried, so a failed
/// discovery still blocks later attempts on the same address.
pub fn discover_chain<E: ChainEnumerator>(
    registry: &ChainRegistry,
    enumerator: &mut E,
    bus_address: u8,
    layout: &ChainLayout,
) -> Result<Vec<MulticolorLed<E::Access>>> {
    registry.consume(bus_address)?;
    let length = enumerator.chain_length(bus_address)?;
    log::info!("bus 0x{bus_address:02X}: {length} unit(s) chained");

    let mut units = Vec::with_capacity(length as usize);
    for position in 0..length {
        let access = enumerator.open_unit(bus_address, position)?;
        let swapped = layout.is_swapped(position);
        if swapped {
            log::debug!("bus 0x{bus_address:02X} unit {position}: green/blue swapped");
        }
        units.push(
            MulticolorLed::at_position(access, swapped, bus_address, position)
                .with_register_base(layout.register_base),
        );
    }
    Ok(units)
}

/// Build a driver for one known position without enumerating the bus.
pub fn claim_unit<A: RegisterAccess>(
    registry: &ChainRegistry,
    access: A,
    bus_address: u8,
    position: u32,
    layout: &ChainLayout,
) -> Result<MulticolorLed<A>> {
    registry.claim_position(bus_address, position)?;
    Ok(
        MulticolorLed::at_position(access, layout.is_swapped(position), bus_address, position)
            .with_register_base(layout.register_base),
    )
}
