//! Unified error type for the daisyled-lib crate.
//!
//! [`DaisyledError`] wraps module-specific errors (`TransportError`,
//! `ChainDiscoveryError`) and domain-specific error kinds (`ConfigurationMisuse`,
//! `Config`, `Color`). `From` impls allow `?` to propagate across module
//! boundaries seamlessly.

use std::fmt;

use crate::bus::TransportError;
use crate::chain::ChainDiscoveryError;

/// Unified error type for daisyled-lib operations.
#[derive(Debug)]
pub enum DaisyledError {
    /// Register read/write failure on the bus.
    Transport(TransportError),
    /// Chain enumeration unavailable or already consumed.
    ChainDiscovery(ChainDiscoveryError),
    /// API contract violation (e.g. claiming a unit on an enumerated chain).
    ConfigurationMisuse(String),
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
    /// Configuration validation error.
    Config(String),
    /// Color or channel parsing error.
    Color(String),
}

impl fmt::Display for DaisyledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaisyledError::Transport(e) => write!(f, "{e}"),
            DaisyledError::ChainDiscovery(e) => write!(f, "{e}"),
            DaisyledError::ConfigurationMisuse(e) => write!(f, "Configuration misuse: {e}"),
            DaisyledError::Io(e) => write!(f, "I/O error: {e}"),
            DaisyledError::Config(e) => write!(f, "Config error: {e}"),
            DaisyledError::Color(e) => write!(f, "Color error: {e}"),
        }
    }
}

impl std::error::Error for DaisyledError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DaisyledError::Transport(e) => Some(e),
            DaisyledError::ChainDiscovery(e) => Some(e),
            DaisyledError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for DaisyledError {
    fn from(e: TransportError) -> Self {
        DaisyledError::Transport(e)
    }
}

impl From<ChainDiscoveryError> for DaisyledError {
    fn from(e: ChainDiscoveryError) -> Self {
        DaisyledError::ChainDiscovery(e)
    }
}

impl From<std::io::Error> for DaisyledError {
    fn from(e: std::io::Error) -> Self {
        DaisyledError::Io(e)
    }
}

/// Crate-level Result alias using [`DaisyledError`].
pub type Result<T> = std::result::Result<T, DaisyledError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_transport_error() {
        let e: DaisyledError = TransportError::Write("x".into()).into();
        assert!(matches!(e, DaisyledError::Transport(TransportError::Write(_))));
    }

    #[test]
    fn from_chain_discovery_error() {
        let e: DaisyledError = ChainDiscoveryError::AlreadyConsumed(1).into();
        assert!(matches!(
            e,
            DaisyledError::ChainDiscovery(ChainDiscoveryError::AlreadyConsumed(1))
        ));
    }

    #[test]
    fn display_transport_is_transparent() {
        let e = DaisyledError::Transport(TransportError::Read("read 0x03: nack".into()));
        assert_eq!(e.to_string(), "Register read failed: read 0x03: nack");
    }

    #[test]
    fn display_misuse() {
        let e = DaisyledError::ConfigurationMisuse("unit 0 already claimed".into());
        assert_eq!(e.to_string(), "Configuration misuse: unit 0 already claimed");
    }

    #[test]
    fn display_config_and_color() {
        assert_eq!(
            DaisyledError::Config("bad".into()).to_string(),
            "Config error: bad"
        );
        assert_eq!(
            DaisyledError::Color("bad hex".into()).to_string(),
            "Color error: bad hex"
        );
    }

    #[test]
    fn source_chains_transport_error() {
        let e = DaisyledError::Transport(TransportError::Write("timeout".into()));
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("timeout"));
    }

    #[test]
    fn source_none_for_string_variants() {
        let e = DaisyledError::ConfigurationMisuse("test".into());
        assert!(std::error::Error::source(&e).is_none());
    }

    #[test]
    fn question_mark_propagation_transport_to_daisyled() {
        fn inner() -> crate::bus::Result<()> {
            Err(TransportError::Read("nack".into()))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        let err = outer().unwrap_err();
        assert!(matches!(err, DaisyledError::Transport(TransportError::Read(_))));
    }

    #[test]
    fn question_mark_propagation_io_to_daisyled() {
        fn inner() -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "nope"))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        assert!(matches!(outer().unwrap_err(), DaisyledError::Io(_)));
    }
}
