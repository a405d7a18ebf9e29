//! Register access: the transport seam between the encoder and the bus.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

// ── Error type ──

/// Bus transport errors.
///
/// String payloads follow the convention **"context: details"** where *context*
/// identifies the operation or register (e.g. `"write 0x03"`, `"open unit 2"`)
/// and *details* describes what went wrong.
#[derive(Debug)]
pub enum TransportError {
    Open(String),
    Read(String),
    Write(String),
    /// The device returned a value the protocol does not define.
    Malformed(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Open(e) => write!(f, "Failed to open unit: {e}"),
            TransportError::Read(e) => write!(f, "Register read failed: {e}"),
            TransportError::Write(e) => write!(f, "Register write failed: {e}"),
            TransportError::Malformed(e) => write!(f, "Malformed register value: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;

// ── Trait ──

/// Byte-level register access for one unit.
///
/// Addresses are absolute on the unit's bus; the encoder adds its register
/// base. Implementations must not reorder or coalesce writes: the encoder
/// depends on program order for its two-phase sequence.
pub trait RegisterAccess {
    fn read_byte(&self, register: u16) -> Result<u8>;
    /// Write a contiguous burst starting at `register`.
    fn write_bytes(&self, register: u16, bytes: &[u8]) -> Result<()>;

    /// Read `len` consecutive registers one byte at a time.
    fn read_bytes(&self, register: u16, len: usize) -> Result<Vec<u8>> {
        (0..len)
            .map(|i| {
                let reg = u16::try_from(i)
                    .ok()
                    .and_then(|i| register.checked_add(i))
                    .ok_or_else(|| {
                        TransportError::Read(format!(
                            "read 0x{register:02X}+{len}: past the last register"
                        ))
                    })?;
                self.read_byte(reg)
            })
            .collect()
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &T {
    fn read_byte(&self, register: u16) -> Result<u8> {
        (**self).read_byte(register)
    }
    fn write_bytes(&self, register: u16, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(register, bytes)
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for Rc<T> {
    fn read_byte(&self, register: u16) -> Result<u8> {
        (**self).read_byte(register)
    }
    fn write_bytes(&self, register: u16, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(register, bytes)
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for Arc<T> {
    fn read_byte(&self, register: u16) -> Result<u8> {
        (**self).read_byte(register)
    }
    fn write_bytes(&self, register: u16, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(register, bytes)
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for Box<T> {
    fn read_byte(&self, register: u16) -> Result<u8> {
        (**self).read_byte(register)
    }
    fn write_bytes(&self, register: u16, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(register, bytes)
    }
}

// ── Mock ──

pub mod mock {
    use super::*;
    use crate::chain::{ChainDiscoveryError, ChainEnumerator};
    use std::cell::{Cell, RefCell};

    /// Size of the mock register file.
    pub const MOCK_REGISTER_COUNT: usize = 256;

    /// In-memory unit for tests and the CLI's simulated chain.
    ///
    /// Writes land in a flat register file and are appended to `writes` in
    /// order; reads come from the same file (unwritten registers read as 0,
    /// i.e. mode `Off`).
    pub struct MockBus {
        /// Register file: address → value.
        pub registers: RefCell<Vec<u8>>,
        /// Recorded successful writes: (register, bytes).
        pub writes: RefCell<Vec<(u16, Vec<u8>)>>,
        /// Recorded reads (register).
        pub reads: RefCell<Vec<u16>>,
        /// If set, the write with this zero-based attempt index and every later one fails.
        pub fail_writes_from: Cell<Option<usize>>,
        /// If true, every read fails.
        pub fail_reads: Cell<bool>,
        write_attempts: Cell<usize>,
    }

    impl Default for MockBus {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockBus {
        pub fn new() -> Self {
            MockBus {
                registers: RefCell::new(vec![0; MOCK_REGISTER_COUNT]),
                writes: RefCell::new(Vec::new()),
                reads: RefCell::new(Vec::new()),
                fail_writes_from: Cell::new(None),
                fail_reads: Cell::new(false),
                write_attempts: Cell::new(0),
            }
        }

        /// Preload registers without recording a write.
        pub fn preload(&self, register: u16, bytes: &[u8]) -> Result<()> {
            let mut regs = self.registers.borrow_mut();
            let start = register as usize;
            let slot = regs.get_mut(start..start + bytes.len()).ok_or_else(|| {
                TransportError::Write(format!(
                    "preload 0x{register:02X}: {} bytes out of range",
                    bytes.len()
                ))
            })?;
            slot.copy_from_slice(bytes);
            Ok(())
        }

        /// Snapshot of `len` registers starting at `register`.
        pub fn snapshot(&self, register: u16, len: usize) -> Result<Vec<u8>> {
            let start = register as usize;
            self.registers
                .borrow()
                .get(start..start + len)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| {
                    TransportError::Read(format!("snapshot 0x{register:02X}: {len} bytes out of range"))
                })
        }

        /// Drain the write log.
        pub fn take_writes(&self) -> Vec<(u16, Vec<u8>)> {
            std::mem::take(&mut *self.writes.borrow_mut())
        }

        /// Number of write attempts, including failed ones.
        pub fn write_attempts(&self) -> usize {
            self.write_attempts.get()
        }
    }

    impl RegisterAccess for MockBus {
        fn read_byte(&self, register: u16) -> Result<u8> {
            if self.fail_reads.get() {
                return Err(TransportError::Read(format!(
                    "read 0x{register:02X}: mock failure injected"
                )));
            }
            self.reads.borrow_mut().push(register);
            self.registers
                .borrow()
                .get(register as usize)
                .copied()
                .ok_or_else(|| {
                    TransportError::Read(format!("read 0x{register:02X}: out of range"))
                })
        }

        fn write_bytes(&self, register: u16, bytes: &[u8]) -> Result<()> {
            let attempt = self.write_attempts.get();
            self.write_attempts.set(attempt + 1);
            if self.fail_writes_from.get().is_some_and(|n| attempt >= n) {
                return Err(TransportError::Write(format!(
                    "write 0x{register:02X}: mock failure injected"
                )));
            }
            let start = register as usize;
            let mut regs = self.registers.borrow_mut();
            if start + bytes.len() > regs.len() {
                return Err(TransportError::Write(format!(
                    "write 0x{register:02X}: {} bytes out of range",
                    bytes.len()
                )));
            }
            regs[start..start + bytes.len()].copy_from_slice(bytes);
            self.writes.borrow_mut().push((register, bytes.to_vec()));
            Ok(())
        }
    }

    /// Simulated bus with a fixed number of chained units.
    pub struct MockChain {
        /// One register file per chain position.
        pub units: Vec<Rc<MockBus>>,
        /// If true, `chain_length` reports discovery as unavailable.
        pub unavailable: bool,
        /// Bus addresses `chain_length` was asked about, in order.
        pub queried: Vec<u8>,
    }

    impl MockChain {
        pub fn new(length: u32) -> Self {
            MockChain {
                units: (0..length).map(|_| Rc::new(MockBus::new())).collect(),
                unavailable: false,
                queried: Vec::new(),
            }
        }
    }

    impl ChainEnumerator for MockChain {
        type Access = Rc<MockBus>;

        fn chain_length(
            &mut self,
            bus_address: u8,
        ) -> std::result::Result<u32, ChainDiscoveryError> {
            self.queried.push(bus_address);
            if self.unavailable {
                return Err(ChainDiscoveryError::Unavailable(format!(
                    "bus 0x{bus_address:02X}: mock enumeration disabled"
                )));
            }
            Ok(self.units.len() as u32)
        }

        fn open_unit(&mut self, bus_address: u8, position: u32) -> Result<Self::Access> {
            self.units.get(position as usize).cloned().ok_or_else(|| {
                TransportError::Open(format!(
                    "bus 0x{bus_address:02X} unit {position}: no such position"
                ))
            })
        }
    }
}
