//! Command encoder for one multicolor LED unit.
//!
//! Every display-intent change is a two-phase write to the configuration
//! block: first disable (mode `Off`, arm 0) together with both color slots and
//! both timings in one burst, then activate (target mode, arm 1) with a single
//! two-byte write. The unit is inert while the new slots land, so it never
//! shows old-animation timing with new colors.
//!
//! Color mutations (`set_channel` and friends) read the mode back first. On an
//! active unit only the three color-slot-1 bytes are written and any running
//! animation keeps going; on an `Off` unit the mutation becomes a steady color.

use std::sync::mpsc;
use std::time::Duration;

use crate::bus::{RegisterAccess, Result, TransportError};
use crate::protocol::*;

use super::color::{Channel, Color, clamp_intensity};
use super::listeners::{AnimationFinished, ListenerId, Listeners};
use super::mode::{Animation, DisplayMode, Effect, TimingInterval, UnitState};

/// Driver for a single unit on a chain.
///
/// Holds no copy of the unit's mode or colors: the device is authoritative and
/// is read back before every read-modify-write.
pub struct MulticolorLed<A> {
    access: A,
    register_base: u16,
    swapped: bool,
    bus_address: u8,
    position: u32,
    listeners: Listeners<MulticolorLed<A>>,
}

/// Build the disable-phase burst written at [`OFF_CONFIG`].
pub fn disable_block(
    color1: Color,
    time1: TimingInterval,
    color2: Color,
    time2: TimingInterval,
    swapped: bool,
) -> [u8; CONFIG_BLOCK_LEN] {
    let mut block = [0u8; CONFIG_BLOCK_LEN];
    block[0] = MODE_OFF;
    block[1] = ARM_DISARMED;
    block[2..5].copy_from_slice(&color1.to_wire(swapped));
    block[5..8].copy_from_slice(&color2.to_wire(swapped));
    block[8..12].copy_from_slice(&time1.to_le_bytes());
    block[12..16].copy_from_slice(&time2.to_le_bytes());
    block
}

/// Build the activate-phase write for `mode`.
pub fn activate_block(mode: DisplayMode) -> [u8; 2] {
    [mode.as_byte(), ARM_ACTIVE]
}

impl<A: RegisterAccess> MulticolorLed<A> {
    /// Standalone unit at register base 0, outside any registered chain.
    pub fn new(access: A, swapped: bool) -> Self {
        Self::at_position(access, swapped, 0, 0)
    }

    pub(crate) fn at_position(access: A, swapped: bool, bus_address: u8, position: u32) -> Self {
        MulticolorLed {
            access,
            register_base: 0,
            swapped,
            bus_address,
            position,
            listeners: Listeners::default(),
        }
    }

    pub fn with_register_base(mut self, base: u16) -> Self {
        self.register_base = base;
        self
    }

    pub fn access(&self) -> &A {
        &self.access
    }

    pub fn register_base(&self) -> u16 {
        self.register_base
    }

    /// Whether this unit has its green and blue lines swapped.
    pub fn is_swapped(&self) -> bool {
        self.swapped
    }

    pub fn bus_address(&self) -> u8 {
        self.bus_address
    }

    /// Chain position; 0 is nearest the host.
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Absolute register for `offset`. The whole block must fit below 0xFFFF.
    fn reg(&self, offset: u16) -> Result<u16> {
        match self.register_base.checked_add(REGISTER_BLOCK_LEN) {
            Some(_) => Ok(self.register_base + offset),
            None => Err(TransportError::Malformed(format!(
                "unit {} register base 0x{:04X}: block runs past 0xFFFF",
                self.position, self.register_base
            ))),
        }
    }

    fn write(&self, offset: u16, bytes: &[u8]) -> Result<()> {
        let reg = self.reg(offset)?;
        log::debug!(
            "unit {}: write 0x{:02X} {:02X?}",
            self.position,
            reg,
            bytes
        );
        self.access.write_bytes(reg, bytes)
    }

    fn read(&self, offset: u16, len: usize) -> Result<Vec<u8>> {
        let reg = self.reg(offset)?;
        let bytes = self.access.read_bytes(reg, len)?;
        log::trace!("unit {}: read 0x{:02X} {:02X?}", self.position, reg, bytes);
        Ok(bytes)
    }

    // ── Read-back ──

    pub fn read_mode(&self) -> Result<DisplayMode> {
        let byte = self.access.read_byte(self.reg(OFF_CONFIG)?)?;
        DisplayMode::from_byte(byte).ok_or_else(|| {
            TransportError::Malformed(format!("unit {} mode: 0x{byte:02X}", self.position))
        })
    }

    /// Color slot 1 as requested, not the live interpolated output.
    pub fn current_color(&self) -> Result<Color> {
        let bytes = self.read(OFF_COLOR1, 3)?;
        let wire = <[u8; 3]>::try_from(&bytes[..]).map_err(|_| {
            TransportError::Malformed(format!(
                "unit {} color slot 1: read {} of 3 bytes",
                self.position,
                bytes.len()
            ))
        })?;
        Ok(Color::from_wire(wire, self.swapped))
    }

    pub fn read_state(&self) -> Result<UnitState> {
        let block = self.read(OFF_CONFIG, CONFIG_BLOCK_LEN)?;
        UnitState::decode(&block, self.swapped).ok_or_else(|| {
            TransportError::Malformed(format!(
                "unit {} config block: mode 0x{:02X}",
                self.position, block[0]
            ))
        })
    }

    // ── Steady color ──

    /// Steady black through the two-slot path, leaving the unit in `Constant`.
    pub fn turn_off(&self) -> Result<()> {
        self.set_steady_color(Color::BLACK)
    }

    /// Show `color` steadily, replacing any running animation.
    pub fn set_steady_color(&self, color: Color) -> Result<()> {
        self.send_command(color, DisplayMode::Constant)
    }

    /// Two-phase write of `color` in slot 1, black in slot 2, zero timings.
    pub fn send_command(&self, color: Color, mode: DisplayMode) -> Result<()> {
        self.write_two_phase(
            mode,
            color,
            TimingInterval::ZERO,
            Color::BLACK,
            TimingInterval::ZERO,
        )
    }

    // ── Color mutation ──

    /// Change color slot 1 without touching the mode.
    ///
    /// An `Off` unit is switched to `Constant` showing `color` instead.
    pub fn set_color(&self, color: Color) -> Result<()> {
        match self.read_mode()? {
            DisplayMode::Off => {
                log::debug!("unit {}: off, promoting to constant", self.position);
                self.send_command(color, DisplayMode::Constant)
            }
            _ => self.write(OFF_COLOR1, &color.to_wire(self.swapped)),
        }
    }

    pub fn set_channel(&self, channel: Channel, value: u8) -> Result<()> {
        let color = self.current_color()?.with_channel(channel, value);
        self.set_color(color)
    }

    /// Like [`set_channel`](Self::set_channel), clamping `value` into `0..=255`.
    pub fn set_channel_clamped(&self, channel: Channel, value: impl Into<i64>) -> Result<()> {
        self.set_channel(channel, clamp_intensity(value))
    }

    pub fn add_channel(&self, channel: Channel) -> Result<()> {
        self.set_channel(channel, u8::MAX)
    }

    pub fn remove_channel(&self, channel: Channel) -> Result<()> {
        self.set_channel(channel, 0)
    }

    // ── Blink ──

    pub fn blink_once(&self, color: Color) -> Result<()> {
        self.blink_once_for(color, DEFAULT_DURATION)
    }

    pub fn blink_once_for(&self, color: Color, duration: Duration) -> Result<()> {
        self.play(&Animation::once(Effect::Blink, color, duration))
    }

    pub fn blink_once_with(&self, color: Color, duration: Duration, notify: bool) -> Result<()> {
        self.play(&Animation::once(Effect::Blink, color, duration).with_notify(notify))
    }

    /// Blink `color1` for `duration1`, then settle on `color2`.
    pub fn blink_once_to(&self, color1: Color, duration1: Duration, color2: Color) -> Result<()> {
        self.play(&Animation::once(Effect::Blink, color1, duration1).ending_on(color2))
    }

    /// `color` and black, one second each, forever.
    pub fn blink_repeating(&self, color: Color) -> Result<()> {
        self.blink_repeating_between(color, DEFAULT_DURATION, Color::BLACK, DEFAULT_DURATION)
    }

    pub fn blink_repeating_between(
        &self,
        color1: Color,
        time1: Duration,
        color2: Color,
        time2: Duration,
    ) -> Result<()> {
        self.play(&Animation::repeating(
            Effect::Blink,
            color1,
            time1,
            color2,
            time2,
        ))
    }

    // ── Fade ──

    pub fn fade_once(&self, color: Color) -> Result<()> {
        self.fade_once_for(color, DEFAULT_DURATION)
    }

    pub fn fade_once_for(&self, color: Color, duration: Duration) -> Result<()> {
        self.play(&Animation::once(Effect::Fade, color, duration))
    }

    pub fn fade_once_to(&self, color: Color, duration: Duration, end_color: Color) -> Result<()> {
        self.play(&Animation::once(Effect::Fade, color, duration).ending_on(end_color))
    }

    pub fn fade_once_with(
        &self,
        color: Color,
        duration: Duration,
        end_color: Color,
        notify: bool,
    ) -> Result<()> {
        self.play(
            &Animation::once(Effect::Fade, color, duration)
                .ending_on(end_color)
                .with_notify(notify),
        )
    }

    pub fn fade_repeating(&self, color: Color) -> Result<()> {
        self.fade_repeating_between(color, DEFAULT_DURATION, Color::BLACK, DEFAULT_DURATION)
    }

    pub fn fade_repeating_between(
        &self,
        color1: Color,
        time1: Duration,
        color2: Color,
        time2: Duration,
    ) -> Result<()> {
        self.play(&Animation::repeating(
            Effect::Fade,
            color1,
            time1,
            color2,
            time2,
        ))
    }

    /// Start `animation`, replacing whatever the unit was showing.
    pub fn play(&self, animation: &Animation) -> Result<()> {
        self.write_two_phase(
            animation.mode(),
            animation.color1,
            animation.time1,
            animation.color2,
            animation.time2,
        )
    }

    // ── Two-phase write ──

    fn write_two_phase(
        &self,
        mode: DisplayMode,
        color1: Color,
        time1: TimingInterval,
        color2: Color,
        time2: TimingInterval,
    ) -> Result<()> {
        let block = disable_block(color1, time1, color2, time2, self.swapped);
        self.write(OFF_CONFIG, &block)?;
        self.reactivate(mode)
    }

    /// Activate phase only.
    ///
    /// After a failed activate the unit is disabled with the new slots already
    /// loaded; calling this again completes the transition.
    pub fn reactivate(&self, mode: DisplayMode) -> Result<()> {
        self.write(OFF_CONFIG, &activate_block(mode))
    }

    // ── Completion events ──

    /// Register a listener for the unit's animation-finished interrupt.
    ///
    /// Listeners run inside [`handle_interrupt`](Self::handle_interrupt) and
    /// must not issue register writes; use [`subscribe_queued`](Self::subscribe_queued)
    /// to react with bus traffic.
    pub fn on_animation_finished(&mut self, listener: impl Fn(&Self) + 'static) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Forward animation-finished events onto a channel for deferred handling.
    pub fn subscribe_queued(&mut self) -> mpsc::Receiver<AnimationFinished> {
        let (tx, rx) = mpsc::channel();
        self.listeners.add(move |led: &Self| {
            let event = AnimationFinished {
                bus_address: led.bus_address,
                position: led.position,
            };
            if tx.send(event).is_err() {
                log::debug!("unit {}: queued listener dropped", led.position);
            }
        });
        rx
    }

    /// Entry point for the interrupt delivery collaborator.
    pub fn handle_interrupt(&self) {
        log::debug!(
            "unit {}: animation finished ({} listener(s))",
            self.position,
            self.listeners.len()
        );
        self.listeners.emit(self);
    }
}
