//! # mcp23s17-spi
//!
//! A Rust crate for controlling the Microchip MCP23S17 16-bit GPIO expander
//! over its SPI interface.
//!
//! The driver speaks the chip's fixed command-frame protocol (opcode byte,
//! register address, data) through any [`embedded_hal::spi::SpiBus`]
//! implementation plus an [`embedded_hal::digital::OutputPin`] for the
//! chip-select line, and keeps a local mirror of the writable registers so
//! that per-pin operations become read-modify-write updates without
//! re-reading the chip each time.
//!
//! ## Features
//!
//! *   Single pin setup, write and read (`setup`, `output`, `input`, `toggle`).
//! *   Bulk multi-pin operations issuing at most one register access per
//!     affected port (`setup_pins`, `output_pins`, `input_pins`, `toggle_pins`).
//! *   Weak pull-up and input polarity control (`pullup`, `polarity` and
//!     their bulk forms).
//! *   Interrupt-on-change configuration (`set_interrupt`,
//!     `set_interrupt_mode`) and pending-state retrieval
//!     (`read_captured_gpio`, `read_interrupt_flags`, `interrupt_source`).
//! *   Device-wide configuration via the IOCON register (`configure`):
//!     interrupt polarity and mirroring, open-drain INT outputs, hardware
//!     addressing, bank mode.
//! *   Both register address layouts (IOCON BANK bit), computed by a pure
//!     table selected through [`BankMode`].
//!
//! ## The register mirror
//!
//! The driver caches the last known value of every writable register byte
//! and starts with all of them *unknown*. The first read-modify-write on a
//! register reads the chip to seed the cache, so bits configured by earlier
//! software (or the chip's reset defaults) are preserved instead of
//! clobbered. After that, a pin change costs one register write, and a
//! change that would rewrite the current value costs nothing at all: the
//! write is skipped. The mirror is committed only after the transport
//! reports success, so a failed transfer leaves it describing the last
//! known-good chip state.
//!
//! Registers with live or self-clearing semantics (GPIO, INTF, INTCAP) are
//! never cached; `input` and `read_captured_gpio` always read the chip.
//!
//! ## Basic usage
//!
//! ```no_run
//! use mcp23s17_spi::{GpioDirection, Mcp23s17};
//!
//! # fn main() -> mcp23s17_spi::Result<()> {
//! # let spi = embedded_hal_mock::eh1::spi::Mock::new(&[]);
//! # let cs = embedded_hal_mock::eh1::digital::Mock::new(&[]);
//! // `spi` is any embedded-hal SpiBus (mode 0, MSB first); `cs` is the
//! // OutputPin wired to the chip-select input.
//! let mut expander = Mcp23s17::with_default_address(spi, cs)?;
//!
//! expander.setup(0, GpioDirection::Output)?;
//! expander.output(0, true)?;
//!
//! expander.setup(3, GpioDirection::Input)?;
//! expander.pullup(3, true)?;
//! let level = expander.input(3)?;
//! println!("GPA3 is {}", if level { "high" } else { "low" });
//! # Ok(())
//! # }
//! ```
//!
//! ## Hardware notes
//!
//! *   The chip requires SPI mode 0 (CPOL = 0, CPHA = 0), MSB first. The
//!     driver does not configure the bus; set this up when creating the
//!     `SpiBus` handle.
//! *   The opcode address (0x20-0x27) must match the A2..A0 strap pins, and
//!     addresses other than the default only take effect after hardware
//!     addressing is enabled via [`ConfigOption::HardwareAddressing`].
//! *   The driver owns its bus and chip-select exclusively. Sharing one
//!     physical bus between several chips is the transport layer's job
//!     (e.g. a bus-manager splitting an `SpiBus` into `SpiDevice`s).
//!
//! ## License
//!
//! Licensed under the MIT license.

use embedded_hal::digital::{Error as _, OutputPin};
use embedded_hal::spi::{Error as _, SpiBus};
use log::{debug, trace};

mod consts;
mod error;
pub mod gpio;
pub mod registers;

pub use error::{Error, Result};
pub use gpio::{GpioDirection, InterruptMode, InterruptPolarity, Port, NUM_PINS};
pub use registers::{BankMode, Register, IOCON};

use registers::RegisterMirror;

/// A device-wide option applied through [`Mcp23s17::configure`].
///
/// All options live in the shared IOCON register; any number of them can be
/// changed with a single register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOption {
    /// Select the register address layout. After a successful switch every
    /// later register access is addressed under the new mode.
    Bank(BankMode),
    /// Internally connect INTA and INTB so either port's interrupt raises
    /// both pins.
    MirrorInterrupts(bool),
    /// Drive the INT pins as open-drain outputs (overrides the polarity).
    OpenDrainInterrupts(bool),
    /// Polarity of the INT pins when driven actively.
    InterruptPolarity(InterruptPolarity),
    /// Honour the A2..A0 strap pins when matching the opcode address,
    /// allowing several chips to share one bus.
    HardwareAddressing(bool),
    /// Disable slew rate control on SDA (no effect on the SPI variant, kept
    /// for register completeness).
    DisableSlewRate(bool),
}

/// A handle to one MCP23S17 behind an exclusive SPI bus and chip-select line.
///
/// All operations are synchronous and blocking; each performs zero or more
/// SPI transactions and returns only after the last one completed or failed.
/// Exclusive access is enforced through `&mut self`, so no internal locking
/// exists.
#[derive(Debug)]
pub struct Mcp23s17<SPI, CS> {
    spi: SPI,
    cs: CS,
    address: u8,
    bank: BankMode,
    mirror: RegisterMirror,
}

impl<SPI: SpiBus, CS: OutputPin> Mcp23s17<SPI, CS> {
    // --- Construction ---

    /// Creates a driver for the chip at the given opcode address (0x20-0x27).
    ///
    /// Performs no bus traffic: the register mirror starts unknown and is
    /// seeded from the chip on first use, and the bank mode is assumed to be
    /// the reset state ([`BankMode::Interleaved`]).
    pub fn new(spi: SPI, cs: CS, address: u8) -> Result<Self> {
        if !(consts::MIN_ADDRESS..=consts::MAX_ADDRESS).contains(&address) {
            return Err(error::unsupported_address(address));
        }
        debug!("MCP23S17 driver created, opcode address 0x{address:02X}");
        Ok(Self {
            spi,
            cs,
            address,
            bank: BankMode::default(),
            mirror: RegisterMirror::default(),
        })
    }

    /// Creates a driver with the default opcode address (0x20, all strap
    /// pins low).
    pub fn with_default_address(spi: SPI, cs: CS) -> Result<Self> {
        Self::new(spi, cs, consts::DEFAULT_ADDRESS)
    }

    /// The configured 7-bit opcode address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// The bank mode currently used for register address computation.
    pub fn bank_mode(&self) -> BankMode {
        self.bank
    }

    /// Last known value of a mirrored register byte, without bus traffic.
    ///
    /// Returns `None` while the byte has never been read or written this
    /// session, and always `None` for the uncached registers (GPIO, INTF,
    /// INTCAP).
    pub fn mirrored(&self, register: Register, port: Port) -> Option<u8> {
        self.mirror.get(register, port)
    }

    /// Consumes the driver and hands back the SPI bus and chip-select line.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    // --- Register protocol engine ---

    #[inline]
    fn opcode(&self, read: bool) -> u8 {
        (self.address << 1) | if read { consts::READ_BIT } else { 0 }
    }

    /// Exchanges one command frame with chip-select framing.
    ///
    /// The select line is released after the transfer's bytes are exchanged
    /// even when the bus faults, so a failed transaction cannot leave the
    /// chip selected.
    fn transfer_frame(&mut self, frame: &mut [u8; 3]) -> Result<()> {
        self.cs.set_low().map_err(|e| Error::ChipSelect(e.kind()))?;
        let io = self
            .spi
            .transfer_in_place(frame)
            .and_then(|()| self.spi.flush());
        let released = self.cs.set_high();
        io.map_err(|e| Error::Transport(e.kind()))?;
        released.map_err(|e| Error::ChipSelect(e.kind()))?;
        Ok(())
    }

    /// Writes one register byte. No response byte is interpreted.
    fn write_register(&mut self, register: Register, port: Port, value: u8) -> Result<()> {
        let frame = [self.opcode(false), register.address(port, self.bank), value];
        trace!(
            "write {register:?}/{port:?} (reg 0x{:02X}) = 0x{value:02X}",
            frame[1]
        );
        self.cs.set_low().map_err(|e| Error::ChipSelect(e.kind()))?;
        let io = self.spi.write(&frame).and_then(|()| self.spi.flush());
        let released = self.cs.set_high();
        io.map_err(|e| Error::Transport(e.kind()))?;
        released.map_err(|e| Error::ChipSelect(e.kind()))?;
        Ok(())
    }

    /// Reads one register byte via a full-duplex frame with a trailing dummy.
    fn read_register(&mut self, register: Register, port: Port) -> Result<u8> {
        let mut frame = [self.opcode(true), register.address(port, self.bank), 0x00];
        let reg_addr = frame[1];
        self.transfer_frame(&mut frame)?;
        trace!("read {register:?}/{port:?} (reg 0x{reg_addr:02X}) = 0x{:02X}", frame[2]);
        Ok(frame[2])
    }

    // --- Mirror discipline ---

    /// Mirrored value of a register byte, reading the chip to seed the
    /// mirror on first access.
    fn mirrored_or_read(&mut self, register: Register, port: Port) -> Result<u8> {
        if let Some(value) = self.mirror.get(register, port) {
            return Ok(value);
        }
        let value = self.read_register(register, port)?;
        self.mirror.commit(register, port, value);
        Ok(value)
    }

    /// Applies `apply` to the mirrored byte and writes the result back if it
    /// differs. The mirror is committed only after a successful write.
    ///
    /// Returns whether a bus write was issued.
    fn read_modify_write(
        &mut self,
        register: Register,
        port: Port,
        apply: impl FnOnce(u8) -> u8,
    ) -> Result<bool> {
        let current = self.mirrored_or_read(register, port)?;
        let next = apply(current);
        if next == current {
            trace!("{register:?}/{port:?} already 0x{current:02X}, skipping write");
            return Ok(false);
        }
        self.write_register(register, port, next)?;
        self.mirror.commit(register, port, next);
        Ok(true)
    }

    /// Checks the mirrored direction bit before driving a pin.
    fn ensure_output(&mut self, pin: u8, port: Port, bit: u8) -> Result<()> {
        let iodir = self.mirrored_or_read(Register::IODIR, port)?;
        if iodir & (1 << bit) != 0 {
            return Err(Error::PinNotOutput { pin });
        }
        Ok(())
    }

    /// Folds per-pin on/off requests into set/clear masks and issues at most
    /// one read-modify-write per affected port. Later entries for the same
    /// pin win.
    fn write_port_masks(&mut self, register: Register, pins: &[(u8, bool)]) -> Result<()> {
        let mut masks = [(0u8, 0u8); 2];
        for &(pin, on) in pins {
            let (port, bit) = gpio::pin_parts(pin)?;
            let (set, clear) = &mut masks[port.offset() as usize];
            if on {
                *set |= 1 << bit;
                *clear &= !(1 << bit);
            } else {
                *clear |= 1 << bit;
                *set &= !(1 << bit);
            }
        }
        for port in Port::BOTH {
            let (set, clear) = masks[port.offset() as usize];
            if (set | clear) == 0 {
                continue;
            }
            self.read_modify_write(register, port, |v| (v | set) & !clear)?;
        }
        Ok(())
    }

    // --- Pin configuration ---

    /// Sets the direction of a single pin.
    ///
    /// Repeating a call with an unchanged direction issues no bus traffic.
    pub fn setup(&mut self, pin: u8, direction: GpioDirection) -> Result<()> {
        let (port, bit) = gpio::pin_parts(pin)?;
        debug!("setup pin {pin}: {direction:?}");
        self.read_modify_write(Register::IODIR, port, |v| match direction {
            GpioDirection::Input => v | 1 << bit,
            GpioDirection::Output => v & !(1 << bit),
        })?;
        Ok(())
    }

    /// Sets the direction of several pins with at most one direction
    /// register write per affected port.
    pub fn setup_pins(&mut self, pins: &[(u8, GpioDirection)]) -> Result<()> {
        debug!("setup {} pins", pins.len());
        let as_inputs: Vec<(u8, bool)> = pins
            .iter()
            .map(|&(pin, direction)| (pin, direction == GpioDirection::Input))
            .collect();
        self.write_port_masks(Register::IODIR, &as_inputs)
    }

    /// Enables or disables the weak pull-up resistor of a pin.
    pub fn pullup(&mut self, pin: u8, enabled: bool) -> Result<()> {
        let (port, bit) = gpio::pin_parts(pin)?;
        debug!("pullup pin {pin}: {enabled}");
        self.read_modify_write(Register::GPPU, port, |v| {
            if enabled {
                v | 1 << bit
            } else {
                v & !(1 << bit)
            }
        })?;
        Ok(())
    }

    /// Pull-up control for several pins, one register write per port.
    pub fn pullup_pins(&mut self, pins: &[(u8, bool)]) -> Result<()> {
        self.write_port_masks(Register::GPPU, pins)
    }

    /// Inverts (or restores) the polarity with which an input pin is read.
    pub fn polarity(&mut self, pin: u8, inverted: bool) -> Result<()> {
        let (port, bit) = gpio::pin_parts(pin)?;
        debug!("polarity pin {pin}: inverted={inverted}");
        self.read_modify_write(Register::IPOL, port, |v| {
            if inverted {
                v | 1 << bit
            } else {
                v & !(1 << bit)
            }
        })?;
        Ok(())
    }

    /// Polarity control for several pins, one register write per port.
    pub fn polarity_pins(&mut self, pins: &[(u8, bool)]) -> Result<()> {
        self.write_port_masks(Register::IPOL, pins)
    }

    // --- Pin output ---

    /// Drives a single output pin high or low.
    ///
    /// Fails with [`Error::PinNotOutput`] if the pin's mirrored direction
    /// bit says input; the pin must be configured with
    /// [`setup`](Self::setup) first. Writing the level a pin already has
    /// issues no bus traffic.
    pub fn output(&mut self, pin: u8, level: bool) -> Result<()> {
        let (port, bit) = gpio::pin_parts(pin)?;
        self.ensure_output(pin, port, bit)?;
        debug!("output pin {pin}: {}", if level { "high" } else { "low" });
        self.read_modify_write(Register::OLAT, port, |v| {
            if level {
                v | 1 << bit
            } else {
                v & !(1 << bit)
            }
        })?;
        Ok(())
    }

    /// Drives several output pins with at most one latch write per affected
    /// port. Pins absent from `pins` keep their mirrored latch value.
    pub fn output_pins(&mut self, pins: &[(u8, bool)]) -> Result<()> {
        for &(pin, _) in pins {
            let (port, bit) = gpio::pin_parts(pin)?;
            self.ensure_output(pin, port, bit)?;
        }
        debug!("output {} pins", pins.len());
        self.write_port_masks(Register::OLAT, pins)
    }

    /// Inverts the latched level of a single output pin.
    pub fn toggle(&mut self, pin: u8) -> Result<()> {
        self.toggle_pins(&[pin])
    }

    /// Inverts the latched level of several output pins, one latch write per
    /// affected port. A pin listed twice toggles twice, i.e. keeps its level
    /// without any bus write.
    pub fn toggle_pins(&mut self, pins: &[u8]) -> Result<()> {
        let mut masks = [0u8; 2];
        for &pin in pins {
            let (port, bit) = gpio::pin_parts(pin)?;
            self.ensure_output(pin, port, bit)?;
            masks[port.offset() as usize] ^= 1 << bit;
        }
        debug!("toggle {} pins", pins.len());
        for port in Port::BOTH {
            let mask = masks[port.offset() as usize];
            if mask == 0 {
                continue;
            }
            self.read_modify_write(Register::OLAT, port, |v| v ^ mask)?;
        }
        Ok(())
    }

    // --- Pin input ---

    /// Reads the live logic level of a pin.
    ///
    /// Input pins reflect external state, so this always reads the chip; the
    /// mirror is not consulted.
    pub fn input(&mut self, pin: u8) -> Result<bool> {
        let (port, bit) = gpio::pin_parts(pin)?;
        let value = self.read_register(Register::GPIO, port)?;
        Ok(value & (1 << bit) != 0)
    }

    /// Reads several pins with at most one port read per distinct port.
    ///
    /// The result matches the order of `pins`; duplicates are allowed and
    /// each yields the value from the single underlying port snapshot.
    pub fn input_pins(&mut self, pins: &[u8]) -> Result<Vec<bool>> {
        let mut snapshots: [Option<u8>; 2] = [None, None];
        let mut levels = Vec::with_capacity(pins.len());
        for &pin in pins {
            let (port, bit) = gpio::pin_parts(pin)?;
            let byte = match snapshots[port.offset() as usize] {
                Some(byte) => byte,
                None => {
                    let byte = self.read_register(Register::GPIO, port)?;
                    snapshots[port.offset() as usize] = Some(byte);
                    byte
                }
            };
            levels.push(byte & (1 << bit) != 0);
        }
        Ok(levels)
    }

    // --- Interrupts ---

    /// Enables or disables interrupt-on-change for a pin, leaving the
    /// trigger criteria (INTCON/DEFVAL) untouched.
    pub fn set_interrupt(&mut self, pin: u8, enabled: bool) -> Result<()> {
        let (port, bit) = gpio::pin_parts(pin)?;
        debug!("interrupt pin {pin}: enabled={enabled}");
        self.read_modify_write(Register::GPINTEN, port, |v| {
            if enabled {
                v | 1 << bit
            } else {
                v & !(1 << bit)
            }
        })?;
        Ok(())
    }

    /// Programs the full interrupt-on-change criteria for a pin.
    ///
    /// The register bits are set according to the following table, with
    /// GPINTEN written last so half-programmed criteria cannot raise a
    /// spurious interrupt:
    ///
    /// | Mode                          | GPINTEN | INTCON | DEFVAL |
    /// |-------------------------------|:-------:|:------:|:------:|
    /// | [`InterruptMode::Disabled`]   |   `L`   |  `X`   |  `X`   |
    /// | [`InterruptMode::ActiveHigh`] |   `H`   |  `H`   |  `L`   |
    /// | [`InterruptMode::ActiveLow`]  |   `H`   |  `H`   |  `H`   |
    /// | [`InterruptMode::BothEdges`]  |   `H`   |  `L`   |  `X`   |
    ///
    /// `X` = register unchanged when setting this mode.
    pub fn set_interrupt_mode(&mut self, pin: u8, mode: InterruptMode) -> Result<()> {
        let (port, bit) = gpio::pin_parts(pin)?;
        let mask = 1 << bit;
        debug!("interrupt pin {pin}: mode {mode:?}");
        match mode {
            InterruptMode::Disabled => {
                self.read_modify_write(Register::GPINTEN, port, |v| v & !mask)?;
            }
            InterruptMode::ActiveHigh => {
                self.read_modify_write(Register::INTCON, port, |v| v | mask)?;
                self.read_modify_write(Register::DEFVAL, port, |v| v & !mask)?;
                self.read_modify_write(Register::GPINTEN, port, |v| v | mask)?;
            }
            InterruptMode::ActiveLow => {
                self.read_modify_write(Register::INTCON, port, |v| v | mask)?;
                self.read_modify_write(Register::DEFVAL, port, |v| v | mask)?;
                self.read_modify_write(Register::GPINTEN, port, |v| v | mask)?;
            }
            InterruptMode::BothEdges => {
                self.read_modify_write(Register::INTCON, port, |v| v & !mask)?;
                self.read_modify_write(Register::GPINTEN, port, |v| v | mask)?;
            }
        }
        Ok(())
    }

    /// Reads the port state captured at interrupt time, as `(port A, port B)`
    /// bytes.
    ///
    /// Reading INTCAP clears the chip's pending-interrupt condition, so the
    /// result is never cached and every call performs two fresh reads.
    pub fn read_captured_gpio(&mut self) -> Result<(u8, u8)> {
        let a = self.read_register(Register::INTCAP, Port::A)?;
        let b = self.read_register(Register::INTCAP, Port::B)?;
        debug!("captured GPIO: A=0x{a:02X} B=0x{b:02X}");
        Ok((a, b))
    }

    /// Per-pin view of [`read_captured_gpio`](Self::read_captured_gpio),
    /// indexed by logical pin number.
    pub fn read_captured_pins(&mut self) -> Result<[bool; 16]> {
        let (a, b) = self.read_captured_gpio()?;
        let word = u16::from(b) << 8 | u16::from(a);
        let mut levels = [false; 16];
        for (pin, level) in levels.iter_mut().enumerate() {
            *level = word & (1 << pin) != 0;
        }
        Ok(levels)
    }

    /// Reads the interrupt flag registers as `(port A, port B)` bytes.
    ///
    /// A set bit marks the pin that caused the pending interrupt. Always
    /// read fresh from the chip.
    pub fn read_interrupt_flags(&mut self) -> Result<(u8, u8)> {
        let a = self.read_register(Register::INTF, Port::A)?;
        let b = self.read_register(Register::INTF, Port::B)?;
        trace!("interrupt flags: A=0x{a:02X} B=0x{b:02X}");
        Ok((a, b))
    }

    /// Lowest-numbered pin with a pending interrupt flag, if any.
    pub fn interrupt_source(&mut self) -> Result<Option<u8>> {
        let (a, b) = self.read_interrupt_flags()?;
        let flags = u16::from(b) << 8 | u16::from(a);
        if flags == 0 {
            Ok(None)
        } else {
            Ok(Some(flags.trailing_zeros() as u8))
        }
    }

    // --- Device configuration ---

    /// Applies device-wide options with a single IOCON write.
    ///
    /// The write is addressed under the bank mode active when `configure` is
    /// called; if a [`ConfigOption::Bank`] switch is among the options, the
    /// new layout takes effect for every subsequent register access. The
    /// mirror's contents stay valid across the switch since only addresses
    /// change, not register meaning.
    pub fn configure(&mut self, options: &[ConfigOption]) -> Result<()> {
        if options.is_empty() {
            return Ok(());
        }
        let current =
            IOCON::from_bits_truncate(self.mirrored_or_read(Register::IOCON, Port::A)?);
        let mut next = current;
        let mut bank = self.bank;
        for &option in options {
            match option {
                ConfigOption::Bank(mode) => {
                    next.set(IOCON::BANK, mode == BankMode::Segregated);
                    bank = mode;
                }
                ConfigOption::MirrorInterrupts(on) => next.set(IOCON::MIRROR, on),
                ConfigOption::OpenDrainInterrupts(on) => next.set(IOCON::ODR, on),
                ConfigOption::InterruptPolarity(polarity) => {
                    next.set(IOCON::INTPOL, polarity == InterruptPolarity::ActiveHigh)
                }
                ConfigOption::HardwareAddressing(on) => next.set(IOCON::HAEN, on),
                ConfigOption::DisableSlewRate(on) => next.set(IOCON::DISSLW, on),
            }
        }
        if next != current {
            debug!("IOCON 0x{:02X} -> 0x{:02X}", current.bits(), next.bits());
            self.write_register(Register::IOCON, Port::A, next.bits())?;
            self.mirror.commit(Register::IOCON, Port::A, next.bits());
        }
        self.bank = bank;
        Ok(())
    }
}
