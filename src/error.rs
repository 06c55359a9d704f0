use thiserror::Error;

/// Errors that can occur when driving an MCP23S17.
///
/// Transport faults are reported with the `embedded-hal` error kind of the
/// failing layer. They are never retried internally: a bus fault on a GPIO
/// expander points at a wiring or electrical problem the driver cannot
/// correct, so the caller gets it immediately.
#[derive(Error, Debug)]
pub enum Error {
    /// The SPI bus reported a fault while exchanging a command frame.
    #[error("SPI transport fault during register access: {0:?}")]
    Transport(embedded_hal::spi::ErrorKind),
    /// The chip-select line could not be driven.
    #[error("chip-select line fault: {0:?}")]
    ChipSelect(embedded_hal::digital::ErrorKind),
    /// Pin number is outside the valid range for the chip.
    #[error("GPIO pin {pin} out of range (0-15)")]
    PinOutOfRange {
        /// The invalid pin number that was specified.
        pin: u8,
    },
    /// Attempt to drive a pin that is configured as an input.
    #[error("GPIO pin {pin} is configured as an input; call setup() with GpioDirection::Output first")]
    PinNotOutput {
        /// The pin whose direction bit indicates input.
        pin: u8,
    },
    /// Requested device configuration cannot be expressed on this chip.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
}

/// Result type alias for MCP23S17 operations.
pub type Result<T> = std::result::Result<T, Error>;

// Helper for the construction-time opcode address check
pub(crate) fn unsupported_address(address: u8) -> Error {
    Error::UnsupportedConfiguration(format!(
        "opcode address 0x{address:02X} out of range (0x20-0x27, set by the A2..A0 strap pins)"
    ))
}
