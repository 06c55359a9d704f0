//! Internal constants for the SPI opcode layout.

// Every frame starts with `address << 1 | rw`. The fixed 0b0100 device
// prefix is part of the 7-bit opcode address (0x20 = 0b010_0000); the low
// three bits come from the A2..A0 strap pins.
/// Default opcode address with all strap pins tied low.
pub const DEFAULT_ADDRESS: u8 = 0x20;
/// Lowest valid opcode address.
pub const MIN_ADDRESS: u8 = 0x20;
/// Highest valid opcode address (all strap pins tied high).
pub const MAX_ADDRESS: u8 = 0x27;
/// Read/write flag in bit 0 of the control byte (1 = read).
pub const READ_BIT: u8 = 0x01;
