//! Shared helpers for exercising the driver against mock SPI transports.
#![allow(dead_code)]

use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
use mcp23s17_spi::Mcp23s17;

/// Control byte for register writes at the default opcode address 0x20.
pub const WRITE: u8 = 0x40;
/// Control byte for register reads at the default opcode address 0x20.
pub const READ: u8 = 0x41;

/// One chip-select assert/release cycle per SPI frame.
pub fn cs_cycles(frames: usize) -> Vec<PinTransaction> {
    let mut transactions = Vec::with_capacity(frames * 2);
    for _ in 0..frames {
        transactions.push(PinTransaction::set(State::Low));
        transactions.push(PinTransaction::set(State::High));
    }
    transactions
}

/// Expected bus transactions for one register write frame.
pub fn write_frame(opcode: u8, reg_addr: u8, value: u8) -> Vec<SpiTransaction<u8>> {
    vec![
        SpiTransaction::write_vec(vec![opcode, reg_addr, value]),
        SpiTransaction::flush(),
    ]
}

/// Expected bus transactions for one register read frame answering `value`.
pub fn read_frame(opcode: u8, reg_addr: u8, value: u8) -> Vec<SpiTransaction<u8>> {
    vec![
        SpiTransaction::transfer_in_place(vec![opcode, reg_addr, 0x00], vec![0x00, 0x00, value]),
        SpiTransaction::flush(),
    ]
}

/// Driver at the default opcode address over fully scripted mocks.
pub fn driver(
    spi: &[SpiTransaction<u8>],
    cs: &[PinTransaction],
) -> Mcp23s17<SpiMock<u8>, PinMock> {
    driver_at(0x20, spi, cs)
}

/// Driver at a specific opcode address over fully scripted mocks.
pub fn driver_at(
    address: u8,
    spi: &[SpiTransaction<u8>],
    cs: &[PinTransaction],
) -> Mcp23s17<SpiMock<u8>, PinMock> {
    let _ = env_logger::builder().is_test(true).try_init();
    Mcp23s17::new(SpiMock::new(spi), PinMock::new(cs), address).unwrap()
}

/// Verifies that every scripted transaction was consumed.
pub fn finish(driver: Mcp23s17<SpiMock<u8>, PinMock>) {
    let (mut spi, mut cs) = driver.release();
    spi.done();
    cs.done();
}
