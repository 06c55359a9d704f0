//! Tests for interrupt-on-change configuration and captured-state retrieval.

mod common;

use common::*;
use mcp23s17_spi::{InterruptMode, Port, Register};

#[test]
fn set_interrupt_is_idempotent() {
    let spi = [
        read_frame(READ, 0x04, 0x00),
        write_frame(WRITE, 0x04, 0x10),
    ]
    .concat();
    let mut expander = driver(&spi, &cs_cycles(2));

    expander.set_interrupt(4, true).unwrap();
    expander.set_interrupt(4, true).unwrap();

    assert_eq!(expander.mirrored(Register::GPINTEN, Port::A), Some(0x10));
    finish(expander);
}

#[test]
fn interrupt_mode_programs_criteria_before_enabling() {
    // GPINTEN must come last so half-programmed criteria cannot raise a
    // spurious interrupt; the expectation order enforces it.
    let spi = [
        read_frame(READ, 0x09, 0x00),  // INTCONB
        write_frame(WRITE, 0x09, 0x02),
        read_frame(READ, 0x07, 0x00),  // DEFVALB
        write_frame(WRITE, 0x07, 0x02),
        read_frame(READ, 0x05, 0x00),  // GPINTENB
        write_frame(WRITE, 0x05, 0x02),
    ]
    .concat();
    let mut expander = driver(&spi, &cs_cycles(6));

    expander
        .set_interrupt_mode(9, InterruptMode::ActiveLow)
        .unwrap();

    finish(expander);
}

#[test]
fn interrupt_mode_both_edges_leaves_defval_alone() {
    let spi = [
        read_frame(READ, 0x08, 0x00), // INTCONA already compare-to-previous
        read_frame(READ, 0x04, 0x00),
        write_frame(WRITE, 0x04, 0x10),
    ]
    .concat();
    let mut expander = driver(&spi, &cs_cycles(3));

    expander
        .set_interrupt_mode(4, InterruptMode::BothEdges)
        .unwrap();

    finish(expander);
}

#[test]
fn interrupt_mode_disabled_only_clears_enable_bit() {
    let spi = [
        read_frame(READ, 0x04, 0x10),
        write_frame(WRITE, 0x04, 0x00),
    ]
    .concat();
    let mut expander = driver(&spi, &cs_cycles(2));

    expander
        .set_interrupt_mode(4, InterruptMode::Disabled)
        .unwrap();

    finish(expander);
}

#[test]
fn captured_gpio_is_never_memoized() {
    // Reading INTCAP clears pending-interrupt state on the chip, so two
    // calls must perform two independent pairs of reads.
    let spi = [
        read_frame(READ, 0x10, 0xAA),
        read_frame(READ, 0x11, 0x55),
        read_frame(READ, 0x10, 0x00),
        read_frame(READ, 0x11, 0x00),
    ]
    .concat();
    let mut expander = driver(&spi, &cs_cycles(4));

    assert_eq!(expander.read_captured_gpio().unwrap(), (0xAA, 0x55));
    assert_eq!(expander.read_captured_gpio().unwrap(), (0x00, 0x00));

    // INTCAP never lands in the mirror
    assert_eq!(expander.mirrored(Register::INTCAP, Port::A), None);
    finish(expander);
}

#[test]
fn captured_pins_map_to_logical_numbers() {
    let spi = [
        read_frame(READ, 0x10, 0x01),
        read_frame(READ, 0x11, 0x80),
    ]
    .concat();
    let mut expander = driver(&spi, &cs_cycles(2));

    let levels = expander.read_captured_pins().unwrap();
    for (pin, level) in levels.iter().enumerate() {
        assert_eq!(*level, pin == 0 || pin == 15, "pin {pin}");
    }

    finish(expander);
}

#[test]
fn interrupt_source_resolves_flagged_pin() {
    let spi = [
        read_frame(READ, 0x0E, 0x00),
        read_frame(READ, 0x0F, 0x20), // GPB5 => logical pin 13
        read_frame(READ, 0x0E, 0x00),
        read_frame(READ, 0x0F, 0x00),
    ]
    .concat();
    let mut expander = driver(&spi, &cs_cycles(4));

    assert_eq!(expander.interrupt_source().unwrap(), Some(13));
    assert_eq!(expander.interrupt_source().unwrap(), None);

    finish(expander);
}
