//! Shared test utilities for building minimal iNES ROM images.
//!
//! These helpers de-duplicate iNES construction logic across tests in the
//! CPU, Bus, Cartridge and machine modules.
//!
//! Notes on iNES header fields used here:
//! - bytes[0..4] = b"NES\x1A"
//! - byte 4 = PRG ROM size in 16 KiB units
//! - byte 5 = CHR ROM size in 8 KiB units (0 => the loader allocates 8 KiB CHR RAM)
//! - byte 6 = Flags 6 (mirroring, trainer, mapper low nibble)
//! - byte 7 = Flags 7 (NES 2.0 indicator, mapper high nibble)
//! - byte 8 = PRG RAM size, or extended bank-count bits for NES 2.0
//!
//! Vectors:
//! - For 16 KiB PRG (NROM-128): vectors are at PRG offset 0x3FFA..=0x3FFF
//! - For 32 KiB PRG (NROM-256): vectors are at PRG offset 0x7FFA..=0x7FFF

#![allow(dead_code)]

use crate::cpu::{Cpu, CpuBus};

const HEADER_LEN: usize = 16;

/// 64 KiB of flat RAM for exercising the CPU without the NES memory map.
pub struct FlatBus {
    pub mem: Vec<u8>,
    /// Every address read, in order.
    pub reads: Vec<u16>,
}

impl FlatBus {
    pub fn new() -> Self {
        Self {
            mem: vec![0; 0x10000],
            reads: Vec::new(),
        }
    }

    /// Place `program` at `origin` and point the RESET vector at it.
    pub fn with_program(origin: u16, program: &[u8]) -> Self {
        let mut bus = Self::new();
        let start = origin as usize;
        bus.mem[start..start + program.len()].copy_from_slice(program);
        bus.set_reset_vector(origin);
        bus
    }

    pub fn set_reset_vector(&mut self, addr: u16) {
        write_le_u16(&mut self.mem, 0xFFFC, addr);
    }

    /// Step until the instruction (or interrupt sequence) in flight has finished,
    /// returning the number of cycles it took.
    pub fn run_until_complete(&mut self, cpu: &mut Cpu) -> u32 {
        let mut cycles = 0;
        loop {
            cpu.step(self);
            cycles += 1;
            if cpu.complete() {
                return cycles;
            }
        }
    }
}

impl CpuBus for FlatBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.reads.push(addr);
        self.mem[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.mem[addr as usize] = data;
    }
}

/// Build a minimal iNES image with configurable PRG/CHR sizes and flags.
/// PRG is filled with 0xAA and CHR with 0xCC.
pub fn build_ines(
    prg_16k: usize,
    chr_8k: usize,
    flags6: u8,
    flags7: u8,
    prg_ram_8k: u8,
    trainer: Option<&[u8; 512]>,
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(
        HEADER_LEN + trainer.map_or(0, |_| 512) + prg_16k * 0x4000 + chr_8k * 0x2000,
    );

    bytes.extend_from_slice(b"NES\x1A");
    bytes.push(prg_16k as u8);
    bytes.push(chr_8k as u8);
    bytes.push(flags6);
    bytes.push(flags7);
    bytes.push(prg_ram_8k);
    bytes.extend_from_slice(&[0u8; 7]);

    if let Some(t) = trainer {
        bytes.extend_from_slice(t);
    }
    bytes.resize(bytes.len() + prg_16k * 0x4000, 0xAA);
    bytes.resize(bytes.len() + chr_8k * 0x2000, 0xCC);
    bytes
}

/// Build an image for `mapper_id` whose every PRG byte holds its 8 KiB bank
/// index and every CHR byte holds its 1 KiB bank index, so bank switching is
/// visible in plain reads.
pub fn build_banked_rom(mapper_id: u8, prg_16k: usize, chr_8k: usize) -> Vec<u8> {
    let mut rom = build_ines(prg_16k, chr_8k, mapper_id << 4, mapper_id & 0xF0, 0, None);
    let prg_end = HEADER_LEN + prg_16k * 0x4000;
    for (i, b) in rom[HEADER_LEN..prg_end].iter_mut().enumerate() {
        *b = (i / 0x2000) as u8;
    }
    for (i, b) in rom[prg_end..].iter_mut().enumerate() {
        *b = (i / 0x0400) as u8;
    }
    rom
}

/// Build a simple NROM image that injects a caller-provided PRG program
/// (up to 16 KiB) into a single 16 KiB PRG bank and sets vectors to the provided or
/// default addresses (RESET/NMI/IRQ point to 0x8000 by default).
pub fn build_nrom_with_prg(
    prg: &[u8],
    chr_8k: usize,
    prg_ram_8k: u8,
    vectors: Option<(u16, u16, u16)>,
) -> Vec<u8> {
    assert!(
        prg.len() <= 16 * 1024,
        "Program must fit within a 16 KiB PRG bank"
    );

    let mut rom = build_ines(1, chr_8k, 0, 0, prg_ram_8k, None);
    let prg_start = HEADER_LEN;
    let prg_end = prg_start + 0x4000;
    rom[prg_start..prg_start + prg.len()].copy_from_slice(prg);

    let (reset, nmi, irq) = vectors.unwrap_or((0x8000, 0x8000, 0x8000));
    set_vectors_in_prg(&mut rom[prg_start..prg_end], reset, nmi, irq);
    rom
}

/// Write CPU vectors (NMI, RESET, IRQ/BRK) into a PRG slice that is either
/// 16 KiB or 32 KiB. Panics if PRG length is something else.
pub fn set_vectors_in_prg(prg: &mut [u8], reset: u16, nmi: u16, irq: u16) {
    let base = match prg.len() {
        0x4000 => 0x3FFA,
        0x8000 => 0x7FFA,
        other => panic!(
            "Unsupported PRG length for vector placement: {} bytes (expected 16 KiB or 32 KiB)",
            other
        ),
    };
    write_le_u16(prg, base, nmi);
    write_le_u16(prg, base + 2, reset);
    write_le_u16(prg, base + 4, irq);
}

#[inline]
fn write_le_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_basic_ines() {
        let rom = build_ines(2, 1, 0x01, 0x00, 1, None);
        assert_eq!(&rom[0..4], b"NES\x1A");
        assert_eq!(rom[4], 2);
        assert_eq!(rom[5], 1);
        assert_eq!(rom[6], 0x01);
        assert_eq!(rom[8], 1);
        assert_eq!(rom.len(), 16 + 2 * 0x4000 + 0x2000);
    }

    #[test]
    fn banked_rom_labels_each_window() {
        let rom = build_banked_rom(4, 2, 1);
        assert_eq!(rom[6] >> 4, 4);
        assert_eq!(rom[16], 0);
        assert_eq!(rom[16 + 0x2000], 1);
        assert_eq!(rom[16 + 0x7FFF], 3);
        assert_eq!(rom[16 + 0x8000 + 0x0400], 1);
    }

    #[test]
    fn writes_vectors_for_16k_prg() {
        let mut prg = vec![0u8; 0x4000];
        set_vectors_in_prg(&mut prg, 0x8123, 0x8456, 0x8ABC);
        assert_eq!(&prg[0x3FFA..], &[0x56, 0x84, 0x23, 0x81, 0xBC, 0x8A]);
    }

    #[test]
    fn nrom_program_lands_at_prg_start() {
        let rom = build_nrom_with_prg(&[0xEA, 0x4C], 0, 0, Some((0x8000, 0x9000, 0xA000)));
        assert_eq!(rom[16], 0xEA);
        assert_eq!(rom[17], 0x4C);
        assert_eq!(rom[16 + 0x3FFC], 0x00);
        assert_eq!(rom[16 + 0x3FFD], 0x80);
    }
}
