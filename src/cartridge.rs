/*!
Cartridge with iNES loader and Mapper integration.

Features:
- Parse the 16-byte iNES header from bytes or a file path
- Skip the optional 512-byte trainer
- Detect the two header formats: plain iNES (bank counts in bytes 4/5) and NES 2.0
  (extra bank-count bits packed into byte 8)
- Own PRG and CHR memory; allocate 8 KiB of CHR RAM when the header declares no CHR banks
- Construct the matching `Board` and route every CPU/PPU access through its translation

Notes:
- An unknown mapper number still produces a usable NROM cartridge, but it is handed back
  inside `CartridgeError::UnsupportedMapper` so the caller decides whether to run it.
- Mapped offsets are wrapped to the backing array length, so a misbehaving bank select
  never indexes out of bounds.
*/

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::mapper::{Board, MapRead, MapWrite, Mapper, MapperMirroring};
use crate::mappers::Nrom;
use crate::savestate::{SaveStateError, Snapshot, StateReader, StateWriter};

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_BANK_LEN: usize = 0x4000;
const CHR_BANK_LEN: usize = 0x2000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    OneScreenLo,
    OneScreenHi,
}

impl Mirroring {
    fn to_byte(self) -> u8 {
        match self {
            Mirroring::Horizontal => 0,
            Mirroring::Vertical => 1,
            Mirroring::OneScreenLo => 2,
            Mirroring::OneScreenHi => 3,
        }
    }

    fn from_byte(v: u8) -> Self {
        match v {
            1 => Mirroring::Vertical,
            2 => Mirroring::OneScreenLo,
            3 => Mirroring::OneScreenHi,
            _ => Mirroring::Horizontal,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InesVersion {
    Ines1,
    Ines2,
}

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("failed to read ROM: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid iNES header magic (expected NES<1A>)")]
    InvalidHeader,
    #[error("ROM image truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("mapper {mapper_id} is not supported")]
    UnsupportedMapper {
        mapper_id: u8,
        /// The same image wired to NROM, for callers that want to try it anyway.
        fallback: Box<Cartridge>,
    },
}

#[derive(Clone)]
pub struct Cartridge {
    board: Board,
    prg: Vec<u8>,
    chr: Vec<u8>,

    // Metadata
    mapper_id: u8,
    prg_banks: u16,
    chr_banks: u16,
    hw_mirroring: Mirroring,
    ines_version: InesVersion,
    path: Option<PathBuf>,
}

// Debug implemented manually so ROM contents are not dumped
impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("mapper_id", &self.mapper_id)
            .field("prg_banks", &self.prg_banks)
            .field("chr_banks", &self.chr_banks)
            .field("hw_mirroring", &self.hw_mirroring)
            .field("ines_version", &self.ines_version)
            .field("path", &self.path)
            .finish()
    }
}

impl Cartridge {
    // -------------- Construction --------------

    pub fn from_ines_file(path: impl AsRef<Path>) -> Result<Self, CartridgeError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        match Self::from_ines_bytes(&data) {
            Ok(mut cart) => {
                cart.path = Some(path.to_path_buf());
                Ok(cart)
            }
            Err(CartridgeError::UnsupportedMapper {
                mapper_id,
                mut fallback,
            }) => {
                fallback.path = Some(path.to_path_buf());
                Err(CartridgeError::UnsupportedMapper {
                    mapper_id,
                    fallback,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_LEN {
            return Err(CartridgeError::Truncated {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }
        if &data[0..4] != b"NES\x1A" {
            return Err(CartridgeError::InvalidHeader);
        }

        let flags6 = data[6];
        let flags7 = data[7];
        let mapper_id = (flags7 & 0xF0) | (flags6 >> 4);
        let hw_mirroring = if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let ines_version = if flags7 & 0x0C == 0x08 {
            InesVersion::Ines2
        } else {
            InesVersion::Ines1
        };
        let (prg_banks, chr_banks) = match ines_version {
            InesVersion::Ines1 => (data[4] as u16, data[5] as u16),
            InesVersion::Ines2 => (
                ((data[8] as u16 & 0x07) << 8) | data[4] as u16,
                ((data[8] as u16 & 0x38) << 8) | data[5] as u16,
            ),
        };

        let mut offset = HEADER_LEN;
        if flags6 & 0x04 != 0 {
            offset += TRAINER_LEN;
        }

        let prg_len = prg_banks as usize * PRG_BANK_LEN;
        let chr_rom_len = chr_banks as usize * CHR_BANK_LEN;
        let expected = offset + prg_len + chr_rom_len;
        if data.len() < expected {
            return Err(CartridgeError::Truncated {
                expected,
                actual: data.len(),
            });
        }

        let prg = data[offset..offset + prg_len].to_vec();
        offset += prg_len;
        let chr = if chr_banks == 0 {
            vec![0; CHR_BANK_LEN]
        } else {
            data[offset..offset + chr_rom_len].to_vec()
        };

        let board = Board::for_id(mapper_id, prg_banks, chr_banks);
        let supported = board.is_some();
        let mut cart = Self {
            board: board.unwrap_or_else(|| Board::Nrom(Nrom::new(prg_banks, chr_banks))),
            prg,
            chr,
            mapper_id,
            prg_banks,
            chr_banks,
            hw_mirroring,
            ines_version,
            path: None,
        };

        if !supported {
            warn!("mapper {mapper_id} unsupported, falling back to NROM");
            cart.reset();
            return Err(CartridgeError::UnsupportedMapper {
                mapper_id,
                fallback: Box::new(cart),
            });
        }

        info!(
            "loaded cartridge: mapper {} PRG {}x16K CHR {}x8K {:?} {:?}",
            mapper_id, prg_banks, chr_banks, hw_mirroring, ines_version
        );
        Ok(cart)
    }

    /// A cartridge with no memory, used as the target when a save state is restored
    /// onto a machine that has no cartridge yet.
    pub(crate) fn blank() -> Self {
        Self {
            board: Board::Nrom(Nrom::new(0, 0)),
            prg: Vec::new(),
            chr: Vec::new(),
            mapper_id: 0,
            prg_banks: 0,
            chr_banks: 0,
            hw_mirroring: Mirroring::Horizontal,
            ines_version: InesVersion::Ines1,
            path: None,
        }
    }

    // -------------- Accessors --------------

    pub fn mapper_id(&self) -> u8 {
        self.mapper_id
    }

    pub fn prg_banks(&self) -> u16 {
        self.prg_banks
    }

    pub fn chr_banks(&self) -> u16 {
        self.chr_banks
    }

    pub fn ines_version(&self) -> InesVersion {
        self.ines_version
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn chr_is_ram(&self) -> bool {
        self.chr_banks == 0
    }

    /// Effective nametable mirroring: the mapper's choice unless it defers to the board.
    pub fn mirroring(&self) -> Mirroring {
        match self.board.mirror() {
            MapperMirroring::Hardware => self.hw_mirroring,
            MapperMirroring::Horizontal => Mirroring::Horizontal,
            MapperMirroring::Vertical => Mirroring::Vertical,
            MapperMirroring::OneScreenLo => Mirroring::OneScreenLo,
            MapperMirroring::OneScreenHi => Mirroring::OneScreenHi,
        }
    }

    // -------------- CPU / PPU access --------------

    /// CPU read in cartridge space; `None` when the mapper does not claim `addr`.
    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        match self.board.cpu_map_read(addr)? {
            MapRead::Data(v) => Some(v),
            MapRead::Prg(offset) => Some(wrapped(&self.prg, offset).map_or(0, |i| self.prg[i])),
        }
    }

    /// CPU write in cartridge space; `true` when the cartridge claimed the write.
    pub fn cpu_write(&mut self, addr: u16, data: u8) -> bool {
        match self.board.cpu_map_write(addr, data) {
            Some(MapWrite::Consumed) => true,
            Some(MapWrite::Prg(offset)) => {
                if let Some(i) = wrapped(&self.prg, offset) {
                    self.prg[i] = data;
                }
                true
            }
            None => false,
        }
    }

    pub fn ppu_read(&self, addr: u16) -> Option<u8> {
        let offset = self.board.ppu_map_read(addr)?;
        Some(wrapped(&self.chr, offset).map_or(0, |i| self.chr[i]))
    }

    pub fn ppu_write(&mut self, addr: u16, data: u8) -> bool {
        let Some(offset) = self.board.ppu_map_write(addr) else {
            return false;
        };
        if let Some(i) = wrapped(&self.chr, offset) {
            self.chr[i] = data;
        }
        true
    }

    // -------------- Mapper hooks --------------

    pub fn reset(&mut self) {
        self.board.reset();
    }

    pub fn irq_state(&self) -> bool {
        self.board.irq_state()
    }

    pub fn irq_clear(&mut self) {
        self.board.irq_clear();
    }

    pub fn scanline(&mut self) {
        self.board.scanline();
    }
}

fn wrapped(mem: &[u8], offset: usize) -> Option<usize> {
    (!mem.is_empty()).then(|| offset % mem.len())
}

impl Snapshot for Cartridge {
    fn save(&self, w: &mut StateWriter) {
        let path = self
            .path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        w.sized_bytes(path.as_bytes());
        w.u8(self.hw_mirroring.to_byte());
        // The board actually wired up, which differs from the header for a fallback.
        w.u8(self.board.mapper_id());
        w.u16(self.prg_banks);
        w.u16(self.chr_banks);
        w.sized_bytes(&self.prg);
        w.sized_bytes(&self.chr);
        self.board.save(w);
    }

    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError> {
        let path = r.sized_bytes()?;
        let hw_mirroring = Mirroring::from_byte(r.u8()?);
        let mapper_id = r.u8()?;
        let prg_banks = r.u16()?;
        let chr_banks = r.u16()?;
        let prg = r.sized_bytes()?;
        let chr = r.sized_bytes()?;

        let mut board = if self.board.mapper_id() == mapper_id {
            self.board.clone()
        } else {
            Board::for_id(mapper_id, prg_banks, chr_banks)
                .ok_or(SaveStateError::UnsupportedMapper(mapper_id))?
        };
        board.load(r)?;

        let path = String::from_utf8_lossy(&path).into_owned();
        self.path = (!path.is_empty()).then(|| PathBuf::from(path));
        self.hw_mirroring = hw_mirroring;
        self.mapper_id = mapper_id;
        self.prg_banks = prg_banks;
        self.chr_banks = chr_banks;
        self.prg = prg;
        self.chr = chr;
        self.board = board;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{build_banked_rom, build_ines, build_nrom_with_prg};

    #[test]
    fn parses_basic_header() {
        let rom = build_ines(2, 1, 0x01, 0x00, 1, None);
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        assert_eq!(cart.mapper_id(), 0);
        assert_eq!(cart.prg_banks(), 2);
        assert_eq!(cart.chr_banks(), 1);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
        assert_eq!(cart.ines_version(), InesVersion::Ines1);
        assert!(!cart.chr_is_ram());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut rom = build_ines(1, 1, 0, 0, 0, None);
        rom[3] = 0x00;
        assert!(matches!(
            Cartridge::from_ines_bytes(&rom),
            Err(CartridgeError::InvalidHeader)
        ));
    }

    #[test]
    fn rejects_short_image() {
        let rom = build_ines(2, 1, 0, 0, 0, None);
        let err = Cartridge::from_ines_bytes(&rom[..0x5000]).unwrap_err();
        assert!(matches!(
            err,
            CartridgeError::Truncated {
                expected: 0xA010,
                actual: 0x5000
            }
        ));
    }

    #[test]
    fn trainer_is_skipped() {
        let trainer = [0x11u8; 512];
        let mut rom = build_ines(1, 1, 0x04, 0x00, 0, Some(&trainer));
        rom[16 + 512] = 0x77;
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        assert_eq!(cart.cpu_read(0x8000), Some(0x77));
    }

    #[test]
    fn mapper_id_combines_both_nibbles() {
        // 66 = 0x42: high nibble 4 in flags7, low nibble 2 in flags6
        let rom = build_ines(2, 1, 0x20, 0x40, 0, None);
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        assert_eq!(cart.mapper_id(), 66);
    }

    #[test]
    fn nes2_header_uses_extended_bank_bits() {
        let mut rom = build_ines(2, 1, 0x00, 0x08, 0, None);
        rom[8] = 0x00;
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        assert_eq!(cart.ines_version(), InesVersion::Ines2);
        assert_eq!(cart.prg_banks(), 2);

        rom[8] = 0x01; // PRG count now 0x102 banks, far larger than the image
        assert!(matches!(
            Cartridge::from_ines_bytes(&rom),
            Err(CartridgeError::Truncated { .. })
        ));
    }

    #[test]
    fn chr_ram_allocated_and_writable_when_no_chr_banks() {
        let rom = build_ines(1, 0, 0, 0, 0, None);
        let mut cart = Cartridge::from_ines_bytes(&rom).unwrap();
        assert!(cart.chr_is_ram());
        assert_eq!(cart.ppu_read(0x1FFF), Some(0));
        assert!(cart.ppu_write(0x1FFF, 0x3C));
        assert_eq!(cart.ppu_read(0x1FFF), Some(0x3C));
    }

    #[test]
    fn chr_rom_is_not_writable() {
        let rom = build_ines(1, 1, 0, 0, 0, None);
        let mut cart = Cartridge::from_ines_bytes(&rom).unwrap();
        assert!(!cart.ppu_write(0x0000, 0x01));
        assert_eq!(cart.ppu_read(0x0000), Some(0xCC));
    }

    #[test]
    fn nrom_128_mirrors_upper_window() {
        let rom = build_nrom_with_prg(&[0xA9, 0x42], 1, 0, None);
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        assert_eq!(cart.cpu_read(0x8000), Some(0xA9));
        assert_eq!(cart.cpu_read(0xC000), Some(0xA9));
        assert_eq!(cart.cpu_read(0xC001), Some(0x42));
        assert_eq!(cart.cpu_read(0x4020), None);
    }

    #[test]
    fn nrom_128_reads_match_across_both_halves() {
        let program: Vec<u8> = (0..0x4000u32).map(|i| (i * 7 + (i >> 8)) as u8).collect();
        let rom = build_nrom_with_prg(&program, 1, 0, None);
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        for offset in [0x0000u16, 0x0001, 0x00FF, 0x1234, 0x2000, 0x3FF9, 0x3FFC, 0x3FFF] {
            let low = cart.cpu_read(0x8000 + offset);
            assert!(low.is_some());
            assert_eq!(low, cart.cpu_read(0xC000 + offset), "offset {offset:#06X}");
        }
    }

    #[test]
    fn unknown_mapper_reports_failure_with_nrom_fallback() {
        let rom = build_ines(1, 1, 0x50, 0x00, 0, None);
        match Cartridge::from_ines_bytes(&rom) {
            Err(CartridgeError::UnsupportedMapper {
                mapper_id,
                fallback,
            }) => {
                assert_eq!(mapper_id, 5);
                assert_eq!(fallback.cpu_read(0x8000), Some(0xAA));
                assert_eq!(fallback.cpu_read(0xC000), Some(0xAA));
            }
            other => panic!("expected UnsupportedMapper, got {other:?}"),
        }
    }

    #[test]
    fn mapper_mirroring_overrides_header() {
        // MMC3 powers on horizontal regardless of the vertical header bit
        let rom = build_ines(2, 1, 0x41, 0x00, 0, None);
        let mut cart = Cartridge::from_ines_bytes(&rom).unwrap();
        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
        cart.cpu_write(0xA000, 0);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Cartridge::from_ines_file("/nonexistent/famicore/rom.nes").unwrap_err();
        assert!(matches!(err, CartridgeError::Io(_)));
    }

    #[test]
    fn snapshot_rebuilds_foreign_mapper() {
        let rom = build_banked_rom(2, 2, 1);
        let mut uxrom = Cartridge::from_ines_bytes(&rom).unwrap();
        uxrom.cpu_write(0x8000, 1);
        assert_eq!(uxrom.cpu_read(0x8000), Some(2));
        let mut w = StateWriter::new();
        uxrom.save(&mut w);
        let bytes = w.into_bytes();

        let mut target = Cartridge::blank();
        target.load(&mut StateReader::new(&bytes)).unwrap();
        assert_eq!(target.mapper_id(), 2);
        assert_eq!(target.prg_banks(), 2);
        assert_eq!(target.cpu_read(0x8000), Some(2));
        assert_eq!(target.cpu_read(0xC000), Some(2));
        assert_eq!(target.cpu_read(0xE000), Some(3));
    }
}
