/*!
Mapper subsystem: address-translation trait and the closed set of supported boards.

Purpose:
- Decouple cartridge memory ownership from bank selection. A mapper never touches PRG
  or CHR bytes itself; it translates a CPU or PPU address into an offset that the
  `Cartridge` then applies to its own arrays.
- Provide a stable interface the Cartridge can call for every CPU/PPU transaction.

Contract:
- `cpu_map_read` returns `Some(MapRead::Prg(offset))` for PRG accesses,
  `Some(MapRead::Data(v))` when the mapper produced the value itself (on-board RAM),
  or `None` when the address is not claimed.
- `cpu_map_write` returns `Some(MapWrite::Prg(offset))` to store into PRG memory,
  `Some(MapWrite::Consumed)` when the mapper absorbed the write, or `None`.
  Register writes may mutate mapper state and still return `None`.
- `ppu_map_read` / `ppu_map_write` return an offset into CHR memory, or `None`.

Integration:
- `Board` wraps each concrete mapper and forwards every call with a `match`.
*/

use crate::mappers::{Cnrom, Gxrom, Mmc1, Mmc3, Nrom, Uxrom};
use crate::savestate::{SaveStateError, StateReader, StateWriter};

/// Nametable arrangement requested by a mapper. `Hardware` defers to the
/// mirroring wired on the cartridge board (taken from the ROM header).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MapperMirroring {
    #[default]
    Hardware,
    Horizontal,
    Vertical,
    OneScreenLo,
    OneScreenHi,
}

impl MapperMirroring {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            MapperMirroring::Hardware => 0,
            MapperMirroring::Horizontal => 1,
            MapperMirroring::Vertical => 2,
            MapperMirroring::OneScreenLo => 3,
            MapperMirroring::OneScreenHi => 4,
        }
    }

    pub(crate) fn from_byte(v: u8) -> Self {
        match v {
            1 => MapperMirroring::Horizontal,
            2 => MapperMirroring::Vertical,
            3 => MapperMirroring::OneScreenLo,
            4 => MapperMirroring::OneScreenHi,
            _ => MapperMirroring::Hardware,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MapRead {
    /// Offset into PRG memory.
    Prg(usize),
    /// Value supplied directly by the mapper.
    Data(u8),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MapWrite {
    /// Offset into PRG memory.
    Prg(usize),
    /// The mapper absorbed the write.
    Consumed,
}

pub trait Mapper {
    /// iNES mapper number.
    fn mapper_id(&self) -> u8;

    fn cpu_map_read(&self, addr: u16) -> Option<MapRead>;

    fn cpu_map_write(&mut self, addr: u16, data: u8) -> Option<MapWrite>;

    fn ppu_map_read(&self, addr: u16) -> Option<usize>;

    fn ppu_map_write(&self, addr: u16) -> Option<usize>;

    /// Return bank registers to their power-on values.
    fn reset(&mut self);

    fn mirror(&self) -> MapperMirroring {
        MapperMirroring::Hardware
    }

    fn irq_state(&self) -> bool {
        false
    }

    fn irq_clear(&mut self) {}

    /// Called once per visible scanline while rendering is enabled.
    fn scanline(&mut self) {}

    fn save(&self, w: &mut StateWriter);

    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError>;
}

/// Every mapper the core understands.
#[derive(Clone, Debug)]
pub enum Board {
    Nrom(Nrom),
    Mmc1(Mmc1),
    Uxrom(Uxrom),
    Cnrom(Cnrom),
    Mmc3(Mmc3),
    Gxrom(Gxrom),
}

impl Board {
    /// Build the mapper for `mapper_id`, or `None` if the board is not supported.
    pub fn for_id(mapper_id: u8, prg_banks: u16, chr_banks: u16) -> Option<Self> {
        let board = match mapper_id {
            0 => Board::Nrom(Nrom::new(prg_banks, chr_banks)),
            1 => Board::Mmc1(Mmc1::new(prg_banks, chr_banks)),
            2 => Board::Uxrom(Uxrom::new(prg_banks, chr_banks)),
            3 => Board::Cnrom(Cnrom::new(prg_banks, chr_banks)),
            4 => Board::Mmc3(Mmc3::new(prg_banks, chr_banks)),
            66 => Board::Gxrom(Gxrom::new(prg_banks, chr_banks)),
            _ => return None,
        };
        Some(board)
    }

    fn inner(&self) -> &dyn Mapper {
        match self {
            Board::Nrom(m) => m,
            Board::Mmc1(m) => m,
            Board::Uxrom(m) => m,
            Board::Cnrom(m) => m,
            Board::Mmc3(m) => m,
            Board::Gxrom(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Mapper {
        match self {
            Board::Nrom(m) => m,
            Board::Mmc1(m) => m,
            Board::Uxrom(m) => m,
            Board::Cnrom(m) => m,
            Board::Mmc3(m) => m,
            Board::Gxrom(m) => m,
        }
    }
}

impl Mapper for Board {
    fn mapper_id(&self) -> u8 {
        self.inner().mapper_id()
    }

    fn cpu_map_read(&self, addr: u16) -> Option<MapRead> {
        self.inner().cpu_map_read(addr)
    }

    fn cpu_map_write(&mut self, addr: u16, data: u8) -> Option<MapWrite> {
        self.inner_mut().cpu_map_write(addr, data)
    }

    fn ppu_map_read(&self, addr: u16) -> Option<usize> {
        self.inner().ppu_map_read(addr)
    }

    fn ppu_map_write(&self, addr: u16) -> Option<usize> {
        self.inner().ppu_map_write(addr)
    }

    fn reset(&mut self) {
        self.inner_mut().reset()
    }

    fn mirror(&self) -> MapperMirroring {
        self.inner().mirror()
    }

    fn irq_state(&self) -> bool {
        self.inner().irq_state()
    }

    fn irq_clear(&mut self) {
        self.inner_mut().irq_clear()
    }

    fn scanline(&mut self) {
        self.inner_mut().scanline()
    }

    fn save(&self, w: &mut StateWriter) {
        self.inner().save(w)
    }

    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError> {
        self.inner_mut().load(r)
    }
}

/// Shared helper for the bank-count prefix every mapper dump starts with.
pub(crate) fn save_bank_counts(w: &mut StateWriter, prg_banks: u16, chr_banks: u16) {
    w.u16(prg_banks);
    w.u16(chr_banks);
}

pub(crate) fn load_bank_counts(r: &mut StateReader<'_>) -> Result<(u16, u16), SaveStateError> {
    Ok((r.u16()?, r.u16()?))
}
