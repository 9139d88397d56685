#![doc = r#"
Bus module: CPU address decoding and system composition.

Overview
- `Bus` owns work RAM, the PPU, both controller ports, the cartridge slot, the
  master clock counter and the OAM DMA engine. The CPU is owned by the machine
  and lent to `Bus::tick`, so the bus is the only thing the frame loop drives.

CPU address map (priority order)
- Any address: the cartridge may claim the access (PRG banks, mapper RAM).
- $0000-$1FFF: 2 KiB RAM mirrored every $0800.
- $2000-$3FFF: PPU registers mirrored every 8 bytes.
- $4014 (write): OAM DMA page.
- $4016/$4017: controller ports. A write latches the port's live buttons into
  its shift register; a read returns the next bit, MSB first.
- Everything else in $4000-$401F and the expansion area reads 0 and ignores writes.

Modules
- clock: the per-tick schedule (PPU, CPU or DMA, interrupt delivery).
- dma: the OAM DMA state machine.
"#]

pub mod clock;
pub mod dma;


use log::info;

use crate::cartridge::Cartridge;
use crate::controller::Controller;
use crate::cpu::{Cpu, CpuBus};
use crate::ppu::Ppu;
use crate::savestate::{SaveStateError, Snapshot, StateReader, StateWriter};
use dma::OamDma;

const RAM_SIZE: usize = 0x0800;

#[derive(Clone)]
pub struct Bus {
    ram: [u8; RAM_SIZE],

    pub ppu: Ppu,
    pub controllers: [Controller; 2],
    cartridge: Option<Cartridge>,

    clock_counter: u32,
    dma: OamDma,
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("ppu", &self.ppu)
            .field("cartridge", &self.cartridge)
            .field("clock_counter", &self.clock_counter)
            .field("dma", &self.dma)
            .finish_non_exhaustive()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self {
            ram: [0; RAM_SIZE],
            ppu: Ppu::new(),
            controllers: [Controller::new(), Controller::new()],
            cartridge: None,
            clock_counter: 0,
            dma: OamDma::new(),
        }
    }

    /// Replace the cartridge. The caller is expected to reset afterwards.
    pub fn insert_cartridge(&mut self, cartridge: Cartridge) -> Option<Cartridge> {
        self.cartridge.replace(cartridge)
    }

    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.cartridge.as_ref()
    }

    pub fn cartridge_mut(&mut self) -> Option<&mut Cartridge> {
        self.cartridge.as_mut()
    }

    /// Power-cycle style reset: mapper, CPU, PPU, clock and DMA.
    pub fn reset(&mut self, cpu: &mut Cpu) {
        if let Some(cart) = self.cartridge.as_mut() {
            cart.reset();
        }
        cpu.reset(self);
        self.ppu.reset();
        self.clock_counter = 0;
        self.dma.reset();
        info!("system reset, PC=${:04X}", cpu.pc());
    }

    #[inline]
    pub fn dma_in_progress(&self) -> bool {
        self.dma.in_progress()
    }

    pub fn clock_counter(&self) -> u32 {
        self.clock_counter
    }

    pub fn set_controller(&mut self, port: usize, mask: u8) {
        if let Some(c) = self.controllers.get_mut(port) {
            c.set_buttons(mask);
        }
    }

    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        if let Some(data) = self.cartridge.as_ref().and_then(|c| c.cpu_read(addr)) {
            return data;
        }
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.cpu_read(&self.cartridge, addr & 0x0007),
            0x4016 | 0x4017 => self.controllers[(addr & 0x0001) as usize].read(),
            _ => 0,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, data: u8) {
        if self.cartridge.as_mut().is_some_and(|c| c.cpu_write(addr, data)) {
            return;
        }
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            0x2000..=0x3FFF => self.ppu.cpu_write(&mut self.cartridge, addr & 0x0007, data),
            0x4014 => self.dma.start(data),
            0x4016 | 0x4017 => self.controllers[(addr & 0x0001) as usize].latch(),
            _ => {}
        }
    }
}

impl CpuBus for Bus {
    #[inline]
    fn read(&mut self, addr: u16) -> u8 {
        self.cpu_read(addr)
    }

    #[inline]
    fn write(&mut self, addr: u16, data: u8) {
        self.cpu_write(addr, data)
    }
}

impl Snapshot for Bus {
    fn save(&self, w: &mut StateWriter) {
        w.bytes(&self.ram);
        for c in &self.controllers {
            w.u8(c.buttons());
        }
        for c in &self.controllers {
            w.u8(c.shift_register());
        }
        w.u32(self.clock_counter);
        self.dma.save(w);
    }

    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError> {
        r.fill(&mut self.ram)?;
        let buttons = [r.u8()?, r.u8()?];
        let shifts = [r.u8()?, r.u8()?];
        for (i, c) in self.controllers.iter_mut().enumerate() {
            c.restore(buttons[i], shifts[i]);
        }
        self.clock_counter = r.u32()?;
        self.dma.load(r)
    }
}
