/*!
Clock/timing orchestrator for the Bus.

Order of operations for one master tick:
  1. Clock the PPU one dot (it borrows the cartridge slot and the pixel sink).
  2. Every third tick, either run one OAM DMA cycle or clock the CPU one cycle.
     The CPU is not clocked at all while DMA is in progress.
  3. Deliver a pending PPU NMI to the CPU.
  4. Deliver a pending mapper IRQ to the CPU (acknowledging it on the mapper).
  5. Advance the master counter.
*/

use super::Bus;
use super::dma::DmaAction;
use crate::cpu::Cpu;
use crate::ppu::PixelSink;

impl Bus {
    /// One master (PPU-rate) tick.
    pub fn tick<S: PixelSink + ?Sized>(&mut self, cpu: &mut Cpu, sink: &mut S) {
        self.ppu.clock(&mut self.cartridge, sink);

        if self.clock_counter % 3 == 0 {
            if self.dma.in_progress() {
                self.dma_cycle();
            } else {
                cpu.step(self);
            }
        }

        if self.ppu.take_nmi() {
            cpu.nmi(self);
        }

        let irq = match self.cartridge.as_mut() {
            Some(cart) if cart.irq_state() => {
                cart.irq_clear();
                true
            }
            _ => false,
        };
        if irq {
            cpu.irq(self);
        }

        self.clock_counter = self.clock_counter.wrapping_add(1);
    }

    fn dma_cycle(&mut self) {
        match self.dma.advance(self.clock_counter % 2 == 1) {
            DmaAction::Wait => {}
            DmaAction::Read(addr) => {
                let data = self.cpu_read(addr);
                self.dma.latch(data);
            }
            DmaAction::Write { index, data } => self.ppu.write_oam_byte(index, data),
        }
    }
}
