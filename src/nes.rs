#![doc = r#"
Top-level machine: CPU, bus and pixel sink.

Purpose
- `Nes` is the object a frontend drives. It owns the CPU, the `Bus` (which owns
  RAM, PPU, controllers and the cartridge) and the pixel sink the PPU draws into.
- Frame loop: set controller masks, then `run_frame`, then present the sink.

Save states
- Layout: Bus, CPU, PPU, Cartridge (the cartridge section ends with the mapper's
  own registers). See `savestate` for the primitive encoding.
- A file that cannot be opened is not an error: the call reports `Ok(false)` and
  nothing changes. A stream that is truncated or names an unknown mapper is an
  error, and the machine is left exactly as it was.
"#]

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::bus::Bus;
use crate::cartridge::{Cartridge, CartridgeError};
use crate::cpu::Cpu;
use crate::ppu::{FrameBuffer, PixelSink};
use crate::savestate::{SaveStateError, Snapshot, StateReader, StateWriter};

pub struct Nes<S: PixelSink> {
    cpu: Cpu,
    bus: Bus,
    sink: S,
}

impl Nes<FrameBuffer> {
    pub fn with_frame_buffer() -> Self {
        Self::new(FrameBuffer::new())
    }
}

impl<S: PixelSink> Nes<S> {
    pub fn new(sink: S) -> Self {
        Self {
            cpu: Cpu::new(),
            bus: Bus::new(),
            sink,
        }
    }

    /// Load an iNES file and reset. On any error the current cartridge stays in place.
    pub fn load_rom(&mut self, path: impl AsRef<Path>) -> Result<(), CartridgeError> {
        let cart = Cartridge::from_ines_file(path)?;
        self.insert_cartridge(cart);
        Ok(())
    }

    pub fn insert_cartridge(&mut self, cartridge: Cartridge) {
        self.bus.insert_cartridge(cartridge);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.bus.reset(&mut self.cpu);
    }

    /// One master clock tick.
    #[inline]
    pub fn tick(&mut self) {
        self.bus.tick(&mut self.cpu, &mut self.sink);
    }

    /// Tick until the PPU finishes a frame. `render` gates pixel output for frame-skip.
    pub fn run_frame(&mut self, render: bool) {
        self.bus.ppu.render_this_frame = render;
        loop {
            self.tick();
            if self.bus.ppu.take_frame_complete() {
                break;
            }
        }
    }

    pub fn set_controller(&mut self, port: usize, mask: u8) {
        self.bus.set_controller(port, mask);
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    // -------------- Save states --------------

    /// Encode the whole machine. Fails only when no cartridge is inserted.
    pub fn save_state_bytes(&self) -> Result<Vec<u8>, SaveStateError> {
        let cart = self.bus.cartridge().ok_or(SaveStateError::NoCartridge)?;
        let mut w = StateWriter::new();
        self.bus.save(&mut w);
        self.cpu.save(&mut w);
        self.bus.ppu.save(&mut w);
        cart.save(&mut w);
        Ok(w.into_bytes())
    }

    /// Decode a state produced by `save_state_bytes`. All or nothing.
    pub fn load_state_bytes(&mut self, data: &[u8]) -> Result<(), SaveStateError> {
        let mut r = StateReader::new(data);
        let mut bus = self.bus.clone();
        let mut cpu = self.cpu.clone();

        bus.load(&mut r)?;
        cpu.load(&mut r)?;
        bus.ppu.load(&mut r)?;
        let mut cart = bus.cartridge().cloned().unwrap_or_else(Cartridge::blank);
        cart.load(&mut r)?;
        bus.insert_cartridge(cart);

        self.bus = bus;
        self.cpu = cpu;
        Ok(())
    }

    /// Write a state file. `Ok(false)` when the file could not be written.
    pub fn save_state(&self, path: impl AsRef<Path>) -> Result<bool, SaveStateError> {
        let path = path.as_ref();
        let bytes = self.save_state_bytes()?;
        if let Err(e) = fs::write(path, &bytes) {
            warn!("could not write save state {}: {}", path.display(), e);
            return Ok(false);
        }
        info!("save state written to {} ({} bytes)", path.display(), bytes.len());
        Ok(true)
    }

    /// Restore a state file. `Ok(false)` when the file could not be read.
    pub fn load_state(&mut self, path: impl AsRef<Path>) -> Result<bool, SaveStateError> {
        let path = path.as_ref();
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                warn!("could not open save state {}: {}", path.display(), e);
                return Ok(false);
            }
        };
        self.load_state_bytes(&data)?;
        info!("save state restored from {}", path.display());
        Ok(true)
    }

    /// `<dir>/<rom stem>.state<slot>`.
    pub fn state_slot_path(&self, dir: impl AsRef<Path>, slot: u8) -> PathBuf {
        let stem = self
            .bus
            .cartridge()
            .and_then(|c| c.path())
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "famicore".to_string());
        dir.as_ref().join(format!("{stem}.state{slot}"))
    }

    pub fn save_state_slot(&self, dir: impl AsRef<Path>, slot: u8) -> Result<bool, SaveStateError> {
        self.save_state(self.state_slot_path(dir, slot))
    }

    pub fn load_state_slot(&mut self, dir: impl AsRef<Path>, slot: u8) -> Result<bool, SaveStateError> {
        let path = self.state_slot_path(dir, slot);
        self.load_state(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::{NullSink, Rgba};
    use crate::test_utils::{build_ines, build_nrom_with_prg};

    #[derive(Default)]
    struct Recorder(Vec<(usize, usize, Rgba)>);

    impl PixelSink for Recorder {
        fn set_pixel(&mut self, x: usize, y: usize, color: Rgba) {
            self.0.push((x, y, color));
        }
    }

    // LDA #$1E ; STA $2001 ; loop: INX ; STX $0200 ; INC $10 ; JMP loop
    const BUSY_LOOP: [u8; 14] = [
        0xA9, 0x1E, 0x8D, 0x01, 0x20, 0xE8, 0x8E, 0x00, 0x02, 0xE6, 0x10, 0x4C, 0x05, 0x80,
    ];

    fn busy_cart() -> Cartridge {
        Cartridge::from_ines_bytes(&build_nrom_with_prg(&BUSY_LOOP, 1, 0, None)).unwrap()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("famicore-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn trace<S: PixelSink>(nes: &mut Nes<S>, ticks: usize) -> Vec<(u16, u8, u8, u8, u8)> {
        (0..ticks)
            .map(|_| {
                nes.tick();
                let c = nes.cpu();
                (c.pc(), c.a(), c.x(), c.y(), c.status().bits())
            })
            .collect()
    }

    #[test]
    fn run_frame_fills_the_frame_buffer() {
        let mut nes = Nes::with_frame_buffer();
        nes.insert_cartridge(busy_cart());
        nes.run_frame(true);
        // Palette RAM is zero, so every pixel is colour 0
        let expected = Rgba::rgb(84, 84, 84);
        assert_eq!(nes.sink().pixel(0, 0), Some(expected));
        assert_eq!(nes.sink().pixel(255, 239), Some(expected));
    }

    #[test]
    fn skipped_frames_emit_no_pixels() {
        let mut nes = Nes::new(Recorder::default());
        nes.insert_cartridge(busy_cart());
        nes.run_frame(false);
        assert!(nes.sink().0.is_empty());
        nes.run_frame(true);
        assert_eq!(nes.sink().0.len(), 256 * 240);
    }

    #[test]
    fn save_state_round_trip_replays_identically() {
        let mut nes = Nes::new(Recorder::default());
        nes.insert_cartridge(busy_cart());
        trace(&mut nes, 5_000);

        let state = nes.save_state_bytes().unwrap();
        nes.sink_mut().0.clear();
        let first = trace(&mut nes, 10_000);
        let first_pixels = std::mem::take(&mut nes.sink_mut().0);

        nes.load_state_bytes(&state).unwrap();
        let second = trace(&mut nes, 10_000);
        assert_eq!(first, second);
        assert_eq!(first_pixels, nes.sink().0);
        assert!(!first_pixels.is_empty());
    }

    #[test]
    fn state_restores_onto_an_empty_machine() {
        let mut source = Nes::new(NullSink);
        source.insert_cartridge(busy_cart());
        trace(&mut source, 3_000);
        let state = source.save_state_bytes().unwrap();

        let mut target = Nes::new(NullSink);
        target.load_state_bytes(&state).unwrap();
        assert_eq!(target.cpu().pc(), source.cpu().pc());
        assert_eq!(target.bus().cartridge().unwrap().mapper_id(), 0);
        assert_eq!(trace(&mut target, 1_000), trace(&mut source, 1_000));
    }

    #[test]
    fn state_rebuilds_a_different_mapper() {
        let mut mmc3 = Nes::new(NullSink);
        mmc3.insert_cartridge(Cartridge::from_ines_bytes(&build_ines(2, 1, 0x40, 0, 0, None)).unwrap());
        let state = mmc3.save_state_bytes().unwrap();

        let mut nes = Nes::new(NullSink);
        nes.insert_cartridge(busy_cart());
        nes.load_state_bytes(&state).unwrap();
        assert_eq!(nes.bus().cartridge().unwrap().mapper_id(), 4);
    }

    #[test]
    fn truncated_state_leaves_machine_untouched() {
        let mut nes = Nes::new(NullSink);
        nes.insert_cartridge(busy_cart());
        trace(&mut nes, 2_000);
        let state = nes.save_state_bytes().unwrap();
        trace(&mut nes, 500);
        let pc = nes.cpu().pc();
        let counter = nes.bus().clock_counter();

        let err = nes.load_state_bytes(&state[..state.len() - 10]).unwrap_err();
        assert!(matches!(err, SaveStateError::UnexpectedEof { .. }));
        assert_eq!(nes.cpu().pc(), pc);
        assert_eq!(nes.bus().clock_counter(), counter);
    }

    #[test]
    fn saving_without_cartridge_fails() {
        let nes = Nes::new(NullSink);
        assert!(matches!(nes.save_state_bytes(), Err(SaveStateError::NoCartridge)));
    }

    #[test]
    fn missing_state_file_is_a_no_op() {
        let mut nes = Nes::new(NullSink);
        nes.insert_cartridge(busy_cart());
        trace(&mut nes, 100);
        let pc = nes.cpu().pc();
        let dir = scratch_dir("missing");
        assert!(!nes.load_state(dir.join("nothing.state0")).unwrap());
        assert_eq!(nes.cpu().pc(), pc);
    }

    #[test]
    fn slot_files_round_trip() {
        let dir = scratch_dir("slots");
        let rom_path = dir.join("busy.nes");
        fs::write(&rom_path, build_nrom_with_prg(&BUSY_LOOP, 1, 0, None)).unwrap();

        let mut nes = Nes::new(NullSink);
        nes.load_rom(&rom_path).unwrap();
        trace(&mut nes, 1_000);
        assert_eq!(nes.state_slot_path(&dir, 2), dir.join("busy.state2"));
        assert!(nes.save_state_slot(&dir, 2).unwrap());
        let saved = nes.cpu().pc();
        let counter = nes.bus().clock_counter();

        trace(&mut nes, 777);
        assert!(nes.load_state_slot(&dir, 2).unwrap());
        assert_eq!(nes.cpu().pc(), saved);
        assert_eq!(nes.bus().clock_counter(), counter);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn failed_rom_load_keeps_current_cartridge() {
        let mut nes = Nes::new(NullSink);
        nes.insert_cartridge(busy_cart());
        assert!(nes.load_rom("/nonexistent/rom.nes").is_err());
        assert!(nes.bus().cartridge().is_some());
    }
}
