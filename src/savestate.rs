/*!
Binary save-state encoding.

Responsibilities:
- `StateWriter` appends little-endian primitives and length-prefixed blobs to a byte buffer.
- `StateReader` consumes the same primitives in the same order, reporting truncation
  instead of panicking.
- `Snapshot` is implemented by every component that contributes a section to a save state.

Notes:
- The format is order-dependent and not self-describing. Sections are written as
  Bus, CPU, PPU, Cartridge, then the active mapper's own registers.
- Length prefixes are `u32`. Multi-byte integers are little-endian.
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveStateError {
    #[error("save state I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("save state truncated: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },
    #[error("save state refers to unsupported mapper {0}")]
    UnsupportedMapper(u8),
    #[error("no cartridge is inserted")]
    NoCartridge,
}

/// A component that can dump and restore its state.
pub trait Snapshot {
    fn save(&self, w: &mut StateWriter);
    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError>;
}

#[derive(Debug, Default)]
pub struct StateWriter {
    buf: Vec<u8>,
}

impl StateWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    pub fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Raw bytes with no length prefix; the reader must know the size.
    pub fn bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// `u32` length followed by the bytes.
    pub fn sized_bytes(&mut self, data: &[u8]) {
        self.u32(data.len() as u32);
        self.buf.extend_from_slice(data);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug)]
pub struct StateReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StateReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SaveStateError> {
        if self.remaining() < n {
            return Err(SaveStateError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> Result<u8, SaveStateError> {
        Ok(self.take(1)?[0])
    }

    pub fn bool(&mut self) -> Result<bool, SaveStateError> {
        Ok(self.u8()? != 0)
    }

    pub fn u16(&mut self) -> Result<u16, SaveStateError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> Result<i16, SaveStateError> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Result<u32, SaveStateError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Fill `out` completely from the stream.
    pub fn fill(&mut self, out: &mut [u8]) -> Result<(), SaveStateError> {
        let src = self.take(out.len())?;
        out.copy_from_slice(src);
        Ok(())
    }

    pub fn sized_bytes(&mut self) -> Result<Vec<u8>, SaveStateError> {
        let len = self.u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }
}
