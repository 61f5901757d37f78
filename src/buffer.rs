//! Bounded streaming byte source
//!
//! [`DoubleBuffer`] reads its input through two fixed-capacity regions so that
//! memory use stays constant regardless of input size.  While the lexer scans
//! one region, the other holds the next chunk to be read; a token whose bytes
//! straddle a region switch is assembled byte by byte by the caller, so the
//! switch is never observable in the token stream.

use std::io::{self, Read};

/// Capacity of each buffer region in bytes.
pub(crate) const REGION_CAPACITY: usize = 4096;

/// Double-buffered byte source over any [`Read`] implementation.
///
/// Exposes `peek`/`advance` plus a one-byte pushback slot instead of raw
/// positions; region refills and switches happen transparently inside `peek`.
pub(crate) struct DoubleBuffer<R> {
    reader: R,
    regions: [Vec<u8>; 2],
    active: usize,
    pos: usize,
    capacity: usize,
    pushed_back: Option<u8>,
    exhausted: bool,
}

impl<R: Read> DoubleBuffer<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self::with_capacity(reader, REGION_CAPACITY)
    }

    /// A source with a custom region capacity.  Tests use small capacities to
    /// force region switches inside individual tokens.
    pub(crate) fn with_capacity(reader: R, capacity: usize) -> Self {
        assert!(capacity > 0, "region capacity must be nonzero");
        Self {
            reader,
            regions: [Vec::new(), Vec::new()],
            active: 0,
            pos: 0,
            capacity,
            pushed_back: None,
            exhausted: false,
        }
    }

    /// Current byte without consuming it.  Refills and switches regions when
    /// the active one is spent; returns `None` once the reader is exhausted,
    /// and keeps returning `None` on every later call.
    pub(crate) fn peek(&mut self) -> io::Result<Option<u8>> {
        if let Some(byte) = self.pushed_back {
            return Ok(Some(byte));
        }
        if self.pos == self.regions[self.active].len() && !self.switch_regions()? {
            return Ok(None);
        }
        Ok(Some(self.regions[self.active][self.pos]))
    }

    /// Consume and return the current byte.
    pub(crate) fn advance(&mut self) -> io::Result<Option<u8>> {
        if let Some(byte) = self.pushed_back.take() {
            return Ok(Some(byte));
        }
        match self.peek()? {
            Some(byte) => {
                self.pos += 1;
                Ok(Some(byte))
            }
            None => Ok(None),
        }
    }

    /// Push a single byte back so the next `peek`/`advance` returns it again.
    ///
    /// The slot holds one byte; the lexer only ever pushes back the byte it
    /// just consumed, so the slot is always free.  Unlike rewinding `pos`,
    /// this stays correct when the byte was the first of a fresh region.
    pub(crate) fn unread(&mut self, byte: u8) {
        debug_assert!(self.pushed_back.is_none(), "pushback slot already full");
        self.pushed_back = Some(byte);
    }

    /// Refill the inactive region and make it active.  Returns `false` when
    /// the reader has no more bytes to give.
    fn switch_regions(&mut self) -> io::Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let inactive = 1 - self.active;
        self.fill(inactive)?;
        if self.regions[inactive].is_empty() {
            self.exhausted = true;
            return Ok(false);
        }
        self.active = inactive;
        self.pos = 0;
        Ok(true)
    }

    /// Read up to `capacity` bytes into the given region, looping over short
    /// reads so a region is only non-full at end of input.
    fn fill(&mut self, which: usize) -> io::Result<()> {
        let region = &mut self.regions[which];
        region.resize(self.capacity, 0);
        let mut filled = 0;
        while filled < self.capacity {
            match self.reader.read(&mut region[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        region.truncate(filled);
        Ok(())
    }
}
