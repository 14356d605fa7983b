//! Foreign allocation adapter.
//!
//! Raw byte ranges in the engine's linear memory, plus [`Scratch`], a guard
//! that frees its range on every exit path of the operation that made it.

use tracing::trace;

use crate::engine::Offset;
use crate::error::{Error, Result};
use crate::lifecycle::Module;

impl Module {
    /// Allocate `size` bytes of foreign memory.
    ///
    /// Exhaustion fails the current operation with [`Error::OutOfMemory`].
    pub fn malloc(&self, size: usize) -> Result<Offset> {
        let request = u32::try_from(size.max(1)).map_err(|_| Error::OutOfMemory { size })?;
        match self.call(|e| e.malloc(request)) {
            0 => Err(Error::OutOfMemory { size }),
            offset => Ok(offset),
        }
    }

    pub fn free(&self, offset: Offset) {
        if offset != 0 {
            self.call(|e| e.free(offset));
        }
    }

    /// Copy host bytes into foreign memory at `offset`.
    pub fn copy_in(&self, bytes: &[u8], offset: Offset) {
        let at = offset as usize;
        self.call(|e| e.memory_mut()[at..at + bytes.len()].copy_from_slice(bytes));
    }

    /// Copy `len` bytes out of foreign memory.
    pub fn copy_out(&self, offset: Offset, len: usize) -> Vec<u8> {
        let at = offset as usize;
        self.read(|mem| mem[at..at + len].to_vec())
    }
}

/// A transient foreign allocation freed when dropped.
pub struct Scratch<'m> {
    module: &'m Module,
    offset: Offset,
    len: usize,
}

impl<'m> Scratch<'m> {
    pub fn alloc(module: &'m Module, len: usize) -> Result<Self> {
        let offset = module.malloc(len)?;
        trace!(offset, len, "scratch allocated");
        Ok(Self {
            module,
            offset,
            len,
        })
    }

    /// Allocate and fill with a copy of `bytes`.
    pub fn from_bytes(module: &'m Module, bytes: &[u8]) -> Result<Self> {
        let scratch = Self::alloc(module, bytes.len())?;
        module.copy_in(bytes, scratch.offset);
        Ok(scratch)
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Hand the allocation over to the engine; it will not be freed here.
    pub(crate) fn into_raw(mut self) -> Offset {
        std::mem::replace(&mut self.offset, 0)
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        if self.offset != 0 {
            trace!(offset = self.offset, "scratch freed");
            self.module.free_deferred(self.offset);
        }
    }
}
