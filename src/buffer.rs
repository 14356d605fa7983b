//! Foreign byte buffers and the output sinks that write into them.

use tracing::debug;

use crate::alloc::Scratch;
use crate::engine::RawHandle;
use crate::error::{Error, Result};
use crate::handle::Owned;
use crate::lifecycle::Module;
use crate::util::read_utf8;

/// A growable byte container in foreign memory.
#[derive(Debug)]
pub struct Buffer {
    owned: Owned,
}

impl Buffer {
    pub(crate) fn bind(module: &Module, raw: RawHandle) -> Buffer {
        Buffer {
            owned: Owned::bind(module, raw, "buffer", |e, h| e.drop_buffer(h)),
        }
    }

    /// An empty buffer with room for `capacity` bytes.
    pub fn new(module: &Module, capacity: usize) -> Result<Buffer> {
        let capacity32 = to_u32(capacity)?;
        let raw = module.call(|e| e.new_buffer(capacity32))?;
        Ok(Buffer::bind(module, raw))
    }

    /// A buffer holding a copy of `bytes`.
    pub fn from_bytes(module: &Module, bytes: &[u8]) -> Result<Buffer> {
        let scratch = Scratch::from_bytes(module, bytes)?;
        let len = to_u32(bytes.len())?;
        let raw = module.call(|e| e.new_buffer_from_data(scratch.offset(), len))?;
        Ok(Buffer::bind(module, raw))
    }

    /// A buffer holding the UTF-8 bytes of `text`, without a terminator.
    pub fn from_text(module: &Module, text: &str) -> Result<Buffer> {
        Buffer::from_bytes(module, text.as_bytes())
    }

    /// Number of bytes written.
    pub fn size(&self) -> usize {
        let raw = self.raw();
        self.module().call(|e| e.buffer_size(raw)) as usize
    }

    /// Bytes allocated, at least [`Buffer::size`].
    pub fn capacity(&self) -> usize {
        let raw = self.raw();
        self.module().call(|e| e.buffer_capacity(raw)) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Reallocate to exactly `capacity` bytes, truncating the contents if needed.
    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        let raw = self.raw();
        let capacity32 = to_u32(capacity)?;
        self.module().call(|e| e.resize_buffer(raw, capacity32))?;
        Ok(())
    }

    /// Enlarge capacity by the engine's growth step. Contents are kept.
    pub fn grow(&mut self) -> Result<()> {
        let raw = self.raw();
        self.module().call(|e| e.grow_buffer(raw))?;
        Ok(())
    }

    /// Shrink capacity down to the current size.
    pub fn trim(&mut self) -> Result<()> {
        let raw = self.raw();
        self.module().call(|e| e.trim_buffer(raw))?;
        Ok(())
    }

    /// Drop the contents but keep the allocation.
    pub fn clear(&mut self) {
        let raw = self.raw();
        self.module().call(|e| e.clear_buffer(raw));
    }

    /// Copy the contents out.
    pub fn to_vec(&self) -> Vec<u8> {
        let raw = self.raw();
        let module = self.module();
        let (data, len) = module.call(|e| (e.buffer_data(raw), e.buffer_size(raw)));
        module.copy_out(data, len as usize)
    }

    /// Decode the contents as UTF-8.
    pub fn read_to_string(&self) -> Result<String> {
        let raw = self.raw();
        let module = self.module();
        let (data, len) = module.call(|e| (e.buffer_data(raw), e.buffer_size(raw)));
        module.read(|mem| read_utf8(mem, data, len as usize, "buffer contents"))
    }

    /// Release the buffer now rather than on drop.
    pub fn dispose(&mut self) {
        self.owned.dispose();
    }

    /// The engine handle. Panics after dispose.
    pub fn raw(&self) -> RawHandle {
        self.owned.raw()
    }

    pub fn module(&self) -> &Module {
        self.owned.module()
    }
}

fn to_u32(size: usize) -> Result<u32> {
    u32::try_from(size).map_err(|_| Error::OutOfMemory { size })
}

/// A writable sink appending to a [`Buffer`].
///
/// Close the output before reading the buffer: writes are only guaranteed to
/// have reached the buffer once [`Output::close`] returns.
#[derive(Debug)]
pub struct Output {
    owned: Owned,
    closed: bool,
}

impl Output {
    /// A new output appending to `buffer`.
    pub fn with_buffer(buffer: &Buffer) -> Result<Output> {
        let target = buffer.raw();
        let module = buffer.module();
        let raw = module.call(|e| e.new_output_with_buffer(target))?;
        Ok(Output {
            owned: Owned::bind(module, raw, "output", |e, h| e.drop_output(h)),
            closed: false,
        })
    }

    /// Flush and finalize. Closing an already closed output does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let raw = self.raw();
        self.owned.module().call(|e| e.close_output(raw))?;
        self.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release the output. An output that was never closed is released
    /// without flushing.
    pub fn dispose(&mut self) {
        if !self.closed && !self.owned.is_disposed() {
            debug!(handle = self.owned.raw(), "disposing output that was never closed");
        }
        self.owned.dispose();
    }

    pub fn raw(&self) -> RawHandle {
        self.owned.raw()
    }
}
