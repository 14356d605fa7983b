//! String marshaling across the foreign boundary.

use crate::alloc::Scratch;
use crate::engine::Offset;
use crate::error::{Error, Result};
use crate::lifecycle::Module;

/// Encoded size of `s` in foreign memory, terminator included.
pub fn encoded_len(s: &str) -> usize {
    s.len() + 1
}

/// Write `s` as a NUL-terminated UTF-8 string into a fresh scratch allocation.
///
/// Returns an error if `s` contains a NUL byte, which the terminator
/// contract cannot represent.
pub fn write_cstr<'m>(module: &'m Module, s: &str, context: &'static str) -> Result<Scratch<'m>> {
    if s.as_bytes().contains(&0) {
        return Err(Error::InteriorNul { context });
    }
    let scratch = Scratch::alloc(module, encoded_len(s))?;
    let mut bytes = Vec::with_capacity(encoded_len(s));
    bytes.extend_from_slice(s.as_bytes());
    bytes.push(0);
    module.copy_in(&bytes, scratch.offset());
    Ok(scratch)
}

/// Decode the NUL-terminated UTF-8 string at `offset`.
pub(crate) fn read_cstr(mem: &[u8], offset: Offset, context: &'static str) -> Result<String> {
    let start = offset as usize;
    let len = mem[start..]
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(mem.len() - start);
    read_utf8(mem, offset, len, context)
}

/// Decode exactly `len` bytes of UTF-8 at `offset`.
pub(crate) fn read_utf8(
    mem: &[u8],
    offset: Offset,
    len: usize,
    context: &'static str,
) -> Result<String> {
    let start = offset as usize;
    std::str::from_utf8(&mem[start..start + len])
        .map(str::to_owned)
        .map_err(|_| Error::InvalidUtf8 { context })
}

/// Like [`read_cstr`] but maps the null offset to `None`.
pub(crate) fn read_opt_cstr(
    mem: &[u8],
    offset: Offset,
    context: &'static str,
) -> Result<Option<String>> {
    if offset == 0 {
        return Ok(None);
    }
    read_cstr(mem, offset, context).map(Some)
}

impl Module {
    /// Decode the NUL-terminated string at `offset` into a host string.
    pub fn read_string(&self, offset: Offset) -> Result<String> {
        self.read(|mem| read_cstr(mem, offset, "foreign string"))
    }
}
