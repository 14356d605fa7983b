//! Substring search on pages.

use serde::Deserialize;
use tracing::debug;

use crate::alloc::Scratch;
use crate::engine::Offset;
use crate::error::Result;
use crate::geometry::{Quad, Rect};
use crate::page::Page;
use crate::util::write_cstr;

/// JSON schema for search options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of hits collected per page (default: 500)
    #[serde(default = "default_max_hits")]
    pub max_hits: usize,
}

fn default_max_hits() -> usize {
    500
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_hits: default_max_hits(),
        }
    }
}

impl Page {
    /// Bounding rectangles of every occurrence of `needle`, in page order.
    pub fn search(&self, needle: &str) -> Result<Vec<Rect>> {
        self.search_with(needle, &SearchOptions::default())
    }

    pub fn search_with(&self, needle: &str, options: &SearchOptions) -> Result<Vec<Rect>> {
        Ok(self
            .search_quads_with(needle, options)?
            .iter()
            .map(Quad::bounds)
            .collect())
    }

    /// The hit quadrilaterals of every occurrence of `needle`.
    pub fn search_quads(&self, needle: &str) -> Result<Vec<Quad>> {
        self.search_quads_with(needle, &SearchOptions::default())
    }

    /// Search with an explicit hit limit.
    ///
    /// # Scratch memory
    ///
    /// The needle and a `max_hits`-entry quad array are allocated in foreign
    /// memory for the duration of the call and freed on every exit path.
    pub fn search_quads_with(&self, needle: &str, options: &SearchOptions) -> Result<Vec<Quad>> {
        let max_hits = i32::try_from(options.max_hits).unwrap_or(i32::MAX);
        if max_hits == 0 {
            return Ok(Vec::new());
        }
        let raw = self.raw();
        let module = self.module();

        let needle_str = write_cstr(module, needle, "search needle")?;
        let hits = Scratch::alloc(module, max_hits as usize * Quad::SIZE as usize)?;
        let count = module.call(|e| {
            e.search_page(raw, needle_str.offset(), hits.offset(), max_hits)
        })?;
        let count = count.clamp(0, max_hits) as u32;

        let quads = module.read(|mem| {
            (0..count)
                .map(|i| Quad::read(mem, hits.offset() + i * Quad::SIZE as Offset))
                .collect::<Vec<_>>()
        });
        debug!(page = raw, needle, hits = quads.len(), "searched page");
        Ok(quads)
    }
}
