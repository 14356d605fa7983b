//! Raster images produced by page rendering.

use serde::Deserialize;

use crate::buffer::Buffer;
use crate::engine::RawHandle;
use crate::error::Result;
use crate::geometry::{IRect, Matrix};
use crate::handle::Owned;
use crate::lifecycle::{ColorSpaceKind, Module};

/// Rendering parameters for [`Page::render`](crate::Page::render).
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Page-space to device-space transform.
    pub matrix: Matrix,
    pub colorspace: ColorSpaceKind,
    /// Add an alpha channel to the samples.
    pub alpha: bool,
}

/// A rendered raster image.
///
/// Pixmaps pin their full sample buffer in foreign memory until released;
/// dispose them as soon as the samples have been consumed.
#[derive(Debug)]
pub struct Pixmap {
    owned: Owned,
}

impl Pixmap {
    pub(crate) fn bind(module: &Module, raw: RawHandle) -> Pixmap {
        Pixmap {
            owned: Owned::bind(module, raw, "pixmap", |e, h| e.drop_pixmap(h)),
        }
    }

    /// Integer bounding box in device space.
    pub fn bbox(&self) -> IRect {
        let raw = self.raw();
        let module = self.module();
        let offset = module.call(|e| e.pixmap_bbox(raw));
        module.read(|mem| IRect::read(mem, offset))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.bbox().width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.bbox().height()
    }

    /// Bytes per row of samples.
    pub fn stride(&self) -> usize {
        let raw = self.raw();
        self.module().call(|e| e.pixmap_stride(raw)).max(0) as usize
    }

    /// Run `f` over a read-only view of the sample bytes.
    ///
    /// The view aliases foreign memory; it cannot outlive the closure.
    /// Query sizes and offsets before calling, not from inside `f`.
    ///
    /// # Panics
    ///
    /// Panics if `f` calls into the engine, e.g. `pixmap.width()`. Owned
    /// objects dropped inside `f` cannot be released and are leaked.
    pub fn with_samples<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let raw = self.raw();
        let len = self.stride() * self.height() as usize;
        let module = self.module();
        let start = module.call(|e| e.pixmap_samples(raw)) as usize;
        module.read(|mem| f(&mem[start..start + len]))
    }

    /// Copy of the sample bytes.
    pub fn samples(&self) -> Vec<u8> {
        self.with_samples(<[u8]>::to_vec)
    }

    /// Encode as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let raw = self.raw();
        let module = self.module();
        let png = module.call(|e| e.new_buffer_from_pixmap_as_png(raw))?;
        let mut buffer = Buffer::bind(module, png);
        let bytes = buffer.to_vec();
        buffer.dispose();
        Ok(bytes)
    }

    /// Release the samples now instead of waiting for the pixmap to be dropped.
    pub fn dispose(&mut self) {
        self.owned.dispose();
    }

    /// The live pixmap handle. Panics after [`Pixmap::dispose`].
    pub fn raw(&self) -> RawHandle {
        self.owned.raw()
    }

    pub fn module(&self) -> &Module {
        self.owned.module()
    }
}
