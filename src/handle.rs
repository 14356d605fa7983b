//! Owned foreign handles.

use tracing::{trace, warn};

use crate::engine::{Engine, RawHandle};
use crate::lifecycle::Module;

/// Release routine attached to an owned handle.
pub type Release = fn(&mut dyn Engine, RawHandle);

/// A foreign handle plus the routine that releases it.
///
/// The release routine runs at most once: either from [`Owned::dispose`] or,
/// as a safety net, when the value is dropped without having been disposed.
/// Scarce resources (documents, pixmaps, buffers) should be disposed
/// explicitly as soon as they are no longer needed.
///
/// After disposal the stored handle is zeroed; any further use panics.
pub struct Owned {
    module: Module,
    raw: RawHandle,
    kind: &'static str,
    release: Release,
}

impl Owned {
    pub(crate) fn bind(
        module: &Module,
        raw: RawHandle,
        kind: &'static str,
        release: Release,
    ) -> Self {
        assert_ne!(raw, 0, "cannot bind a null {kind} handle");
        trace!(kind, handle = raw, "bound handle");
        Self {
            module: module.clone(),
            raw,
            kind,
            release,
        }
    }

    /// The live handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle has already been disposed.
    pub fn raw(&self) -> RawHandle {
        assert_ne!(self.raw, 0, "{} used after dispose", self.kind);
        self.raw
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn is_disposed(&self) -> bool {
        self.raw == 0
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Release the handle now.
    ///
    /// Disposing twice is a caller bug: it panics in debug builds and is
    /// logged and ignored in release builds. The handle is never released twice.
    pub fn dispose(&mut self) {
        if self.raw == 0 {
            debug_assert!(false, "{} disposed twice", self.kind);
            warn!(kind = self.kind, "ignoring second dispose");
            return;
        }
        let raw = std::mem::replace(&mut self.raw, 0);
        let release = self.release;
        self.module.call(|engine| release(engine, raw));
        trace!(kind = self.kind, handle = raw, "disposed handle");
    }
}

impl Drop for Owned {
    fn drop(&mut self) {
        if self.raw == 0 {
            return;
        }
        let raw = std::mem::replace(&mut self.raw, 0);
        trace!(kind = self.kind, handle = raw, "releasing handle on drop");
        self.module.release_deferred(raw, self.release);
    }
}

impl std::fmt::Debug for Owned {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Owned")
            .field("kind", &self.kind)
            .field("raw", &format_args!("{:#x}", self.raw))
            .finish()
    }
}
