//! Module lifecycle: one-time instantiation, global init and shared color spaces.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, error};

use crate::engine::{Engine, Offset, RawHandle};
use crate::error::{Error, Result};

thread_local! {
    static MODULE: Rc<OnceCell<Module>> = Rc::new(OnceCell::new());
}

/// Handle to the instantiated engine module.
///
/// Cheap to clone. Every bridge object keeps a clone so release routines can
/// reach the engine whenever they run.
///
/// # Thread Safety
///
/// `Module` is NOT `Send` or `Sync`. The engine is not re-entrant; all calls
/// happen on the thread that instantiated it and re-entering a call in flight
/// panics.
#[derive(Clone)]
pub struct Module {
    inner: Rc<ModuleInner>,
}

struct ModuleInner {
    engine: RefCell<Box<dyn Engine>>,
    colorspaces: ColorSpaces,
}

impl Module {
    /// Wait for the engine module to become ready, instantiating it on first use.
    ///
    /// Only the first caller's `instantiate` future runs; callers arriving
    /// while it is pending wait on the same signal. If instantiation fails the
    /// signal stays unresolved and a later call may try again.
    pub async fn ready<F, Fut, E>(instantiate: F) -> Result<Module>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<E>>,
        E: Engine + 'static,
    {
        let cell = MODULE.with(Rc::clone);
        let module = cell
            .get_or_try_init(move || async move {
                let engine = instantiate().await?;
                Module::bootstrap(Box::new(engine))
            })
            .await?;
        Ok(module.clone())
    }

    /// The ready module, or [`Error::NotReady`] before [`Module::ready`] resolved.
    pub fn current() -> Result<Module> {
        MODULE.with(|cell| cell.get().cloned().ok_or(Error::NotReady))
    }

    fn bootstrap(mut engine: Box<dyn Engine>) -> Result<Module> {
        engine
            .init_context()
            .map_err(|e| Error::Init(e.message))?;
        let colorspaces = ColorSpaces {
            gray: ColorSpace::new(engine.device_gray(), 1, "DeviceGray"),
            rgb: ColorSpace::new(engine.device_rgb(), 3, "DeviceRGB"),
            bgr: ColorSpace::new(engine.device_bgr(), 3, "DeviceBGR"),
            cmyk: ColorSpace::new(engine.device_cmyk(), 4, "DeviceCMYK"),
        };
        debug!(memory_bytes = engine.memory().len(), "engine module ready");
        Ok(Module {
            inner: Rc::new(ModuleInner {
                engine: RefCell::new(engine),
                colorspaces,
            }),
        })
    }

    /// Bootstrap a module outside the process-wide cell.
    #[cfg(test)]
    pub(crate) fn with_engine(engine: impl Engine + 'static) -> Module {
        Module::bootstrap(Box::new(engine)).expect("mock engine bootstrap")
    }

    /// The standard device color spaces, valid for the life of the process.
    pub fn colorspaces(&self) -> &ColorSpaces {
        &self.inner.colorspaces
    }

    /// Run one engine call.
    ///
    /// # Panics
    ///
    /// Panics if another engine call is in flight or a foreign memory view
    /// (see [`Pixmap::with_samples`](crate::Pixmap::with_samples)) is live.
    pub(crate) fn call<R>(&self, f: impl FnOnce(&mut dyn Engine) -> R) -> R {
        let Ok(mut engine) = self.inner.engine.try_borrow_mut() else {
            panic!("engine called while a foreign memory view or another engine call is live");
        };
        f(engine.as_mut())
    }

    /// Read from the linear memory region.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let engine = self.inner.engine.borrow();
        f(engine.memory())
    }

    /// Run a release routine from `Drop`.
    ///
    /// If the engine is mid-call (a value dropped while unwinding out of an
    /// engine call) the handle is leaked rather than re-entering the engine.
    pub(crate) fn release_deferred(&self, raw: RawHandle, release: fn(&mut dyn Engine, RawHandle)) {
        match self.inner.engine.try_borrow_mut() {
            Ok(mut engine) => release(engine.as_mut(), raw),
            Err(_) => error!(handle = raw, "engine busy during deferred release, leaking handle"),
        }
    }

    /// Free a scratch allocation from `Drop`, with the same leak-over-reenter rule.
    pub(crate) fn free_deferred(&self, offset: Offset) {
        match self.inner.engine.try_borrow_mut() {
            Ok(mut engine) => engine.free(offset),
            Err(_) => error!(offset, "engine busy during scratch free, leaking allocation"),
        }
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("colorspaces", &self.inner.colorspaces)
            .finish_non_exhaustive()
    }
}

/// A device color space handle owned by the engine for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSpace {
    raw: RawHandle,
    components: u8,
    name: &'static str,
}

impl ColorSpace {
    fn new(raw: RawHandle, components: u8, name: &'static str) -> Self {
        Self {
            raw,
            components,
            name,
        }
    }

    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    pub fn components(&self) -> u8 {
        self.components
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// The four standard device color spaces.
#[derive(Debug, Clone, Copy)]
pub struct ColorSpaces {
    pub gray: ColorSpace,
    pub rgb: ColorSpace,
    pub bgr: ColorSpace,
    pub cmyk: ColorSpace,
}

/// Color space selector usable in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpaceKind {
    Gray,
    #[default]
    Rgb,
    Bgr,
    Cmyk,
}

impl ColorSpaces {
    pub fn get(&self, kind: ColorSpaceKind) -> ColorSpace {
        match kind {
            ColorSpaceKind::Gray => self.gray,
            ColorSpaceKind::Rgb => self.rgb,
            ColorSpaceKind::Bgr => self.bgr,
            ColorSpaceKind::Cmyk => self.cmyk,
        }
    }
}
