//! Pages, with an optional capability for paginated (PDF) formats.

use crate::annotation::Annotation;
use crate::engine::RawHandle;
use crate::error::Result;
use crate::geometry::{Matrix, Rect};
use crate::handle::Owned;
use crate::lifecycle::{ColorSpace, Module};
use crate::link::Links;
use crate::pixmap::{Pixmap, RenderOptions};
use crate::stext::TextPage;
use crate::traverse::collect_chain;

/// A loaded page.
///
/// Whether the page belongs to a paginated format with annotation support is
/// decided once, when the page is loaded; see [`Page::as_pdf`].
#[derive(Debug)]
pub struct Page {
    owned: Owned,
    pdf: Option<RawHandle>,
}

impl Page {
    pub(crate) fn bind(module: &Module, raw: RawHandle) -> Page {
        let owned = Owned::bind(module, raw, "page", |e, h| e.drop_page(h));
        let pdf = match module.call(|e| e.pdf_page_from_fz_page(raw)) {
            0 => None,
            handle => Some(handle),
        };
        Page { owned, pdf }
    }

    pub fn bounds(&self) -> Result<Rect> {
        let raw = self.raw();
        let module = self.module();
        let offset = module.call(|e| e.bound_page(raw))?;
        Ok(module.read(|mem| Rect::read(mem, offset)))
    }

    pub fn width(&self) -> Result<f32> {
        Ok(self.bounds()?.width())
    }

    pub fn height(&self) -> Result<f32> {
        Ok(self.bounds()?.height())
    }

    /// Rasterize the page under `matrix` into `colorspace`.
    pub fn to_pixmap(
        &self,
        matrix: &Matrix,
        colorspace: ColorSpace,
        alpha: bool,
    ) -> Result<Pixmap> {
        let raw = self.raw();
        let module = self.module();
        let ctm = matrix.to_array();
        let pixmap = module.call(|e| e.new_pixmap_from_page(raw, ctm, colorspace.raw(), alpha))?;
        Ok(Pixmap::bind(module, pixmap))
    }

    pub fn render(&self, options: &RenderOptions) -> Result<Pixmap> {
        let colorspace = self.module().colorspaces().get(options.colorspace);
        self.to_pixmap(&options.matrix, colorspace, options.alpha)
    }

    pub fn to_text_page(&self) -> Result<TextPage> {
        let raw = self.raw();
        let module = self.module();
        let stext = module.call(|e| e.new_stext_page_from_page(raw))?;
        Ok(TextPage::bind(module, stext))
    }

    pub fn links(&self) -> Result<Links> {
        Links::load(self)
    }

    pub fn is_pdf(&self) -> bool {
        self.pdf.is_some()
    }

    /// The paginated-format view of this page, if it has one.
    pub fn as_pdf(&self) -> Option<PdfPage<'_>> {
        self.pdf.map(|raw| PdfPage { page: self, raw })
    }

    /// Release the page now instead of waiting for it to be dropped.
    pub fn dispose(&mut self) {
        self.owned.dispose();
    }

    /// The engine handle. Panics after [`Page::dispose`].
    pub fn raw(&self) -> RawHandle {
        self.owned.raw()
    }

    pub fn module(&self) -> &Module {
        self.owned.module()
    }
}

/// Annotation access for pages of paginated formats.
///
/// Shares the lifetime of its [`Page`]; it is never released on its own.
#[derive(Debug, Clone, Copy)]
pub struct PdfPage<'a> {
    page: &'a Page,
    raw: RawHandle,
}

impl<'a> PdfPage<'a> {
    /// The page's annotations, in document order.
    ///
    /// Annotations belong to the page and are only valid while it is alive.
    pub fn annotations(&self) -> Vec<Annotation<'a>> {
        // Keeps the page-liveness check even though `raw` is the pdf handle.
        self.page.raw();
        let module = self.page.module();
        let first = module.call(|e| e.pdf_first_annot(self.raw));
        collect_chain(first, |annot| module.call(|e| e.pdf_next_annot(annot)))
            .into_iter()
            .map(|raw| Annotation::new(module, raw))
            .collect()
    }
}
