//! Structured text extraction.
//!
//! The engine prints a structured text page as JSON into a [`Buffer`]; the
//! serde models below mirror that layout.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::buffer::{Buffer, Output};
use crate::engine::RawHandle;
use crate::error::Result;
use crate::handle::Owned;
use crate::lifecycle::Module;

/// Options for text extraction.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TextOptions {
    /// Factor applied to every coordinate and font size.
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            scale: default_scale(),
        }
    }
}

/// Text extracted from one page, with layout.
#[derive(Debug)]
pub struct TextPage {
    owned: Owned,
}

impl TextPage {
    pub(crate) fn bind(module: &Module, raw: RawHandle) -> TextPage {
        TextPage {
            owned: Owned::bind(module, raw, "stext", |e, h| e.drop_stext_page(h)),
        }
    }

    /// The page as the engine's structured-text JSON.
    pub fn to_json(&self, scale: f32) -> Result<String> {
        let raw = self.raw();
        let module = self.owned.module();

        let mut buffer = Buffer::new(module, 0)?;
        let mut output = Output::with_buffer(&buffer)?;
        let out = output.raw();
        module.call(|e| e.print_stext_page_as_json(out, raw, scale))?;
        output.close()?;
        output.dispose();

        let json = buffer.read_to_string()?;
        buffer.dispose();
        trace!(bytes = json.len(), scale, "printed structured text");
        Ok(json)
    }

    pub fn structured(&self, scale: f32) -> Result<StructuredText> {
        Ok(serde_json::from_str(&self.to_json(scale)?)?)
    }

    pub fn structured_with(&self, options: &TextOptions) -> Result<StructuredText> {
        self.structured(options.scale)
    }

    /// Release the text page now instead of waiting for it to be dropped.
    pub fn dispose(&mut self) {
        self.owned.dispose();
    }

    pub fn raw(&self) -> RawHandle {
        self.owned.raw()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredText {
    pub blocks: Vec<Block>,
}

impl StructuredText {
    /// Text of every line, one line per row, blocks separated by a blank row.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| {
                block
                    .lines
                    .iter()
                    .map(|line| line.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    pub bbox: BBox,
    #[serde(default)]
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub wmode: u8,
    pub bbox: BBox,
    pub font: Font,
    /// Baseline origin.
    pub x: f32,
    pub y: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub name: String,
    pub family: String,
    pub weight: String,
    pub style: String,
    pub size: f32,
}

/// Origin plus extent, as printed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}
