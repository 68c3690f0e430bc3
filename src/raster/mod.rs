//! Raster engraving module
//!
//! Turns an assembled grayscale canvas into serpentine G-code:
//! 1. Assemble RGBA tiles into a canvas
//! 2. Convert each pixel to darkness, then to beam power
//! 3. Trim blank margins from each row (optional)
//! 4. Scan rows bottom-up, alternating direction, one event per row

mod canvas;
mod power;
mod scan;
mod trim;

pub use canvas::Canvas;
pub use power::PowerMapper;
pub use scan::{Rasterizer, header};
pub use trim::{TrimRange, trim_row};

use crate::error::Result;
use crate::sink::EventSink;
use crate::types::Settings;

/// Rasterize a canvas after checking that every tile has arrived
pub fn rasterize<S: EventSink + ?Sized>(
    settings: &Settings,
    canvas: &Canvas,
    sink: &mut S,
) -> Result<()> {
    canvas.ensure_complete()?;
    Rasterizer::new(settings, canvas).run(sink)
}
