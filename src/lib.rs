//! # laser-raster
//!
//! A Rust library for turning grayscale raster images into laser engraving G-code.
//!
//! ## Features
//!
//! - **Tiled canvas**: Assemble an image from independently delivered RGBA tiles
//! - **Serpentine scan**: One G-code row per image row, alternating direction
//! - **Margin trimming**: Skip blank pixels at both ends of each row
//! - **Streaming output**: Rows are handed to an [`EventSink`] as soon as they are ready
//!
//! ## Example
//!
//! ```rust,ignore
//! use laser_raster::{Message, ProtocolHandler, Settings, GcodeWriter};
//!
//! let mut handler = ProtocolHandler::new();
//! let mut out = GcodeWriter::new(std::io::stdout());
//! handler.handle(Message::Init { data: Settings::new(2, 2, 2) }, &mut out)?;
//! handler.handle(Message::Cell { x: 0, y: 0, data: vec![0; 16] }, &mut out)?;
//! handler.handle(Message::Done, &mut out)?;
//! ```

pub mod error;
pub mod protocol;
pub mod raster;
pub mod sink;
pub mod types;

// Re-export commonly used items
pub use error::{RasterError, Result};
pub use protocol::{ProtocolHandler, Session, parse_message};
pub use raster::{Canvas, PowerMapper, Rasterizer, TrimRange, rasterize, trim_row};
pub use sink::{EventSink, GcodeWriter, JsonLinesWriter};
pub use types::{BeamPower, Event, GcodeChunk, ImageSize, Message, Settings};
