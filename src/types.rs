use crate::error::{RasterError, Result};
use serde::{Deserialize, Serialize};

/// Pixel dimensions of the logical canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Normalized [0, 1] output range mapped onto machine power units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamPower {
    pub min: f64,
    pub max: f64,
}

impl BeamPower {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Session configuration, supplied once with `init`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub image_size: ImageSize,
    /// Tile edge length in pixels
    pub buffer_size: u32,
    pub beam_power: BeamPower,
    /// Size of one pixel / beam spot in mm
    pub beam_size: f64,
    /// Skip blank margins at both ends of each row
    pub trim_line: bool,
    /// mm/min
    pub feed_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppi: Option<f64>,
}

impl Settings {
    pub fn new(width: u32, height: u32, buffer_size: u32) -> Self {
        Self {
            image_size: ImageSize::new(width, height),
            buffer_size,
            beam_power: BeamPower::new(0.0, 1.0),
            beam_size: 0.1,
            trim_line: true,
            feed_rate: 1500.0,
            ppm: None,
            ppi: None,
        }
    }

    pub fn with_beam_size(mut self, beam_size: f64) -> Self {
        self.beam_size = beam_size;
        self
    }

    pub fn with_beam_power(mut self, min: f64, max: f64) -> Self {
        self.beam_power = BeamPower::new(min, max);
        self
    }

    pub fn with_trim_line(mut self, trim_line: bool) -> Self {
        self.trim_line = trim_line;
        self
    }

    pub fn with_feed_rate(mut self, feed_rate: f64) -> Self {
        self.feed_rate = feed_rate;
        self
    }

    pub fn with_resolution(mut self, ppm: f64, ppi: f64) -> Self {
        self.ppm = Some(ppm);
        self.ppi = Some(ppi);
        self
    }

    /// Reject geometry the canvas cannot be built from.
    /// `beam_power.min <= beam_power.max` is assumed, not checked.
    pub fn validate(&self) -> Result<()> {
        if self.image_size.width == 0 || self.image_size.height == 0 {
            return Err(RasterError::InvalidSettings(format!(
                "image size must be non-zero, got {}x{}",
                self.image_size.width, self.image_size.height
            )));
        }
        if self.buffer_size == 0 {
            return Err(RasterError::InvalidSettings(
                "buffer size must be non-zero".to_string(),
            ));
        }
        if !self.beam_size.is_finite() || self.beam_size <= 0.0 {
            return Err(RasterError::InvalidSettings(format!(
                "beam size must be a positive number, got {}",
                self.beam_size
            )));
        }
        Ok(())
    }

    /// Physical (width, height) in mm, ignoring any trimming
    pub fn physical_size(&self) -> (f64, f64) {
        (
            self.image_size.width as f64 * self.beam_size,
            self.image_size.height as f64 * self.beam_size,
        )
    }
}

/// Inbound session messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Start a new session, dropping any previous one
    Init { data: Settings },
    /// One tile of RGBA bytes at tile column `x`, tile row `y`
    Cell { x: u32, y: u32, data: Vec<u8> },
    /// All tiles have been sent
    Done,
}

/// Payload of a G-code event; `line` is absent for the header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcodeChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
}

/// Outbound events, delivered in order: header, rows bottom-up, `Finished`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Gcode { data: GcodeChunk },
    /// Rasterization complete
    #[serde(rename = "done")]
    Finished,
    Error { data: ErrorReport },
}

impl Event {
    pub fn header(text: String) -> Self {
        Event::Gcode {
            data: GcodeChunk { line: None, text },
        }
    }

    pub fn row(line: u32, text: String) -> Self {
        Event::Gcode {
            data: GcodeChunk {
                line: Some(line),
                text,
            },
        }
    }

    pub fn error(err: &RasterError) -> Self {
        Event::Error {
            data: ErrorReport {
                kind: err.kind().to_string(),
                message: err.to_string(),
            },
        }
    }

    /// G-code text carried by this event, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Event::Gcode { data } => Some(&data.text),
            _ => None,
        }
    }
}
