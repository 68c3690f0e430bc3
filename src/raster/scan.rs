//! Serpentine row scan
//!
//! Rows are visited bottom-up so image row 0 lands on the far Y edge. The
//! scan direction flips before every row, which makes the first visited row
//! run left to right.

use super::canvas::Canvas;
use super::trim::{TrimRange, trim_row};
use crate::error::Result;
use crate::sink::EventSink;
use crate::types::{Event, Settings};
use tracing::{info, trace, warn};

/// Format the comment block and feed-rate setup emitted before any row
pub fn header(settings: &Settings) -> String {
    let (width, height) = settings.physical_size();
    let (width, height) = (to_fixed(width, 2), to_fixed(height, 2));
    let min = to_fixed(settings.beam_power.min * 100.0, 0);
    let max = to_fixed(settings.beam_power.max * 100.0, 0);
    let ppm = format_optional(settings.ppm);
    let ppi = format_optional(settings.ppi);
    let feed = settings.feed_rate;

    let lines = [
        format!("; Generated by laser-raster {}", env!("CARGO_PKG_VERSION")),
        format!("; Size       : {width} x {height} mm"),
        format!("; Resolution : {ppm} PPM - {ppi} PPI"),
        format!("; Beam size  : {} mm", settings.beam_size),
        format!("; Beam power : {min}% to {max}%"),
        format!("; Feed rate  : {feed} mm/min"),
        String::new(),
        format!("G0 F{feed}"),
        format!("G1 F{feed}"),
        String::new(),
    ];
    lines.join("\n")
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

/// Digits checked past the requested precision when looking for an exact tie
const TIE_DIGITS: usize = 30;

/// Fixed-point formatting with JavaScript `toFixed` rounding: an exact
/// halfway value rounds away from zero (0.125 -> "0.13"), where
/// `format!("{:.2}")` would give "0.12".
pub(crate) fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    // -0.0 prints as "0"
    let value = if value == 0.0 { 0.0 } else { value };

    let wide = format!("{:.*}", digits + TIE_DIGITS, value.abs());
    let (head, tail) = wide.split_at(wide.len() - TIE_DIGITS);
    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');
    if !is_tie {
        return format!("{:.*}", digits, value);
    }

    let rounded = increment_last_digit(head.trim_end_matches('.'));
    if value < 0.0 {
        format!("-{}", rounded)
    } else {
        rounded
    }
}

/// Add one unit in the last place of a plain decimal string, carrying left
fn increment_last_digit(number: &str) -> String {
    let mut bytes = number.as_bytes().to_vec();
    for i in (0..bytes.len()).rev() {
        match bytes[i] {
            b'.' => continue,
            b'9' => bytes[i] = b'0',
            _ => {
                bytes[i] += 1;
                return bytes.into_iter().map(char::from).collect();
            }
        }
    }
    bytes.insert(0, b'1');
    bytes.into_iter().map(char::from).collect()
}

/// Walks a fully assembled canvas and streams G-code rows to a sink
pub struct Rasterizer<'a> {
    settings: &'a Settings,
    canvas: &'a Canvas,
}

impl<'a> Rasterizer<'a> {
    pub fn new(settings: &'a Settings, canvas: &'a Canvas) -> Self {
        Self { settings, canvas }
    }

    /// Half a beam width, centering each move on its pixel
    fn offset(&self) -> f64 {
        self.settings.beam_size * 1000.0 / 2000.0
    }

    fn to_mm(&self, pixel: u32) -> f64 {
        pixel as f64 * self.settings.beam_size + self.offset()
    }

    /// Emit the header, every row from the bottom up, then `Event::Finished`.
    ///
    /// Any lookup failure stops the scan; rows already emitted stay emitted
    /// and no `Finished` event is sent.
    pub fn run<S: EventSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        let height = self.canvas.height();
        info!(
            width = self.canvas.width(),
            height,
            trim = self.settings.trim_line,
            "Rasterizing"
        );

        sink.emit(Event::header(header(self.settings)))?;

        let mut reverse = true;
        for row in (0..height).rev() {
            reverse = !reverse;

            match self.scan_row(row, reverse)? {
                Some(text) => {
                    trace!(row, reverse, "Row complete");
                    sink.emit(Event::row(row, text))?;
                }
                None => warn!(row, "Skipping blank row"),
            }
        }

        sink.emit(Event::Finished)?;
        info!("Rasterization finished");
        Ok(())
    }

    /// G-code for one row, or `None` when trimming leaves nothing to engrave
    pub fn scan_row(&self, row: u32, reverse: bool) -> Result<Option<String>> {
        let range = if self.settings.trim_line {
            match trim_row(self.canvas, row)? {
                Some(range) => range,
                None => return Ok(None),
            }
        } else {
            TrimRange::full(self.canvas.width())
        };

        let entry = if reverse {
            range.start + range.length()
        } else {
            range.start
        };
        let y = (self.canvas.height() - 1 - row) as f64 * self.settings.beam_size + self.offset();

        let mut lines = Vec::with_capacity(range.length() as usize + 2);
        lines.push(format!(
            "G0 X{} Y{}",
            to_fixed(self.to_mm(entry), 2),
            to_fixed(y, 2)
        ));

        let columns: Box<dyn Iterator<Item = u32>> = if reverse {
            Box::new((range.start..=range.end).rev())
        } else {
            Box::new(range.start..=range.end)
        };
        for x in columns {
            let power = self.canvas.power(x, row)?;
            lines.push(format!(
                "G1 X{} S{}",
                to_fixed(self.to_mm(x), 2),
                to_fixed(power, 4)
            ));
        }

        Ok(Some(lines.join("\n")))
    }
}
