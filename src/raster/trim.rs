use super::canvas::Canvas;
use crate::error::Result;

/// Inclusive column span of a row that needs engraving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimRange {
    pub start: u32,
    pub end: u32,
}

impl TrimRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// The whole row, used when trimming is disabled. `width` must be non-zero.
    pub fn full(width: u32) -> Self {
        Self::new(0, width - 1)
    }

    pub fn length(&self) -> u32 {
        self.end - self.start
    }
}

/// Find the first and last columns of `row` with non-zero darkness.
///
/// Scans inward from both ends at once and stops as soon as both bounds
/// are known. Returns `None` for a row with no dark pixel.
pub fn trim_row(canvas: &Canvas, row: u32) -> Result<Option<TrimRange>> {
    let last = canvas.width() - 1;
    let mut start = None;
    let mut end = None;

    for x in 0..=last {
        if start.is_none() && canvas.darkness(x, row)? > 0.0 {
            start = Some(x);
        }
        if end.is_none() && canvas.darkness(last - x, row)? > 0.0 {
            end = Some(last - x);
        }
        if let (Some(start), Some(end)) = (start, end) {
            return Ok(Some(TrimRange::new(start, end)));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Settings;

    fn canvas_from_row(values: &[u8]) -> Canvas {
        let width = values.len() as u32;
        let mut canvas = Canvas::new(&Settings::new(width, 1, width)).unwrap();
        let data = values.iter().flat_map(|&v| [v, v, v, 255]).collect();
        canvas.insert_tile(0, 0, data).unwrap();
        canvas
    }

    #[test]
    fn test_single_pixel() {
        for k in 0..5 {
            let mut row = [255u8; 5];
            row[k] = 0;
            let range = trim_row(&canvas_from_row(&row), 0).unwrap().unwrap();
            assert_eq!(range, TrimRange::new(k as u32, k as u32));
            assert_eq!(range.length(), 0);
        }
    }

    #[test]
    fn test_margins_trimmed() {
        let canvas = canvas_from_row(&[255, 255, 10, 255, 200, 255]);
        let range = trim_row(&canvas, 0).unwrap().unwrap();
        assert_eq!(range, TrimRange::new(2, 4));
        assert_eq!(range.length(), 2);
    }

    #[test]
    fn test_light_gray_counts_as_present() {
        let canvas = canvas_from_row(&[255, 254, 255]);
        assert_eq!(trim_row(&canvas, 0).unwrap(), Some(TrimRange::new(1, 1)));
    }

    #[test]
    fn test_blank_row() {
        let canvas = canvas_from_row(&[255, 255, 255]);
        assert_eq!(trim_row(&canvas, 0).unwrap(), None);
    }

    #[test]
    fn test_full_range() {
        let range = TrimRange::full(8);
        assert_eq!(range, TrimRange::new(0, 7));
        assert_eq!(range.length(), 7);
    }

    #[test]
    fn test_row_out_of_range() {
        let canvas = canvas_from_row(&[0]);
        assert!(trim_row(&canvas, 1).is_err());
    }
}
