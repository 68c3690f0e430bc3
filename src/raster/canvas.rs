//! Canvas assembled from RGBA tiles
//!
//! The source image arrives as a grid of `buffer_size` square tiles. Each
//! tile is kept as its own `RgbaImage`; lookups resolve an absolute pixel to
//! its owning tile and local offset.

use super::power::PowerMapper;
use crate::error::{RasterError, Result};
use crate::types::Settings;
use image::{Rgba, RgbaImage};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    tile_size: u32,
    mapper: PowerMapper,
    /// Keyed by (tile row, tile column)
    tiles: BTreeMap<(u32, u32), RgbaImage>,
}

impl Canvas {
    /// Empty canvas for `settings`, which are validated first
    pub fn new(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            width: settings.image_size.width,
            height: settings.image_size.height,
            tile_size: settings.buffer_size,
            mapper: PowerMapper::from_beam_power(&settings.beam_power),
            tiles: BTreeMap::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mapper(&self) -> &PowerMapper {
        &self.mapper
    }

    /// Tile grid dimensions as (rows, columns)
    pub fn grid_size(&self) -> (u32, u32) {
        (
            self.height.div_ceil(self.tile_size),
            self.width.div_ceil(self.tile_size),
        )
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Pixel extent of the tile at (row, col) once clipped to the image
    fn clipped_extent(&self, row: u32, col: u32) -> (u32, u32) {
        let w = (self.width - col * self.tile_size).min(self.tile_size);
        let h = (self.height - row * self.tile_size).min(self.tile_size);
        (w, h)
    }

    /// Store tile `(row, col)`, replacing any tile already there.
    ///
    /// Edge tiles may be sent either clipped to the image or at full
    /// `buffer_size`; any other byte length is rejected.
    pub fn insert_tile(&mut self, col: u32, row: u32, data: Vec<u8>) -> Result<()> {
        let (rows, cols) = self.grid_size();
        if row >= rows || col >= cols {
            return Err(RasterError::TileOutOfGrid {
                row,
                col,
                rows,
                cols,
            });
        }

        let (clip_w, clip_h) = self.clipped_extent(row, col);
        let clipped_len = rgba_len(clip_w, clip_h);
        let full_len = rgba_len(self.tile_size, self.tile_size);

        let (w, h) = if data.len() as u64 == clipped_len {
            (clip_w, clip_h)
        } else if data.len() as u64 == full_len {
            (self.tile_size, self.tile_size)
        } else {
            return Err(RasterError::InvalidTileData {
                row,
                col,
                len: data.len(),
                expected: clipped_len as usize,
            });
        };

        let len = data.len();
        let tile = RgbaImage::from_raw(w, h, data).ok_or(RasterError::InvalidTileData {
            row,
            col,
            len,
            expected: clipped_len as usize,
        })?;

        if self.tiles.insert((row, col), tile).is_some() {
            warn!(row, col, "Replacing previously received tile");
        } else {
            debug!(row, col, width = w, height = h, "Tile received");
        }
        Ok(())
    }

    /// Grid positions still waiting for a tile, row-major
    pub fn missing_tiles(&self) -> Vec<(u32, u32)> {
        let (rows, cols) = self.grid_size();
        (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (row, col)))
            .filter(|key| !self.tiles.contains_key(key))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_tiles().is_empty()
    }

    pub fn ensure_complete(&self) -> Result<()> {
        let missing = self.missing_tiles();
        match missing.first() {
            None => Ok(()),
            Some(&(row, col)) => Err(RasterError::IncompleteCanvas {
                missing: missing.len(),
                row,
                col,
            }),
        }
    }

    fn pixel(&self, x: u32, y: u32) -> Result<Rgba<u8>> {
        if x >= self.width || y >= self.height {
            return Err(RasterError::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        let row = y / self.tile_size;
        let col = x / self.tile_size;
        let tile = self
            .tiles
            .get(&(row, col))
            .ok_or(RasterError::MissingTile { row, col })?;

        Ok(*tile.get_pixel(x % self.tile_size, y % self.tile_size))
    }

    /// Raw darkness of a pixel in [0, 1]: 0 is white, 1 is black. Alpha is ignored.
    pub fn darkness(&self, x: u32, y: u32) -> Result<f64> {
        let Rgba([r, g, b, _]) = self.pixel(x, y)?;
        let average = (r as f64 + g as f64 + b as f64) / 3.0;
        Ok((255.0 - average) / 255.0)
    }

    /// Darkness mapped into the configured beam power range
    pub fn power(&self, x: u32, y: u32) -> Result<f64> {
        Ok(self.mapper.map(self.darkness(x, y)?))
    }
}

/// Byte length of a `w` x `h` RGBA buffer, widened so large tiles cannot overflow
fn rgba_len(w: u32, h: u32) -> u64 {
    w as u64 * h as u64 * 4
}
