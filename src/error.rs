use thiserror::Error;

/// Errors raised while assembling a canvas or rasterizing it
#[derive(Error, Debug)]
pub enum RasterError {
    /// Pixel coordinate at or beyond the configured image bounds
    #[error("Out of range: x = {x}, y = {y} (image is {width}x{height})")]
    OutOfRange { x: u32, y: u32, width: u32, height: u32 },

    /// Message received before any `init`
    #[error("Session not initialized, send an init message first")]
    UninitializedSession,

    /// Rasterization requested while tiles are still missing
    #[error("Canvas incomplete: {missing} tile(s) missing, first at row {row}, column {col}")]
    IncompleteCanvas { missing: usize, row: u32, col: u32 },

    /// Pixel lookup hit a tile that never arrived
    #[error("Tile at row {row}, column {col} has not been received")]
    MissingTile { row: u32, col: u32 },

    #[error("Tile at row {row}, column {col} is outside the {rows}x{cols} tile grid")]
    TileOutOfGrid { row: u32, col: u32, rows: u32, cols: u32 },

    #[error("Tile at row {row}, column {col} has {len} bytes, expected {expected}")]
    InvalidTileData {
        row: u32,
        col: u32,
        len: usize,
        expected: usize,
    },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    /// The consumer side of an event channel went away
    #[error("Output sink closed")]
    SinkClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RasterError {
    /// Stable name used in outbound error events
    pub fn kind(&self) -> &'static str {
        match self {
            RasterError::OutOfRange { .. } => "OutOfRangeCoordinate",
            RasterError::UninitializedSession => "UninitializedSession",
            RasterError::IncompleteCanvas { .. } => "IncompleteCanvas",
            RasterError::MissingTile { .. } => "MissingTile",
            RasterError::TileOutOfGrid { .. } => "TileOutOfGrid",
            RasterError::InvalidTileData { .. } => "InvalidTileData",
            RasterError::InvalidSettings(_) => "InvalidSettings",
            RasterError::MalformedMessage(_) => "MalformedMessage",
            RasterError::SinkClosed => "SinkClosed",
            RasterError::Io(_) => "Io",
        }
    }
}

pub type Result<T> = std::result::Result<T, RasterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = RasterError::OutOfRange {
            x: 4,
            y: 0,
            width: 4,
            height: 2,
        };
        assert_eq!(err.to_string(), "Out of range: x = 4, y = 0 (image is 4x2)");
        assert_eq!(err.kind(), "OutOfRangeCoordinate");
    }

    #[test]
    fn test_json_error_converts() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: RasterError = json_err.into();
        assert_eq!(err.kind(), "MalformedMessage");
    }
}
