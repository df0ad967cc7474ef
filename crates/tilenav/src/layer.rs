//! Input abstractions for mesh construction.
//!
//! The host engine owns the tile map; the builder only needs per-tile
//! values and the layer dimensions, so that is all these traits expose.

/// Read-only view of one tile layer, consumed at build time.
pub trait TileLayer {
    /// Number of tiles along the x-axis.
    fn width(&self) -> u32;
    /// Number of tiles along the y-axis.
    fn height(&self) -> u32;
    /// Raw tile value at the given grid coordinate. Zero means "empty".
    ///
    /// Out-of-range coordinates must return zero.
    fn tile(&self, x: u32, y: u32) -> u32;
}

/// A named collection of tile layers, as found in a larger tile map.
pub trait TileMap {
    /// Looks up a layer by name. `None` if no such layer exists.
    fn layer(&self, name: &str) -> Option<&dyn TileLayer>;
}

/// A plain in-memory tile layer.
///
/// Useful for tests and for engines that don't have a native tile-map
/// representation to adapt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct GridLayer {
    width: u32,
    height: u32,
    tiles: Vec<u32>,
}

impl GridLayer {
    /// Creates a layer from row-major tile values.
    ///
    /// The value vector is truncated or zero-padded to `width * height`.
    pub fn new(width: u32, height: u32, mut tiles: Vec<u32>) -> Self {
        tiles.resize((width * height) as usize, 0);
        Self {
            width,
            height,
            tiles,
        }
    }

    /// Creates a layer where every tile has the same value.
    pub fn filled(width: u32, height: u32, value: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![value; (width * height) as usize],
        }
    }

    /// Creates a layer from ASCII art: `#` becomes tile value 1, anything
    /// else becomes 0. One text line per tile row; ragged lines are
    /// zero-padded to the widest line.
    pub fn from_ascii(art: &str) -> Self {
        let rows: Vec<&str> = art.lines().map(str::trim).collect();
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0) as u32;
        let height = rows.len() as u32;
        let mut tiles = vec![0; (width * height) as usize];
        for (y, row) in rows.iter().enumerate() {
            for (x, symbol) in row.chars().enumerate() {
                if symbol == '#' {
                    tiles[y * width as usize + x] = 1;
                }
            }
        }
        Self {
            width,
            height,
            tiles,
        }
    }

    /// Sets one tile value. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: u32, y: u32, value: u32) {
        if x < self.width && y < self.height {
            self.tiles[(y * self.width + x) as usize] = value;
        }
    }
}

impl TileLayer for GridLayer {
    #[inline]
    fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn tile(&self, x: u32, y: u32) -> u32 {
        if x < self.width && y < self.height {
            self.tiles[(y * self.width + x) as usize]
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_art_maps_hashes_to_filled_tiles() {
        let layer = GridLayer::from_ascii(
            "##.\n\
             .#",
        );
        assert_eq!(layer.width(), 3);
        assert_eq!(layer.height(), 2);
        assert_eq!(layer.tile(0, 0), 1);
        assert_eq!(layer.tile(1, 0), 1);
        assert_eq!(layer.tile(2, 0), 0);
        assert_eq!(layer.tile(0, 1), 0);
        assert_eq!(layer.tile(1, 1), 1);
        // Ragged line is zero-padded.
        assert_eq!(layer.tile(2, 1), 0);
    }

    #[test]
    fn out_of_range_tiles_read_as_empty() {
        let layer = GridLayer::filled(2, 2, 7);
        assert_eq!(layer.tile(1, 1), 7);
        assert_eq!(layer.tile(2, 0), 0);
        assert_eq!(layer.tile(0, 2), 0);
    }

    #[test]
    fn value_vector_is_padded_to_grid_size() {
        let layer = GridLayer::new(3, 2, vec![1, 2]);
        assert_eq!(layer.tile(1, 0), 2);
        assert_eq!(layer.tile(2, 1), 0);
    }
}
