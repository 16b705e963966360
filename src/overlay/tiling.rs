//! Quadtree tiling schemes and tile addressing.

use super::projection::{Projection, Rectangle};

/// Address of one tile in a quadtree pyramid.
///
/// `x` runs west to east, `y` runs south to north; valid addresses satisfy
/// `x < root_tiles_x * 2^level` and `y < root_tiles_y * 2^level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileAddress {
    pub level: u32,
    pub x: u32,
    pub y: u32,
}

/// A quadtree subdivision of a projected world rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilingScheme {
    pub projection: Projection,
    pub rectangle: Rectangle,
    pub root_tiles_x: u32,
    pub root_tiles_y: u32,
}

impl TilingScheme {
    /// The scheme covering a projection's full world extent with its
    /// natural root tile grid.
    pub fn for_projection(projection: Projection) -> Self {
        let (root_tiles_x, root_tiles_y) = projection.root_tile_counts();
        Self {
            projection,
            rectangle: projection.world_rectangle(),
            root_tiles_x,
            root_tiles_y,
        }
    }

    /// Number of tile columns at a level.
    pub fn tiles_x_at(&self, level: u32) -> u64 {
        (self.root_tiles_x as u64) << level.min(32)
    }

    /// Number of tile rows at a level.
    pub fn tiles_y_at(&self, level: u32) -> u64 {
        (self.root_tiles_y as u64) << level.min(32)
    }

    /// Whether the address is inside the pyramid.
    pub fn contains(&self, address: TileAddress) -> bool {
        (address.x as u64) < self.tiles_x_at(address.level)
            && (address.y as u64) < self.tiles_y_at(address.level)
    }

    /// The row counted from the top of the pyramid instead of the bottom.
    /// Tile-matrix services number rows from the north edge.
    pub fn inverted_row(&self, address: TileAddress) -> u64 {
        self.tiles_y_at(address.level) - 1 - address.y as u64
    }

    /// The projected rectangle a tile covers.
    pub fn tile_rectangle(&self, address: TileAddress) -> Rectangle {
        let columns = self.tiles_x_at(address.level) as f64;
        let rows = self.tiles_y_at(address.level) as f64;
        let tile_width = self.rectangle.width() / columns;
        let tile_height = self.rectangle.height() / rows;
        Rectangle {
            west: self.rectangle.west + tile_width * address.x as f64,
            south: self.rectangle.south + tile_height * address.y as f64,
            east: self.rectangle.west + tile_width * (address.x as f64 + 1.0),
            north: self.rectangle.south + tile_height * (address.y as f64 + 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_counts_double_per_level() {
        let scheme = TilingScheme::for_projection(Projection::Geographic);
        assert_eq!(scheme.tiles_x_at(0), 2);
        assert_eq!(scheme.tiles_y_at(0), 1);
        assert_eq!(scheme.tiles_x_at(3), 16);
        assert_eq!(scheme.tiles_y_at(3), 8);
    }

    #[test]
    fn test_contains_rejects_out_of_range() {
        let scheme = TilingScheme::for_projection(Projection::WebMercator);
        assert!(scheme.contains(TileAddress { level: 2, x: 3, y: 3 }));
        assert!(!scheme.contains(TileAddress { level: 2, x: 4, y: 0 }));
        assert!(!scheme.contains(TileAddress { level: 0, x: 0, y: 1 }));
    }

    #[test]
    fn test_inverted_row_counts_from_top() {
        let scheme = TilingScheme::for_projection(Projection::WebMercator);
        // 8 rows at level 3: y = 5 from the bottom is row 2 from the top.
        assert_eq!(scheme.inverted_row(TileAddress { level: 3, x: 2, y: 5 }), 2);
        assert_eq!(scheme.inverted_row(TileAddress { level: 0, x: 0, y: 0 }), 0);
    }

    #[test]
    fn test_tile_rectangle_tiles_the_world() {
        let scheme = TilingScheme::for_projection(Projection::WebMercator);
        let south_west = scheme.tile_rectangle(TileAddress { level: 1, x: 0, y: 0 });
        let north_east = scheme.tile_rectangle(TileAddress { level: 1, x: 1, y: 1 });
        assert!((south_west.west - scheme.rectangle.west).abs() < 1e-6);
        assert!((south_west.east - north_east.west).abs() < 1e-6);
        assert!((north_east.north - scheme.rectangle.north).abs() < 1e-6);
    }
}
