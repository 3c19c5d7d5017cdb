//! World Collision
//!
//! The simulation only ever asks the world one question: does this rectangle
//! overlap solid geometry? `CollisionProbe` is that contract. Level geometry
//! is immutable during play, so implementations must be pure.
//!
//! `TileMap` is the grid implementation used by the demo binary and tests.

use crate::core::rect::Rect;

/// Read-only query into solid world geometry.
pub trait CollisionProbe {
    /// True if `rect` overlaps any solid geometry.
    fn intersects_solid(&self, rect: &Rect) -> bool;
}

impl<T: CollisionProbe + ?Sized> CollisionProbe for &T {
    fn intersects_solid(&self, rect: &Rect) -> bool {
        (**self).intersects_solid(rect)
    }
}

impl<T: CollisionProbe + ?Sized> CollisionProbe for Box<T> {
    fn intersects_solid(&self, rect: &Rect) -> bool {
        (**self).intersects_solid(rect)
    }
}

/// Solid-or-empty tile grid. Tile (0, 0) is the bottom-left tile and sits
/// at world origin. Space outside the grid is empty.
#[derive(Clone, Debug)]
pub struct TileMap {
    width: usize,
    height: usize,
    tile_size: f32,
    solid: Vec<bool>,
}

impl TileMap {
    /// Create an empty map.
    pub fn new(width: usize, height: usize, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
            solid: vec![false; width * height],
        }
    }

    /// Build from ASCII rows, top row first. `#` is solid, anything else empty.
    ///
    /// ```
    /// use sidescroll::game::world::{CollisionProbe, TileMap};
    /// use sidescroll::core::Rect;
    ///
    /// let map = TileMap::from_rows(&["....", "####"], 16.0);
    /// assert!(map.intersects_solid(&Rect::new(0.0, 8.0, 4.0, 4.0)));
    /// assert!(!map.intersects_solid(&Rect::new(0.0, 16.0, 4.0, 4.0)));
    /// ```
    pub fn from_rows(rows: &[&str], tile_size: f32) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut map = Self::new(width, height, tile_size);

        for (row_idx, row) in rows.iter().enumerate() {
            let ty = height - 1 - row_idx;
            for (tx, ch) in row.chars().enumerate() {
                if ch == '#' {
                    map.set_solid(tx, ty, true);
                }
            }
        }
        map
    }

    /// Mark a tile solid or empty. Out-of-range tiles are ignored.
    pub fn set_solid(&mut self, tx: usize, ty: usize, solid: bool) {
        if tx < self.width && ty < self.height {
            self.solid[ty * self.width + tx] = solid;
        }
    }

    /// Check a single tile. Out-of-range tiles are empty.
    pub fn is_solid(&self, tx: i64, ty: i64) -> bool {
        if tx < 0 || ty < 0 || tx >= self.width as i64 || ty >= self.height as i64 {
            return false;
        }
        self.solid[ty as usize * self.width + tx as usize]
    }

    /// Edge length of one tile.
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// World-space size of the grid.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    /// Tile index span covered by `[lo, hi)`. Touching a tile edge does not
    /// count as covering the tile.
    fn span(&self, lo: f32, hi: f32) -> (i64, i64) {
        let first = (lo / self.tile_size).floor() as i64;
        let last = (hi / self.tile_size).ceil() as i64 - 1;
        (first, last)
    }
}

impl CollisionProbe for TileMap {
    fn intersects_solid(&self, rect: &Rect) -> bool {
        if rect.w <= 0.0 || rect.h <= 0.0 {
            return false;
        }
        let (x0, x1) = self.span(rect.left(), rect.right());
        let (y0, y1) = self.span(rect.bottom(), rect.top());

        // Clamp to grid so huge rects don't iterate empty space
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(self.width as i64 - 1);
        let y1 = y1.min(self.height as i64 - 1);

        for ty in y0..=y1 {
            for tx in x0..=x1 {
                if self.is_solid(tx, ty) {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> TileMap {
        TileMap::from_rows(
            &[
                "#....#",
                "#....#",
                "######",
            ],
            16.0,
        )
    }

    #[test]
    fn test_from_rows_orientation() {
        let map = sample_map();
        // Bottom row is solid
        assert!(map.is_solid(2, 0));
        // Top row only has walls
        assert!(map.is_solid(0, 2));
        assert!(!map.is_solid(2, 2));
        assert_eq!(map.bounds(), Rect::new(0.0, 0.0, 96.0, 48.0));
    }

    #[test]
    fn test_resting_on_floor_is_not_overlap() {
        let map = sample_map();
        let standing = Rect::new(20.0, 16.0, 10.0, 20.0);
        assert!(!map.intersects_solid(&standing));

        let sunk = Rect::new(20.0, 15.5, 10.0, 20.0);
        assert!(map.intersects_solid(&sunk));
    }

    #[test]
    fn test_walls() {
        let map = sample_map();
        // Flush against the left wall
        assert!(!map.intersects_solid(&Rect::new(16.0, 16.0, 10.0, 10.0)));
        // Pushed into it
        assert!(map.intersects_solid(&Rect::new(15.0, 16.0, 10.0, 10.0)));
    }

    #[test]
    fn test_outside_grid_is_empty() {
        let map = sample_map();
        assert!(!map.intersects_solid(&Rect::new(-100.0, -100.0, 10.0, 10.0)));
        assert!(!map.intersects_solid(&Rect::new(200.0, 20.0, 10.0, 10.0)));
        // Degenerate rect
        assert!(!map.intersects_solid(&Rect::new(20.0, 5.0, 0.0, 10.0)));
    }

    #[test]
    fn test_probe_through_reference() {
        let map = sample_map();
        let probe: &dyn CollisionProbe = &map;
        assert!(probe.intersects_solid(&Rect::new(20.0, 5.0, 4.0, 4.0)));
    }
}
