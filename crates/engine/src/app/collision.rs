use thiserror::Error;

use super::geometry::Rect;

pub const NO_COLLIDER: i32 = -1;
/// Code reported for tiles outside the grid: the whole, unshifted tile.
pub const OUT_OF_BOUNDS_CODE: i32 = 0;

const INSET_SPAN: i32 = 32;
const CODE_LIMIT: i32 = INSET_SPAN * 4;

/// Direction a partial collider is pushed away from its tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderShift {
    Down,
    Up,
    Right,
    Left,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollisionGridError {
    #[error("collision code count mismatch: expected {expected}, got {actual}")]
    CodeCountMismatch { expected: usize, actual: usize },
    #[error("collision code {code} at tile ({x}, {y}) is outside -1..128")]
    InvalidCode { x: u32, y: u32, code: i32 },
}

/// Splits a non-empty code into its shift direction and pixel inset.
/// Returns `None` for [`NO_COLLIDER`] and for codes that cannot be decoded.
pub fn decode_collision_code(code: i32) -> Option<(ColliderShift, f32)> {
    if !(0..CODE_LIMIT).contains(&code) {
        return None;
    }
    let shift = match code / INSET_SPAN {
        0 => ColliderShift::Down,
        1 => ColliderShift::Up,
        2 => ColliderShift::Right,
        _ => ColliderShift::Left,
    };
    Some((shift, (code % INSET_SPAN) as f32))
}

/// Per-map grid of directional collision codes, row-major `height x width`.
///
/// Tile `(x, y)` covers `[x * tile_size, (x + 1) * tile_size)` horizontally and
/// the same range vertically, with y growing downward.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionGrid {
    width: u32,
    height: u32,
    tile_size: f32,
    codes: Vec<i32>,
}

impl CollisionGrid {
    pub fn new(
        width: u32,
        height: u32,
        tile_size: f32,
        codes: Vec<i32>,
    ) -> Result<Self, CollisionGridError> {
        let expected = width as usize * height as usize;
        let actual = codes.len();
        if expected != actual {
            return Err(CollisionGridError::CodeCountMismatch { expected, actual });
        }
        for (index, &code) in codes.iter().enumerate() {
            if code != NO_COLLIDER && !(0..CODE_LIMIT).contains(&code) {
                return Err(CollisionGridError::InvalidCode {
                    x: (index % width as usize) as u32,
                    y: (index / width as usize) as u32,
                    code,
                });
            }
        }
        Ok(Self {
            width,
            height,
            tile_size,
            codes,
        })
    }

    pub fn empty(width: u32, height: u32, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
            codes: vec![NO_COLLIDER; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn index_of(&self, tile_x: i32, tile_y: i32) -> Option<usize> {
        if tile_x < 0 || tile_y < 0 || tile_x >= self.width as i32 || tile_y >= self.height as i32
        {
            return None;
        }
        Some(tile_y as usize * self.width as usize + tile_x as usize)
    }

    pub fn collision_code(&self, tile_x: i32, tile_y: i32) -> i32 {
        match self.index_of(tile_x, tile_y) {
            Some(index) => self.codes[index],
            None => OUT_OF_BOUNDS_CODE,
        }
    }

    /// Concrete collider for `code` at tile `(tile_x, tile_y)`.
    ///
    /// # Panics
    ///
    /// Panics if `code` is not in `0..128`; grids reject such codes on
    /// construction, so reaching this is a caller bug.
    pub fn tile_collider(&self, tile_x: i32, tile_y: i32, code: i32) -> Rect {
        let Some((shift, inset)) = decode_collision_code(code) else {
            panic!("collision code {code} at tile ({tile_x}, {tile_y}) cannot be decoded");
        };
        let base_x = tile_x as f32 * self.tile_size;
        let base_y = tile_y as f32 * self.tile_size;
        let (x, y) = match shift {
            ColliderShift::Down => (base_x, base_y + inset),
            ColliderShift::Up => (base_x, base_y - inset),
            ColliderShift::Right => (base_x + inset, base_y),
            ColliderShift::Left => (base_x - inset, base_y),
        };
        Rect::new(x, y, self.tile_size, self.tile_size)
    }

    /// Colliders of every non-empty tile within one tile of `query`, row by
    /// row. The margin catches partial colliders pushed into a neighbour.
    pub fn colliders_near(&self, query: Rect) -> impl Iterator<Item = Rect> + '_ {
        let ts = self.tile_size;
        let left = (query.x / ts - 1.0).floor() as i32;
        let right = (query.right() / ts + 1.0).floor() as i32;
        let top = (query.y / ts - 1.0).floor() as i32;
        let bottom = (query.bottom() / ts + 1.0).floor() as i32;

        (top..=bottom).flat_map(move |tile_y| {
            (left..=right).filter_map(move |tile_x| {
                let code = self.collision_code(tile_x, tile_y);
                (code != NO_COLLIDER).then(|| self.tile_collider(tile_x, tile_y, code))
            })
        })
    }

    pub fn query_box(&self, query: Rect) -> bool {
        self.colliders_near(query)
            .any(|collider| collider.intersects(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: f32 = 32.0;

    fn grid_with(width: u32, height: u32, cells: &[(i32, i32, i32)]) -> CollisionGrid {
        let mut codes = vec![NO_COLLIDER; (width * height) as usize];
        for &(x, y, code) in cells {
            codes[(y as u32 * width + x as u32) as usize] = code;
        }
        CollisionGrid::new(width, height, TS, codes).expect("grid")
    }

    #[test]
    fn rejects_code_count_mismatch() {
        let err = CollisionGrid::new(2, 2, TS, vec![-1, -1, -1]).expect_err("err");
        assert_eq!(
            err,
            CollisionGridError::CodeCountMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn rejects_undecodable_codes() {
        let err = CollisionGrid::new(2, 1, TS, vec![-1, 128]).expect_err("err");
        assert_eq!(
            err,
            CollisionGridError::InvalidCode {
                x: 1,
                y: 0,
                code: 128
            }
        );
        assert!(CollisionGrid::new(1, 1, TS, vec![-2]).is_err());
    }

    #[test]
    fn out_of_range_lookup_is_solid() {
        let grid = CollisionGrid::empty(3, 3, TS);
        assert_eq!(grid.collision_code(-1, 0), OUT_OF_BOUNDS_CODE);
        assert_eq!(grid.collision_code(0, 3), OUT_OF_BOUNDS_CODE);
        assert_eq!(grid.collision_code(1, 1), NO_COLLIDER);
    }

    #[test]
    fn boxes_outside_the_grid_are_solid() {
        let grid = CollisionGrid::empty(4, 3, TS);
        let outside = [
            Rect::new(-100.0, 10.0, 10.0, 10.0),
            Rect::new(4.0 * TS + 5.0, 40.0, 8.0, 8.0),
            Rect::new(30.0, -50.0, 20.0, 8.0),
            Rect::new(60.0, 3.0 * TS + 0.5, 20.0, 8.0),
            Rect::new(-400.0, -400.0, 1.0, 1.0),
        ];
        for query in outside {
            assert!(grid.query_box(query), "query={query:?}");
        }
    }

    #[test]
    fn empty_grid_never_collides_in_bounds() {
        let grid = CollisionGrid::empty(4, 3, TS);
        let mut y = 0.0;
        while y + 8.0 <= 3.0 * TS {
            let mut x = 0.0;
            while x + 20.0 <= 4.0 * TS {
                assert!(!grid.query_box(Rect::new(x, y, 20.0, 8.0)), "x={x} y={y}");
                x += 7.0;
            }
            y += 5.0;
        }
    }

    #[test]
    fn zero_inset_codes_decode_to_the_full_tile() {
        let grid = CollisionGrid::empty(4, 4, TS);
        for code in [0, 32, 64, 96] {
            assert_eq!(
                grid.tile_collider(2, 1, code),
                Rect::new(64.0, 32.0, TS, TS),
                "code={code}"
            );
        }
    }

    #[test]
    fn insets_shift_in_the_encoded_direction() {
        let grid = CollisionGrid::empty(4, 4, TS);
        assert_eq!(grid.tile_collider(1, 1, 5), Rect::new(32.0, 37.0, TS, TS));
        assert_eq!(grid.tile_collider(1, 1, 37), Rect::new(32.0, 27.0, TS, TS));
        assert_eq!(grid.tile_collider(1, 1, 69), Rect::new(37.0, 32.0, TS, TS));
        assert_eq!(grid.tile_collider(1, 1, 101), Rect::new(27.0, 32.0, TS, TS));
        assert_eq!(grid.tile_collider(1, 1, 127), Rect::new(1.0, 32.0, TS, TS));
    }

    #[test]
    fn decoding_is_deterministic() {
        let grid = CollisionGrid::empty(4, 4, TS);
        for code in 0..128 {
            assert_eq!(grid.tile_collider(3, 2, code), grid.tile_collider(3, 2, code));
        }
    }

    #[test]
    #[should_panic(expected = "cannot be decoded")]
    fn decoding_an_invalid_code_panics() {
        let grid = CollisionGrid::empty(1, 1, TS);
        let _ = grid.tile_collider(0, 0, 128);
    }

    #[test]
    fn shifted_neighbour_collider_is_caught_by_the_margin() {
        // Tile (1, 0) is pushed 31 px down, almost entirely into row 1.
        let grid = grid_with(3, 3, &[(1, 0, 31)]);
        let query = Rect::new(40.0, 50.0, 10.0, 8.0);
        assert_eq!(grid.collision_code(1, 1), NO_COLLIDER);
        assert!(grid.query_box(query));
        assert!(!grid.query_box(query.translated(0.0, 20.0)));
    }

    #[test]
    fn colliders_near_lists_examined_tiles() {
        let grid = grid_with(5, 5, &[(2, 2, 0), (4, 4, 0)]);
        let near: Vec<Rect> = grid
            .colliders_near(Rect::new(64.0, 64.0, 10.0, 10.0))
            .collect();
        assert_eq!(near, vec![Rect::new(64.0, 64.0, TS, TS)]);
    }
}
