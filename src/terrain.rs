// MIT License
//
// Copyright (c) 2024 Erik Holum
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Terrain grids the planner grows over.
//!
//! The planner only needs the [`TerrainMap`] trait. [`TerrainGrid`] is a
//! plain in-memory implementation that can be parsed from the character map
//! format:
//!
//! ```text
//! type octile
//! height 2
//! width 3
//! map
//! ..T
//! SWW
//! ```
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::MapError;

/// Category of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerrainCategory {
    /// Normal passable ground.
    Terrain,
    OutOfBounds,
    /// Blocker standing on the ground, e.g. a tree.
    Obstacle,
    Swamp,
    /// Only traversable by sea or air.
    Water,
}

impl TerrainCategory {
    /// Whether a cell of this category can be entered when moving from a `base` cell.
    ///
    /// An `OutOfBounds` or `Obstacle` base accepts anything that is not a
    /// blocker, a `Water` base only accepts water and every other base only
    /// accepts `Terrain` and `Swamp`.
    #[must_use]
    pub fn is_passable_from(self, base: TerrainCategory) -> bool {
        match base {
            TerrainCategory::OutOfBounds | TerrainCategory::Obstacle => !matches!(
                self,
                TerrainCategory::OutOfBounds | TerrainCategory::Obstacle
            ),
            TerrainCategory::Water => self == TerrainCategory::Water,
            TerrainCategory::Terrain | TerrainCategory::Swamp => {
                matches!(self, TerrainCategory::Terrain | TerrainCategory::Swamp)
            }
        }
    }

    /// Map character for this category, the inverse of [`TerrainCategory::from_char`].
    #[must_use]
    pub fn to_char(self) -> char {
        match self {
            TerrainCategory::Terrain => '.',
            TerrainCategory::OutOfBounds => '@',
            TerrainCategory::Obstacle => 'T',
            TerrainCategory::Swamp => 'S',
            TerrainCategory::Water => 'W',
        }
    }

    /// Parses a single map character.
    ///
    /// # Errors
    ///
    /// If the character does not name a category.
    pub fn from_char(tile: char) -> Result<Self, MapError> {
        match tile {
            '.' | 'G' => Ok(TerrainCategory::Terrain),
            '@' | 'O' => Ok(TerrainCategory::OutOfBounds),
            'T' => Ok(TerrainCategory::Obstacle),
            'S' => Ok(TerrainCategory::Swamp),
            'W' => Ok(TerrainCategory::Water),
            other => Err(MapError::InvalidTile(other)),
        }
    }
}

/// Integer cell coordinate on a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridCoord {
    pub x: u32,
    pub y: u32,
}

impl GridCoord {
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        GridCoord { x, y }
    }

    /// `|dx| + |dy|`
    #[must_use]
    pub fn manhattan(&self, other: &GridCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Read access to a rectangular terrain grid.
pub trait TerrainMap {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Total number of cells, `width * height`.
    fn cell_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Category of the cell at `(x, y)`, `None` if it lies outside the grid.
    fn terrain_at(&self, x: u32, y: u32) -> Option<TerrainCategory>;

    fn contains(&self, position: GridCoord) -> bool {
        position.x < self.width() && position.y < self.height()
    }

    /// Row-major index of `position`, `None` if it lies outside the grid.
    fn flat_index(&self, position: GridCoord) -> Option<usize> {
        self.contains(position)
            .then(|| position.x as usize + position.y as usize * self.width() as usize)
    }
}

/// Checks whether `position` can be entered from a `base` cell.
///
/// Returns `None` if `position` is outside the map.
pub fn is_valid_tile<M: TerrainMap + ?Sized>(
    map: &M,
    position: GridCoord,
    base: TerrainCategory,
) -> Option<bool> {
    map.terrain_at(position.x, position.y)
        .map(|category| category.is_passable_from(base))
}

/// Simple in-memory terrain, stored row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainGrid {
    width: u32,
    height: u32,
    tiles: Vec<TerrainCategory>,
}

impl TerrainGrid {
    /// A `width` x `height` grid with every cell set to `category`.
    ///
    /// # Errors
    ///
    /// If either dimension is zero.
    pub fn filled(width: u32, height: u32, category: TerrainCategory) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::InvalidDimensions { width, height });
        }
        Ok(TerrainGrid {
            width,
            height,
            tiles: vec![category; width as usize * height as usize],
        })
    }

    /// Builds a grid from rows of map characters, top row first.
    ///
    /// # Errors
    ///
    /// If there are no rows, rows differ in length, or a character is unknown.
    pub fn from_rows(rows: &[&str]) -> Result<Self, MapError> {
        let width = rows.first().map_or(0, |row| row.chars().count());
        let mut tiles = Vec::with_capacity(width * rows.len());
        for row in rows {
            let before = tiles.len();
            for tile in row.chars() {
                tiles.push(TerrainCategory::from_char(tile)?);
            }
            if tiles.len() - before != width {
                return Err(MapError::TileCount {
                    expected: width * rows.len(),
                    found: before + row.chars().count(),
                });
            }
        }

        let invalid = || MapError::InvalidDimensions {
            width: u32::try_from(width).unwrap_or(u32::MAX),
            height: u32::try_from(rows.len()).unwrap_or(u32::MAX),
        };
        let width = u32::try_from(width).map_err(|_| invalid())?;
        let height = u32::try_from(rows.len()).map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }

        Ok(TerrainGrid {
            width,
            height,
            tiles,
        })
    }

    /// Reads a grid from a map file.
    ///
    /// # Errors
    ///
    /// If the file cannot be read or is not a valid map.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        std::fs::read_to_string(path)?.parse()
    }

    /// Overwrites the category of one cell, ignoring positions outside the grid.
    pub fn set(&mut self, position: GridCoord, category: TerrainCategory) {
        if let Some(index) = self.flat_index(position) {
            self.tiles[index] = category;
        }
    }

}

impl TerrainMap for TerrainGrid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn cell_count(&self) -> usize {
        self.tiles.len()
    }

    fn terrain_at(&self, x: u32, y: u32) -> Option<TerrainCategory> {
        self.flat_index(GridCoord::new(x, y)).map(|index| self.tiles[index])
    }
}

// Map files must declare widths and heights below this.
const MAX_DIMENSION: u32 = 0x7fff_ffff;

// Pulls the value following `key` out of a header line such as "height 32".
fn header_value(line: Option<&str>, key: &str) -> Result<u32, MapError> {
    let line = line.ok_or_else(|| MapError::InvalidHeader(format!("missing `{key}` line")))?;
    let mut words = line.split_whitespace();
    if words.next() != Some(key) {
        return Err(MapError::InvalidHeader(format!(
            "expected `{key}`, found {line:?}"
        )));
    }
    words
        .next()
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| MapError::InvalidHeader(format!("bad `{key}` value in {line:?}")))
}

impl FromStr for TerrainGrid {
    type Err = MapError;

    /// Parses the four line header (`type`, `height`, `width`, `map`) followed
    /// by one character per cell. Whitespace between cells is ignored.
    ///
    /// The `height` and `width` lines must appear in that order and start with
    /// their key word, a header with any other key is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines();
        if lines.next().is_none() {
            return Err(MapError::InvalidHeader("empty map".to_string()));
        }
        let height = header_value(lines.next(), "height")?;
        let width = header_value(lines.next(), "width")?;
        if lines.next().is_none() {
            return Err(MapError::InvalidHeader("missing `map` line".to_string()));
        }
        if width == 0 || height == 0 || width >= MAX_DIMENSION || height >= MAX_DIMENSION {
            return Err(MapError::InvalidDimensions { width, height });
        }

        let tiles = lines
            .flat_map(str::chars)
            .filter(|c| !c.is_whitespace())
            .map(TerrainCategory::from_char)
            .collect::<Result<Vec<_>, _>>()?;

        let expected = width as usize * height as usize;
        if tiles.len() != expected {
            return Err(MapError::TileCount {
                expected,
                found: tiles.len(),
            });
        }

        Ok(TerrainGrid {
            width,
            height,
            tiles,
        })
    }
}
