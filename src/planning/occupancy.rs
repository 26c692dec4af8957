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

//! Per-cell lookup of the tree node occupying a grid cell.
use crate::terrain::GridCoord;
use crate::tree::NodeId;

/// One slot per grid cell, holding the handle of the node placed there.
///
/// Slots never own nodes, the [`Tree`](crate::tree::Tree) does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyIndex {
    width: u32,
    height: u32,
    slots: Vec<Option<NodeId>>,
    occupied: usize,
}

impl OccupancyIndex {
    /// An index for a `width` x `height` grid with every cell empty.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        OccupancyIndex {
            width,
            height,
            slots: vec![None; width as usize * height as usize],
            occupied: 0,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `x + y * width`, `None` outside the grid.
    #[must_use]
    pub fn flat_index(&self, position: GridCoord) -> Option<usize> {
        (position.x < self.width && position.y < self.height)
            .then(|| position.x as usize + position.y as usize * self.width as usize)
    }

    // Inverse of `flat_index` for indices below the slot count.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "quotient and remainder are bounded by the u32 grid dimensions"
    )]
    fn coord_of(&self, index: usize) -> GridCoord {
        let width = self.width as usize;
        GridCoord::new((index % width) as u32, (index / width) as u32)
    }

    /// Node occupying `position`, if any.
    #[must_use]
    pub fn get(&self, position: GridCoord) -> Option<NodeId> {
        self.flat_index(position).and_then(|index| self.slots[index])
    }

    /// True if some node occupies `position`. Cells outside the grid are never occupied.
    #[must_use]
    pub fn is_occupied(&self, position: GridCoord) -> bool {
        self.get(position).is_some()
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.occupied
    }

    /// Registers `node` at `position`.
    ///
    /// Returns false, leaving the index untouched, if the cell is outside the
    /// grid or already taken.
    pub fn insert(&mut self, position: GridCoord, node: NodeId) -> bool {
        let Some(index) = self.flat_index(position) else {
            return false;
        };
        if self.slots[index].is_some() {
            return false;
        }
        self.slots[index] = Some(node);
        self.occupied += 1;
        true
    }

    /// Occupied cells in ascending flat index order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, NodeId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|node| (self.coord_of(index), node)))
    }
}
