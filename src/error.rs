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

//! Error types for the tree container, the growth engine and terrain loading.
//!
//! These only describe caller contract violations and load failures. The
//! ordinary "nothing happened" results of a growth step are reported through
//! [`GrowthOutcome`](crate::planning::rrt::GrowthOutcome) instead.

use thiserror::Error;

use crate::tree::NodeId;

/// Misuse of a [`Tree`](crate::tree::Tree).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The handle was removed, or belongs to another tree.
    #[error("node {0:?} is not alive in this tree")]
    StaleNode(NodeId),

    #[error("child index {index} is out of range for a node with {count} children")]
    ChildIndexOutOfRange { index: usize, count: usize },

    #[error("node {child:?} is not a child of node {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
}

/// Misuse or misconfiguration of the growth engine.
#[derive(Debug, Error)]
pub enum RrtError {
    #[error("coordinate ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// A query needed terrain before `prepare` was ever called.
    #[error("the engine has no terrain, call prepare first")]
    NotPrepared,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),
}

/// Failure to build a [`TerrainGrid`](crate::terrain::TerrainGrid) from map text.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid map header: {0}")]
    InvalidHeader(String),

    #[error("map dimensions {width}x{height} are invalid")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("unknown tile character {0:?}")]
    InvalidTile(char),

    #[error("map declares {expected} tiles but contains {found}")]
    TileCount { expected: usize, found: usize },
}
