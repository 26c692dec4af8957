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

// Each growth step:
//     Xrand = RandomCell()
//     if Xrand is in the tree:
//         return
//     Xnear = Nearest(tree, Xrand)      // manhattan, first in flat order wins ties
//     Xnew = Extend(Xnear, Xrand)       // walk the segment until the terrain says stop
//     if Xnew exists and is not in the tree:
//         tree.add(Xnear -> Xnew)

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::RrtConfig;
use crate::error::RrtError;
use crate::planning::occupancy::OccupancyIndex;
use crate::terrain::{is_valid_tile, GridCoord, TerrainCategory, TerrainMap};
use crate::tree::{NodeId, Tree};

/// What a single call to [`Rrt::generate_branch`] did.
///
/// Only [`GrowthOutcome::Grafted`] changes the tree, every other variant is
/// an expected no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthOutcome {
    /// `prepare` has not been called yet.
    Unprepared,
    /// Start and goal are both in the tree already.
    Finished,
    /// Start and goal are the same cell, there is nothing to grow toward.
    Degenerate,
    /// The random cell is already in the tree.
    SampleOccupied,
    /// The terrain stopped the branch before it left its first cell.
    Blocked,
    /// The branch ended on a cell that is already in the tree.
    DuplicateEndpoint,
    /// A new node was added to the tree.
    Grafted(NodeId),
}

impl GrowthOutcome {
    #[must_use]
    pub fn is_grafted(self) -> bool {
        matches!(self, GrowthOutcome::Grafted(_))
    }
}

// State created by `prepare` and dropped by the next one.
#[derive(Debug)]
struct Session<M> {
    terrain: Arc<M>,
    start: GridCoord,
    goal: GridCoord,
    tree: Tree<GridCoord>,
    occupancy: OccupancyIndex,
    rng: StdRng,
}

impl<M> Session<M> {
    fn has_finished(&self) -> bool {
        self.occupancy.is_occupied(self.start) && self.occupancy.is_occupied(self.goal)
    }
}

/// Incremental RRT over a terrain grid.
///
/// Call [`Rrt::prepare`] with a terrain, a start and a goal, then
/// [`Rrt::generate_branch`] once per tick until [`Rrt::has_finished`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use terrainrrt::config::RrtConfig;
/// use terrainrrt::planning::rrt::Rrt;
/// use terrainrrt::terrain::{GridCoord, TerrainCategory, TerrainGrid};
///
/// let grid = Arc::new(TerrainGrid::filled(8, 8, TerrainCategory::Terrain).unwrap());
/// let mut rrt = Rrt::new(RrtConfig::seeded(3)).unwrap();
/// rrt.prepare(grid, GridCoord::new(0, 0), GridCoord::new(7, 7)).unwrap();
/// assert!(rrt.grow(100_000));
/// ```
#[derive(Debug)]
pub struct Rrt<M> {
    config: RrtConfig,
    session: Option<Session<M>>,
}

impl<M: TerrainMap> Default for Rrt<M> {
    fn default() -> Self {
        Rrt {
            config: RrtConfig::default(),
            session: None,
        }
    }
}

impl<M: TerrainMap> Rrt<M> {
    /// Construct an engine with the given parameters.
    ///
    /// # Errors
    ///
    /// If the configuration does not pass [`RrtConfig::validate`].
    pub fn new(config: RrtConfig) -> Result<Self, RrtError> {
        config.validate()?;
        Ok(Rrt {
            config,
            session: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &RrtConfig {
        &self.config
    }

    /// Starts a new search from `start` to `goal` over `terrain`.
    ///
    /// Any previous tree is discarded. The new tree holds only `start`, and
    /// the random generator is reseeded.
    ///
    /// # Errors
    ///
    /// If `start` or `goal` lies outside the terrain. The previous session is
    /// kept in that case.
    pub fn prepare(
        &mut self,
        terrain: Arc<M>,
        start: GridCoord,
        goal: GridCoord,
    ) -> Result<(), RrtError> {
        for position in [start, goal] {
            ensure_in_bounds(terrain.as_ref(), position)?;
        }

        let tree = Tree::new(start);
        let mut occupancy = OccupancyIndex::new(terrain.width(), terrain.height());
        occupancy.insert(start, tree.root());

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        log::debug!(
            "Preparing RRT from {start} to {goal} on a {}x{} grid",
            terrain.width(),
            terrain.height()
        );
        self.session = Some(Session {
            terrain,
            start,
            goal,
            tree,
            occupancy,
            rng,
        });
        Ok(())
    }

    /// True once both the start and the goal cell hold a tree node.
    ///
    /// Since the tree is a single component rooted at the start, this means
    /// the goal is reachable through tree edges. Always false before `prepare`.
    #[must_use]
    pub fn has_finished(&self) -> bool {
        self.session.as_ref().is_some_and(Session::has_finished)
    }

    /// Attempts to grow the tree by a single branch.
    ///
    /// Samples one random cell, extends the nearest node toward it as far as
    /// the terrain allows, and grafts the result if it landed on a new cell.
    pub fn generate_branch(&mut self) -> GrowthOutcome {
        let Some(session) = self.session.as_mut() else {
            return GrowthOutcome::Unprepared;
        };
        if session.has_finished() {
            return GrowthOutcome::Finished;
        }
        if session.start == session.goal {
            return GrowthOutcome::Degenerate;
        }

        let sample = GridCoord::new(
            session.rng.gen_range(0..session.terrain.width()),
            session.rng.gen_range(0..session.terrain.height()),
        );
        if session.occupancy.is_occupied(sample) {
            log::trace!("Sample {sample} is already in the tree");
            return GrowthOutcome::SampleOccupied;
        }

        let (nearest, nearest_id) = determine_nearest(&session.occupancy, sample)
            .unwrap_or((session.start, session.tree.root()));

        let Some(end) = calculate_branch(
            session.terrain.as_ref(),
            self.config.sample_step,
            self.config.max_branch_length,
            nearest,
            sample,
        ) else {
            log::trace!("Branch from {nearest} toward {sample} is blocked");
            return GrowthOutcome::Blocked;
        };

        // Never let two nodes claim the same cell.
        if session.occupancy.is_occupied(end) {
            log::trace!("Branch from {nearest} toward {sample} ends on occupied cell {end}");
            return GrowthOutcome::DuplicateEndpoint;
        }

        let id = match session.tree.add_child(nearest_id, end) {
            Ok(id) => id,
            Err(e) => {
                log::error!("Occupancy index points at a dead node: {e}");
                return GrowthOutcome::Blocked;
            }
        };
        let inserted = session.occupancy.insert(end, id);
        debug_assert!(inserted, "cell {end} was checked to be free");

        log::debug!("Grafted {end} onto {nearest}");
        if end == session.goal {
            log::info!("Reached goal {end} with {} nodes", session.tree.size());
        }
        GrowthOutcome::Grafted(id)
    }

    /// Calls [`Rrt::generate_branch`] up to `max_attempts` times, stopping
    /// early once finished. Returns [`Rrt::has_finished`].
    pub fn grow(&mut self, max_attempts: usize) -> bool {
        for _ in 0..max_attempts {
            if matches!(
                self.generate_branch(),
                GrowthOutcome::Finished | GrowthOutcome::Degenerate | GrowthOutcome::Unprepared
            ) {
                break;
            }
        }
        self.has_finished()
    }

    /// Checks whether `position` on the current terrain can be entered from a `base` cell.
    ///
    /// Pass [`TerrainCategory::OutOfBounds`] as the base to ask whether a
    /// land unit may stand on the cell at all.
    ///
    /// # Errors
    ///
    /// If `prepare` has not been called or `position` is outside the terrain.
    pub fn is_valid_tile(
        &self,
        position: GridCoord,
        base: TerrainCategory,
    ) -> Result<bool, RrtError> {
        let terrain = self.terrain().ok_or(RrtError::NotPrepared)?;
        ensure_in_bounds(terrain, position)?;
        Ok(is_valid_tile(terrain, position, base).unwrap_or(false))
    }

    /// The start of the current session.
    #[must_use]
    pub fn start(&self) -> Option<GridCoord> {
        self.session.as_ref().map(|s| s.start)
    }

    /// The goal of the current session.
    #[must_use]
    pub fn end(&self) -> Option<GridCoord> {
        self.session.as_ref().map(|s| s.goal)
    }

    /// The tree grown so far, rooted at the start.
    #[must_use]
    pub fn tree(&self) -> Option<&Tree<GridCoord>> {
        self.session.as_ref().map(|s| &s.tree)
    }

    #[must_use]
    pub fn occupancy(&self) -> Option<&OccupancyIndex> {
        self.session.as_ref().map(|s| &s.occupancy)
    }

    #[must_use]
    pub fn terrain(&self) -> Option<&M> {
        self.session.as_ref().map(|s| s.terrain.as_ref())
    }
}

fn ensure_in_bounds<M: TerrainMap + ?Sized>(
    terrain: &M,
    position: GridCoord,
) -> Result<(), RrtError> {
    if terrain.contains(position) {
        Ok(())
    } else {
        Err(RrtError::OutOfBounds {
            x: position.x,
            y: position.y,
            width: terrain.width(),
            height: terrain.height(),
        })
    }
}

/// Returns the occupied cell closest to `target` by manhattan distance.
///
/// Cells are scanned in flat index order and the first one found wins ties.
fn determine_nearest(
    occupancy: &OccupancyIndex,
    target: GridCoord,
) -> Option<(GridCoord, NodeId)> {
    occupancy
        .iter()
        .min_by_key(|(position, _)| position.manhattan(&target))
}

/// Walks the segment from `start` toward `target` and returns the furthest
/// cell reached before the terrain blocks the way.
///
/// Every cell is checked against the category of `start`. The walk advances
/// `sample_step` at a time and never goes further than `max_branch_length`.
/// Returns `None` if no cell other than `start` could be reached.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "interpolated points lie between two in-bounds cells"
)]
fn calculate_branch<M: TerrainMap + ?Sized>(
    terrain: &M,
    sample_step: f32,
    max_branch_length: f32,
    start: GridCoord,
    target: GridCoord,
) -> Option<GridCoord> {
    let base = terrain.terrain_at(start.x, start.y)?;

    let (x0, y0) = (f64::from(start.x), f64::from(start.y));
    let (dx, dy) = (f64::from(target.x) - x0, f64::from(target.y) - y0);
    let magnitude = (dx * dx + dy * dy).sqrt();
    let step = f64::from(sample_step);
    let limit = f64::from(max_branch_length);

    let mut branch = None;
    let mut current = 0.0;
    while current < magnitude && current < limit {
        current = (current + step).min(magnitude).min(limit);

        let delta = current / magnitude;
        let candidate = GridCoord::new((x0 + dx * delta) as u32, (y0 + dy * delta) as u32);

        // Still inside the starting cell
        if candidate == start {
            continue;
        }

        if is_valid_tile(terrain, candidate, base) == Some(true) {
            branch = Some(candidate);
        } else {
            break;
        }
    }

    branch
}

//
// Unit tests
//
