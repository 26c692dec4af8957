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

use std::collections::HashSet;
use std::sync::Arc;

use terrainrrt::config::RrtConfig;
use terrainrrt::planning::rrt::{GrowthOutcome, Rrt};
use terrainrrt::terrain::{GridCoord, TerrainCategory, TerrainGrid, TerrainMap};

fn open_grid(width: u32, height: u32) -> Arc<TerrainGrid> {
    Arc::new(TerrainGrid::filled(width, height, TerrainCategory::Terrain).unwrap())
}

fn seeded_rrt(seed: u64) -> Rrt<TerrainGrid> {
    Rrt::new(RrtConfig::seeded(seed)).unwrap()
}

fn prepared(
    seed: u64,
    grid: Arc<TerrainGrid>,
    start: (u32, u32),
    goal: (u32, u32),
) -> Rrt<TerrainGrid> {
    let mut rrt = seeded_rrt(seed);
    let start = GridCoord::new(start.0, start.1);
    let goal = GridCoord::new(goal.0, goal.1);
    rrt.prepare(grid, start, goal).unwrap();
    rrt
}

/// Every occupied slot points at a live node holding that cell, every node is
/// registered, and every node's parent chain ends at the root.
fn assert_consistent(rrt: &Rrt<TerrainGrid>) {
    let tree = rrt.tree().unwrap();
    let occupancy = rrt.occupancy().unwrap();

    assert_eq!(tree.size(), occupancy.occupied_count());
    for (cell, id) in occupancy.iter() {
        assert_eq!(*tree.value(id).unwrap(), cell, "slot {cell} points at the wrong node");
    }

    let mut seen = HashSet::new();
    for (id, cell) in tree.iter_depth_first() {
        assert!(seen.insert(*cell), "cell {cell} is held by two nodes");
        assert_eq!(occupancy.get(*cell), Some(id));
        let last = tree.ancestors(id).unwrap().last().unwrap();
        assert_eq!(last, tree.root());
    }
    assert_eq!(*tree.value(tree.root()).unwrap(), rrt.start().unwrap());
}

#[test]
fn test_open_grid_reaches_goal() {
    let mut rrt = seeded_rrt(1);
    let start = GridCoord::new(0, 0);
    let goal = GridCoord::new(4, 4);
    rrt.prepare(open_grid(5, 5), start, goal).unwrap();

    assert!(!rrt.has_finished());
    let occupancy = rrt.occupancy().unwrap();
    assert_eq!(occupancy.occupied_count(), 1);
    assert!(occupancy.is_occupied(start));

    let mut attempts = 0;
    while !rrt.has_finished() && attempts < 10_000 {
        rrt.generate_branch();
        attempts += 1;
    }
    assert!(rrt.has_finished(), "Expected to reach the goal, tried {attempts} times");
    assert_consistent(&rrt);

    // The goal hangs off the root
    let tree = rrt.tree().unwrap();
    let goal_id = rrt.occupancy().unwrap().get(goal).unwrap();
    let chain: Vec<GridCoord> = tree
        .ancestors(goal_id)
        .unwrap()
        .map(|id| *tree.value(id).unwrap())
        .collect();
    assert_eq!(chain.first(), Some(&goal));
    assert_eq!(chain.last(), Some(&start));
}

#[test]
fn test_wall_is_never_crossed() {
    let rows = [
        "....T....",
        "....T....",
        "....T....",
        "....T....",
        "....T....",
        "....T....",
        "....T....",
    ];
    let grid = Arc::new(TerrainGrid::from_rows(&rows).unwrap());
    let mut rrt = prepared(7, grid, (1, 3), (7, 3));

    for _ in 0..3_000 {
        rrt.generate_branch();
    }

    assert!(!rrt.has_finished());
    let tree = rrt.tree().unwrap();
    assert!(tree.size() > 1, "The tree should still grow on its own side");
    for (_, cell) in tree.iter_depth_first() {
        assert!(cell.x < 4, "Node {cell} is on or beyond the wall");
    }
    assert_consistent(&rrt);
}

#[test]
fn test_valid_tiles_depend_on_base() {
    let grid = Arc::new(TerrainGrid::from_rows(&[".WST@"]).unwrap());
    let rrt = prepared(1, grid, (0, 0), (0, 0));
    let valid = |x, base| rrt.is_valid_tile(GridCoord::new(x, 0), base).unwrap();

    assert!(!valid(0, TerrainCategory::Water));
    assert!(valid(1, TerrainCategory::Water));
    assert!(valid(2, TerrainCategory::OutOfBounds));
    assert!(!valid(3, TerrainCategory::OutOfBounds));
    assert!(!valid(4, TerrainCategory::OutOfBounds));
    assert!(valid(1, TerrainCategory::Obstacle));
    assert!(valid(2, TerrainCategory::Terrain));
    assert!(!valid(1, TerrainCategory::Terrain));
}

#[test]
fn test_no_op_steps_do_not_mutate() {
    // Water runs the full height, so the goal can never be reached from land
    let rows = ["...W...", "...W...", "...W..."];
    let grid = Arc::new(TerrainGrid::from_rows(&rows).unwrap());
    let mut rrt = prepared(3, grid, (0, 0), (6, 0));

    let (mut grafted, mut blocked, mut occupied) = (0, 0, 0);
    let mut previous_cells = 1;
    for _ in 0..500 {
        let tree_before = rrt.tree().unwrap().clone();
        let occupancy_before = rrt.occupancy().unwrap().clone();

        let outcome = rrt.generate_branch();
        let occupancy = rrt.occupancy().unwrap();
        if let GrowthOutcome::Grafted(id) = outcome {
            grafted += 1;
            assert_eq!(occupancy.occupied_count(), previous_cells + 1);
            let cell = *rrt.tree().unwrap().value(id).unwrap();
            assert!(!occupancy_before.is_occupied(cell));
            assert!(cell.x < 3, "Node {cell} crossed the water");
        } else {
            match outcome {
                GrowthOutcome::Blocked => blocked += 1,
                GrowthOutcome::SampleOccupied => occupied += 1,
                other => panic!("Unexpected outcome {other:?}"),
            }
            assert_eq!(rrt.tree().unwrap(), &tree_before);
            assert_eq!(occupancy, &occupancy_before);
        }

        // Cells are only ever added
        assert!(occupancy.occupied_count() >= previous_cells);
        previous_cells = occupancy.occupied_count();
        assert_consistent(&rrt);
    }

    assert!(!rrt.has_finished());
    assert!(grafted > 0 && blocked > 0 && occupied > 0);
    // Every land cell left of the water ends up in the tree
    assert_eq!(rrt.tree().unwrap().size(), 9);
}

#[test]
fn test_finished_engine_is_idempotent() {
    let mut rrt = prepared(11, open_grid(6, 6), (5, 0), (0, 5));
    assert!(rrt.grow(50_000));

    let tree = rrt.tree().unwrap().clone();
    let occupancy = rrt.occupancy().unwrap().clone();
    for _ in 0..100 {
        assert_eq!(rrt.generate_branch(), GrowthOutcome::Finished);
    }
    assert_eq!(rrt.tree().unwrap(), &tree);
    assert_eq!(rrt.occupancy().unwrap(), &occupancy);
}

#[test]
fn test_prepare_replaces_session() {
    let grid = open_grid(10, 10);
    let mut rrt = prepared(5, grid.clone(), (0, 0), (9, 9));
    rrt.grow(300);
    assert!(rrt.tree().unwrap().size() > 1);

    let start = GridCoord::new(5, 2);
    rrt.prepare(grid, start, GridCoord::new(2, 8)).unwrap();

    let tree = rrt.tree().unwrap();
    assert_eq!(tree.size(), 1);
    assert_eq!(*tree.value(tree.root()).unwrap(), start);
    let occupancy = rrt.occupancy().unwrap();
    assert_eq!(occupancy.occupied_count(), 1);
    assert_eq!(occupancy.iter().next().map(|(cell, _)| cell), Some(start));
    assert_eq!(rrt.start(), Some(start));
    assert_eq!(rrt.end(), Some(GridCoord::new(2, 8)));
    assert!(!rrt.has_finished());
}

#[test]
fn test_map_file_round_trip_through_engine() {
    let text = "type octile\nheight 4\nwidth 6\nmap\n\
                ......\n\
                .TTTT.\n\
                .T..T.\n\
                ......\n";
    let grid: TerrainGrid = text.parse().unwrap();
    assert_eq!(grid.cell_count(), 24);

    let mut rrt = prepared(21, Arc::new(grid), (0, 0), (5, 3));
    assert!(rrt.grow(100_000));
    assert_consistent(&rrt);

    // Nothing grows onto the obstacles
    let terrain = rrt.terrain().unwrap();
    for (_, cell) in rrt.tree().unwrap().iter_depth_first() {
        assert_eq!(
            terrain.terrain_at(cell.x, cell.y),
            Some(TerrainCategory::Terrain),
            "Node {cell} is not on open terrain"
        );
    }
}
