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

use plotly::common::{Line, Marker, MarkerSymbol, Mode};
use plotly::layout::Axis;
use plotly::{Layout, Plot, Scatter};
use std::env;
use std::sync::Arc;
use terrainrrt::config::RrtConfig;
use terrainrrt::planning::rrt::Rrt;
use terrainrrt::terrain::{GridCoord, TerrainCategory, TerrainGrid, TerrainMap};

const USAGE: &str = "Usage: program [map_file start_x start_y end_x end_y]";

// Used when no map file is given
const DEFAULT_MAP: &str = "type octile
height 20
width 30
map
..............................
..............................
.....TTTTTT...................
.....TTTTTT.........WWWWW.....
.....TTTTTT.........WWWWW.....
....................WWWWW.....
..........SSSSS...............
..........SSSSS.....@@@@@@@@..
..........SSSSS...............
..............................
TTTTTTTTTTTTTTTTTTTTTTTT......
..............................
..............................
......WWWWWWWW................
......WWWWWWWW.......TTTT.....
.....................TTTT.....
.....................TTTT.....
..............................
..............................
..............................
";

fn category_color(category: TerrainCategory) -> &'static str {
    match category {
        TerrainCategory::Terrain => "white",
        TerrainCategory::OutOfBounds => "black",
        TerrainCategory::Obstacle => "darkgreen",
        TerrainCategory::Swamp => "olive",
        TerrainCategory::Water => "steelblue",
    }
}

/// Visualize the grown tree on top of the terrain
fn visualize_rrt(rrt: &Rrt<TerrainGrid>) {
    let (Some(grid), Some(tree), Some(start), Some(end)) =
        (rrt.terrain(), rrt.tree(), rrt.start(), rrt.end())
    else {
        return;
    };
    let mut plot = Plot::new();

    // Plot every non-trivial terrain category as square markers
    for category in [
        TerrainCategory::OutOfBounds,
        TerrainCategory::Obstacle,
        TerrainCategory::Swamp,
        TerrainCategory::Water,
    ] {
        let (x, y): (Vec<u32>, Vec<u32>) = (0..grid.height())
            .flat_map(|y| (0..grid.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| grid.terrain_at(x, y) == Some(category))
            .unzip();
        let trace = Scatter::new(x, y).mode(Mode::Markers).marker(
            Marker::new()
                .symbol(MarkerSymbol::Square)
                .color(category_color(category))
                .size(18),
        );
        plot.add_trace(trace);
    }

    // Plot tree
    for (parent, child) in tree.edges() {
        let trace = Scatter::new(vec![parent.x, child.x], vec![parent.y, child.y])
            .mode(Mode::Lines)
            .line(Line::new().color("blue"));
        plot.add_trace(trace);
    }

    // Plot path back to the root, if the goal was reached
    if let Some(goal_id) = rrt.occupancy().and_then(|o| o.get(end)) {
        let (path_x, path_y): (Vec<u32>, Vec<u32>) = tree
            .ancestors(goal_id)
            .into_iter()
            .flatten()
            .filter_map(|id| tree.value(id).ok())
            .map(|cell| (cell.x, cell.y))
            .unzip();
        let path_trace = Scatter::new(path_x, path_y)
            .mode(Mode::Lines)
            .line(Line::new().color("red").width(4.0));
        plot.add_trace(path_trace);
    }

    // Plot start and end
    let start_trace = Scatter::new(vec![start.x], vec![start.y])
        .mode(Mode::Markers)
        .marker(Marker::new().color("green").size(16));
    let end_trace = Scatter::new(vec![end.x], vec![end.y])
        .mode(Mode::Markers)
        .marker(Marker::new().color("yellow").size(16));
    plot.add_trace(start_trace);
    plot.add_trace(end_trace);

    let layout = Layout::new()
        .title(format!("Terrain RRT, {} nodes", tree.size()).as_str().into())
        .show_legend(false)
        .width(900)
        .height(650)
        .x_axis(Axis::new().title("X".into()))
        .y_axis(Axis::new().title("Y".into()));

    plot.set_layout(layout);
    plot.show();
}

pub fn main() {
    let args: Vec<String> = env::args().collect();
    let (grid, start, end) = match args.len() {
        1 => (
            DEFAULT_MAP.parse::<TerrainGrid>().expect("Built-in map is valid"),
            GridCoord::new(1, 1),
            GridCoord::new(28, 18),
        ),
        6 => {
            let grid = TerrainGrid::load(&args[1]).expect("Could not load map file");
            let coord = |i: usize| -> u32 { args[i].parse().expect("Invalid coordinate") };
            (
                grid,
                GridCoord::new(coord(2), coord(3)),
                GridCoord::new(coord(4), coord(5)),
            )
        }
        _ => {
            eprintln!("{USAGE}");
            return;
        }
    };

    println!("Start: {start}");
    println!("End: {end}");

    let mut rrt = Rrt::new(RrtConfig::default()).expect("Default config is valid");
    if let Err(e) = rrt.prepare(Arc::new(grid), start, end) {
        eprintln!("Could not start search: {e}");
        eprintln!("{USAGE}");
        return;
    }

    // Both endpoints must be somewhere a land unit can stand
    let standable = |cell| rrt.is_valid_tile(cell, TerrainCategory::OutOfBounds);
    if !matches!((standable(start), standable(end)), (Ok(true), Ok(true))) {
        eprintln!("Start and end must both be open terrain, swamp or water");
        eprintln!("{USAGE}");
        return;
    }

    let max_ticks = 100_000;
    let mut ticks = 0;
    let mut grafts = 0;
    while !rrt.has_finished() && ticks < max_ticks {
        if rrt.generate_branch().is_grafted() {
            grafts += 1;
        }
        ticks += 1;
    }

    if rrt.has_finished() {
        println!("Reached the goal after {ticks} ticks with {grafts} grafted branches");
    } else {
        println!("Gave up after {ticks} ticks with {grafts} grafted branches");
    }
    visualize_rrt(&rrt);
}
