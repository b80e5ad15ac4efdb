use std::collections::HashSet;

use crate::factor::Factorizer;
use crate::types::{CriteriaPair, Grid, Item, PlacedTile, ShapeSearch};

/// Tiles may exceed the nominal grid height by this fraction, never the width.
pub const HEIGHT_TOLERANCE: f64 = 0.2;

/// True if a `w`x`h` rectangle anchored at `(x0, y0)` leaves the grid or
/// intersects an already placed tile.
pub fn collides(
    (x0, y0): (u64, u64),
    w: u64,
    h: u64,
    placed: &[PlacedTile],
    grid: &Grid,
) -> bool {
    let x1 = x0 + w;
    let y1 = y0 + h;

    if x1 > grid.columns {
        return true;
    }
    if y1 as f64 > grid.rows as f64 * (1.0 + HEIGHT_TOLERANCE) {
        return true;
    }

    placed
        .iter()
        .any(|t| x1 > t.x0 && x0 < t.x1 && y1 > t.y0 && y0 < t.y1)
}

fn advance((x, y): (u64, u64), columns: u64) -> (u64, u64) {
    if x + 1 > columns {
        (0, y + 1)
    } else {
        (x + 1, y)
    }
}

/// Placement state for one configuration: filled cells, placed tiles and the
/// anchor cursor. Each configuration owns its own `Placer` (and factor
/// cache), so configurations never share mutable state.
pub struct Placer<'a> {
    grid: &'a Grid,
    criteria: CriteriaPair,
    max_ratio: f64,
    max_attempts: u32,
    factors: Factorizer,
    filled: HashSet<(u64, u64)>,
    placed: Vec<PlacedTile>,
    cursor: (u64, u64),
    overflow_count: u32,
}

impl<'a> Placer<'a> {
    pub fn new(grid: &'a Grid, criteria: CriteriaPair, max_ratio: f64, max_attempts: u32) -> Self {
        Self {
            grid,
            criteria,
            max_ratio,
            max_attempts,
            factors: Factorizer::new(),
            filled: HashSet::new(),
            placed: Vec::new(),
            cursor: (0, 0),
            overflow_count: 0,
        }
    }

    pub fn placed(&self) -> &[PlacedTile] {
        &self.placed
    }

    /// Places one item, searching shapes and positions under the active
    /// criteria pair. Never fails: after the attempt budget the item is
    /// placed best-effort at the last attempted rectangle.
    pub fn place(&mut self, item: Item, index: usize) {
        let units = self.grid.item_units(&item);
        let factors = self.factors.factors(units);

        self.cursor = self.seek_anchor();

        // Alternate around the middle factor so consecutive same-weight
        // items get different shapes.
        let mid = factors.len() / 2;
        let pick = (mid + index % 2).min(factors.len() - 1);
        let mut shape = (factors[pick], units / factors[pick]);
        let mut collision = self.collides_here(shape);

        // Positional strategies already sweep every grid position, so the
        // anchor fallback applies only to plain pairs.
        let plain_pair = self.criteria.iter().all(|c| !c.is_positional());
        let anchor = self.cursor;

        let mut attempts = 1u32;
        while collision && attempts < self.max_attempts {
            for strategy in self.criteria {
                if let Some(found) = self.search(strategy, &factors, units) {
                    shape = found;
                    collision = false;
                    break;
                }
            }
            if collision {
                if !plain_pair {
                    // A positional round is exhaustive; retrying changes nothing.
                    self.cursor = anchor;
                    break;
                }
                self.cursor = advance(self.cursor, self.grid.columns);
            }
            attempts += 1;
        }

        if collision {
            self.overflow_count += 1;
            tracing::warn!(
                item = item.id,
                x = self.cursor.0,
                y = self.cursor.1,
                "placement overflow, no free rectangle found within attempt budget"
            );
        }

        let (x0, y0) = self.cursor;
        let tile = PlacedTile {
            item,
            x0,
            y0,
            x1: x0 + shape.0,
            y1: y0 + shape.1,
        };
        for x in tile.x0..tile.x1 {
            for y in tile.y0..tile.y1 {
                self.filled.insert((x, y));
            }
        }
        self.placed.push(tile);
    }

    /// Cells in the nominal grid box left uncovered.
    pub fn empty_units(&self) -> u64 {
        let mut empty = 0;
        for x in 0..self.grid.columns {
            for y in 0..self.grid.rows {
                if !self.filled.contains(&(x, y)) {
                    empty += 1;
                }
            }
        }
        empty
    }

    pub fn finish(self) -> (Vec<PlacedTile>, u32) {
        (self.placed, self.overflow_count)
    }

    /// First unfilled cell, scanning rows top-to-bottom and columns
    /// left-to-right. Terminates because the filled set is finite.
    fn seek_anchor(&self) -> (u64, u64) {
        let mut y = 0;
        loop {
            for x in 0..self.grid.columns {
                if !self.filled.contains(&(x, y)) {
                    return (x, y);
                }
            }
            y += 1;
        }
    }

    fn collides_here(&self, (w, h): (u64, u64)) -> bool {
        collides(self.cursor, w, h, &self.placed, self.grid)
    }

    fn search(&mut self, strategy: ShapeSearch, factors: &[u64], units: u64) -> Option<(u64, u64)> {
        let mid = factors.len() / 2;
        match strategy {
            ShapeSearch::Up => {
                // The full-width strip (the last factor) is never proposed.
                for &f in &factors[mid..factors.len() - 1] {
                    let shape = (f, units / f);
                    if !self.collides_here(shape) {
                        return Some(shape);
                    }
                }
                None
            }
            ShapeSearch::Down => {
                for &f in factors[..mid].iter().rev() {
                    let shape = (f, units / f);
                    // Factors only get thinner from here on, so stop outright.
                    if shape.1 as f64 / shape.0 as f64 > self.max_ratio {
                        break;
                    }
                    if !self.collides_here(shape) {
                        return Some(shape);
                    }
                }
                None
            }
            ShapeSearch::UpPosition => {
                let shapes: Vec<u64> = factors[mid..factors.len() - 1].to_vec();
                self.search_positions(&shapes, units, false)
            }
            ShapeSearch::DownPosition => {
                let shapes: Vec<u64> = factors[..mid].iter().rev().copied().collect();
                self.search_positions(&shapes, units, true)
            }
        }
    }

    /// For each candidate width, sweeps up to `total_units` anchor positions
    /// row-major before moving to the next width. The cursor restarts from
    /// the entry anchor for every width and ends on the winning position.
    fn search_positions(
        &mut self,
        widths: &[u64],
        units: u64,
        ratio_bound: bool,
    ) -> Option<(u64, u64)> {
        let start = self.cursor;
        for &f in widths {
            let shape = (f, units / f);
            if ratio_bound && shape.1 as f64 / shape.0 as f64 > self.max_ratio {
                break;
            }
            self.cursor = start;
            for _ in 0..self.grid.total_units {
                if !self.collides_here(shape) {
                    return Some(shape);
                }
                self.cursor = advance(self.cursor, self.grid.columns);
            }
        }
        self.cursor = start;
        None
    }
}
