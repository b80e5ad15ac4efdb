use rayon::prelude::*;

use crate::engine::Placer;
use crate::grid;
use crate::types::{
    Area, Configuration, CriteriaPair, Grid, Item, Layout, LayoutError, LayoutOptions,
};

pub struct LayoutSolver {
    items: Vec<Item>,
    area: Area,
    options: LayoutOptions,
}

impl LayoutSolver {
    pub fn new(items: Vec<Item>, area: Area, options: LayoutOptions) -> Self {
        Self {
            items,
            area,
            options,
        }
    }

    /// Builds the grid, runs one configuration per criteria pair and ranks
    /// them by ascending empty units. Yields every ranked configuration, or
    /// only the best one when `return_all` is off.
    ///
    /// Configurations share nothing mutable, so they run in parallel; item
    /// placement inside each one stays sequential.
    pub fn solve(&self) -> Result<Layout, LayoutError> {
        self.validate()?;

        let grid = grid::build(&self.items, self.area)?;

        // Descending weight, stable so equal weights keep input order.
        let mut ordered = self.items.clone();
        ordered.sort_by(|a, b| b.weight.cmp(&a.weight));

        let mut configurations: Vec<Configuration> = self
            .options
            .criteria
            .par_iter()
            .enumerate()
            .map(|(id, &pair)| run_configuration(id as u64, pair, &grid, &ordered, &self.options))
            .collect();

        // Stable sort: ties keep configuration-id order.
        configurations.sort_by_key(|c| c.empty_units);
        tracing::info!(
            best = configurations[0].id,
            empty = configurations[0].empty_units,
            "configurations ranked"
        );
        if !self.options.return_all {
            configurations.truncate(1);
        }

        Ok(Layout {
            grid,
            configurations,
        })
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if self.items.is_empty() {
            return Err(LayoutError::EmptyItems);
        }
        if let Some(item) = self.items.iter().find(|it| it.weight == 0) {
            return Err(LayoutError::NonPositiveWeight(item.id));
        }
        if self.area.width == 0 || self.area.height == 0 {
            return Err(LayoutError::ZeroArea);
        }
        if self.options.criteria.is_empty() {
            return Err(LayoutError::NoCriteria);
        }
        Ok(())
    }
}

fn run_configuration(
    id: u64,
    criteria: CriteriaPair,
    grid: &Grid,
    ordered_items: &[Item],
    options: &LayoutOptions,
) -> Configuration {
    let mut placer = Placer::new(grid, criteria, options.max_ratio, options.max_attempts);
    for (index, item) in ordered_items.iter().enumerate() {
        placer.place(*item, index);
    }

    let empty_units = placer.empty_units();
    let (placed, overflow_count) = placer.finish();
    tracing::debug!(
        config = id,
        empty = empty_units,
        overflow = overflow_count,
        "configuration scored"
    );

    Configuration {
        id,
        criteria,
        placed,
        empty_units,
        overflow_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HEIGHT_TOLERANCE;
    use crate::types::{ShapeSearch::*, default_criteria};
    use std::collections::HashSet;

    fn items(weights: &[u32]) -> Vec<Item> {
        weights
            .iter()
            .enumerate()
            .map(|(i, &weight)| Item {
                id: i as u64 + 1,
                weight,
            })
            .collect()
    }

    /// Validates one configuration against the grid:
    /// 1. Every tile is non-degenerate and inside the width/height bounds
    /// 2. No two tiles overlap (when no overflow was reported)
    /// 3. empty units plus covered nominal cells equals the nominal box
    fn assert_configuration_valid(conf: &Configuration, grid: &Grid) {
        for (i, t) in conf.placed.iter().enumerate() {
            assert!(t.x1 > t.x0 && t.y1 > t.y0, "tile {i} is degenerate");
            if conf.overflow_count == 0 {
                assert!(
                    t.x1 <= grid.columns,
                    "tile {i} exceeds columns: x1={} > {}",
                    t.x1,
                    grid.columns
                );
                assert!(
                    t.y1 as f64 <= grid.rows as f64 * (1.0 + HEIGHT_TOLERANCE),
                    "tile {i} exceeds tolerated height: y1={} rows={}",
                    t.y1,
                    grid.rows
                );
            }
        }

        if conf.overflow_count == 0 {
            for i in 0..conf.placed.len() {
                for j in (i + 1)..conf.placed.len() {
                    assert!(
                        !conf.placed[i].overlaps(&conf.placed[j]),
                        "config {}: tile {i} overlaps tile {j}",
                        conf.id
                    );
                }
            }
        }

        // coverage conservation over the nominal box, counting overlaps once
        let mut covered: HashSet<(u64, u64)> = HashSet::new();
        for t in &conf.placed {
            for x in t.x0..t.x1.min(grid.columns) {
                for y in t.y0..t.y1.min(grid.rows) {
                    covered.insert((x, y));
                }
            }
        }
        assert_eq!(
            conf.empty_units + covered.len() as u64,
            grid.nominal_units(),
            "config {}: empty units do not conserve coverage",
            conf.id
        );
    }

    #[test]
    fn test_scenario_four_items_single_pair() {
        let solver = LayoutSolver::new(
            items(&[4, 2, 1, 1]),
            Area::new(400, 300),
            LayoutOptions {
                criteria: vec![[Up, Down]],
                ..LayoutOptions::default()
            },
        );
        let layout = solver.solve().unwrap();
        assert_eq!(layout.configurations.len(), 1);

        let conf = layout.best();
        assert_eq!(conf.placed.len(), 4);
        assert_configuration_valid(conf, &layout.grid);

        // heaviest item first, biggest rectangle, anchored at the origin
        let first = &conf.placed[0];
        assert_eq!(first.item.id, 1);
        assert_eq!((first.x0, first.y0), (0, 0));
        assert!(conf.placed.iter().all(|t| t.units() <= first.units()));
    }

    #[test]
    fn test_scenario_single_item_fills_grid() {
        let solver = LayoutSolver::new(
            items(&[1]),
            Area::new(100, 100),
            LayoutOptions::default(),
        );
        let layout = solver.solve().unwrap();
        let conf = layout.best();
        assert_eq!(conf.placed.len(), 1);
        assert_eq!(conf.empty_units, 0);
        assert_eq!(
            conf.placed[0].units(),
            layout.grid.nominal_units(),
            "single tile covers the entire grid"
        );
        assert_configuration_valid(conf, &layout.grid);
    }

    #[test]
    fn test_all_configurations_ranked_ascending() {
        let solver = LayoutSolver::new(
            items(&[5, 4, 3, 2, 2, 1, 1]),
            Area::new(640, 480),
            LayoutOptions::default(),
        );
        let layout = solver.solve().unwrap();
        assert_eq!(layout.configurations.len(), default_criteria().len());

        for pair in layout.configurations.windows(2) {
            assert!(pair[0].empty_units <= pair[1].empty_units);
        }
        for conf in &layout.configurations {
            assert_eq!(conf.placed.len(), 7);
            assert_configuration_valid(conf, &layout.grid);
        }
    }

    #[test]
    fn test_best_only_returns_single_configuration() {
        let weights = [5, 4, 3, 2, 2, 1, 1];
        let all = LayoutSolver::new(
            items(&weights),
            Area::new(640, 480),
            LayoutOptions::default(),
        )
        .solve()
        .unwrap();
        let best_only = LayoutSolver::new(
            items(&weights),
            Area::new(640, 480),
            LayoutOptions {
                return_all: false,
                ..LayoutOptions::default()
            },
        )
        .solve()
        .unwrap();

        assert_eq!(best_only.configurations.len(), 1);
        assert_eq!(best_only.best(), all.best());
    }

    #[test]
    fn test_deterministic_runs() {
        let run = || {
            LayoutSolver::new(
                items(&[4, 4, 3, 2, 1]),
                Area::new(500, 400),
                LayoutOptions::default(),
            )
            .solve()
            .unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.configurations, b.configurations);
    }

    #[test]
    fn test_equal_weights_keep_input_order() {
        let solver = LayoutSolver::new(
            items(&[2, 2, 2]),
            Area::new(300, 300),
            LayoutOptions {
                criteria: vec![[Up, Down]],
                ..LayoutOptions::default()
            },
        );
        let layout = solver.solve().unwrap();
        let ids: Vec<u64> = layout.best().placed.iter().map(|t| t.item.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_larger_mixed_run_all_criteria() {
        let solver = LayoutSolver::new(
            items(&[9, 7, 7, 5, 4, 3, 3, 2, 2, 1, 1, 1]),
            Area::new(1024, 768),
            LayoutOptions::default(),
        );
        let layout = solver.solve().unwrap();
        for conf in &layout.configurations {
            assert_eq!(conf.placed.len(), 12);
            assert_configuration_valid(conf, &layout.grid);
        }
    }

    #[test]
    fn test_validation_empty_items() {
        let solver = LayoutSolver::new(vec![], Area::new(100, 100), LayoutOptions::default());
        assert_eq!(solver.solve().unwrap_err(), LayoutError::EmptyItems);
    }

    #[test]
    fn test_validation_zero_weight() {
        let solver = LayoutSolver::new(
            vec![Item { id: 7, weight: 0 }],
            Area::new(100, 100),
            LayoutOptions::default(),
        );
        assert_eq!(
            solver.solve().unwrap_err(),
            LayoutError::NonPositiveWeight(7)
        );
    }

    #[test]
    fn test_validation_zero_area() {
        let solver = LayoutSolver::new(items(&[1]), Area::new(0, 100), LayoutOptions::default());
        assert_eq!(solver.solve().unwrap_err(), LayoutError::ZeroArea);
    }

    #[test]
    fn test_validation_no_criteria() {
        let solver = LayoutSolver::new(
            items(&[1]),
            Area::new(100, 100),
            LayoutOptions {
                criteria: vec![],
                ..LayoutOptions::default()
            },
        );
        assert_eq!(solver.solve().unwrap_err(), LayoutError::NoCriteria);
    }

    #[test]
    fn test_grid_overflow_is_fatal() {
        let solver = LayoutSolver::new(
            items(&[1_000_000]),
            Area::new(10, 10),
            LayoutOptions::default(),
        );
        assert!(matches!(
            solver.solve().unwrap_err(),
            LayoutError::GridOverflow(_)
        ));
    }
}
