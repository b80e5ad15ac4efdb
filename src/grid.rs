use crate::types::{Area, Grid, Item, LayoutError};

/// Scaling attempts before giving up on fitting the grid into the area.
pub const MAX_SCALE_RATIO: u32 = 9;

/// Quantizes the area into a square-cell grid sized so that one doubled
/// weight unit of an item maps to one cell.
///
/// Weights are doubled before summing so the unit total stays even and no
/// item ends up with an odd, hard-to-factor cell count. If the resulting
/// grid is taller than the area, the unit side is shrunk by an increasing
/// ratio (which rescales every unit count by ratio squared) until the grid
/// fits or the ratio budget runs out.
pub fn build(items: &[Item], area: Area) -> Result<Grid, LayoutError> {
    let weight_sum: u64 = items.iter().map(|it| it.weight as u64 * 2).sum();
    if weight_sum == 0 {
        return Err(LayoutError::EmptyItems);
    }
    let weight_unit = area.units() / weight_sum;
    tracing::debug!(weight_sum, weight_unit, "building grid");

    for ratio in 1..=MAX_SCALE_RATIO {
        let unit_side = ((weight_unit as f64).sqrt() / ratio as f64).floor() as u32;
        if unit_side == 0 {
            continue;
        }
        let columns = (area.width / unit_side) as u64;
        if columns == 0 {
            continue;
        }
        let total_units = weight_sum * (ratio as u64).pow(2);
        let rows = total_units.div_ceil(columns);
        if rows * unit_side as u64 > area.height as u64 {
            tracing::debug!(ratio, rows, unit_side, "grid exceeds area height, rescaling");
            continue;
        }

        tracing::debug!(ratio, unit_side, columns, rows, total_units, "grid found");
        return Ok(Grid {
            unit_side,
            columns,
            rows,
            total_units,
            scale_ratio: ratio,
        });
    }

    Err(LayoutError::GridOverflow(MAX_SCALE_RATIO))
}
