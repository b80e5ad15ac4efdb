use crate::types::{Configuration, Grid};

/// ASCII diagnostic of one configuration: one character per grid cell,
/// letters cycling per tile, `.` for empty cells. A dashed line marks the
/// nominal grid height when tiles spill into the tolerance zone.
pub fn render_configuration(grid: &Grid, conf: &Configuration) -> String {
    let depth = conf
        .placed
        .iter()
        .map(|t| t.y1)
        .max()
        .unwrap_or(0)
        .max(grid.rows);

    let mut out = String::new();
    for y in 0..depth {
        if y == grid.rows && depth > grid.rows {
            for _ in 0..grid.columns {
                out.push('-');
            }
            out.push('\n');
        }
        for x in 0..grid.columns {
            let ch = conf
                .placed
                .iter()
                .position(|t| t.x0 <= x && x < t.x1 && t.y0 <= y && y < t.y1)
                .map(|i| char::from(b'a' + (i % 26) as u8))
                .unwrap_or('.');
            out.push(ch);
        }
        out.push('\n');
    }
    out
}
