use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Accepts JSON numbers like `4.0` where an integer field is expected.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = f64::deserialize(deserializer)?;
    if v < 0.0 || v.fract() != 0.0 || v > u32::MAX as f64 {
        return Err(serde::de::Error::custom("expected a non-negative integer"));
    }
    Ok(v as u32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub weight: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub height: u32,
}

impl Area {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn units(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for Area {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Discretization of the layout area, computed once per run.
///
/// `unit_side` is the pixel size of one grid cell; `scale_ratio` records how
/// many times the unit had to be shrunk to make the grid fit the area height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grid {
    pub unit_side: u32,
    pub columns: u64,
    pub rows: u64,
    pub total_units: u64,
    pub scale_ratio: u32,
}

impl Grid {
    /// Grid cells an item occupies: its doubled weight rescaled by the
    /// squared scale ratio.
    pub fn item_units(&self, item: &Item) -> u64 {
        item.weight as u64 * 2 * (self.scale_ratio as u64).pow(2)
    }

    /// Cells in the nominal `[0,columns)x[0,rows)` box.
    pub fn nominal_units(&self) -> u64 {
        self.columns * self.rows
    }
}

/// A placed item rectangle in grid units, half-open `[x0,x1)x[y0,y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlacedTile {
    pub item: Item,
    pub x0: u64,
    pub y0: u64,
    pub x1: u64,
    pub y1: u64,
}

impl PlacedTile {
    pub fn units(&self) -> u64 {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }

    pub fn overlaps(&self, other: &PlacedTile) -> bool {
        self.x1 > other.x0 && self.x0 < other.x1 && self.y1 > other.y0 && self.y0 < other.y1
    }
}

/// Shape-search strategy tried when the initial shape collides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeSearch {
    /// Widen from the middle factor, at the current anchor only.
    Up,
    /// Narrow from the middle factor, bounded by the max h/w ratio.
    Down,
    /// Like `Up`, but every grid position is tried per shape.
    UpPosition,
    /// Like `Down`, but every grid position is tried per shape.
    DownPosition,
}

impl ShapeSearch {
    pub fn is_positional(self) -> bool {
        matches!(self, ShapeSearch::UpPosition | ShapeSearch::DownPosition)
    }
}

impl std::fmt::Display for ShapeSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShapeSearch::Up => "Up",
            ShapeSearch::Down => "Down",
            ShapeSearch::UpPosition => "UpPosition",
            ShapeSearch::DownPosition => "DownPosition",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for ShapeSearch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Up" | "up" => Ok(ShapeSearch::Up),
            "Down" | "down" => Ok(ShapeSearch::Down),
            "UpPosition" | "up-position" => Ok(ShapeSearch::UpPosition),
            "DownPosition" | "down-position" => Ok(ShapeSearch::DownPosition),
            _ => Err(format!(
                "unknown strategy '{}', expected: Up, Down, UpPosition, or DownPosition",
                s
            )),
        }
    }
}

/// The two strategies tried in order on collision.
pub type CriteriaPair = [ShapeSearch; 2];

/// The six built-in criteria pairs, in configuration-id order.
pub fn default_criteria() -> Vec<CriteriaPair> {
    use ShapeSearch::*;
    vec![
        [Up, Down],
        [Down, Up],
        [UpPosition, DownPosition],
        [DownPosition, UpPosition],
        [Up, DownPosition],
        [Down, UpPosition],
    ]
}

#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Maximum allowed h/w ratio per tile.
    pub max_ratio: f64,
    /// Criteria pairs to run, one configuration each; index is the id.
    pub criteria: Vec<CriteriaPair>,
    /// Per-item placement retry bound.
    pub max_attempts: u32,
    /// Whether callers want every ranked configuration or only the best.
    pub return_all: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            max_ratio: 3.0,
            criteria: default_criteria(),
            max_attempts: 10_000,
            return_all: true,
        }
    }
}

/// One full placement attempt under one criteria pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    pub id: u64,
    pub criteria: CriteriaPair,
    pub placed: Vec<PlacedTile>,
    pub empty_units: u64,
    /// Items placed best-effort after the attempt budget ran out.
    pub overflow_count: u32,
}

/// Result of a full run: the grid plus configurations ranked by ascending
/// empty units.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub grid: Grid,
    pub configurations: Vec<Configuration>,
}

impl Layout {
    pub fn best(&self) -> &Configuration {
        &self.configurations[0]
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("item set is empty")]
    EmptyItems,

    #[error("item {0} has non-positive weight")]
    NonPositiveWeight(u64),

    #[error("area dimensions must be non-zero")]
    ZeroArea,

    #[error("no criteria pairs configured")]
    NoCriteria,

    #[error("no unit size fits the area height after {0} scaling attempts")]
    GridOverflow(u32),
}
