//! Block partitioner: slices a four-cornered region of the map into equal
//! strips, one per shop, and numbers them from a chosen corner.
//!
//! Strips have equal *parametric* width along the chosen edges. For a
//! rectangle that is also equal area; for a trapezoid it is not, and cells
//! towards the wider side come out larger. Callers that need equal area
//! have to draw closer-to-rectangular regions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, span, Level};

use crate::error::InvalidInputError;
use crate::geometry::{centroid, cmp_f64, lerp, CoordGeo};

/// Upper bound on shops generated from one region.
pub const MAX_CELLS: usize = 250;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Strips are cut along the top and bottom edges, so shops sit side by
    /// side in one row.
    #[default]
    Horizontal,
    /// Strips are cut along the left and right edges, stacking shops
    /// top to bottom.
    Vertical,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberingOrigin {
    TopLeft,
    #[default]
    TopRight,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "horizontal" | "h" => Ok(Direction::Horizontal),
            "vertical" | "v" => Ok(Direction::Vertical),
            other => Err(format!("unknown direction '{other}' (expected horizontal or vertical)")),
        }
    }
}

impl FromStr for NumberingOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top-left" | "topleft" | "tl" => Ok(NumberingOrigin::TopLeft),
            "top-right" | "topright" | "tr" => Ok(NumberingOrigin::TopRight),
            other => Err(format!("unknown origin '{other}' (expected top-left or top-right)")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Horizontal => "horizontal",
            Direction::Vertical => "vertical",
        })
    }
}

impl fmt::Display for NumberingOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NumberingOrigin::TopLeft => "top-left",
            NumberingOrigin::TopRight => "top-right",
        })
    }
}


// --------------------------------------------------------------------------
// Region

/// The four named corners of a region after canonicalization.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Corners {
    pub top_left: CoordGeo,
    pub top_right: CoordGeo,
    pub bottom_right: CoordGeo,
    pub bottom_left: CoordGeo,
}

/// Four captured points, in whatever order they were clicked.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    points: [CoordGeo; 4],
}

impl Region {
    pub fn from_points(points: &[CoordGeo]) -> Result<Self, InvalidInputError> {
        let points: [CoordGeo; 4] = points
            .try_into()
            .map_err(|_| InvalidInputError::CornerCount(points.len()))?;
        if let Some(idx) = points.iter().position(|p| !p.is_finite()) {
            return Err(InvalidInputError::NonFiniteCorner(idx));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[CoordGeo; 4] {
        &self.points
    }

    /// The points sorted by polar angle around their centroid, giving a
    /// consistent cyclic order independent of capture order.
    pub fn canonical(&self) -> [CoordGeo; 4] {
        // Four finite points always have a centroid
        let c = centroid(&self.points).unwrap_or(self.points[0]);
        let angle = |p: &CoordGeo| f64::atan2(p.latitude - c.latitude, p.longitude - c.longitude);
        let mut ordered = self.points;
        ordered.sort_by(|a, b| cmp_f64(angle(a), angle(b)));
        ordered
    }

    /// Splits the canonical order into a top and a bottom pair by latitude,
    /// then orders each pair west to east. Both sorts are stable, so exact
    /// ties keep the canonical order.
    pub fn corners(&self) -> Corners {
        let mut by_lat = self.canonical();
        by_lat.sort_by(|a, b| cmp_f64(b.latitude, a.latitude));
        let (top, bottom) = by_lat.split_at_mut(2);
        top.sort_by(|a, b| cmp_f64(a.longitude, b.longitude));
        bottom.sort_by(|a, b| cmp_f64(a.longitude, b.longitude));
        Corners {
            top_left: top[0],
            top_right: top[1],
            bottom_right: bottom[1],
            bottom_left: bottom[0],
        }
    }
}


// --------------------------------------------------------------------------
// Cell

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub vertices: [CoordGeo; 4],
    pub center: CoordGeo,
    /// Start of the interpolation interval this strip covers.
    pub t0: f64,
    /// End of the interpolation interval; equals the next strip's `t0`.
    pub t1: f64,
    /// Strip index straight out of `partition`, shop number after
    /// `number_cells`.
    pub seq: i64,
}

/// Cuts `region` into `count` strips along `direction`. Cells come back in
/// strip order (`seq` = 0, 1, ..), not numbering order.
pub fn partition(
    region: &Region,
    count: usize,
    direction: Direction,
) -> Result<Vec<Cell>, InvalidInputError> {
    let _span = span!(Level::DEBUG, "partition", count, %direction).entered();

    if !(1..=MAX_CELLS).contains(&count) {
        return Err(InvalidInputError::CellCount { count, max: MAX_CELLS });
    }

    let Corners { top_left: p1, top_right: p2, bottom_right: p3, bottom_left: p4 } =
        region.corners();
    debug!("corners: tl={} tr={} br={} bl={}", p1, p2, p3, p4);

    let n = count as f64;
    let cells = (0..count)
        .map(|i| {
            let t0 = i as f64 / n;
            let t1 = (i + 1) as f64 / n;
            let vertices = match direction {
                Direction::Horizontal => {
                    let a0 = lerp(&p1, &p2, t0);
                    let a1 = lerp(&p1, &p2, t1);
                    let b0 = lerp(&p4, &p3, t0);
                    let b1 = lerp(&p4, &p3, t1);
                    [a0, a1, b1, b0]
                }
                Direction::Vertical => {
                    let l0 = lerp(&p1, &p4, t0);
                    let l1 = lerp(&p1, &p4, t1);
                    let r0 = lerp(&p2, &p3, t0);
                    let r1 = lerp(&p2, &p3, t1);
                    [l0, r0, r1, l1]
                }
            };
            let center = centroid(&vertices).unwrap_or(vertices[0]);
            Cell { vertices, center, t0, t1, seq: i as i64 }
        })
        .collect();

    Ok(cells)
}

/// Orders cells top row first, then west to east (top-left origin) or east
/// to west (top-right origin) within a row, and numbers them from
/// `start_no`. Rows are rows of exactly equal center latitude.
pub fn number_cells(mut cells: Vec<Cell>, origin: NumberingOrigin, start_no: i64) -> Vec<Cell> {
    cells.sort_by(|a, b| {
        if a.center.latitude != b.center.latitude {
            return cmp_f64(b.center.latitude, a.center.latitude);
        }
        match origin {
            NumberingOrigin::TopLeft => cmp_f64(a.center.longitude, b.center.longitude),
            NumberingOrigin::TopRight => cmp_f64(b.center.longitude, a.center.longitude),
        }
    });
    for (i, cell) in cells.iter_mut().enumerate() {
        cell.seq = start_no + i as i64;
    }
    cells
}


// --------------------------------------------------------------------------
// BlockPlan

/// What the operator asks for: a number range, a cutting direction and the
/// corner numbering starts from.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPlan {
    pub start_no: i64,
    pub end_no: i64,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub origin: NumberingOrigin,
}

impl BlockPlan {
    /// Number of shops the range covers.
    pub fn count(&self) -> Result<usize, InvalidInputError> {
        if self.end_no < self.start_no {
            return Err(InvalidInputError::NumberRange { start: self.start_no, end: self.end_no });
        }
        let count = self
            .end_no
            .checked_sub(self.start_no)
            .and_then(|d| d.checked_add(1))
            .and_then(|span| usize::try_from(span).ok())
            .unwrap_or(usize::MAX);
        if count > MAX_CELLS {
            return Err(InvalidInputError::CellCount { count, max: MAX_CELLS });
        }
        Ok(count)
    }

    /// Validates everything up front, then partitions and numbers.
    pub fn generate(&self, points: &[CoordGeo]) -> Result<Vec<Cell>, InvalidInputError> {
        let count = self.count()?;
        let region = Region::from_points(points)?;
        let cells = partition(&region, count, self.direction)?;
        Ok(number_cells(cells, self.origin, self.start_no))
    }
}
