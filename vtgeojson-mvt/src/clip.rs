//! Clipping of tile geometry to the tile area extended by a buffer.
//!
//! Tiles usually carry geometry a bit past their edges so that adjacent tiles render without
//! seams. Clipping cuts it back to `[-buffer, extent + buffer]` on both axes. All operations work
//! in the tile-local grid; intersection points are rounded to the nearest grid node.

use crate::{MvtGeometry, MvtPart, TilePoint};

/// Square clip area in tile-local coordinates.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClipBounds {
    min: i64,
    max: i64,
}

impl ClipBounds {
    /// Tile area of `extent` units extended by `buffer` units on every side.
    pub fn new(extent: u32, buffer: u32) -> Self {
        Self {
            min: -i64::from(buffer),
            max: i64::from(extent) + i64::from(buffer),
        }
    }

    /// Returns `true` if the point is inside the area or on its border.
    pub fn contains(&self, point: &TilePoint) -> bool {
        (self.min..=self.max).contains(&point.x) && (self.min..=self.max).contains(&point.y)
    }
}

/// Clips a geometry. Parts that end up empty are removed, so the result may have no parts at all.
pub fn clip_geometry(geometry: &MvtGeometry, extent: u32, buffer: u32) -> MvtGeometry {
    let bounds = ClipBounds::new(extent, buffer);
    match geometry {
        MvtGeometry::Point(parts) => MvtGeometry::Point(clip_points(parts, &bounds)),
        MvtGeometry::LineString(parts) => MvtGeometry::LineString(
            parts
                .iter()
                .flat_map(|part| clip_line(part, &bounds))
                .collect(),
        ),
        MvtGeometry::Polygon(parts) => MvtGeometry::Polygon(
            parts
                .iter()
                .filter_map(|ring| clip_ring(ring, &bounds))
                .collect(),
        ),
        MvtGeometry::Unknown(t) => MvtGeometry::Unknown(*t),
    }
}

fn clip_points(parts: &[MvtPart], bounds: &ClipBounds) -> Vec<MvtPart> {
    parts
        .iter()
        .map(|part| {
            part.iter()
                .filter(|p| bounds.contains(p))
                .copied()
                .collect::<MvtPart>()
        })
        .filter(|part| !part.is_empty())
        .collect()
}

/// Clips a line, splitting it into several parts if it leaves the area and comes back.
fn clip_line(line: &[TilePoint], bounds: &ClipBounds) -> Vec<MvtPart> {
    if line.len() < 2 {
        return match line.first() {
            Some(p) if bounds.contains(p) => vec![line.to_vec()],
            _ => vec![],
        };
    }

    let mut result = vec![];
    let mut current: MvtPart = vec![];

    for segment in line.windows(2) {
        let Some(clipped) = clip_segment(segment[0], segment[1], bounds) else {
            finish_line(&mut current, &mut result);
            continue;
        };

        if clipped.start_clipped || current.is_empty() {
            finish_line(&mut current, &mut result);
            current.push(clipped.start);
        }

        push_distinct(&mut current, clipped.end);

        if clipped.end_clipped {
            finish_line(&mut current, &mut result);
        }
    }

    finish_line(&mut current, &mut result);
    result
}

fn finish_line(current: &mut MvtPart, result: &mut Vec<MvtPart>) {
    let part = std::mem::take(current);
    if part.len() >= 2 {
        result.push(part);
    }
}

fn push_distinct(part: &mut MvtPart, point: TilePoint) {
    if part.last() != Some(&point) {
        part.push(point);
    }
}

struct ClippedSegment {
    start: TilePoint,
    end: TilePoint,
    start_clipped: bool,
    end_clipped: bool,
}

/// Liang-Barsky clipping of one segment.
fn clip_segment(a: TilePoint, b: TilePoint, bounds: &ClipBounds) -> Option<ClippedSegment> {
    let (min, max) = (bounds.min as f64, bounds.max as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let dx = b.x as f64 - ax;
    let dy = b.y as f64 - ay;

    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    for (p, q) in [
        (-dx, ax - min),
        (dx, max - ax),
        (-dy, ay - min),
        (dy, max - ay),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }

        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| TilePoint::new((ax + t * dx).round() as i64, (ay + t * dy).round() as i64);

    Some(ClippedSegment {
        start: if t0 > 0.0 { at(t0) } else { a },
        end: if t1 < 1.0 { at(t1) } else { b },
        start_clipped: t0 > 0.0,
        end_clipped: t1 < 1.0,
    })
}

/// Sutherland-Hodgman clipping of a closed ring. Winding order of the ring is preserved. Returns
/// `None` if less than three distinct points are left.
fn clip_ring(ring: &[TilePoint], bounds: &ClipBounds) -> Option<MvtPart> {
    if ring.iter().all(|p| bounds.contains(p)) {
        return Some(ring.to_vec());
    }

    let open = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    };

    let (min, max) = (bounds.min as f64, bounds.max as f64);
    let mut vertices: Vec<(f64, f64)> = open.iter().map(|p| (p.x as f64, p.y as f64)).collect();

    vertices = clip_against_edge(&vertices, |v| v.0 >= min, |a, b| at_x(a, b, min));
    vertices = clip_against_edge(&vertices, |v| v.0 <= max, |a, b| at_x(a, b, max));
    vertices = clip_against_edge(&vertices, |v| v.1 >= min, |a, b| at_y(a, b, min));
    vertices = clip_against_edge(&vertices, |v| v.1 <= max, |a, b| at_y(a, b, max));

    let mut result: MvtPart = Vec::with_capacity(vertices.len() + 1);
    for (x, y) in vertices {
        push_distinct(&mut result, TilePoint::new(x.round() as i64, y.round() as i64));
    }
    while result.len() > 1 && result.first() == result.last() {
        result.pop();
    }

    if result.len() < 3 {
        return None;
    }

    result.push(result[0]);
    Some(result)
}

fn at_x(a: &(f64, f64), b: &(f64, f64), x: f64) -> (f64, f64) {
    let t = (x - a.0) / (b.0 - a.0);
    (x, a.1 + t * (b.1 - a.1))
}

fn at_y(a: &(f64, f64), b: &(f64, f64), y: f64) -> (f64, f64) {
    let t = (y - a.1) / (b.1 - a.1);
    (a.0 + t * (b.0 - a.0), y)
}

fn clip_against_edge<F, I>(vertices: &[(f64, f64)], inside: F, intersect: I) -> Vec<(f64, f64)>
where
    F: Fn(&(f64, f64)) -> bool,
    I: Fn(&(f64, f64), &(f64, f64)) -> (f64, f64),
{
    let mut output = Vec::with_capacity(vertices.len() + 4);

    for i in 0..vertices.len() {
        let current = &vertices[i];
        let next = &vertices[(i + 1) % vertices.len()];

        match (inside(current), inside(next)) {
            (true, true) => output.push(*current),
            (true, false) => {
                output.push(*current);
                output.push(intersect(current, next));
            }
            (false, true) => output.push(intersect(current, next)),
            (false, false) => {}
        }
    }

    output
}
