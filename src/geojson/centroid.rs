//! Representative points of GeoJSON geometries.
//!
//! Polygons use the area-weighted centroid with holes subtracted, lines the
//! length-weighted centroid of their segments and points the vertex mean.
//! The highest dimension with a non-zero measure wins, so a degenerate polygon
//! falls back to its boundary and then to its vertices.

use crate::geojson::collection::{Geometry, Position};
use crate::types::lat_lon::LatLon;

#[derive(Debug, Default, Clone, Copy)]
struct Moments {
    weight: f64,
    x: f64,
    y: f64,
}

impl Moments {
    fn add(&mut self, weight: f64, x: f64, y: f64) {
        self.weight += weight;
        self.x += weight * x;
        self.y += weight * y;
    }

    fn result(&self) -> Option<LatLon> {
        if self.weight > 0.0 && self.weight.is_finite() {
            Some(LatLon(self.y / self.weight, self.x / self.weight))
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    area: Moments,
    line: Moments,
    point: Moments,
}

fn xy(position: &Position) -> Option<(f64, f64)> {
    match position.as_slice() {
        [x, y, ..] if x.is_finite() && y.is_finite() => Some((*x, *y)),
        _ => None,
    }
}

/// Ring vertices without the closing duplicate.
fn ring_vertices(ring: &[Position]) -> Vec<(f64, f64)> {
    let mut vertices: Vec<(f64, f64)> = ring.iter().filter_map(xy).collect();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}

/// Absolute area and centroid of a ring, `None` when the area is zero.
fn ring_area(vertices: &[(f64, f64)]) -> Option<(f64, f64, f64)> {
    let (ox, oy) = *vertices.first()?;
    let n = vertices.len();
    let (mut twice_area, mut cx, mut cy) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let (x0, y0) = (vertices[i].0 - ox, vertices[i].1 - oy);
        let (x1, y1) = (vertices[(i + 1) % n].0 - ox, vertices[(i + 1) % n].1 - oy);
        let cross = x0 * y1 - x1 * y0;
        twice_area += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    if twice_area == 0.0 {
        return None;
    }
    let scale = 3.0 * twice_area;
    Some((twice_area.abs() / 2.0, ox + cx / scale, oy + cy / scale))
}

impl Accumulator {
    fn add_points<'a>(&mut self, positions: impl IntoIterator<Item = &'a (f64, f64)>) {
        for &(x, y) in positions {
            self.point.add(1.0, x, y);
        }
    }

    fn add_path(&mut self, vertices: &[(f64, f64)], closed: bool) {
        let mut segments: Vec<((f64, f64), (f64, f64))> =
            vertices.windows(2).map(|w| (w[0], w[1])).collect();
        if closed && vertices.len() > 2 {
            if let (Some(&first), Some(&last)) = (vertices.first(), vertices.last()) {
                segments.push((last, first));
            }
        }
        for ((x0, y0), (x1, y1)) in segments {
            let length = (x1 - x0).hypot(y1 - y0);
            self.line.add(length, (x0 + x1) / 2.0, (y0 + y1) / 2.0);
        }
    }

    fn add_line(&mut self, line: &[Position]) {
        let vertices: Vec<(f64, f64)> = line.iter().filter_map(xy).collect();
        self.add_path(&vertices, false);
        self.add_points(&vertices);
    }

    fn add_polygon(&mut self, rings: &[Vec<Position>]) {
        let mut polygon = Moments::default();
        for (i, ring) in rings.iter().enumerate() {
            let vertices = ring_vertices(ring);
            if let Some((area, cx, cy)) = ring_area(&vertices) {
                let sign = if i == 0 { 1.0 } else { -1.0 };
                polygon.add(sign * area, cx, cy);
            }
            self.add_path(&vertices, true);
            self.add_points(&vertices);
        }
        if polygon.weight > 0.0 {
            self.area.weight += polygon.weight;
            self.area.x += polygon.x;
            self.area.y += polygon.y;
        }
    }

    fn add(&mut self, geometry: &Geometry) {
        match geometry {
            Geometry::Point { coordinates } => {
                if let Some((x, y)) = xy(coordinates) {
                    self.point.add(1.0, x, y);
                }
            }
            Geometry::MultiPoint { coordinates } => {
                let vertices: Vec<(f64, f64)> = coordinates.iter().filter_map(xy).collect();
                self.add_points(&vertices);
            }
            Geometry::LineString { coordinates } => self.add_line(coordinates),
            Geometry::MultiLineString { coordinates } => {
                coordinates.iter().for_each(|line| self.add_line(line))
            }
            Geometry::Polygon { coordinates } => self.add_polygon(coordinates),
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().for_each(|rings| self.add_polygon(rings))
            }
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().for_each(|g| self.add(g))
            }
        }
    }
}

/// Returns `None` only when the geometry has no usable vertex.
pub fn centroid(geometry: &Geometry) -> Option<LatLon> {
    let mut acc = Accumulator::default();
    acc.add(geometry);
    acc.area
        .result()
        .or_else(|| acc.line.result())
        .or_else(|| acc.point.result())
}
