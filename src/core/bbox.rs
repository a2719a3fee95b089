//! Minimal enclosing rectangles over points and rectangles.
//!
//! On a looping axis the coordinates live on a circle, so "minimal" means
//! cutting the circle at its largest empty gap: the bounding range is the
//! complement of that gap. Non-looping axes use plain min/max.

use crate::core::geo::{GeoRectangle, EARTH_RECT};
use crate::core::geometry::{Geographic, Rect, Vec2};
use crate::{MapError, Result};

/// Bounding box calculator over a fixed map rectangle with independent
/// wraparound per axis
#[derive(Debug, Clone, Copy)]
pub struct GeoBoundingBoxCalculator<S> {
    map_rect: Rect<S>,
    loop_x: bool,
    loop_y: bool,
}

impl<S> GeoBoundingBoxCalculator<S> {
    pub fn new(map_rect: Rect<S>, loop_x: bool, loop_y: bool) -> Self {
        Self {
            map_rect,
            loop_x,
            loop_y,
        }
    }

    pub fn map_rect(&self) -> &Rect<S> {
        &self.map_rect
    }

    pub fn calculate_bounding_box(&self, points: &[Vec2<S>]) -> Result<Rect<S>> {
        self.from_segments(
            points.iter().map(|p| (p.x, p.x)).collect(),
            points.iter().map(|p| (p.y, p.y)).collect(),
        )
    }

    /// Flat `[x0, y0, x1, y1, ...]` list
    pub fn from_lon_lat_pairs(&self, coords: &[f64]) -> Result<Rect<S>> {
        if coords.len() % 2 != 0 {
            return Err(MapError::InvalidInput(
                "Longitude-Latitude list is not even-numbered.".to_string(),
            ));
        }
        self.from_segments(
            coords.chunks_exact(2).map(|c| (c[0], c[0])).collect(),
            coords.chunks_exact(2).map(|c| (c[1], c[1])).collect(),
        )
    }

    pub fn from_xy(&self, xs: &[f64], ys: &[f64]) -> Result<Rect<S>> {
        if xs.len() != ys.len() {
            return Err(MapError::InvalidInput(
                "Longitude list count is not equal Latitude list count.".to_string(),
            ));
        }
        self.from_segments(
            xs.iter().map(|&x| (x, x)).collect(),
            ys.iter().map(|&y| (y, y)).collect(),
        )
    }

    /// Parallel lists of per-item limits
    pub fn from_limits(
        &self,
        min_xs: &[f64],
        min_ys: &[f64],
        max_xs: &[f64],
        max_ys: &[f64],
    ) -> Result<Rect<S>> {
        let count = min_xs.len();
        if min_ys.len() != count || max_xs.len() != count || max_ys.len() != count {
            return Err(MapError::InvalidInput(
                "Counts of min/max coordinate lists are not equal.".to_string(),
            ));
        }
        self.from_segments(
            min_xs.iter().copied().zip(max_xs.iter().copied()).collect(),
            min_ys.iter().copied().zip(max_ys.iter().copied()).collect(),
        )
    }

    pub fn from_rects(&self, rects: &[Rect<S>]) -> Result<Rect<S>> {
        self.from_segments(
            rects.iter().map(Rect::x_range).collect(),
            rects.iter().map(Rect::y_range).collect(),
        )
    }

    fn from_segments(
        &self,
        x_segments: Vec<(f64, f64)>,
        y_segments: Vec<(f64, f64)>,
    ) -> Result<Rect<S>> {
        let x_range = bounding_range(&x_segments, self.map_rect.x_range(), self.loop_x)?;
        let y_range = bounding_range(&y_segments, self.map_rect.y_range(), self.loop_y)?;
        Ok(Rect::from_ranges(x_range, y_range))
    }
}

impl GeoBoundingBoxCalculator<Geographic> {
    /// Longitude loops around the globe, latitude does not
    pub fn earth() -> Self {
        Self::new(EARTH_RECT, true, false)
    }

    pub fn from_geo_rectangles(&self, rects: &[GeoRectangle]) -> Result<Rect<Geographic>> {
        self.from_segments(
            rects.iter().map(|r| (r.min_lon(), r.max_lon())).collect(),
            rects.iter().map(|r| (r.min_lat(), r.max_lat())).collect(),
        )
    }
}

/// Smallest rectangle enclosing `(lon, lat)` points, crossing the
/// antimeridian when that is shorter
pub fn union_points(points: &[(f64, f64)]) -> Result<GeoRectangle> {
    let points: Vec<Vec2<Geographic>> = points.iter().map(|&(x, y)| Vec2::new(x, y)).collect();
    let rect = GeoBoundingBoxCalculator::earth().calculate_bounding_box(&points)?;
    Ok(GeoRectangle::from_rect(&rect))
}

/// Smallest rectangle enclosing all rectangles, crossing the antimeridian
/// when that is shorter
pub fn union_rectangles(rects: &[GeoRectangle]) -> Result<GeoRectangle> {
    let rect = GeoBoundingBoxCalculator::earth().from_geo_rectangles(rects)?;
    Ok(GeoRectangle::from_rect(&rect))
}

fn bounding_range(segments: &[(f64, f64)], map_range: (f64, f64), looping: bool) -> Result<(f64, f64)> {
    if looping {
        calculate_loop_limit_range(segments, map_range)
    } else {
        calculate_limit_range(segments, map_range)
    }
}

fn calculate_limit_range(segments: &[(f64, f64)], map_range: (f64, f64)) -> Result<(f64, f64)> {
    let mut iter = segments.iter().map(|&(start, end)| {
        // a wrapped segment on a non-looping axis spans the whole map
        if end < start {
            map_range
        } else {
            (start, end)
        }
    });
    let first = iter.next().ok_or(MapError::NoCoordinates)?;
    Ok(iter.fold(first, |(min, max), (start, end)| {
        (min.min(start), max.max(end))
    }))
}

/// Minimal range covering every segment on a loop of `map_range`.
///
/// Segments with `start > end` wrap past the end of the map range. The result
/// is the complement of the largest gap between segments. The wraparound gap
/// (from the last segment end back to the first segment start) is considered
/// first and inner gaps replace it only when strictly larger, so equal gaps
/// resolve to the earliest one in start order. The returned range may extend
/// beyond `map_range` on one side; its centre always lies inside it.
pub fn calculate_loop_limit_range(segments: &[(f64, f64)], map_range: (f64, f64)) -> Result<(f64, f64)> {
    if segments.is_empty() {
        return Err(MapError::NoCoordinates);
    }

    let (map_min, map_max) = map_range;
    let width = map_max - map_min;

    let mut spans = Vec::with_capacity(segments.len() + 1);
    for &(start, end) in segments {
        split_span(start, end, map_min, map_max, &mut spans);
    }
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));

    let first_start = spans[0].0;
    let max_end = spans
        .iter()
        .map(|&(_, end)| end)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut gap = Gap::Wraparound {
        length: (first_start + width - max_end).max(0.0),
    };
    let mut prev_end = spans[0].1;
    for &(start, end) in &spans[1..] {
        if start > prev_end && start - prev_end > gap.length() {
            gap = Gap::Inner {
                from: prev_end,
                to: start,
            };
        }
        prev_end = prev_end.max(end);
    }

    let range = match gap {
        Gap::Wraparound { .. } => (first_start, max_end),
        Gap::Inner { from, to } => (to, from + width),
    };
    Ok(normalize_center(range, map_range))
}

#[derive(Debug, Clone, Copy)]
enum Gap {
    Wraparound { length: f64 },
    Inner { from: f64, to: f64 },
}

impl Gap {
    fn length(&self) -> f64 {
        match *self {
            Gap::Wraparound { length } => length,
            Gap::Inner { from, to } => to - from,
        }
    }
}

fn split_span(start: f64, end: f64, min: f64, max: f64, spans: &mut Vec<(f64, f64)>) {
    if end < start {
        spans.push((start, max));
        spans.push((min, end));
    } else {
        spans.push((start, end));
    }
}

fn normalize_center(range: (f64, f64), map_range: (f64, f64)) -> (f64, f64) {
    let center = (range.0 + range.1) / 2.0;
    if center >= map_range.0 && center <= map_range.1 {
        range
    } else {
        let width = map_range.1 - map_range.0;
        (range.0 - width, range.1 - width)
    }
}
