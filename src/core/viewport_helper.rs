//! Wraparound ("looping") geometry over the fixed world rectangle.

use crate::core::bbox::GeoBoundingBoxCalculator;
use crate::core::geometry::{Rect, Vec2, World};
use crate::tiles::quad_key::{calculate_cell_keys, CellKey};
use crate::Result;
use fxhash::FxHashSet;

/// Normalisation, distances, splitting and tiling for a map whose axes may
/// wrap around independently
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportHelper {
    map_rect: Rect<World>,
    loop_x: bool,
    loop_y: bool,
}

impl ViewportHelper {
    pub fn new(map_rect: Rect<World>, loop_x: bool, loop_y: bool) -> Self {
        Self {
            map_rect,
            loop_x,
            loop_y,
        }
    }

    pub fn map_rect(&self) -> &Rect<World> {
        &self.map_rect
    }

    pub fn loop_x(&self) -> bool {
        self.loop_x
    }

    pub fn loop_y(&self) -> bool {
        self.loop_y
    }

    pub fn normalize(&self, point: Vec2<World>) -> Vec2<World> {
        Vec2::new(self.normalize_x(point.x), self.normalize_y(point.y))
    }

    pub fn normalize_x(&self, x: f64) -> f64 {
        normalize_axis(x, self.map_rect.x_range(), self.loop_x)
    }

    pub fn normalize_y(&self, y: f64) -> f64 {
        normalize_axis(y, self.map_rect.y_range(), self.loop_y)
    }

    /// Signed distance from `from` to `to`, the short way round on a looping axis
    pub fn distance_x(&self, from: f64, to: f64) -> f64 {
        distance_axis(from, to, self.map_rect.width(), self.loop_x)
    }

    pub fn distance_y(&self, from: f64, to: f64) -> f64 {
        distance_axis(from, to, self.map_rect.height(), self.loop_y)
    }

    pub fn calculate_bounding_box(&self, rects: &[Rect<World>]) -> Result<Rect<World>> {
        GeoBoundingBoxCalculator::new(self.map_rect, self.loop_x, self.loop_y).from_rects(rects)
    }

    /// Cuts `rect` into pieces that each lie inside the map rectangle.
    ///
    /// On a looping axis the range is first moved onto the primary copy of
    /// the map, then cut where it crosses the far edge. A non-looping axis is
    /// clamped and never split.
    pub fn split_rect(&self, rect: &Rect<World>) -> Vec<Rect<World>> {
        let xs = split_axis(rect.x_range(), self.map_rect.x_range(), self.loop_x);
        let ys = split_axis(rect.y_range(), self.map_rect.y_range(), self.loop_y);
        xs.iter()
            .flat_map(|&x_range| ys.iter().map(move |&y_range| Rect::from_ranges(x_range, y_range)))
            .collect()
    }

    /// Origins of every repetition of `obj_rect` that shows up in `view_rect`
    pub fn get_origins(&self, obj_rect: &Rect<World>, view_rect: &Rect<World>) -> Vec<Vec2<World>> {
        let xs = axis_origins(
            obj_rect.left(),
            view_rect.x_range(),
            self.map_rect.width(),
            self.loop_x,
        );
        let ys = axis_origins(
            obj_rect.top(),
            view_rect.y_range(),
            self.map_rect.height(),
            self.loop_y,
        );
        xs.iter()
            .flat_map(|&x| ys.iter().map(move |&y| Vec2::new(x, y)))
            .collect()
    }

    /// Cell keys at `zoom` covering `view_rect`, wraparound included
    pub fn get_cells(&self, view_rect: &Rect<World>, zoom: u32) -> FxHashSet<CellKey> {
        self.split_rect(view_rect)
            .iter()
            .flat_map(|piece| calculate_cell_keys(&self.map_rect, piece, zoom))
            .collect()
    }
}

fn normalize_axis(v: f64, (min, max): (f64, f64), looping: bool) -> f64 {
    if !looping {
        return v.clamp(min, max);
    }
    let length = max - min;
    if length <= 0.0 {
        return min;
    }
    let wrapped = (v - min).rem_euclid(length) + min;
    // rem_euclid can round up to exactly `length` for tiny negative inputs
    if wrapped >= max {
        min
    } else {
        wrapped
    }
}

fn distance_axis(from: f64, to: f64, length: f64, looping: bool) -> f64 {
    let direct = to - from;
    if !looping {
        return direct;
    }
    let dist = direct.abs() % length;
    if length - dist < dist {
        let wrapped = length - dist;
        if direct > 0.0 {
            -wrapped
        } else {
            wrapped
        }
    } else {
        dist.copysign(direct)
    }
}

fn split_axis((start, end): (f64, f64), (min, max): (f64, f64), looping: bool) -> Vec<(f64, f64)> {
    if !looping {
        let (start, end) = (start.max(min), end.min(max));
        return if start <= end { vec![(start, end)] } else { Vec::new() };
    }

    let length = max - min;
    if end - start >= length {
        return vec![(min, max)];
    }

    // Move the range onto the primary copy, then cut it at the right edge
    let shifted_start = normalize_axis(start, (min, max), true);
    let shifted_end = shifted_start + (end - start);
    if shifted_end <= max {
        vec![(shifted_start, shifted_end)]
    } else {
        vec![(min, shifted_end - length), (shifted_start, max)]
    }
}

fn axis_origins(obj_start: f64, (view_start, view_end): (f64, f64), length: f64, looping: bool) -> Vec<f64> {
    if !looping || length <= 0.0 {
        return vec![obj_start];
    }
    let mut origin = obj_start - ((obj_start - view_start) / length).ceil() * length;
    let mut origins = Vec::new();
    while origin < view_end {
        origins.push(origin);
        origin += length;
    }
    origins
}
