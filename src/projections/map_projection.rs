//! Composition of a geographic projection with a linear world transform.

use super::{GeoProjection, ProjectionType};
use crate::core::constants::SAMPLING_STEPS;
use crate::core::geometry::{Geographic, Projected, Rect, Vec2, World};
use crate::traits::{Composite, Transform};
use crate::{MapError, Result};
use std::sync::Arc;

/// One axis of an offset + scale transform. A negative scale reverses the axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearAxis {
    source_offset: f64,
    scale: f64,
    target_offset: f64,
}

impl LinearAxis {
    pub fn new(source_range: (f64, f64), scale: f64, target_offset: f64, reverse: bool) -> Self {
        let (source_offset, scale) = if reverse {
            (source_range.1, -scale)
        } else {
            (source_range.0, scale)
        };
        Self {
            source_offset,
            scale,
            target_offset,
        }
    }

    pub fn apply(&self, v: f64) -> f64 {
        self.target_offset + (v - self.source_offset) * self.scale
    }

    pub fn apply_inverse(&self, v: f64) -> f64 {
        self.source_offset + (v - self.target_offset) / self.scale
    }

    pub fn is_reversed(&self) -> bool {
        self.scale < 0.0
    }
}

/// Projected plane → world pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTransform {
    x: LinearAxis,
    y: LinearAxis,
}

impl Transform<Vec2<Projected>, Vec2<World>> for LinearTransform {
    fn project(&self, v: Vec2<Projected>) -> Option<Vec2<World>> {
        Some(Vec2::new(self.x.apply(v.x), self.y.apply(v.y)))
    }

    fn invert(&self, v: Vec2<World>) -> Option<Vec2<Projected>> {
        Some(Vec2::new(self.x.apply_inverse(v.x), self.y.apply_inverse(v.y)))
    }
}

/// Bounding box of `rect` pushed through a partial transform, sampled along
/// each edge. `None` when no sample maps.
pub fn transform_bbox<In, Out, F>(rect: &Rect<In>, f: F) -> Option<Rect<Out>>
where
    F: Fn(Vec2<In>) -> Option<Vec2<Out>>,
{
    Rect::bounding_box(edge_samples(rect).into_iter().filter_map(f))
}

/// Like [`transform_bbox`] but every sample must map.
pub fn try_transform_bbox<In, Out, F>(rect: &Rect<In>, f: F) -> Option<Rect<Out>>
where
    F: Fn(Vec2<In>) -> Option<Vec2<Out>>,
{
    let mapped = edge_samples(rect)
        .into_iter()
        .map(f)
        .collect::<Option<Vec<_>>>()?;
    Rect::bounding_box(mapped)
}

fn edge_samples<S>(rect: &Rect<S>) -> Vec<Vec2<S>> {
    let steps = SAMPLING_STEPS.max(1);
    let (left, right) = rect.x_range();
    let (top, bottom) = rect.y_range();
    let mut samples = Vec::with_capacity(4 * (steps + 1));
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = left + (right - left) * t;
        let y = top + (bottom - top) * t;
        samples.push(Vec2::new(x, top));
        samples.push(Vec2::new(x, bottom));
        samples.push(Vec2::new(left, y));
        samples.push(Vec2::new(right, y));
    }
    samples
}

pub struct MapProjectionBuilder {
    geo_projection: Arc<dyn GeoProjection>,
    map_rect: Rect<World>,
    reverse_x: bool,
    reverse_y: bool,
}

impl MapProjectionBuilder {
    pub fn new(geo_projection: Arc<dyn GeoProjection>, map_rect: Rect<World>) -> Self {
        Self {
            geo_projection,
            map_rect,
            reverse_x: false,
            reverse_y: false,
        }
    }

    pub fn reverse_x(mut self) -> Self {
        self.reverse_x = true;
        self
    }

    pub fn reverse_y(mut self) -> Self {
        self.reverse_y = true;
        self
    }

    pub fn create(self) -> Result<MapProjection> {
        let geo = self.geo_projection;
        let valid_rect = geo.valid_rect();
        let projected = try_transform_bbox(&valid_rect, |p| geo.project(p)).ok_or_else(|| {
            MapError::Projection(format!("cannot project valid rectangle {valid_rect:?}"))
        })?;

        if projected.width() <= 0.0 || projected.height() <= 0.0 {
            return Err(MapError::Projection(format!(
                "degenerate projected valid rectangle {projected:?}"
            )));
        }

        let map_rect = self.map_rect;
        let scale = (map_rect.width() / projected.width()).min(map_rect.height() / projected.height());
        let pad_x = (map_rect.width() - projected.width() * scale) / 2.0;
        let pad_y = (map_rect.height() - projected.height() * scale) / 2.0;

        let linear = LinearTransform {
            x: LinearAxis::new(projected.x_range(), scale, map_rect.left() + pad_x, self.reverse_x),
            y: LinearAxis::new(projected.y_range(), scale, map_rect.top() + pad_y, self.reverse_y),
        };

        log::debug!(
            "map projection created: scale={scale:.4}, padding=({pad_x:.2}, {pad_y:.2}), cylindrical={}",
            geo.cylindrical()
        );

        Ok(MapProjection {
            cylindrical: geo.cylindrical(),
            inner: Composite::new(geo, linear),
            map_rect,
        })
    }
}

/// Longitude/latitude ↔ world pixels over a fixed map rectangle
#[derive(Clone, Debug)]
pub struct MapProjection {
    inner: Composite<Arc<dyn GeoProjection>, LinearTransform, Vec2<Projected>>,
    map_rect: Rect<World>,
    cylindrical: bool,
}

impl MapProjection {
    /// Standard screen-oriented projection: north at the top of `map_rect`
    pub fn create(projection_type: ProjectionType, map_rect: Rect<World>) -> Result<Self> {
        MapProjectionBuilder::new(projection_type.create(), map_rect)
            .reverse_y()
            .create()
    }

    pub fn project(&self, v: Vec2<Geographic>) -> Option<Vec2<World>> {
        self.inner.project(v)
    }

    pub fn invert(&self, v: Vec2<World>) -> Option<Vec2<Geographic>> {
        self.inner.invert(v)
    }

    pub fn map_rect(&self) -> &Rect<World> {
        &self.map_rect
    }

    pub fn cylindrical(&self) -> bool {
        self.cylindrical
    }

    pub fn geo_projection(&self) -> &Arc<dyn GeoProjection> {
        self.inner.first()
    }

    /// Geographic extent covered by a world rectangle, if any part of it maps
    pub fn invert_rect(&self, rect: &Rect<World>) -> Option<Rect<Geographic>> {
        transform_bbox(rect, |p| self.invert(p))
    }

    /// World extent of a geographic rectangle, if any part of it maps
    pub fn project_rect(&self, rect: &Rect<Geographic>) -> Option<Rect<World>> {
        transform_bbox(rect, |p| self.project(p))
    }
}

impl Transform<Vec2<Geographic>, Vec2<World>> for MapProjection {
    fn project(&self, v: Vec2<Geographic>) -> Option<Vec2<World>> {
        MapProjection::project(self, v)
    }

    fn invert(&self, v: Vec2<World>) -> Option<Vec2<Geographic>> {
        MapProjection::invert(self, v)
    }
}
