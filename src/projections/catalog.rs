//! Projection catalog. Native planes use radians-scale units with `y`
//! growing north; the world transform flips `y` for screen space.

use super::GeoProjection;
use crate::core::geo::{EARTH_RECT, MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE};
use crate::core::geometry::{Geographic, Projected, Rect, Vec2};
use crate::traits::Transform;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Latitude at which the Mercator world becomes square.
pub const MERCATOR_MAX_LATITUDE: f64 = 85.0511287798;

fn finite(x: f64, y: f64) -> Option<(f64, f64)> {
    (x.is_finite() && y.is_finite()).then_some((x, y))
}

fn on_globe(lon: f64, lat: f64) -> bool {
    lon.abs() <= MAX_LONGITUDE && (MIN_LATITUDE..=MAX_LATITUDE).contains(&lat)
}

/// Plate carrée: degrees map straight onto the plane
#[derive(Debug, Clone, Copy, Default)]
pub struct GeographicProjection;

impl Transform<Vec2<Geographic>, Vec2<Projected>> for GeographicProjection {
    fn project(&self, v: Vec2<Geographic>) -> Option<Vec2<Projected>> {
        finite(v.x, v.y).map(|(x, y)| Vec2::new(x, y))
    }

    fn invert(&self, v: Vec2<Projected>) -> Option<Vec2<Geographic>> {
        let (lon, lat) = finite(v.x, v.y)?;
        on_globe(lon, lat).then(|| Vec2::new(lon, lat))
    }
}

impl GeoProjection for GeographicProjection {
    fn valid_rect(&self) -> Rect<Geographic> {
        EARTH_RECT
    }

    fn cylindrical(&self) -> bool {
        true
    }
}

/// Spherical Web Mercator
#[derive(Debug, Clone, Copy, Default)]
pub struct MercatorProjection;

impl Transform<Vec2<Geographic>, Vec2<Projected>> for MercatorProjection {
    fn project(&self, v: Vec2<Geographic>) -> Option<Vec2<Projected>> {
        if v.y.abs() >= MAX_LATITUDE {
            return None;
        }
        let x = v.x.to_radians();
        let y = (FRAC_PI_4 + v.y.to_radians() / 2.0).tan().ln();
        finite(x, y).map(|(x, y)| Vec2::new(x, y))
    }

    fn invert(&self, v: Vec2<Projected>) -> Option<Vec2<Geographic>> {
        let lon = v.x.to_degrees();
        let lat = v.y.sinh().atan().to_degrees();
        finite(lon, lat).map(|(lon, lat)| Vec2::new(lon, lat))
    }
}

impl GeoProjection for MercatorProjection {
    fn valid_rect(&self) -> Rect<Geographic> {
        Rect::from_ranges(
            (-MAX_LONGITUDE, MAX_LONGITUDE),
            (-MERCATOR_MAX_LATITUDE, MERCATOR_MAX_LATITUDE),
        )
    }

    fn cylindrical(&self) -> bool {
        true
    }
}

/// Lambert azimuthal equal-area centred on (0, 0), limited to the near hemisphere
#[derive(Debug, Clone, Copy, Default)]
pub struct AzimuthalEqualAreaProjection;

impl Transform<Vec2<Geographic>, Vec2<Projected>> for AzimuthalEqualAreaProjection {
    fn project(&self, v: Vec2<Geographic>) -> Option<Vec2<Projected>> {
        let (lambda, phi) = (v.x.to_radians(), v.y.to_radians());
        let denom = 1.0 + phi.cos() * lambda.cos();
        if denom <= f64::EPSILON {
            return None;
        }
        let k = (2.0 / denom).sqrt();
        finite(k * phi.cos() * lambda.sin(), k * phi.sin()).map(|(x, y)| Vec2::new(x, y))
    }

    fn invert(&self, v: Vec2<Projected>) -> Option<Vec2<Geographic>> {
        let rho = v.x.hypot(v.y);
        if rho > 2.0 || !rho.is_finite() {
            return None;
        }
        if rho == 0.0 {
            return Some(Vec2::new(0.0, 0.0));
        }
        let c = 2.0 * (rho / 2.0).asin();
        let lambda = (v.x * c.sin()).atan2(rho * c.cos());
        let phi = (v.y * c.sin() / rho).clamp(-1.0, 1.0).asin();
        Some(Vec2::new(lambda.to_degrees(), phi.to_degrees()))
    }
}

impl GeoProjection for AzimuthalEqualAreaProjection {
    fn valid_rect(&self) -> Rect<Geographic> {
        Rect::from_ranges((-90.0, 90.0), (MIN_LATITUDE, MAX_LATITUDE))
    }

    fn cylindrical(&self) -> bool {
        false
    }
}

/// Albers conic equal-area with two standard parallels (radians)
#[derive(Debug, Clone, Copy)]
pub struct ConicEqualAreaProjection {
    n: f64,
    c: f64,
    rho0: f64,
}

impl ConicEqualAreaProjection {
    pub fn new(parallel0: f64, parallel1: f64) -> Self {
        let n = (parallel0.sin() + parallel1.sin()) / 2.0;
        let c = parallel0.cos().powi(2) + 2.0 * n * parallel0.sin();
        let rho0 = c.sqrt() / n;
        Self { n, c, rho0 }
    }
}

impl Transform<Vec2<Geographic>, Vec2<Projected>> for ConicEqualAreaProjection {
    fn project(&self, v: Vec2<Geographic>) -> Option<Vec2<Projected>> {
        let (lambda, phi) = (v.x.to_radians(), v.y.to_radians());
        let radicand = self.c - 2.0 * self.n * phi.sin();
        if radicand < 0.0 {
            return None;
        }
        let rho = radicand.sqrt() / self.n;
        let theta = self.n * lambda;
        finite(rho * theta.sin(), self.rho0 - rho * theta.cos()).map(|(x, y)| Vec2::new(x, y))
    }

    fn invert(&self, v: Vec2<Projected>) -> Option<Vec2<Geographic>> {
        let rho0_y = self.rho0 - v.y;
        let rho = self.n.signum() * v.x.hypot(rho0_y);
        let theta = (v.x * self.n.signum()).atan2(rho0_y * self.n.signum());
        let lambda = theta / self.n;
        let sin_phi = (self.c - (rho * self.n).powi(2)) / (2.0 * self.n);
        if !(-1.0..=1.0).contains(&sin_phi) || lambda.abs() > std::f64::consts::PI + 1e-9 {
            return None;
        }
        let phi = sin_phi.asin();
        if phi.abs() > FRAC_PI_2 {
            return None;
        }
        finite(lambda.to_degrees(), phi.to_degrees()).map(|(x, y)| Vec2::new(x, y))
    }
}

impl GeoProjection for ConicEqualAreaProjection {
    fn valid_rect(&self) -> Rect<Geographic> {
        EARTH_RECT
    }

    fn cylindrical(&self) -> bool {
        false
    }
}
