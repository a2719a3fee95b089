use crate::core::geometry::{Geographic, Rect, Vec2};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;
pub const FULL_LONGITUDE: f64 = MAX_LONGITUDE - MIN_LONGITUDE;
pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const FULL_LATITUDE: f64 = MAX_LATITUDE - MIN_LATITUDE;

/// The whole globe as a geographic rectangle: origin `(-180, -90)`, size `(360, 180)`
pub const EARTH_RECT: Rect<Geographic> =
    Rect::new(MIN_LONGITUDE, MIN_LATITUDE, FULL_LONGITUDE, FULL_LATITUDE);

/// Wraps a longitude into `[-180, 180)`
pub fn normalize_lon(lon: f64) -> f64 {
    (lon - MIN_LONGITUDE).rem_euclid(FULL_LONGITUDE) + MIN_LONGITUDE
}

/// Wraps a longitude into `(-180, 180]`, used for eastern edges
fn normalize_east_lon(lon: f64) -> f64 {
    let lon = normalize_lon(lon);
    if lon == MIN_LONGITUDE {
        MAX_LONGITUDE
    } else {
        lon
    }
}

pub fn limit_lat(lat: f64) -> f64 {
    lat.clamp(MIN_LATITUDE, MAX_LATITUDE)
}

/// Immutable geographic rectangle in degrees.
///
/// Latitudes are always ordered. Longitudes are not: when `min_lon > max_lon`
/// the rectangle runs east from `min_lon` across the antimeridian to
/// `max_lon`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct GeoRectangle {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl GeoRectangle {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self> {
        if min_lat > max_lat {
            return Err(MapError::InvalidLatitudeRange {
                min: min_lat,
                max: max_lat,
            });
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Converts an unrolled rectangle (whose right edge may lie past 180°, or
    /// whose left edge may lie before -180°) into a possibly crossing one.
    pub fn from_rect(rect: &Rect<Geographic>) -> Self {
        let (min_lon, max_lon) = if rect.width() >= FULL_LONGITUDE {
            (MIN_LONGITUDE, MAX_LONGITUDE)
        } else {
            (normalize_lon(rect.left()), normalize_east_lon(rect.right()))
        };
        let min_lat = limit_lat(rect.top().min(rect.bottom()));
        let max_lat = limit_lat(rect.top().max(rect.bottom()));
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lon > self.max_lon
    }

    pub fn longitude_span(&self) -> f64 {
        if self.crosses_antimeridian() {
            self.max_lon - self.min_lon + FULL_LONGITUDE
        } else {
            self.max_lon - self.min_lon
        }
    }

    pub fn latitude_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Zero area on either axis
    pub fn is_empty(&self) -> bool {
        self.longitude_span() == 0.0 || self.latitude_span() == 0.0
    }

    pub fn center(&self) -> Vec2<Geographic> {
        Vec2::new(
            normalize_lon(self.min_lon + self.longitude_span() / 2.0),
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Longitude ranges with `start <= end`, one per side of the antimeridian
    pub fn longitude_ranges(&self) -> Vec<(f64, f64)> {
        if self.crosses_antimeridian() {
            vec![(self.min_lon, MAX_LONGITUDE), (MIN_LONGITUDE, self.max_lon)]
        } else {
            vec![(self.min_lon, self.max_lon)]
        }
    }

    /// One rectangle, or two when the antimeridian is crossed
    pub fn split_by_antimeridian(&self) -> Vec<Rect<Geographic>> {
        self.longitude_ranges()
            .into_iter()
            .map(|lon_range| Rect::from_ranges(lon_range, (self.min_lat, self.max_lat)))
            .collect()
    }

    /// Single rectangle whose right edge may exceed 180°
    pub fn to_bounding_rect(&self) -> Rect<Geographic> {
        Rect::new(
            self.min_lon,
            self.min_lat,
            self.longitude_span(),
            self.latitude_span(),
        )
    }

    pub fn contains(&self, point: &Vec2<Geographic>) -> bool {
        let lon = point.x;
        let lat_ok = lat_in(point.y, self.min_lat, self.max_lat);
        lat_ok
            && self
                .longitude_ranges()
                .iter()
                .any(|&(start, end)| lon >= start && lon <= end)
    }

    /// True when every part of `other` lies inside `self`, both rectangles
    /// possibly crossing the antimeridian.
    pub fn encloses(&self, other: &GeoRectangle) -> bool {
        if other.min_lat < self.min_lat || other.max_lat > self.max_lat {
            return false;
        }
        let own = self.longitude_ranges();
        other.longitude_ranges().iter().all(|&(start, end)| {
            own.iter()
                .any(|&(own_start, own_end)| start >= own_start && end <= own_end)
        })
    }

    pub fn intersects(&self, other: &GeoRectangle) -> bool {
        if other.max_lat < self.min_lat || other.min_lat > self.max_lat {
            return false;
        }
        let own = self.longitude_ranges();
        other.longitude_ranges().iter().any(|&(start, end)| {
            own.iter()
                .any(|&(own_start, own_end)| start <= own_end && own_start <= end)
        })
    }
}

fn lat_in(lat: f64, min: f64, max: f64) -> bool {
    lat >= min && lat <= max
}

impl TryFrom<[f64; 4]> for GeoRectangle {
    type Error = MapError;

    fn try_from(v: [f64; 4]) -> Result<Self> {
        GeoRectangle::new(v[0], v[1], v[2], v[3])
    }
}

impl From<GeoRectangle> for [f64; 4] {
    fn from(r: GeoRectangle) -> Self {
        [r.min_lon, r.min_lat, r.max_lon, r.max_lat]
    }
}
