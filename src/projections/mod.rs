//! Geographic projections and their composition into world space.
//!
//! A [`GeoProjection`] maps longitude/latitude into its own native plane and
//! may fail outside its valid rectangle. [`map_projection::MapProjectionBuilder`]
//! scales that plane into the fixed world rectangle used by the viewport.

pub mod catalog;
pub mod map_projection;

pub use catalog::{
    AzimuthalEqualAreaProjection, ConicEqualAreaProjection, GeographicProjection,
    MercatorProjection,
};
pub use map_projection::{transform_bbox, try_transform_bbox, MapProjection, MapProjectionBuilder};

use crate::core::geometry::{Geographic, Projected, Rect, Vec2};
use crate::traits::Transform;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A geographic projection supplied by the projection catalog.
///
/// `project`/`invert` are partial: `None` means the input lies outside the
/// projection's domain.
pub trait GeoProjection:
    Transform<Vec2<Geographic>, Vec2<Projected>> + fmt::Debug + Send + Sync
{
    /// Part of the globe this projection can display
    fn valid_rect(&self) -> Rect<Geographic>;

    /// Cylindrical projections wrap horizontally
    fn cylindrical(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProjectionType {
    Geographic,
    Mercator,
    AzimuthalEqualArea,
    ConicEqualArea,
}

impl ProjectionType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Geographic => "geographic",
            Self::Mercator => "mercator",
            Self::AzimuthalEqualArea => "azimuthal",
            Self::ConicEqualArea => "conic",
        }
    }

    pub fn create(&self) -> Arc<dyn GeoProjection> {
        match self {
            Self::Geographic => Arc::new(GeographicProjection),
            Self::Mercator => Arc::new(MercatorProjection),
            Self::AzimuthalEqualArea => Arc::new(AzimuthalEqualAreaProjection),
            Self::ConicEqualArea => {
                Arc::new(ConicEqualAreaProjection::new(0.0, std::f64::consts::PI / 3.0))
            }
        }
    }
}

impl Default for ProjectionType {
    fn default() -> Self {
        Self::Mercator
    }
}

impl fmt::Display for ProjectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProjectionType {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "geographic" => Ok(Self::Geographic),
            "mercator" => Ok(Self::Mercator),
            "azimuthal" | "azimuthal_equal_area" => Ok(Self::AzimuthalEqualArea),
            "conic" | "conic_equal_area" => Ok(Self::ConicEqualArea),
            _ => Err(MapError::UnknownProjection(s.to_string())),
        }
    }
}

impl TryFrom<String> for ProjectionType {
    type Error = MapError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ProjectionType> for String {
    fn from(p: ProjectionType) -> Self {
        p.name().to_string()
    }
}
