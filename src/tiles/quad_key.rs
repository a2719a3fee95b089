//! Hierarchical quad-key tile addressing.
//!
//! A key is a string of digits `0..=3`, one per zoom level. Each digit picks a
//! quadrant of its parent: bit 0 selects the east half and bit 1 the lower
//! half, rows being counted from the top edge. In geographic space the top
//! edge is the north pole, so `0` = NW, `1` = NE, `2` = SW and `3` = SE. In
//! world space the top edge is `y = map_rect.top()` since `y` grows downward.

use crate::core::constants::MAX_QUAD_KEY_ZOOM;
use crate::core::geo::{GeoRectangle, EARTH_RECT};
use crate::core::geometry::{Geographic, Rect, World};
use crate::{MapError, Result};
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic tile address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuadKey(String);

impl QuadKey {
    /// Key of the whole map
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn parse(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.len() > MAX_QUAD_KEY_ZOOM as usize || !key.bytes().all(|b| (b'0'..=b'3').contains(&b)) {
            return Err(MapError::InvalidQuadKey(key));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn zoom(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn parent(&self) -> Option<QuadKey> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_string()))
        }
    }

    pub fn children(&self) -> [QuadKey; 4] {
        ['0', '1', '2', '3'].map(|digit| {
            let mut key = String::with_capacity(self.0.len() + 1);
            key.push_str(&self.0);
            key.push(digit);
            Self(key)
        })
    }

    /// Proper prefixes from the parent up to zoom 1
    pub fn ancestors(&self) -> impl Iterator<Item = QuadKey> + '_ {
        (1..self.0.len()).rev().map(move |len| Self(self.0[..len].to_string()))
    }

    pub fn is_ancestor_of(&self, other: &QuadKey) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Column and row at this key's zoom level, rows counted from the top
    pub fn tile_xy(&self) -> (u32, u32) {
        self.0.bytes().fold((0, 0), |(x, y), b| {
            let digit = u32::from(b - b'0');
            ((x << 1) | (digit & 1), (y << 1) | (digit >> 1))
        })
    }

    /// Geographic rectangle of this tile over the whole earth
    pub fn compute_rect(&self) -> Rect<Geographic> {
        let (x, y) = self.tile_xy();
        let (width, height) = tile_size(&EARTH_RECT, self.zoom());
        Rect::new(
            EARTH_RECT.left() + f64::from(x) * width,
            EARTH_RECT.bottom() - f64::from(y + 1) * height,
            width,
            height,
        )
    }
}

impl fmt::Display for QuadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for QuadKey {
    type Error = MapError;

    fn try_from(key: String) -> Result<Self> {
        Self::parse(key)
    }
}

impl From<QuadKey> for String {
    fn from(key: QuadKey) -> Self {
        key.0
    }
}

impl AsRef<str> for QuadKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Screen-space tile address: a quad key over the world pixel rectangle,
/// independent of the geographic projection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellKey(QuadKey);

impl CellKey {
    pub fn new(key: QuadKey) -> Self {
        Self(key)
    }

    pub fn quad_key(&self) -> &QuadKey {
        &self.0
    }

    pub fn zoom(&self) -> u32 {
        self.0.zoom()
    }

    /// World rectangle covered by this cell
    pub fn rect(&self, map_rect: &Rect<World>) -> Rect<World> {
        tile_rect(map_rect, &self.0)
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn tile_size<S>(map_rect: &Rect<S>, zoom: u32) -> (f64, f64) {
    let tiles = f64::from(1u32 << zoom.min(MAX_QUAD_KEY_ZOOM));
    (map_rect.width() / tiles, map_rect.height() / tiles)
}

/// World rectangle of `key` inside `map_rect`, rows counted from `top()`
pub fn tile_rect(map_rect: &Rect<World>, key: &QuadKey) -> Rect<World> {
    let (x, y) = key.tile_xy();
    let (width, height) = tile_size(map_rect, key.zoom());
    Rect::new(
        map_rect.left() + f64::from(x) * width,
        map_rect.top() + f64::from(y) * height,
        width,
        height,
    )
}

/// Tile index containing `value` on an axis `[min, max]`, clamped to the grid
pub fn calc_tile_num(value: f64, min: f64, max: f64, zoom: u32) -> u32 {
    let tiles = 1u64 << zoom.min(MAX_QUAD_KEY_ZOOM);
    let position = ((value - min) / (max - min) * tiles as f64).floor();
    position.clamp(0.0, (tiles - 1) as f64) as u32
}

/// Last tile index touched by a range ending at `value`. A range ending
/// exactly on a tile boundary does not reach into the next tile.
fn calc_last_tile_num(value: f64, min: f64, max: f64, zoom: u32, first: u32) -> u32 {
    let tiles = 1u64 << zoom.min(MAX_QUAD_KEY_ZOOM);
    let position = ((value - min) / (max - min) * tiles as f64).ceil() - 1.0;
    position.clamp(f64::from(first), (tiles - 1) as f64) as u32
}

/// Interleaves the bits of `x` and `y`, most significant level first
pub fn xy_to_key(x: u32, y: u32, zoom: u32) -> QuadKey {
    let zoom = zoom.min(MAX_QUAD_KEY_ZOOM);
    let key = (0..zoom)
        .rev()
        .map(|level| {
            let digit = ((x >> level) & 1) + 2 * ((y >> level) & 1);
            char::from(b'0' + digit as u8)
        })
        .collect();
    QuadKey(key)
}

/// Column and row ranges of the tiles a rectangle touches
fn tile_ranges(
    (left, right): (f64, f64),
    (top, bottom): (f64, f64),
    x_axis: (f64, f64),
    y_axis: (f64, f64),
    zoom: u32,
) -> ((u32, u32), (u32, u32)) {
    let x0 = calc_tile_num(left, x_axis.0, x_axis.1, zoom);
    let x1 = calc_last_tile_num(right, x_axis.0, x_axis.1, zoom, x0);
    let y0 = calc_tile_num(top, y_axis.0, y_axis.1, zoom);
    let y1 = calc_last_tile_num(bottom, y_axis.0, y_axis.1, zoom, y0);
    ((x0, x1), (y0, y1))
}

fn collect_keys(
    keys: &mut FxHashSet<QuadKey>,
    (x0, x1): (u32, u32),
    (y0, y1): (u32, u32),
    zoom: u32,
) {
    for x in x0..=x1 {
        for y in y0..=y1 {
            keys.insert(xy_to_key(x, y, zoom));
        }
    }
}

/// Every geographic quad key at `zoom` whose tile overlaps `rect`.
/// Antimeridian-crossing rectangles are tiled one side at a time.
pub fn calculate_quad_keys(rect: &GeoRectangle, zoom: u32) -> FxHashSet<QuadKey> {
    let mut keys = FxHashSet::default();
    // Rows run from the north pole, so latitude is measured downward from the top
    let lat_axis = (0.0, EARTH_RECT.height());
    for piece in rect.split_by_antimeridian() {
        let (xs, ys) = tile_ranges(
            piece.x_range(),
            (EARTH_RECT.bottom() - piece.bottom(), EARTH_RECT.bottom() - piece.top()),
            EARTH_RECT.x_range(),
            lat_axis,
            zoom,
        );
        collect_keys(&mut keys, xs, ys, zoom);
    }
    keys
}

/// Every cell at `zoom` overlapping `view_rect` inside `map_rect`. The view
/// must already be split into non-wrapping pieces.
pub fn calculate_cell_keys(
    map_rect: &Rect<World>,
    view_rect: &Rect<World>,
    zoom: u32,
) -> FxHashSet<CellKey> {
    let mut keys = FxHashSet::default();
    let Some(view) = map_rect.intersection(view_rect) else {
        return FxHashSet::default();
    };
    let (xs, ys) = tile_ranges(
        view.x_range(),
        view.y_range(),
        map_rect.x_range(),
        map_rect.y_range(),
        zoom,
    );
    collect_keys(&mut keys, xs, ys, zoom);
    keys.into_iter().map(CellKey).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(items: &[&str]) -> FxHashSet<QuadKey> {
        items.iter().map(|k| QuadKey::parse(*k).unwrap()).collect()
    }

    #[test]
    fn test_calculate_quad_keys() {
        let rect = GeoRectangle::new(-107.0, 25.0, -107.0 + 14.0, 25.0 + 12.0).unwrap();
        assert_eq!(
            calculate_quad_keys(&rect, 5),
            keys(&["02130", "02112", "02133", "02132", "02131", "02113"])
        );
    }

    #[test]
    fn test_zero_tile_rect() {
        let rect = QuadKey::parse("0").unwrap().compute_rect();
        let expected = Rect::new(
            EARTH_RECT.left(),
            EARTH_RECT.center().x,
            EARTH_RECT.width() / 2.0,
            EARTH_RECT.height() / 2.0,
        );
        assert_eq!(rect, expected);
    }

    #[test]
    fn test_xy_to_key() {
        assert_eq!(xy_to_key(5, 3, 4).as_str(), "0123");
        assert_eq!(xy_to_key(0, 0, 0), QuadKey::root());
        assert_eq!(QuadKey::parse("0123").unwrap().tile_xy(), (5, 3));
    }

    #[test]
    fn test_quad_keys_round_trip() {
        for zoom in 0..=4u32 {
            let tiles = 1u32 << zoom;
            for x in 0..tiles {
                for y in 0..tiles {
                    let key = xy_to_key(x, y, zoom);
                    let rect = GeoRectangle::from_rect(&key.compute_rect());
                    assert!(
                        calculate_quad_keys(&rect, zoom).contains(&key),
                        "key {key} missing at zoom {zoom}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_antimeridian_rect_tiles_both_sides() {
        let rect = GeoRectangle::new(170.0, 10.0, -170.0, 20.0).unwrap();
        let result = calculate_quad_keys(&rect, 1);
        assert_eq!(result, keys(&["0", "1"]));
    }

    #[test]
    fn test_parse_rejects_bad_digits() {
        assert!(matches!(QuadKey::parse("0124"), Err(MapError::InvalidQuadKey(_))));
        assert!(QuadKey::parse("").is_ok());
    }

    #[test]
    fn test_hierarchy() {
        let key = QuadKey::parse("0213").unwrap();
        assert_eq!(key.parent().unwrap().as_str(), "021");
        assert_eq!(
            key.ancestors().map(String::from).collect::<Vec<_>>(),
            vec!["021", "02", "0"]
        );
        assert!(QuadKey::parse("02").unwrap().is_ancestor_of(&key));
        assert!(!key.is_ancestor_of(&key));
        let children = key.children();
        assert_eq!(children[3].as_str(), "02133");
        assert!(children.iter().all(|c| c.parent().as_ref() == Some(&key)));
    }

    #[test]
    fn test_cell_keys_cover_view() {
        let map: Rect<World> = Rect::new(0.0, 0.0, 256.0, 256.0);
        let whole = calculate_cell_keys(&map, &map, 1);
        assert_eq!(whole.len(), 4);

        let top_left = calculate_cell_keys(&map, &Rect::new(10.0, 10.0, 50.0, 50.0), 1);
        assert_eq!(
            top_left,
            [CellKey::new(QuadKey::parse("0").unwrap())].into_iter().collect()
        );

        let cell = CellKey::new(QuadKey::parse("3").unwrap());
        assert_eq!(cell.rect(&map), Rect::new(128.0, 128.0, 128.0, 128.0));
    }

    #[test]
    fn test_serde_as_plain_string() {
        let key = QuadKey::parse("031").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"031\"");
        assert!(serde_json::from_str::<QuadKey>("\"9\"").is_err());
    }
}
