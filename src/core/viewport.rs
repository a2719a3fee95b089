use crate::core::geometry::{Client, Rect, Vec2, World};
use crate::core::viewport_helper::ViewportHelper;
use crate::tiles::quad_key::CellKey;
use fxhash::FxHashSet;

/// Current view of the map: world position at the screen centre, integer
/// zoom and client size in pixels.
///
/// `window`, the visible world rectangle, is derived state. Every setter
/// recomputes it before returning so it is never stale.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    helper: ViewportHelper,
    /// World point shown at the centre of the viewport, always normalised
    position: Vec2<World>,
    /// Current zoom level, within `[min_zoom, max_zoom]`
    zoom: u32,
    /// Size of the viewport in client pixels
    size: Vec2<Client>,
    min_zoom: u32,
    max_zoom: u32,
    window: Rect<World>,
}

impl Viewport {
    /// Starts at `min_zoom`, centred on the map
    pub fn new(helper: ViewportHelper, size: Vec2<Client>, min_zoom: u32, max_zoom: u32) -> Self {
        let (min_zoom, max_zoom) = (min_zoom.min(max_zoom), max_zoom.max(min_zoom));
        let mut viewport = Self {
            position: helper.map_rect().center(),
            helper,
            zoom: min_zoom,
            size,
            min_zoom,
            max_zoom,
            window: Rect::default(),
        };
        viewport.update_window();
        viewport
    }

    pub fn helper(&self) -> &ViewportHelper {
        &self.helper
    }

    pub fn position(&self) -> Vec2<World> {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2<World>) {
        self.position = self.helper.normalize(position);
        self.update_window();
    }

    /// Alias of [`Viewport::position`]
    pub fn center(&self) -> Vec2<World> {
        self.position
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: u32) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.update_window();
    }

    pub fn min_zoom(&self) -> u32 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> u32 {
        self.max_zoom
    }

    pub fn size(&self) -> Vec2<Client> {
        self.size
    }

    pub fn set_size(&mut self, size: Vec2<Client>) {
        self.size = size;
        self.update_window();
    }

    /// Visible world rectangle. May extend past the map on looping axes.
    pub fn window(&self) -> Rect<World> {
        self.window
    }

    /// Client pixels per world unit
    pub fn scale(&self) -> f64 {
        f64::from(1u32 << self.zoom.min(31))
    }

    pub fn to_client_dimension(&self, v: Vec2<World>) -> Vec2<Client> {
        (v * self.scale()).reinterpret()
    }

    pub fn to_world_dimension(&self, v: Vec2<Client>) -> Vec2<World> {
        (v / self.scale()).reinterpret()
    }

    /// World point under a client pixel, normalised into the map
    pub fn get_map_coord(&self, p: Vec2<Client>) -> Vec2<World> {
        let center: Vec2<Client> = self.size / 2.0;
        self.helper
            .normalize(self.position + self.to_world_dimension(p - center))
    }

    /// Client pixel of a world point, taking the nearest wraparound copy
    pub fn get_view_coord(&self, p: Vec2<World>) -> Vec2<Client> {
        let delta = Vec2::<World>::new(
            self.helper.distance_x(self.position.x, p.x),
            self.helper.distance_y(self.position.y, p.y),
        );
        self.size / 2.0 + self.to_client_dimension(delta)
    }

    pub fn visible_cells(&self) -> FxHashSet<CellKey> {
        self.helper.get_cells(&self.window, self.zoom)
    }

    /// Origins of every copy of the map visible in the window
    pub fn get_map_origins(&self) -> Vec<Vec2<World>> {
        self.helper.get_origins(self.helper.map_rect(), &self.window)
    }

    fn update_window(&mut self) {
        let dimension = self.to_world_dimension(self.size);
        self.window = Rect::from_origin_and_dimension(self.position - dimension / 2.0, dimension);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::WORLD_RECT;

    fn viewport() -> Viewport {
        Viewport::new(
            ViewportHelper::new(WORLD_RECT, true, false),
            Vec2::new(512.0, 256.0),
            1,
            6,
        )
    }

    #[test]
    fn test_initial_window() {
        let vp = viewport();
        assert_eq!(vp.zoom(), 1);
        assert_eq!(vp.position(), Vec2::new(128.0, 128.0));
        assert_eq!(vp.window(), Rect::new(0.0, 64.0, 256.0, 128.0));
    }

    #[test]
    fn test_zoom_is_clamped_and_updates_window() {
        let mut vp = viewport();
        vp.set_zoom(40);
        assert_eq!(vp.zoom(), 6);
        assert_eq!(vp.window().width(), 512.0 / 64.0);
        vp.set_zoom(0);
        assert_eq!(vp.zoom(), 1);
    }

    #[test]
    fn test_position_is_normalized() {
        let mut vp = viewport();
        vp.set_position(Vec2::new(-6.0, 400.0));
        assert_eq!(vp.position(), Vec2::new(250.0, 256.0));
        assert_eq!(vp.window().left(), 250.0 - 128.0);
    }

    #[test]
    fn test_coordinate_round_trip() {
        let mut vp = viewport();
        vp.set_zoom(2);
        let client = Vec2::<Client>::new(100.0, 50.0);
        let world = vp.get_map_coord(client);
        assert_eq!(world, Vec2::new(128.0 + (100.0 - 256.0) / 4.0, 128.0 + (50.0 - 128.0) / 4.0));
        assert_eq!(vp.get_view_coord(world), client);
    }

    #[test]
    fn test_view_coord_uses_nearest_copy() {
        let mut vp = viewport();
        vp.set_position(Vec2::new(250.0, 128.0));
        // x = 2 is 8 world units east of the centre across the seam
        let client = vp.get_view_coord(Vec2::new(2.0, 128.0));
        assert_eq!(client, Vec2::new(256.0 + 16.0, 128.0));
    }

    #[test]
    fn test_map_origins_and_cells() {
        let mut vp = viewport();
        vp.set_position(Vec2::new(10.0, 128.0));
        let origins = vp.get_map_origins();
        assert_eq!(origins, vec![Vec2::new(-256.0, 0.0), Vec2::new(0.0, 0.0)]);
        assert_eq!(vp.visible_cells().len(), 4);
    }

    #[test]
    fn test_dimensions() {
        let mut vp = viewport();
        vp.set_zoom(3);
        assert_eq!(vp.to_client_dimension(Vec2::new(1.0, 2.0)), Vec2::new(8.0, 16.0));
        assert_eq!(vp.to_world_dimension(Vec2::new(8.0, 16.0)), Vec2::new(1.0, 2.0));
    }
}
