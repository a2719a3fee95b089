//! Per-frame diff of visible cells into quad load/unload sets.
//!
//! [`update_grid`] is a pure transition from the previous frame's
//! [`ViewportGridState`] and the current visible cell set to the next state.
//! The state is the only owner of the quad reference counter; nothing else
//! can change a count, so a quad leaves the counter exactly when its count
//! drops from one to zero.

use crate::core::geo::GeoRectangle;
use crate::projections::MapProjection;
use crate::tiles::quad_key::{calculate_quad_keys, CellKey, QuadKey};
use fxhash::{FxHashMap, FxHashSet};

/// Reference counts of geographic quads needed by visible cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuadsRefCounter {
    counts: FxHashMap<QuadKey, usize>,
}

impl QuadsRefCounter {
    /// Returns true when the quad was not referenced before
    fn increment(&mut self, key: &QuadKey) -> bool {
        let count = self.counts.entry(key.clone()).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Returns true when this was the last reference.
    ///
    /// # Panics
    /// If `key` is not referenced at all; that means the diff went wrong.
    fn decrement(&mut self, key: &QuadKey) -> bool {
        let Some(count) = self.counts.get_mut(key) else {
            panic!("quad {key} is not referenced and cannot be released");
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(key);
            true
        } else {
            false
        }
    }

    pub fn get(&self, key: &QuadKey) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &QuadKey) -> bool {
        self.counts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &QuadKey> {
        self.counts.keys()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewportGridState {
    visible_cells: FxHashSet<CellKey>,
    cells_to_load: FxHashSet<CellKey>,
    cells_to_remove: FxHashSet<CellKey>,
    quads_to_load: FxHashSet<QuadKey>,
    quads_to_remove: FxHashSet<QuadKey>,
    counter: QuadsRefCounter,
    /// Quads each visible cell was mapped to when it appeared
    cell_quads: FxHashMap<CellKey, FxHashSet<QuadKey>>,
}

impl ViewportGridState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible_cells(&self) -> &FxHashSet<CellKey> {
        &self.visible_cells
    }

    pub fn cells_to_load(&self) -> &FxHashSet<CellKey> {
        &self.cells_to_load
    }

    pub fn cells_to_remove(&self) -> &FxHashSet<CellKey> {
        &self.cells_to_remove
    }

    pub fn quads_to_load(&self) -> &FxHashSet<QuadKey> {
        &self.quads_to_load
    }

    pub fn quads_to_remove(&self) -> &FxHashSet<QuadKey> {
        &self.quads_to_remove
    }

    pub fn ref_count(&self, key: &QuadKey) -> usize {
        self.counter.get(key)
    }

    pub fn contains_quad(&self, key: &QuadKey) -> bool {
        self.counter.contains(key)
    }

    pub fn quads(&self) -> &QuadsRefCounter {
        &self.counter
    }

    pub fn cell_quads(&self, cell: &CellKey) -> Option<&FxHashSet<QuadKey>> {
        self.cell_quads.get(cell)
    }
}

/// Geographic quads covered by a world cell at the cell's own zoom. Empty
/// when no part of the cell can be inverted through `projection`.
pub fn cell_to_quad_keys(projection: &MapProjection, cell: &CellKey) -> FxHashSet<QuadKey> {
    let rect = cell.rect(projection.map_rect());
    match projection.invert_rect(&rect) {
        Some(geo_rect) => calculate_quad_keys(&GeoRectangle::from_rect(&geo_rect), cell.zoom()),
        None => FxHashSet::default(),
    }
}

/// Next grid state for the cells visible this frame
pub fn update_grid(
    previous: ViewportGridState,
    visible: &FxHashSet<CellKey>,
    projection: &MapProjection,
) -> ViewportGridState {
    let mut state = previous;

    let cells_to_load: FxHashSet<CellKey> = visible.difference(&state.visible_cells).cloned().collect();
    let cells_to_remove: FxHashSet<CellKey> =
        state.visible_cells.difference(visible).cloned().collect();

    let mut loaded = Vec::with_capacity(cells_to_load.len());
    for cell in &cells_to_load {
        let quads = cell_to_quad_keys(projection, cell);
        state.cell_quads.insert(cell.clone(), quads.clone());
        loaded.push(quads);
    }
    let removed: Vec<FxHashSet<QuadKey>> = cells_to_remove
        .iter()
        .map(|cell| state.cell_quads.remove(cell).unwrap_or_default())
        .collect();

    sync_quads(&mut state, loaded, removed);

    if !cells_to_load.is_empty() || !cells_to_remove.is_empty() {
        log::debug!(
            "grid update: cells +{} -{}, quads +{} -{}, referenced {}",
            cells_to_load.len(),
            cells_to_remove.len(),
            state.quads_to_load.len(),
            state.quads_to_remove.len(),
            state.counter.len()
        );
    }

    state.visible_cells = visible.clone();
    state.cells_to_load = cells_to_load;
    state.cells_to_remove = cells_to_remove;
    state
}

/// Applies reference changes: increments for every quad of every loaded
/// set, then decrements for every removed set. Quads going from 0 to 1
/// land in `quads_to_load`, quads going from 1 to 0 in `quads_to_remove`.
///
/// # Panics
/// When a removed quad is not currently referenced.
pub fn sync_quads<L, R>(state: &mut ViewportGridState, load: L, remove: R)
where
    L: IntoIterator<Item = FxHashSet<QuadKey>>,
    R: IntoIterator<Item = FxHashSet<QuadKey>>,
{
    state.quads_to_load.clear();
    state.quads_to_remove.clear();

    for quads in load {
        for quad in quads {
            if state.counter.increment(&quad) {
                state.quads_to_load.insert(quad);
            }
        }
    }

    for quads in remove {
        for quad in quads {
            if state.counter.decrement(&quad) && !state.quads_to_load.remove(&quad) {
                state.quads_to_remove.insert(quad);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::WORLD_RECT;
    use crate::projections::ProjectionType;

    fn quad(key: &str) -> QuadKey {
        QuadKey::parse(key).unwrap()
    }

    fn set(keys: &[&str]) -> FxHashSet<QuadKey> {
        keys.iter().map(|k| quad(k)).collect()
    }

    fn cells(keys: &[&str]) -> FxHashSet<CellKey> {
        keys.iter().map(|k| CellKey::new(quad(k))).collect()
    }

    #[test]
    fn test_ref_counted_sync() {
        let mut state = ViewportGridState::new();
        sync_quads(&mut state, vec![set(&["0", "1"])], Vec::new());
        assert_eq!(state.ref_count(&quad("0")), 1);
        assert_eq!(state.ref_count(&quad("1")), 1);
        assert_eq!(state.quads_to_load(), &set(&["0", "1"]));

        // "0" goes from one to two references and is not loaded again
        sync_quads(&mut state, vec![set(&["0", "2"])], Vec::new());
        assert_eq!(state.ref_count(&quad("0")), 2);
        assert_eq!(state.ref_count(&quad("1")), 1);
        assert_eq!(state.ref_count(&quad("2")), 1);
        assert_eq!(state.quads_to_load(), &set(&["2"]));
        assert!(state.quads_to_remove().is_empty());

        sync_quads(&mut state, Vec::new(), vec![set(&["0", "1"])]);
        assert_eq!(state.ref_count(&quad("0")), 1);
        assert!(state.contains_quad(&quad("0")));
        assert!(!state.contains_quad(&quad("1")));
        assert_eq!(state.quads_to_remove(), &set(&["1"]));
        assert!(state.quads_to_load().is_empty());
    }

    #[test]
    #[should_panic(expected = "not referenced")]
    fn test_releasing_unknown_quad_panics() {
        let mut state = ViewportGridState::new();
        sync_quads(&mut state, Vec::new(), vec![set(&["3"])]);
    }

    #[test]
    fn test_update_grid_diffs_cells() {
        let projection = MapProjection::create(ProjectionType::Geographic, WORLD_RECT).unwrap();

        let first = update_grid(ViewportGridState::new(), &cells(&["00", "01"]), &projection);
        assert_eq!(first.cells_to_load(), &cells(&["00", "01"]));
        assert!(first.cells_to_remove().is_empty());
        assert!(!first.quads_to_load().is_empty());

        let second = update_grid(first.clone(), &cells(&["01", "10"]), &projection);
        assert_eq!(second.cells_to_load(), &cells(&["10"]));
        assert_eq!(second.cells_to_remove(), &cells(&["00"]));
        assert_eq!(second.visible_cells(), &cells(&["01", "10"]));
        for quad in second.quads_to_remove() {
            assert!(!second.contains_quad(quad));
        }

        let cleared = update_grid(second, &FxHashSet::default(), &projection);
        assert!(cleared.quads().is_empty());
    }

    #[test]
    fn test_update_grid_is_deterministic() {
        let projection = MapProjection::create(ProjectionType::Mercator, WORLD_RECT).unwrap();
        let start = update_grid(ViewportGridState::new(), &cells(&["00", "03"]), &projection);
        let next = cells(&["03", "12", "21"]);

        let a = update_grid(start.clone(), &next, &projection);
        let b = update_grid(start, &next, &projection);
        assert_eq!(a.quads_to_load(), b.quads_to_load());
        assert_eq!(a.quads_to_remove(), b.quads_to_remove());
    }

    #[test]
    fn test_letterbox_cell_maps_to_nothing() {
        let projection = MapProjection::create(ProjectionType::Geographic, WORLD_RECT).unwrap();
        // Zoom 3 row 0 lies entirely in the padding above the globe
        let cell = CellKey::new(crate::tiles::quad_key::xy_to_key(2, 0, 3));
        assert!(cell_to_quad_keys(&projection, &cell).is_empty());

        let inside = CellKey::new(crate::tiles::quad_key::xy_to_key(2, 3, 3));
        assert!(!cell_to_quad_keys(&projection, &inside).is_empty());
    }
}
