use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::render::{CardRenderer, CardRole, Surface, SurfaceKind};
use crate::source::{CharacterId, CharacterRecord};
use crate::store::{FavouritesStore, KeyValueStore, StoreError};

/// Favourite characters in the order they were added, unique by identifier.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FavouritesSet {
    records: Vec<CharacterRecord>,
    ids: HashSet<CharacterId>,
}

impl FavouritesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.ids.contains(&id)
    }

    pub fn records(&self) -> &[CharacterRecord] {
        &self.records
    }

    pub fn ids(&self) -> impl Iterator<Item = CharacterId> + '_ {
        self.records.iter().map(|r| r.id)
    }

    /// Appends `record` unless its identifier is already present.
    pub fn insert(&mut self, record: CharacterRecord) -> bool {
        if !self.ids.insert(record.id) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn remove(&mut self, id: CharacterId) -> Option<CharacterRecord> {
        if !self.ids.remove(&id) {
            return None;
        }
        let pos = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(pos))
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.ids.clear();
    }
}

impl FromIterator<CharacterRecord> for FavouritesSet {
    fn from_iter<I: IntoIterator<Item = CharacterRecord>>(iter: I) -> Self {
        let mut set = FavouritesSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    pub visible: SurfaceKind,
    pub error: Option<String>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            visible: SurfaceKind::Primary,
            error: None,
        }
    }
}

/// Everything the widget shows. Only [`Synchronizer`] mutates it.
#[derive(Clone, Debug)]
pub struct AppState {
    primary: Surface,
    search: Surface,
    favourites: Surface,
    set: FavouritesSet,
    display: DisplayState,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            primary: Surface::new(SurfaceKind::Primary),
            search: Surface::new(SurfaceKind::Search),
            favourites: Surface::new(SurfaceKind::Favourites),
            set: FavouritesSet::new(),
            display: DisplayState::default(),
        }
    }
}

impl AppState {
    pub fn surface(&self, kind: SurfaceKind) -> &Surface {
        match kind {
            SurfaceKind::Primary => &self.primary,
            SurfaceKind::Search => &self.search,
            SurfaceKind::Favourites => &self.favourites,
        }
    }

    fn surface_mut(&mut self, kind: SurfaceKind) -> &mut Surface {
        match kind {
            SurfaceKind::Primary => &mut self.primary,
            SurfaceKind::Search => &mut self.search,
            SurfaceKind::Favourites => &mut self.favourites,
        }
    }

    pub fn favourites(&self) -> &FavouritesSet {
        &self.set
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn visible(&self) -> &Surface {
        self.surface(self.display.visible)
    }

    fn set_browse_decoration(&mut self, id: CharacterId, decorated: bool) {
        self.primary.set_decorated(id, decorated);
        self.search.set_decorated(id, decorated);
    }

    /// Checks that the favourites set, the favourite surface and the browse
    /// decorations agree. Returns the first offending identifier.
    pub fn check_consistency(&self) -> Result<(), CharacterId> {
        for id in self.set.ids() {
            if !self.favourites.contains(id) {
                return Err(id);
            }
        }
        for card in self.favourites.cards() {
            if !self.set.contains(card.id) {
                return Err(card.id);
            }
        }
        for card in self.primary.cards().iter().chain(self.search.cards()) {
            if card.decorated != self.set.contains(card.id) {
                return Err(card.id);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("character {id} is not rendered on the {surface} list")]
    NotRendered { id: CharacterId, surface: SurfaceKind },

    #[error("{surface} is not a browse list")]
    NotBrowsable { surface: SurfaceKind },

    #[error("failed to persist favourites: {source}")]
    Persist {
        #[from]
        source: StoreError,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggled {
    /// Newly favourited and persisted.
    Added,
    /// Already a favourite; only the browse card was re-decorated.
    Redecorated,
    /// Unfavourited and persisted.
    Removed,
}

pub struct Synchronizer<S> {
    state: AppState,
    renderer: CardRenderer,
    store: FavouritesStore<S>,
}

impl<S: KeyValueStore> Synchronizer<S> {
    pub fn new(renderer: CardRenderer, store: FavouritesStore<S>) -> Self {
        Self {
            state: AppState::default(),
            renderer,
            store,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn renderer(&self) -> &CardRenderer {
        &self.renderer
    }

    pub fn store(&self) -> &FavouritesStore<S> {
        &self.store
    }

    /// Reads the persisted snapshot and restores it onto the favourite
    /// surface.
    pub fn load_persisted(&mut self) -> Result<usize, SyncError> {
        let set = self.store.load()?;
        let restored = self.restore_on_load(set.records().to_vec());
        Ok(restored)
    }

    /// Renders previously persisted favourites without writing them back.
    pub fn restore_on_load(&mut self, records: Vec<CharacterRecord>) -> usize {
        let mut restored = 0;
        for record in records {
            let id = record.id;
            let card = self.renderer.create_card(&record, CardRole::Favourite);
            if self.state.set.insert(record) {
                self.state.favourites.render(card);
                self.state.set_browse_decoration(id, true);
                restored += 1;
            }
        }
        debug!(restored, "restored favourites");
        restored
    }

    pub fn toggle(&mut self, id: CharacterId, origin: SurfaceKind) -> Result<Toggled, SyncError> {
        let decorated = match self.state.surface(origin).find(id) {
            Some(card) => card.decorated,
            None => return Err(SyncError::NotRendered { id, surface: origin }),
        };

        if origin.is_browse() && !decorated {
            if self.state.favourites.contains(id) || self.state.set.contains(id) {
                self.state.set_browse_decoration(id, true);
                debug!(id, "re-decorated existing favourite");
                return Ok(Toggled::Redecorated);
            }
            let Some(record) = self
                .state
                .surface(origin)
                .find(id)
                .map(|card| card.record.clone())
            else {
                return Err(SyncError::NotRendered { id, surface: origin });
            };
            let name = record.name.clone();
            self.state.set_browse_decoration(id, true);
            let card = self.renderer.create_card(&record, CardRole::Favourite);
            self.state.favourites.render(card);
            self.state.set.insert(record);
            self.store.save(&self.state.set)?;
            info!(id, name = %name, "added favourite");
            return Ok(Toggled::Added);
        }

        self.unfavourite(id)?;
        Ok(Toggled::Removed)
    }

    fn unfavourite(&mut self, id: CharacterId) -> Result<(), SyncError> {
        self.state.set_browse_decoration(id, false);
        self.state.favourites.remove(id);
        let removed = self.state.set.remove(id);
        self.store.save(&self.state.set)?;
        if let Some(record) = removed {
            info!(id, name = %record.name, "removed favourite");
        }
        Ok(())
    }

    /// Reapplies decoration to a freshly rendered browse card.
    pub fn decorate_if_favourite(&mut self, surface: SurfaceKind, id: CharacterId) -> bool {
        if !surface.is_browse() {
            return false;
        }
        let favourite = self.state.set.contains(id) || self.state.favourites.contains(id);
        if favourite {
            self.state.surface_mut(surface).set_decorated(id, true);
        }
        favourite
    }

    /// Replaces the contents of a browse surface and re-decorates
    /// favourites. Returns the number of cards rendered.
    pub fn render_browse(
        &mut self,
        surface: SurfaceKind,
        records: &[CharacterRecord],
    ) -> Result<usize, SyncError> {
        if !surface.is_browse() {
            return Err(SyncError::NotBrowsable { surface });
        }
        self.state.surface_mut(surface).clear();
        let mut rendered = 0;
        for record in records {
            let card = self.renderer.create_card(record, CardRole::Primary);
            if self.state.surface_mut(surface).render(card) {
                rendered += 1;
                self.decorate_if_favourite(surface, record.id);
            } else {
                debug!(id = record.id, %surface, "skipped duplicate card");
            }
        }
        Ok(rendered)
    }

    /// Appends a single record to a browse surface if it is not already
    /// there.
    pub fn append_browse(
        &mut self,
        surface: SurfaceKind,
        record: &CharacterRecord,
    ) -> Result<bool, SyncError> {
        if !surface.is_browse() {
            return Err(SyncError::NotBrowsable { surface });
        }
        let card = self.renderer.create_card(record, CardRole::Primary);
        let appended = self.state.surface_mut(surface).render(card);
        if appended {
            self.decorate_if_favourite(surface, record.id);
        }
        Ok(appended)
    }

    pub fn reset(&mut self) -> Result<usize, SyncError> {
        let cleared = self.state.set.len();
        self.state.set.clear();
        self.state.favourites.clear();
        self.state.primary.clear_decorations();
        self.state.search.clear_decorations();
        self.store.save(&self.state.set)?;
        info!(cleared, "reset favourites");
        Ok(cleared)
    }

    pub fn show(&mut self, surface: SurfaceKind) -> Result<(), SyncError> {
        if !surface.is_browse() {
            return Err(SyncError::NotBrowsable { surface });
        }
        self.state.display.visible = surface;
        Ok(())
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.state.display.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.state.display.error = None;
    }
}
