use thiserror::Error;
use tracing::{debug, info, warn};

use crate::favourites::{AppState, SyncError, Synchronizer, Toggled};
use crate::render::{CardRenderer, SurfaceKind, DEFAULT_PLACEHOLDER_IMAGE};
use crate::search::{SearchController, SearchMode, SearchOutcome};
use crate::source::{CharacterId, CharacterSource, SourceError, DEFAULT_PAGE_SIZE};
use crate::store::{FavouritesStore, KeyValueStore};

#[derive(Clone, Debug)]
pub struct Options {
    pub page_size: u32,
    pub placeholder_image: String,
    pub search_mode: SearchMode,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            search_mode: SearchMode::Replace,
        }
    }
}

/// The two things a user can do to a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    /// Click on a card of the visible browse list.
    Activate(CharacterId),
    /// Click on the close control of a favourite card.
    Close(CharacterId),
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid page size {value}, expected positive integer")]
    InvalidPageSize { value: u32 },

    #[error("character {id} has no close control")]
    NotAFavourite { id: CharacterId },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartReport {
    pub restored: usize,
    pub rendered: usize,
    pub error: Option<String>,
}

/// One widget lifetime: constructed at startup, driven by gestures.
pub struct Session<C, S> {
    options: Options,
    source: C,
    sync: Synchronizer<S>,
    search: SearchController,
}

impl<C, S> Session<C, S>
where
    C: CharacterSource,
    S: KeyValueStore,
{
    pub fn new(options: Options, source: C, store: S) -> Result<Self, RunnerError> {
        if options.page_size == 0 {
            return Err(RunnerError::InvalidPageSize {
                value: options.page_size,
            });
        }
        let renderer = CardRenderer::new(options.placeholder_image.clone());
        let sync = Synchronizer::new(renderer, FavouritesStore::new(store));
        let search = SearchController::new(options.search_mode);
        Ok(Self {
            options,
            source,
            sync,
            search,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn state(&self) -> &AppState {
        self.sync.state()
    }

    pub fn synchronizer(&self) -> &Synchronizer<S> {
        &self.sync
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    /// Puts the persisted favourites on the favourite list. Nothing is
    /// fetched and nothing is written.
    pub fn restore(&mut self) -> Result<usize, RunnerError> {
        Ok(self.sync.load_persisted()?)
    }

    /// Restores persisted favourites, then fetches and renders the default
    /// page. A failed fetch leaves the primary list empty with an error
    /// indicator instead of failing the session.
    pub async fn start(&mut self) -> Result<StartReport, RunnerError> {
        let restored = self.restore()?;
        let (rendered, error) = match self.source.fetch_page(self.options.page_size).await {
            Ok(records) => {
                let rendered = self.sync.render_browse(SurfaceKind::Primary, &records)?;
                self.sync.clear_error();
                (rendered, None)
            }
            Err(e) => {
                let message = format!("could not load characters: {e}");
                warn!("{message}");
                self.sync.render_browse(SurfaceKind::Primary, &[])?;
                self.sync.set_error(message.clone());
                (0, Some(message))
            }
        };
        self.sync.show(SurfaceKind::Primary)?;
        info!(restored, rendered, "session started");
        Ok(StartReport {
            restored,
            rendered,
            error,
        })
    }

    pub fn dispatch(&mut self, gesture: Gesture) -> Result<Toggled, RunnerError> {
        match gesture {
            Gesture::Activate(id) => {
                let origin = self.sync.state().display().visible;
                Ok(self.sync.toggle(id, origin)?)
            }
            Gesture::Close(id) => {
                let has_close = self
                    .sync
                    .state()
                    .surface(SurfaceKind::Favourites)
                    .find(id)
                    .map(|card| card.close_control);
                match has_close {
                    Some(true) => Ok(self.sync.toggle(id, SurfaceKind::Favourites)?),
                    _ => Err(RunnerError::NotAFavourite { id }),
                }
            }
        }
    }

    /// Activates `id` on the visible list, fetching and appending the
    /// character first when it is not rendered there.
    pub async fn activate_by_id(&mut self, id: CharacterId) -> Result<Toggled, RunnerError> {
        let visible = self.sync.state().display().visible;
        if !self.sync.state().surface(visible).contains(id) {
            debug!(id, %visible, "character not rendered, fetching");
            let record = self.source.fetch_by_id(id).await?;
            self.sync.append_browse(visible, &record)?;
        }
        self.dispatch(Gesture::Activate(id))
    }

    pub async fn search(&mut self, text: &str) -> Result<SearchOutcome, RunnerError> {
        Ok(self.search.search(&self.source, &mut self.sync, text).await?)
    }

    pub fn show_all(&mut self) -> Result<(), RunnerError> {
        Ok(self.search.show_all(&mut self.sync)?)
    }

    pub fn reset(&mut self) -> Result<usize, RunnerError> {
        Ok(self.sync.reset()?)
    }
}
