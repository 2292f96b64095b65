use std::fmt;

use tracing::{debug, warn};

use crate::favourites::{SyncError, Synchronizer};
use crate::render::SurfaceKind;
use crate::source::CharacterSource;
use crate::store::KeyValueStore;

/// Where search results go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Results replace the primary list in place.
    #[default]
    Replace,
    /// Results go to their own list, which becomes the visible one.
    Swap,
}

impl SearchMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "replace" | "inplace" | "in-place" => Some(Self::Replace),
            "swap" | "separate" => Some(Self::Swap),
            _ => None,
        }
    }

    pub fn target(self) -> SurfaceKind {
        match self {
            SearchMode::Replace => SurfaceKind::Primary,
            SearchMode::Swap => SurfaceKind::Search,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Replace => f.write_str("replace"),
            SearchMode::Swap => f.write_str("swap"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Rendered { count: usize, surface: SurfaceKind },
    /// The lookup failed; the target list is shown empty with an error.
    Failed { message: String },
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SearchController {
    mode: SearchMode,
}

impl SearchController {
    pub fn new(mode: SearchMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub async fn search<C, S>(
        &self,
        source: &C,
        sync: &mut Synchronizer<S>,
        text: &str,
    ) -> Result<SearchOutcome, SyncError>
    where
        C: CharacterSource,
        S: KeyValueStore,
    {
        let surface = self.mode.target();
        debug!(text, %surface, "searching by name");
        match source.search_by_name(text).await {
            Ok(records) => {
                let count = sync.render_browse(surface, &records)?;
                sync.show(surface)?;
                sync.clear_error();
                Ok(SearchOutcome::Rendered { count, surface })
            }
            Err(e) => {
                let message = format!("search for '{text}' failed: {e}");
                warn!("{message}");
                sync.render_browse(surface, &[])?;
                sync.show(surface)?;
                sync.set_error(message.clone());
                Ok(SearchOutcome::Failed { message })
            }
        }
    }

    /// Makes the primary list visible again after a search.
    pub fn show_all<S: KeyValueStore>(&self, sync: &mut Synchronizer<S>) -> Result<(), SyncError> {
        sync.show(SurfaceKind::Primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mode_names() {
        assert_eq!(SearchMode::parse("Replace"), Some(SearchMode::Replace));
        assert_eq!(SearchMode::parse(" swap "), Some(SearchMode::Swap));
        assert_eq!(SearchMode::parse("sideways"), None);
    }

    #[test]
    fn mode_picks_target_surface() {
        assert_eq!(SearchMode::Replace.target(), SurfaceKind::Primary);
        assert_eq!(SearchMode::Swap.target(), SurfaceKind::Search);
    }
}
