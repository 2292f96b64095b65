use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::source::{CharacterId, CharacterRecord};

pub const DEFAULT_PLACEHOLDER_IMAGE: &str =
    "https://via.placeholder.com/160x200/cfe2f3/351c75/?text=Disney";

/// Appended to the name of every favourite-surface card.
pub const FAVOURITE_MARKER: &str = "♥";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    Primary,
    Search,
    Favourites,
}

impl SurfaceKind {
    pub fn is_browse(self) -> bool {
        matches!(self, SurfaceKind::Primary | SurfaceKind::Search)
    }

    pub fn label(self) -> &'static str {
        match self {
            SurfaceKind::Primary => "characters",
            SurfaceKind::Search => "search results",
            SurfaceKind::Favourites => "favourites",
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardRole {
    Primary,
    Favourite,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Card {
    pub id: CharacterId,
    pub name: String,
    pub image_url: String,
    pub image_alt: String,
    pub role: CardRole,
    pub decorated: bool,
    /// Whether a click on the card itself toggles it.
    pub activatable: bool,
    /// Whether the card carries a close control.
    pub close_control: bool,
    #[serde(skip)]
    pub record: CharacterRecord,
}

impl Card {
    /// Name as displayed, with the marker for favourite cards.
    pub fn title(&self) -> String {
        match self.role {
            CardRole::Favourite => format!("{} {FAVOURITE_MARKER}", self.name),
            CardRole::Primary => self.name.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CardRenderer {
    placeholder_image: String,
}

impl Default for CardRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_IMAGE)
    }
}

impl CardRenderer {
    pub fn new(placeholder_image: impl Into<String>) -> Self {
        Self {
            placeholder_image: placeholder_image.into(),
        }
    }

    pub fn placeholder_image(&self) -> &str {
        &self.placeholder_image
    }

    pub fn create_card(&self, record: &CharacterRecord, role: CardRole) -> Card {
        let image_url = record
            .image()
            .unwrap_or(self.placeholder_image.as_str())
            .to_string();
        let favourite = role == CardRole::Favourite;
        Card {
            id: record.id,
            name: record.name.clone(),
            image_url,
            image_alt: format!("Picture of {}", record.name),
            role,
            decorated: favourite,
            activatable: !favourite,
            close_control: favourite,
            record: record.clone(),
        }
    }
}

/// An ordered list of cards with an identifier index. Cards are appended,
/// never reordered, and identifiers are unique within a surface.
#[derive(Clone, Debug)]
pub struct Surface {
    kind: SurfaceKind,
    cards: Vec<Card>,
    index: HashMap<CharacterId, usize>,
}

impl Surface {
    pub fn new(kind: SurfaceKind) -> Self {
        Self {
            kind,
            cards: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn find(&self, id: CharacterId) -> Option<&Card> {
        self.index.get(&id).map(|&pos| &self.cards[pos])
    }

    /// Appends `card`. Returns false and leaves the surface untouched when a
    /// card with the same identifier is already rendered.
    pub fn render(&mut self, card: Card) -> bool {
        if self.index.contains_key(&card.id) {
            return false;
        }
        self.index.insert(card.id, self.cards.len());
        self.cards.push(card);
        true
    }

    pub fn remove(&mut self, id: CharacterId) -> Option<Card> {
        let pos = self.index.remove(&id)?;
        let card = self.cards.remove(pos);
        for later in &self.cards[pos..] {
            if let Some(slot) = self.index.get_mut(&later.id) {
                *slot -= 1;
            }
        }
        Some(card)
    }

    /// Returns whether the decoration actually changed.
    pub fn set_decorated(&mut self, id: CharacterId, decorated: bool) -> bool {
        match self.index.get(&id) {
            Some(&pos) if self.cards[pos].decorated != decorated => {
                self.cards[pos].decorated = decorated;
                true
            }
            _ => false,
        }
    }

    pub fn clear_decorations(&mut self) {
        for card in self.cards.iter_mut() {
            card.decorated = false;
        }
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.index.clear();
    }
}
