use serde::{Deserialize, Serialize};

pub type CharacterId = i64;

/// A character as served by the catalog. Only `_id`, `name` and `imageUrl`
/// are interpreted; everything else is carried along untouched so a stored
/// favourite serializes back the way upstream sent it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(rename = "_id")]
    pub id: CharacterId,
    pub name: String,
    #[serde(
        rename = "imageUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CharacterRecord {
    pub fn new(id: CharacterId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            image_url: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Empty strings count as a missing image.
    pub fn image(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// The `data` member of a catalog response. The name filter answers with a
/// bare object when exactly one character matches and with an array
/// otherwise.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    Many(Vec<CharacterRecord>),
    One(Box<CharacterRecord>),
}

impl OneOrMany {
    pub(crate) fn into_vec(self) -> Vec<CharacterRecord> {
        match self {
            OneOrMany::Many(records) => records,
            OneOrMany::One(record) => vec![*record],
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Envelope {
    pub(crate) data: Option<OneOrMany>,
}

impl Envelope {
    pub(crate) fn into_records(self) -> Vec<CharacterRecord> {
        self.data.map(OneOrMany::into_vec).unwrap_or_default()
    }
}
