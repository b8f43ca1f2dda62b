//! Locally stored sticker history.
//!
//! The browser keeps the history as one JSON array under [`HISTORY_KEY`];
//! this module owns the list semantics and the JSON shape, the binding
//! crate does the actual storage access.

use thiserror::Error;

/// Storage key of the history array.
pub const HISTORY_KEY: &str = "sticker_maker_history_v2";

/// Errors from history (de)serialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Failed to serialize history: {0}")]
    Serialize(String),

    #[error("Failed to parse history: {0}")]
    Parse(String),
}

/// One generated sticker.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerRecord {
    /// Unique within a history; the creation time in millis as a string
    pub id: String,
    /// `data:image/png;base64,` URI of the sticker
    #[serde(rename = "imageUrl")]
    pub image_data_uri: String,
    pub style_id: u32,
    /// Creation time, milliseconds since the Unix epoch
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image_id: Option<String>,
}

impl StickerRecord {
    /// File name offered when downloading this record.
    pub fn download_filename(&self) -> String {
        format!("sticker-{}.png", self.id)
    }
}

/// File name offered when downloading a fresh generation result.
pub fn result_filename(style_id: u32, timestamp_millis: u64) -> String {
    format!("sticker-pro-{style_id}-{timestamp_millis}.png")
}

/// Newest-first list of generated stickers.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StickerHistory {
    records: Vec<StickerRecord>,
}

impl StickerHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new sticker at the front of the list.
    ///
    /// The id is the timestamp, bumped by one millisecond until it is unused.
    pub fn add(
        &mut self,
        image_data_uri: String,
        style_id: u32,
        timestamp_millis: u64,
    ) -> &StickerRecord {
        let mut id = timestamp_millis;
        while self.contains(&id.to_string()) {
            id += 1;
        }

        self.records.insert(
            0,
            StickerRecord {
                id: id.to_string(),
                image_data_uri,
                style_id,
                timestamp: timestamp_millis,
                source_image_id: None,
            },
        );
        log::debug!("history now holds {} stickers", self.records.len());
        &self.records[0]
    }

    /// Remove the record with `id`. Returns whether one was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        self.records.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&StickerRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn records(&self) -> &[StickerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json(&self) -> Result<String, HistoryError> {
        serde_json::to_string(self).map_err(|e| HistoryError::Serialize(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, HistoryError> {
        serde_json::from_str(json).map_err(|e| HistoryError::Parse(e.to_string()))
    }

    /// Restore a stored history, starting empty when nothing is stored or
    /// the stored value cannot be parsed.
    pub fn load_or_empty(stored: Option<&str>) -> Self {
        let Some(json) = stored else {
            return Self::new();
        };
        Self::from_json(json).unwrap_or_else(|e| {
            log::warn!("{e}; starting with an empty history");
            Self::new()
        })
    }
}
