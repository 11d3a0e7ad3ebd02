use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

/// Columns the collector writes, in file order
pub const RAW_COLUMNS: [&str; 6] = [
    "Channel Title",
    "Channel Username",
    "Channel ID",
    "Date",
    "Message",
    "Image Path",
];

/// Columns the normalizer requires, in the order they are reported when missing
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Channel ID",
    "Channel Title",
    "Channel Username",
    "Date",
    "Message",
    "Image Path",
];

/// Destination schema, in file order
pub const CLEANED_COLUMNS: [&str; 8] = [
    "channel_title",
    "channel_username",
    "message_id",
    "message_date",
    "message",
    "media_path",
    "emoji_used",
    "youtube_links",
];

pub const NO_EMOJI: &str = "No emoji";
pub const NO_YOUTUBE_LINK: &str = "No YouTube link";
pub const NO_MEDIA: &str = "No Media";

/// One scraped message as appended by the collector
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub channel_title: String,
    pub channel_username: String,
    pub channel_id: i64,
    pub date: DateTime<Utc>,
    pub message: Option<String>,
    pub image_path: Option<PathBuf>,
}

/// A loaded intermediate table. Cells are `None` where the file held an empty field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell lookup that tolerates short rows
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRecord {
    pub channel_title: String,
    pub channel_username: String,
    // Carries the channel id; the destination schema names it message_id.
    pub message_id: i64,
    pub message_date: Option<DateTime<Utc>>,
    pub message: String,
    pub media_path: String,
    pub emoji_used: String,
    pub youtube_links: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub handle: String,
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMessage {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub text: Option<String>,
    pub media: Option<MediaKind>,
}

impl ChannelMessage {
    pub fn has_photo(&self) -> bool {
        self.media == Some(MediaKind::Photo)
    }
}

/// Login material for the messaging API
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_id: String,
    pub api_hash: String,
    pub phone: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .field("phone", &self.phone)
            .finish()
    }
}
