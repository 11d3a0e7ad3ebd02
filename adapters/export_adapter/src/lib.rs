//! `ChannelClient` backed by Telegram Desktop "Export chat history" JSON.
//!
//! Layout: `<root>/<handle>/result.json`, with photo paths in the export
//! relative to the channel directory.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use telescrape_core::domain::{ChannelInfo, ChannelMessage, Credentials, MediaKind};
use telescrape_core::error::PipelineError;
use telescrape_core::ports::{ChannelClient, Result};
use tracing::debug;

const EXPORT_FILE: &str = "result.json";

#[derive(Debug, Deserialize)]
struct ExportFile {
    name: String,
    id: i64,
    #[serde(default)]
    messages: Vec<ExportMessage>,
}

#[derive(Debug, Deserialize)]
struct ExportMessage {
    id: i64,
    date: String,
    date_unixtime: Option<String>,
    #[serde(default)]
    text: ExportText,
    photo: Option<String>,
    media_type: Option<String>,
    file: Option<String>,
}

/// Plain string, or a list of plain strings and formatted entities
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum ExportText {
    #[default]
    Empty,
    Plain(String),
    Parts(Vec<TextPart>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextPart {
    Plain(String),
    Entity { text: String },
}

impl ExportText {
    fn flatten(&self) -> Option<String> {
        let text = match self {
            ExportText::Empty => String::new(),
            ExportText::Plain(s) => s.clone(),
            ExportText::Parts(parts) => parts
                .iter()
                .map(|p| match p {
                    TextPart::Plain(s) => s.as_str(),
                    TextPart::Entity { text } => text.as_str(),
                })
                .collect(),
        };
        (!text.is_empty()).then_some(text)
    }
}

impl ExportMessage {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        if let Some(secs) = self.date_unixtime.as_deref().and_then(|s| s.parse::<i64>().ok()) {
            return DateTime::from_timestamp(secs, 0);
        }
        NaiveDateTime::parse_from_str(&self.date, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .map(|dt| dt.and_utc())
    }

    fn media(&self) -> Option<MediaKind> {
        if self.photo.is_some() {
            Some(MediaKind::Photo)
        } else if self.media_type.is_some() || self.file.is_some() {
            Some(MediaKind::Other)
        } else {
            None
        }
    }
}

/// Handles name a single directory under the export root
fn check_handle(handle: &str) -> Result<()> {
    let mut components = Path::new(handle).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !handle.contains(['/', '\\']) => Ok(()),
        _ => Err(PipelineError::source_error(handle, "invalid channel handle")),
    }
}

/// Reads channel exports from a directory, parsing each channel once per run
pub struct ExportChannelClient {
    root: PathBuf,
    connected: bool,
    exports: HashMap<String, ExportFile>,
}

impl ExportChannelClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            connected: false,
            exports: HashMap::new(),
        }
    }

    fn channel_dir(root: &Path, handle: &str) -> PathBuf {
        root.join(handle)
    }

    fn load_export(root: &Path, handle: &str) -> Result<ExportFile> {
        let path = Self::channel_dir(root, handle).join(EXPORT_FILE);
        let raw = fs::read_to_string(&path).map_err(|e| {
            PipelineError::source_error(handle, format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            PipelineError::source_error(handle, format!("invalid export {}: {}", path.display(), e))
        })
    }

    fn read_export(&mut self, handle: &str) -> Result<&ExportFile> {
        if !self.connected {
            return Err(PipelineError::source_error(handle, "client is not connected"));
        }
        check_handle(handle)?;
        match self.exports.entry(handle.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let export = Self::load_export(&self.root, handle)?;
                debug!(channel = handle, messages = export.messages.len(), "export loaded");
                Ok(entry.insert(export))
            }
        }
    }
}

impl ChannelClient for ExportChannelClient {
    fn connect(&mut self, credentials: Option<&Credentials>) -> Result<()> {
        if !self.root.is_dir() {
            return Err(PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("export directory {} not found", self.root.display()),
            )));
        }
        if credentials.is_some() {
            debug!("credentials supplied but not needed for exported channels");
        }
        self.connected = true;
        Ok(())
    }

    fn resolve_channel(&mut self, handle: &str) -> Result<ChannelInfo> {
        let export = self.read_export(handle)?;
        Ok(ChannelInfo {
            handle: handle.to_string(),
            id: export.id,
            title: export.name.clone(),
        })
    }

    fn fetch_messages(&mut self, channel: &ChannelInfo, limit: usize) -> Result<Vec<ChannelMessage>> {
        let export = self.read_export(&channel.handle)?;

        // Exports run oldest first; the API hands back the newest first
        let mut messages = Vec::new();
        for message in export.messages.iter().rev().take(limit) {
            let date = message.timestamp().ok_or_else(|| {
                PipelineError::source_error(
                    &channel.handle,
                    format!("message {} has an unreadable date {:?}", message.id, message.date),
                )
            })?;
            messages.push(ChannelMessage {
                id: message.id,
                date,
                text: message.text.flatten(),
                media: message.media(),
            });
        }
        Ok(messages)
    }

    fn download_photo(
        &mut self,
        channel: &ChannelInfo,
        message: &ChannelMessage,
        destination: &Path,
    ) -> Result<()> {
        let photo = self
            .read_export(&channel.handle)?
            .messages
            .iter()
            .find(|m| m.id == message.id)
            .and_then(|m| m.photo.clone())
            .ok_or_else(|| {
                PipelineError::source_error(
                    &channel.handle,
                    format!("message {} has no photo", message.id),
                )
            })?;

        let source = Self::channel_dir(&self.root, &channel.handle).join(photo);
        fs::copy(&source, destination).map_err(|e| {
            PipelineError::source_error(
                &channel.handle,
                format!("cannot copy {}: {}", source.display(), e),
            )
        })?;
        Ok(())
    }
}
