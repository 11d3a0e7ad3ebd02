use crate::domain::{ChannelInfo, Credentials, RawRecord};
use crate::normalizer::{NormalizationSummary, Normalizer, NormalizerOptions};
use crate::ports::{ChannelClient, CleanedWriter, RawRecordSink, Reporter, Result, TableSource};
use crate::utils::sanitize_filename;
use std::fs;
use std::path::PathBuf;

/// Application service for cleaning the intermediate table
pub struct NormalizationService<'a> {
    table_source: Box<dyn TableSource>,
    writers: Vec<Box<dyn CleanedWriter>>,
    options: NormalizerOptions,
    reporter: &'a dyn Reporter,
}

impl<'a> NormalizationService<'a> {
    /// Creates a new NormalizationService; every writer receives the full cleaned table
    pub fn new(
        table_source: Box<dyn TableSource>,
        writers: Vec<Box<dyn CleanedWriter>>,
        options: NormalizerOptions,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            table_source,
            writers,
            options,
            reporter,
        }
    }

    /// Load, clean, persist. Nothing is written unless cleaning succeeds.
    pub fn execute(&self) -> Result<NormalizationSummary> {
        let table = self.table_source.load().map_err(|e| {
            self.reporter.error(&format!("Error loading CSV file: {}", e));
            e
        })?;
        self.reporter
            .info(&format!("Loaded {} rows.", table.rows.len()));

        let (records, summary) = Normalizer::new(self.options, self.reporter)
            .normalize(&table)
            .map_err(|e| {
                self.reporter.error(&format!("Data cleaning error: {}", e));
                e
            })?;

        for writer in &self.writers {
            writer.write(&records).map_err(|e| {
                self.reporter.error(&format!("Error saving cleaned data: {}", e));
                e
            })?;
        }
        self.reporter.info(&format!(
            "Cleaned data saved: {} rows written, {} duplicates dropped.",
            summary.rows_written, summary.duplicates_removed
        ));
        Ok(summary)
    }
}

/// Settings for one collection run
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub credentials: Option<Credentials>,
    pub channels: Vec<String>,
    pub limit: usize,
    pub media_dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    pub channels_ok: usize,
    pub channels_failed: usize,
    pub messages: usize,
    pub photos: usize,
}

/// Sequential scrape over the configured channels
pub struct CollectionService<'a> {
    client: Box<dyn ChannelClient>,
    sink: Box<dyn RawRecordSink>,
    settings: CollectorSettings,
    reporter: &'a dyn Reporter,
}

impl<'a> CollectionService<'a> {
    pub fn new(
        client: Box<dyn ChannelClient>,
        sink: Box<dyn RawRecordSink>,
        settings: CollectorSettings,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            client,
            sink,
            settings,
            reporter,
        }
    }

    /// Connection and output failures abort; a failing channel is logged and skipped
    pub fn execute(&mut self) -> Result<CollectionSummary> {
        fs::create_dir_all(&self.settings.media_dir)?;
        self.sink.begin()?;
        self.client.connect(self.settings.credentials.as_ref())?;

        let mut summary = CollectionSummary::default();
        let channels = self.settings.channels.clone();
        for handle in &channels {
            let (records, photos) = match self.collect_channel(handle) {
                Ok(collected) => collected,
                Err(e) => {
                    summary.channels_failed += 1;
                    self.reporter
                        .error(&format!("Error fetching {}: {}", handle, e));
                    continue;
                }
            };

            // Sink failures end the run, unlike channel failures
            for record in &records {
                self.sink.append(record).map_err(|e| {
                    self.reporter
                        .error(&format!("Error writing messages from {}: {}", handle, e));
                    e
                })?;
            }
            summary.channels_ok += 1;
            summary.messages += records.len();
            summary.photos += photos;
            self.reporter.info(&format!(
                "Collected {} messages from {}.",
                records.len(),
                handle
            ));
        }

        self.reporter.info(&format!(
            "Messages and images have been saved ({} channels ok, {} failed).",
            summary.channels_ok, summary.channels_failed
        ));
        Ok(summary)
    }

    /// Resolves, fetches and downloads one channel; returns its rows and photo count
    fn collect_channel(&mut self, handle: &str) -> Result<(Vec<RawRecord>, usize)> {
        let channel = self.client.resolve_channel(handle)?;
        let messages = self.client.fetch_messages(&channel, self.settings.limit)?;

        let mut records = Vec::with_capacity(messages.len());
        let mut photos = 0;
        for message in &messages {
            let mut image_path = None;
            if message.has_photo() {
                let path = self.photo_path(&channel, message.id);
                self.client.download_photo(&channel, message, &path)?;
                photos += 1;
                image_path = Some(path);
            }

            records.push(RawRecord {
                channel_title: channel.title.clone(),
                channel_username: handle.to_string(),
                channel_id: channel.id,
                date: message.date,
                message: message.text.clone(),
                image_path,
            });
        }
        Ok((records, photos))
    }

    fn photo_path(&self, channel: &ChannelInfo, message_id: i64) -> PathBuf {
        self.settings
            .media_dir
            .join(format!("{}_{}.jpg", sanitize_filename(&channel.handle), message_id))
    }
}
