use csv::{ReaderBuilder, Writer, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::path::PathBuf;
use telescrape_core::domain::{CleanedRecord, RawRecord, RawTable, CLEANED_COLUMNS, RAW_COLUMNS};
use telescrape_core::error::PipelineError;
use telescrape_core::ports::{CleanedWriter, RawRecordSink, Result, TableSource};
use telescrape_core::utils::format_timestamp;

fn csv_error(err: csv::Error) -> PipelineError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => PipelineError::Io(e),
        _ => PipelineError::Table(message),
    }
}

/// Reads any CSV with a header row into a RawTable
/// Empty fields become absent cells; short rows are kept as-is.
pub struct CsvTableSource {
    path: PathBuf,
}

impl CsvTableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TableSource for CsvTableSource {
    fn load(&self) -> Result<RawTable> {
        let file = File::open(&self.path)?;
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);

        let columns = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();
        let mut table = RawTable::new(columns);

        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            table.rows.push(
                record
                    .iter()
                    .map(|field| (!field.is_empty()).then(|| field.to_string()))
                    .collect(),
            );
        }
        Ok(table)
    }
}

#[derive(Debug, Serialize)]
struct RawRow<'a> {
    #[serde(rename = "Channel Title")]
    channel_title: &'a str,
    #[serde(rename = "Channel Username")]
    channel_username: &'a str,
    #[serde(rename = "Channel ID")]
    channel_id: i64,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Message")]
    message: Option<&'a str>,
    #[serde(rename = "Image Path")]
    image_path: Option<String>,
}

/// Collector output. `begin` truncates the file and writes the header.
pub struct CsvRawRecordSink {
    path: PathBuf,
    writer: Option<Writer<File>>,
}

impl CsvRawRecordSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }
}

impl RawRecordSink for CsvRawRecordSink {
    fn begin(&mut self) -> Result<()> {
        let file = File::create(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(RAW_COLUMNS).map_err(csv_error)?;
        writer.flush()?;
        self.writer = Some(writer);
        Ok(())
    }

    fn append(&mut self, record: &RawRecord) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| PipelineError::Storage("raw record sink used before begin".to_string()))?;

        writer
            .serialize(RawRow {
                channel_title: &record.channel_title,
                channel_username: &record.channel_username,
                channel_id: record.channel_id,
                date: format_timestamp(&record.date),
                message: record.message.as_deref(),
                image_path: record
                    .image_path
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            })
            .map_err(csv_error)?;
        // One row per message reaches disk even if a later channel fails
        writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CleanedRow<'a> {
    channel_title: &'a str,
    channel_username: &'a str,
    message_id: i64,
    message_date: Option<String>,
    message: &'a str,
    media_path: &'a str,
    emoji_used: &'a str,
    youtube_links: &'a str,
}

impl<'a> From<&'a CleanedRecord> for CleanedRow<'a> {
    fn from(record: &'a CleanedRecord) -> Self {
        Self {
            channel_title: &record.channel_title,
            channel_username: &record.channel_username,
            message_id: record.message_id,
            message_date: record.message_date.as_ref().map(format_timestamp),
            message: &record.message,
            media_path: &record.media_path,
            emoji_used: &record.emoji_used,
            youtube_links: &record.youtube_links,
        }
    }
}

/// Writes the cleaned table, replacing the file
pub struct CsvCleanedWriter {
    path: PathBuf,
}

impl CsvCleanedWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CleanedWriter for CsvCleanedWriter {
    fn write(&self, records: &[CleanedRecord]) -> Result<()> {
        let file = File::create(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(CLEANED_COLUMNS).map_err(csv_error)?;
        for record in records {
            writer.serialize(CleanedRow::from(record)).map_err(csv_error)?;
        }
        writer.flush()?;
        Ok(())
    }
}
