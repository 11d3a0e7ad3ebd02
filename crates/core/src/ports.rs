use crate::domain::{ChannelInfo, ChannelMessage, CleanedRecord, Credentials, RawRecord, RawTable};
use crate::error::PipelineError;
use std::path::Path;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Loads the intermediate table written by the collector
pub trait TableSource {
    fn load(&self) -> Result<RawTable>;
}

/// Trait for persisting the cleaned table
/// Implementations overwrite whatever the destination held before
pub trait CleanedWriter {
    fn write(&self, records: &[CleanedRecord]) -> Result<()>;
}

/// Append-only destination for scraped messages
pub trait RawRecordSink {
    // Truncates the destination and writes the header
    fn begin(&mut self) -> Result<()>;
    fn append(&mut self, record: &RawRecord) -> Result<()>;
}

/// The external messaging API, consumed as a black box
pub trait ChannelClient {
    fn connect(&mut self, credentials: Option<&Credentials>) -> Result<()>;
    fn resolve_channel(&mut self, handle: &str) -> Result<ChannelInfo>;
    /// Most recent messages first, at most `limit`
    fn fetch_messages(&mut self, channel: &ChannelInfo, limit: usize) -> Result<Vec<ChannelMessage>>;
    fn download_photo(
        &mut self,
        channel: &ChannelInfo,
        message: &ChannelMessage,
        destination: &Path,
    ) -> Result<()>;
}

/// Leveled, human-readable progress messages
pub trait Reporter {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}
