use crate::domain::{CleanedRecord, RawTable, NO_MEDIA, REQUIRED_COLUMNS};
use crate::error::PipelineError;
use crate::ports::{Reporter, Result};
use crate::text;
use crate::utils::{parse_channel_id, parse_timestamp};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizerOptions {
    /// Squeeze whitespace runs in the final message to single spaces
    pub collapse_whitespace: bool,
}

/// Counts gathered over one normalization run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationSummary {
    pub rows_read: usize,
    pub duplicates_removed: usize,
    pub invalid_dates: usize,
    pub invalid_ids: usize,
    pub rows_written: usize,
}

/// Positions of the required columns within a loaded table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub channel_id: usize,
    pub channel_title: usize,
    pub channel_username: usize,
    pub date: usize,
    pub message: usize,
    pub image_path: usize,
}

/// Checks every required column is present
pub fn validate_columns(table: &RawTable) -> Result<ColumnMap> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| table.column_index(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::Schema { missing });
    }

    // Every lookup succeeded above
    let index = |name: &str| table.column_index(name).unwrap_or_default();
    Ok(ColumnMap {
        channel_id: index("Channel ID"),
        channel_title: index("Channel Title"),
        channel_username: index("Channel Username"),
        date: index("Date"),
        message: index("Message"),
        image_path: index("Image Path"),
    })
}

/// Identity of a row for deduplication: the numeric id when it parses, the raw cell otherwise
#[derive(Debug, PartialEq, Eq, Hash)]
enum DedupKey<'t> {
    Id(i64),
    Raw(Option<&'t str>),
}

/// Row indices that survive dropping repeated channel ids, first occurrence wins
pub fn deduplicate_rows(table: &RawTable, channel_id: usize) -> Vec<usize> {
    let mut seen = HashSet::new();
    (0..table.rows.len())
        .filter(|&row| {
            let cell = table.cell(row, channel_id);
            let key = match parse_channel_id(cell) {
                Some(id) => DedupKey::Id(id),
                None => DedupKey::Raw(cell),
            };
            seen.insert(key)
        })
        .collect()
}

/// Message text after the extraction pipeline, with its two side columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedMessage {
    pub message: String,
    pub emoji_used: String,
    pub youtube_links: String,
}

/// Runs emoji extraction, emoji removal, link extraction and link removal in that order
pub fn clean_message(raw: Option<&str>, options: NormalizerOptions) -> CleanedMessage {
    let message = raw.unwrap_or_default().trim();

    let emoji_used = text::extract_emojis(message);
    let without_emoji = text::remove_emojis(message);

    let youtube_links = text::extract_youtube_links(&without_emoji);
    let mut message = text::remove_youtube_links(&without_emoji);

    if options.collapse_whitespace {
        message = text::collapse_whitespace(&message);
    }

    CleanedMessage {
        message,
        emoji_used,
        youtube_links,
    }
}

/// Linear cleaning pipeline over a whole table
pub struct Normalizer<'a> {
    options: NormalizerOptions,
    reporter: &'a dyn Reporter,
}

impl<'a> Normalizer<'a> {
    pub fn new(options: NormalizerOptions, reporter: &'a dyn Reporter) -> Self {
        Self { options, reporter }
    }

    pub fn normalize(&self, table: &RawTable) -> Result<(Vec<CleanedRecord>, NormalizationSummary)> {
        let columns = match validate_columns(table) {
            Ok(columns) => columns,
            Err(e) => {
                self.reporter.error(&e.to_string());
                return Err(e);
            }
        };

        let mut summary = NormalizationSummary {
            rows_read: table.rows.len(),
            ..Default::default()
        };

        let kept = deduplicate_rows(table, columns.channel_id);
        summary.duplicates_removed = table.rows.len() - kept.len();
        self.reporter.info(&format!(
            "Duplicates removed from dataset ({} dropped).",
            summary.duplicates_removed
        ));

        let mut records = Vec::with_capacity(kept.len());
        for row in kept {
            let cell = |column: usize| table.cell(row, column);

            let message_date = parse_timestamp(cell(columns.date).unwrap_or_default());
            if message_date.is_none() {
                summary.invalid_dates += 1;
            }

            let message_id = match parse_channel_id(cell(columns.channel_id)) {
                Some(id) => id,
                None => {
                    summary.invalid_ids += 1;
                    0
                }
            };

            let cleaned = clean_message(cell(columns.message), self.options);

            records.push(CleanedRecord {
                channel_title: cell(columns.channel_title).unwrap_or_default().trim().to_string(),
                channel_username: cell(columns.channel_username)
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
                message_id,
                message_date,
                message: cleaned.message,
                media_path: cell(columns.image_path).unwrap_or(NO_MEDIA).trim().to_string(),
                emoji_used: cleaned.emoji_used,
                youtube_links: cleaned.youtube_links,
            });
        }

        self.reporter.info(&format!(
            "Date column formatted to datetime ({} unparseable).",
            summary.invalid_dates
        ));
        self.reporter.info("Text columns standardized.");
        self.reporter
            .info("Emojis extracted and stored in 'emoji_used' column.");
        self.reporter
            .info("YouTube links extracted and stored in 'youtube_links' column.");

        summary.rows_written = records.len();
        self.reporter.info("Data cleaning completed successfully.");
        Ok((records, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NO_EMOJI, NO_YOUTUBE_LINK, RAW_COLUMNS};
    use crate::reporter::MemoryReporter;
    use chrono::{TimeZone, Utc};

    fn raw_table(rows: &[[&str; 6]]) -> RawTable {
        let mut table = RawTable::new(RAW_COLUMNS.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.rows.push(
                row.iter()
                    .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                    .collect(),
            );
        }
        table
    }

    #[test]
    fn test_validate_columns_reports_all_missing() {
        let table = RawTable::new(vec!["Channel Title".to_string(), "Channel ID".to_string()]);
        match validate_columns(&table) {
            Err(PipelineError::Schema { missing }) => {
                assert_eq!(missing, vec!["Channel Username", "Date", "Message", "Image Path"]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_columns_accepts_any_order() {
        let mut columns: Vec<String> = RAW_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.reverse();
        columns.push("Extra".to_string());
        let map = validate_columns(&RawTable::new(columns)).unwrap();
        assert_eq!(map.channel_title, 5);
        assert_eq!(map.image_path, 0);
    }

    #[test]
    fn test_deduplicate_rows_first_wins() {
        let table = raw_table(&[
            ["A", "a", "1", "2024-01-01", "first", ""],
            ["B", "b", "2", "2024-01-01", "other", ""],
            ["A", "a", "1", "2024-01-02", "second", ""],
            ["C", "c", "", "2024-01-01", "no id", ""],
            ["D", "d", "", "2024-01-01", "no id again", ""],
        ]);
        assert_eq!(deduplicate_rows(&table, 2), vec![0, 1, 3]);
    }

    #[test]
    fn test_deduplicate_rows_compares_ids_numerically() {
        let table = raw_table(&[
            ["A", "a", "123", "2024-01-01", "first", ""],
            ["A", "a", "123.0", "2024-01-02", "float form", ""],
            ["A", "a", " 123", "2024-01-03", "padded", ""],
            ["B", "b", "abc", "2024-01-01", "text id", ""],
            ["B", "b", "abc", "2024-01-02", "same text id", ""],
        ]);
        assert_eq!(deduplicate_rows(&table, 2), vec![0, 3]);

        let reporter = MemoryReporter::new();
        let (records, summary) = Normalizer::new(NormalizerOptions::default(), &reporter)
            .normalize(&table)
            .unwrap();
        let ids: Vec<i64> = records.iter().map(|r| r.message_id).collect();
        assert_eq!(ids, vec![123, 0]);
        assert_eq!(summary.duplicates_removed, 3);
    }

    #[test]
    fn test_clean_message_emoji_then_link() {
        let cleaned = clean_message(
            Some("Check this 😀 https://youtu.be/abc123"),
            NormalizerOptions::default(),
        );
        assert_eq!(cleaned.message, "Check this");
        assert_eq!(cleaned.emoji_used, "😀");
        assert_eq!(cleaned.youtube_links, "https://youtu.be/abc123");
    }

    #[test]
    fn test_clean_message_plain_text() {
        let cleaned = clean_message(Some("  just words here \n"), NormalizerOptions::default());
        assert_eq!(cleaned.message, "just words here");
        assert_eq!(cleaned.emoji_used, NO_EMOJI);
        assert_eq!(cleaned.youtube_links, NO_YOUTUBE_LINK);
    }

    #[test]
    fn test_clean_message_absent_is_empty() {
        let cleaned = clean_message(None, NormalizerOptions::default());
        assert_eq!(cleaned.message, "");
        assert_eq!(cleaned.emoji_used, NO_EMOJI);
        assert_eq!(cleaned.youtube_links, NO_YOUTUBE_LINK);
    }

    #[test]
    fn test_clean_message_link_glued_to_emoji() {
        // The link is only separable once the emoji is gone
        let cleaned = clean_message(
            Some("New video https://youtu.be/abc🔥 today"),
            NormalizerOptions::default(),
        );
        assert_eq!(cleaned.emoji_used, "🔥");
        assert_eq!(cleaned.youtube_links, "https://youtu.be/abc");
        assert_eq!(cleaned.message, "New video  today");
    }

    #[test]
    fn test_clean_message_keeps_double_space_by_default() {
        let cleaned = clean_message(
            Some("Watch https://www.youtube.com/watch?v=1 and https://youtu.be/2 now"),
            NormalizerOptions::default(),
        );
        assert_eq!(cleaned.message, "Watch  and  now");
        assert_eq!(
            cleaned.youtube_links,
            "https://www.youtube.com/watch?v=1, https://youtu.be/2"
        );
    }

    #[test]
    fn test_clean_message_collapse_whitespace() {
        let options = NormalizerOptions {
            collapse_whitespace: true,
        };
        let cleaned = clean_message(Some("Watch https://youtu.be/2 now\n\nbye 👋"), options);
        assert_eq!(cleaned.message, "Watch now bye");
        assert_eq!(cleaned.emoji_used, "👋");
    }

    #[test]
    fn test_normalize_single_row() {
        let reporter = MemoryReporter::new();
        let table = raw_table(&[[
            "DoctorsET",
            "DoctorsET",
            "123",
            "2024-01-01",
            "Check this 😀 https://youtu.be/abc123",
            "img1.jpg",
        ]]);
        let (records, summary) = Normalizer::new(NormalizerOptions::default(), &reporter)
            .normalize(&table)
            .unwrap();

        assert_eq!(
            records,
            vec![CleanedRecord {
                channel_title: "DoctorsET".to_string(),
                channel_username: "DoctorsET".to_string(),
                message_id: 123,
                message_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                message: "Check this".to_string(),
                media_path: "img1.jpg".to_string(),
                emoji_used: "😀".to_string(),
                youtube_links: "https://youtu.be/abc123".to_string(),
            }]
        );
        assert_eq!(summary.rows_read, 1);
        assert_eq!(summary.rows_written, 1);
        assert!(reporter.errors().is_empty());
    }

    #[test]
    fn test_normalize_one_row_per_channel_id() {
        let reporter = MemoryReporter::new();
        let table = raw_table(&[
            ["Doctors", "DoctorsET", "10", "2024-01-03", "newest", ""],
            ["Doctors", "DoctorsET", "10", "2024-01-02", "older", ""],
            ["Lobelia", "lobelia4cosmetics", "20", "2024-01-03", "hello", ""],
            ["Doctors", "DoctorsET", "10", "2024-01-01", "oldest", ""],
        ]);
        let (records, summary) = Normalizer::new(NormalizerOptions::default(), &reporter)
            .normalize(&table)
            .unwrap();

        let ids: Vec<i64> = records.iter().map(|r| r.message_id).collect();
        assert_eq!(ids, vec![10, 20]);
        assert_eq!(records[0].message, "newest");
        assert_eq!(summary.duplicates_removed, 2);
    }

    #[test]
    fn test_normalize_degrades_bad_rows() {
        let reporter = MemoryReporter::new();
        let table = raw_table(&[
            ["  Title  ", " handle ", "abc", "yesterday-ish", "", ""],
            ["", "", "7.0", "", "hi", "  scraped_images/x_1.jpg "],
        ]);
        let (records, summary) = Normalizer::new(NormalizerOptions::default(), &reporter)
            .normalize(&table)
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].channel_title, "Title");
        assert_eq!(records[0].channel_username, "handle");
        assert_eq!(records[0].message_id, 0);
        assert_eq!(records[0].message_date, None);
        assert_eq!(records[0].message, "");
        assert_eq!(records[0].media_path, NO_MEDIA);
        assert_eq!(records[1].message_id, 7);
        assert_eq!(records[1].channel_title, "");
        assert_eq!(records[1].media_path, "scraped_images/x_1.jpg");
        assert_eq!(summary.invalid_ids, 1);
        assert_eq!(summary.invalid_dates, 2);
    }

    #[test]
    fn test_normalize_missing_column_fails_first() {
        let reporter = MemoryReporter::new();
        let table = RawTable {
            columns: vec![
                "Channel Title".to_string(),
                "Channel Username".to_string(),
                "Channel ID".to_string(),
                "Date".to_string(),
                "Image Path".to_string(),
            ],
            rows: vec![vec![Some("t".to_string()); 5]],
        };
        let result = Normalizer::new(NormalizerOptions::default(), &reporter).normalize(&table);

        match result {
            Err(PipelineError::Schema { missing }) => assert_eq!(missing, vec!["Message"]),
            other => panic!("expected schema error, got {:?}", other),
        }
        assert_eq!(reporter.errors(), vec!["Missing required columns: Message".to_string()]);
        assert_eq!(reporter.lines().len(), 1);
    }

    #[test]
    fn test_normalize_output_has_no_emoji_or_links() {
        let reporter = MemoryReporter::new();
        let table = raw_table(&[
            ["A", "a", "1", "2024-01-01", "🎉 Launch! http://youtube.com/live/abc 🚀🚀", ""],
            ["B", "b", "2", "2024-01-01", "ቀጠሮ ይያዙ ☎ 0911", ""],
        ]);
        let (records, _) = Normalizer::new(NormalizerOptions::default(), &reporter)
            .normalize(&table)
            .unwrap();

        for record in &records {
            assert!(!record.message.chars().any(text::is_emoji));
            assert!(!record.message.contains("youtu"));
        }
        assert_eq!(records[0].message, "Launch!");
        assert_eq!(records[0].emoji_used, "🎉🚀🚀");
        assert_eq!(records[1].message, "ቀጠሮ ይያዙ  0911");
        assert_eq!(records[1].emoji_used, "☎");
    }
}
