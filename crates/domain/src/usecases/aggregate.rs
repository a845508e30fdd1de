//! Aggregation of a day's movie requests into a ranked report

use std::collections::HashMap;

use crate::model::{DailyReport, DayWindow, MessageRecord, RankedTitle, RecordFilter};

/// Number of titles in a report unless configured otherwise
pub const DEFAULT_TOP_N: usize = 10;

/// Request counts per normalized title, remembering first-seen order
#[derive(Debug, Clone, Default)]
pub struct TitleTally {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl TitleTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `title`. Returns false if it normalizes to
    /// nothing and was not counted.
    pub fn record(&mut self, title: &str) -> bool {
        let normalized = normalize_title(title);
        if normalized.is_empty() {
            return false;
        }

        match self.index.get(&normalized) {
            Some(&position) => self.entries[position].1 += 1,
            None => {
                self.index.insert(normalized.clone(), self.entries.len());
                self.entries.push((normalized, 1));
            }
        }
        true
    }

    pub fn get(&self, title: &str) -> Option<u64> {
        self.index
            .get(&normalize_title(title))
            .map(|&position| self.entries[position].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Titles by count descending. The sort is stable, so equal counts keep
    /// first-seen order.
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .entries
            .iter()
            .map(|(title, count)| (title.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

/// Build the report for `window` from classified records.
///
/// Records that are not movie requests or fall outside the window are
/// ignored, so the result only depends on the window's requests and the
/// order they are given in.
pub fn build_report(window: DayWindow, records: &[MessageRecord], top_n: usize) -> DailyReport {
    let filter = RecordFilter::requests_in(window);
    let mut tally = TitleTally::new();
    let mut window_record_count = 0u64;
    let mut total_extracted_requests = 0u64;

    for record in records.iter().filter(|r| filter.matches(r)) {
        window_record_count += 1;
        for title in &record.extracted_titles {
            if tally.record(title) {
                total_extracted_requests += 1;
            }
        }
    }

    if window_record_count == 0 {
        return DailyReport::empty(window);
    }

    let ranked = tally
        .ranked()
        .into_iter()
        .take(top_n)
        .map(|(title, count)| RankedTitle {
            title: title_case(title),
            count,
        })
        .collect();

    tracing::debug!(
        date = %window.date(),
        records = window_record_count,
        unique_titles = tally.len(),
        "Built daily report"
    );

    DailyReport {
        window,
        ranked,
        window_record_count,
        total_extracted_requests,
        unique_title_count: tally.len() as u64,
    }
}

/// Lowercase and trim, the key titles are counted under
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Uppercase the first letter of every run of letters, lowercase the rest
/// ("spider-man" -> "Spider-Man", "3 idiots" -> "3 Idiots")
pub fn title_case(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut previous_is_letter = false;

    for c in title.chars() {
        if previous_is_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_is_letter = c.is_alphabetic();
    }

    out
}
