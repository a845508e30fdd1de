//! Rendering use case - turns reports and stats into chat-ready text

use time::macros::format_description;

use crate::model::{ChatStats, DailyReport};

/// Configuration for the renderer
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Maximum characters per outgoing message
    pub max_message_chars: usize,
    /// Signature line appended to reports
    pub footer: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_message_chars: 4000,
            footer: None,
        }
    }
}

/// Renderer for reports and statistics
pub struct ReportRenderer {
    config: RenderConfig,
}

impl ReportRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render the full report as one text
    pub fn render_report(&self, report: &DailyReport) -> String {
        let date = format_date(report);
        let mut lines = vec![
            "📊 Daily Movie Request Report".to_string(),
            format!("📅 Date: {}", date),
            String::new(),
        ];

        if report.is_empty() {
            lines.push(format!("❌ No movie requests found for {}!", date));
        } else {
            lines.push("🎬 Top Requested Titles:".to_string());
            lines.push(String::new());
            for (rank, entry) in report.ranked.iter().enumerate() {
                lines.push(format!(
                    "{}. {} ({} {})",
                    rank + 1,
                    entry.title,
                    entry.count,
                    if entry.count == 1 { "request" } else { "requests" }
                ));
            }
        }

        lines.push(String::new());
        lines.push("📈 Summary:".to_string());
        lines.push(format!("🔍 Request messages: {}", report.window_record_count));
        lines.push(format!(
            "🎬 Total title requests: {}",
            report.total_extracted_requests
        ));
        lines.push(format!("🏆 Unique titles: {}", report.unique_title_count));

        if let Some(footer) = self
            .config
            .footer
            .as_deref()
            .filter(|f| !f.trim().is_empty())
        {
            lines.push(String::new());
            lines.push(footer.to_string());
        }

        lines.join("\n")
    }

    /// Render the report split into messages of at most `max_message_chars`
    pub fn render_report_chunks(&self, report: &DailyReport) -> Vec<String> {
        split_on_lines(&self.render_report(report), self.config.max_message_chars)
    }

    /// Render the statistics summary
    pub fn render_stats(&self, stats: &ChatStats) -> String {
        let date = stats
            .at
            .format(format_description!("[day]-[month]-[year]"))
            .unwrap_or_default();
        let time = stats
            .at
            .format(format_description!("[hour]:[minute]:[second]"))
            .unwrap_or_default();

        [
            "📊 Bot Statistics".to_string(),
            String::new(),
            format!("🔍 Monitored chats: {}", stats.active_chats),
            format!("📨 Today's messages: {}", stats.messages_today),
            format!("🎬 Movie requests today: {}", stats.requests_today),
            format!("📅 Date: {}", date),
            format!("⏰ Time: {}", time),
        ]
        .join("\n")
    }
}

fn format_date(report: &DailyReport) -> String {
    report
        .window
        .start
        .format(format_description!("[day]-[month]-[year]"))
        .unwrap_or_else(|_| report.window.date().to_string())
}

/// Split text into pieces of at most `max_chars` characters, breaking
/// between lines where possible. Concatenating the pieces with '\n'
/// restores the original text when no single line exceeds the limit.
fn split_on_lines(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    // (text, length in chars) of the chunk being filled
    let mut current: Option<(String, usize)> = None;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if line_len > max_chars {
            if let Some((chunk, _)) = current.take() {
                chunks.push(chunk);
            }
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        current = match current.take() {
            Some((mut chunk, len)) if len + 1 + line_len <= max_chars => {
                chunk.push('\n');
                chunk.push_str(line);
                Some((chunk, len + 1 + line_len))
            }
            Some((chunk, _)) => {
                chunks.push(chunk);
                Some((line.to_string(), line_len))
            }
            None => Some((line.to_string(), line_len)),
        };
    }

    if let Some((chunk, _)) = current {
        chunks.push(chunk);
    }

    chunks
}
