//! Log formatting and output with ANSI colors
//!
//! Handles:
//! - Colorized console output with tag and level formatting
//! - Text wrapping at word boundaries
//! - Broken pipe handling for piped commands

use super::config::get_logger_config;
use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stdout, ErrorKind, Write};

const TAG_WIDTH: usize = 10;
const LOG_TYPE_WIDTH: usize = 8;

/// Maximum line length before wrapping
const MAX_LINE_LENGTH: usize = 145;

pub fn format_and_log(tag: LogTag, level: LogLevel, message: &str) {
    let time = Local::now().format("%H:%M:%S").to_string();
    let colored_output = get_logger_config().colored;

    let prefix_plain = format!(
        "{} [{:<tag_w$}] [{:<lvl_w$}] ",
        time,
        tag.to_plain_string(),
        level.as_str(),
        tag_w = TAG_WIDTH,
        lvl_w = LOG_TYPE_WIDTH
    );
    let available = MAX_LINE_LENGTH.saturating_sub(prefix_plain.len()).max(50);
    let chunks = wrap_text(message, available);

    let prefix = if colored_output {
        format!(
            "{} [{}] [{}] ",
            time.dimmed(),
            format_tag(&tag),
            format_level(level)
        )
    } else {
        prefix_plain.clone()
    };

    print_stdout_safe(&format!("{}{}", prefix, chunks[0]));

    if chunks.len() > 1 {
        let continuation = " ".repeat(prefix_plain.len());
        for chunk in &chunks[1..] {
            print_stdout_safe(&format!("{}{}", continuation, chunk));
        }
    }
}

fn format_tag(tag: &LogTag) -> ColoredString {
    let label = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::Store => label.bright_blue().bold(),
        LogTag::ViewModel => label.bright_cyan().bold(),
        LogTag::Poisoning => label.bright_red().bold(),
        LogTag::Database => label.bright_magenta().bold(),
        LogTag::Config => label.bright_yellow().bold(),
        LogTag::System => label.bright_green().bold(),
        LogTag::Test => label.bright_white().bold(),
        LogTag::Other(_) => label.white().bold(),
    }
}

fn format_level(level: LogLevel) -> ColoredString {
    let label = format!("{:<width$}", level.as_str(), width = LOG_TYPE_WIDTH);
    match level {
        LogLevel::Error => label.bright_red().bold(),
        LogLevel::Warning => label.yellow().bold(),
        LogLevel::Info => label.white().bold(),
        LogLevel::Debug => label.purple(),
        LogLevel::Verbose => label.dimmed(),
    }
}

/// Print to stdout but ignore broken pipe errors
fn print_stdout_safe(message: &str) {
    let mut out = stdout().lock();
    if let Err(e) = writeln!(out, "{}", message) {
        if e.kind() == ErrorKind::BrokenPipe {
            return;
        }
        let _ = writeln!(std::io::stderr(), "Logger stdout error: {}", e);
    }
    let _ = out.flush();
}

/// Wrap text at word boundaries, respecting existing newlines
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for line in text.split('\n') {
        if line.chars().count() <= max_width {
            result.push(line.to_string());
            continue;
        }

        let mut current = String::new();
        for word in line.split(' ') {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max_width && !current.is_empty() {
                result.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            result.push(current);
        }
    }

    if result.is_empty() {
        result.push(String::new());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_short_line_untouched() {
        assert_eq!(wrap_text("hello world", 50), vec!["hello world".to_string()]);
    }

    #[test]
    fn test_wrap_long_line_at_words() {
        let chunks = wrap_text("aaaa bbbb cccc dddd", 9);
        assert_eq!(chunks, vec!["aaaa bbbb", "cccc dddd"]);
    }

    #[test]
    fn test_wrap_keeps_newlines() {
        let chunks = wrap_text("first\nsecond", 50);
        assert_eq!(chunks.len(), 2);
    }
}
