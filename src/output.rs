//! # Output Configuration
//!
//! This module controls how the CLI prints change listings and task
//! summaries, including color and emoji support based on terminal
//! capabilities and user preferences.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use treegen::output::{OutputConfig, emoji};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! println!("{} Generating...", emoji(&config, "🛠️", "[GEN]"));
//! ```

use std::env;

use console::style;

use crate::phases::{InvocationReport, InvocationState};
use crate::tree::{ChangeKind, FileChange};

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone disables colors, even when empty
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, otherwise the plain text.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// One line of a change listing, e.g. `CREATE libs/my-plugin/package.json`.
pub fn format_change(config: &OutputConfig, change: &FileChange) -> String {
    let label = change.kind.label();
    if !config.use_color {
        return format!("{} {}", label, change.path);
    }

    let label = match change.kind {
        ChangeKind::Create => style(label).green(),
        ChangeKind::Update => style(label).yellow(),
        ChangeKind::Delete => style(label).red(),
    };
    format!("{} {}", label.force_styling(true), change.path)
}

/// Print the change listing and task summary of an invocation.
pub fn print_report(config: &OutputConfig, report: &InvocationReport) {
    for change in &report.changes {
        println!("{}", format_change(config, change));
    }

    if report.changes.is_empty() {
        println!("{} No changes", emoji(config, "✨", "[OK]"));
    }

    if report.state == InvocationState::TasksPending {
        println!(
            "\n{} Dry run: nothing was written",
            emoji(config, "🔍", "[DRY RUN]")
        );
    }

    for task in &report.tasks_run {
        println!("{} Ran task: {}", emoji(config, "✅", "[TASK]"), task);
    }
    for task in &report.tasks_skipped {
        println!("{} Skipped task: {}", emoji(config, "⏭️", "[SKIP]"), task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "🛠️", "[GEN]"), "🛠️");
        assert_eq!(emoji(&OutputConfig::without_color(), "🛠️", "[GEN]"), "[GEN]");
    }

    #[test]
    fn test_format_change_plain() {
        let change = FileChange {
            path: "libs/a/package.json".to_string(),
            kind: ChangeKind::Update,
        };
        assert_eq!(
            format_change(&OutputConfig::without_color(), &change),
            "UPDATE libs/a/package.json"
        );
    }

    #[test]
    fn test_format_change_colored() {
        let change = FileChange {
            path: "a.txt".to_string(),
            kind: ChangeKind::Create,
        };
        let line = format_change(&OutputConfig::with_color(), &change);
        assert!(line.contains("\u{1b}["));
        assert!(line.contains("CREATE"));
        assert!(line.ends_with(" a.txt"));
    }
}
