use crate::generation::{BatchResult, GeneratedItem, GenerationObserver};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::fmt::Write;
use std::time::Duration;

/// RGB tuples for `colored`'s `.truecolor()`
pub mod rgb {
    pub const FORGE_ORANGE: (u8, u8, u8) = (255, 140, 66);
    pub const EMBER_RED: (u8, u8, u8) = (255, 84, 84);
    pub const STEEL_BLUE: (u8, u8, u8) = (120, 180, 255);
    pub const SUCCESS_GREEN: (u8, u8, u8) = (80, 250, 123);
    pub const DIM_WHITE: (u8, u8, u8) = (180, 180, 190);
}

static QUIET_MODE: std::sync::LazyLock<Mutex<bool>> =
    std::sync::LazyLock::new(|| Mutex::new(false));

/// Enable or disable quiet mode
pub fn set_quiet_mode(enabled: bool) {
    *QUIET_MODE.lock() = enabled;
}

pub fn is_quiet_mode() -> bool {
    *QUIET_MODE.lock()
}

fn spinner_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub fn create_spinner(message: &str) -> ProgressBar {
    if is_quiet_mode() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style("{spinner:.yellow.bold} {msg}"));
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn print_info(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.cyan().bold());
    }
}

pub fn print_warning(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.yellow().bold());
    }
}

pub fn print_error(message: &str) {
    // Errors print even in quiet mode
    eprintln!("{}", message.red().bold());
}

pub fn print_success(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.green().bold());
    }
}

pub fn print_version(version: &str) {
    if !is_quiet_mode() {
        println!(
            "{} {} {}",
            create_gradient_text("testforge"),
            "version".cyan(),
            version.green()
        );
    }
}

/// Print content between horizontal rules
pub fn print_bordered_content(content: &str) {
    if !is_quiet_mode() {
        let (r, g, b) = rgb::DIM_WHITE;
        println!("{}", "━".repeat(50).truecolor(r, g, b));
        println!("{content}");
        println!("{}", "━".repeat(50).truecolor(r, g, b));
    }
}

/// Orange to blue gradient used for the banner
pub fn create_gradient_text(text: &str) -> String {
    apply_gradient(
        text,
        &[rgb::FORGE_ORANGE, (240, 160, 140), rgb::STEEL_BLUE],
    )
}

fn apply_gradient(text: &str, gradient: &[(u8, u8, u8)]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::new();
    if chars.is_empty() || gradient.is_empty() {
        return result;
    }

    let last_char = chars.len() - 1;
    let last_stop = gradient.len() - 1;
    for (i, c) in chars.iter().enumerate() {
        let index = if last_char == 0 { 0 } else { i * last_stop / last_char };
        let (r, g, b) = gradient.get(index).copied().unwrap_or(rgb::DIM_WHITE);
        let _ = write!(result, "{}", c.to_string().truecolor(r, g, b));
    }
    result
}

/// One status line for a finished item
pub fn format_item_line(item: &GeneratedItem) -> String {
    if item.is_completed() {
        let (r, g, b) = rgb::SUCCESS_GREEN;
        format!(
            "{} {} {}",
            "✓".truecolor(r, g, b).bold(),
            item.file_name,
            format!("({:.1}s)", item.elapsed.as_secs_f64()).dimmed()
        )
    } else {
        let (r, g, b) = rgb::EMBER_RED;
        let kind = item
            .error_kind
            .map_or_else(String::new, |kind| format!("[{kind}] "));
        format!(
            "{} {} {}{}",
            "✗".truecolor(r, g, b).bold(),
            item.scenario,
            kind.yellow(),
            item.error
        )
    }
}

/// Totals line printed after a batch
pub fn format_batch_summary(batch: &BatchResult) -> String {
    let mut summary = format!(
        "{} generated, {} failed",
        batch.successful.to_string().green().bold(),
        batch.failed.to_string().red().bold()
    );
    if batch.cancelled {
        summary.push_str(&format!(" {}", "(cancelled)".yellow()));
    }
    summary
}

/// Spinner that follows a running batch
pub struct BatchProgress {
    bar: ProgressBar,
    total: usize,
    finished: Mutex<usize>,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        let bar = create_spinner(&format!("Generating 0/{total} tests..."));
        Self {
            bar,
            total,
            finished: Mutex::new(0),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl GenerationObserver for BatchProgress {
    fn on_started(&self, _index: usize, scenario: &str) {
        let done = *self.finished.lock();
        self.bar
            .set_message(format!("Generating {done}/{}: {scenario}", self.total));
    }

    fn on_finished(&self, item: &GeneratedItem) {
        let mut done = self.finished.lock();
        *done += 1;
        self.bar.println(format_item_line(item));
        self.bar
            .set_message(format!("Generating {}/{} tests...", *done, self.total));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;

    #[test]
    fn test_gradient_keeps_text() {
        colored::control::set_override(false);
        assert_eq!(create_gradient_text("forge"), "forge");
        assert_eq!(create_gradient_text(""), "");
    }

    #[test]
    fn test_pending_item_line_mentions_scenario() {
        colored::control::set_override(false);
        let item = GeneratedItem::pending(0, "Test login", Language::Python);
        assert!(format_item_line(&item).contains("Test login"));
    }
}
