use owo_colors::OwoColorize;
use ranobe_core::Title;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Ranobe".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Web novel titles to structured documents\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print elapsed time of a step
pub fn print_timing(label: &str, duration: std::time::Duration) {
    eprintln!("  {} {:>8.2}s", format!("{}:", label).dimmed(), duration.as_secs_f64());
}

/// Print a parsed title summary
pub fn print_title_summary(title: &Title) {
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!(
        "  {} {}",
        "Title:".dimmed(),
        title.localized_name.as_deref().unwrap_or(&title.slug).bold().bright_white()
    );
    if let Some(status) = title.status {
        eprintln!("  {} {}", "Status:".dimmed(), format!("{:?}", status).bright_white());
    }
    eprintln!("  {} {}", "Chapters:".dimmed(), title.chapters_count().to_string().bright_white());
    let amended: usize = title.branches.iter().flat_map(|b| &b.chapters).filter(|c| c.is_amended()).count();
    eprintln!("  {} {}", "Amended:".dimmed(), amended.to_string().bright_white());
    eprintln!("{}", "═".repeat(60).dimmed());
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
