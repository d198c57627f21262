use crate::ui::{theme, Icons};
use indicatif::HumanDuration;
use owo_colors::OwoColorize;
use std::time::Duration;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().header.clone()));
}

pub fn status(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, label.style(theme().dim.clone()), value);
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn timing(elapsed: &str) {
    println!("{} {}", Icons::CLOCK.style(theme().dim.clone()), elapsed);
}

/// Closing line of a build: elapsed time plus file, node and edge totals
pub fn finish_summary(duration: Duration, files: usize, nodes: usize, edges: usize) {
    println!();
    println!(
        "{} {}",
        Icons::CHECK.style(theme().success.clone()),
        format!("Complete in {}", HumanDuration(duration)).style(theme().success.clone())
    );
    println!(
        "  {} {}  {} {}  {} {}",
        Icons::FILE.style(theme().script.clone()),
        files,
        Icons::STATS.style(theme().info.clone()),
        nodes,
        Icons::LINK.style(theme().info.clone()),
        edges
    );
}
