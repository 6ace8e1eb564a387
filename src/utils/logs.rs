use console::{measure_text_width, Style};

use crate::item::FeedItem;
use crate::scoring::ComponentBreakdown;

pub const TREE_BRANCH: char = '\u{251C}';
pub const TREE_END: char = '\u{2514}';
pub const TREE_HORIZ: char = '\u{2500}';
pub const TREE_VERT: char = '\u{2502}';

const TREE_PREFIX_WIDTH: usize = 4;
const VALUE_COLUMN: usize = 25;

fn tree_branch() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_BRANCH, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

fn tree_end() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_END, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

fn tree_indent() -> String {
    dim().apply_to(format!("{}   ", TREE_VERT)).to_string()
}

pub fn dim() -> Style {
    Style::new().dim()
}

fn blue() -> Style {
    Style::new().blue()
}

fn magenta() -> Style {
    Style::new().magenta()
}

fn cyan() -> Style {
    Style::new().cyan()
}

fn green() -> Style {
    Style::new().green()
}

fn red() -> Style {
    Style::new().red()
}

fn yellow() -> Style {
    Style::new().yellow()
}

fn bold() -> Style {
    Style::new().bold()
}

fn init_prefix() -> String {
    blue().apply_to("[INIT]").to_string()
}

fn refresh_prefix() -> String {
    magenta().apply_to("[REFRESH]").to_string()
}

pub fn pad_label(label: &str, depth: usize) -> String {
    let prefix_width = depth * TREE_PREFIX_WIDTH;
    let target_width = VALUE_COLUMN.saturating_sub(prefix_width);
    let current_width = measure_text_width(label);
    if current_width < target_width {
        format!("{}{}", label, " ".repeat(target_width - current_width))
    } else {
        format!("{} ", label)
    }
}

pub fn log_init(database_url: &str, interval_secs: u64, workers: usize) {
    println!(
        "{} starting research-feed on {}...",
        init_prefix(),
        cyan().apply_to(database_url),
    );
    println!(
        "{} refreshing every {} with {} worker(s).",
        init_prefix(),
        cyan().apply_to(format!("{interval_secs}s")),
        bold().apply_to(workers),
    );
}

pub fn log_db_ready() {
    println!("{} database ready.", init_prefix());
}

pub fn log_db_error(error: &str) {
    println!(
        "{} {} {}",
        init_prefix(),
        red().apply_to("db error:"),
        dim().apply_to(error)
    );
}

pub fn log_refresh_start(entries: usize) {
    println!(
        "{} scoring {} entries...",
        refresh_prefix(),
        bold().apply_to(entries)
    );
}

pub fn log_refresh_entry_failed(entry_id: i64, error: &str) {
    println!(
        "{}entry {}: {}",
        tree_branch(),
        cyan().apply_to(entry_id),
        red().apply_to(error)
    );
}

pub fn log_refresh_done(updated: usize, skipped: usize, elapsed_ms: u128) {
    println!(
        "{} done in {}.",
        refresh_prefix(),
        dim().apply_to(format!("{elapsed_ms}ms"))
    );
    println!(
        "{}{} {}",
        tree_branch(),
        pad_label("updated", 1),
        green().apply_to(updated)
    );
    println!(
        "{}{} {}",
        tree_end(),
        pad_label("skipped", 1),
        if skipped > 0 { yellow() } else { dim() }.apply_to(skipped)
    );
}

pub fn log_refresh_error(error: &str) {
    println!(
        "{} {} {}",
        refresh_prefix(),
        red().apply_to("failed:"),
        dim().apply_to(error)
    );
}

fn format_component(raw: f64, component: f64) -> String {
    let style = if component > 0.0 { green() } else { dim() };
    format!(
        "{} {}",
        style.apply_to(format!("{component:>8.3}")),
        dim().apply_to(format!("(raw {raw:.2})"))
    )
}

/// Tree rendering of one breakdown, the debug view of a score. Used by the
/// inspection CLI for both actual and simulated runs.
pub fn print_breakdown(item: &FeedItem, breakdown: &ComponentBreakdown, heading: &str) {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!(
        "{} \"{}\"",
        magenta().apply_to(bold().apply_to(format!("[{heading}]"))),
        dim().apply_to(truncate_title(item.title()))
    ));

    lines.push(String::new());
    lines.push(format!("{}", bold().apply_to("SIGNALS")));
    lines.push(format!(
        "{}{} {}",
        tree_branch(),
        pad_label("upvotes", 1),
        format_component(breakdown.upvote.raw, breakdown.upvote.component)
    ));
    lines.push(format!(
        "{}{} {}",
        tree_branch(),
        pad_label("comments", 1),
        format_component(breakdown.comment.raw, breakdown.comment.component)
    ));
    lines.push(format!(
        "{}{} {}",
        tree_branch(),
        pad_label("tips", 1),
        format_component(breakdown.tip.raw, breakdown.tip.component)
    ));

    let bounty_label = if breakdown.bounty.urgent {
        format!("bounties {}", yellow().apply_to("(urgent)"))
    } else {
        "bounties".to_string()
    };
    lines.push(format!(
        "{}{} {}",
        tree_branch(),
        pad_label(&bounty_label, 1),
        format_component(breakdown.bounty.raw, breakdown.bounty.component)
    ));
    lines.push(format!(
        "{}{} {}",
        tree_branch(),
        pad_label("peer reviews", 1),
        format_component(breakdown.peer_review.raw, breakdown.peer_review.component)
    ));
    lines.push(format!(
        "{}{} {}",
        tree_end(),
        pad_label("altmetric", 1),
        format_component(breakdown.altmetric.raw, breakdown.altmetric.component)
    ));

    lines.push(String::new());
    lines.push(format!("{}", bold().apply_to("DECAY")));
    lines.push(format!(
        "{}{} {}",
        tree_branch(),
        pad_label("age", 1),
        cyan().apply_to(format!("{:.1}h", breakdown.age_hours))
    ));

    let fresh_style = if breakdown.freshness_multiplier > 1.0 {
        green()
    } else {
        dim()
    };
    lines.push(format!(
        "{}{} {}",
        tree_branch(),
        pad_label("freshness", 1),
        fresh_style.apply_to(format!("x{:.1}", breakdown.freshness_multiplier))
    ));
    lines.push(format!(
        "{}{} {}",
        tree_end(),
        pad_label("denominator", 1),
        dim().apply_to(format!("{:.3}", breakdown.time_denominator))
    ));

    lines.push(String::new());
    lines.push(format!("{}", bold().apply_to("RESULT")));
    lines.push(format!(
        "{}{} {}",
        tree_branch(),
        pad_label("engagement", 1),
        bold().apply_to(format!("{:.3}", breakdown.engagement_score))
    ));
    lines.push(format!(
        "{}{}{}{}",
        tree_indent(),
        tree_end(),
        pad_label("raw / 100x", 2),
        dim().apply_to(format!(
            "{:.5} / {:.2}",
            breakdown.raw_score(),
            breakdown.scaled_score()
        ))
    ));
    lines.push(format!(
        "{}{} {}",
        tree_end(),
        pad_label("hot score", 1),
        green().bold().apply_to(breakdown.final_score())
    ));

    println!("{}\n", lines.join("\n"));
}

pub fn log_stored_scores(item: &FeedItem) {
    println!(
        "{} {} {} {} {}",
        bold().apply_to(format!("entry {}", item.id)),
        dim().apply_to("stored"),
        cyan().apply_to(format!("v2:{}", item.hot_score_v2)),
        cyan().apply_to(format!("v1:{}", item.hot_score)),
        dim().apply_to(truncate_title(item.title()))
    );
}

pub fn log_score_comparison(actual: i64, simulated: i64) {
    let delta = simulated - actual;
    let delta_style = if delta > 0 {
        green()
    } else if delta < 0 {
        red()
    } else {
        dim()
    };
    println!(
        "{} {} {} {} ({})",
        bold().apply_to("actual"),
        cyan().apply_to(actual),
        bold().apply_to("simulated"),
        cyan().apply_to(simulated),
        delta_style.apply_to(format!("{delta:+}"))
    );
}

pub fn log_ranked_entry(rank: usize, item: &FeedItem) {
    println!(
        "{} {} {} {}",
        dim().apply_to(format!("{rank:>3}.")),
        bold().apply_to(format!("{:>8}", item.hot_score_v2)),
        dim().apply_to(format!("v1:{:>8}", item.hot_score)),
        truncate_title(item.title())
    );
}

pub fn log_generic_error(prefix: &str, error: &str) {
    eprintln!("{} {}", red().apply_to(prefix), error);
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > 60 {
        format!("{}...", title.chars().take(57).collect::<String>())
    } else {
        title.to_string()
    }
}
