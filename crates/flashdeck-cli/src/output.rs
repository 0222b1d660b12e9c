//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Write as _;

use anyhow::anyhow;
use flashdeck_api_models::{Card, CardSet, Folder, Id};
use flashdeck_client::Landing;
use serde::Serialize;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_folders(folders: &[Folder], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(folders),
        OutputFormat::Table => {
            print!("{}", folder_table(folders));
            Ok(())
        }
    }
}

pub(crate) fn render_sets(sets: &[CardSet], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(sets),
        OutputFormat::Table => {
            print!("{}", set_table(sets));
            Ok(())
        }
    }
}

pub(crate) fn render_set_detail(
    set: &CardSet,
    cards: &[Card],
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({ "set": set, "cards": cards })),
        OutputFormat::Table => {
            println!("id: {}", set.id);
            println!("name: {}", set.name);
            if let Some(description) = set
                .description
                .as_deref()
                .filter(|text| !text.is_empty())
            {
                println!("description: {description}");
            }
            println!("folder: {}", set.folder_id);
            println!("visibility: {}", visibility(set.is_public));
            if !set.tags.is_empty() {
                println!("tags: {}", set.tags_text());
            }
            println!("created: {}", set.created_at.format("%Y-%m-%d %H:%M"));
            println!("cards:");
            print!("{}", card_table(cards));
            Ok(())
        }
    }
}

pub(crate) fn render_cards(cards: &[Card], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(cards),
        OutputFormat::Table => {
            print!("{}", card_table(cards));
            Ok(())
        }
    }
}

pub(crate) fn render_order(card_ids: &[Id], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({ "card_ids": card_ids })),
        OutputFormat::Table => {
            let order: Vec<String> = card_ids.iter().map(ToString::to_string).collect();
            println!("order: {}", order.join(" "));
            Ok(())
        }
    }
}

pub(crate) fn render_status(
    landing: Landing,
    api_url: &str,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "session": landing.as_str(),
            "api_url": api_url,
        })),
        OutputFormat::Table => {
            println!("session: {}", landing.as_str());
            println!("api: {api_url}");
            Ok(())
        }
    }
}

pub(crate) const fn visibility(is_public: bool) -> &'static str {
    if is_public { "public" } else { "private" }
}

pub(crate) fn folder_table(folders: &[Folder]) -> String {
    let mut out = format!("{:>6} {:<8} {:>5} NAME\n", "ID", "VIS", "SETS");
    for folder in folders {
        let _ = writeln!(
            out,
            "{:>6} {:<8} {:>5} {}",
            folder.id,
            visibility(folder.is_public),
            folder.set_count,
            folder.name
        );
    }
    out
}

pub(crate) fn set_table(sets: &[CardSet]) -> String {
    let mut out = format!("{:>6} {:<8} {:>5} {:<24} TAGS\n", "ID", "VIS", "CARDS", "NAME");
    for set in sets {
        let _ = writeln!(
            out,
            "{:>6} {:<8} {:>5} {:<24} {}",
            set.id,
            visibility(set.is_public),
            set.card_count,
            truncate(&set.name, 24),
            set.tags_text()
        );
    }
    out
}

pub(crate) fn card_table(cards: &[Card]) -> String {
    let mut out = format!("{:>5} {:>6} {:<28} DEFINITION\n", "ORDER", "ID", "TERM");
    for card in cards {
        let _ = writeln!(
            out,
            "{:>5} {:>6} {:<28} {}",
            card.order,
            card.id,
            truncate(&card.term, 28),
            card.definition
        );
    }
    out
}

/// Shorten `text` to `width` characters, marking the cut with `~`.
pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('~');
    short
}
