pub mod report;

use colored::Colorize;
use serde::Serialize;

use crate::favourites::{AppState, DisplayState};
use crate::render::{Card, SurfaceKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct SurfaceSnapshot {
    pub surface: SurfaceKind,
    pub cards: Vec<Card>,
}

/// What the user currently sees: the visible browse list and the favourites.
/// `visible` is `None` for a favourites-only view.
#[derive(Clone, Debug, Serialize)]
pub struct DisplaySnapshot {
    pub display: DisplayState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<SurfaceSnapshot>,
    pub favourites: SurfaceSnapshot,
}

impl DisplaySnapshot {
    pub fn capture(state: &AppState) -> Self {
        let visible = state.visible();
        let favourites = state.surface(SurfaceKind::Favourites);
        Self {
            display: state.display().clone(),
            visible: Some(SurfaceSnapshot {
                surface: visible.kind(),
                cards: visible.cards().to_vec(),
            }),
            favourites: SurfaceSnapshot {
                surface: favourites.kind(),
                cards: favourites.cards().to_vec(),
            },
        }
    }

    /// Same snapshot with the browse list left out.
    pub fn favourites_only(state: &AppState) -> Self {
        Self {
            visible: None,
            ..Self::capture(state)
        }
    }
}

fn format_card_line(card: &Card, verbose: bool) -> String {
    let id = format!("[{}]", card.id);
    let mut line = format!("  {:>8} ", id.dimmed());
    if card.decorated {
        line.push_str(&card.title().bold().magenta().to_string());
        if card.role == crate::render::CardRole::Primary {
            line.push(' ');
            line.push_str(&crate::render::FAVOURITE_MARKER.magenta().to_string());
        }
    } else {
        line.push_str(&card.title());
    }
    if card.close_control {
        line.push(' ');
        line.push_str(&"[x]".red().to_string());
    }
    if verbose {
        line.push_str(&format!("  {}", card.image_url.dimmed()));
    }
    line
}

fn format_section(title: &str, cards: &[Card], verbose: bool, out: &mut String) {
    out.push_str(&format!(
        ":: {} ({})\n",
        title.bold().white(),
        cards.len()
    ));
    if cards.is_empty() {
        out.push_str(&format!("  {}\n", "(empty)".dimmed()));
    }
    for card in cards {
        out.push_str(&format_card_line(card, verbose));
        out.push('\n');
    }
}

pub fn render_text(snapshot: &DisplaySnapshot, verbose: bool) -> Vec<u8> {
    let mut out = String::new();
    if let Some(error) = snapshot.display.error.as_deref() {
        out.push_str(&format!(
            "{}{}{} {}\n",
            "[".bold().white(),
            "ERR".bold().red(),
            "]".bold().white(),
            error
        ));
    }
    if let Some(visible) = &snapshot.visible {
        format_section(visible.surface.label(), &visible.cards, verbose, &mut out);
        out.push('\n');
    }
    format_section(
        snapshot.favourites.surface.label(),
        &snapshot.favourites.cards,
        verbose,
        &mut out,
    );
    out.into_bytes()
}

pub fn render_json(snapshot: &DisplaySnapshot) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = serde_json::to_vec_pretty(snapshot)?;
    out.push(b'\n');
    Ok(out)
}

pub fn render_html(snapshot: &DisplaySnapshot) -> Vec<u8> {
    report::render_html(snapshot)
}

pub fn render(
    snapshot: &DisplaySnapshot,
    format: OutputFormat,
    verbose: bool,
) -> Result<Vec<u8>, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(snapshot, verbose)),
        OutputFormat::Json => render_json(snapshot),
        OutputFormat::Html => Ok(render_html(snapshot)),
    }
}
