use super::{DisplaySnapshot, SurfaceSnapshot};
use crate::render::{Card, CardRole};

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn render_card(card: &Card) -> String {
    let mut classes = vec!["characters__card"];
    if card.decorated {
        classes.push("favourite");
    }
    let name = match card.role {
        CardRole::Favourite => format!(
            "{} <span class=\"characters__card__marker\">{}</span>",
            escape_html(&card.name),
            crate::render::FAVOURITE_MARKER
        ),
        CardRole::Primary => escape_html(&card.name),
    };
    let close = if card.close_control {
        "<button class=\"characters__card__close\" title=\"Remove from favourites\">x</button>"
    } else {
        ""
    };
    format!(
        "      <li class=\"js__character__card\" data-id=\"{id}\" data-name=\"{data_name}\"><div class=\"{classes}\"><img class=\"characters__card__img\" src=\"{src}\" alt=\"{alt}\"><h3 class=\"characters__card__name\">{name}</h3>{close}</div></li>\n",
        id = card.id,
        data_name = escape_html(&card.name),
        classes = classes.join(" "),
        src = escape_html(&card.image_url),
        alt = escape_html(&card.image_alt),
    )
}

fn render_list(title: &str, list_class: &str, surface: &SurfaceSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "  <section>\n    <h2>{} ({})</h2>\n    <ul class=\"{list_class}\">\n",
        escape_html(title),
        surface.cards.len()
    ));
    for card in &surface.cards {
        out.push_str(&render_card(card));
    }
    out.push_str("    </ul>\n  </section>\n");
    out
}

pub fn render_html(snapshot: &DisplaySnapshot) -> Vec<u8> {
    let error = snapshot
        .display
        .error
        .as_deref()
        .map(|e| format!("  <p class=\"error\">{}</p>\n", escape_html(e)))
        .unwrap_or_default();

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Disney characters</title>
  <style>
    body {{ font-family: sans-serif; margin: 2rem; }}
    ul {{ list-style: none; display: flex; flex-wrap: wrap; gap: 1rem; padding: 0; }}
    .characters__card {{ width: 160px; border: 1px solid #cfe2f3; padding: .5rem; }}
    .characters__card__img {{ width: 160px; height: 200px; object-fit: cover; }}
    .favourite {{ background: #351c75; color: #fff; }}
    .error {{ color: #b00020; }}
  </style>
</head>
<body>
{error}{favourites}{visible}</body>
</html>
"#,
        error = error,
        favourites = render_list(
            snapshot.favourites.surface.label(),
            "js_list_favourites",
            &snapshot.favourites
        ),
        visible = snapshot
            .visible
            .as_ref()
            .map(|visible| render_list(visible.surface.label(), "js_list_all", visible))
            .unwrap_or_default(),
    );
    html.into_bytes()
}
