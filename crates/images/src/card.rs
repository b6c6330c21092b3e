//! SVG layouts for the preview card and the error fallback.
//!
//! Both layouts are a single centered column on a fixed landscape canvas.
//! Text is wrapped on word boundaries using an estimated glyph advance, since
//! the final metrics are only known to the rasterizer.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use maud::{Markup, PreEscaped, html};

use crate::svg::BUNDLED_FONT_FAMILY;

pub const CANVAS_WIDTH: u32 = 1200;
pub const CANVAS_HEIGHT: u32 = 630;
pub const LOGO_SIZE: u32 = 200;

const CARD_PADDING: f32 = 40.0;
const CARD_GRADIENT: [&str; 3] = ["#1d4ed8", "#3730a3", "#4c0d2e"];
const TITLE_STYLE: TextStyle = TextStyle { size: 52.0, bold: true };
const TITLE_MARGIN: f32 = 16.0;
const DESCRIPTION_STYLE: TextStyle = TextStyle { size: 28.0, bold: false };
const DESCRIPTION_MARGIN: f32 = 1.0;

const ERROR_PADDING: f32 = 20.0;
pub const ERROR_BACKGROUND: [u8; 3] = [0x1a, 0x1a, 0x1a];
const ERROR_STYLE: TextStyle = TextStyle { size: 50.0, bold: true };

const TEXT_COLOR: &str = "#ffffff";
const LINE_HEIGHT: f32 = 1.2;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub bold: bool,
}

impl TextStyle {
    fn line_height(&self) -> f32 { self.size * LINE_HEIGHT }

    /// Average horizontal advance of a glyph, as a fraction of the font size.
    fn advance(&self) -> f32 { self.size * if self.bold { 0.6 } else { 0.55 } }

    fn weight(&self) -> u16 { if self.bold { 700 } else { 400 } }
}

/// Image embedded into the card, already validated.
#[derive(Debug)]
pub struct EmbeddedImage {
    pub mime: &'static str,
    pub data: Vec<u8>,
}

impl EmbeddedImage {
    fn data_uri(&self) -> String { format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.data)) }
}

pub struct Card<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub logo: Option<&'a EmbeddedImage>,
    pub font_family: &'a str,
}

enum Block<'a> {
    Image(&'a EmbeddedImage),
    Text { lines: Vec<String>, style: TextStyle, margin_top: f32 },
}

impl Block<'_> {
    fn height(&self) -> f32 {
        match self {
            Block::Image(_) => LOGO_SIZE as f32,
            Block::Text { lines, style, margin_top } => {
                margin_top + lines.len() as f32 * style.line_height()
            }
        }
    }
}

/// Break text into lines no wider than `max_width`, splitting on whitespace.
/// Words longer than a line are split at the character level.
pub fn wrap_text(text: &str, style: TextStyle, max_width: f32) -> Vec<String> {
    let max_chars = ((max_width / style.advance()).floor() as usize).max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_chars = 0;
        for word in paragraph.split_whitespace() {
            let mut word = word;
            let mut word_chars = word.chars().count();
            if line_chars > 0 && line_chars + 1 + word_chars <= max_chars {
                line.push(' ');
                line.push_str(word);
                line_chars += 1 + word_chars;
                continue;
            }
            if line_chars > 0 {
                lines.push(std::mem::take(&mut line));
            }
            while word_chars > max_chars {
                let (idx, _) = word.char_indices().nth(max_chars).unwrap_or((word.len(), ' '));
                lines.push(word[..idx].to_string());
                word = &word[idx..];
                word_chars -= max_chars;
            }
            line.push_str(word);
            line_chars = word_chars;
        }
        if line_chars > 0 {
            lines.push(line);
        }
    }
    lines
}

fn px(value: f32) -> String { format!("{:.1}", value) }

/// Configured family first, then the bundled font.
fn font_stack(family: &str) -> String {
    let family = family.trim();
    if family.is_empty() || family == BUNDLED_FONT_FAMILY {
        format!("'{BUNDLED_FONT_FAMILY}', sans-serif")
    } else {
        format!("'{family}', '{BUNDLED_FONT_FAMILY}', sans-serif")
    }
}

/// Lay out blocks in a vertically centered column and render them.
fn column(blocks: &[Block], padding: f32, font_family: &str) -> Markup {
    let inner_height = CANVAS_HEIGHT as f32 - padding * 2.0;
    let total: f32 = blocks.iter().map(Block::height).sum();
    let center_x = CANVAS_WIDTH as f32 / 2.0;
    let font_family = font_stack(font_family);
    let mut y = padding + (inner_height - total) / 2.0;
    let mut out = String::new();
    for block in blocks {
        let rendered = match block {
            Block::Image(image) => {
                let x = center_x - LOGO_SIZE as f32 / 2.0;
                let rendered = html! {
                    image x=(px(x)) y=(px(y)) width=(LOGO_SIZE) height=(LOGO_SIZE)
                        preserveAspectRatio="xMidYMid meet" href=(image.data_uri()) {}
                };
                y += LOGO_SIZE as f32;
                rendered
            }
            Block::Text { lines, style, margin_top } => {
                y += margin_top;
                let mut text = String::new();
                for line in lines {
                    // Center the cap height within the line box
                    let baseline = y + (style.line_height() + style.size * 0.7) / 2.0;
                    let rendered = html! {
                        text x=(px(center_x)) y=(px(baseline)) text-anchor="middle"
                            font-family=(&font_family) font-size=(style.size)
                            font-weight=(style.weight()) fill=(TEXT_COLOR) { (line) }
                    };
                    text.push_str(&rendered.0);
                    y += style.line_height();
                }
                PreEscaped(text)
            }
        };
        out.push_str(&rendered.0);
    }
    PreEscaped(out)
}

fn document(defs: Markup, background: &str, content: Markup) -> String {
    html! {
        (PreEscaped("<?xml version=\"1.0\" encoding=\"utf-8\"?>"))
        svg xmlns="http://www.w3.org/2000/svg" version="1.1"
            viewBox=(format!("0 0 {CANVAS_WIDTH} {CANVAS_HEIGHT}"))
            width=(CANVAS_WIDTH) height=(CANVAS_HEIGHT) {
            defs { (defs) }
            rect width=(CANVAS_WIDTH) height=(CANVAS_HEIGHT) fill=(background) {}
            (content)
        }
    }
    .into_string()
}

/// Render the preview card: gradient background, optional logo, title and description.
pub fn card_svg(card: &Card) -> String {
    let content_width = CANVAS_WIDTH as f32 - CARD_PADDING * 2.0;
    let mut blocks = Vec::with_capacity(3);
    if let Some(logo) = card.logo {
        blocks.push(Block::Image(logo));
    }
    blocks.push(Block::Text {
        lines: wrap_text(card.title, TITLE_STYLE, content_width),
        style: TITLE_STYLE,
        margin_top: TITLE_MARGIN,
    });
    blocks.push(Block::Text {
        lines: wrap_text(card.description, DESCRIPTION_STYLE, content_width),
        style: DESCRIPTION_STYLE,
        margin_top: DESCRIPTION_MARGIN,
    });
    // Bottom-left to top-right
    let defs = html! {
        linearGradient id="background" x1="0" y1="1" x2="1" y2="0" {
            @for (i, color) in CARD_GRADIENT.iter().enumerate() {
                stop offset=(format!("{}%", i * 100 / (CARD_GRADIENT.len() - 1))) stop-color=(color) {}
            }
        }
    };
    document(defs, "url(#background)", column(&blocks, CARD_PADDING, card.font_family))
}

/// Render the error fallback: "Error" and the message on a dark panel.
/// Only static layout and the given strings are involved.
pub fn error_svg(message: &str, font_family: &str) -> String {
    let content_width = CANVAS_WIDTH as f32 - ERROR_PADDING * 2.0;
    let blocks = [
        Block::Text {
            lines: wrap_text("Error", ERROR_STYLE, content_width),
            style: ERROR_STYLE,
            margin_top: 0.0,
        },
        Block::Text {
            lines: wrap_text(message, ERROR_STYLE, content_width),
            style: ERROR_STYLE,
            margin_top: 0.0,
        },
    ];
    let [r, g, b] = ERROR_BACKGROUND;
    let background = format!("#{r:02x}{g:02x}{b:02x}");
    document(Markup::default(), &background, column(&blocks, ERROR_PADDING, font_family))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logo() -> EmbeddedImage { EmbeddedImage { mime: "image/png", data: vec![1, 2, 3] } }

    #[test]
    fn test_wrap_text() {
        let style = TextStyle { size: 10.0, bold: false };
        // 5.5px per glyph -> 10 glyphs per 57px line
        assert_eq!(wrap_text("hello world", style, 57.0), vec!["hello", "world"]);
        assert_eq!(wrap_text("hi there", style, 57.0), vec!["hi there"]);
        assert_eq!(wrap_text("abcdefghijklmnopqrstuvwxy", style, 57.0), vec![
            "abcdefghij",
            "klmnopqrst",
            "uvwxy"
        ]);
        assert_eq!(wrap_text("  spaced   out  ", style, 200.0), vec!["spaced out"]);
        assert_eq!(wrap_text("one\ntwo", style, 200.0), vec!["one", "two"]);
        assert!(wrap_text("   ", style, 200.0).is_empty());
    }

    #[test]
    fn test_wrap_multibyte() {
        let style = TextStyle { size: 10.0, bold: false };
        assert_eq!(wrap_text("ééééééééééééé", style, 57.0), vec!["éééééééééé", "ééé"]);
    }

    #[test]
    fn test_card_without_logo() {
        let svg = card_svg(&Card {
            title: "Hello",
            description: "World",
            logo: None,
            font_family: "Noto Sans",
        });
        assert!(!svg.contains("<image"));
        assert!(svg.contains(">Hello</text>"));
        assert!(svg.contains(">World</text>"));
        assert!(svg.contains("font-size=\"52\""));
        assert!(svg.contains("font-size=\"28\""));
        assert!(svg.contains("stop-color=\"#1d4ed8\""));
        assert!(svg.contains("stop-color=\"#4c0d2e\""));
        assert!(svg.contains("width=\"1200\" height=\"630\""));
    }

    #[test]
    fn test_card_with_logo() {
        let logo = logo();
        let svg = card_svg(&Card {
            title: "Hello",
            description: "World",
            logo: Some(&logo),
            font_family: "Noto Sans",
        });
        assert_eq!(svg.matches("<image").count(), 1);
        assert!(svg.contains("href=\"data:image/png;base64,AQID\""));
        assert!(svg.contains("width=\"200\" height=\"200\""));
        assert!(svg.contains("preserveAspectRatio=\"xMidYMid meet\""));
    }

    #[test]
    fn test_card_escapes_text() {
        let svg = card_svg(&Card {
            title: "<script>&",
            description: "\"quoted\"",
            logo: None,
            font_family: "Noto Sans",
        });
        assert!(svg.contains("&lt;script&gt;&amp;"));
        assert!(!svg.contains("<script>"));
    }

    #[test]
    fn test_card_vertically_centered() {
        let svg = card_svg(&Card { title: "T", description: "D", logo: None, font_family: "x" });
        // 16 + 62.4 + 1 + 33.6 = 113px of content centered in 550px
        let top = 40.0 + (550.0 - 113.0) / 2.0;
        let title_baseline = top + 16.0 + (52.0 * 1.2 + 52.0 * 0.7) / 2.0;
        assert!(svg.contains(&format!("y=\"{:.1}\"", title_baseline)));
    }

    #[test]
    fn test_font_stack() {
        assert_eq!(font_stack("Noto Sans"), "'Noto Sans', 'DejaVu Sans', sans-serif");
        assert_eq!(font_stack("DejaVu Sans"), "'DejaVu Sans', sans-serif");
        assert_eq!(font_stack(""), "'DejaVu Sans', sans-serif");
        let svg = error_svg("x", "Noto Sans");
        assert!(svg.contains("'DejaVu Sans', sans-serif"));
    }

    #[test]
    fn test_error_svg() {
        let svg = error_svg("Failed to fetch image", "Noto Sans");
        assert!(svg.contains(">Error</text>"));
        assert!(svg.contains(">Failed to fetch image</text>"));
        assert!(svg.contains("fill=\"#1a1a1a\""));
        assert!(svg.contains("font-weight=\"700\""));
        assert!(!svg.contains("<image"));
    }
}
