//! Document layout for the terminal host.
//!
//! Pure functions: a page is laid out as a column of rows in document
//! coordinates, then rendered to styled lines. Space for text is reserved
//! from the full segment text so nothing reflows while it types.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::page::{Page, PageScript};
use crate::types::Rect;

/// Drawn after the last revealed character of a typing segment.
pub const TYPING_CURSOR: char = '▌';

const ITEM_BULLET: &str = "• ";

// =============================================================================
// Wrapping
// =============================================================================

enum Token {
    Word(usize, usize),
    Break(usize),
}

fn tokens(text: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push(Token::Word(s, i));
            }
            if c == '\n' {
                out.push(Token::Break(i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push(Token::Word(s, text.len()));
    }
    out
}

/// Greedy word wrap into byte ranges of `text`, each at most `width` columns.
///
/// Whitespace at line breaks is dropped; words wider than a line are split
/// at grapheme boundaries. Ranges are ascending so a prefix of `text` maps to
/// a prefix of the lines.
pub fn wrap_ranges(text: &str, width: usize) -> Vec<Range<usize>> {
    let width = width.max(1);
    let mut ranges = Vec::new();
    let mut current: Option<(usize, usize, usize)> = None;

    for token in tokens(text) {
        match token {
            Token::Break(at) => match current.take() {
                Some((s, e, _)) => ranges.push(s..e),
                None => ranges.push(at..at),
            },
            Token::Word(s, e) => {
                if let Some((ls, _, _)) = current {
                    let joined = text[ls..e].width();
                    if joined <= width {
                        current = Some((ls, e, joined));
                        continue;
                    }
                }
                if let Some((ls, le, _)) = current.take() {
                    ranges.push(ls..le);
                }

                let word_width = text[s..e].width();
                if word_width <= width {
                    current = Some((s, e, word_width));
                    continue;
                }

                let mut chunk_start = s;
                let mut cols = 0;
                for (offset, g) in text[s..e].grapheme_indices(true) {
                    let gw = g.width();
                    if cols > 0 && cols + gw > width {
                        ranges.push(chunk_start..s + offset);
                        chunk_start = s + offset;
                        cols = 0;
                    }
                    cols += gw;
                }
                current = Some((chunk_start, e, cols));
            }
        }
    }

    if let Some((s, e, _)) = current {
        ranges.push(s..e);
    }
    ranges
}

/// Word wrap `text` to `width` columns.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    wrap_ranges(text, width)
        .into_iter()
        .map(|r| text[r].to_string())
        .collect()
}

/// Wrap `full` and show only its first `shown_bytes` bytes.
///
/// Always returns one entry per wrapped line of `full`; lines not reached yet
/// are empty.
pub fn wrap_prefix(full: &str, shown_bytes: usize, width: usize) -> Vec<String> {
    wrap_ranges(full, width)
        .into_iter()
        .map(|r| {
            if shown_bytes <= r.start {
                String::new()
            } else {
                full[r.start..r.end.min(shown_bytes)].to_string()
            }
        })
        .collect()
}

fn line_count(text: &str, width: usize) -> usize {
    wrap_ranges(text, width).len().max(1)
}

// =============================================================================
// Layout
// =============================================================================

/// Rows of every page part, in document coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub width: u16,
    /// Row of the first text segment
    pub hero: Rect,
    /// First row of each segment
    pub segment_rows: Vec<u16>,
    pub items: Vec<Rect>,
    pub actions_row: u16,
    pub height: u16,
}

impl PageLayout {
    pub fn compute(script: &PageScript, width: u16) -> Self {
        let cols = usize::from(width.max(1));
        let mut row: usize = 0;

        row += line_count(&script.title, cols) + 1;
        if let Some(description) = &script.description {
            row += line_count(description, cols) + 1;
        }

        let hero_start = row;
        let mut segment_rows = Vec::with_capacity(script.segments.len());
        for segment in script.segment_list() {
            segment_rows.push(to_row(row));
            row += line_count(&segment.text, cols) + 1;
        }
        let hero = Rect::new(0.0, hero_start as f32, f32::from(width), (row - hero_start) as f32);

        let item_cols = cols.saturating_sub(ITEM_BULLET.width()).max(1);
        let mut items = Vec::with_capacity(script.items.len());
        for item in &script.items {
            let start = row;
            row += line_count(&item.title, item_cols);
            if let Some(body) = &item.body {
                row += line_count(body, item_cols);
            }
            items.push(Rect::new(0.0, start as f32, f32::from(width), (row - start) as f32));
            row += 1;
        }

        let actions_row = to_row(row);
        row += script.actions.len();

        Self {
            width,
            hero,
            segment_rows,
            items,
            actions_row,
            height: to_row(row),
        }
    }
}

fn to_row(row: usize) -> u16 {
    u16::try_from(row).unwrap_or(u16::MAX)
}

// =============================================================================
// Rendering
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Blank,
    Title,
    Description,
    Text,
    ItemTitle,
    ItemBody,
    Action { actionable: bool, selected: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledLine {
    pub text: String,
    pub style: LineStyle,
}

impl StyledLine {
    fn blank() -> Self {
        Self {
            text: String::new(),
            style: LineStyle::Blank,
        }
    }

    fn new(text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Render the whole document, one line per row of `layout`.
pub fn render_document(page: &Page, layout: &PageLayout, selected: usize) -> Vec<StyledLine> {
    let cols = usize::from(layout.width.max(1));
    let mut lines = vec![StyledLine::blank(); usize::from(layout.height)];
    let mut put = |row: usize, line: StyledLine| {
        if let Some(slot) = lines.get_mut(row) {
            *slot = line;
        }
    };

    let script = page.script();
    let mut row = 0;
    for text in wrap_text(&script.title, cols) {
        put(row, StyledLine::new(text, LineStyle::Title));
        row += 1;
    }
    if let Some(description) = &script.description {
        row += 1;
        for text in wrap_text(description, cols) {
            put(row, StyledLine::new(text, LineStyle::Description));
            row += 1;
        }
    }

    let sequence = page.sequence();
    for (k, start) in layout.segment_rows.iter().enumerate() {
        if !sequence.is_mounted(k) {
            continue;
        }
        let full = sequence.segment_text(k).unwrap_or_default();
        let shown = sequence.displayed(k).unwrap_or_default();
        let mut wrapped = wrap_prefix(&full, shown.len(), cols);
        if wrapped.is_empty() {
            wrapped.push(String::new());
        }

        if sequence.is_animating(k) {
            // Cursor goes after the last line with content
            let last = wrapped.iter().rposition(|l| !l.is_empty()).unwrap_or(0);
            wrapped[last].push(TYPING_CURSOR);
        }

        for (offset, text) in wrapped.into_iter().enumerate() {
            put(usize::from(*start) + offset, StyledLine::new(text, LineStyle::Text));
        }
    }

    let item_cols = cols.saturating_sub(ITEM_BULLET.width()).max(1);
    let indent = " ".repeat(ITEM_BULLET.width());
    for (item, rect) in page.items().iter().zip(&layout.items) {
        if !item.is_visible() {
            continue;
        }
        let mut row = rect.y as usize;
        for (i, text) in wrap_text(&item.spec.title, item_cols).into_iter().enumerate() {
            let prefix = if i == 0 { ITEM_BULLET } else { indent.as_str() };
            put(row, StyledLine::new(format!("{prefix}{text}"), LineStyle::ItemTitle));
            row += 1;
        }
        if let Some(body) = &item.spec.body {
            for text in wrap_text(body, item_cols) {
                put(row, StyledLine::new(format!("{indent}{text}"), LineStyle::ItemBody));
                row += 1;
            }
        }
    }

    for (i, action) in page.actions().iter().enumerate() {
        let style = LineStyle::Action {
            actionable: action.is_actionable(),
            selected: i == selected,
        };
        put(
            usize::from(layout.actions_row) + i,
            StyledLine::new(format!("[ {} ]", action.label()), style),
        );
    }

    lines
}

// =============================================================================
// Tests
// =============================================================================
