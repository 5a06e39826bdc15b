//! Terminal renderer for page scripts.
//!
//! - [`layout`] - pure document layout: word wrap, row reservation, styled lines
//! - [`terminal`] - crossterm host driving the clock, viewport and input

pub mod layout;
pub mod terminal;

pub use layout::{
    render_document, wrap_prefix, wrap_ranges, wrap_text, LineStyle, PageLayout, StyledLine,
    TYPING_CURSOR,
};
pub use terminal::{Exit, Flow, TerminalHost, FRAME_MS};
