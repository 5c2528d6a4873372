//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: frame layout, form sections and overlays
//! - `input`: keyboard event handling
//! - `styles`: color scheme and callout styling

pub mod input;
pub mod render;
pub mod styles;
