//! # Folio Theme
//!
//! Editable design tokens layered over a baseline palette, persisted through
//! the theme store and previewed as CSS custom properties.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_theme::{MemorySurface, ThemeTokenOverlay};
//!
//! let mut overlay = ThemeTokenOverlay::new(store);
//! overlay.load().await?;
//! overlay.set_local("color-accent", "#ff5722")?;
//!
//! // once per render frame
//! overlay.flush_frame(&mut surface);
//!
//! let report = overlay.save_all().await;
//! ```

mod defaults;
mod error;
mod overlay;
mod surface;
mod token;

pub use defaults::{default_tokens, load_tokens, parse_tokens};
pub use error::{ThemeError, ThemeResult};
pub use overlay::{ApplyOutcome, SaveReport, ThemeTokenOverlay, DEFAULT_STYLE_ID};
pub use surface::{MemorySurface, StyleEntry, Surface};
pub use token::{validate_name, validate_value, ThemeToken, TokenCategory};
