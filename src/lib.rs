#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/termbar/")]

//! # termbar
//!
//! A live-updating terminal progress bar: configure a bar, start it, advance
//! it from any thread, and it redraws itself in place, with elapsed time
//! ticking along autonomously in the background until the bar completes or is
//! stopped.
//!
//! ## Overview
//!
//! The crate separates the bar into a configuration template and a live
//! instance. [`ProgressBar`] is a plain value assembled with chained `with_*`
//! setters; [`ProgressBar::start`] copies it into an [`ActiveBar`], a shared
//! handle whose state (current value, title, active flag) is safe to mutate
//! from concurrent threads. While elapsed time is displayed, a background
//! ticker re-renders the line once per second so the clock moves even when no
//! progress is made.
//!
//! Every started bar announces itself to a [`Registry`], so other
//! live-updating components can check whether a bar currently owns the
//! terminal line before drawing over it.
//!
//! ## Quick start
//!
//! ```no_run
//! use termbar::ProgressBar;
//!
//! fn main() -> std::io::Result<()> {
//!     let live = ProgressBar::new()
//!         .with_title("Installing")
//!         .with_total(120)
//!         .start()?;
//!
//!     for _ in 0..120 {
//!         // ... one unit of work ...
//!         live.increment();
//!     }
//!     // Reaching the total rendered a 100% frame and stopped the bar.
//!     Ok(())
//! }
//! ```
//!
//! ## Styling
//!
//! Title and bar styles are [`lipgloss`] styles, re-exported here as
//! [`Style`] and [`Color`]:
//!
//! ```
//! use termbar::{Color, ProgressBar, Style};
//!
//! let bar = ProgressBar::new()
//!     .with_title_style(Style::new().bold(true))
//!     .with_bar_style(Style::new().foreground(Color::from("#2ED573")));
//! ```
//!
//! The percentage is colored independently, fading linearly from red at 0% to
//! green at 100%.
//!
//! ## Output
//!
//! Bars write to standard output by default; [`Sink`] wraps any
//! `Write + Send` target instead:
//!
//! ```
//! use termbar::{ProgressBar, Sink};
//!
//! let bar = ProgressBar::new().with_writer(Sink::stderr());
//! ```

pub mod bar;
pub mod registry;

mod render;
mod term;

pub use bar::{ActiveBar, ProgressBar, Sink};
pub use registry::Registry;

pub use lipgloss::{Color, Style};

/// Convenient single import for the common surface.
///
/// ```
/// use termbar::prelude::*;
///
/// let bar = ProgressBar::new().with_total(10);
/// ```
pub mod prelude {
    pub use crate::bar::{ActiveBar, ProgressBar, Sink};
    pub use crate::registry::Registry;
    pub use lipgloss::{Color, Style};
}
