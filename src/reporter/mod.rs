//! Turns classified updates into visible feedback.
//!
//! [`Handlers`] is the capability table: one replaceable slot per kind of
//! update, each falling back to a documented default. [`Reporter`] routes an
//! [`Update`](crate::protocol::Update) or a transport error to the right slot.
//! Defaults draw on a [`Renderer`], the external display surface.

mod handlers;
mod terminal;

pub use handlers::{Handlers, Reporter, defaults};
pub use terminal::{RenderTargets, TerminalRenderer};

/// Color family applied to the progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Progress,
    Success,
    Error,
    Ignored,
}

/// The display surface a session draws on.
pub trait Renderer {
    /// Recolors the bar and, when given, sets its fill to `percent` (0–100).
    fn paint(&mut self, tone: Tone, percent: Option<f64>);

    /// Replaces the status line.
    fn set_message(&mut self, text: &str);

    /// Whether results have a dedicated place to go.
    fn has_result_target(&self) -> bool;

    /// Shows a task result on the result target. No-op without one.
    fn show_result(&mut self, text: &str);
}
