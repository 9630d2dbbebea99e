//! Terminal colors for fleet output.

use owo_colors::Style;

/// Every style the renderers use. Plain until [`Styles::colorize`] runs.
#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    pub dim: Style,
    /// Table headings.
    pub bold: Style,
    pub header: Style,
    /// Liveness cell of a running instance.
    pub alive: Style,
    /// Liveness cell of a registry entry whose process is gone.
    pub stale: Style,
    /// Worker URLs.
    pub endpoint: Style,
}

impl Styles {
    /// Switch every style to its colored form.
    pub fn colorize(&mut self) {
        *self = Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red(),
            info: Style::new().blue(),
            dim: Style::new().dimmed(),
            bold: Style::new().bold(),
            header: Style::new().bold().cyan(),
            alive: Style::new().green().bold(),
            stale: Style::new().yellow().dimmed(),
            endpoint: Style::new().cyan(),
        };
    }

    #[must_use]
    pub fn liveness(&self, alive: bool) -> Style {
        if alive { self.alive } else { self.stale }
    }
}
