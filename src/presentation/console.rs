//! Console presenter for headless and demo runs

use crate::domain::layout::ButtonLayout;
use crate::domain::session::Presenter;

/// Prints the decoded layout to stdout. Stands in for a real UI; useful
/// when running against the emulator or debugging a peripheral's layout.
#[derive(Debug, Default)]
pub struct ConsolePresenter {
    loading: bool,
}

impl ConsolePresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Presenter for ConsolePresenter {
    fn render_layout(&mut self, layout: &ButtonLayout) {
        println!("Layout for {} ({} buttons):", layout.device_key(), layout.len());
        for button in layout.buttons() {
            if !button.active {
                continue;
            }
            println!(
                "  [{:3}] {:<20} at ({:3},{:3}) {}x{}{}",
                button.id,
                button.label,
                button.x,
                button.y,
                button.width,
                button.height,
                if button.border { "" } else { " (borderless)" },
            );
        }
    }

    fn render_loading_indicator(&mut self) {
        if !self.loading {
            println!("Waiting for layout...");
            self.loading = true;
        }
    }

    fn remove_loading_indicator(&mut self) {
        self.loading = false;
    }
}
