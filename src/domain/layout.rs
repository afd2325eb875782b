//! Button layout model
//!
//! In-memory representation of one peripheral's button layout, including
//! the edit/save/cancel cycle used while rearranging buttons.

use crate::domain::models::DeviceKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One decoded button record.
///
/// Position and size are in the peripheral's 0-255 layout grid; mapping to
/// screen geometry is the presentation layer's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub id: u8,
    pub x: u8,
    pub y: u8,
    pub width: u8,
    pub height: u8,
    pub border: bool,
    pub label: String,
    pub image: Option<String>,
    /// Whether the button is currently handed to a presenter. Inactive
    /// buttons are retained but not rendered.
    #[serde(skip)]
    pub active: bool,
}

/// Current interaction mode of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    /// Normal operation - presses are forwarded to the peripheral
    #[default]
    Viewing,
    /// Rearrangement - presses are captured locally, never transmitted
    Editing,
}

/// Ordered collection of buttons for one peripheral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonLayout {
    device_key: DeviceKey,
    buttons: Vec<Button>,
    #[serde(skip)]
    mode: LayoutMode,
    /// Rollback snapshot taken when editing starts
    #[serde(skip)]
    snapshot: Option<Vec<Button>>,
}

impl ButtonLayout {
    pub fn new(device_key: DeviceKey) -> Self {
        Self {
            device_key,
            buttons: Vec::new(),
            mode: LayoutMode::Viewing,
            snapshot: None,
        }
    }

    pub fn device_key(&self) -> &DeviceKey {
        &self.device_key
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == LayoutMode::Editing
    }

    /// Append a decoded button. Duplicate ids are rejected: the first
    /// record for an id wins and the duplicate is dropped with a warning.
    pub fn push_button(&mut self, mut button: Button, active: bool) {
        if self.buttons.iter().any(|b| b.id == button.id) {
            warn!(id = button.id, "Dropping button with duplicate id");
            return;
        }
        button.active = active;
        self.buttons.push(button);
    }

    /// Mark every button renderable. Called when a presenter attaches to a
    /// layout that was decoded headless.
    pub fn activate_all(&mut self) {
        for button in &mut self.buttons {
            button.active = true;
        }
    }

    /// Enter editing mode, snapshotting the current arrangement for a
    /// possible rollback. No-op if already editing.
    pub fn start_editing(&mut self) {
        if self.mode == LayoutMode::Editing {
            return;
        }
        debug!("Editing started");
        self.snapshot = Some(self.buttons.clone());
        self.mode = LayoutMode::Editing;
    }

    /// Leave editing mode. With `save` the changes are kept and the
    /// snapshot dropped; without it the arrangement rolls back to the state
    /// captured by [`start_editing`](Self::start_editing). No-op if already
    /// viewing.
    pub fn stop_editing(&mut self, save: bool) {
        if self.mode == LayoutMode::Viewing {
            return;
        }
        debug!(save, "Editing stopped");
        self.mode = LayoutMode::Viewing;
        match self.snapshot.take() {
            Some(snapshot) if !save => self.buttons = snapshot,
            _ => {}
        }
    }

    /// Reposition a button. Only applies while editing.
    pub fn move_button(&mut self, id: u8, x: u8, y: u8) {
        if self.mode != LayoutMode::Editing {
            warn!(id, "Ignoring move outside editing mode");
            return;
        }
        if let Some(button) = self.buttons.iter_mut().find(|b| b.id == id) {
            button.x = x;
            button.y = y;
        }
    }

    /// Relabel a button. Only applies while editing.
    pub fn set_label(&mut self, id: u8, label: impl Into<String>) {
        if self.mode != LayoutMode::Editing {
            warn!(id, "Ignoring relabel outside editing mode");
            return;
        }
        if let Some(button) = self.buttons.iter_mut().find(|b| b.id == id) {
            button.label = label.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(id: u8) -> Button {
        Button {
            id,
            x: id * 10,
            y: 0,
            width: 50,
            height: 30,
            border: true,
            label: format!("Button {id}"),
            image: None,
            active: false,
        }
    }

    fn layout_with(ids: &[u8]) -> ButtonLayout {
        let mut layout = ButtonLayout::new("test-device".to_string());
        for &id in ids {
            layout.push_button(button(id), true);
        }
        layout
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut layout = layout_with(&[1, 2]);
        layout.push_button(button(1), true);
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.buttons()[0].x, 10);
    }

    #[test]
    fn test_start_editing_idempotent() {
        let mut layout = layout_with(&[1]);
        layout.start_editing();
        layout.move_button(1, 99, 99);
        // A second start must not refresh the snapshot with the moved state
        layout.start_editing();
        layout.stop_editing(false);
        assert_eq!(layout.buttons()[0].x, 10);
    }

    #[test]
    fn test_stop_editing_idempotent() {
        let mut layout = layout_with(&[1]);
        layout.stop_editing(true);
        assert_eq!(layout.mode(), LayoutMode::Viewing);
        layout.stop_editing(false);
        assert_eq!(layout.mode(), LayoutMode::Viewing);
    }

    #[test]
    fn test_cancel_rolls_back() {
        let mut layout = layout_with(&[1, 2]);
        let before = layout.buttons().to_vec();

        layout.start_editing();
        layout.move_button(1, 200, 200);
        layout.set_label(2, "Renamed");
        layout.stop_editing(false);

        assert_eq!(layout.buttons(), before.as_slice());
    }

    #[test]
    fn test_save_commits() {
        let mut layout = layout_with(&[1]);
        layout.start_editing();
        layout.move_button(1, 200, 150);
        layout.stop_editing(true);

        assert_eq!(layout.buttons()[0].x, 200);
        assert_eq!(layout.buttons()[0].y, 150);
        assert_eq!(layout.mode(), LayoutMode::Viewing);
    }

    #[test]
    fn test_mutations_ignored_while_viewing() {
        let mut layout = layout_with(&[1]);
        layout.move_button(1, 200, 200);
        layout.set_label(1, "Renamed");
        assert_eq!(layout.buttons()[0].x, 10);
        assert_eq!(layout.buttons()[0].label, "Button 1");
    }

    #[test]
    fn test_activate_all() {
        let mut layout = ButtonLayout::new("test-device".to_string());
        layout.push_button(button(1), false);
        assert!(!layout.buttons()[0].active);
        layout.activate_all();
        assert!(layout.buttons()[0].active);
    }
}
