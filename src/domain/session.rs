//! Session controller
//!
//! Owns one peripheral's lifecycle: connect/reconnect policy, layout
//! request issuance, routing of received bytes into the decoder, publishing
//! completed layouts to the cache, and forwarding button presses to the
//! link. All events are folded through [`SessionController::handle_event`]
//! on one serialized execution context; the controller itself never blocks.

use crate::domain::decoder::{DecodeEvent, LayoutDecoder};
use crate::domain::layout::ButtonLayout;
use crate::domain::models::{AdapterState, AppEvent, ConnectionStatus, DeviceKey, LinkEvent};
use crate::domain::protocol::Command;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Abstract wireless transport. Outbound requests are fire-and-forget;
/// their completions arrive later as [`LinkEvent`]s on the session's event
/// loop.
pub trait LinkService: Send + Sync {
    fn connect(&self, peripheral: &DeviceKey);
    fn disconnect(&self, peripheral: &DeviceKey);
    fn write(&self, bytes: &[u8]);
    fn enable_notifications(&self, enable: bool);
}

/// Keyed layout store shared across sessions. Implementations are
/// responsible for their own concurrency; a session only touches the entry
/// for its own key.
pub trait LayoutCache: Send + Sync {
    fn get(&self, key: &DeviceKey) -> Option<ButtonLayout>;
    fn put(&self, key: &DeviceKey, layout: &ButtonLayout);
}

/// Presentation delegate. Optional: a session without one runs headless
/// and keeps decoded buttons inactive until a presenter attaches.
pub trait Presenter: Send {
    fn render_layout(&mut self, layout: &ButtonLayout);
    fn render_loading_indicator(&mut self);
    fn remove_loading_indicator(&mut self);
}

pub struct SessionController {
    device_key: DeviceKey,
    link: Arc<dyn LinkService>,
    cache: Arc<dyn LayoutCache>,
    presenter: Option<Box<dyn Presenter>>,
    /// Decoder for the in-flight layout request, if any. Swapped for a
    /// fresh instance on every request; dropped the moment it completes so
    /// a completed decoder is never fed again.
    decoder: Option<LayoutDecoder>,
    /// Layout being assembled by the current decoder
    pending: Option<ButtonLayout>,
    /// Last completed (or cached) layout
    layout: Option<ButtonLayout>,
    paused: bool,
    status: ConnectionStatus,
}

impl SessionController {
    pub fn new(
        device_key: DeviceKey,
        link: Arc<dyn LinkService>,
        cache: Arc<dyn LayoutCache>,
    ) -> Self {
        let layout = cache.get(&device_key);
        if layout.is_some() {
            info!(device = %device_key, "Using cached layout");
        }
        Self {
            device_key,
            link,
            cache,
            presenter: None,
            decoder: None,
            pending: None,
            layout,
            paused: false,
            status: ConnectionStatus::Disconnected,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn layout(&self) -> Option<&ButtonLayout> {
        self.layout.as_ref()
    }

    /// Attach a presentation delegate. Renders the current layout if one
    /// exists, otherwise shows the loading indicator.
    pub fn attach_presenter(&mut self, mut presenter: Box<dyn Presenter>) {
        match &mut self.layout {
            Some(layout) => {
                layout.activate_all();
                presenter.render_layout(layout);
            }
            None => presenter.render_loading_indicator(),
        }
        self.presenter = Some(presenter);
    }

    pub fn detach_presenter(&mut self) -> Option<Box<dyn Presenter>> {
        self.presenter.take()
    }

    /// Fold one event into the session. The caller guarantees events are
    /// delivered serially and in transport order.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Link(link_event) => self.handle_link_event(link_event),
            AppEvent::ButtonPressed(id) => self.handle_button_press(id),
            AppEvent::StartEditing => {
                if let Some(layout) = &mut self.layout {
                    layout.start_editing();
                }
            }
            AppEvent::StopEditing { save } => self.stop_editing(save),
            AppEvent::Pause => {
                debug!(device = %self.device_key, "Session paused");
                self.paused = true;
            }
            AppEvent::Resume => {
                debug!(device = %self.device_key, "Session resumed");
                self.paused = false;
                self.status = ConnectionStatus::Connecting;
                self.link.connect(&self.device_key);
            }
        }
    }

    fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::StateChanged(AdapterState::PoweredOn) => {
                if !self.paused {
                    self.status = ConnectionStatus::Connecting;
                    self.link.connect(&self.device_key);
                }
            }
            LinkEvent::StateChanged(state) => {
                debug!(?state, "Adapter not ready");
            }
            LinkEvent::Connected => self.on_connected(),
            LinkEvent::Disconnected => self.on_disconnected(),
            LinkEvent::DataReceived(Some(bytes)) => self.on_data(&bytes),
            LinkEvent::DataReceived(None) => {
                // Notifications without a payload happen; not an error
                debug!("Ignoring empty data event");
            }
            LinkEvent::ScanTimeout => {
                debug!("Scan timeout");
            }
        }
    }

    fn on_connected(&mut self) {
        info!(device = %self.device_key, "Connected to peripheral");
        self.status = ConnectionStatus::Connected;
        if self.layout.is_some() {
            return;
        }
        self.link.enable_notifications(true);
        self.decoder = Some(LayoutDecoder::new());
        self.pending = Some(ButtonLayout::new(self.device_key.clone()));
        info!("Requesting button layout");
        self.link.write(&Command::LayoutRequest.to_bytes());
    }

    fn on_disconnected(&mut self) {
        info!(device = %self.device_key, "Disconnected from peripheral");
        self.status = ConnectionStatus::Disconnected;
        if self.decoder.take().is_some() {
            // The stream ended short of the declared record count. Discard
            // the partial layout; the next connection re-requests it.
            warn!("Layout stream incomplete, discarding partial layout");
            self.pending = None;
        }
        if !self.paused {
            self.status = ConnectionStatus::Connecting;
            self.link.connect(&self.device_key);
        }
    }

    fn on_data(&mut self, bytes: &[u8]) {
        let events = match self.decoder.as_mut() {
            Some(decoder) => match decoder.feed(bytes) {
                Ok(events) => events,
                Err(err) => {
                    error!(%err, "Layout decode failed, tearing down session state");
                    self.decoder = None;
                    self.pending = None;
                    return;
                }
            },
            None => {
                debug!(len = bytes.len(), "Data received with no layout request in flight");
                return;
            }
        };

        for event in events {
            match event {
                DecodeEvent::RecordDecoded(button) => {
                    debug!(id = button.id, label = %button.label, "Button decoded");
                    if let Some(pending) = &mut self.pending {
                        pending.push_button(button, self.presenter.is_some());
                    }
                }
                DecodeEvent::LayoutComplete => self.publish_layout(),
            }
        }
    }

    /// The decoder reached its declared record count: drop it, cache the
    /// layout, and hand it to the presenter if one is attached.
    fn publish_layout(&mut self) {
        self.decoder = None;
        let Some(mut layout) = self.pending.take() else {
            return;
        };
        info!(
            device = %self.device_key,
            buttons = layout.len(),
            "Received the layout"
        );
        self.cache.put(&self.device_key, &layout);
        if let Some(presenter) = &mut self.presenter {
            layout.activate_all();
            presenter.remove_loading_indicator();
            presenter.render_layout(&layout);
        }
        self.layout = Some(layout);
    }

    fn handle_button_press(&mut self, id: u8) {
        let editing = self.layout.as_ref().is_some_and(|l| l.is_editing());
        if editing {
            // Presses while editing reposition/relabel locally; nothing is
            // transmitted
            debug!(id, "Press captured for editing");
            return;
        }
        debug!(id, "Forwarding button press");
        self.link.write(&Command::ButtonPress(id).to_bytes());
    }

    fn stop_editing(&mut self, save: bool) {
        let Some(layout) = &mut self.layout else {
            return;
        };
        if !layout.is_editing() {
            return;
        }
        layout.stop_editing(save);
        if save {
            self.cache.put(&self.device_key, layout);
            if let Some(presenter) = &mut self.presenter {
                presenter.render_layout(layout);
            }
        }
    }
}
