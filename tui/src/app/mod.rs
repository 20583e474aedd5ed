mod state;

pub use state::{LogEntry, MessageKind, StreamController, StreamStatus};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use http::Uri;
use tracing::{error, info};

use crate::client::StreamHandle;
use crate::settings::{SettingsStore, load_endpoint, save_endpoint};

/// What the event loop has to do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Start(Uri),
    Cancel,
    Quit,
}

/// Interactive state: the endpoint being edited plus the stream controller.
#[derive(Debug)]
pub struct App<S: SettingsStore> {
    pub controller: StreamController,
    pub input: String,
    store: S,
    saved: String,
}

impl<S: SettingsStore> App<S> {
    /// Load the persisted endpoint into the input line.
    pub fn new(store: S) -> Self {
        let saved = load_endpoint(&store);
        Self {
            controller: StreamController::new(),
            input: saved.clone(),
            store,
            saved,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => Action::Quit,
            KeyCode::Char('l') if ctrl => {
                self.controller.clear();
                Action::None
            }
            KeyCode::Esc if self.controller.status().is_active() => Action::Cancel,
            KeyCode::Enter => self.start(),
            KeyCode::Backspace => {
                self.input.pop();
                Action::None
            }
            KeyCode::Char(c) if !ctrl => {
                self.input.push(c);
                Action::None
            }
            _ => Action::None,
        }
    }

    /// Persist the endpoint if it changed, then try to start a stream.
    pub fn start(&mut self) -> Action {
        if !self.controller.can_start() {
            return Action::None;
        }
        self.persist_endpoint();
        match self.controller.start(&self.input) {
            Some(uri) => Action::Start(uri),
            None => Action::None,
        }
    }

    fn persist_endpoint(&mut self) {
        if self.input == self.saved {
            return;
        }
        match save_endpoint(&mut self.store, &self.input) {
            Ok(()) => self.saved = self.input.clone(),
            Err(e) => error!("Failed to save endpoint: {}", e),
        }
    }
}

/// Feed every update of `handle` into `controller` until the stream reaches a
/// terminal state, calling `on_entry` for each new log line.
pub async fn follow_stream(
    controller: &mut StreamController,
    handle: &mut StreamHandle,
    mut on_entry: impl FnMut(&LogEntry),
) {
    let mut shown = controller.log().len();

    while controller.status().is_active() {
        match handle.next().await {
            Some(update) => controller.handle(update),
            None => controller.channel_closed(),
        }
        for entry in &controller.log()[shown..] {
            on_entry(entry);
        }
        shown = controller.log().len();
    }

    info!("Stream finished: {}", controller.status().label());
}
