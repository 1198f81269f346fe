//! Application state for the status overlay demo.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use ratatui::layout::Rect;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::core::{ChannelListener, RequestState, RequestStatusTracker, StatusEvent};
use crate::logging;
use crate::overlay::{OverlayRenderer, Rect as OverlayRect};
use crate::palette::{self, OverlayTheme};
use crate::pipeline::{self, PipelineEvent, PipelinePlan};
use crate::settings::Settings;
use crate::tui::canvas;

const PLAYER_NAME: &str = "You";

/// One transcript entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    pub is_player: bool,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    fn new(sender: impl Into<String>, text: impl Into<String>, is_player: bool) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            is_player,
            timestamp: Local::now(),
        }
    }
}

/// Configuration for the demo UI.
#[derive(Debug, Clone, Default)]
pub struct DemoOptions {
    /// Where toggles are persisted; `None` keeps them in memory.
    pub settings_path: Option<PathBuf>,
    pub plan: PipelinePlan,
}

fn seed_transcript(npc: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::new(npc, "Greetings, traveler! Haven't seen a new face here in a while.", false),
        ChatMessage::new(PLAYER_NAME, "Hello! I'm looking for work.", true),
        ChatMessage::new(
            npc,
            "Work, you say? There is one job... Bandits are raiding the caravans on the \
             northern road. Deal with them and I'll pay you well.",
            false,
        ),
        ChatMessage::new(PLAYER_NAME, "How much will you pay?", true),
        ChatMessage::new(
            npc,
            "500 denars and my gratitude. Trust me, it counts for a lot around here.",
            false,
        ),
    ]
}

pub struct App {
    pub tracker: RequestStatusTracker,
    pub renderer: OverlayRenderer,
    pub settings: Settings,
    pub theme: OverlayTheme,
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub status_message: Option<String>,
    /// Phase as last reported through the tracker's change events.
    pub header_state: RequestState,
    /// Where the debug panel was drawn last frame, for mouse hit tests.
    pub last_debug_panel_area: Option<Rect>,
    pub should_quit: bool,
    settings_path: Option<PathBuf>,
    plan: PipelinePlan,
    pipeline_tx: UnboundedSender<PipelineEvent>,
    pipeline_rx: UnboundedReceiver<PipelineEvent>,
    state_rx: UnboundedReceiver<StatusEvent>,
    pipeline: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(settings: Settings, options: DemoOptions) -> Self {
        let mut tracker = RequestStatusTracker::with_text(settings.status_text());
        let (state_tx, state_rx) = mpsc::unbounded_channel();
        tracker.subscribe(ChannelListener::new(state_tx));
        let (pipeline_tx, pipeline_rx) = mpsc::unbounded_channel();

        Self {
            tracker,
            renderer: OverlayRenderer::with_debug_mode(settings.debug_mode),
            theme: settings.overlay_theme(),
            messages: seed_transcript(&settings.npc_name),
            input: String::new(),
            status_message: None,
            header_state: RequestState::Idle,
            last_debug_panel_area: None,
            should_quit: false,
            settings_path: options.settings_path,
            plan: options.plan,
            pipeline_tx,
            pipeline_rx,
            state_rx,
            pipeline: None,
            settings,
        }
    }

    // === Input ===

    pub fn insert_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Send the composer text to the NPC.
    ///
    /// Ignored while the input is blank or a request is still on screen.
    pub fn submit_input(&mut self) -> bool {
        let message = self.input.trim().to_string();
        if message.is_empty() || self.tracker.is_active() {
            return false;
        }
        self.input.clear();
        self.messages
            .push(ChatMessage::new(PLAYER_NAME, message.clone(), true));

        if let Some(previous) = self.pipeline.take() {
            previous.abort();
        }
        self.tracker
            .start_request(self.settings.npc_name.clone(), message.clone());
        self.pipeline = Some(pipeline::spawn_pipeline(
            self.plan.clone(),
            message,
            self.pipeline_tx.clone(),
        ));
        true
    }

    // === Background events ===

    /// Apply pending pipeline progress, then absorb the resulting state changes.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.pipeline_rx.try_recv() {
            if let PipelineEvent::Completed(response) = &event {
                self.messages.push(ChatMessage::new(
                    self.settings.npc_name.clone(),
                    response.clone(),
                    false,
                ));
            }
            event.apply(&mut self.tracker);
        }

        while let Ok(event) = self.state_rx.try_recv() {
            self.header_state = event.state();
            if self.header_state == RequestState::Idle {
                self.pipeline = None;
            }
        }
    }

    /// Advance the spinner by one frame.
    pub fn tick(&mut self) {
        self.tracker.advance_animation();
    }

    // === Toggles ===

    pub fn toggle_debug_mode(&mut self) {
        let enabled = self.renderer.toggle_debug_mode();
        self.settings.debug_mode = enabled;
        self.status_message = Some(format!(
            "Debug mode {}",
            if enabled { "on" } else { "off" }
        ));
        self.persist_settings();
    }

    pub fn toggle_debug_panel(&mut self) {
        self.renderer.toggle_debug_panel();
    }

    pub fn cycle_theme(&mut self) {
        let next = palette::next_theme(&self.settings.theme);
        self.settings.theme = next.to_string();
        self.theme = palette::overlay_theme(next);
        self.status_message = Some(format!("Theme: {next}"));
        self.persist_settings();
    }

    fn persist_settings(&mut self) {
        let Some(path) = self.settings_path.as_ref() else {
            return;
        };
        if let Err(err) = self.settings.save_to(path) {
            logging::warn(format!("{err:#}"));
            self.status_message = Some(format!("Failed to save settings: {err}"));
        }
    }

    /// Toggle the debug panel when the click lands on its header.
    pub fn handle_click(&mut self, column: u16, row: u16) -> bool {
        let Some(area) = self.last_debug_panel_area else {
            return false;
        };
        let Some(point) = canvas::cell_center(area, column, row) else {
            return false;
        };
        let bounds = OverlayRect::new(
            0.0,
            0.0,
            f32::from(area.width) * canvas::CELL_WIDTH,
            self.renderer.debug_panel_height(self.tracker.status()),
        );
        if !self.renderer.hit_test_debug_header(point, bounds) {
            return false;
        }
        self.toggle_debug_panel();
        true
    }

    /// Stop the background pipeline, if any.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.pipeline.take() {
            handle.abort();
        }
    }
}
