//! TUI module for hueboard
//!
//! Turns terminal key events into note events and draws the backdrop color,
//! the key layout and an oscilloscope of the output.

pub mod state;
mod backdrop;
mod keyboard;
mod status;
mod waveform;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use rtrb::Consumer;

use hueboard::{
    graph::{realtime::ControlGraph, Waveform},
    pitch::KeyId,
    synth::{ColorState, InputDispatcher, InputEvent},
};

pub use state::UiState;

use backdrop::BackdropFade;
use keyboard::render_keyboard;
use status::{render_status, AudioStats};
use waveform::render_waveform;

/// Audio visualization buffer size
pub const VIS_BUFFER_SIZE: usize = 1024;

/// UI application state
pub struct UiApp {
    dispatcher: InputDispatcher<ControlGraph, ColorState>,
    /// Ring buffer receiver for audio samples
    audio_rx: Consumer<f32>,
    /// Audio sample buffer for visualization
    audio_buffer: Vec<f32>,
    /// Whether the terminal reports key releases
    release_events: bool,
    hold_timeout: Duration,
    /// Last press or repeat per held key, for the release fallback
    held: HashMap<KeyId, Instant>,
    backdrop: BackdropFade,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        dispatcher: InputDispatcher<ControlGraph, ColorState>,
        audio_rx: Consumer<f32>,
        release_events: bool,
        hold_timeout_ms: u64,
    ) -> Self {
        Self {
            dispatcher,
            audio_rx,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            release_events,
            hold_timeout: Duration::from_millis(hold_timeout_ms),
            held: HashMap::new(),
            backdrop: BackdropFade::default(),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.dispatcher.poll();
            self.expire_held();
            self.backdrop
                .retarget(self.dispatcher.backdrop().current, Instant::now());

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                // Drain everything queued so chords land in the same frame
                loop {
                    if let Event::Key(key) = event::read()? {
                        self.handle_key(key);
                    }
                    if !event::poll(Duration::ZERO)? {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Poll for new audio samples from ring buffer
    fn poll_audio(&mut self) {
        let mut new_samples = Vec::new();
        while let Ok(sample) = self.audio_rx.pop() {
            new_samples.push(sample);
        }

        if !new_samples.is_empty() {
            // Append new samples and keep only the last VIS_BUFFER_SIZE
            self.audio_buffer.extend(new_samples);
            if self.audio_buffer.len() > VIS_BUFFER_SIZE {
                let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
                self.audio_buffer.drain(0..excess);
            }
        }
    }

    /// Release keys the terminal will never report as released
    fn expire_held(&mut self) {
        if self.release_events {
            return;
        }
        let now = Instant::now();
        let timeout = self.hold_timeout;
        let expired: Vec<KeyId> = self
            .held
            .iter()
            .filter(|&(_, last)| now.duration_since(*last) >= timeout)
            .map(|(&key, _)| key)
            .collect();
        for key in expired {
            self.held.remove(&key);
            self.dispatcher.handle(InputEvent::Release { key });
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if let KeyCode::Char(c) = key.code {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                if c == 'c' && key.kind == KeyEventKind::Press {
                    self.should_quit = true;
                }
                return;
            }
            if let Some(id) = KeyId::from_char(c) {
                self.handle_note_key(id, key.kind);
            }
            return;
        }

        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::F(n @ 1..=4) => {
                self.dispatcher.set_waveform(Waveform::ALL[n as usize - 1]);
            }
            KeyCode::Tab => {
                let next = self.dispatcher.waveform().next();
                self.dispatcher.set_waveform(next);
            }
            _ => {}
        }
    }

    fn handle_note_key(&mut self, key: KeyId, kind: KeyEventKind) {
        let event = match kind {
            KeyEventKind::Press => {
                self.held.insert(key, Instant::now());
                InputEvent::Press { key, repeat: false }
            }
            KeyEventKind::Repeat => {
                self.held.insert(key, Instant::now());
                InputEvent::Press { key, repeat: true }
            }
            KeyEventKind::Release => {
                self.held.remove(&key);
                InputEvent::Release { key }
            }
        };
        self.dispatcher.handle(event);
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let state = UiState::capture(&self.dispatcher, self.release_events);
        let area = frame.area();

        // Paint the backdrop first; widgets draw over it.
        let background = match self.backdrop.color_at(Instant::now()) {
            Some((r, g, b)) => Style::default().bg(Color::Rgb(r, g, b)).fg(Color::Black),
            None => Style::default(),
        };
        frame.render_widget(Block::default().style(background), area);

        // Main layout: status, keyboard, waveform, help
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Length(6), // Keyboard
                Constraint::Min(8),    // Waveform
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        let audio_stats = AudioStats::from_buffer(&self.audio_buffer);
        render_status(frame, chunks[0], &state, &audio_stats);

        let keyboard_block = Block::default()
            .title(" Keys ")
            .borders(Borders::ALL);
        let keyboard_inner = keyboard_block.inner(chunks[1]);
        frame.render_widget(keyboard_block, chunks[1]);
        render_keyboard(frame, keyboard_inner, &state);

        render_waveform(frame, chunks[2], &self.audio_buffer, &state);

        let help = Paragraph::new(" [Esc] Quit  [F1-F4] Waveform  [Tab] Next waveform")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
