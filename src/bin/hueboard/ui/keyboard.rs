//! Keyboard widget - the two-octave key layout with held notes lit

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use hueboard::{
    pitch::{note_name, KeyId},
    synth::EnvelopePhase,
};

use super::UiState;

/// Rows as they sit on a QWERTY keyboard; `_` is a gap with no note.
const ROWS: [&str; 4] = ["23_567", "QWERTYU", "SD_GHJ", "ZXCVBNM"];

/// Width of one key cell, e.g. `[Q C5 ]`
const CELL_WIDTH: usize = 8;

/// Render the key layout
pub fn render_keyboard(frame: &mut Frame, area: Rect, state: &UiState) {
    if area.height == 0 || area.width < 20 {
        return;
    }

    let lines: Vec<Line> = ROWS
        .iter()
        .enumerate()
        .map(|(row, keys)| {
            // Sharps sit half a key to the right of their naturals
            let indent = if row % 2 == 0 { CELL_WIDTH / 2 + 1 } else { 1 };
            let mut spans = vec![Span::raw(" ".repeat(indent))];
            spans.extend(keys.chars().map(|c| key_cell(c, state)));
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

fn key_cell(c: char, state: &UiState) -> Span<'static> {
    let Some(key) = KeyId::from_char(c) else {
        return Span::raw(" ".repeat(CELL_WIDTH));
    };
    let Some(name) = note_name(key) else {
        return Span::raw(" ".repeat(CELL_WIDTH));
    };

    let style = match state.phase(key) {
        Some(EnvelopePhase::Attacking | EnvelopePhase::Steady) => Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD),
        Some(EnvelopePhase::Releasing | EnvelopePhase::Stopped) => {
            Style::default().fg(Color::Black).bg(Color::Gray)
        }
        None => Style::default(),
    };

    let label = format!("[{c} {name:<3}]");
    Span::styled(format!("{label:<width$}", width = CELL_WIDTH), style)
}
