//! Status bar widget - shows waveform, voice count, gain, chord color and audio stats

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::UiState;

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    /// Compute audio stats from a buffer
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

/// Render the status bar
pub fn render_status(frame: &mut Frame, area: Rect, state: &UiState, audio_stats: &AudioStats) {
    let block = Block::default()
        .title(" hueboard ")
        .borders(Borders::ALL);

    let balance = &state.balance;
    let chord = match (balance.average_frequency, balance.color) {
        (Some(freq), Some(color)) => format!("{freq:.1} Hz  hue {:.0}°  ", color.hue),
        _ => "silent  ".to_string(),
    };
    let release_mode = if state.release_events {
        "key-up"
    } else {
        "hold timeout"
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {}  ", state.waveform),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Voices: {}  ", balance.voices),
            Style::default().fg(if balance.voices > 0 {
                Color::Green
            } else {
                Color::Yellow
            }),
        ),
        Span::styled(
            format!("Gain: {:.3}  ", balance.target_gain),
            Style::default().fg(Color::White),
        ),
        Span::styled(chord, Style::default().fg(Color::White)),
        Span::styled(
            format!("{release_mode}  "),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", audio_stats.peak, audio_stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_silence() {
        let stats = AudioStats::from_buffer(&[]);
        assert_eq!(stats.peak, 0.0);
        assert_eq!(stats.rms, 0.0);
    }

    #[test]
    fn stats_of_square() {
        let stats = AudioStats::from_buffer(&[0.5, -0.5, 0.5, -0.5]);
        assert!((stats.peak - 0.5).abs() < 1e-6);
        assert!((stats.rms - 0.5).abs() < 1e-6);
    }
}
