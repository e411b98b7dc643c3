//! Oscilloscope of the output bus, drawn in a darker shade of the chord color

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use hueboard::color::Hsl;

use super::UiState;

/// Lightness of the trace when tinted by the backdrop hue.
const TRACE_LIGHTNESS: f32 = 25.0;

/// Render a trigger-aligned trace of the newest samples
pub fn render_waveform(frame: &mut Frame, area: Rect, samples: &[f32], state: &UiState) {
    let title = match state.balance.average_frequency {
        Some(freq) => format!(" Output · {freq:.1} Hz "),
        None => " Output ".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    let window = trigger_window(samples);
    let data = trace_points(window);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(trace_color(state.backdrop)))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(Axis::default().bounds([0.0, 1.0]))
        .y_axis(Axis::default().bounds([-1.0, 1.0]));

    frame.render_widget(chart, area);
}

/// The second half of the buffer's length, starting at the first rising zero
/// crossing so periodic tones hold still between frames.
fn trigger_window(samples: &[f32]) -> &[f32] {
    let span = samples.len() / 2;
    let start = samples[..span]
        .windows(2)
        .position(|pair| pair[0] < 0.0 && pair[1] >= 0.0)
        .map_or(0, |i| i + 1);
    &samples[start..start + span]
}

fn trace_points(window: &[f32]) -> Vec<(f64, f64)> {
    let len = window.len().max(1) as f64;
    window
        .iter()
        .enumerate()
        .map(|(i, &sample)| (i as f64 / len, sample as f64))
        .collect()
}

fn trace_color(backdrop: Option<Hsl>) -> Color {
    match backdrop {
        Some(color) => {
            let (r, g, b) = Hsl::new(color.hue, color.saturation, TRACE_LIGHTNESS).to_rgb();
            Color::Rgb(r, g, b)
        }
        None => Color::Cyan,
    }
}
