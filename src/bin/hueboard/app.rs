//! Hueboard - audio setup and runner

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::execute;
use rtrb::RingBuffer;

use super::ui::{UiApp, VIS_BUFFER_SIZE};

use hueboard::{
    config::EngineConfig,
    graph::realtime,
    pitch::PitchTable,
    synth::{ColorState, InputDispatcher},
    MAX_BLOCK_SIZE,
};

/// Main application
pub struct Hueboard {
    config: EngineConfig,
}

impl Hueboard {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Open the output device and run the UI until the user quits
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let supported = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = supported.sample_rate().0 as f32;
        let channels = supported.channels() as usize;
        log::info!(
            "output device: {} ({sample_rate} Hz, {channels} channels)",
            device.name().unwrap_or_else(|_| "(no name)".into())
        );

        let (graph, mut renderer) = realtime::channel(sample_rate, self.config.master_gain);

        // Audio thread -> UI oscilloscope
        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(VIS_BUFFER_SIZE * 4);

        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];
        let stream = device.build_output_stream(
            &supported.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames_to_render];
                    renderer.render_block(block);

                    // Copy to output (mono to all channels)
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                        // Drop samples if the UI falls behind
                        let _ = scope_tx.push(s);
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| log::error!("output stream error: {err}"),
            None,
        )?;
        stream.play()?;

        let dispatcher = InputDispatcher::new(
            graph,
            PitchTable::default(),
            ColorState::default(),
            &self.config,
        );

        let mut terminal = ratatui::init();
        let release_events = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
        if release_events {
            execute!(
                std::io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .wrap_err("failed to enable key release events")?;
        } else {
            log::warn!(
                "terminal does not report key releases; releasing after {} ms",
                self.config.hold_timeout_ms
            );
        }

        let mut ui = UiApp::new(dispatcher, scope_rx, release_events, self.config.hold_timeout_ms);
        let result = ui.run(&mut terminal);

        if release_events {
            let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        }
        ratatui::restore();
        drop(stream);
        result
    }
}
