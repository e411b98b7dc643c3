pub mod color; // Frequency → background color
pub mod config;
pub mod error;
pub mod graph; // Audio graph collaborator: params, oscillators, realtime renderer
pub mod pitch; // Key → frequency table
pub mod synth; // Voice lifecycle: envelope, registry, balancer, dispatcher

pub const MAX_BLOCK_SIZE: usize = 2048;
