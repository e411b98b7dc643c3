//! Real-world scenario benchmarks.
//!
//! These render chords through the same graph the instrument plays.

mod chords;

pub use chords::bench_chords;
