//! Real-world scenario benchmarks.
//!
//! These render the playback graph the way the output callback does: the
//! source player feeding the analysis tap, plus a sounding voice.

mod graph;

pub use graph::bench_graph;
