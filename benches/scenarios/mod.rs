//! Real-world scenario benchmarks.
//!
//! These benchmarks render complete voices and a loaded voice pool, the way
//! the demo binary drives them.

mod poly;
mod voices;

pub use poly::bench_poly;
pub use voices::bench_voices;
