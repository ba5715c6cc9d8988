//! Benchmarks for low-level DSP primitives.

mod envelope;
mod filter;
mod lfo;
mod modulation;
mod oscillator;
mod unison;
mod wavetable;

pub use envelope::bench_envelope;
pub use filter::bench_filter;
pub use lfo::bench_lfo;
pub use modulation::bench_modulation;
pub use oscillator::bench_oscillator;
pub use unison::bench_unison;
pub use wavetable::bench_wavetable;
