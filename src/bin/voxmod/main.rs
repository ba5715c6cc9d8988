//! voxmod - plays a short chord progression through the default output
//!
//! Run with: cargo run

mod app;

use app::{Chord, Voxmod};
use voxmod::patch;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt().with_target(false).init();

    // i - VI - III - VII in A minor
    Voxmod::new(patch::wavetable_pad())
        .bpm(96.0)
        .chord(Chord::new(&[57, 60, 64], 2.0))
        .chord(Chord::new(&[53, 57, 60], 2.0))
        .chord(Chord::new(&[48, 52, 55], 2.0))
        .chord(Chord::new(&[55, 59, 62], 2.0))
        .run()
}
