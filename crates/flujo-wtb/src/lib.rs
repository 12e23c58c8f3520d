//! Pitch/velocity-indexed multi-channel wavetable bank.
//!
//! A bank is a read-only store loaded from an instrument description
//! (JSON) plus PCM WAV sample data. Lookup is by `(instrument, MIDI
//! pitch, MIDI velocity)`; the result is one wavetable *sequence* per
//! audio channel - an attack (one-shot) table followed by loop tables
//! that a reader may concatenate at runtime.
//!
//! Each table carries a guard pad of N samples on each side: the prefix
//! duplicates the tail of the loop body and the suffix duplicates its
//! head, so a reader that advances past the loop boundary can
//! interpolate without an extra branch. The pads are fixed at load time
//! and never mutated.
//!
//! Velocity gaps are filled by midpoint mapping, so every MIDI velocity
//! 0-127 resolves to a table.

mod bank;
mod instr;

pub use bank::{VelEntry, WaveTable, WtBank, WtSeq};
pub use instr::InstrFile;
