//! Cycle scheduler and external-device bridge.
//!
//! The [`Scheduler`] owns a finalized [`Network`](flujo_net::Network)
//! plus the device backends matching its declarations. Per cycle it:
//!
//! 1. drains each MIDI input device into the bound `midi_in` buffer;
//! 2. copies device capture frames into each `audio_in` buffer
//!    (channel-major) and zeroes every `audio_out` buffer;
//! 3. runs the network cycle;
//! 4. drains each `audio_out` buffer to its playback device;
//! 5. forwards `midi_out` messages to their device and clears the
//!    drained MIDI inputs.
//!
//! MIDI arriving mid-cycle is deferred to the next cycle. When a device
//! or procedure reaches end of stream, the cycle returns `Eof` and every
//! later call fails with `InvalidState` - the caller unloads and
//! reloads.
//!
//! Device backends are in-scope only as sample/message I/O: a
//! memory-backed pair for tests and a PCM WAV pair for non-real-time
//! rendering.

pub mod device;
pub mod sched;

pub use device::{
    AudioDevice, MemAudioDevice, MemMidiDevice, MidiDevice, WavInDevice, WavOutDevice,
};
pub use sched::Scheduler;
