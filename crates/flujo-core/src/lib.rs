//! Flujo Core - tagged values and signal buffers for the dataflow engine
//!
//! This crate provides the value system shared by every layer of flujo:
//!
//! - [`Value`] - a tagged union of scalar kinds (bool, uint, int, float,
//!   double, string, cfg reference) and buffer kinds (audio, spectrum,
//!   MIDI), with bit-exact coercion along the numeric promotion lattice
//! - [`TypeFl`] - the type-flag bitmask used by variable descriptors to
//!   declare permitted type sets, including the `RUNTIME` sentinel for
//!   types fixed at first assignment
//! - [`AudioBuf`] - channel-major sample storage with fixed extent
//! - [`SpectBuf`] - per-channel magnitude/phase/frequency bin vectors
//! - [`MidiBuf`] / [`ChMsg`] - bounded channel-message storage
//! - [`FlowError`] - the one error taxonomy used across the workspace;
//!   no flujo crate ever panics on a recoverable condition
//!
//! # Design Principles
//!
//! - **Real-time safe**: buffer extents are fixed at creation; the audio
//!   path never allocates
//! - **Single taxonomy**: every fallible operation returns
//!   [`Result<T, FlowError>`](FlowError)
//! - **Coercion is explicit**: a typed destination either converts the
//!   source bit-exactly or fails with `TypeMismatch`

pub mod abuf;
pub mod error;
pub mod fbuf;
pub mod mbuf;
pub mod tflag;
pub mod value;

pub use abuf::AudioBuf;
pub use error::{FlowError, Result};
pub use fbuf::SpectBuf;
pub use mbuf::{ChMsg, MidiBuf};
pub use tflag::TypeFl;
pub use value::Value;
