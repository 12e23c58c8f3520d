//! The flujo dataflow network: class dictionary, variable graph,
//! procedures, and presets.
//!
//! A [`Network`] is an ordered collection of *procedures*, each an
//! instance of a [`ClassDesc`] drawn from a [`ClassDict`]. Procedures own
//! typed *variables*; variables are wired source-to-destination across
//! procedures and may be *channelized* - duplicated per polyphonic
//! channel under an any-channel base that serves as template and default.
//!
//! Per audio cycle the network invokes every procedure's `exec` in the
//! deterministic order established at construction. Variable writes
//! broadcast depth-first to connected destinations before control returns
//! to the writer. Presets - named value sets or interpolated pairs of
//! value sets - reconfigure the network between cycles.
//!
//! # Aliasing model
//!
//! Cross-references between variables are `(procedure index, variable
//! index)` addresses, never long-lived borrows. A connected variable
//! resolves its value by following its source chain to the owning
//! variable's local slot, so "destination value aliases source value"
//! holds structurally rather than through raw pointers.

pub mod desc;
pub mod device;
pub mod net;
pub mod preset;
pub mod var;

pub use desc::{ClassDesc, ClassDict, ProcCtx, ProcImpl, VarDesc, VarFlags};
pub use device::{DeviceDecl, DeviceDir, DeviceKind, MidiSender};
pub use net::{Network, NetworkParams, VarListener};
pub use preset::{NetPreset, PresetEntry};
pub use var::{ANY_CH, Var, VarAddr};
