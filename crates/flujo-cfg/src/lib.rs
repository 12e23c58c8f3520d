//! Structured-text configuration format for the flujo dataflow engine.
//!
//! A configuration file is a self-describing tree of dictionaries, lists,
//! and scalar leaves:
//!
//! ```text
//! main: {
//!   osc: { class: sine_osc, hz: 440.0, gain: 0.5f },
//!   out: { class: audio_out, in: { in: "osc.out" } },  // source reference
//! }
//! ```
//!
//! Scalars cover `bool`, signed integers, `u`-suffixed unsigned integers,
//! `0x` hex, `f`-suffixed single-precision floats, double-precision floats
//! (scientific notation accepted), and escaped strings. Line (`//`) and
//! block (`/* */`) comments are skipped by the lexer. Identifiers match
//! `[A-Za-z_][A-Za-z0-9_.]*`.
//!
//! The parsed tree is immutable and shared: every node is an [`Arc<Obj>`],
//! so consumers can hold non-owning references into a tree owned elsewhere.
//! [`to_text`](Obj::to_text) re-serializes a tree to text that parses back
//! to a structurally equal tree.

pub mod error;
pub mod obj;
pub mod parse;
pub mod token;

pub use error::CfgError;
pub use obj::{Obj, Scalar};
pub use parse::parse;
