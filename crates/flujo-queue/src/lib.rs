//! Non-blocking multi-producer single-consumer queues.
//!
//! Two disciplines, both wait-free on the producer side with a
//! bounded-capacity failure mode instead of blocking:
//!
//! - [`CircQueue`] - a circular queue of typed records. Power-of-two
//!   capacity; a reservation counter admits a producer only when a slot
//!   is available; an atomic head index hands the producer its slot;
//!   publication is a release store; the single consumer drains with an
//!   acquire load and releases slots with a release fetch-sub.
//! - [`BlobQueue`] - a byte-blob queue over a fixed block pool. Producers
//!   copy opaque byte blobs into reserved blocks; the consumer peeks
//!   ([`BlobConsumer::next`]) and releases ([`BlobConsumer::advance`])
//!   in FIFO order.
//!
//! Overflow returns `BufTooSmall`; underflow returns `Eof`. These queues
//! are the only cross-thread communication permitted from a procedure's
//! `exec`: logging and UI traffic post here and dedicated consumer
//! threads drain.
//!
//! Queues are split at construction into a cloneable producer handle and
//! a unique consumer handle, so the single-consumer discipline is
//! enforced by ownership rather than by documentation.

pub mod blob;
pub mod circ;
pub mod tester;

pub use blob::{BlobConsumer, BlobProducer, BlobQueue};
pub use circ::{CircConsumer, CircProducer, CircQueue};
pub use tester::{StressParams, StressReport, run_stress};
