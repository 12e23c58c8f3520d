//! Multi-threaded stress driver for the queues.
//!
//! Runs N producer threads against one consumer with pseudo-random
//! inter-push delays, then reports push counts and verifies that the
//! consumer observed every producer's records in order. Driven by the
//! `mt_queue` binary and the integration tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use flujo_cfg::Obj;
use flujo_core::{FlowError, Result};
use tracing::debug;

use crate::circ::CircQueue;

/// Stress-run parameters, typically read from a configuration file.
#[derive(Debug, Clone, Copy)]
pub struct StressParams {
    /// Producer thread count.
    pub producer_n: usize,
    /// Records each producer must successfully push.
    pub msg_per_producer: usize,
    /// Queue capacity (rounded up to a power of two).
    pub queue_cap: usize,
    /// Upper bound of the random spin delay between pushes.
    pub max_delay_spin: u32,
}

impl Default for StressParams {
    fn default() -> Self {
        StressParams {
            producer_n: 4,
            msg_per_producer: 10_000,
            queue_cap: 64,
            max_delay_spin: 64,
        }
    }
}

impl StressParams {
    /// Reads parameters from a cfg dictionary; absent fields keep their
    /// defaults.
    pub fn from_cfg(cfg: &Obj) -> Result<StressParams> {
        let mut p = StressParams::default();
        if let Some(v) = cfg.member("producer_n") {
            p.producer_n = v.as_u64()? as usize;
        }
        if let Some(v) = cfg.member("msg_per_producer") {
            p.msg_per_producer = v.as_u64()? as usize;
        }
        if let Some(v) = cfg.member("queue_cap") {
            p.queue_cap = v.as_u64()? as usize;
        }
        if let Some(v) = cfg.member("max_delay_spin") {
            p.max_delay_spin = v.as_u64()? as u32;
        }
        if p.producer_n == 0 || p.msg_per_producer == 0 {
            return Err(FlowError::InvalidArg(
                "producer_n and msg_per_producer must be non-zero".to_string(),
            ));
        }
        Ok(p)
    }
}

/// What a stress run observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressReport {
    /// Successful pushes across all producers.
    pub pushed_n: usize,
    /// Pushes that hit `BufTooSmall` and were retried.
    pub retry_n: usize,
    /// Records the consumer drained.
    pub popped_n: usize,
    /// True if every producer's records arrived in sequence order.
    pub fifo_ok: bool,
}

/// One queued record: producer id plus that producer's sequence number.
#[derive(Debug, Clone, Copy)]
struct Rec {
    producer: u32,
    seq: u32,
}

/// Small xorshift generator for per-producer jitter; deterministic per
/// seed so runs are reproducible.
struct XorShift(u32);

impl XorShift {
    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}

/// Runs the circular-queue stress scenario described by `params`.
///
/// Every producer pushes `msg_per_producer` records, retrying (and
/// counting) `BufTooSmall` rejections; the consumer drains until all
/// records arrived. The report's `fifo_ok` confirms per-producer
/// sequence order at the consumer.
pub fn run_stress(params: &StressParams) -> Result<StressReport> {
    let (tx, mut rx) = CircQueue::with_capacity::<Rec>(params.queue_cap);
    let total = params.producer_n * params.msg_per_producer;
    let done = AtomicBool::new(false);

    let mut retry_n = 0usize;
    let mut popped = Vec::with_capacity(total);
    let mut worker_panicked = false;

    thread::scope(|scope| {
        let mut workers = Vec::new();
        for producer in 0..params.producer_n {
            let tx = tx.clone();
            let done = &done;
            let p = *params;
            workers.push(scope.spawn(move || {
                let mut rng = XorShift(0x9e37_79b9 ^ (producer as u32 + 1));
                let mut retries = 0usize;
                for seq in 0..p.msg_per_producer as u32 {
                    loop {
                        if done.load(Ordering::Relaxed) {
                            return retries;
                        }
                        match tx.push(Rec {
                            producer: producer as u32,
                            seq,
                        }) {
                            Ok(()) => break,
                            Err(_) => {
                                retries += 1;
                                for _ in 0..(rng.next() % p.max_delay_spin.max(1)) {
                                    std::hint::spin_loop();
                                }
                                thread::yield_now();
                            }
                        }
                    }
                    for _ in 0..(rng.next() % p.max_delay_spin.max(1)) {
                        std::hint::spin_loop();
                    }
                }
                retries
            }));
        }

        // Single consumer drains on this thread.
        while popped.len() < total {
            match rx.pop() {
                Ok(rec) => popped.push(rec),
                Err(_) => thread::yield_now(),
            }
        }
        done.store(true, Ordering::Relaxed);

        for w in workers {
            match w.join() {
                Ok(retries) => retry_n += retries,
                Err(_) => worker_panicked = true,
            }
        }
    });

    if worker_panicked {
        return Err(FlowError::OpFail("a producer thread panicked".to_string()));
    }

    // Per-producer sequence order must be monotonic at the consumer.
    let mut last_seq = vec![None::<u32>; params.producer_n];
    let mut fifo_ok = true;
    for rec in &popped {
        let slot = &mut last_seq[rec.producer as usize];
        match slot {
            Some(prev) if rec.seq != *prev + 1 => fifo_ok = false,
            None if rec.seq != 0 => fifo_ok = false,
            _ => {}
        }
        *slot = Some(rec.seq);
    }

    debug!(
        pushed = total,
        retries = retry_n,
        fifo_ok,
        "stress run complete"
    );

    Ok(StressReport {
        pushed_n: total,
        retry_n,
        popped_n: popped.len(),
        fifo_ok,
    })
}
