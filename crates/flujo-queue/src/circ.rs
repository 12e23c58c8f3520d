//! Multi-producer single-consumer circular record queue.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use flujo_core::{FlowError, Result};

/// One slot of the ring. `ready` is the publication flag: the producer
/// that reserved the slot stores the payload, then raises `ready` with
/// release ordering; the consumer lowers it before releasing the slot.
struct Slot<T> {
    ready: AtomicBool,
    val: UnsafeCell<MaybeUninit<T>>,
}

struct Inner<T> {
    slots: Box<[Slot<T>]>,
    index_mask: usize,
    cap: usize,
    /// Count of reserved-or-occupied slots. Admission control.
    res_cnt: AtomicUsize,
    /// Monotonic producer index; `& index_mask` selects the slot.
    head: AtomicUsize,
    /// Monotonic consumer index. Only the consumer advances it.
    tail: AtomicUsize,
}

// The queue moves T values across threads; the slot discipline guarantees
// each value is written by exactly one producer and read by the single
// consumer.
#[allow(unsafe_code)]
unsafe impl<T: Send> Send for Inner<T> {}
#[allow(unsafe_code)]
unsafe impl<T: Send> Sync for Inner<T> {}

/// Constructor namespace for the circular record queue.
pub struct CircQueue;

impl CircQueue {
    /// Builds a queue holding at least `cap` records (rounded up to the
    /// next power of two so index wrap is a bit mask) and splits it into
    /// a cloneable producer handle and the unique consumer handle.
    pub fn with_capacity<T: Send>(cap: usize) -> (CircProducer<T>, CircConsumer<T>) {
        let cap = cap.max(2).next_power_of_two();
        let slots = (0..cap)
            .map(|_| Slot {
                ready: AtomicBool::new(false),
                val: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let inner = Arc::new(Inner {
            slots,
            index_mask: cap - 1,
            cap,
            res_cnt: AtomicUsize::new(0),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        });

        (
            CircProducer {
                inner: Arc::clone(&inner),
            },
            CircConsumer { inner },
        )
    }
}

/// Cloneable producer side of a [`CircQueue`].
pub struct CircProducer<T: Send> {
    inner: Arc<Inner<T>>,
}

impl<T: Send> Clone for CircProducer<T> {
    fn clone(&self) -> Self {
        CircProducer {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send> CircProducer<T> {
    /// Pushes one record. Wait-free; fails with `BufTooSmall` when the
    /// queue holds `capacity` records and the consumer has not advanced.
    pub fn push(&self, v: T) -> Result<()> {
        let q = &*self.inner;

        // Reserve a slot. The acquire pairs with the consumer's release
        // fetch-sub, so the reserved slot's `ready = false` is visible.
        if q.res_cnt.fetch_add(1, Ordering::Acquire) >= q.cap {
            q.res_cnt.fetch_sub(1, Ordering::Release);
            return Err(FlowError::BufTooSmall(format!(
                "record queue full ({} slots)",
                q.cap
            )));
        }

        let idx = q.head.fetch_add(1, Ordering::Acquire) & q.index_mask;
        let slot = &q.slots[idx];
        debug_assert!(!slot.ready.load(Ordering::Relaxed));

        #[allow(unsafe_code)]
        // Safety: the reservation admitted us, so this slot is neither
        // owned by another producer nor still readable by the consumer.
        unsafe {
            (*slot.val.get()).write(v);
        }

        // Publish.
        slot.ready.store(true, Ordering::Release);
        Ok(())
    }

    /// The slot capacity (power of two).
    pub fn capacity(&self) -> usize {
        self.inner.cap
    }
}

/// Unique consumer side of a [`CircQueue`].
pub struct CircConsumer<T: Send> {
    inner: Arc<Inner<T>>,
}

impl<T: Send> CircConsumer<T> {
    /// Pops the oldest record. Fails with `Eof` when no published record
    /// is waiting at the tail.
    pub fn pop(&mut self) -> Result<T> {
        let q = &*self.inner;
        let tail = q.tail.load(Ordering::Relaxed);
        let slot = &q.slots[tail & q.index_mask];

        // Acquire pairs with the producer's release publication store.
        if !slot.ready.load(Ordering::Acquire) {
            return Err(FlowError::Eof);
        }

        #[allow(unsafe_code)]
        // Safety: `ready` was published for exactly this value, and only
        // this consumer reads slots.
        let v = unsafe { (*slot.val.get()).assume_init_read() };

        // Lower `ready` before the slot is handed back to producers.
        slot.ready.store(false, Ordering::Relaxed);
        q.tail.store(tail + 1, Ordering::Relaxed);
        q.res_cnt.fetch_sub(1, Ordering::Release);
        Ok(v)
    }

    /// Drains every currently published record into `out`; returns the
    /// count drained.
    pub fn drain_into(&mut self, out: &mut Vec<T>) -> usize {
        let mut n = 0;
        while let Ok(v) = self.pop() {
            out.push(v);
            n += 1;
        }
        n
    }

    /// The slot capacity (power of two).
    pub fn capacity(&self) -> usize {
        self.inner.cap
    }
}

impl<T: Send> Drop for CircConsumer<T> {
    fn drop(&mut self) {
        // Drop any records still in flight.
        while self.pop().is_ok() {}
    }
}
