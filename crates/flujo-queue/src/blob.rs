//! Multi-producer single-consumer byte-blob queue over a fixed block
//! pool.

use std::cell::UnsafeCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use flujo_core::{FlowError, Result};

/// One block of the pool. The producer that reserved the block copies
/// the blob bytes and its length, then publishes with a release store.
struct Block {
    ready: AtomicBool,
    len: UnsafeCell<usize>,
    buf: UnsafeCell<Box<[u8]>>,
}

struct Inner {
    blocks: Box<[Block]>,
    index_mask: usize,
    blk_n: usize,
    blk_byte_n: usize,
    res_cnt: AtomicUsize,
    head: AtomicUsize,
    tail: AtomicUsize,
}

#[allow(unsafe_code)]
unsafe impl Send for Inner {}
#[allow(unsafe_code)]
unsafe impl Sync for Inner {}

/// Constructor namespace for the byte-blob queue.
pub struct BlobQueue;

impl BlobQueue {
    /// Builds a pool of at least `blk_n` blocks of `blk_byte_n` bytes
    /// (block count rounded up to a power of two) and splits it into the
    /// producer and consumer handles.
    pub fn with_pool(blk_n: usize, blk_byte_n: usize) -> (BlobProducer, BlobConsumer) {
        let blk_n = blk_n.max(2).next_power_of_two();
        let blocks = (0..blk_n)
            .map(|_| Block {
                ready: AtomicBool::new(false),
                len: UnsafeCell::new(0),
                buf: UnsafeCell::new(vec![0u8; blk_byte_n].into_boxed_slice()),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let inner = Arc::new(Inner {
            blocks,
            index_mask: blk_n - 1,
            blk_n,
            blk_byte_n,
            res_cnt: AtomicUsize::new(0),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        });

        (
            BlobProducer {
                inner: Arc::clone(&inner),
            },
            BlobConsumer { inner },
        )
    }
}

/// Cloneable producer side of a [`BlobQueue`].
#[derive(Clone)]
pub struct BlobProducer {
    inner: Arc<Inner>,
}

impl BlobProducer {
    /// Copies `blob` into a reserved block. Wait-free; fails with
    /// `BufTooSmall` when the blob exceeds the block size or the pool is
    /// exhausted.
    pub fn push(&self, blob: &[u8]) -> Result<()> {
        let q = &*self.inner;

        if blob.len() > q.blk_byte_n {
            return Err(FlowError::BufTooSmall(format!(
                "blob of {} bytes exceeds the {}-byte block size",
                blob.len(),
                q.blk_byte_n
            )));
        }

        if q.res_cnt.fetch_add(1, Ordering::Acquire) >= q.blk_n {
            q.res_cnt.fetch_sub(1, Ordering::Release);
            return Err(FlowError::BufTooSmall(format!(
                "block pool exhausted ({} blocks)",
                q.blk_n
            )));
        }

        let idx = q.head.fetch_add(1, Ordering::Acquire) & q.index_mask;
        let block = &q.blocks[idx];
        debug_assert!(!block.ready.load(Ordering::Relaxed));

        #[allow(unsafe_code)]
        // Safety: the reservation admitted us, so no other producer owns
        // this block and the consumer has released it.
        unsafe {
            (&mut *block.buf.get())[..blob.len()].copy_from_slice(blob);
            *block.len.get() = blob.len();
        }

        block.ready.store(true, Ordering::Release);
        Ok(())
    }

    /// The block count of the pool (power of two).
    pub fn block_count(&self) -> usize {
        self.inner.blk_n
    }
}

/// Unique consumer side of a [`BlobQueue`].
pub struct BlobConsumer {
    inner: Arc<Inner>,
}

impl BlobConsumer {
    /// Peeks the oldest published blob without releasing its block.
    ///
    /// Returns `None` when nothing is waiting at the tail. The returned
    /// slice stays valid until [`advance`](Self::advance).
    pub fn next(&mut self) -> Option<&[u8]> {
        let q = &*self.inner;
        let tail = q.tail.load(Ordering::Relaxed);
        let block = &q.blocks[tail & q.index_mask];

        if !block.ready.load(Ordering::Acquire) {
            return None;
        }

        #[allow(unsafe_code)]
        // Safety: the block was published for this position and cannot be
        // re-reserved until `advance` lowers `ready` and releases it.
        unsafe {
            let len = *block.len.get();
            Some(&(&*block.buf.get())[..len])
        }
    }

    /// Releases the block peeked by [`next`](Self::next). Fails with
    /// `Eof` when the queue is empty.
    pub fn advance(&mut self) -> Result<()> {
        let q = &*self.inner;
        let tail = q.tail.load(Ordering::Relaxed);
        let block = &q.blocks[tail & q.index_mask];

        if !block.ready.load(Ordering::Acquire) {
            return Err(FlowError::Eof);
        }

        block.ready.store(false, Ordering::Relaxed);
        q.tail.store(tail + 1, Ordering::Relaxed);
        q.res_cnt.fetch_sub(1, Ordering::Release);
        Ok(())
    }

    /// Pops the oldest blob into an owned vector.
    pub fn pop(&mut self) -> Result<Vec<u8>> {
        let owned = self.next().map(<[u8]>::to_vec).ok_or(FlowError::Eof)?;
        self.advance()?;
        Ok(owned)
    }
}
