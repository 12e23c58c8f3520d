//! Bounded MIDI channel-message storage.

use crate::error::{FlowError, Result};

/// One MIDI channel message with a high-resolution timestamp.
///
/// The timestamp is nanoseconds since an epoch fixed at engine start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChMsg {
    /// Status byte (upper nibble; e.g. `0x90` note-on).
    pub status: u8,
    /// MIDI channel, 0-15.
    pub ch: u8,
    /// First data byte.
    pub d0: u8,
    /// Second data byte.
    pub d1: u8,
    /// Nanoseconds since the engine epoch.
    pub time_ns: u64,
}

impl ChMsg {
    /// Note-on status byte.
    pub const NOTE_ON: u8 = 0x90;
    /// Note-off status byte.
    pub const NOTE_OFF: u8 = 0x80;
    /// Control-change status byte.
    pub const CTL_CHANGE: u8 = 0xb0;

    /// Builds a note-on message.
    pub fn note_on(ch: u8, pitch: u8, vel: u8, time_ns: u64) -> ChMsg {
        ChMsg {
            status: Self::NOTE_ON,
            ch,
            d0: pitch,
            d1: vel,
            time_ns,
        }
    }

    /// Builds a note-off message.
    pub fn note_off(ch: u8, pitch: u8, time_ns: u64) -> ChMsg {
        ChMsg {
            status: Self::NOTE_OFF,
            ch,
            d0: pitch,
            d1: 0,
            time_ns,
        }
    }

    /// True for a note-on with non-zero velocity.
    pub fn is_note_on(&self) -> bool {
        self.status == Self::NOTE_ON && self.d1 > 0
    }
}

/// A MIDI message buffer with a capacity fixed at creation.
///
/// The scheduler refills the buffer before each cycle and clears it
/// after; within a cycle, downstream procedures read the messages
/// through their connected variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiBuf {
    max_msg_n: usize,
    msgs: Vec<ChMsg>,
}

impl MidiBuf {
    /// Creates an empty buffer holding at most `max_msg_n` messages.
    pub fn new(max_msg_n: usize) -> MidiBuf {
        MidiBuf {
            max_msg_n,
            msgs: Vec::with_capacity(max_msg_n),
        }
    }

    /// Maximum message count.
    pub fn max_msg_n(&self) -> usize {
        self.max_msg_n
    }

    /// Current message count.
    pub fn len(&self) -> usize {
        self.msgs.len()
    }

    /// True if no messages are held.
    pub fn is_empty(&self) -> bool {
        self.msgs.is_empty()
    }

    /// The held messages in arrival order.
    pub fn msgs(&self) -> &[ChMsg] {
        &self.msgs
    }

    /// Appends one message.
    pub fn push(&mut self, msg: ChMsg) -> Result<()> {
        if self.msgs.len() >= self.max_msg_n {
            return Err(FlowError::BufTooSmall(format!(
                "midi buffer full ({} messages)",
                self.max_msg_n
            )));
        }
        self.msgs.push(msg);
        Ok(())
    }

    /// Replaces the contents with `msgs`.
    pub fn fill_from(&mut self, msgs: &[ChMsg]) -> Result<()> {
        if msgs.len() > self.max_msg_n {
            return Err(FlowError::BufTooSmall(format!(
                "{} messages exceed capacity {}",
                msgs.len(),
                self.max_msg_n
            )));
        }
        self.msgs.clear();
        self.msgs.extend_from_slice(msgs);
        Ok(())
    }

    /// Drops every held message.
    pub fn clear(&mut self) {
        self.msgs.clear();
    }
}
