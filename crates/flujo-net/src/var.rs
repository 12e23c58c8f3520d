//! Runtime variables: the typed, channel-indexed ports of a procedure.

use flujo_core::{TypeFl, Value};

/// Channel index meaning "the any-channel base variable".
///
/// Every `(label, sfx)` pair on a procedure owns exactly one variable
/// with this channel index; channelized variants hang off it in
/// ascending channel order.
pub const ANY_CH: usize = usize::MAX;

/// Capacity of the local-value ring.
///
/// Two slots let a `value` callback read the prior value while the
/// candidate sits in the other slot, and let a failed assignment roll
/// back by restoring the previous active index.
pub const LOCAL_VALUE_N: usize = 2;

/// Address of a variable: procedure index plus variable index.
///
/// Addresses are stable for the life of the network; variables are never
/// removed once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarAddr {
    /// Index of the owning procedure in network order.
    pub proc: usize,
    /// Index of the variable in the procedure's variable list.
    pub var: usize,
}

/// Where a variable's active value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRef {
    /// The active slot of this variable's own local ring.
    Local,
    /// Another variable's value. Set by `connect`; `disconnect` leaves
    /// the alias in place and the caller is expected to reassign.
    Alias(VarAddr),
}

/// A runtime variable instance.
///
/// Fields are crate-visible: all mutation flows through the network's
/// operations so the graph invariants hold after every public call.
#[derive(Debug)]
pub struct Var {
    /// Descriptor label.
    pub(crate) label: String,
    /// Suffix id distinguishing same-labelled variables on one procedure.
    pub(crate) label_sfx: u32,
    /// Dense numeric id; shared by the any-channel base and every
    /// channelized sibling.
    pub(crate) vid: u32,
    /// Channel index or [`ANY_CH`].
    pub(crate) ch: usize,
    /// Index of the backing descriptor in the class's descriptor list.
    pub(crate) desc_idx: usize,
    /// Concrete type once pinned; `NONE` before the first assignment.
    pub(crate) type_fl: TypeFl,
    /// The local-value ring.
    pub(crate) local: [Value; LOCAL_VALUE_N],
    /// Active slot of the ring.
    pub(crate) local_idx: usize,
    /// Where the active value lives.
    pub(crate) vref: ValueRef,
    /// The variable feeding this one, if connected.
    pub(crate) src: Option<VarAddr>,
    /// Variables fed by this one.
    pub(crate) dsts: Vec<VarAddr>,
    /// Next variable index in the `(label, sfx)` channel chain on the
    /// owning procedure; the any-channel base heads the chain.
    pub(crate) ch_link: Option<usize>,
}

impl Var {
    pub(crate) fn new(label: &str, label_sfx: u32, vid: u32, ch: usize, desc_idx: usize) -> Var {
        Var {
            label: label.to_string(),
            label_sfx,
            vid,
            ch,
            desc_idx,
            type_fl: TypeFl::NONE,
            local: [Value::Null, Value::Null],
            local_idx: 0,
            vref: ValueRef::Local,
            src: None,
            dsts: Vec::new(),
            ch_link: None,
        }
    }

    /// Descriptor label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Suffix id.
    pub fn label_sfx(&self) -> u32 {
        self.label_sfx
    }

    /// Numeric id.
    pub fn vid(&self) -> u32 {
        self.vid
    }

    /// Channel index or [`ANY_CH`].
    pub fn ch(&self) -> usize {
        self.ch
    }

    /// Concrete type, `NONE` before the first assignment.
    pub fn type_fl(&self) -> TypeFl {
        self.type_fl
    }

    /// The variable feeding this one, if connected.
    pub fn src(&self) -> Option<VarAddr> {
        self.src
    }

    /// Variables fed by this one.
    pub fn dsts(&self) -> &[VarAddr] {
        &self.dsts
    }

    /// True if this variable is connected to a source.
    pub fn is_connected(&self) -> bool {
        self.src.is_some()
    }

    /// True if the active value lives in this variable's own ring.
    pub fn is_local(&self) -> bool {
        matches!(self.vref, ValueRef::Local)
    }

    /// The active slot of the local ring (meaningful when
    /// [`is_local`](Self::is_local)).
    pub fn local_value(&self) -> &Value {
        &self.local[self.local_idx]
    }

    /// The previous slot of the local ring - the value a `value`
    /// callback can diff against while the candidate is active.
    pub fn prev_local_value(&self) -> &Value {
        &self.local[(self.local_idx + LOCAL_VALUE_N - 1) % LOCAL_VALUE_N]
    }

    /// Index of the next variable in this variable's channel chain on
    /// the owning procedure.
    pub fn ch_link(&self) -> Option<usize> {
        self.ch_link
    }
}
