//! Type-flag bitmask for values and variable descriptors.
//!
//! A variable descriptor declares the set of types a variable may carry
//! as a union of flags; a [`Value`](crate::Value) carries exactly one.
//! The `RUNTIME` flag is a sentinel meaning "type deferred until first
//! assignment".

use std::fmt;

/// Bitmask over the value type kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeFl(u32);

impl TypeFl {
    /// The empty set / invalid type.
    pub const NONE: TypeFl = TypeFl(0);
    /// Boolean scalar.
    pub const BOOL: TypeFl = TypeFl(0x0001);
    /// Unsigned integer scalar.
    pub const UINT: TypeFl = TypeFl(0x0002);
    /// Signed integer scalar.
    pub const INT: TypeFl = TypeFl(0x0004);
    /// Single-precision scalar.
    pub const FLOAT: TypeFl = TypeFl(0x0008);
    /// Double-precision scalar.
    pub const DOUBLE: TypeFl = TypeFl(0x0010);
    /// Owned string.
    pub const STRING: TypeFl = TypeFl(0x0020);
    /// Shared configuration-tree reference.
    pub const CFG: TypeFl = TypeFl(0x0040);
    /// Audio buffer.
    pub const AUDIO: TypeFl = TypeFl(0x0080);
    /// Spectrum buffer.
    pub const SPECTRUM: TypeFl = TypeFl(0x0100);
    /// MIDI message buffer.
    pub const MIDI: TypeFl = TypeFl(0x0200);
    /// Sentinel: the concrete type is fixed at first assignment.
    pub const RUNTIME: TypeFl = TypeFl(0x8000);

    /// The numeric scalar kinds.
    pub const NUMERIC: TypeFl = TypeFl(0x0001 | 0x0002 | 0x0004 | 0x0008 | 0x0010);
    /// Every concrete kind (excludes `RUNTIME`).
    pub const ALL: TypeFl = TypeFl(0x03ff);

    /// Builds a flag set from raw bits.
    pub const fn from_bits(bits: u32) -> TypeFl {
        TypeFl(bits)
    }

    /// The raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if the set is empty.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if exactly one concrete type bit is set.
    pub const fn is_single(self) -> bool {
        let concrete = self.0 & Self::ALL.0;
        concrete != 0 && concrete & (concrete - 1) == 0
    }

    /// True if every bit of `other` is present in `self`.
    pub const fn contains(self, other: TypeFl) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if the runtime sentinel is present.
    pub const fn is_runtime(self) -> bool {
        self.0 & Self::RUNTIME.0 != 0
    }

    /// Set intersection.
    #[must_use]
    pub const fn intersect(self, other: TypeFl) -> TypeFl {
        TypeFl(self.0 & other.0)
    }

    /// Set union.
    #[must_use]
    pub const fn union(self, other: TypeFl) -> TypeFl {
        TypeFl(self.0 | other.0)
    }

    /// The lowest concrete type bit of the set, or `NONE`.
    #[must_use]
    pub const fn first(self) -> TypeFl {
        let concrete = self.0 & Self::ALL.0;
        if concrete == 0 {
            TypeFl::NONE
        } else {
            TypeFl(concrete & concrete.wrapping_neg())
        }
    }

    /// Parses a type label from configuration text.
    ///
    /// Accepts the concrete kind names, the unions `numeric` and `all`,
    /// the `runtime` sentinel, and the DSP aliases (`srate`, `sample`,
    /// `coeff` for float; `ftime` for double).
    pub fn from_label(label: &str) -> Option<TypeFl> {
        let fl = match label {
            "bool" => Self::BOOL,
            "uint" => Self::UINT,
            "int" => Self::INT,
            "float" | "srate" | "sample" | "coeff" => Self::FLOAT,
            "double" | "ftime" => Self::DOUBLE,
            "string" => Self::STRING,
            "cfg" => Self::CFG,
            "audio" => Self::AUDIO,
            "spectrum" => Self::SPECTRUM,
            "midi" => Self::MIDI,
            "numeric" => Self::NUMERIC,
            "all" => Self::ALL,
            "runtime" => Self::RUNTIME,
            _ => return None,
        };
        Some(fl)
    }

    /// Label of a single-bit flag, `"<multi>"` for unions, `"<none>"` for empty.
    pub fn label(self) -> &'static str {
        match self {
            Self::BOOL => "bool",
            Self::UINT => "uint",
            Self::INT => "int",
            Self::FLOAT => "float",
            Self::DOUBLE => "double",
            Self::STRING => "string",
            Self::CFG => "cfg",
            Self::AUDIO => "audio",
            Self::SPECTRUM => "spectrum",
            Self::MIDI => "midi",
            Self::RUNTIME => "runtime",
            Self::NONE => "<none>",
            _ => "<multi>",
        }
    }
}

impl fmt::Debug for TypeFl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "<none>");
        }
        let mut first = true;
        for bit in 0..=15 {
            let fl = TypeFl(1 << bit);
            if self.contains(fl) && fl.label() != "<multi>" && fl.label() != "<none>" {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{}", fl.label())?;
                first = false;
            }
        }
        Ok(())
    }
}
