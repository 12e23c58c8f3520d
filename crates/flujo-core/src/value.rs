//! The tagged value union and its coercion rules.

use std::sync::Arc;

use flujo_cfg::{Obj, Scalar};

use crate::abuf::AudioBuf;
use crate::error::{FlowError, Result};
use crate::fbuf::SpectBuf;
use crate::mbuf::MidiBuf;
use crate::tflag::TypeFl;

/// A dynamically typed value carried by a variable.
///
/// Scalar kinds coerce among each other along the numeric promotion
/// lattice; buffer kinds never coerce. Replacing a value of a different
/// kind drops the previous payload (strings and buffers release their
/// storage).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value assigned yet.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Unsigned integer scalar.
    UInt(u32),
    /// Signed integer scalar.
    Int(i32),
    /// Single-precision scalar.
    Float(f32),
    /// Double-precision scalar.
    Double(f64),
    /// Owned string.
    String(String),
    /// Shared reference into an externally owned configuration tree.
    Cfg(Arc<Obj>),
    /// Audio buffer.
    Audio(AudioBuf),
    /// Spectrum buffer.
    Spectrum(SpectBuf),
    /// MIDI message buffer.
    Midi(MidiBuf),
}

impl Value {
    /// The type flag of the active kind (`NONE` for `Null`).
    pub fn type_fl(&self) -> TypeFl {
        match self {
            Value::Null => TypeFl::NONE,
            Value::Bool(_) => TypeFl::BOOL,
            Value::UInt(_) => TypeFl::UINT,
            Value::Int(_) => TypeFl::INT,
            Value::Float(_) => TypeFl::FLOAT,
            Value::Double(_) => TypeFl::DOUBLE,
            Value::String(_) => TypeFl::STRING,
            Value::Cfg(_) => TypeFl::CFG,
            Value::Audio(_) => TypeFl::AUDIO,
            Value::Spectrum(_) => TypeFl::SPECTRUM,
            Value::Midi(_) => TypeFl::MIDI,
        }
    }

    /// True for any numeric scalar kind (bool included).
    pub fn is_numeric(&self) -> bool {
        TypeFl::NUMERIC.contains(self.type_fl())
    }

    /// Builds a value from a configuration leaf.
    ///
    /// Scalar leaves map to the matching scalar kinds; containers become
    /// `Cfg` references (a shared handle, never a deep copy).
    pub fn from_cfg(obj: &Arc<Obj>) -> Value {
        match &**obj {
            Obj::Scalar(Scalar::Bool(v)) => Value::Bool(*v),
            Obj::Scalar(Scalar::Int(v)) => Value::Int(*v as i32),
            Obj::Scalar(Scalar::UInt(v)) => Value::UInt(*v as u32),
            Obj::Scalar(Scalar::Float(v)) => Value::Float(*v),
            Obj::Scalar(Scalar::Double(v)) => Value::Double(*v),
            Obj::Scalar(Scalar::Str(v)) => Value::String(v.clone()),
            Obj::Dict(_) | Obj::List(_) => Value::Cfg(Arc::clone(obj)),
        }
    }

    /// Coerces this value to the single concrete type `dst`.
    ///
    /// Numeric narrowing is performed by static cast; `bool` converts to
    /// and from the integer kinds as `!=0` / `0|1`. Buffer kinds and
    /// `Cfg` only "coerce" to themselves. Everything else fails with
    /// `TypeMismatch`.
    pub fn coerce_to(&self, dst: TypeFl) -> Result<Value> {
        if self.type_fl() == dst {
            return Ok(self.clone());
        }

        let fail = || {
            FlowError::TypeMismatch(format!(
                "cannot convert {:?} to {:?}",
                self.type_fl(),
                dst
            ))
        };

        if self.is_numeric() {
            let d = match self {
                Value::Bool(v) => f64::from(u8::from(*v)),
                Value::UInt(v) => f64::from(*v),
                Value::Int(v) => f64::from(*v),
                Value::Float(v) => f64::from(*v),
                Value::Double(v) => *v,
                _ => unreachable!(),
            };
            return match dst {
                TypeFl::BOOL => Ok(Value::Bool(d != 0.0)),
                TypeFl::UINT => Ok(Value::UInt(d as u32)),
                TypeFl::INT => Ok(Value::Int(d as i32)),
                TypeFl::FLOAT => Ok(Value::Float(d as f32)),
                TypeFl::DOUBLE => Ok(Value::Double(d)),
                _ => Err(fail()),
            };
        }

        Err(fail())
    }

    // --- Typed reads (numeric kinds coerce on read) ---

    /// Reads as `bool`.
    pub fn as_bool(&self) -> Result<bool> {
        match self.coerce_to(TypeFl::BOOL)? {
            Value::Bool(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    /// Reads as `u32`.
    pub fn as_uint(&self) -> Result<u32> {
        match self.coerce_to(TypeFl::UINT)? {
            Value::UInt(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    /// Reads as `i32`.
    pub fn as_int(&self) -> Result<i32> {
        match self.coerce_to(TypeFl::INT)? {
            Value::Int(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    /// Reads as `f32`.
    pub fn as_float(&self) -> Result<f32> {
        match self.coerce_to(TypeFl::FLOAT)? {
            Value::Float(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    /// Reads as `f64`.
    pub fn as_double(&self) -> Result<f64> {
        match self.coerce_to(TypeFl::DOUBLE)? {
            Value::Double(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    /// Reads as a string slice.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s.as_str()),
            other => Err(FlowError::TypeMismatch(format!(
                "expected string, found {:?}",
                other.type_fl()
            ))),
        }
    }

    /// Reads as a configuration reference.
    pub fn as_cfg(&self) -> Result<&Arc<Obj>> {
        match self {
            Value::Cfg(o) => Ok(o),
            other => Err(FlowError::TypeMismatch(format!(
                "expected cfg, found {:?}",
                other.type_fl()
            ))),
        }
    }

    /// Reads the audio buffer.
    pub fn as_audio(&self) -> Result<&AudioBuf> {
        match self {
            Value::Audio(b) => Ok(b),
            other => Err(FlowError::TypeMismatch(format!(
                "expected audio, found {:?}",
                other.type_fl()
            ))),
        }
    }

    /// Mutable view of the audio buffer.
    pub fn as_audio_mut(&mut self) -> Result<&mut AudioBuf> {
        match self {
            Value::Audio(b) => Ok(b),
            other => Err(FlowError::TypeMismatch(format!(
                "expected audio, found {:?}",
                other.type_fl()
            ))),
        }
    }

    /// Reads the spectrum buffer.
    pub fn as_spectrum(&self) -> Result<&SpectBuf> {
        match self {
            Value::Spectrum(b) => Ok(b),
            other => Err(FlowError::TypeMismatch(format!(
                "expected spectrum, found {:?}",
                other.type_fl()
            ))),
        }
    }

    /// Mutable view of the spectrum buffer.
    pub fn as_spectrum_mut(&mut self) -> Result<&mut SpectBuf> {
        match self {
            Value::Spectrum(b) => Ok(b),
            other => Err(FlowError::TypeMismatch(format!(
                "expected spectrum, found {:?}",
                other.type_fl()
            ))),
        }
    }

    /// Reads the MIDI buffer.
    pub fn as_midi(&self) -> Result<&MidiBuf> {
        match self {
            Value::Midi(b) => Ok(b),
            other => Err(FlowError::TypeMismatch(format!(
                "expected midi, found {:?}",
                other.type_fl()
            ))),
        }
    }

    /// Mutable view of the MIDI buffer.
    pub fn as_midi_mut(&mut self) -> Result<&mut MidiBuf> {
        match self {
            Value::Midi(b) => Ok(b),
            other => Err(FlowError::TypeMismatch(format!(
                "expected midi, found {:?}",
                other.type_fl()
            ))),
        }
    }

    /// Linear interpolation `pri + coeff * (sec - pri)` for numeric
    /// kinds, evaluated per the primary's scalar type.
    ///
    /// Used by dual presets. Non-numeric primaries fail with
    /// `TypeMismatch`.
    pub fn interp(pri: &Value, sec: &Value, coeff: f64) -> Result<Value> {
        if !pri.is_numeric() || !sec.is_numeric() {
            return Err(FlowError::TypeMismatch(format!(
                "cannot interpolate {:?} with {:?}",
                pri.type_fl(),
                sec.type_fl()
            )));
        }
        let a = pri.as_double()?;
        let b = sec.as_double()?;
        let v = Value::Double(a + coeff * (b - a));
        v.coerce_to(pri.type_fl())
    }
}
