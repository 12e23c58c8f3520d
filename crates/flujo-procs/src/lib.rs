//! Built-in procedure classes for the flujo dataflow framework.
//!
//! Each module provides one class (or one in/out pair): its variable
//! descriptors, lifecycle callbacks, and a `class_desc()` constructor.
//! [`builtin_dict`] registers them all into a fresh [`ClassDict`]:
//!
//! | Class | Role |
//! |---|---|
//! | `const_float` | Emits a configured constant |
//! | `number` | Numeric relay with change propagation |
//! | `counter` | Per-cycle counter, optional end-of-stream limit |
//! | `gain` | Per-channel numeric multiply |
//! | `sine_osc` | Phase-accumulating sine generator |
//! | `dft` | Hann-windowed forward FFT per channel |
//! | `wt_osc` | Wavetable-bank player |
//! | `audio_mix` | Weighted two-input audio mixer |
//! | `audio_split` | Channel-range extractor |
//! | `audio_in` / `audio_out` | External audio device endpoints |
//! | `midi_in` / `midi_out` | External MIDI device endpoints |

pub mod audio_io;
pub mod audio_mix;
pub mod audio_split;
pub mod const_val;
pub mod counter;
pub mod dft;
pub mod gain;
pub mod midi_io;
pub mod number;
pub mod sine_osc;
pub mod wt_osc;

use flujo_core::Result;
use flujo_net::ClassDict;

/// Builds a class dictionary holding every built-in class.
pub fn builtin_dict() -> Result<ClassDict> {
    let mut dict = ClassDict::new();
    dict.register(const_val::class_desc())?;
    dict.register(number::class_desc())?;
    dict.register(counter::class_desc())?;
    dict.register(gain::class_desc())?;
    dict.register(sine_osc::class_desc())?;
    dict.register(dft::class_desc())?;
    dict.register(wt_osc::class_desc())?;
    dict.register(audio_mix::class_desc())?;
    dict.register(audio_split::class_desc())?;
    dict.register(audio_io::audio_in_class_desc())?;
    dict.register(audio_io::audio_out_class_desc())?;
    dict.register(midi_io::midi_in_class_desc())?;
    dict.register(midi_io::midi_out_class_desc())?;
    Ok(dict)
}
