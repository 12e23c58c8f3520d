//! On-disk instrument description (serde model).

use serde::Deserialize;

/// Root of an instrument description file.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrFile {
    /// The instruments in the file.
    pub instruments: Vec<InstrRec>,
}

/// One instrument: a set of sampled pitches.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrRec {
    /// Instrument label.
    pub label: String,
    /// Sampled pitches.
    pub pitches: Vec<PitchRec>,
}

/// One sampled MIDI pitch with its source audio file.
#[derive(Debug, Clone, Deserialize)]
pub struct PitchRec {
    /// MIDI pitch number, 0-127.
    pub midi_pitch: u8,
    /// WAV file holding the sample data, relative to the description
    /// file.
    pub audio_fname: String,
    /// Sampled velocity layers, ascending.
    pub velocities: Vec<VelRec>,
}

/// One velocity layer.
#[derive(Debug, Clone, Deserialize)]
pub struct VelRec {
    /// MIDI velocity this layer was sampled at, 1-127.
    pub velocity: u8,
    /// Per-audio-channel wavetable sequences.
    pub channels: Vec<ChanRec>,
}

/// The wavetable list of one audio channel.
#[derive(Debug, Clone, Deserialize)]
pub struct ChanRec {
    /// Ordered wavetables; the first is the attack, the rest loop.
    pub wavetables: Vec<WtRec>,
}

/// One wavetable's source position and metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct WtRec {
    /// True for the attack (one-shot) table.
    #[serde(default)]
    pub one_shot: bool,
    /// Sample index in the source file where the table begins.
    pub posn_smp_idx: usize,
    /// Samples in the loop body.
    pub loop_smp_n: usize,
    /// Fundamental frequency of the table, Hz.
    pub fund_hz: f32,
    /// RMS level of the table body.
    #[serde(default)]
    pub rms: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal() {
        let json = r#"{
            "instruments": [{
                "label": "piano",
                "pitches": [{
                    "midi_pitch": 60,
                    "audio_fname": "c4.wav",
                    "velocities": [{
                        "velocity": 64,
                        "channels": [{
                            "wavetables": [
                                { "one_shot": true, "posn_smp_idx": 0,
                                  "loop_smp_n": 32, "fund_hz": 261.6 },
                                { "posn_smp_idx": 32, "loop_smp_n": 16,
                                  "fund_hz": 261.6, "rms": 0.5 }
                            ]
                        }]
                    }]
                }]
            }]
        }"#;
        let f: InstrFile = serde_json::from_str(json).unwrap();
        assert_eq!(f.instruments.len(), 1);
        let wt = &f.instruments[0].pitches[0].velocities[0].channels[0].wavetables;
        assert!(wt[0].one_shot);
        assert!(!wt[1].one_shot);
        assert_eq!(wt[1].rms, 0.5);
    }
}
