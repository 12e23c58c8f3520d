//! The loaded, read-only wavetable store.

use std::path::Path;

use flujo_core::{FlowError, Result};
use tracing::debug;

use crate::instr::{InstrFile, WtRec};

/// One padded wavetable.
///
/// `samples` holds `pad + body + pad`: the prefix is a copy of the last
/// `pad_smp_n` body samples and the suffix a copy of the first
/// `pad_smp_n`, so a reader crossing the loop boundary interpolates
/// without a branch. Fixed at load time.
#[derive(Debug, Clone)]
pub struct WaveTable {
    /// Fundamental frequency of the table, Hz.
    pub fund_hz: f32,
    /// RMS level of the body.
    pub rms: f32,
    /// Sample rate of the source audio.
    pub srate: f32,
    /// Samples in the loop body.
    pub loop_smp_n: usize,
    /// Guard samples on each side.
    pub pad_smp_n: usize,
    /// Source sample index the table was cut from.
    pub posn_smp_idx: usize,
    /// True for the attack (one-shot) table.
    pub one_shot: bool,
    samples: Vec<f32>,
}

impl WaveTable {
    /// The loop body without pads.
    pub fn body(&self) -> &[f32] {
        &self.samples[self.pad_smp_n..self.pad_smp_n + self.loop_smp_n]
    }

    /// The padded sample array (`pad + body + pad`).
    pub fn padded(&self) -> &[f32] {
        &self.samples
    }

    /// Linear interpolation at a fractional body position.
    ///
    /// `pos` may reach `loop_smp_n` exactly; the suffix pad supplies the
    /// neighbouring sample.
    pub fn read(&self, pos: f32) -> f32 {
        debug_assert!(pos >= 0.0 && pos <= self.loop_smp_n as f32);
        let i = pos as usize;
        let frac = pos - i as f32;
        let a = self.samples[self.pad_smp_n + i];
        if frac == 0.0 {
            return a;
        }
        let b = self.samples[self.pad_smp_n + i + 1];
        a + frac * (b - a)
    }
}

/// One channel's table sequence: attack first, loops after.
#[derive(Debug, Clone)]
pub struct WtSeq {
    /// The tables, attack first.
    pub tables: Vec<WaveTable>,
}

impl WtSeq {
    /// The attack table, if the sequence has one.
    pub fn attack(&self) -> Option<&WaveTable> {
        self.tables.iter().find(|t| t.one_shot)
    }

    /// The loop tables in order.
    pub fn loops(&self) -> impl Iterator<Item = &WaveTable> {
        self.tables.iter().filter(|t| !t.one_shot)
    }
}

/// One velocity layer: a table sequence per audio channel.
#[derive(Debug, Clone)]
pub struct VelEntry {
    /// The sampled velocity.
    pub velocity: u8,
    /// Per-channel sequences.
    pub chans: Vec<WtSeq>,
}

struct Pitch {
    midi_pitch: u8,
    vels: Vec<VelEntry>,
    /// MIDI velocity -> index into `vels`, midpoint-filled.
    vel_map: [u8; 128],
}

struct Instr {
    label: String,
    pitches: Vec<Pitch>,
}

/// The read-only bank.
pub struct WtBank {
    pad_smp_n: usize,
    instrs: Vec<Instr>,
}

impl WtBank {
    /// Loads a bank from an instrument description file.
    ///
    /// WAV paths inside the description resolve relative to the
    /// description file's directory.
    pub fn create(pad_smp_n: usize, instr_fname: &Path) -> Result<WtBank> {
        let text = std::fs::read_to_string(instr_fname).map_err(|e| {
            FlowError::OpenFail(format!("instrument file '{}': {e}", instr_fname.display()))
        })?;
        let file: InstrFile = serde_json::from_str(&text).map_err(|e| FlowError::Syntax {
            line: e.line() as u32,
            col: e.column() as u32,
            msg: format!("instrument file '{}': {e}", instr_fname.display()),
        })?;

        let base_dir = instr_fname.parent().unwrap_or_else(|| Path::new("."));
        let mut instrs = Vec::with_capacity(file.instruments.len());

        for irec in &file.instruments {
            let mut pitches = Vec::with_capacity(irec.pitches.len());
            for prec in &irec.pitches {
                if prec.midi_pitch > 127 {
                    return Err(FlowError::InvalidArg(format!(
                        "invalid MIDI pitch {} in instrument '{}'",
                        prec.midi_pitch, irec.label
                    )));
                }

                let (chans_smp, srate) = read_wav(&base_dir.join(&prec.audio_fname))?;

                let mut vels = Vec::with_capacity(prec.velocities.len());
                for vrec in &prec.velocities {
                    if vrec.velocity == 0 || vrec.velocity > 127 {
                        return Err(FlowError::InvalidArg(format!(
                            "invalid velocity {} on pitch {}",
                            vrec.velocity, prec.midi_pitch
                        )));
                    }
                    let mut chans = Vec::with_capacity(vrec.channels.len());
                    for (ch_idx, crec) in vrec.channels.iter().enumerate() {
                        let ch_samples = chans_smp.get(ch_idx).ok_or_else(|| {
                            FlowError::InvalidArg(format!(
                                "channel {ch_idx} missing in '{}'",
                                prec.audio_fname
                            ))
                        })?;
                        let tables = crec
                            .wavetables
                            .iter()
                            .map(|w| build_table(w, ch_samples, srate, pad_smp_n))
                            .collect::<Result<Vec<_>>>()?;
                        chans.push(WtSeq { tables });
                    }
                    vels.push(VelEntry {
                        velocity: vrec.velocity,
                        chans,
                    });
                }

                if vels.is_empty() {
                    return Err(FlowError::InvalidArg(format!(
                        "pitch {} of '{}' carries no velocity layers",
                        prec.midi_pitch, irec.label
                    )));
                }
                vels.sort_by_key(|v| v.velocity);
                let vel_map = midpoint_vel_map(&vels);

                pitches.push(Pitch {
                    midi_pitch: prec.midi_pitch,
                    vels,
                    vel_map,
                });
            }
            debug!(instr = %irec.label, pitches = pitches.len(), "loaded instrument");
            instrs.push(Instr {
                label: irec.label.clone(),
                pitches,
            });
        }

        Ok(WtBank { pad_smp_n, instrs })
    }

    /// Guard-pad size of every table in the bank.
    pub fn pad_smp_n(&self) -> usize {
        self.pad_smp_n
    }

    /// Count of instruments.
    pub fn instr_n(&self) -> usize {
        self.instrs.len()
    }

    /// Index of an instrument by label.
    pub fn instr_index(&self, label: &str) -> Result<usize> {
        self.instrs
            .iter()
            .position(|i| i.label == label)
            .ok_or_else(|| FlowError::EleNotFound(format!("instrument '{label}'")))
    }

    /// Resolves `(instrument, pitch, velocity)` to a velocity layer.
    ///
    /// The pitch must be sampled; any velocity 0-127 resolves through
    /// the midpoint map.
    pub fn lookup(&self, instr_idx: usize, pitch: u8, vel: u8) -> Result<&VelEntry> {
        let instr = self
            .instrs
            .get(instr_idx)
            .ok_or_else(|| FlowError::InvalidId(format!("instrument index {instr_idx}")))?;
        if pitch > 127 || vel > 127 {
            return Err(FlowError::InvalidArg(format!(
                "pitch {pitch} / velocity {vel} out of MIDI range"
            )));
        }
        let p = instr
            .pitches
            .iter()
            .find(|p| p.midi_pitch == pitch)
            .ok_or_else(|| FlowError::EleNotFound(format!("MIDI pitch {pitch}")))?;
        Ok(&p.vels[p.vel_map[vel as usize] as usize])
    }
}

/// Builds a padded table by copying the body from the source channel and
/// mirroring its tail/head into the pads.
fn build_table(rec: &WtRec, src: &[f32], srate: f32, pad_smp_n: usize) -> Result<WaveTable> {
    let end = rec.posn_smp_idx + rec.loop_smp_n;
    if rec.loop_smp_n == 0 || end > src.len() {
        return Err(FlowError::InvalidArg(format!(
            "wavetable span {}..{end} is outside the {}-sample source",
            rec.posn_smp_idx,
            src.len()
        )));
    }
    if rec.loop_smp_n < pad_smp_n {
        return Err(FlowError::InvalidArg(format!(
            "loop body of {} samples is shorter than the {pad_smp_n}-sample pad",
            rec.loop_smp_n
        )));
    }

    let body = &src[rec.posn_smp_idx..end];
    let mut samples = Vec::with_capacity(rec.loop_smp_n + 2 * pad_smp_n);
    samples.extend_from_slice(&body[rec.loop_smp_n - pad_smp_n..]);
    samples.extend_from_slice(body);
    samples.extend_from_slice(&body[..pad_smp_n]);

    Ok(WaveTable {
        fund_hz: rec.fund_hz,
        rms: rec.rms,
        srate,
        loop_smp_n: rec.loop_smp_n,
        pad_smp_n,
        posn_smp_idx: rec.posn_smp_idx,
        one_shot: rec.one_shot,
        samples,
    })
}

/// Deinterleaves a WAV file into per-channel `f32` sample vectors.
fn read_wav(path: &Path) -> Result<(Vec<Vec<f32>>, f32)> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| FlowError::OpenFail(format!("'{}': {e}", path.display())))?;
    let spec = reader.spec();
    let ch_n = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| FlowError::ReadFail(format!("'{}': {e}", path.display())))?,
        hound::SampleFormat::Int => {
            let scale = f32::from(i16::MAX);
            reader
                .samples::<i16>()
                .map(|s| s.map(|v| f32::from(v) / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| FlowError::ReadFail(format!("'{}': {e}", path.display())))?
        }
    };

    let frame_n = interleaved.len() / ch_n;
    let mut chans = vec![Vec::with_capacity(frame_n); ch_n];
    for (i, s) in interleaved.iter().enumerate() {
        chans[i % ch_n].push(*s);
    }
    Ok((chans, spec.sample_rate as f32))
}

/// Maps every MIDI velocity to the nearest sampled layer by midpoint.
fn midpoint_vel_map(vels: &[VelEntry]) -> [u8; 128] {
    let mut map = [0u8; 128];
    for v in 0..128u8 {
        let mut chosen = 0usize;
        for (i, layer) in vels.iter().enumerate() {
            if i + 1 < vels.len() {
                let mid = (u16::from(layer.velocity) + u16::from(vels[i + 1].velocity)) / 2;
                if u16::from(v) > mid {
                    chosen = i + 1;
                    continue;
                }
            }
            break;
        }
        map[v as usize] = chosen as u8;
    }
    map
}
