//! Device backends: the sample/message I/O side of the external-device
//! declarations.

use std::collections::VecDeque;
use std::io::BufWriter;
use std::path::Path;

use flujo_core::{AudioBuf, ChMsg, FlowError, Result};

/// An audio device backend, matched to a declaration by label.
pub trait AudioDevice: Send {
    /// The declaration label this backend serves.
    fn label(&self) -> &str;

    /// Fills `dst` with the next cycle of capture frames.
    ///
    /// Input devices only. `Eof` signals the end of a non-real-time
    /// stream.
    fn read(&mut self, dst: &mut AudioBuf) -> Result<()> {
        let _ = dst;
        Err(FlowError::NotImpl("device has no capture side".to_string()))
    }

    /// Consumes one cycle of playback frames.
    fn write(&mut self, src: &AudioBuf) -> Result<()> {
        let _ = src;
        Err(FlowError::NotImpl("device has no playback side".to_string()))
    }

    /// Flushes and releases the backend.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A MIDI device backend.
pub trait MidiDevice: Send {
    /// The declaration label this backend serves.
    fn label(&self) -> &str;

    /// Appends every message that arrived since the last call.
    fn recv(&mut self, out: &mut Vec<ChMsg>) -> Result<()>;

    /// Sends one message to the device.
    fn send(&mut self, msg: &ChMsg) -> Result<()>;
}

// --- Memory-backed audio ---

/// Memory-backed audio device: a preloaded capture stream and/or a
/// playback recording, both channel-major.
pub struct MemAudioDevice {
    label: String,
    ch_n: usize,
    frame_n: usize,
    /// Per-channel capture stream.
    capture: Vec<Vec<f32>>,
    cursor: usize,
    /// Per-channel playback recording.
    played: Vec<Vec<f32>>,
}

impl MemAudioDevice {
    /// An input device serving `capture` (one vector per channel, equal
    /// lengths).
    pub fn input(label: &str, frame_n: usize, capture: Vec<Vec<f32>>) -> MemAudioDevice {
        let ch_n = capture.len();
        MemAudioDevice {
            label: label.to_string(),
            ch_n,
            frame_n,
            capture,
            cursor: 0,
            played: Vec::new(),
        }
    }

    /// An output device recording whatever is played into it.
    pub fn output(label: &str, ch_n: usize, frame_n: usize) -> MemAudioDevice {
        MemAudioDevice {
            label: label.to_string(),
            ch_n,
            frame_n,
            capture: Vec::new(),
            cursor: 0,
            played: vec![Vec::new(); ch_n],
        }
    }

    /// The recorded playback, one vector per channel.
    pub fn played(&self) -> &[Vec<f32>] {
        &self.played
    }
}

impl AudioDevice for MemAudioDevice {
    fn label(&self) -> &str {
        &self.label
    }

    fn read(&mut self, dst: &mut AudioBuf) -> Result<()> {
        if self.capture.is_empty() {
            return Err(FlowError::NotImpl("output-only device".to_string()));
        }
        if dst.ch_n() != self.ch_n || dst.frame_n() != self.frame_n {
            return Err(FlowError::InvalidArg(format!(
                "buffer geometry {}x{} does not match device '{}' {}x{}",
                dst.ch_n(),
                dst.frame_n(),
                self.label,
                self.ch_n,
                self.frame_n
            )));
        }
        let stream_len = self.capture[0].len();
        if self.cursor >= stream_len {
            return Err(FlowError::Eof);
        }
        let take = self.frame_n.min(stream_len - self.cursor);
        for ch in 0..self.ch_n {
            let dst_ch = dst.channel_mut(ch)?;
            dst_ch.fill(0.0);
            dst_ch[..take].copy_from_slice(&self.capture[ch][self.cursor..self.cursor + take]);
        }
        self.cursor += take;
        Ok(())
    }

    fn write(&mut self, src: &AudioBuf) -> Result<()> {
        if self.played.is_empty() {
            return Err(FlowError::NotImpl("input-only device".to_string()));
        }
        if src.ch_n() != self.ch_n {
            return Err(FlowError::InvalidArg(format!(
                "channel count {} does not match device '{}' ({})",
                src.ch_n(),
                self.label,
                self.ch_n
            )));
        }
        for ch in 0..self.ch_n {
            self.played[ch].extend_from_slice(src.channel(ch)?);
        }
        Ok(())
    }
}

// --- Memory-backed MIDI ---

/// Memory-backed MIDI device: a pending-message queue and a sent-message
/// record.
pub struct MemMidiDevice {
    label: String,
    pending: VecDeque<ChMsg>,
    sent: Vec<ChMsg>,
}

impl MemMidiDevice {
    /// An empty device.
    pub fn new(label: &str) -> MemMidiDevice {
        MemMidiDevice {
            label: label.to_string(),
            pending: VecDeque::new(),
            sent: Vec::new(),
        }
    }

    /// Enqueues an incoming message; it is delivered to the network on
    /// the next cycle boundary.
    pub fn push_incoming(&mut self, msg: ChMsg) {
        self.pending.push_back(msg);
    }

    /// Every message the network sent through this device.
    pub fn sent(&self) -> &[ChMsg] {
        &self.sent
    }
}

impl MidiDevice for MemMidiDevice {
    fn label(&self) -> &str {
        &self.label
    }

    fn recv(&mut self, out: &mut Vec<ChMsg>) -> Result<()> {
        out.extend(self.pending.drain(..));
        Ok(())
    }

    fn send(&mut self, msg: &ChMsg) -> Result<()> {
        self.sent.push(*msg);
        Ok(())
    }
}

// --- WAV-backed audio ---

/// Non-real-time capture device streaming a PCM WAV file.
pub struct WavInDevice {
    label: String,
    chans: Vec<Vec<f32>>,
    cursor: usize,
}

impl WavInDevice {
    /// Opens a WAV file; the whole stream is deinterleaved up front.
    pub fn open(label: &str, path: &Path) -> Result<WavInDevice> {
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

        let mut chans = vec![Vec::with_capacity(interleaved.len() / ch_n); ch_n];
        for (i, s) in interleaved.iter().enumerate() {
            chans[i % ch_n].push(*s);
        }

        Ok(WavInDevice {
            label: label.to_string(),
            chans,
            cursor: 0,
        })
    }
}

impl AudioDevice for WavInDevice {
    fn label(&self) -> &str {
        &self.label
    }

    fn read(&mut self, dst: &mut AudioBuf) -> Result<()> {
        if dst.ch_n() != self.chans.len() {
            return Err(FlowError::InvalidArg(format!(
                "buffer channel count {} does not match '{}' ({})",
                dst.ch_n(),
                self.label,
                self.chans.len()
            )));
        }
        let stream_len = self.chans[0].len();
        if self.cursor >= stream_len {
            return Err(FlowError::Eof);
        }
        let frame_n = dst.frame_n();
        let take = frame_n.min(stream_len - self.cursor);
        for (ch, stream) in self.chans.iter().enumerate() {
            let dst_ch = dst.channel_mut(ch)?;
            dst_ch.fill(0.0);
            dst_ch[..take].copy_from_slice(&stream[self.cursor..self.cursor + take]);
        }
        self.cursor += take;
        Ok(())
    }
}

/// Non-real-time playback device writing a 32-bit float PCM WAV file.
pub struct WavOutDevice {
    label: String,
    writer: Option<hound::WavWriter<BufWriter<std::fs::File>>>,
}

impl WavOutDevice {
    /// Creates the output file.
    pub fn create(label: &str, path: &Path, srate: u32, ch_n: u16) -> Result<WavOutDevice> {
        let spec = hound::WavSpec {
            channels: ch_n,
            sample_rate: srate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let writer = hound::WavWriter::create(path, spec)
            .map_err(|e| FlowError::OpenFail(format!("'{}': {e}", path.display())))?;
        Ok(WavOutDevice {
            label: label.to_string(),
            writer: Some(writer),
        })
    }
}

impl AudioDevice for WavOutDevice {
    fn label(&self) -> &str {
        &self.label
    }

    fn write(&mut self, src: &AudioBuf) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(FlowError::InvalidState("device already closed".to_string()));
        };
        // Interleave the channel-major buffer for the file.
        for frame in 0..src.frame_n() {
            for ch in 0..src.ch_n() {
                writer
                    .write_sample(src.channel(ch)?[frame])
                    .map_err(|e| FlowError::WriteFail(e.to_string()))?;
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer
                .finalize()
                .map_err(|e| FlowError::WriteFail(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_input_streams_then_eof() {
        let mut dev = MemAudioDevice::input("mic", 4, vec![vec![1.0, 2.0, 3.0, 4.0, 5.0]]);
        let mut buf = AudioBuf::new(48_000.0, 1, 4);

        dev.read(&mut buf).unwrap();
        assert_eq!(buf.channel(0).unwrap(), &[1.0, 2.0, 3.0, 4.0]);

        // The short tail pads with zeros.
        dev.read(&mut buf).unwrap();
        assert_eq!(buf.channel(0).unwrap(), &[5.0, 0.0, 0.0, 0.0]);

        assert_eq!(dev.read(&mut buf).unwrap_err(), FlowError::Eof);
    }

    #[test]
    fn test_mem_output_records() {
        let mut dev = MemAudioDevice::output("spk", 2, 2);
        let mut buf = AudioBuf::new(48_000.0, 2, 2);
        buf.set_channel(0, &[1.0, 2.0]).unwrap();
        buf.set_channel(1, &[3.0, 4.0]).unwrap();
        dev.write(&buf).unwrap();
        dev.write(&buf).unwrap();
        assert_eq!(dev.played()[0], vec![1.0, 2.0, 1.0, 2.0]);
        assert_eq!(dev.played()[1], vec![3.0, 4.0, 3.0, 4.0]);
    }

    #[test]
    fn test_mem_midi_defers_and_records() {
        let mut dev = MemMidiDevice::new("ctl");
        dev.push_incoming(ChMsg::note_on(0, 60, 100, 10));

        let mut out = Vec::new();
        dev.recv(&mut out).unwrap();
        assert_eq!(out.len(), 1);

        // Drained messages do not reappear.
        let mut again = Vec::new();
        dev.recv(&mut again).unwrap();
        assert!(again.is_empty());

        dev.send(&ChMsg::note_off(0, 60, 20)).unwrap();
        assert_eq!(dev.sent().len(), 1);
    }

    #[test]
    fn test_geometry_mismatch_rejected() {
        let mut dev = MemAudioDevice::input("mic", 4, vec![vec![0.0; 8]]);
        let mut buf = AudioBuf::new(48_000.0, 2, 4);
        assert!(matches!(
            dev.read(&mut buf),
            Err(FlowError::InvalidArg(_))
        ));
    }
}
