//! External-device declarations.
//!
//! A device is described to the network by a uniform record; procedures
//! consult these declarations at create time (an `audio_in` sizes its
//! buffer from the device geometry), and the runtime scheduler moves the
//! actual samples and messages.

use flujo_core::{ChMsg, Result};

/// The kind of an external device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Serial port.
    Serial,
    /// Socket endpoint.
    Socket,
    /// MIDI port.
    Midi,
    /// Audio interface.
    Audio,
}

/// Direction flags of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDir {
    /// The device produces data the network consumes.
    pub input: bool,
    /// The device consumes data the network produces.
    pub output: bool,
}

impl DeviceDir {
    /// Input-only.
    pub const IN: DeviceDir = DeviceDir {
        input: true,
        output: false,
    };
    /// Output-only.
    pub const OUT: DeviceDir = DeviceDir {
        input: false,
        output: true,
    };
    /// Bidirectional.
    pub const IN_OUT: DeviceDir = DeviceDir {
        input: true,
        output: true,
    };
}

/// Callback through which a `midi_out` procedure sends messages to a
/// device.
pub type MidiSender = Box<dyn FnMut(&ChMsg) -> Result<()> + Send>;

/// A uniform external-device declaration.
#[derive(Debug, Clone)]
pub struct DeviceDecl {
    /// Device label, unique per kind.
    pub label: String,
    /// Port label for MIDI devices.
    pub port_label: Option<String>,
    /// Device kind.
    pub kind: DeviceKind,
    /// Direction flags.
    pub dir: DeviceDir,
    /// Audio sample rate (audio devices).
    pub srate: f32,
    /// Audio channel count (audio devices).
    pub ch_n: usize,
    /// Audio frames per cycle (audio devices).
    pub frame_n: usize,
    /// Maximum MIDI messages per cycle (MIDI devices).
    pub max_msg_n: usize,
}

impl DeviceDecl {
    /// Declares an audio device.
    pub fn audio(label: &str, dir: DeviceDir, srate: f32, ch_n: usize, frame_n: usize) -> DeviceDecl {
        DeviceDecl {
            label: label.to_string(),
            port_label: None,
            kind: DeviceKind::Audio,
            dir,
            srate,
            ch_n,
            frame_n,
            max_msg_n: 0,
        }
    }

    /// Declares a MIDI device.
    pub fn midi(label: &str, port_label: &str, dir: DeviceDir, max_msg_n: usize) -> DeviceDecl {
        DeviceDecl {
            label: label.to_string(),
            port_label: Some(port_label.to_string()),
            kind: DeviceKind::Midi,
            dir,
            srate: 0.0,
            ch_n: 0,
            frame_n: 0,
            max_msg_n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_decl() {
        let d = DeviceDecl::audio("main", DeviceDir::IN, 48_000.0, 2, 64);
        assert_eq!(d.kind, DeviceKind::Audio);
        assert!(d.dir.input && !d.dir.output);
        assert_eq!((d.ch_n, d.frame_n), (2, 64));
    }

    #[test]
    fn test_midi_decl() {
        let d = DeviceDecl::midi("ctl", "port0", DeviceDir::IN_OUT, 128);
        assert_eq!(d.kind, DeviceKind::Midi);
        assert_eq!(d.port_label.as_deref(), Some("port0"));
        assert_eq!(d.max_msg_n, 128);
    }
}
