//! End-to-end bank loading from a WAV file plus instrument description.

use std::path::PathBuf;

use flujo_core::FlowError;
use flujo_wtb::WtBank;

/// Writes a stereo WAV whose left channel counts 0,1,2,... and whose
/// right channel counts 1000,1001,...
fn write_ramp_wav(dir: &std::path::Path, frames: usize) -> PathBuf {
    let path = dir.join("ramp.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 48_000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..frames {
        writer.write_sample(i as f32).unwrap();
        writer.write_sample(1000.0 + i as f32).unwrap();
    }
    writer.finalize().unwrap();
    path
}

fn write_instr_json(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("instr.json");
    let json = r#"{
        "instruments": [{
            "label": "ramp",
            "pitches": [{
                "midi_pitch": 60,
                "audio_fname": "ramp.wav",
                "velocities": [
                    { "velocity": 40, "channels": [
                        { "wavetables": [
                            { "one_shot": true, "posn_smp_idx": 0,
                              "loop_smp_n": 16, "fund_hz": 261.6 },
                            { "posn_smp_idx": 16, "loop_smp_n": 8,
                              "fund_hz": 261.6, "rms": 0.25 }
                        ]},
                        { "wavetables": [
                            { "posn_smp_idx": 0, "loop_smp_n": 8,
                              "fund_hz": 261.6 }
                        ]}
                    ]},
                    { "velocity": 100, "channels": [
                        { "wavetables": [
                            { "posn_smp_idx": 8, "loop_smp_n": 8,
                              "fund_hz": 261.6 }
                        ]}
                    ]}
                ]
            }]
        }]
    }"#;
    std::fs::write(&path, json).unwrap();
    path
}

#[test]
fn bank_loads_and_pads_hold() {
    let dir = tempfile::tempdir().unwrap();
    write_ramp_wav(dir.path(), 64);
    let instr = write_instr_json(dir.path());

    let bank = WtBank::create(2, &instr).unwrap();
    assert_eq!(bank.instr_n(), 1);
    assert_eq!(bank.instr_index("ramp").unwrap(), 0);
    assert!(matches!(
        bank.instr_index("missing"),
        Err(FlowError::EleNotFound(_))
    ));

    let entry = bank.lookup(0, 60, 40).unwrap();
    assert_eq!(entry.velocity, 40);
    assert_eq!(entry.chans.len(), 2);

    // Channel 0: attack table then one loop table.
    let seq = &entry.chans[0];
    let attack = seq.attack().unwrap();
    assert_eq!(attack.loop_smp_n, 16);
    assert_eq!(attack.body()[0], 0.0);

    let lp = seq.loops().next().unwrap();
    assert_eq!(lp.loop_smp_n, 8);
    // Left channel counts frames, so body = 16..24.
    assert_eq!(lp.body(), &[16.0, 17.0, 18.0, 19.0, 20.0, 21.0, 22.0, 23.0]);

    // Pad invariants: prefix equals the body tail, suffix the body head.
    let padded = lp.padded();
    assert_eq!(&padded[..2], &[22.0, 23.0]);
    assert_eq!(&padded[padded.len() - 2..], &[16.0, 17.0]);

    // Channel 1 reads the right channel of the WAV.
    let ch1 = entry.chans[1].tables.first().unwrap();
    assert_eq!(ch1.body()[0], 1000.0);
}

#[test]
fn every_velocity_resolves() {
    let dir = tempfile::tempdir().unwrap();
    write_ramp_wav(dir.path(), 64);
    let instr = write_instr_json(dir.path());
    let bank = WtBank::create(2, &instr).unwrap();

    // Layers at 40 and 100: midpoint 70 splits the range; no velocity
    // is unmapped.
    for v in 0..=127u8 {
        let entry = bank.lookup(0, 60, v).unwrap();
        let want = if v <= 70 { 40 } else { 100 };
        assert_eq!(entry.velocity, want, "velocity {v}");
    }
}

#[test]
fn unsampled_pitch_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_ramp_wav(dir.path(), 64);
    let instr = write_instr_json(dir.path());
    let bank = WtBank::create(2, &instr).unwrap();

    assert!(matches!(
        bank.lookup(0, 61, 64),
        Err(FlowError::EleNotFound(_))
    ));
    assert!(matches!(bank.lookup(1, 60, 64), Err(FlowError::InvalidId(_))));
}

#[test]
fn out_of_range_span_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    write_ramp_wav(dir.path(), 8);
    let instr = write_instr_json(dir.path());
    // The description asks for samples past frame 8.
    assert!(WtBank::create(2, &instr).is_err());
}
