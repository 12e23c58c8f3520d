//! Network-level tests of the built-in classes: constant/gain wiring,
//! oscillator-to-analyzer flow, and wavetable playback.

use std::path::PathBuf;

use flujo_net::{ANY_CH, Network};
use flujo_procs::builtin_dict;

fn build(cfg_text: &str) -> Network {
    let root = flujo_cfg::parse(cfg_text).unwrap();
    Network::from_cfg(std::sync::Arc::new(builtin_dict().unwrap()), &root, Vec::new()).unwrap()
}

#[test]
fn const_and_gain_wire_up() {
    let mut net = build(
        r#"
        main: {
          const: { class: const_float, out: 0.25 },
          gain:  { class: gain, k: 2.0, in: { in: "const.out" } },
        }
        "#,
    );
    net.exec_cycle().unwrap();

    let gain = net.proc_find("gain").unwrap();
    let out = net.var_find(gain, "out", 0, ANY_CH).unwrap();
    assert_eq!(net.get_float(out).unwrap(), 0.5);
}

#[test]
fn gain_class_preset_applies() {
    let mut net = build(
        r#"
        main: {
          const: { class: const_float, out: 0.25 },
          gain:  { class: gain, preset: mute, in: { in: "const.out" } },
        }
        "#,
    );
    net.exec_cycle().unwrap();

    let gain = net.proc_find("gain").unwrap();
    let out = net.var_find(gain, "out", 0, ANY_CH).unwrap();
    assert_eq!(net.get_float(out).unwrap(), 0.0);
}

#[test]
fn sine_into_dft_peaks_at_the_right_bin() {
    // 64 frames at 48 kHz puts bin spacing at 750 Hz; a 1500 Hz sine
    // must peak at bin 2.
    let mut net = build(
        r#"
        params: { frames_per_cycle: 64, srate: 48000.0 }
        main: {
          osc: { class: sine_osc, hz: 1500.0, gain: 1.0 },
          spec: { class: dft, in: { in: "osc.out" } },
        }
        "#,
    );

    net.exec_cycle().unwrap();
    net.exec_cycle().unwrap();

    let spec = net.proc_find("spec").unwrap();
    let out = net.var_find(spec, "out", 0, ANY_CH).unwrap();
    let fbuf = net.spect(out).unwrap();

    assert!(fbuf.ready(0));
    assert_eq!(fbuf.bin_n(0), 33);
    assert_eq!(fbuf.hz(0)[2], 1500.0);

    let mag = fbuf.mag(0);
    let peak = (0..mag.len())
        .max_by(|&a, &b| mag[a].total_cmp(&mag[b]))
        .unwrap();
    assert_eq!(peak, 2, "expected the 1500 Hz bin to dominate");
}

#[test]
fn sine_osc_output_is_bounded_and_periodic() {
    let mut net = build(
        r#"
        params: { frames_per_cycle: 48, srate: 48000.0 }
        main: {
          osc: { class: sine_osc, hz: 1000.0, gain: 0.5 },
        }
        "#,
    );
    net.exec_cycle().unwrap();

    let osc = net.proc_find("osc").unwrap();
    let out = net.var_find(osc, "out", 0, ANY_CH).unwrap();
    let abuf = net.abuf(out).unwrap();
    let samples = abuf.channel(0).unwrap();

    // 1 kHz at 48 kHz completes one period in exactly 48 samples.
    assert_eq!(samples[0], 0.0);
    assert!(samples.iter().all(|s| s.abs() <= 0.5 + 1e-6));
    let quarter = samples[12];
    assert!((quarter - 0.5).abs() < 1e-3, "sin peak, got {quarter}");
}

#[test]
fn number_relays_through_the_broadcast_chain() {
    let mut net = build(
        r#"
        main: {
          level: { class: const_float, out: 0.25 },
          relay: { class: number, in: { in: "level.out" } },
        }
        "#,
    );

    let level = net.proc_find("level").unwrap();
    let relay = net.proc_find("relay").unwrap();
    let src = net.var_find(level, "out", 0, ANY_CH).unwrap();
    let out = net.var_find(relay, "out", 0, ANY_CH).unwrap();

    // No cycle needed: the broadcast reaches the relay's value callback,
    // which re-emits on its own output.
    net.var_set(src, &flujo_core::Value::Float(0.75)).unwrap();
    assert_eq!(net.get_double(out).unwrap(), 0.75);
}

#[test]
fn mixer_weights_and_split_selects_channels() {
    let mut net = build(
        r#"
        params: { frames_per_cycle: 32, srate: 48000.0 }
        main: {
          a:     { class: sine_osc, hz: 750.0, gain: 0.5, args: { channels: 2 } },
          b:     { class: sine_osc, hz: 1500.0, gain: 0.25, args: { channels: 2 } },
          mix:   { class: audio_mix, g0: 1.0, g1: 2.0,
                   in: { in0: "a.out", in1: "b.out" } },
          right: { class: audio_split, args: { ch_idx: 1, ch_n: 1 },
                   in: { in: "a.out" } },
        }
        "#,
    );

    net.exec_cycle().unwrap();

    let read = |net: &Network, proc: &str| -> Vec<f32> {
        let p = net.proc_find(proc).unwrap();
        let addr = net.var_find(p, "out", 0, ANY_CH).unwrap();
        net.abuf(addr).unwrap().channel(0).unwrap().to_vec()
    };
    let a = read(&net, "a");
    let b = read(&net, "b");
    let mixed = read(&net, "mix");
    for i in 0..32 {
        let want = a[i] + 2.0 * b[i];
        assert!((mixed[i] - want).abs() < 1e-6, "mix frame {i}");
    }

    // The split copied the source's channel 1 (identical to channel 0
    // for this generator).
    let right = read(&net, "right");
    assert_eq!(right, a);

    let split = net.proc_find("right").unwrap();
    let out = net.var_find(split, "out", 0, ANY_CH).unwrap();
    assert_eq!(net.abuf(out).unwrap().ch_n(), 1);
}

// --- Wavetable playback ---

fn write_bank(dir: &std::path::Path) -> PathBuf {
    let wav = dir.join("ramp.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48_000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&wav, spec).unwrap();
    for i in 0..32 {
        writer.write_sample(i as f32).unwrap();
    }
    writer.finalize().unwrap();

    let json_path = dir.join("instr.json");
    let json = r#"{
        "instruments": [{
            "label": "ramp",
            "pitches": [{
                "midi_pitch": 60,
                "audio_fname": "ramp.wav",
                "velocities": [{
                    "velocity": 64,
                    "channels": [{
                        "wavetables": [
                            { "one_shot": true, "posn_smp_idx": 0,
                              "loop_smp_n": 16, "fund_hz": 261.6 },
                            { "posn_smp_idx": 16, "loop_smp_n": 8,
                              "fund_hz": 261.6 }
                        ]
                    }]
                }]
            }]
        }]
    }"#;
    std::fs::write(&json_path, json).unwrap();
    json_path
}

#[test]
fn wt_osc_plays_attack_then_loops() {
    let dir = tempfile::tempdir().unwrap();
    let instr = write_bank(dir.path());

    let cfg = format!(
        r#"
        params: {{ frames_per_cycle: 32, srate: 48000.0 }}
        main: {{
          osc: {{ class: wt_osc,
                 args: {{ instr: "{}", instr_label: ramp, pitch: 60 }} }},
        }}
        "#,
        instr.display()
    );
    let mut net = build(&cfg);
    net.exec_cycle().unwrap();

    let osc = net.proc_find("osc").unwrap();
    let out = net.var_find(osc, "out", 0, ANY_CH).unwrap();
    let samples = net.abuf(out).unwrap().channel(0).unwrap().to_vec();

    // Attack table: source samples 0..16, played once.
    for i in 0..16 {
        assert_eq!(samples[i], i as f32, "attack frame {i}");
    }
    // Loop table: source samples 16..24, repeating.
    for i in 16..32 {
        let want = 16.0 + ((i - 16) % 8) as f32;
        assert_eq!(samples[i], want, "loop frame {i}");
    }

    // The next cycle keeps looping; the attack never replays.
    net.exec_cycle().unwrap();
    let samples = net.abuf(out).unwrap().channel(0).unwrap().to_vec();
    for (i, s) in samples.iter().enumerate() {
        let want = 16.0 + ((i) % 8) as f32;
        assert_eq!(*s, want, "second cycle frame {i}");
    }
}

#[test]
fn wt_osc_rejects_unsampled_pitch_assignment() {
    let dir = tempfile::tempdir().unwrap();
    let instr = write_bank(dir.path());

    let cfg = format!(
        r#"
        main: {{
          osc: {{ class: wt_osc,
                 args: {{ instr: "{}", instr_label: ramp, pitch: 60 }} }},
        }}
        "#,
        instr.display()
    );
    let mut net = build(&cfg);

    let osc = net.proc_find("osc").unwrap();
    let pitch = net.var_find(osc, "pitch", 0, ANY_CH).unwrap();

    // Pitch 61 is not sampled: the value callback rejects and the
    // assignment rolls back.
    assert!(net
        .var_set(pitch, &flujo_core::Value::UInt(61))
        .is_err());
    assert_eq!(net.get_uint(pitch).unwrap(), 60);
}
