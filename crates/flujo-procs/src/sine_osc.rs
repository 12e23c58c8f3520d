//! `sine_osc`: phase-accumulating sine generator.

use std::f64::consts::TAU;

use flujo_cfg::Obj;
use flujo_core::{Result, TypeFl};
use flujo_net::{ANY_CH, ClassDesc, ProcCtx, ProcImpl, VarDesc};

/// vid of `hz`.
pub const HZ: u32 = 0;
/// vid of `gain`.
pub const GAIN: u32 = 1;
/// vid of `out`.
pub const OUT: u32 = 2;

struct SineOsc {
    phase: f64,
}

impl ProcImpl for SineOsc {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        ctx.register("hz", HZ, ANY_CH, None)?;
        ctx.register("gain", GAIN, ANY_CH, None)?;

        let ch_n = match ctx.arg_cfg() {
            Some(args) => match args.member("channels") {
                Some(v) => v.as_u64()? as usize,
                None => 1,
            },
            None => 1,
        };
        let srate = ctx.srate();
        let frame_n = ctx.frames_per_cycle();
        ctx.register_audio("out", OUT, ANY_CH, srate, ch_n, frame_n)?;
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        let hz = ctx.get_double(HZ, ANY_CH)?;
        let gain = f64::from(ctx.get_float(GAIN, ANY_CH)?);
        let srate = f64::from(ctx.srate());
        let step = TAU * hz / srate;

        let start_phase = self.phase;
        let abuf = ctx.abuf_mut(OUT, ANY_CH)?;
        let (ch_n, frame_n) = (abuf.ch_n(), abuf.frame_n());
        for ch in 0..ch_n {
            let mut phase = start_phase;
            let samples = abuf.channel_mut(ch)?;
            for s in samples.iter_mut().take(frame_n) {
                *s = (phase.sin() * gain) as f32;
                phase += step;
            }
        }
        self.phase = (start_phase + step * frame_n as f64) % TAU;
        Ok(())
    }
}

/// The `sine_osc` class descriptor.
pub fn class_desc() -> ClassDesc {
    ClassDesc::new("sine_osc", || Box::new(SineOsc { phase: 0.0 }))
        .var(
            VarDesc::new("hz", TypeFl::DOUBLE)
                .default(Obj::double(440.0))
                .doc("oscillator frequency"),
        )
        .var(
            VarDesc::new("gain", TypeFl::FLOAT)
                .default(Obj::double(0.3))
                .doc("linear output level"),
        )
        .var(VarDesc::new("out", TypeFl::AUDIO).doc("generated signal"))
        .preset("beep", Obj::dict(vec![
            ("hz", Obj::double(880.0)),
            ("gain", Obj::double(0.25)),
        ]))
}
