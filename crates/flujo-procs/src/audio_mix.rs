//! `audio_mix`: weighted two-input audio mixer.
//!
//! `out = g0 * in0 + g1 * in1`. The output buffer is allocated on the
//! first cycle from `in0`'s geometry; both inputs must match it.

use flujo_cfg::Obj;
use flujo_core::{FlowError, Result, TypeFl};
use flujo_net::{ANY_CH, ClassDesc, ProcCtx, ProcImpl, VarDesc, VarFlags};

/// vid of `in0`.
pub const IN0: u32 = 0;
/// vid of `in1`.
pub const IN1: u32 = 1;
/// vid of `g0`.
pub const G0: u32 = 2;
/// vid of `g1`.
pub const G1: u32 = 3;
/// vid of `out`.
pub const OUT: u32 = 4;

struct AudioMix {
    ready: bool,
    scratch: Vec<f32>,
}

impl ProcImpl for AudioMix {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        ctx.register("in0", IN0, ANY_CH, None)?;
        ctx.register("in1", IN1, ANY_CH, None)?;
        ctx.register("g0", G0, ANY_CH, None)?;
        ctx.register("g1", G1, ANY_CH, None)?;
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        let (srate, ch_n, frame_n) = {
            let a = ctx.abuf(IN0, ANY_CH)?;
            (a.srate(), a.ch_n(), a.frame_n())
        };
        if !self.ready {
            ctx.register_audio("out", OUT, ANY_CH, srate, ch_n, frame_n)?;
            self.ready = true;
        }

        let g0 = ctx.get_float(G0, ANY_CH)?;
        let g1 = ctx.get_float(G1, ANY_CH)?;

        // Stage the weighted sum, then copy into the owned buffer.
        self.scratch.resize(ch_n * frame_n, 0.0);
        {
            let a = ctx.abuf(IN0, ANY_CH)?;
            for (d, s) in self.scratch.iter_mut().zip(a.samples().iter()) {
                *d = g0 * *s;
            }
        }
        {
            let b = ctx.abuf(IN1, ANY_CH)?;
            if b.samples().len() != self.scratch.len() {
                return Err(FlowError::InvalidArg(format!(
                    "mixer inputs disagree on geometry ({} vs {} samples)",
                    b.samples().len(),
                    self.scratch.len()
                )));
            }
            for (d, s) in self.scratch.iter_mut().zip(b.samples().iter()) {
                *d += g1 * *s;
            }
        }

        let out = ctx.abuf_mut(OUT, ANY_CH)?;
        out.samples_mut().copy_from_slice(&self.scratch);
        Ok(())
    }
}

/// The `audio_mix` class descriptor.
pub fn class_desc() -> ClassDesc {
    ClassDesc::new("audio_mix", || {
        Box::new(AudioMix {
            ready: false,
            scratch: Vec::new(),
        })
    })
    .var(
        VarDesc::new("in0", TypeFl::AUDIO)
            .flags(VarFlags::SRC)
            .doc("first input"),
    )
    .var(
        VarDesc::new("in1", TypeFl::AUDIO)
            .flags(VarFlags::SRC)
            .doc("second input"),
    )
    .var(
        VarDesc::new("g0", TypeFl::FLOAT)
            .default(Obj::double(1.0))
            .doc("first input weight"),
    )
    .var(
        VarDesc::new("g1", TypeFl::FLOAT)
            .default(Obj::double(1.0))
            .doc("second input weight"),
    )
    .var(VarDesc::new("out", TypeFl::AUDIO).doc("weighted sum"))
}
