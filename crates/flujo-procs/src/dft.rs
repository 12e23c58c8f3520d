//! `dft`: Hann-windowed forward FFT per channel per cycle.
//!
//! The spectrum output is allocated on the first cycle, when the input
//! buffer's geometry is known. Each channel's `ready` flag is raised
//! every cycle after its bins are written.

use std::f32::consts::PI;
use std::sync::Arc;

use flujo_core::{Result, TypeFl};
use flujo_net::{ANY_CH, ClassDesc, ProcCtx, ProcImpl, VarDesc, VarFlags};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// vid of `in`.
pub const IN: u32 = 0;
/// vid of `out`.
pub const OUT: u32 = 1;

struct Dft {
    fft: Option<Arc<dyn Fft<f32>>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl Dft {
    fn ensure_setup(&mut self, ctx: &mut ProcCtx) -> Result<(usize, usize)> {
        let (srate, ch_n, frame_n) = {
            let abuf = ctx.abuf(IN, ANY_CH)?;
            (abuf.srate(), abuf.ch_n(), abuf.frame_n())
        };

        if self.fft.is_none() {
            let mut planner = FftPlanner::new();
            self.fft = Some(planner.plan_fft_forward(frame_n));
            self.window = (0..frame_n)
                .map(|i| {
                    let x = PI * i as f32 / frame_n as f32;
                    x.sin() * x.sin()
                })
                .collect();
            self.scratch = vec![Complex::new(0.0, 0.0); frame_n];

            let bin_n = frame_n / 2 + 1;
            ctx.register_spectrum("out", OUT, ANY_CH, srate, ch_n, bin_n, bin_n, frame_n)?;
        }
        Ok((ch_n, frame_n))
    }
}

impl ProcImpl for Dft {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        ctx.register("in", IN, ANY_CH, None)?;
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        let (ch_n, frame_n) = self.ensure_setup(ctx)?;
        let Some(fft) = self.fft.clone() else {
            return Err(flujo_core::FlowError::InvalidState(
                "dft plan missing after setup".to_string(),
            ));
        };
        let srate = ctx.abuf(IN, ANY_CH)?.srate();
        let bin_hz = srate / frame_n as f32;
        let bin_n = frame_n / 2 + 1;

        for ch in 0..ch_n {
            // Windowed copy into the scratch buffer, then transform.
            {
                let samples = ctx.abuf(IN, ANY_CH)?.channel(ch)?;
                for (i, s) in samples.iter().enumerate() {
                    self.scratch[i] = Complex::new(*s * self.window[i], 0.0);
                }
            }
            fft.process(&mut self.scratch);

            let fbuf = ctx.spect_mut(OUT, ANY_CH)?;
            for bin in 0..bin_n {
                let c = self.scratch[bin];
                fbuf.mag_mut(ch)[bin] = c.norm();
                fbuf.phs_mut(ch)[bin] = c.arg();
                fbuf.hz_mut(ch)[bin] = bin as f32 * bin_hz;
            }
            fbuf.set_ready(ch, true);
        }
        Ok(())
    }
}

/// The `dft` class descriptor.
pub fn class_desc() -> ClassDesc {
    ClassDesc::new("dft", || {
        Box::new(Dft {
            fft: None,
            window: Vec::new(),
            scratch: Vec::new(),
        })
    })
    .var(
        VarDesc::new("in", TypeFl::AUDIO)
            .flags(VarFlags::SRC)
            .doc("signal to analyze"),
    )
    .var(VarDesc::new("out", TypeFl::SPECTRUM).doc("per-channel analysis frames"))
}
