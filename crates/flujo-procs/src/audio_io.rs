//! `audio_in` / `audio_out`: external audio device endpoints.
//!
//! Both own an audio buffer sized from their device's declaration. The
//! scheduler copies device input frames into an `audio_in`'s `out`
//! buffer before the cycle, zeroes every `audio_out`'s `out` buffer,
//! and drains it to the device after the cycle. `audio_out::exec`
//! mix-adds its `in` into `out`, so several sources can share a device.

use flujo_core::{FlowError, Result, TypeFl};
use flujo_net::{ANY_CH, ClassDesc, DeviceKind, ProcCtx, ProcImpl, VarDesc, VarFlags};

/// vid of `audio_in.out`.
pub const IN_OUT: u32 = 0;

/// vid of `audio_out.in`.
pub const OUT_IN: u32 = 0;
/// vid of `audio_out.out`.
pub const OUT_OUT: u32 = 1;

/// Reads the `dev` arg and resolves the declared device.
fn device_of(ctx: &ProcCtx, want_input: bool) -> Result<flujo_net::DeviceDecl> {
    let args = ctx
        .arg_cfg()
        .ok_or_else(|| FlowError::InvalidArg(format!("'{}' needs args", ctx.proc_label())))?;
    let label = args.get_str("dev")?.to_string();
    let dev = ctx.device(&label)?;

    if dev.kind != DeviceKind::Audio {
        return Err(FlowError::InvalidArg(format!(
            "device '{label}' is not an audio device"
        )));
    }
    let dir_ok = if want_input { dev.dir.input } else { dev.dir.output };
    if !dir_ok {
        return Err(FlowError::InvalidArg(format!(
            "device '{label}' lacks the required direction"
        )));
    }
    Ok(dev)
}

struct AudioIn;

impl ProcImpl for AudioIn {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        let dev = device_of(ctx, true)?;
        ctx.register_audio("out", IN_OUT, ANY_CH, dev.srate, dev.ch_n, dev.frame_n)?;
        Ok(())
    }

    fn exec(&mut self, _ctx: &mut ProcCtx) -> Result<()> {
        // The scheduler filled `out` before this cycle began.
        Ok(())
    }
}

/// The `audio_in` class descriptor.
pub fn audio_in_class_desc() -> ClassDesc {
    ClassDesc::new("audio_in", || Box::new(AudioIn)).var(
        VarDesc::new("out", TypeFl::AUDIO).doc("device capture buffer for this cycle"),
    )
}

struct AudioOut {
    scratch: Vec<f32>,
}

impl ProcImpl for AudioOut {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        let dev = device_of(ctx, false)?;
        ctx.register("in", OUT_IN, ANY_CH, None)?;
        ctx.register_audio("out", OUT_OUT, ANY_CH, dev.srate, dev.ch_n, dev.frame_n)?;
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        // Mix `in` into the device-bound buffer. The input aliases an
        // upstream buffer, so it is staged through the scratch vector.
        {
            let src = ctx.abuf(OUT_IN, ANY_CH)?;
            self.scratch.resize(src.samples().len(), 0.0);
            self.scratch.copy_from_slice(src.samples());
        }
        let dst = ctx.abuf_mut(OUT_OUT, ANY_CH)?;
        if self.scratch.len() != dst.samples().len() {
            return Err(FlowError::InvalidArg(format!(
                "input geometry {} does not match the device buffer {}",
                self.scratch.len(),
                dst.samples().len()
            )));
        }
        for (d, s) in dst.samples_mut().iter_mut().zip(self.scratch.iter()) {
            *d += *s;
        }
        Ok(())
    }
}

/// The `audio_out` class descriptor.
pub fn audio_out_class_desc() -> ClassDesc {
    ClassDesc::new("audio_out", || Box::new(AudioOut { scratch: Vec::new() }))
        .var(
            VarDesc::new("in", TypeFl::AUDIO)
                .flags(VarFlags::SRC)
                .doc("signal to play"),
        )
        .var(VarDesc::new("out", TypeFl::AUDIO).doc("device playback buffer for this cycle"))
}
