//! `midi_in` / `midi_out`: external MIDI device endpoints.
//!
//! A `midi_in` owns a message buffer the scheduler refills before each
//! cycle and clears afterwards. A `midi_out` exposes a connected `in`;
//! the scheduler drains the resolved messages to the device's sender
//! after the cycle, so messages written mid-cycle still leave on the
//! same cycle boundary.

use flujo_core::{FlowError, Result, TypeFl};
use flujo_net::{ANY_CH, ClassDesc, DeviceKind, ProcCtx, ProcImpl, VarDesc, VarFlags};

/// vid of `midi_in.out`.
pub const IN_OUT: u32 = 0;
/// vid of `midi_out.in`.
pub const OUT_IN: u32 = 0;

fn midi_device_of(ctx: &ProcCtx, want_input: bool) -> Result<flujo_net::DeviceDecl> {
    let args = ctx
        .arg_cfg()
        .ok_or_else(|| FlowError::InvalidArg(format!("'{}' needs args", ctx.proc_label())))?;
    let label = args.get_str("dev")?.to_string();
    let dev = ctx.device(&label)?;
    if dev.kind != DeviceKind::Midi {
        return Err(FlowError::InvalidArg(format!(
            "device '{label}' is not a MIDI device"
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

struct MidiIn;

impl ProcImpl for MidiIn {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        let dev = midi_device_of(ctx, true)?;
        ctx.register_midi("out", IN_OUT, dev.max_msg_n)?;
        Ok(())
    }

    fn exec(&mut self, _ctx: &mut ProcCtx) -> Result<()> {
        // The scheduler filled `out` with this cycle's messages.
        Ok(())
    }
}

/// The `midi_in` class descriptor.
pub fn midi_in_class_desc() -> ClassDesc {
    ClassDesc::new("midi_in", || Box::new(MidiIn)).var(
        VarDesc::new("out", TypeFl::MIDI).doc("messages that arrived before this cycle"),
    )
}

struct MidiOut;

impl ProcImpl for MidiOut {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        midi_device_of(ctx, false)?;
        ctx.register("in", OUT_IN, ANY_CH, None)?;
        Ok(())
    }

    fn exec(&mut self, _ctx: &mut ProcCtx) -> Result<()> {
        // The scheduler drains the resolved `in` messages post-cycle.
        Ok(())
    }
}

/// The `midi_out` class descriptor.
pub fn midi_out_class_desc() -> ClassDesc {
    ClassDesc::new("midi_out", || Box::new(MidiOut)).var(
        VarDesc::new("in", TypeFl::MIDI)
            .flags(VarFlags::SRC)
            .doc("messages to send"),
    )
}
