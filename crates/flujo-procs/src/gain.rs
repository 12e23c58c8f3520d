//! `gain`: per-channel numeric multiply.
//!
//! `out = in * k` for every channel of the `out` chain; channels without
//! a channelized `k` inherit the any-channel coefficient. An `args`
//! entry `channels: N` fans `out` across N channels at creation.

use flujo_cfg::Obj;
use flujo_core::{Result, TypeFl};
use flujo_net::{ANY_CH, ClassDesc, ProcCtx, ProcImpl, VarDesc, VarFlags};

/// vid of `in`.
pub const IN: u32 = 0;
/// vid of `k`.
pub const K: u32 = 1;
/// vid of `out`.
pub const OUT: u32 = 2;

struct Gain;

impl ProcImpl for Gain {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        ctx.register("in", IN, ANY_CH, None)?;
        ctx.register("k", K, ANY_CH, None)?;
        ctx.register("out", OUT, ANY_CH, None)?;
        if let Some(args) = ctx.arg_cfg()
            && let Some(chn) = args.member("channels")
        {
            let n = chn.as_u64()? as usize;
            for ch in 0..n {
                ctx.channelize("out", ch, None)?;
            }
        }
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        let chans = ctx.channels_of("out")?;
        if chans.is_empty() {
            let v = ctx.get_float(IN, ANY_CH)? * ctx.get_float(K, ANY_CH)?;
            ctx.set_float(OUT, ANY_CH, v)?;
        } else {
            for ch in chans {
                let v = ctx.get_float(IN, ch)? * ctx.get_float(K, ch)?;
                ctx.set_float(OUT, ch, v)?;
            }
        }
        Ok(())
    }
}

/// The `gain` class descriptor.
pub fn class_desc() -> ClassDesc {
    ClassDesc::new("gain", || Box::new(Gain))
        .var(
            VarDesc::new("in", TypeFl::NUMERIC)
                .flags(VarFlags::SRC)
                .doc("input signal"),
        )
        .var(
            VarDesc::new("k", TypeFl::FLOAT)
                .default(Obj::double(1.0))
                .doc("gain coefficient"),
        )
        .var(
            VarDesc::new("out", TypeFl::FLOAT)
                .default(Obj::double(0.0))
                .doc("scaled output"),
        )
        .preset("unity", Obj::dict(vec![("k", Obj::double(1.0))]))
        .preset("mute", Obj::dict(vec![("k", Obj::double(0.0))]))
}
