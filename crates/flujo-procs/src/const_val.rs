//! `const_float`: emits a configured constant.
//!
//! The value is assigned at creation (configuration or preset) and
//! broadcast to connected inputs through the normal assignment path;
//! `exec` has nothing to do.

use flujo_cfg::Obj;
use flujo_core::{Result, TypeFl};
use flujo_net::{ANY_CH, ClassDesc, ProcCtx, ProcImpl, VarDesc};

/// vid of `out`.
pub const OUT: u32 = 0;

struct ConstFloat;

impl ProcImpl for ConstFloat {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
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

    fn exec(&mut self, _ctx: &mut ProcCtx) -> Result<()> {
        Ok(())
    }
}

/// The `const_float` class descriptor.
pub fn class_desc() -> ClassDesc {
    ClassDesc::new("const_float", || Box::new(ConstFloat)).var(
        VarDesc::new("out", TypeFl::FLOAT)
            .default(Obj::double(0.0))
            .doc("the constant value"),
    )
}
