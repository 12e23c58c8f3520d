//! `number`: numeric relay.
//!
//! Mirrors its (optionally connected) `in` onto `out` whenever `in`
//! changes, so a scalar can fan out to several consumers while staying
//! settable from configuration or presets when unconnected.

use flujo_cfg::Obj;
use flujo_core::{Result, TypeFl, Value};
use flujo_net::{ANY_CH, ClassDesc, ProcCtx, ProcImpl, VarAddr, VarDesc, VarFlags};

/// vid of `in`.
pub const IN: u32 = 0;
/// vid of `out`.
pub const OUT: u32 = 1;

struct Number;

impl ProcImpl for Number {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        ctx.register("in", IN, ANY_CH, None)?;
        ctx.register("out", OUT, ANY_CH, None)?;
        Ok(())
    }

    fn value(&mut self, ctx: &mut ProcCtx, var: VarAddr) -> Result<()> {
        if ctx.var(var).label() != "in" {
            return Ok(());
        }
        // Relay the new input; the broadcast continues downstream of
        // `out` before control returns to the writer.
        let v = ctx.value(var)?.as_double()?;
        let out = ctx.find("out", ANY_CH)?;
        if ctx.value(out)?.as_double()? != v {
            ctx.set_double(OUT, ANY_CH, v)?;
        }
        Ok(())
    }

    fn exec(&mut self, _ctx: &mut ProcCtx) -> Result<()> {
        Ok(())
    }

    fn report(&self) -> String {
        "numeric relay".to_string()
    }
}

/// The `number` class descriptor.
pub fn class_desc() -> ClassDesc {
    ClassDesc::new("number", || Box::new(Number))
        .var(
            VarDesc::new("in", TypeFl::DOUBLE)
                .flags(VarFlags::SRC_OPT)
                .default(Obj::double(0.0))
                .doc("value to relay"),
        )
        .var(
            VarDesc::new("out", TypeFl::DOUBLE)
                .default(Obj::double(0.0))
                .doc("relayed value"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use flujo_net::Network;
    use std::sync::Arc;

    #[test]
    fn test_unconnected_relay() {
        let root = flujo_cfg::parse("main: { n: { class: number, in: 1.5 } }").unwrap();
        let mut net =
            Network::from_cfg(Arc::new(crate::builtin_dict().unwrap()), &root, Vec::new())
                .unwrap();
        let n = net.proc_find("n").unwrap();

        // The relay runs on post-create assignments.
        let input = net.var_find(n, "in", 0, ANY_CH).unwrap();
        net.var_set(input, &Value::Double(2.5)).unwrap();

        let out = net.var_find(n, "out", 0, ANY_CH).unwrap();
        assert_eq!(net.get_double(out).unwrap(), 2.5);
    }
}
