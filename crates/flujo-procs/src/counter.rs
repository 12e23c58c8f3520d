//! `counter`: emits a count that advances every cycle.
//!
//! `init` is init-only (creation-time configuration cannot be
//! overwritten later); `step` may change at runtime; an optional
//! `limit` arg turns the procedure into a non-real-time terminator that
//! signals end of stream when the count reaches it.

use flujo_cfg::Obj;
use flujo_core::{FlowError, Result, TypeFl};
use flujo_net::{ANY_CH, ClassDesc, ProcCtx, ProcImpl, VarDesc, VarFlags};

/// vid of `init`.
pub const INIT: u32 = 0;
/// vid of `step`.
pub const STEP: u32 = 1;
/// vid of `out`.
pub const OUT: u32 = 2;

struct Counter {
    value: u32,
    started: bool,
    limit: Option<u32>,
}

impl ProcImpl for Counter {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        ctx.register("init", INIT, ANY_CH, None)?;
        ctx.register("step", STEP, ANY_CH, None)?;
        ctx.register("out", OUT, ANY_CH, None)?;
        if let Some(args) = ctx.arg_cfg()
            && let Some(limit) = args.member("limit")
        {
            self.limit = Some(limit.as_u64()? as u32);
        }
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        if !self.started {
            self.value = ctx.get_uint(INIT, ANY_CH)?;
            self.started = true;
        } else {
            self.value = self.value.wrapping_add(ctx.get_uint(STEP, ANY_CH)?);
        }
        ctx.set_uint(OUT, ANY_CH, self.value)?;

        if let Some(limit) = self.limit
            && self.value >= limit
        {
            return Err(FlowError::Eof);
        }
        Ok(())
    }

    fn report(&self) -> String {
        format!("count {}", self.value)
    }
}

/// The `counter` class descriptor.
pub fn class_desc() -> ClassDesc {
    ClassDesc::new("counter", || {
        Box::new(Counter {
            value: 0,
            started: false,
            limit: None,
        })
    })
    .var(
        VarDesc::new("init", TypeFl::UINT)
            .flags(VarFlags::INIT)
            .default(Obj::uint(0))
            .doc("starting count"),
    )
    .var(
        VarDesc::new("step", TypeFl::UINT)
            .default(Obj::uint(1))
            .doc("per-cycle increment"),
    )
    .var(
        VarDesc::new("out", TypeFl::UINT)
            .default(Obj::uint(0))
            .doc("current count"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use flujo_net::Network;
    use std::sync::Arc;

    fn build(cfg: &str) -> Network {
        let root = flujo_cfg::parse(cfg).unwrap();
        Network::from_cfg(Arc::new(crate::builtin_dict().unwrap()), &root, Vec::new()).unwrap()
    }

    #[test]
    fn test_counts_from_init_by_step() {
        let mut net = build("main: { c: { class: counter, init: 10u, step: 5u } }");
        let c = net.proc_find("c").unwrap();
        let out = net.var_find(c, "out", 0, ANY_CH).unwrap();

        net.exec_cycle().unwrap();
        assert_eq!(net.get_uint(out).unwrap(), 10);
        net.exec_cycle().unwrap();
        assert_eq!(net.get_uint(out).unwrap(), 15);
    }

    #[test]
    fn test_limit_signals_end_of_stream() {
        let mut net = build("main: { c: { class: counter, args: { limit: 2u } } }");
        net.exec_cycle().unwrap(); // 0
        net.exec_cycle().unwrap(); // 1
        assert_eq!(net.exec_cycle().unwrap_err(), FlowError::Eof); // 2
    }
}
