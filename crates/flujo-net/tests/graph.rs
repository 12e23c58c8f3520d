//! Integration tests for the variable graph and network lifecycle:
//! wiring, channelization, assignment rollback, presets, and the
//! structural invariants that must hold after every public operation.

use std::collections::HashSet;
use std::sync::Arc;

use flujo_cfg::Obj;
use flujo_core::{FlowError, Result, TypeFl, Value};
use flujo_net::{
    ANY_CH, ClassDesc, ClassDict, Network, ProcCtx, ProcImpl, VarAddr, VarDesc, VarFlags,
};

// --- Test classes ---

const CONST_OUT: u32 = 0;

struct ConstFloat;

impl ProcImpl for ConstFloat {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        ctx.register("out", CONST_OUT, ANY_CH, None)?;
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

const GAIN_IN: u32 = 0;
const GAIN_K: u32 = 1;
const GAIN_OUT: u32 = 2;

struct Gain;

impl ProcImpl for Gain {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        ctx.register("in", GAIN_IN, ANY_CH, None)?;
        ctx.register("k", GAIN_K, ANY_CH, None)?;
        ctx.register("out", GAIN_OUT, ANY_CH, None)?;
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
            let v = ctx.get_float(GAIN_IN, ANY_CH)? * ctx.get_float(GAIN_K, ANY_CH)?;
            ctx.set_float(GAIN_OUT, ANY_CH, v)?;
        } else {
            for ch in chans {
                let v = ctx.get_float(GAIN_IN, ch)? * ctx.get_float(GAIN_K, ch)?;
                ctx.set_float(GAIN_OUT, ch, v)?;
            }
        }
        Ok(())
    }
}

const LIMIT_IN: u32 = 0;

/// Rejects assignments above 1.0 through its `value` callback.
struct Limit;

impl ProcImpl for Limit {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        ctx.register("in", LIMIT_IN, ANY_CH, None)?;
        Ok(())
    }

    fn value(&mut self, ctx: &mut ProcCtx, var: VarAddr) -> Result<()> {
        if ctx.var(var).label() == "in" {
            let v = ctx.value(var)?.as_float()?;
            if v > 1.0 {
                return Err(FlowError::InvalidArg(format!("{v} exceeds the limit")));
            }
        }
        Ok(())
    }

    fn exec(&mut self, _ctx: &mut ProcCtx) -> Result<()> {
        Ok(())
    }
}

/// Carries a `mult` input, an init-only field, and a runtime-typed
/// port, so the descriptor flags get exercised.
struct Mixer;

impl ProcImpl for Mixer {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        ctx.register("seed", 1, ANY_CH, None)?;
        ctx.register("any", 2, ANY_CH, None)?;
        Ok(())
    }
    fn exec(&mut self, _ctx: &mut ProcCtx) -> Result<()> {
        Ok(())
    }
}

/// Fails every cycle; the network must keep running its neighbours.
struct Broken;

impl ProcImpl for Broken {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        ctx.register("out", 0, ANY_CH, None)?;
        Ok(())
    }
    fn exec(&mut self, _ctx: &mut ProcCtx) -> Result<()> {
        Err(FlowError::OpFail("intentional".to_string()))
    }
}

/// Counts its cycles through a variable, so tests can observe that it
/// ran.
struct Counter;

impl ProcImpl for Counter {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        ctx.register("n", 0, ANY_CH, None)?;
        Ok(())
    }
    fn exec(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        let n = ctx.get_int(0, ANY_CH)?;
        ctx.set_int(0, ANY_CH, n + 1)?;
        Ok(())
    }
}

fn dict() -> Arc<ClassDict> {
    let mut d = ClassDict::new();
    d.register(
        ClassDesc::new("const_float", || Box::new(ConstFloat))
            .var(VarDesc::new("out", TypeFl::FLOAT).default(Obj::double(0.0))),
    )
    .unwrap();
    d.register(
        ClassDesc::new("mixer", || Box::new(Mixer))
            .var(
                VarDesc::new("in", TypeFl::FLOAT)
                    .flags(VarFlags::SRC.union(VarFlags::MULT))
                    .default(Obj::double(0.0)),
            )
            .var(
                VarDesc::new("seed", TypeFl::FLOAT)
                    .flags(VarFlags::INIT)
                    .default(Obj::double(1.0)),
            )
            .var(VarDesc::new("any", TypeFl::RUNTIME)),
    )
    .unwrap();
    d.register(
        ClassDesc::new("broken", || Box::new(Broken))
            .var(VarDesc::new("out", TypeFl::FLOAT).default(Obj::double(0.0))),
    )
    .unwrap();
    d.register(
        ClassDesc::new("counter", || Box::new(Counter))
            .var(VarDesc::new("n", TypeFl::INT).default(Obj::int(0))),
    )
    .unwrap();
    d.register(
        ClassDesc::new("gain", || Box::new(Gain))
            .var(VarDesc::new("in", TypeFl::FLOAT).flags(VarFlags::SRC))
            .var(VarDesc::new("k", TypeFl::FLOAT).default(Obj::double(1.0)))
            .var(VarDesc::new("out", TypeFl::FLOAT).default(Obj::double(0.0))),
    )
    .unwrap();
    d.register(
        ClassDesc::new("limit", || Box::new(Limit))
            .var(VarDesc::new("in", TypeFl::FLOAT).default(Obj::double(0.25))),
    )
    .unwrap();
    Arc::new(d)
}

fn build(cfg_text: &str) -> Network {
    let root = flujo_cfg::parse(cfg_text).unwrap();
    Network::from_cfg(dict(), &root, Vec::new()).unwrap()
}

// --- Structural invariants (checked after every scenario) ---

fn check_invariants(net: &Network) {
    for p in 0..net.proc_n() {
        let n = net.var_n(p);
        let addr = |var| VarAddr { proc: p, var };

        let mut pairs = HashSet::new();
        for i in 0..n {
            let v = net.var(addr(i));
            pairs.insert((v.label().to_string(), v.label_sfx()));
        }

        for (label, sfx) in &pairs {
            let members: Vec<usize> = (0..n)
                .filter(|&i| {
                    let v = net.var(addr(i));
                    v.label() == label && v.label_sfx() == *sfx
                })
                .collect();

            // Exactly one any-channel base per (label, sfx).
            let bases: Vec<usize> = members
                .iter()
                .copied()
                .filter(|&i| net.var(addr(i)).ch() == ANY_CH)
                .collect();
            assert_eq!(bases.len(), 1, "proc {p} '{label}:{sfx}' base count");

            // The chain walks every member exactly once, strictly
            // ascending in channel index.
            let mut chain = vec![bases[0]];
            let mut cursor = net.var(addr(bases[0])).ch_link();
            let mut last_ch = None;
            while let Some(i) = cursor {
                let ch = net.var(addr(i)).ch();
                if let Some(prev) = last_ch {
                    assert!(ch > prev, "chain not ascending on '{label}'");
                }
                last_ch = Some(ch);
                chain.push(i);
                cursor = net.var(addr(i)).ch_link();
            }
            let chain_set: HashSet<usize> = chain.iter().copied().collect();
            assert_eq!(chain_set.len(), chain.len(), "chain revisits a member");
            assert_eq!(
                chain_set,
                members.iter().copied().collect::<HashSet<_>>(),
                "chain must cover '{label}:{sfx}' exactly"
            );
        }

        for i in 0..n {
            let v = net.var(addr(i));
            if let Some(src) = v.src() {
                // Aliased value resolves to the same owner as the source.
                assert_eq!(
                    net.resolve_owner(addr(i)).unwrap(),
                    net.resolve_owner(src).unwrap(),
                    "src != null but value does not alias the source"
                );
                assert!(
                    net.var(src).dsts().contains(&addr(i)),
                    "source's dst list misses a destination"
                );
            }
            for &d in v.dsts() {
                assert_eq!(net.var(d).src(), Some(addr(i)), "dst back-pointer broken");
            }
        }
    }
}

// --- Scenarios ---

#[test]
fn scenario_basic_wiring() {
    let mut net = build(
        r#"
        main: {
          const: { class: const_float, out: 0.25 },
          gain:  { class: gain, k: 2.0, in: { in: "const.out" } },
        }
        "#,
    );

    net.exec_cycle().unwrap();

    let out = net.var_find(net.proc_find("gain").unwrap(), "out", 0, ANY_CH).unwrap();
    assert_eq!(net.get_float(out).unwrap(), 0.5);
    check_invariants(&net);
}

#[test]
fn scenario_channelization() {
    let mut net = build(
        r#"
        main: {
          const: { class: const_float, out: 0.25 },
          gain:  { class: gain, args: { channels: 4 }, k: 2.0, in: { in: "const.out" } },
        }
        "#,
    );

    let gain = net.proc_find("gain").unwrap();
    net.var_channelize(gain, "k", 0, 1, Some(&Obj::double(3.0)), GAIN_K)
        .unwrap();
    net.var_channelize(gain, "k", 0, 3, Some(&Obj::double(4.0)), GAIN_K)
        .unwrap();

    net.exec_cycle().unwrap();

    let expect = [0.5, 0.75, 0.5, 1.0];
    for (ch, want) in expect.iter().enumerate() {
        let addr = net.var_find(gain, "out", 0, ch).unwrap();
        assert_eq!(
            net.get_float(addr).unwrap(),
            *want,
            "gain.out channel {ch}"
        );
    }
    check_invariants(&net);
}

#[test]
fn scenario_assignment_rollback() {
    let mut net = build("main: { lim: { class: limit } }");
    let lim = net.proc_find("lim").unwrap();
    let addr = net.var_find(lim, "in", 0, ANY_CH).unwrap();
    assert_eq!(net.get_float(addr).unwrap(), 0.25);

    let err = net.var_set(addr, &Value::Float(1.5)).unwrap_err();
    assert!(matches!(err, FlowError::OpFail(_)), "got {err:?}");

    // The previous value is still active; the trial slot is unreachable.
    assert_eq!(net.get_float(addr).unwrap(), 0.25);
    assert_eq!(*net.var(addr).local_value(), Value::Float(0.25));

    // The ring recovers: a legal assignment lands normally.
    net.var_set(addr, &Value::Float(0.75)).unwrap();
    assert_eq!(net.get_float(addr).unwrap(), 0.75);
    check_invariants(&net);
}

#[test]
fn scenario_dual_preset_interpolation() {
    let mut net = build(
        r#"
        main: {
          const: { class: const_float, out: 0.25 },
          gain:  { class: gain, k: 2.0, in: { in: "const.out" } },
        }
        presets: {
          P0:  { gain: { k: 0.0 } },
          P1:  { gain: { k: 1.0 } },
          mid: { dual: [P0, P1, 0.25] },
        }
        "#,
    );

    net.apply_preset("mid").unwrap();
    let gain = net.proc_find("gain").unwrap();
    let k = net.var_find(gain, "k", 0, ANY_CH).unwrap();
    assert_eq!(net.get_float(k).unwrap(), 0.25);
    check_invariants(&net);
}

#[test]
fn preset_application_is_idempotent() {
    let mut net = build(
        r#"
        main: {
          const: { class: const_float, out: 0.25 },
          gain:  { class: gain, k: 2.0, in: { in: "const.out" } },
        }
        presets: {
          P1: { gain: { k: 1.0 } },
        }
        "#,
    );

    net.apply_preset("P1").unwrap();
    let gain = net.proc_find("gain").unwrap();
    let k = net.var_find(gain, "k", 0, ANY_CH).unwrap();
    let first = net.get_float(k).unwrap();

    net.apply_preset("P1").unwrap();
    assert_eq!(net.get_float(k).unwrap(), first);
    check_invariants(&net);
}

#[test]
fn preset_missing_target_is_skipped_by_default() {
    let mut net = build(
        r#"
        main: {
          const: { class: const_float, out: 0.25 },
          gain:  { class: gain, k: 2.0, in: { in: "const.out" } },
        }
        presets: {
          mixed: { ghost: { k: 9.0 }, gain: { k: 5.0 } },
        }
        "#,
    );

    // The missing 'ghost' target logs; the 'gain' entry still applies.
    net.apply_preset("mixed").unwrap();
    let gain = net.proc_find("gain").unwrap();
    let k = net.var_find(gain, "k", 0, ANY_CH).unwrap();
    assert_eq!(net.get_float(k).unwrap(), 5.0);
}

#[test]
fn preset_missing_target_errors_when_strict() {
    let root = flujo_cfg::parse(
        r#"
        params: { strict_presets: true }
        main: {
          const: { class: const_float, out: 0.25 },
        }
        presets: {
          bad: { ghost: { k: 9.0 } },
        }
        "#,
    )
    .unwrap();
    let mut net = Network::from_cfg(dict(), &root, Vec::new()).unwrap();
    assert!(matches!(
        net.apply_preset("bad"),
        Err(FlowError::EleNotFound(_))
    ));
}

// --- Graph laws ---

#[test]
fn connect_disconnect_leaves_value_aliased() {
    let mut net = build(
        r#"
        main: {
          a: { class: const_float, out: 0.5 },
          b: { class: const_float, out: 0.125 },
        }
        "#,
    );
    let a = net.proc_find("a").unwrap();
    let b = net.proc_find("b").unwrap();
    let src = net.var_find(a, "out", 0, ANY_CH).unwrap();
    let dst = net.var_find(b, "out", 0, ANY_CH).unwrap();

    net.var_connect(src, dst).unwrap();
    assert_eq!(net.get_float(dst).unwrap(), 0.5);
    check_invariants(&net);

    net.var_disconnect(dst).unwrap();
    assert_eq!(net.var(dst).src(), None);
    assert!(net.var(src).dsts().is_empty());
    // The value stays aliased until the caller reassigns.
    assert_eq!(net.get_float(dst).unwrap(), 0.5);

    net.var_set(dst, &Value::Float(0.25)).unwrap();
    assert_eq!(net.get_float(dst).unwrap(), 0.25);
    // The source is unaffected by the reassignment.
    assert_eq!(net.get_float(src).unwrap(), 0.5);
    check_invariants(&net);
}

#[test]
fn connected_input_rejects_local_writes() {
    let mut net = build(
        r#"
        main: {
          const: { class: const_float, out: 0.25 },
          gain:  { class: gain, k: 2.0, in: { in: "const.out" } },
        }
        "#,
    );
    let gain = net.proc_find("gain").unwrap();
    let input = net.var_find(gain, "in", 0, ANY_CH).unwrap();
    assert!(matches!(
        net.var_set(input, &Value::Float(9.0)),
        Err(FlowError::InvalidState(_))
    ));
}

#[test]
fn double_connect_rejected() {
    let mut net = build(
        r#"
        main: {
          a: { class: const_float, out: 1.0 },
          b: { class: const_float, out: 2.0 },
          g: { class: gain, in: { in: "a.out" } },
        }
        "#,
    );
    let b = net.proc_find("b").unwrap();
    let g = net.proc_find("g").unwrap();
    let src = net.var_find(b, "out", 0, ANY_CH).unwrap();
    let dst = net.var_find(g, "in", 0, ANY_CH).unwrap();
    assert!(matches!(
        net.var_connect(src, dst),
        Err(FlowError::InvalidState(_))
    ));
}

#[test]
fn channelize_matches_source_channels() {
    let mut net = build(
        r#"
        main: {
          const: { class: const_float, args: { channels: 2 }, out: 0.25 },
          gain:  { class: gain, k: 2.0, in: { in: "const.out" } },
        }
        "#,
    );
    let cst = net.proc_find("const").unwrap();
    let gain = net.proc_find("gain").unwrap();

    // Matching channel on the source chain is used.
    let v0 = net
        .var_channelize(gain, "in", 0, 0, None, GAIN_IN)
        .unwrap();
    let addr0 = VarAddr { proc: gain, var: v0 };
    let want0 = net.var_find(cst, "out", 0, 0).unwrap();
    assert_eq!(net.var(addr0).src(), Some(want0));

    // No channel 5 on the source: the last source channel is used.
    let v5 = net
        .var_channelize(gain, "in", 0, 5, None, GAIN_IN)
        .unwrap();
    let addr5 = VarAddr { proc: gain, var: v5 };
    let want5 = net.var_find(cst, "out", 0, 1).unwrap();
    assert_eq!(net.var(addr5).src(), Some(want5));

    check_invariants(&net);
}

#[test]
fn forward_source_reference_rejected() {
    // 'in' statements only reference already-declared procedures.
    let root = flujo_cfg::parse(
        r#"
        main: {
          g:  { class: gain, k: 2.5, in: { in: "g2.out" } },
          g2: { class: const_float, out: 1.0 },
        }
        "#,
    )
    .unwrap();
    assert!(matches!(
        Network::from_cfg(dict(), &root, Vec::new()),
        Err(FlowError::EleNotFound(_))
    ));
}

#[test]
fn channelize_copies_local_base_value() {
    let mut net = build(
        r#"
        main: {
          c: { class: const_float, out: 1.0 },
          g: { class: gain, k: 2.5, in: { in: "c.out" } },
        }
        "#,
    );
    let g = net.proc_find("g").unwrap();
    let v1 = net.var_channelize(g, "k", 0, 1, None, GAIN_K).unwrap();
    let addr = VarAddr { proc: g, var: v1 };
    // The base is locally valued, so the channel deep-copies it.
    assert!(net.var(addr).is_local());
    assert_eq!(net.get_float(addr).unwrap(), 2.5);
    check_invariants(&net);
}

// --- Creation and lookup failure modes ---

#[test]
fn duplicate_variable_rejected() {
    let mut net = build("main: { c: { class: const_float, out: 1.0 } }");
    let c = net.proc_find("c").unwrap();
    assert!(matches!(
        net.var_create(c, "out", 0, CONST_OUT, ANY_CH, None, TypeFl::NONE),
        Err(FlowError::Duplicate(_))
    ));
}

#[test]
fn unknown_descriptor_rejected() {
    let mut net = build("main: { c: { class: const_float, out: 1.0 } }");
    let c = net.proc_find("c").unwrap();
    assert!(matches!(
        net.var_create(c, "nope", 0, 9, ANY_CH, None, TypeFl::NONE),
        Err(FlowError::EleNotFound(_))
    ));
}

#[test]
fn unknown_class_rejected() {
    let root = flujo_cfg::parse("main: { x: { class: warp_drive } }").unwrap();
    assert!(matches!(
        Network::from_cfg(dict(), &root, Vec::new()),
        Err(FlowError::EleNotFound(_))
    ));
}

#[test]
fn unknown_cfg_variable_rejected() {
    let root = flujo_cfg::parse("main: { c: { class: const_float, nope: 1.0 } }").unwrap();
    assert!(matches!(
        Network::from_cfg(dict(), &root, Vec::new()),
        Err(FlowError::EleNotFound(_))
    ));
}

#[test]
fn register_creates_missing_base_for_channel_variables() {
    let mut net = build("main: { m: { class: mixer, any: 2.5 } }");
    let m = net.proc_find("m").unwrap();

    // No 'in' variable exists yet: registering a channel variable must
    // allocate the any-channel base first, sharing its vid.
    let addr = net.var_register(m, "in", 0, 0, 2, None).unwrap();
    assert_eq!(net.var(addr).ch(), 2);
    assert_eq!(net.get_float(addr).unwrap(), 0.0);

    let base = net.var_find(m, "in", 0, ANY_CH).unwrap();
    assert_eq!(net.var(base).vid(), 0);
    assert_eq!(net.var(base).vid(), net.var(addr).vid());
    check_invariants(&net);
}

#[test]
fn vid_lookup_uses_flat_map() {
    let net = build(
        r#"
        main: {
          const: { class: const_float, out: 0.25 },
          gain:  { class: gain, args: { channels: 2 }, k: 2.0, in: { in: "const.out" } },
        }
        "#,
    );
    let gain = net.proc_find("gain").unwrap();
    let by_vid = net.var_find_vid(gain, GAIN_OUT, 1).unwrap();
    let by_label = net.var_find(gain, "out", 0, 1).unwrap();
    assert_eq!(by_vid, by_label);
    assert!(net.var_find_vid(gain, 99, ANY_CH).is_err());
}

// --- Execution lifecycle ---

#[test]
fn completed_network_rejects_further_cycles() {
    let root = flujo_cfg::parse(
        r#"
        params: { max_cycle_n: 1 }
        main: { c: { class: const_float, out: 1.0 } }
        "#,
    )
    .unwrap();
    let mut net = Network::from_cfg(dict(), &root, Vec::new()).unwrap();

    assert_eq!(net.exec_cycle().unwrap_err(), FlowError::Eof);
    assert!(matches!(
        net.exec_cycle(),
        Err(FlowError::InvalidState(_))
    ));
}

#[test]
fn cycle_index_increments() {
    let mut net = build("main: { c: { class: const_float, out: 1.0 } }");
    assert_eq!(net.cycle_idx(), 0);
    net.exec_cycle().unwrap();
    net.exec_cycle().unwrap();
    assert_eq!(net.cycle_idx(), 2);
}

// --- Descriptor flags ---

#[test]
fn mult_variables_carry_distinct_sfx_chains() {
    let mut net = build("main: { m: { class: mixer, any: 2.5 } }");
    let m = net.proc_find("m").unwrap();

    // Two same-labelled inputs with distinct sfx ids.
    net.var_create(m, "in", 1, 0, ANY_CH, None, TypeFl::NONE)
        .unwrap();
    net.var_create(m, "in", 2, 0, ANY_CH, None, TypeFl::NONE)
        .unwrap();

    let a = net.var_find(m, "in", 1, ANY_CH).unwrap();
    let b = net.var_find(m, "in", 2, ANY_CH).unwrap();
    assert_ne!(a, b);
    assert_eq!(net.get_float(a).unwrap(), 0.0);

    // A non-mult variable rejects a second instance.
    assert!(matches!(
        net.var_create(m, "seed", 1, 1, ANY_CH, None, TypeFl::NONE),
        Err(FlowError::InvalidArg(_))
    ));
    check_invariants(&net);
}

#[test]
fn init_only_variables_reject_post_create_writes() {
    let mut net = build("main: { m: { class: mixer, any: 2.5 } }");
    let m = net.proc_find("m").unwrap();
    let seed = net.var_find(m, "seed", 0, ANY_CH).unwrap();

    // The creation-time default landed.
    assert_eq!(net.get_float(seed).unwrap(), 1.0);
    assert!(matches!(
        net.var_set(seed, &Value::Float(9.0)),
        Err(FlowError::InvalidState(_))
    ));
    assert_eq!(net.get_float(seed).unwrap(), 1.0);
}

#[test]
fn runtime_type_pins_at_first_assignment() {
    let mut net = build("main: { m: { class: mixer, any: 2.5 } }");
    let m = net.proc_find("m").unwrap();
    let any = net.var_find(m, "any", 0, ANY_CH).unwrap();

    // The cfg assignment fixed the type to double.
    assert_eq!(net.var(any).type_fl(), TypeFl::DOUBLE);
    assert_eq!(net.get_double(any).unwrap(), 2.5);

    // Later assignments coerce to the pinned type.
    net.var_set(any, &Value::Int(3)).unwrap();
    assert_eq!(net.get_double(any).unwrap(), 3.0);
    assert_eq!(net.var(any).type_fl(), TypeFl::DOUBLE);

    // Non-coercible kinds are rejected.
    assert!(matches!(
        net.var_set(any, &Value::String("nope".into())),
        Err(FlowError::TypeMismatch(_))
    ));
}

// --- Execution-error isolation ---

#[test]
fn exec_errors_do_not_unwind_the_cycle() {
    let mut net = build(
        r#"
        main: {
          bad:  { class: broken },
          tick: { class: counter },
        }
        "#,
    );

    // The broken procedure fails every cycle; the counter still runs.
    net.exec_cycle().unwrap();
    net.exec_cycle().unwrap();

    let tick = net.proc_find("tick").unwrap();
    let n = net.var_find(tick, "n", 0, ANY_CH).unwrap();
    assert_eq!(net.get_int(n).unwrap(), 2);
}

#[test]
fn report_lists_procedures_and_variables() {
    let net = build(
        r#"
        main: {
          const: { class: const_float, out: 0.25 },
          gain:  { class: gain, k: 2.0, in: { in: "const.out" } },
        }
        "#,
    );
    let report = net.report();
    assert!(report.contains("const:0 (const_float)"));
    assert!(report.contains("gain:0 (gain)"));
    assert!(report.contains("k:0 vid:1 ch:any float"));
}

// --- Globals ---

#[test]
fn global_blobs_require_word_sizing() {
    let mut net = build("main: { c: { class: const_float, out: 1.0 } }");
    let word = std::mem::size_of::<usize>();
    net.global_set("gain", "state", vec![0u8; word * 2]).unwrap();
    assert_eq!(net.global_get("gain", "state").unwrap().len(), word * 2);
    assert!(matches!(
        net.global_set("gain", "bad", vec![0u8; word + 1]),
        Err(FlowError::InvalidArg(_))
    ));
    assert!(net.global_get("gain", "missing").is_none());
}
