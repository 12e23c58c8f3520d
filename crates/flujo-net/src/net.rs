//! The network: an ordered collection of procedures plus presets and
//! process-wide global state, with the variable-graph operations that
//! wire and drive it.

use std::collections::HashMap;
use std::sync::Arc;

use flujo_cfg::Obj;
use flujo_core::{AudioBuf, FlowError, MidiBuf, Result, SpectBuf, TypeFl, Value};
use tracing::{debug, error, warn};

use crate::desc::{ClassDict, ProcCtx, ProcImpl, VarFlags};
use crate::device::DeviceDecl;
use crate::preset::{self, NetPreset};
use crate::var::{ANY_CH, ValueRef, Var, VarAddr};

/// Keys of a procedure's cfg dict that are not variable labels.
const RESERVED_PROC_KEYS: [&str; 4] = ["class", "args", "preset", "in"];

/// Longest alias chain the resolver will follow; the variable layer is
/// tree-structured so any longer walk is a corrupted graph.
const MAX_ALIAS_DEPTH: usize = 1024;

/// Engine-wide execution parameters.
#[derive(Debug, Clone, Copy)]
pub struct NetworkParams {
    /// Audio sample rate in Hz.
    pub srate: f32,
    /// Sample frames per execution cycle.
    pub frames_per_cycle: usize,
    /// Cycle count limit for non-real-time runs, `None` for unlimited.
    pub max_cycle_n: Option<u64>,
    /// Treat preset references to missing variables as errors rather
    /// than warnings.
    pub strict_presets: bool,
}

impl Default for NetworkParams {
    fn default() -> Self {
        NetworkParams {
            srate: 48_000.0,
            frames_per_cycle: 64,
            max_cycle_n: None,
            strict_presets: false,
        }
    }
}

impl NetworkParams {
    /// Reads parameters from an optional `params` dict; absent fields
    /// keep their defaults.
    pub fn from_cfg(cfg: Option<&Arc<Obj>>) -> Result<NetworkParams> {
        let mut p = NetworkParams::default();
        let Some(cfg) = cfg else { return Ok(p) };
        if let Some(v) = cfg.member("srate") {
            p.srate = v.as_f64()? as f32;
        }
        if let Some(v) = cfg.member("frames_per_cycle") {
            p.frames_per_cycle = v.as_u64()? as usize;
        }
        if let Some(v) = cfg.member("max_cycle_n") {
            p.max_cycle_n = Some(v.as_u64()?);
        }
        if let Some(v) = cfg.member("strict_presets") {
            p.strict_presets = v.as_bool()?;
        }
        Ok(p)
    }
}

/// Observer of completed variable assignments (the UI bridge attaches
/// here).
pub trait VarListener: Send {
    /// Called after an assignment to `addr` completes, and once per
    /// downstream variable reached by the broadcast.
    fn on_value(&mut self, net: &Network, addr: VarAddr);
}

/// Construction / run / completed phases of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NetState {
    Build,
    Run,
    Done,
}

/// One procedure entry: identity, configuration, and owned variables.
pub(crate) struct ProcEnt {
    label: String,
    label_sfx: u32,
    class_idx: usize,
    arg_cfg: Option<Arc<Obj>>,
    pub(crate) vars: Vec<Var>,
    /// `(vid, channel) -> var index` flat map, built after create.
    var_map: Vec<Option<usize>>,
    /// Channel slots per vid in `var_map` (slot 0 = any-channel).
    map_ch_slots: usize,
    /// True once the map is built; gates `value` callbacks.
    pub(crate) map_built: bool,
}

/// A directed acyclic collection of procedures executed in order, plus
/// its preset list and global-variable store.
pub struct Network {
    dict: Arc<ClassDict>,
    params: NetworkParams,
    devices: Vec<DeviceDecl>,
    pub(crate) procs: Vec<ProcEnt>,
    impls: Vec<Option<Box<dyn ProcImpl>>>,
    presets: Vec<NetPreset>,
    globals: HashMap<(String, String), Vec<u8>>,
    listener: Option<Box<dyn VarListener>>,
    cycle_idx: u64,
    state: NetState,
}

impl Network {
    /// Creates an empty network in the build phase.
    pub fn new(dict: Arc<ClassDict>, params: NetworkParams, devices: Vec<DeviceDecl>) -> Network {
        Network {
            dict,
            params,
            devices,
            procs: Vec::new(),
            impls: Vec::new(),
            presets: Vec::new(),
            globals: HashMap::new(),
            listener: None,
            cycle_idx: 0,
            state: NetState::Build,
        }
    }

    /// Builds a network from a configuration root.
    ///
    /// The root carries a `main` dict with one child dict per procedure
    /// (processed in source order), an optional `params` dict, and an
    /// optional `presets` dict.
    pub fn from_cfg(
        dict: Arc<ClassDict>,
        root: &Arc<Obj>,
        devices: Vec<DeviceDecl>,
    ) -> Result<Network> {
        let params = NetworkParams::from_cfg(root.member("params"))?;
        let mut net = Network::new(dict, params, devices);

        let main = root.get("main")?;
        if !main.is_dict() {
            return Err(FlowError::Syntax {
                line: 0,
                col: 0,
                msg: "'main' must be a dictionary of procedures".to_string(),
            });
        }

        let proc_cfgs: Vec<(String, Arc<Obj>)> = main
            .dict_iter()
            .map(|(label, cfg)| (label.to_string(), Arc::clone(cfg)))
            .collect();
        for (label, cfg) in &proc_cfgs {
            net.create_proc(label, cfg)?;
        }

        if let Some(presets_cfg) = root.member("presets") {
            net.presets = preset::parse_presets(presets_cfg)?;
        }

        net.finalize()?;
        Ok(net)
    }

    // --- Accessors ---

    /// Engine parameters.
    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    /// Monotonic cycle counter.
    pub fn cycle_idx(&self) -> u64 {
        self.cycle_idx
    }

    /// Count of procedures.
    pub fn proc_n(&self) -> usize {
        self.procs.len()
    }

    /// Label of a procedure.
    pub fn proc_label(&self, proc_idx: usize) -> &str {
        &self.procs[proc_idx].label
    }

    /// Class label of a procedure.
    pub fn proc_class_label(&self, proc_idx: usize) -> &str {
        self.class_of(proc_idx).label()
    }

    /// Arg cfg of a procedure.
    pub fn proc_arg_cfg(&self, proc_idx: usize) -> Option<&Arc<Obj>> {
        self.procs[proc_idx].arg_cfg.as_ref()
    }

    /// Finds a procedure by label (sfx 0).
    pub fn proc_find(&self, label: &str) -> Option<usize> {
        self.proc_find_sfx(label, 0)
    }

    /// Finds a procedure by label and sfx id.
    pub fn proc_find_sfx(&self, label: &str, sfx: u32) -> Option<usize> {
        self.procs
            .iter()
            .position(|p| p.label == label && p.label_sfx == sfx)
    }

    /// Indices of every procedure of a class, in execution order.
    pub fn procs_of_class(&self, class_label: &str) -> Vec<usize> {
        (0..self.procs.len())
            .filter(|&i| self.proc_class_label(i) == class_label)
            .collect()
    }

    /// The external-device declarations.
    pub fn devices(&self) -> &[DeviceDecl] {
        &self.devices
    }

    /// Finds a device declaration by label.
    pub fn device_find(&self, label: &str) -> Result<&DeviceDecl> {
        self.devices
            .iter()
            .find(|d| d.label == label)
            .ok_or_else(|| FlowError::EleNotFound(format!("external device '{label}'")))
    }

    /// Attaches the assignment listener (the UI bridge).
    pub fn set_listener(&mut self, listener: Box<dyn VarListener>) {
        self.listener = Some(listener);
    }

    /// The parsed network presets.
    pub fn presets(&self) -> &[NetPreset] {
        &self.presets
    }

    /// Adds a network preset programmatically.
    pub fn add_preset(&mut self, preset: NetPreset) {
        self.presets.push(preset);
    }

    fn class_of(&self, proc_idx: usize) -> &crate::desc::ClassDesc {
        self.dict.by_idx(self.procs[proc_idx].class_idx)
    }

    // --- Procedure creation ---

    /// Creates a procedure from its configuration dict and runs its
    /// class `create` callback, class preset, initial values, and `in`
    /// connections.
    pub fn create_proc(&mut self, label: &str, cfg: &Arc<Obj>) -> Result<usize> {
        if self.state != NetState::Build {
            return Err(FlowError::InvalidState(
                "procedures can only be created before the network is finalized".to_string(),
            ));
        }
        if self.proc_find(label).is_some() {
            return Err(FlowError::Duplicate(format!("procedure '{label}'")));
        }

        let class_label = cfg.get_str("class")?;
        let class_idx = self
            .dict
            .find_idx(class_label)
            .ok_or_else(|| FlowError::EleNotFound(format!("class '{class_label}'")))?;

        let arg_cfg = cfg.member("args").cloned();
        let preset_label = match cfg.member("preset") {
            Some(o) => Some(o.as_str()?.to_string()),
            None => None,
        };

        let proc_idx = self.procs.len();
        self.procs.push(ProcEnt {
            label: label.to_string(),
            label_sfx: 0,
            class_idx,
            arg_cfg,
            vars: Vec::new(),
            var_map: Vec::new(),
            map_ch_slots: 0,
            map_built: false,
        });
        self.impls.push(Some(self.dict.by_idx(class_idx).make()));

        debug!(proc = label, class = class_label, "creating procedure");

        // Class create callback registers the variables it uses.
        self.with_impl(proc_idx, |imp, ctx| imp.create(ctx))
            .map_err(|e| {
                error!(proc = label, %e, "class create callback failed");
                FlowError::OpFail(format!("create of '{label}' failed: {e}"))
            })?;

        // Initial class preset, then explicit values override it.
        if let Some(preset_label) = preset_label {
            self.apply_class_preset(proc_idx, &preset_label)?;
        }

        self.apply_proc_value_cfgs(proc_idx, cfg)?;
        self.apply_proc_connections(proc_idx, cfg)?;

        Ok(proc_idx)
    }

    /// Applies the variable-label keys of a procedure cfg: scalars set
    /// the any-channel base, lists channelize element-per-channel.
    fn apply_proc_value_cfgs(&mut self, proc_idx: usize, cfg: &Arc<Obj>) -> Result<()> {
        let entries: Vec<(String, Arc<Obj>)> = cfg
            .dict_iter()
            .filter(|(k, _)| !RESERVED_PROC_KEYS.contains(k))
            .map(|(k, v)| (k.to_string(), Arc::clone(v)))
            .collect();

        for (var_label, value) in entries {
            let desc_idx = self
                .class_of(proc_idx)
                .find_var_desc(&var_label)
                .map(|(i, _)| i)
                .ok_or_else(|| {
                    FlowError::EleNotFound(format!(
                        "variable '{var_label}' on class '{}'",
                        self.proc_class_label(proc_idx)
                    ))
                })?;
            let vid = desc_idx as u32;

            if value.is_list() {
                let items: Vec<Arc<Obj>> = value.list_iter().cloned().collect();
                for (ch, item) in items.iter().enumerate() {
                    self.var_channelize(proc_idx, &var_label, 0, ch, Some(item), vid)?;
                }
            } else {
                self.var_register(proc_idx, &var_label, 0, vid, ANY_CH, Some(&value))?;
            }
        }
        Ok(())
    }

    /// Wires the `in` statements of a procedure cfg: each maps an input
    /// variable label to a `"procedure.variable"` source reference.
    fn apply_proc_connections(&mut self, proc_idx: usize, cfg: &Arc<Obj>) -> Result<()> {
        let Some(in_cfg) = cfg.member("in") else {
            return Ok(());
        };

        let stmts: Vec<(String, String)> = in_cfg
            .dict_iter()
            .map(|(dst, src)| Ok((dst.to_string(), src.as_str()?.to_string())))
            .collect::<Result<_, flujo_cfg::CfgError>>()?;

        for (dst_label, src_ref) in stmts {
            let (src_proc_label, src_var_label) = src_ref.split_once('.').ok_or_else(|| {
                FlowError::InvalidArg(format!(
                    "source reference '{src_ref}' must be 'procedure.variable'"
                ))
            })?;

            let src_proc = self.proc_find(src_proc_label).ok_or_else(|| {
                FlowError::EleNotFound(format!("source procedure '{src_proc_label}'"))
            })?;
            let src_addr = self.var_find_req(src_proc, src_var_label, 0, ANY_CH)?;

            let desc_idx = self
                .class_of(proc_idx)
                .find_var_desc(&dst_label)
                .map(|(i, _)| i)
                .ok_or_else(|| {
                    FlowError::EleNotFound(format!(
                        "input variable '{dst_label}' on class '{}'",
                        self.proc_class_label(proc_idx)
                    ))
                })?;
            let dst_addr =
                self.var_register(proc_idx, &dst_label, 0, desc_idx as u32, ANY_CH, None)?;

            self.var_connect(src_addr, dst_addr)?;
        }
        Ok(())
    }

    /// Validates every procedure, pins variable types, and builds the
    /// `(vid, channel)` flat maps. The network enters the run phase.
    pub fn finalize(&mut self) -> Result<()> {
        if self.state != NetState::Build {
            return Err(FlowError::InvalidState(
                "network already finalized".to_string(),
            ));
        }
        for proc_idx in 0..self.procs.len() {
            self.validate_proc(proc_idx)?;
            self.build_var_map(proc_idx);
        }
        self.state = NetState::Run;
        Ok(())
    }

    fn validate_proc(&mut self, proc_idx: usize) -> Result<()> {
        for var_idx in 0..self.procs[proc_idx].vars.len() {
            let addr = VarAddr {
                proc: proc_idx,
                var: var_idx,
            };
            let owner = self.resolve_owner(addr)?;
            let value_fl = {
                let v = &self.procs[owner.proc].vars[owner.var];
                v.local[v.local_idx].type_fl()
            };
            let (label, sfx, ch, is_local, desc_idx) = {
                let v = &self.procs[proc_idx].vars[var_idx];
                (v.label.clone(), v.label_sfx, v.ch, v.is_local(), v.desc_idx)
            };

            if value_fl == TypeFl::NONE {
                return Err(FlowError::InvalidState(format!(
                    "no value has been assigned to '{}.{label}:{sfx}' ch:{}",
                    self.procs[proc_idx].label,
                    ch_label(ch)
                )));
            }
            if !value_fl.is_single() {
                return Err(FlowError::InvalidState(format!(
                    "'{}.{label}' holds an ambiguous type {value_fl:?}",
                    self.procs[proc_idx].label
                )));
            }
            if is_local {
                let allowed = self.class_of(proc_idx).var_descs()[desc_idx].type_fl;
                if !allowed.is_runtime() && !allowed.contains(value_fl) {
                    return Err(FlowError::TypeMismatch(format!(
                        "'{}.{label}' holds {value_fl:?}, descriptor allows {allowed:?}",
                        self.procs[proc_idx].label
                    )));
                }
            }

            // Pin the permanent type.
            self.procs[proc_idx].vars[var_idx].type_fl = value_fl;
        }
        Ok(())
    }

    fn build_var_map(&mut self, proc_idx: usize) {
        let ent = &mut self.procs[proc_idx];
        let max_vid = ent.vars.iter().map(|v| v.vid).max().unwrap_or(0) as usize;
        let max_ch = ent
            .vars
            .iter()
            .filter(|v| v.ch != ANY_CH)
            .map(|v| v.ch)
            .max();
        let ch_slots = max_ch.map_or(1, |c| c + 2);

        let mut map = vec![None; (max_vid + 1) * ch_slots];
        for (idx, v) in ent.vars.iter().enumerate() {
            let ch_slot = if v.ch == ANY_CH { 0 } else { v.ch + 1 };
            map[v.vid as usize * ch_slots + ch_slot] = Some(idx);
        }
        ent.var_map = map;
        ent.map_ch_slots = ch_slots;
        ent.map_built = true;
    }

    // --- Variable operations ---

    /// Allocates a new variable on a procedure.
    ///
    /// If the procedure does not yet own an any-channel base for
    /// `(label, sfx)` one is allocated first. The new variable is
    /// appended to the procedure's variable list and, for a concrete
    /// channel, spliced into the channel chain in ascending order. A
    /// given `value_cfg` is assigned unless the descriptor's type is
    /// `runtime`; otherwise the descriptor default applies if present.
    pub fn var_create(
        &mut self,
        proc_idx: usize,
        label: &str,
        sfx: u32,
        vid: u32,
        ch: usize,
        value_cfg: Option<&Arc<Obj>>,
        alt_type: TypeFl,
    ) -> Result<usize> {
        if self.var_find(proc_idx, label, sfx, ch).is_some() {
            return Err(FlowError::Duplicate(format!(
                "variable '{label}:{sfx}' ch:{} on '{}'",
                ch_label(ch),
                self.procs[proc_idx].label
            )));
        }

        let (desc_idx, desc) = self
            .class_of(proc_idx)
            .find_var_desc(label)
            .ok_or_else(|| {
                FlowError::EleNotFound(format!(
                    "variable '{label}' in class '{}'",
                    self.proc_class_label(proc_idx)
                ))
            })?;
        let desc_type = desc.type_fl;
        let desc_default = desc.default_cfg.clone();
        let desc_flags = desc.flags;

        if sfx != 0 && !desc_flags.contains(VarFlags::MULT) {
            return Err(FlowError::InvalidArg(format!(
                "variable '{label}' does not allow multiple instances (sfx {sfx})"
            )));
        }

        // The any-channel base precedes every channelized variant.
        if ch != ANY_CH && self.var_find(proc_idx, label, sfx, ANY_CH).is_none() {
            self.var_create(proc_idx, label, sfx, vid, ANY_CH, None, alt_type)?;
        }

        let mut var = Var::new(label, sfx, vid, ch, desc_idx);
        if alt_type != TypeFl::NONE {
            var.type_fl = alt_type;
        }
        let var_idx = self.procs[proc_idx].vars.len();
        self.procs[proc_idx].vars.push(var);

        if ch != ANY_CH {
            self.splice_ch_chain(proc_idx, var_idx)?;
        }

        let effective_cfg = value_cfg.cloned().or(desc_default);
        if let Some(cfg) = effective_cfg
            && !desc_type.is_runtime()
        {
            self.var_set_from_cfg(
                VarAddr {
                    proc: proc_idx,
                    var: var_idx,
                },
                &cfg,
            )?;
        }

        // Channelization after finalize must stay addressable by vid.
        if self.procs[proc_idx].map_built {
            self.build_var_map(proc_idx);
        }

        debug!(
            proc = %self.procs[proc_idx].label,
            var = label,
            ch = %ch_label(ch),
            "created variable"
        );
        Ok(var_idx)
    }

    /// Splices a freshly created channelized variable into its
    /// `(label, sfx)` chain in ascending channel order.
    fn splice_ch_chain(&mut self, proc_idx: usize, var_idx: usize) -> Result<()> {
        let (label, sfx, ch) = {
            let v = &self.procs[proc_idx].vars[var_idx];
            (v.label.clone(), v.label_sfx, v.ch)
        };
        let base_idx = self
            .var_find(proc_idx, &label, sfx, ANY_CH)
            .ok_or_else(|| {
                FlowError::InvalidState(format!(
                    "any-channel base missing for '{label}:{sfx}' on '{}'",
                    self.procs[proc_idx].label
                ))
            })?
            .var;

        let vars = &mut self.procs[proc_idx].vars;
        let mut prev = base_idx;
        let mut next = vars[base_idx].ch_link;
        while let Some(n) = next {
            if vars[n].ch > ch {
                break;
            }
            prev = n;
            next = vars[n].ch_link;
        }
        vars[var_idx].ch_link = next;
        vars[prev].ch_link = Some(var_idx);
        Ok(())
    }

    /// The polyphonic fan-out operator.
    ///
    /// Returns the existing variable (updating its value when a cfg is
    /// given) or creates the channelized variant. Without a value cfg
    /// the new variable either connects to the best-matching channel of
    /// the base's source or deep-copies the base's local value.
    pub fn var_channelize(
        &mut self,
        proc_idx: usize,
        label: &str,
        sfx: u32,
        ch: usize,
        value_cfg: Option<&Arc<Obj>>,
        vid: u32,
    ) -> Result<usize> {
        let base_addr = self.var_find(proc_idx, label, sfx, ANY_CH).ok_or_else(|| {
            FlowError::InvalidState(format!(
                "the any-channel base for '{label}:{sfx}' on '{}' does not exist",
                self.procs[proc_idx].label
            ))
        })?;

        if let Some(existing) = self.var_find(proc_idx, label, sfx, ch) {
            if let Some(cfg) = value_cfg {
                self.var_set_from_cfg(existing, cfg)?;
            } else {
                warn!(
                    proc = %self.procs[proc_idx].label,
                    var = label,
                    ch = %ch_label(ch),
                    "existing variable channelized without a value"
                );
            }
            return Ok(existing.var);
        }

        if ch == ANY_CH {
            return Ok(base_addr.var);
        }

        let var_idx = self.var_create(proc_idx, label, sfx, vid, ch, value_cfg, TypeFl::NONE)?;
        let new_addr = VarAddr {
            proc: proc_idx,
            var: var_idx,
        };

        if value_cfg.is_none() {
            let base_src = self.procs[proc_idx].vars[base_addr.var].src;
            if let Some(src_head) = base_src {
                // Walk the source's channel chain for a matching channel;
                // otherwise take the last one.
                let mut cursor = src_head;
                let mut chosen = src_head;
                let mut non_any_n = 0usize;
                let mut matched = false;
                loop {
                    let v = &self.procs[cursor.proc].vars[cursor.var];
                    chosen = cursor;
                    if v.ch == ch {
                        matched = true;
                        break;
                    }
                    if v.ch != ANY_CH {
                        non_any_n += 1;
                    }
                    match v.ch_link {
                        Some(next) => {
                            cursor = VarAddr {
                                proc: cursor.proc,
                                var: next,
                            };
                        }
                        None => break,
                    }
                }

                if !matched && non_any_n > 1 {
                    warn!(
                        src = %self.procs[chosen.proc].label,
                        dst = %self.procs[proc_idx].label,
                        var = label,
                        ch,
                        "channel fan-out has no matching source channel; connecting to the last source channel"
                    );
                }

                self.var_connect(chosen, new_addr)?;
            } else {
                // Deep-copy the base's value; keep the new variable
                // aimed at its own ring like the base.
                let copied = self.value(base_addr)?.clone();
                let base_type = self.procs[proc_idx].vars[base_addr.var].type_fl;
                let v = &mut self.procs[proc_idx].vars[var_idx];
                let idx = v.local_idx;
                v.local[idx] = copied;
                v.type_fl = base_type;
                v.vref = ValueRef::Local;
            }
        }

        Ok(var_idx)
    }

    /// Links `dst` as a destination of `src`.
    ///
    /// Precondition: `dst` has no source. Afterwards `dst` resolves its
    /// value through `src` and appears in `src`'s destination list.
    pub fn var_connect(&mut self, src: VarAddr, dst: VarAddr) -> Result<()> {
        if src == dst {
            return Err(FlowError::InvalidArg(
                "a variable cannot feed itself".to_string(),
            ));
        }
        if self.procs[dst.proc].vars[dst.var].src.is_some() {
            return Err(FlowError::InvalidState(format!(
                "variable '{}' is already connected",
                self.var_desc_path(dst)
            )));
        }
        let desc_flags = {
            let v = &self.procs[dst.proc].vars[dst.var];
            self.class_of(dst.proc).var_descs()[v.desc_idx].flags
        };
        if desc_flags.contains(VarFlags::NO_SRC) {
            return Err(FlowError::InvalidState(format!(
                "variable '{}' must not be connected to a source",
                self.var_desc_path(dst)
            )));
        }

        self.procs[dst.proc].vars[dst.var].vref = ValueRef::Alias(src);
        self.procs[dst.proc].vars[dst.var].src = Some(src);
        self.procs[src.proc].vars[src.var].dsts.push(dst);
        Ok(())
    }

    /// Removes `dst` from its source's destination list.
    ///
    /// The value stays aliased; the caller is expected to reassign.
    pub fn var_disconnect(&mut self, dst: VarAddr) -> Result<()> {
        let Some(src) = self.procs[dst.proc].vars[dst.var].src.take() else {
            return Ok(());
        };
        self.procs[src.proc].vars[src.var]
            .dsts
            .retain(|&d| d != dst);
        Ok(())
    }

    /// Direct lookup by `(label, sfx, channel)`; always a linear scan of
    /// the procedure's variable list.
    pub fn var_find(&self, proc_idx: usize, label: &str, sfx: u32, ch: usize) -> Option<VarAddr> {
        self.procs[proc_idx]
            .vars
            .iter()
            .position(|v| v.label == label && v.label_sfx == sfx && v.ch == ch)
            .map(|var| VarAddr {
                proc: proc_idx,
                var,
            })
    }

    /// Like [`var_find`](Self::var_find) but failing with `EleNotFound`.
    pub fn var_find_req(
        &self,
        proc_idx: usize,
        label: &str,
        sfx: u32,
        ch: usize,
    ) -> Result<VarAddr> {
        self.var_find(proc_idx, label, sfx, ch).ok_or_else(|| {
            FlowError::EleNotFound(format!(
                "variable '{label}:{sfx}' ch:{} on '{}'",
                ch_label(ch),
                self.procs[proc_idx].label
            ))
        })
    }

    /// Direct lookup by `(vid, channel)`; O(1) through the flat map once
    /// the procedure is fully created, linear before that.
    pub fn var_find_vid(&self, proc_idx: usize, vid: u32, ch: usize) -> Result<VarAddr> {
        let ent = &self.procs[proc_idx];
        if ent.map_built {
            let ch_slot = if ch == ANY_CH { 0 } else { ch + 1 };
            let idx = vid as usize * ent.map_ch_slots + ch_slot;
            if let Some(Some(var)) = ent.var_map.get(idx) {
                return Ok(VarAddr {
                    proc: proc_idx,
                    var: *var,
                });
            }
        } else if let Some(var) = ent.vars.iter().position(|v| v.vid == vid && v.ch == ch) {
            return Ok(VarAddr {
                proc: proc_idx,
                var,
            });
        }
        Err(FlowError::InvalidId(format!(
            "no variable with vid {vid} ch:{} on '{}'",
            ch_label(ch),
            ent.label
        )))
    }

    /// Lookup by `(vid, channel)` falling back to the any-channel base -
    /// the read path procedures use for channels that inherit the base
    /// value.
    pub fn var_find_vid_or_any(&self, proc_idx: usize, vid: u32, ch: usize) -> Result<VarAddr> {
        match self.var_find_vid(proc_idx, vid, ch) {
            Ok(addr) => Ok(addr),
            Err(_) if ch != ANY_CH => self.var_find_vid(proc_idx, vid, ANY_CH),
            Err(e) => Err(e),
        }
    }

    /// Public registration used by class `create` callbacks.
    ///
    /// Updates the value of an existing `(label, sfx, channel)` variable
    /// or creates it (any-channel base first when missing). The base and
    /// its channelized siblings share one vid.
    pub fn var_register(
        &mut self,
        proc_idx: usize,
        label: &str,
        sfx: u32,
        vid: u32,
        ch: usize,
        value_cfg: Option<&Arc<Obj>>,
    ) -> Result<VarAddr> {
        if let Some(addr) = self.var_find(proc_idx, label, sfx, ch) {
            if let Some(cfg) = value_cfg {
                self.var_set_from_cfg(addr, cfg)?;
            }
            return Ok(addr);
        }

        let var_idx = if ch == ANY_CH {
            self.var_create(proc_idx, label, sfx, vid, ch, value_cfg, TypeFl::NONE)?
        } else {
            // The any-channel base precedes the channelized variant.
            if self.var_find(proc_idx, label, sfx, ANY_CH).is_none() {
                self.var_create(proc_idx, label, sfx, vid, ANY_CH, None, TypeFl::NONE)?;
            }
            self.var_channelize(proc_idx, label, sfx, ch, value_cfg, vid)?
        };
        Ok(VarAddr {
            proc: proc_idx,
            var: var_idx,
        })
    }

    /// Registers a variable and gives it a freshly allocated audio
    /// buffer.
    pub fn var_register_audio(
        &mut self,
        proc_idx: usize,
        label: &str,
        sfx: u32,
        vid: u32,
        ch: usize,
        srate: f32,
        ch_n: usize,
        frame_n: usize,
    ) -> Result<VarAddr> {
        let addr = self.var_register(proc_idx, label, sfx, vid, ch, None)?;
        self.var_set_value(addr, &Value::Audio(AudioBuf::new(srate, ch_n, frame_n)))?;
        Ok(addr)
    }

    /// Registers a variable and gives it a freshly allocated spectrum
    /// buffer.
    #[allow(clippy::too_many_arguments)]
    pub fn var_register_spectrum(
        &mut self,
        proc_idx: usize,
        label: &str,
        sfx: u32,
        vid: u32,
        ch: usize,
        srate: f32,
        ch_n: usize,
        max_bin_n: usize,
        bin_n: usize,
        hop_smp_n: usize,
    ) -> Result<VarAddr> {
        let addr = self.var_register(proc_idx, label, sfx, vid, ch, None)?;
        let fbuf = SpectBuf::new(srate, ch_n, max_bin_n, bin_n, hop_smp_n)?;
        self.var_set_value(addr, &Value::Spectrum(fbuf))?;
        Ok(addr)
    }

    /// Registers a variable and gives it an empty MIDI buffer.
    pub fn var_register_midi(
        &mut self,
        proc_idx: usize,
        label: &str,
        sfx: u32,
        vid: u32,
        max_msg_n: usize,
    ) -> Result<VarAddr> {
        let addr = self.var_register(proc_idx, label, sfx, vid, ANY_CH, None)?;
        self.var_set_value(addr, &Value::Midi(MidiBuf::new(max_msg_n)))?;
        Ok(addr)
    }

    // --- Assignment ---

    /// The assignment path.
    ///
    /// Rejects writes to connected inputs. Addressing the any-channel
    /// variable assigns every variable of the channel chain in index
    /// order, stopping on the first error.
    pub fn var_set(&mut self, addr: VarAddr, value: &Value) -> Result<()> {
        let var = &self.procs[addr.proc].vars[addr.var];
        if var.src.is_some() {
            return Err(FlowError::InvalidState(format!(
                "variable '{}' cannot be set: it is connected to a source",
                self.var_desc_path(addr)
            )));
        }

        if var.ch == ANY_CH {
            let mut chain = vec![addr.var];
            let mut cursor = var.ch_link;
            while let Some(i) = cursor {
                chain.push(i);
                cursor = self.procs[addr.proc].vars[i].ch_link;
            }
            for var_idx in chain {
                self.var_set_value(
                    VarAddr {
                        proc: addr.proc,
                        var: var_idx,
                    },
                    value,
                )?;
            }
            Ok(())
        } else {
            self.var_set_value(addr, value)
        }
    }

    /// Assigns a variable from a configuration value.
    pub fn var_set_from_cfg(&mut self, addr: VarAddr, cfg: &Arc<Obj>) -> Result<()> {
        let value = Value::from_cfg(cfg);
        self.var_set(addr, &value)
    }

    /// Single-variable assignment protocol: ring rotation, type pinning,
    /// `value` callback with rollback, then iterative depth-first
    /// broadcast.
    fn var_set_value(&mut self, addr: VarAddr, value: &Value) -> Result<()> {
        let (prev_idx, prev_ref, next_idx, target_fl) = {
            let ent = &self.procs[addr.proc];
            let var = &ent.vars[addr.var];

            if var.src.is_some() {
                return Err(FlowError::InvalidState(format!(
                    "variable '{}' cannot be set: it is connected to a source",
                    self.var_desc_path(addr)
                )));
            }

            let desc = &self.class_of(addr.proc).var_descs()[var.desc_idx];
            if ent.map_built && desc.flags.contains(VarFlags::INIT) {
                return Err(FlowError::InvalidState(format!(
                    "variable '{}' is init-only",
                    self.var_desc_path(addr)
                )));
            }

            // Pick the concrete type (step 2 of the protocol).
            let target_fl = if var.type_fl == TypeFl::NONE {
                let allowed = desc.type_fl;
                if allowed.is_single() {
                    allowed.first()
                } else {
                    let inter = allowed.intersect(value.type_fl());
                    if inter.is_empty() && !allowed.is_runtime() {
                        return Err(FlowError::TypeMismatch(format!(
                            "variable '{}' admits {allowed:?}, value is {:?}",
                            self.var_desc_path(addr),
                            value.type_fl()
                        )));
                    }
                    if inter.is_empty() {
                        // Runtime type adopts the source kind.
                        value.type_fl()
                    } else {
                        inter.first()
                    }
                }
            } else {
                var.type_fl
            };

            let next_idx = (var.local_idx + 1) % crate::var::LOCAL_VALUE_N;
            (var.local_idx, var.vref, next_idx, target_fl)
        };

        let coerced = value.coerce_to(target_fl)?;

        {
            let var = &mut self.procs[addr.proc].vars[addr.var];
            // Reserve the next ring slot; its previous payload releases
            // here.
            var.local[next_idx] = coerced;
            var.local_idx = next_idx;
            var.vref = ValueRef::Local;
            var.type_fl = target_fl;
        }

        // Post-create, the class sees the assignment and may veto it.
        if self.procs[addr.proc].map_built {
            if let Err(e) = self.call_value_cb(addr) {
                let var = &mut self.procs[addr.proc].vars[addr.var];
                var.local_idx = prev_idx;
                var.vref = prev_ref;
                return Err(FlowError::OpFail(format!(
                    "value callback rejected assignment to '{}': {e}",
                    self.var_desc_path(addr)
                )));
            }
            self.notify_listener(addr);
            self.broadcast(addr);
        }

        Ok(())
    }

    /// Depth-first broadcast: every downstream variable's class sees the
    /// change before control returns to the writer. Failures are logged,
    /// not rolled back.
    fn broadcast(&mut self, from: VarAddr) {
        let mut stack: Vec<VarAddr> = Vec::new();
        let seed = &self.procs[from.proc].vars[from.var].dsts;
        stack.extend(seed.iter().rev().copied());

        let mut guard = 0usize;
        while let Some(dst) = stack.pop() {
            guard += 1;
            if guard > MAX_ALIAS_DEPTH * MAX_ALIAS_DEPTH {
                error!("broadcast aborted: destination graph too deep");
                return;
            }
            if let Err(e) = self.call_value_cb(dst) {
                warn!(
                    var = %self.var_desc_path(dst),
                    %e,
                    "broadcast value callback failed"
                );
            }
            self.notify_listener(dst);
            let next = &self.procs[dst.proc].vars[dst.var].dsts;
            stack.extend(next.iter().rev().copied());
        }
    }

    /// Invokes the owning class's `value` callback for `addr`.
    fn call_value_cb(&mut self, addr: VarAddr) -> Result<()> {
        if !self.procs[addr.proc].map_built {
            return Ok(());
        }
        self.with_impl(addr.proc, |imp, ctx| imp.value(ctx, addr))
    }

    fn notify_listener(&mut self, addr: VarAddr) {
        if let Some(mut listener) = self.listener.take() {
            listener.on_value(self, addr);
            self.listener = Some(listener);
        }
    }

    /// Runs a callback with the procedure's class instance taken out of
    /// the network, so the callback can freely address the network.
    fn with_impl<F>(&mut self, proc_idx: usize, f: F) -> Result<()>
    where
        F: FnOnce(&mut Box<dyn ProcImpl>, &mut ProcCtx) -> Result<()>,
    {
        let Some(mut imp) = self.impls[proc_idx].take() else {
            // Re-entered the same procedure mid-callback; skip quietly.
            debug!(
                proc = %self.procs[proc_idx].label,
                "callback re-entry skipped"
            );
            return Ok(());
        };
        let rc = f(
            &mut imp,
            &mut ProcCtx {
                net: self,
                proc_idx,
            },
        );
        self.impls[proc_idx] = Some(imp);
        rc
    }

    // --- Value resolution ---

    /// Follows the alias chain of `addr` to the variable owning the
    /// active value.
    pub fn resolve_owner(&self, addr: VarAddr) -> Result<VarAddr> {
        let mut cursor = addr;
        for _ in 0..MAX_ALIAS_DEPTH {
            match self.procs[cursor.proc].vars[cursor.var].vref {
                ValueRef::Local => return Ok(cursor),
                ValueRef::Alias(next) => cursor = next,
            }
        }
        Err(FlowError::InvalidState(format!(
            "alias chain from '{}' exceeds {MAX_ALIAS_DEPTH} links",
            self.var_desc_path(addr)
        )))
    }

    /// The resolved value of a variable.
    pub fn value(&self, addr: VarAddr) -> Result<&Value> {
        let owner = self.resolve_owner(addr)?;
        let v = &self.procs[owner.proc].vars[owner.var];
        Ok(&v.local[v.local_idx])
    }

    /// Mutable access to the resolved value (buffer-owning variables).
    pub fn value_mut(&mut self, addr: VarAddr) -> Result<&mut Value> {
        let owner = self.resolve_owner(addr)?;
        let v = &mut self.procs[owner.proc].vars[owner.var];
        Ok(&mut v.local[v.local_idx])
    }

    /// Immutable access to a variable record.
    pub fn var(&self, addr: VarAddr) -> &Var {
        &self.procs[addr.proc].vars[addr.var]
    }

    /// Count of variables on a procedure.
    pub fn var_n(&self, proc_idx: usize) -> usize {
        self.procs[proc_idx].vars.len()
    }

    /// Typed read shorthands over [`value`](Self::value).
    pub fn get_float(&self, addr: VarAddr) -> Result<f32> {
        self.value(addr)?.as_float()
    }

    /// Reads a resolved `f64`.
    pub fn get_double(&self, addr: VarAddr) -> Result<f64> {
        self.value(addr)?.as_double()
    }

    /// Reads a resolved `bool`.
    pub fn get_bool(&self, addr: VarAddr) -> Result<bool> {
        self.value(addr)?.as_bool()
    }

    /// Reads a resolved `i32`.
    pub fn get_int(&self, addr: VarAddr) -> Result<i32> {
        self.value(addr)?.as_int()
    }

    /// Reads a resolved `u32`.
    pub fn get_uint(&self, addr: VarAddr) -> Result<u32> {
        self.value(addr)?.as_uint()
    }

    /// Reads the resolved audio buffer.
    pub fn abuf(&self, addr: VarAddr) -> Result<&AudioBuf> {
        self.value(addr)?.as_audio()
    }

    /// Mutable resolved audio buffer.
    pub fn abuf_mut(&mut self, addr: VarAddr) -> Result<&mut AudioBuf> {
        self.value_mut(addr)?.as_audio_mut()
    }

    /// Reads the resolved spectrum buffer.
    pub fn spect(&self, addr: VarAddr) -> Result<&SpectBuf> {
        self.value(addr)?.as_spectrum()
    }

    /// Mutable resolved spectrum buffer.
    pub fn spect_mut(&mut self, addr: VarAddr) -> Result<&mut SpectBuf> {
        self.value_mut(addr)?.as_spectrum_mut()
    }

    /// Reads the resolved MIDI buffer.
    pub fn midi(&self, addr: VarAddr) -> Result<&MidiBuf> {
        self.value(addr)?.as_midi()
    }

    /// Mutable resolved MIDI buffer.
    pub fn midi_mut(&mut self, addr: VarAddr) -> Result<&mut MidiBuf> {
        self.value_mut(addr)?.as_midi_mut()
    }

    // --- Execution ---

    /// Runs one cycle: every procedure's `exec` in network order.
    ///
    /// Execution errors inside a procedure are logged and the next
    /// procedure runs. Returns `Eof` once any procedure signals
    /// completion (the end-of-stream sentinel); later calls fail with
    /// `InvalidState`.
    pub fn exec_cycle(&mut self) -> Result<()> {
        match self.state {
            NetState::Build => {
                return Err(FlowError::InvalidState(
                    "the network has not been finalized".to_string(),
                ));
            }
            NetState::Done => {
                return Err(FlowError::InvalidState(
                    "the network has completed; unload and reload to run again".to_string(),
                ));
            }
            NetState::Run => {}
        }

        let mut eof = false;
        for proc_idx in 0..self.procs.len() {
            match self.with_impl(proc_idx, |imp, ctx| imp.exec(ctx)) {
                Ok(()) => {}
                Err(FlowError::Eof) => eof = true,
                Err(e) => {
                    error!(
                        proc = %self.procs[proc_idx].label,
                        %e,
                        "exec failed; continuing with the next procedure"
                    );
                }
            }
        }

        self.cycle_idx += 1;
        if let Some(max) = self.params.max_cycle_n
            && self.cycle_idx >= max
        {
            eof = true;
        }

        if eof {
            self.state = NetState::Done;
            return Err(FlowError::Eof);
        }
        Ok(())
    }

    /// Invokes each class's `destroy` callback in reverse network order
    /// and marks the network completed.
    pub fn shutdown(&mut self) -> Result<()> {
        for proc_idx in (0..self.procs.len()).rev() {
            if let Err(e) = self.with_impl(proc_idx, |imp, ctx| imp.destroy(ctx)) {
                warn!(
                    proc = %self.procs[proc_idx].label,
                    %e,
                    "destroy callback failed"
                );
            }
        }
        self.state = NetState::Done;
        Ok(())
    }

    // --- Presets ---

    /// Applies a class preset to one procedure: the preset cfg maps
    /// variable labels to values (lists channelize per element).
    pub fn apply_class_preset(&mut self, proc_idx: usize, preset_label: &str) -> Result<()> {
        let preset_cfg = self
            .class_of(proc_idx)
            .find_preset(preset_label)
            .ok_or_else(|| {
                FlowError::EleNotFound(format!(
                    "preset '{preset_label}' on class '{}'",
                    self.proc_class_label(proc_idx)
                ))
            })?
            .clone();
        self.apply_proc_value_cfgs(proc_idx, &preset_cfg)
    }

    /// Applies a network preset by label.
    pub fn apply_preset(&mut self, label: &str) -> Result<()> {
        let preset = self
            .presets
            .iter()
            .find(|p| p.label() == label)
            .ok_or_else(|| FlowError::EleNotFound(format!("network preset '{label}'")))?
            .clone();
        preset::apply(self, &preset)
    }

    // --- Global variables ---

    /// Stores a process-wide blob keyed by `(class label, var label)`.
    /// Blobs must be sized to whole machine words.
    pub fn global_set(&mut self, class_label: &str, var_label: &str, blob: Vec<u8>) -> Result<()> {
        if blob.len() % std::mem::size_of::<usize>() != 0 {
            return Err(FlowError::InvalidArg(format!(
                "global blob length {} is not a whole-word multiple",
                blob.len()
            )));
        }
        self.globals
            .insert((class_label.to_string(), var_label.to_string()), blob);
        Ok(())
    }

    /// Reads a process-wide blob.
    pub fn global_get(&self, class_label: &str, var_label: &str) -> Option<&[u8]> {
        self.globals
            .get(&(class_label.to_string(), var_label.to_string()))
            .map(Vec::as_slice)
    }

    // --- Diagnostics ---

    /// Multi-line description of the network: every procedure with its
    /// class, optional class report, and variable list.
    pub fn report(&self) -> String {
        use std::fmt::Write as _;

        let mut out = String::new();
        for (i, ent) in self.procs.iter().enumerate() {
            let class = self.dict.by_idx(ent.class_idx);
            let _ = writeln!(out, "{}:{} ({})", ent.label, ent.label_sfx, class.label());
            if let Some(imp) = self.impls[i].as_ref() {
                let r = imp.report();
                if !r.is_empty() {
                    let _ = writeln!(out, "  [{r}]");
                }
            }
            for v in &ent.vars {
                let _ = writeln!(
                    out,
                    "  {}:{} vid:{} ch:{} {:?}",
                    v.label,
                    v.label_sfx,
                    v.vid,
                    ch_label(v.ch),
                    v.type_fl
                );
            }
        }
        out
    }

    /// `proc.var:sfx[ch]` path used in error messages.
    fn var_desc_path(&self, addr: VarAddr) -> String {
        let v = &self.procs[addr.proc].vars[addr.var];
        format!(
            "{}.{}:{}[{}]",
            self.procs[addr.proc].label,
            v.label,
            v.label_sfx,
            ch_label(v.ch)
        )
    }
}

fn ch_label(ch: usize) -> String {
    if ch == ANY_CH {
        "any".to_string()
    } else {
        ch.to_string()
    }
}

// --- The procedure-callback view ---

impl ProcCtx<'_> {
    /// This procedure's network index.
    pub fn proc_idx(&self) -> usize {
        self.proc_idx
    }

    /// This procedure's label.
    pub fn proc_label(&self) -> String {
        self.net.proc_label(self.proc_idx).to_string()
    }

    /// The `args` cfg of this procedure, if any.
    pub fn arg_cfg(&self) -> Option<Arc<Obj>> {
        self.net.proc_arg_cfg(self.proc_idx).cloned()
    }

    /// Engine sample rate.
    pub fn srate(&self) -> f32 {
        self.net.params().srate
    }

    /// Frames per execution cycle.
    pub fn frames_per_cycle(&self) -> usize {
        self.net.params().frames_per_cycle
    }

    /// Current cycle index.
    pub fn cycle_idx(&self) -> u64 {
        self.net.cycle_idx()
    }

    /// Finds an external-device declaration by label.
    pub fn device(&self, label: &str) -> Result<DeviceDecl> {
        self.net.device_find(label).cloned()
    }

    /// Registers a `(label, sfx 0)` variable with an optional value.
    pub fn register(
        &mut self,
        label: &str,
        vid: u32,
        ch: usize,
        value_cfg: Option<&Arc<Obj>>,
    ) -> Result<VarAddr> {
        self.net
            .var_register(self.proc_idx, label, 0, vid, ch, value_cfg)
    }

    /// Registers a variable backed by a fresh audio buffer.
    pub fn register_audio(
        &mut self,
        label: &str,
        vid: u32,
        ch: usize,
        srate: f32,
        ch_n: usize,
        frame_n: usize,
    ) -> Result<VarAddr> {
        self.net
            .var_register_audio(self.proc_idx, label, 0, vid, ch, srate, ch_n, frame_n)
    }

    /// Registers a variable backed by a fresh spectrum buffer.
    #[allow(clippy::too_many_arguments)]
    pub fn register_spectrum(
        &mut self,
        label: &str,
        vid: u32,
        ch: usize,
        srate: f32,
        ch_n: usize,
        max_bin_n: usize,
        bin_n: usize,
        hop_smp_n: usize,
    ) -> Result<VarAddr> {
        self.net.var_register_spectrum(
            self.proc_idx,
            label,
            0,
            vid,
            ch,
            srate,
            ch_n,
            max_bin_n,
            bin_n,
            hop_smp_n,
        )
    }

    /// Registers a variable backed by an empty MIDI buffer.
    pub fn register_midi(&mut self, label: &str, vid: u32, max_msg_n: usize) -> Result<VarAddr> {
        self.net
            .var_register_midi(self.proc_idx, label, 0, vid, max_msg_n)
    }

    /// Channelizes a `(label, sfx 0)` variable.
    pub fn channelize(
        &mut self,
        label: &str,
        ch: usize,
        value_cfg: Option<&Arc<Obj>>,
    ) -> Result<VarAddr> {
        let vid = self
            .net
            .var_find_req(self.proc_idx, label, 0, ANY_CH)?
            .var;
        let vid = self.net.procs[self.proc_idx].vars[vid].vid;
        let var = self
            .net
            .var_channelize(self.proc_idx, label, 0, ch, value_cfg, vid)?;
        Ok(VarAddr {
            proc: self.proc_idx,
            var,
        })
    }

    /// Finds a variable on this procedure by label.
    pub fn find(&self, label: &str, ch: usize) -> Result<VarAddr> {
        self.net.var_find_req(self.proc_idx, label, 0, ch)
    }

    /// The concrete channel indices of a variable's chain, ascending.
    pub fn channels_of(&self, label: &str) -> Result<Vec<usize>> {
        let base = self.net.var_find_req(self.proc_idx, label, 0, ANY_CH)?;
        let mut out = Vec::new();
        let mut cursor = self.net.procs[self.proc_idx].vars[base.var].ch_link;
        while let Some(i) = cursor {
            out.push(self.net.procs[self.proc_idx].vars[i].ch);
            cursor = self.net.procs[self.proc_idx].vars[i].ch_link;
        }
        Ok(out)
    }

    /// Reads `f32` by `(vid, ch)`, inheriting the any-channel base when
    /// the channel variable does not exist.
    pub fn get_float(&self, vid: u32, ch: usize) -> Result<f32> {
        let addr = self.net.var_find_vid_or_any(self.proc_idx, vid, ch)?;
        self.net.get_float(addr)
    }

    /// Reads `f64` by `(vid, ch)` with any-channel fallback.
    pub fn get_double(&self, vid: u32, ch: usize) -> Result<f64> {
        let addr = self.net.var_find_vid_or_any(self.proc_idx, vid, ch)?;
        self.net.get_double(addr)
    }

    /// Reads `bool` by `(vid, ch)` with any-channel fallback.
    pub fn get_bool(&self, vid: u32, ch: usize) -> Result<bool> {
        let addr = self.net.var_find_vid_or_any(self.proc_idx, vid, ch)?;
        self.net.get_bool(addr)
    }

    /// Reads `i32` by `(vid, ch)` with any-channel fallback.
    pub fn get_int(&self, vid: u32, ch: usize) -> Result<i32> {
        let addr = self.net.var_find_vid_or_any(self.proc_idx, vid, ch)?;
        self.net.get_int(addr)
    }

    /// Reads `u32` by `(vid, ch)` with any-channel fallback.
    pub fn get_uint(&self, vid: u32, ch: usize) -> Result<u32> {
        let addr = self.net.var_find_vid_or_any(self.proc_idx, vid, ch)?;
        self.net.get_uint(addr)
    }

    /// Reads the string value by `(vid, ch)` with any-channel fallback.
    pub fn get_str(&self, vid: u32, ch: usize) -> Result<String> {
        let addr = self.net.var_find_vid_or_any(self.proc_idx, vid, ch)?;
        Ok(self.net.value(addr)?.as_str()?.to_string())
    }

    /// Writes an `f32` through the full assignment path.
    pub fn set_float(&mut self, vid: u32, ch: usize, v: f32) -> Result<()> {
        let addr = self.net.var_find_vid(self.proc_idx, vid, ch)?;
        self.net.var_set(addr, &Value::Float(v))
    }

    /// Writes an `f64` through the full assignment path.
    pub fn set_double(&mut self, vid: u32, ch: usize, v: f64) -> Result<()> {
        let addr = self.net.var_find_vid(self.proc_idx, vid, ch)?;
        self.net.var_set(addr, &Value::Double(v))
    }

    /// Writes a `bool` through the full assignment path.
    pub fn set_bool(&mut self, vid: u32, ch: usize, v: bool) -> Result<()> {
        let addr = self.net.var_find_vid(self.proc_idx, vid, ch)?;
        self.net.var_set(addr, &Value::Bool(v))
    }

    /// Writes an `i32` through the full assignment path.
    pub fn set_int(&mut self, vid: u32, ch: usize, v: i32) -> Result<()> {
        let addr = self.net.var_find_vid(self.proc_idx, vid, ch)?;
        self.net.var_set(addr, &Value::Int(v))
    }

    /// Writes a `u32` through the full assignment path.
    pub fn set_uint(&mut self, vid: u32, ch: usize, v: u32) -> Result<()> {
        let addr = self.net.var_find_vid(self.proc_idx, vid, ch)?;
        self.net.var_set(addr, &Value::UInt(v))
    }

    /// Resolved audio buffer by `(vid, ch)` with any-channel fallback.
    pub fn abuf(&self, vid: u32, ch: usize) -> Result<&AudioBuf> {
        let addr = self.net.var_find_vid_or_any(self.proc_idx, vid, ch)?;
        self.net.abuf(addr)
    }

    /// Mutable resolved audio buffer by `(vid, ch)`.
    pub fn abuf_mut(&mut self, vid: u32, ch: usize) -> Result<&mut AudioBuf> {
        let addr = self.net.var_find_vid_or_any(self.proc_idx, vid, ch)?;
        self.net.abuf_mut(addr)
    }

    /// Resolved spectrum buffer by `(vid, ch)`.
    pub fn spect(&self, vid: u32, ch: usize) -> Result<&SpectBuf> {
        let addr = self.net.var_find_vid_or_any(self.proc_idx, vid, ch)?;
        self.net.spect(addr)
    }

    /// Mutable resolved spectrum buffer by `(vid, ch)`.
    pub fn spect_mut(&mut self, vid: u32, ch: usize) -> Result<&mut SpectBuf> {
        let addr = self.net.var_find_vid_or_any(self.proc_idx, vid, ch)?;
        self.net.spect_mut(addr)
    }

    /// Resolved MIDI buffer by `(vid, ch)`.
    pub fn midi(&self, vid: u32, ch: usize) -> Result<&MidiBuf> {
        let addr = self.net.var_find_vid_or_any(self.proc_idx, vid, ch)?;
        self.net.midi(addr)
    }

    /// Mutable resolved MIDI buffer by `(vid, ch)`.
    pub fn midi_mut(&mut self, vid: u32, ch: usize) -> Result<&mut MidiBuf> {
        let addr = self.net.var_find_vid_or_any(self.proc_idx, vid, ch)?;
        self.net.midi_mut(addr)
    }

    /// Resolved value of an arbitrary variable address.
    pub fn value(&self, addr: VarAddr) -> Result<&Value> {
        self.net.value(addr)
    }

    /// The variable record behind an address.
    pub fn var(&self, addr: VarAddr) -> &Var {
        self.net.var(addr)
    }

    /// Stores a process-wide blob under this procedure's class label.
    pub fn global_set(&mut self, var_label: &str, blob: Vec<u8>) -> Result<()> {
        let class_label = self.net.proc_class_label(self.proc_idx).to_string();
        self.net.global_set(&class_label, var_label, blob)
    }

    /// Reads a process-wide blob stored under this procedure's class
    /// label.
    pub fn global_get(&self, var_label: &str) -> Option<Vec<u8>> {
        let class_label = self.net.proc_class_label(self.proc_idx);
        self.net.global_get(class_label, var_label).map(<[u8]>::to_vec)
    }

    /// Read-only access to the whole network.
    pub fn net(&self) -> &Network {
        self.net
    }
}
