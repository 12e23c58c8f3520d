//! Network presets: named value sets and dual-interpolated snapshots.

use std::sync::Arc;

use flujo_cfg::Obj;
use flujo_core::{FlowError, Result, Value};
use tracing::warn;

use crate::net::Network;
use crate::var::ANY_CH;

/// One entry of a value-list preset.
#[derive(Debug, Clone)]
pub struct PresetEntry {
    /// Target procedure label.
    pub proc_label: String,
    /// Target variable label.
    pub var_label: String,
    /// Target channel or [`ANY_CH`].
    pub ch: usize,
    /// The value to assign.
    pub value: Arc<Obj>,
}

/// A named preset stored on a network.
#[derive(Debug, Clone)]
pub enum NetPreset {
    /// An ordered list of `(procedure, variable, channel, value)`
    /// assignments. Entry errors are logged; the list continues.
    ValueList {
        /// Preset label.
        label: String,
        /// Assignments in declaration order.
        entries: Vec<PresetEntry>,
    },
    /// Interpolates two value-list presets: `pri + coeff * (sec - pri)`
    /// per scalar type; variables present in only one side apply
    /// verbatim.
    Dual {
        /// Preset label.
        label: String,
        /// Primary preset label.
        pri: String,
        /// Secondary preset label.
        sec: String,
        /// Interpolation coefficient in `[0, 1]`.
        coeff: f64,
    },
}

impl NetPreset {
    /// The preset's label.
    pub fn label(&self) -> &str {
        match self {
            NetPreset::ValueList { label, .. } | NetPreset::Dual { label, .. } => label,
        }
    }
}

/// Parses the `presets` dict of a network configuration.
///
/// ```text
/// presets: {
///   soft: { gain: { k: 0.5 } },
///   loud: { gain: { k: [2.0, 3.0] } },      // per-channel entries
///   mid:  { dual: [soft, loud, 0.25] },
/// }
/// ```
pub fn parse_presets(cfg: &Arc<Obj>) -> Result<Vec<NetPreset>> {
    let mut out = Vec::new();

    for (label, body) in cfg.dict_iter() {
        if let Some(dual) = body.member("dual") {
            let items: Vec<&Arc<Obj>> = dual.list_iter().collect();
            if items.len() != 3 {
                return Err(FlowError::InvalidArg(format!(
                    "dual preset '{label}' must be [primary, secondary, coeff]"
                )));
            }
            let coeff = items[2].as_f64()?;
            if !(0.0..=1.0).contains(&coeff) {
                return Err(FlowError::InvalidArg(format!(
                    "dual preset '{label}' coefficient {coeff} is outside [0, 1]"
                )));
            }
            out.push(NetPreset::Dual {
                label: label.to_string(),
                pri: items[0].as_str()?.to_string(),
                sec: items[1].as_str()?.to_string(),
                coeff,
            });
            continue;
        }

        let mut entries = Vec::new();
        for (proc_label, vars) in body.dict_iter() {
            for (var_label, value) in vars.dict_iter() {
                if value.is_list() {
                    for (ch, item) in value.list_iter().enumerate() {
                        entries.push(PresetEntry {
                            proc_label: proc_label.to_string(),
                            var_label: var_label.to_string(),
                            ch,
                            value: Arc::clone(item),
                        });
                    }
                } else {
                    entries.push(PresetEntry {
                        proc_label: proc_label.to_string(),
                        var_label: var_label.to_string(),
                        ch: ANY_CH,
                        value: Arc::clone(value),
                    });
                }
            }
        }
        out.push(NetPreset::ValueList {
            label: label.to_string(),
            entries,
        });
    }

    Ok(out)
}

/// Applies a preset to a network.
///
/// Application is not atomic across variables; the scheduler serializes
/// it on the cycle boundary.
pub fn apply(net: &mut Network, preset: &NetPreset) -> Result<()> {
    match preset {
        NetPreset::ValueList { label, entries } => {
            for entry in entries {
                if let Err(e) = apply_entry(net, entry, &Value::from_cfg(&entry.value)) {
                    if net.params().strict_presets {
                        return Err(e);
                    }
                    warn!(
                        preset = %label,
                        proc = %entry.proc_label,
                        var = %entry.var_label,
                        %e,
                        "preset entry skipped"
                    );
                }
            }
            Ok(())
        }
        NetPreset::Dual {
            label,
            pri,
            sec,
            coeff,
        } => {
            let pri_entries = value_list_entries(net, pri)?;
            let sec_entries = value_list_entries(net, sec)?;

            // Interpolate pairs present in both sides; apply the rest
            // verbatim.
            let mut applied: Vec<(PresetEntry, Value)> = Vec::new();
            for pe in &pri_entries {
                let pv = Value::from_cfg(&pe.value);
                match sec_entries.iter().find(|se| entries_match(pe, se)) {
                    Some(se) => {
                        let sv = Value::from_cfg(&se.value);
                        applied.push((pe.clone(), Value::interp(&pv, &sv, *coeff)?));
                    }
                    None => applied.push((pe.clone(), pv)),
                }
            }
            for se in &sec_entries {
                if !pri_entries.iter().any(|pe| entries_match(pe, se)) {
                    applied.push((se.clone(), Value::from_cfg(&se.value)));
                }
            }

            for (entry, value) in &applied {
                if let Err(e) = apply_entry(net, entry, value) {
                    if net.params().strict_presets {
                        return Err(e);
                    }
                    warn!(
                        preset = %label,
                        proc = %entry.proc_label,
                        var = %entry.var_label,
                        %e,
                        "dual preset entry skipped"
                    );
                }
            }
            Ok(())
        }
    }
}

fn entries_match(a: &PresetEntry, b: &PresetEntry) -> bool {
    a.proc_label == b.proc_label && a.var_label == b.var_label && a.ch == b.ch
}

fn value_list_entries(net: &Network, label: &str) -> Result<Vec<PresetEntry>> {
    match net.presets().iter().find(|p| p.label() == label) {
        Some(NetPreset::ValueList { entries, .. }) => Ok(entries.clone()),
        Some(NetPreset::Dual { .. }) => Err(FlowError::InvalidArg(format!(
            "dual preset side '{label}' must be a value-list preset"
        ))),
        None => Err(FlowError::EleNotFound(format!("network preset '{label}'"))),
    }
}

fn apply_entry(net: &mut Network, entry: &PresetEntry, value: &Value) -> Result<()> {
    let proc_idx = net
        .proc_find(&entry.proc_label)
        .ok_or_else(|| FlowError::EleNotFound(format!("procedure '{}'", entry.proc_label)))?;

    if entry.ch == ANY_CH {
        let addr = net.var_find_req(proc_idx, &entry.var_label, 0, ANY_CH)?;
        return net.var_set(addr, value);
    }

    // Channel entries channelize on first application; an existing
    // channel variable is just assigned.
    let var = match net.var_find(proc_idx, &entry.var_label, 0, entry.ch) {
        Some(addr) => addr.var,
        None => {
            let base = net.var_find_req(proc_idx, &entry.var_label, 0, ANY_CH)?;
            let vid = net.var(base).vid();
            net.var_channelize(proc_idx, &entry.var_label, 0, entry.ch, None, vid)?
        }
    };
    net.var_set(
        crate::var::VarAddr {
            proc: proc_idx,
            var,
        },
        value,
    )
}
