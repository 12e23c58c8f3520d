//! Class and variable descriptors, the class dictionary, and the
//! procedure lifecycle trait.

use std::fmt;
use std::sync::Arc;

use flujo_cfg::Obj;
use flujo_core::{Result, TypeFl};

use crate::var::VarAddr;

/// Behavioral flags of a variable descriptor.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct VarFlags(u32);

impl VarFlags {
    /// No flags.
    pub const NONE: VarFlags = VarFlags(0);
    /// The variable is an input normally fed by a source connection.
    pub const SRC: VarFlags = VarFlags(0x01);
    /// Like `SRC`, but a missing connection is not a validation error.
    pub const SRC_OPT: VarFlags = VarFlags(0x02);
    /// The variable must never be connected to a source.
    pub const NO_SRC: VarFlags = VarFlags(0x04);
    /// The variable may only be assigned during creation.
    pub const INIT: VarFlags = VarFlags(0x08);
    /// Multiple same-labelled instances (distinct sfx ids) are allowed.
    pub const MULT: VarFlags = VarFlags(0x10);
    /// The variable is a subnet output exposed through the parent.
    pub const OUT: VarFlags = VarFlags(0x20);

    /// True if every bit of `other` is present.
    pub const fn contains(self, other: VarFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set union.
    #[must_use]
    pub const fn union(self, other: VarFlags) -> VarFlags {
        VarFlags(self.0 | other.0)
    }
}

impl fmt::Debug for VarFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (VarFlags::SRC, "src"),
            (VarFlags::SRC_OPT, "src_opt"),
            (VarFlags::NO_SRC, "no_src"),
            (VarFlags::INIT, "init"),
            (VarFlags::MULT, "mult"),
            (VarFlags::OUT, "out"),
        ];
        let mut first = true;
        for (fl, name) in names {
            if self.contains(fl) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        if first {
            write!(f, "<none>")?;
        }
        Ok(())
    }
}

/// The static schema of a variable on a class.
#[derive(Debug, Clone)]
pub struct VarDesc {
    /// Variable label.
    pub label: String,
    /// Permitted type set; may include [`TypeFl::RUNTIME`] to defer the
    /// concrete type to the first assignment.
    pub type_fl: TypeFl,
    /// Behavioral flags.
    pub flags: VarFlags,
    /// Default value applied when neither configuration nor creation
    /// supplies one.
    pub default_cfg: Option<Arc<Obj>>,
    /// Documentation text.
    pub doc: String,
}

impl VarDesc {
    /// Starts a descriptor with a label and permitted type set.
    pub fn new(label: &str, type_fl: TypeFl) -> VarDesc {
        VarDesc {
            label: label.to_string(),
            type_fl,
            flags: VarFlags::NONE,
            default_cfg: None,
            doc: String::new(),
        }
    }

    /// Sets behavioral flags.
    #[must_use]
    pub fn flags(mut self, flags: VarFlags) -> VarDesc {
        self.flags = flags;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, cfg: Arc<Obj>) -> VarDesc {
        self.default_cfg = Some(cfg);
        self
    }

    /// Sets the documentation text.
    #[must_use]
    pub fn doc(mut self, doc: &str) -> VarDesc {
        self.doc = doc.to_string();
        self
    }
}

/// Factory closure producing a fresh procedure instance.
pub type ProcFactory = Box<dyn Fn() -> Box<dyn ProcImpl> + Send + Sync>;

/// The schema for a family of procedures: variable descriptors, named
/// presets, and the instance factory. Immutable after registration in a
/// [`ClassDict`].
pub struct ClassDesc {
    label: String,
    var_descs: Vec<VarDesc>,
    presets: Vec<(String, Arc<Obj>)>,
    factory: ProcFactory,
}

impl fmt::Debug for ClassDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDesc")
            .field("label", &self.label)
            .field("var_descs", &self.var_descs)
            .field("presets", &self.presets.len())
            .finish_non_exhaustive()
    }
}

impl ClassDesc {
    /// Starts a class descriptor.
    pub fn new(label: &str, factory: impl Fn() -> Box<dyn ProcImpl> + Send + Sync + 'static) -> ClassDesc {
        ClassDesc {
            label: label.to_string(),
            var_descs: Vec::new(),
            presets: Vec::new(),
            factory: Box::new(factory),
        }
    }

    /// Appends a variable descriptor. The descriptor's index in
    /// declaration order doubles as the variable's default vid.
    #[must_use]
    pub fn var(mut self, desc: VarDesc) -> ClassDesc {
        self.var_descs.push(desc);
        self
    }

    /// Appends a named preset: a cfg dict mapping variable labels to
    /// values.
    #[must_use]
    pub fn preset(mut self, label: &str, cfg: Arc<Obj>) -> ClassDesc {
        self.presets.push((label.to_string(), cfg));
        self
    }

    /// Class label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Variable descriptors in declaration order.
    pub fn var_descs(&self) -> &[VarDesc] {
        &self.var_descs
    }

    /// Finds a variable descriptor by label.
    pub fn find_var_desc(&self, label: &str) -> Option<(usize, &VarDesc)> {
        self.var_descs
            .iter()
            .enumerate()
            .find(|(_, d)| d.label == label)
    }

    /// Finds a named preset's cfg.
    pub fn find_preset(&self, label: &str) -> Option<&Arc<Obj>> {
        self.presets
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, cfg)| cfg)
    }

    /// Instantiates the class.
    pub fn make(&self) -> Box<dyn ProcImpl> {
        (self.factory)()
    }
}

/// Registry of procedure classes, consulted during network
/// instantiation and preset application only. Immutable once handed to a
/// network.
#[derive(Debug, Default)]
pub struct ClassDict {
    classes: Vec<ClassDesc>,
}

impl ClassDict {
    /// An empty dictionary.
    pub fn new() -> ClassDict {
        ClassDict::default()
    }

    /// Registers a class; fails with `Duplicate` on a label collision.
    pub fn register(&mut self, desc: ClassDesc) -> Result<()> {
        if self.find(desc.label()).is_some() {
            return Err(flujo_core::FlowError::Duplicate(format!(
                "class '{}' is already registered",
                desc.label()
            )));
        }
        self.classes.push(desc);
        Ok(())
    }

    /// Finds a class by label.
    pub fn find(&self, label: &str) -> Option<&ClassDesc> {
        self.classes.iter().find(|c| c.label() == label)
    }

    /// Finds a class's registration index by label.
    pub fn find_idx(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|c| c.label() == label)
    }

    /// The class at a registration index.
    pub fn by_idx(&self, idx: usize) -> &ClassDesc {
        &self.classes[idx]
    }

    /// Registered class labels in registration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.label())
    }
}

/// Lifecycle callbacks of a procedure class.
///
/// `create` runs while the procedure is being instantiated and registers
/// the variables the class uses. `value` runs on every assignment to one
/// of the procedure's variables once creation is complete; returning an
/// error rolls the assignment back. `exec` runs once per cycle; a
/// non-real-time class returns `Eof` to signal completion. `destroy`
/// runs in reverse network order at teardown.
pub trait ProcImpl: Send {
    /// Registers variables and captures creation-time state.
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()>;

    /// Reacts to a completed assignment on `var`. Errors roll back.
    fn value(&mut self, ctx: &mut ProcCtx, var: VarAddr) -> Result<()> {
        let _ = (ctx, var);
        Ok(())
    }

    /// Runs one cycle.
    fn exec(&mut self, ctx: &mut ProcCtx) -> Result<()>;

    /// Releases class state before the variables are dropped.
    fn destroy(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// One-line state report for diagnostics.
    fn report(&self) -> String {
        String::new()
    }
}

/// The view a procedure callback gets of its network.
///
/// Wraps the network plus the callback's procedure index; every helper
/// addresses variables on that procedure.
pub struct ProcCtx<'a> {
    pub(crate) net: &'a mut crate::net::Network,
    pub(crate) proc_idx: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use flujo_core::FlowError;

    struct Nop;
    impl ProcImpl for Nop {
        fn create(&mut self, _ctx: &mut ProcCtx) -> Result<()> {
            Ok(())
        }
        fn exec(&mut self, _ctx: &mut ProcCtx) -> Result<()> {
            Ok(())
        }
    }

    fn nop_class(label: &str) -> ClassDesc {
        ClassDesc::new(label, || Box::new(Nop))
            .var(VarDesc::new("in", TypeFl::FLOAT).flags(VarFlags::SRC))
            .var(
                VarDesc::new("k", TypeFl::FLOAT)
                    .default(Obj::double(1.0))
                    .doc("coefficient"),
            )
    }

    #[test]
    fn test_var_desc_lookup() {
        let cd = nop_class("gain");
        let (idx, d) = cd.find_var_desc("k").unwrap();
        assert_eq!(idx, 1);
        assert!(d.default_cfg.is_some());
        assert!(cd.find_var_desc("missing").is_none());
    }

    #[test]
    fn test_dict_duplicate_rejected() {
        let mut dict = ClassDict::new();
        dict.register(nop_class("gain")).unwrap();
        assert!(matches!(
            dict.register(nop_class("gain")),
            Err(FlowError::Duplicate(_))
        ));
        assert!(dict.find("gain").is_some());
        assert_eq!(dict.labels().collect::<Vec<_>>(), vec!["gain"]);
    }

    #[test]
    fn test_class_presets() {
        let cd = nop_class("gain").preset("loud", Obj::dict(vec![("k", Obj::double(4.0))]));
        assert!(cd.find_preset("loud").is_some());
        assert!(cd.find_preset("quiet").is_none());
    }

    #[test]
    fn test_flags_algebra() {
        let fl = VarFlags::SRC.union(VarFlags::MULT);
        assert!(fl.contains(VarFlags::SRC));
        assert!(!fl.contains(VarFlags::NO_SRC));
        assert_eq!(format!("{fl:?}"), "src|mult");
        assert_eq!(format!("{:?}", VarFlags::NONE), "<none>");
    }
}
