//! Variable-to-UI change-notification bridge.
//!
//! Variables are decorated with a [`UiDesc`] (widget, container, and
//! label ids plus a caller argument). The [`UiBridge`] attaches to a
//! network as its assignment listener; whenever a decorated variable's
//! assignment completes - directly or through a broadcast - the bridge
//! coerces the new value to the widget's element type and emits a
//! [`UiMsg`] on the transport.
//!
//! The transport is abstract: the default deployment forwards to a
//! websocket, tests use [`RecordingTransport`]. Errors never unwind into
//! the audio path; they surface as `log` messages on the transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use flujo_core::{Result, TypeFl, Value};
use flujo_net::{Network, VarAddr, VarListener};
use serde::Serialize;
use tracing::debug;

/// The widget element type a variable's value is coerced to before it
/// is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiElemType {
    /// Checkbox-like widgets.
    Bool,
    /// Integer-valued widgets.
    Int,
    /// Continuous widgets (sliders, number boxes).
    Float,
    /// Text widgets.
    Str,
}

/// The UI decoration of one variable.
#[derive(Debug, Clone)]
pub struct UiDesc {
    /// Target widget id.
    pub widget_id: u32,
    /// Enclosing container id.
    pub container_id: u32,
    /// Label widget id.
    pub label_id: u32,
    /// Element type the value serializes as.
    pub elem: UiElemType,
    /// Opaque caller argument echoed on every message.
    pub arg: String,
}

/// One message on the UI transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiMsg {
    /// Operation: `value`, `enable`, `visible`, or `log`.
    pub op: String,
    /// Target widget id.
    pub widget_id: u32,
    /// Serialized payload.
    pub value: serde_json::Value,
    /// Caller argument from the decoration (empty for `log`).
    #[serde(skip_serializing_if = "String::is_empty")]
    pub arg: String,
}

/// Where UI messages go; the embedding layer forwards to its transport.
pub trait UiTransport: Send {
    /// Delivers one message.
    fn send(&mut self, msg: &UiMsg) -> Result<()>;
}

/// A transport that records every message (tests, diagnostics).
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<UiMsg>>>,
}

impl RecordingTransport {
    /// An empty recorder.
    pub fn new() -> RecordingTransport {
        RecordingTransport::default()
    }

    /// Snapshot of every message sent so far.
    pub fn sent(&self) -> Vec<UiMsg> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl UiTransport for RecordingTransport {
    fn send(&mut self, msg: &UiMsg) -> Result<()> {
        if let Ok(mut v) = self.sent.lock() {
            v.push(msg.clone());
        }
        Ok(())
    }
}

/// The bridge: variable decorations plus the transport.
///
/// Attach with
/// [`Network::set_listener`](flujo_net::Network::set_listener).
pub struct UiBridge {
    transport: Box<dyn UiTransport>,
    decos: HashMap<VarAddr, UiDesc>,
}

impl UiBridge {
    /// A bridge over a transport.
    pub fn new(transport: Box<dyn UiTransport>) -> UiBridge {
        UiBridge {
            transport,
            decos: HashMap::new(),
        }
    }

    /// Decorates a variable; its assignments now emit `value` messages.
    pub fn decorate(&mut self, addr: VarAddr, desc: UiDesc) {
        self.decos.insert(addr, desc);
    }

    /// Emits an `enable` state change for a decorated variable.
    pub fn set_enable(&mut self, addr: VarAddr, enable: bool) -> Result<()> {
        self.state_msg(addr, "enable", enable)
    }

    /// Emits a `visible` state change for a decorated variable.
    pub fn set_visible(&mut self, addr: VarAddr, visible: bool) -> Result<()> {
        self.state_msg(addr, "visible", visible)
    }

    fn state_msg(&mut self, addr: VarAddr, op: &str, fl: bool) -> Result<()> {
        let Some(desc) = self.decos.get(&addr) else {
            return Err(flujo_core::FlowError::EleNotFound(format!(
                "no UI decoration for proc {} var {}",
                addr.proc, addr.var
            )));
        };
        let msg = UiMsg {
            op: op.to_string(),
            widget_id: desc.widget_id,
            value: serde_json::Value::Bool(fl),
            arg: desc.arg.clone(),
        };
        self.transport.send(&msg)
    }

    /// Serializes `value` per the widget element type.
    fn value_to_json(value: &Value, elem: UiElemType) -> Result<serde_json::Value> {
        Ok(match elem {
            UiElemType::Bool => serde_json::Value::Bool(value.as_bool()?),
            UiElemType::Int => serde_json::Value::from(value.as_int()?),
            UiElemType::Float => serde_json::Value::from(value.as_double()?),
            UiElemType::Str => serde_json::Value::from(value.as_str()?.to_string()),
        })
    }

    fn send_log(&mut self, widget_id: u32, text: String) {
        let msg = UiMsg {
            op: "log".to_string(),
            widget_id,
            value: serde_json::Value::String(text),
            arg: String::new(),
        };
        // A failing transport has nowhere left to report to.
        let _ = self.transport.send(&msg);
    }
}

impl VarListener for UiBridge {
    fn on_value(&mut self, net: &Network, addr: VarAddr) {
        let Some(desc) = self.decos.get(&addr).cloned() else {
            return;
        };

        let value = match net.value(addr) {
            Ok(v) => v,
            Err(e) => {
                self.send_log(desc.widget_id, format!("value read failed: {e}"));
                return;
            }
        };

        // Buffer-typed variables have no widget rendering.
        if !TypeFl::NUMERIC
            .union(TypeFl::STRING)
            .contains(value.type_fl())
        {
            debug!(widget = desc.widget_id, "skipping non-scalar UI update");
            return;
        }

        match Self::value_to_json(value, desc.elem) {
            Ok(json) => {
                let msg = UiMsg {
                    op: "value".to_string(),
                    widget_id: desc.widget_id,
                    value: json,
                    arg: desc.arg.clone(),
                };
                if let Err(e) = self.transport.send(&msg) {
                    debug!(%e, "UI transport send failed");
                }
            }
            Err(e) => {
                self.send_log(desc.widget_id, format!("value coercion failed: {e}"));
            }
        }
    }
}
