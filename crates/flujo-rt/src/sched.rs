//! The per-cycle execution driver.

use std::time::Instant;

use flujo_core::{ChMsg, FlowError, Result};
use flujo_net::{ANY_CH, Network, VarAddr};
use tracing::{debug, info};

use crate::device::{AudioDevice, MidiDevice};

/// One device-to-procedure binding resolved at construction.
struct Bind {
    dev_idx: usize,
    addr: VarAddr,
}

/// Drives a finalized network against its device backends.
pub struct Scheduler {
    net: Network,
    audio: Vec<Box<dyn AudioDevice>>,
    midi: Vec<Box<dyn MidiDevice>>,
    audio_in: Vec<Bind>,
    audio_out: Vec<Bind>,
    midi_in: Vec<Bind>,
    midi_out: Vec<Bind>,
    /// Aggregation buffer reused every cycle.
    incoming: Vec<ChMsg>,
    epoch: Instant,
    done: bool,
}

impl Scheduler {
    /// Binds every `audio_in` / `audio_out` / `midi_in` / `midi_out`
    /// procedure to its backend by the `dev` arg label.
    pub fn new(
        net: Network,
        audio: Vec<Box<dyn AudioDevice>>,
        midi: Vec<Box<dyn MidiDevice>>,
    ) -> Result<Scheduler> {
        let mut s = Scheduler {
            net,
            audio,
            midi,
            audio_in: Vec::new(),
            audio_out: Vec::new(),
            midi_in: Vec::new(),
            midi_out: Vec::new(),
            incoming: Vec::new(),
            epoch: Instant::now(),
            done: false,
        };

        s.audio_in = s.resolve("audio_in", "out", true)?;
        s.audio_out = s.resolve("audio_out", "out", true)?;
        s.midi_in = s.resolve("midi_in", "out", false)?;
        s.midi_out = s.resolve("midi_out", "in", false)?;

        info!(
            audio_in = s.audio_in.len(),
            audio_out = s.audio_out.len(),
            midi_in = s.midi_in.len(),
            midi_out = s.midi_out.len(),
            "scheduler bound"
        );
        Ok(s)
    }

    fn resolve(&self, class_label: &str, var_label: &str, is_audio: bool) -> Result<Vec<Bind>> {
        let mut binds = Vec::new();
        for proc_idx in self.net.procs_of_class(class_label) {
            let dev_label = self
                .net
                .proc_arg_cfg(proc_idx)
                .ok_or_else(|| {
                    FlowError::InvalidArg(format!(
                        "'{}' has no args",
                        self.net.proc_label(proc_idx)
                    ))
                })?
                .get_str("dev")?
                .to_string();

            let dev_idx = if is_audio {
                self.audio.iter().position(|d| d.label() == dev_label)
            } else {
                self.midi.iter().position(|d| d.label() == dev_label)
            }
            .ok_or_else(|| {
                FlowError::EleNotFound(format!("device backend '{dev_label}'"))
            })?;

            let addr = self.net.var_find(proc_idx, var_label, 0, ANY_CH).ok_or_else(|| {
                FlowError::EleNotFound(format!(
                    "variable '{var_label}' on '{}'",
                    self.net.proc_label(proc_idx)
                ))
            })?;

            binds.push(Bind { dev_idx, addr });
        }
        Ok(binds)
    }

    /// The owned network.
    pub fn net(&self) -> &Network {
        &self.net
    }

    /// Mutable access to the owned network (preset application between
    /// cycles, listener attachment).
    pub fn net_mut(&mut self) -> &mut Network {
        &mut self.net
    }

    /// Nanoseconds since the engine epoch (scheduler construction).
    pub fn now_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Runs one full cycle: device fill, network exec, device drain.
    ///
    /// Returns `Eof` when a device stream or procedure completes; every
    /// later call fails with `InvalidState`.
    pub fn exec_cycle(&mut self) -> Result<()> {
        if self.done {
            return Err(FlowError::InvalidState(
                "the program has completed; unload and reload".to_string(),
            ));
        }

        // 1. MIDI in: aggregate what arrived before this cycle.
        for bind in &self.midi_in {
            self.incoming.clear();
            self.midi[bind.dev_idx].recv(&mut self.incoming)?;
            self.net.midi_mut(bind.addr)?.fill_from(&self.incoming)?;
        }

        // 2. Audio in fill, audio out zero.
        for bind in &self.audio_in {
            let buf = self.net.abuf_mut(bind.addr)?;
            match self.audio[bind.dev_idx].read(buf) {
                Ok(()) => {}
                Err(FlowError::Eof) => {
                    self.done = true;
                    return Err(FlowError::Eof);
                }
                Err(e) => return Err(e),
            }
        }
        for bind in &self.audio_out {
            self.net.abuf_mut(bind.addr)?.zero();
        }

        // 3. Network cycle.
        let mut eof = false;
        match self.net.exec_cycle() {
            Ok(()) => {}
            Err(FlowError::Eof) => eof = true,
            Err(e) => return Err(e),
        }

        // 4. Audio out drain.
        for bind in &self.audio_out {
            let buf = self.net.abuf(bind.addr)?;
            self.audio[bind.dev_idx].write(buf)?;
        }

        // 5. MIDI out drain, MIDI in clear.
        for bind in &self.midi_out {
            let msgs = self.net.midi(bind.addr)?.msgs().to_vec();
            for msg in &msgs {
                self.midi[bind.dev_idx].send(msg)?;
            }
        }
        for bind in &self.midi_in {
            self.net.midi_mut(bind.addr)?.clear();
        }

        if eof {
            self.done = true;
            debug!(cycle = self.net.cycle_idx(), "program complete");
            return Err(FlowError::Eof);
        }
        Ok(())
    }

    /// Runs cycles until end of stream; returns the count completed.
    pub fn run(&mut self) -> Result<u64> {
        let start = self.net.cycle_idx();
        loop {
            match self.exec_cycle() {
                Ok(()) => {}
                Err(FlowError::Eof) => return Ok(self.net.cycle_idx() - start),
                Err(e) => return Err(e),
            }
        }
    }

    /// Closes every device backend and shuts the network down.
    pub fn unload(&mut self) -> Result<()> {
        let mut first_err = None;
        for dev in &mut self.audio {
            if let Err(e) = dev.close() {
                first_err.get_or_insert(e);
            }
        }
        self.net.shutdown()?;
        self.done = true;
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
