//! `wt_osc`: wavetable-bank player.
//!
//! Loads a [`WtBank`] instrument at creation, resolves `(pitch,
//! velocity)` to one table sequence per channel, and renders the attack
//! table once followed by the loop tables concatenated in order,
//! wrapping back to the first loop. Reads go through the tables' guard
//! pads, so the inner loop never branches on the boundary.
//!
//! The `pitch` variable is live: assigning it re-resolves the table
//! sequence, and an unsampled pitch is rejected through the `value`
//! callback (the assignment rolls back).

use std::path::PathBuf;

use flujo_cfg::Obj;
use flujo_core::{FlowError, Result, TypeFl};
use flujo_net::{ANY_CH, ClassDesc, ProcCtx, ProcImpl, VarAddr, VarDesc};
use flujo_wtb::WtBank;

/// vid of `out`.
pub const OUT: u32 = 0;
/// vid of `pitch`.
pub const PITCH: u32 = 1;

/// Guard-pad samples on each table side.
const PAD_SMP_N: usize = 2;

/// Per-channel read head.
#[derive(Clone, Copy)]
struct Cursor {
    /// Index into the channel's table list.
    table: usize,
    /// Fractional position inside the current table body.
    pos: f32,
}

struct WtOsc {
    bank: Option<WtBank>,
    instr_idx: usize,
    pitch: u8,
    vel: u8,
    cursors: Vec<Cursor>,
    staged: Vec<f32>,
}

impl ProcImpl for WtOsc {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        let args = ctx
            .arg_cfg()
            .ok_or_else(|| FlowError::InvalidArg("'wt_osc' needs args".to_string()))?;
        let instr_fname = PathBuf::from(args.get_str("instr")?);
        let instr_label = args.get_str("instr_label")?.to_string();
        let pitch = args.get_u64("pitch")? as u8;
        self.vel = match args.member("vel") {
            Some(v) => v.as_u64()? as u8,
            None => 64,
        };

        let bank = WtBank::create(PAD_SMP_N, &instr_fname)?;
        self.instr_idx = bank.instr_index(&instr_label)?;

        let ch_n = bank.lookup(self.instr_idx, pitch, self.vel)?.chans.len();
        if ch_n == 0 {
            return Err(FlowError::InvalidArg(format!(
                "instrument '{instr_label}' pitch {pitch} has no channels"
            )));
        }
        self.pitch = pitch;
        self.cursors = vec![Cursor { table: 0, pos: 0.0 }; ch_n];
        self.bank = Some(bank);

        let srate = ctx.srate();
        let frame_n = ctx.frames_per_cycle();
        ctx.register("pitch", PITCH, ANY_CH, Some(&Obj::uint(u64::from(pitch))))?;
        ctx.register_audio("out", OUT, ANY_CH, srate, ch_n, frame_n)?;
        Ok(())
    }

    fn value(&mut self, ctx: &mut ProcCtx, var: VarAddr) -> Result<()> {
        if ctx.var(var).label() != "pitch" {
            return Ok(());
        }
        let pitch = ctx.value(var)?.as_uint()? as u8;
        if let Some(bank) = &self.bank {
            // An unsampled pitch fails here and the assignment rolls
            // back to the previous pitch.
            let ch_n = bank.lookup(self.instr_idx, pitch, self.vel)?.chans.len();
            self.cursors = vec![Cursor { table: 0, pos: 0.0 }; ch_n];
        }
        self.pitch = pitch;
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        let frame_n = ctx.frames_per_cycle();
        let ch_n = self.cursors.len();
        self.staged.resize(ch_n * frame_n, 0.0);
        self.staged.fill(0.0);

        let Some(bank) = &self.bank else {
            return Err(FlowError::InvalidState("wt_osc bank not loaded".to_string()));
        };
        let entry = bank.lookup(self.instr_idx, self.pitch, self.vel)?;

        for (ch, seq) in entry.chans.iter().enumerate().take(ch_n) {
            let cur = &mut self.cursors[ch];
            let first_loop = seq.tables.iter().position(|t| !t.one_shot);
            for frame in 0..frame_n {
                let Some(table) = seq.tables.get(cur.table) else {
                    break; // one-shot sequence exhausted
                };
                self.staged[ch * frame_n + frame] = table.read(cur.pos);
                cur.pos += 1.0;
                if cur.pos >= table.loop_smp_n as f32 {
                    cur.pos -= table.loop_smp_n as f32;
                    // The attack plays once; loops concatenate and wrap.
                    let next = cur.table + 1;
                    cur.table = if next < seq.tables.len() {
                        next
                    } else {
                        first_loop.unwrap_or(next)
                    };
                }
            }
        }

        let abuf = ctx.abuf_mut(OUT, ANY_CH)?;
        for ch in 0..ch_n {
            abuf.set_channel(ch, &self.staged[ch * frame_n..(ch + 1) * frame_n])?;
        }
        Ok(())
    }
}

/// The `wt_osc` class descriptor.
pub fn class_desc() -> ClassDesc {
    ClassDesc::new("wt_osc", || {
        Box::new(WtOsc {
            bank: None,
            instr_idx: 0,
            pitch: 60,
            vel: 64,
            cursors: Vec::new(),
            staged: Vec::new(),
        })
    })
    .var(VarDesc::new("out", TypeFl::AUDIO).doc("rendered wavetable signal"))
    .var(
        VarDesc::new("pitch", TypeFl::UINT)
            .default(Obj::uint(60))
            .doc("MIDI pitch to render"),
    )
}
