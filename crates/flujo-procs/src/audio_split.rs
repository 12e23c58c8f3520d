//! `audio_split`: extracts a channel range from an audio signal.
//!
//! `args: { ch_idx: first, ch_n: count }` selects the channels copied
//! into the owned output each cycle. The output buffer is allocated on
//! the first cycle from the input geometry.

use flujo_core::{FlowError, Result, TypeFl};
use flujo_net::{ANY_CH, ClassDesc, ProcCtx, ProcImpl, VarDesc, VarFlags};

/// vid of `in`.
pub const IN: u32 = 0;
/// vid of `out`.
pub const OUT: u32 = 1;

struct AudioSplit {
    ch_idx: usize,
    ch_n: usize,
    ready: bool,
    scratch: Vec<f32>,
}

impl ProcImpl for AudioSplit {
    fn create(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        let args = ctx
            .arg_cfg()
            .ok_or_else(|| FlowError::InvalidArg("'audio_split' needs args".to_string()))?;
        self.ch_idx = args.get_u64("ch_idx")? as usize;
        self.ch_n = args.get_u64("ch_n")? as usize;
        if self.ch_n == 0 {
            return Err(FlowError::InvalidArg(
                "'audio_split' needs at least one output channel".to_string(),
            ));
        }
        ctx.register("in", IN, ANY_CH, None)?;
        Ok(())
    }

    fn exec(&mut self, ctx: &mut ProcCtx) -> Result<()> {
        let (srate, in_ch_n, frame_n) = {
            let a = ctx.abuf(IN, ANY_CH)?;
            (a.srate(), a.ch_n(), a.frame_n())
        };
        if self.ch_idx + self.ch_n > in_ch_n {
            return Err(FlowError::InvalidArg(format!(
                "channel range {}..{} is outside the {}-channel input",
                self.ch_idx,
                self.ch_idx + self.ch_n,
                in_ch_n
            )));
        }
        if !self.ready {
            ctx.register_audio("out", OUT, ANY_CH, srate, self.ch_n, frame_n)?;
            self.ready = true;
        }

        self.scratch.resize(self.ch_n * frame_n, 0.0);
        {
            let a = ctx.abuf(IN, ANY_CH)?;
            for ch in 0..self.ch_n {
                let src = a.channel(self.ch_idx + ch)?;
                self.scratch[ch * frame_n..(ch + 1) * frame_n].copy_from_slice(src);
            }
        }

        let out = ctx.abuf_mut(OUT, ANY_CH)?;
        out.samples_mut().copy_from_slice(&self.scratch);
        Ok(())
    }
}

/// The `audio_split` class descriptor.
pub fn class_desc() -> ClassDesc {
    ClassDesc::new("audio_split", || {
        Box::new(AudioSplit {
            ch_idx: 0,
            ch_n: 0,
            ready: false,
            scratch: Vec::new(),
        })
    })
    .var(
        VarDesc::new("in", TypeFl::AUDIO)
            .flags(VarFlags::SRC)
            .doc("signal to split"),
    )
    .var(VarDesc::new("out", TypeFl::AUDIO).doc("selected channel range"))
}
