use serde::{Deserialize, Serialize};

use super::state::State;
use crate::util::alphabet::Sequence;
use crate::util::lprob::LPROB_ZERO;

/// 背景模型：一个自环的发射状态 R
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NullModel {
    state: State,
    rr: f64,
}

impl NullModel {
    pub fn new(state: State) -> Self {
        Self { state, rr: 0.0 }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn set_transition(&mut self, lprob: f64) {
        self.rr = lprob;
    }

    pub fn transition(&self) -> f64 {
        self.rr
    }

    /// 每个符号占一步的唯一路径：Σ e(x_i) + (L-1)·RR
    pub fn likelihood(&self, seq: &Sequence) -> f64 {
        let codes = seq.codes();
        if codes.is_empty() {
            return 0.0;
        }
        let mut lp = 0.0;
        for sym in codes.chunks(1) {
            lp += self.state.lprob(sym);
            if lp == LPROB_ZERO {
                return LPROB_ZERO;
            }
        }
        if codes.len() > 1 {
            lp += (codes.len() - 1) as f64 * self.rr;
        }
        lp
    }
}
