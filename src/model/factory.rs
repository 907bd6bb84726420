use anyhow::{bail, Result};

use super::state::{Emission, FrameEmission, NormalEmission, State, StateKind};
use crate::util::alphabet::Alphabet;
use crate::util::gencode::{codon_index, GeneticCode};
use crate::util::lprob::{is_zero, logaddexp, LPROB_ZERO};

/// 由一张按 profile 字母表排列的对数概率表构造发射状态
pub trait StateFactory {
    /// 查询序列所用的字母表
    fn query_alphabet(&self) -> &Alphabet;

    fn create(&self, kind: StateKind, lprobs: &[f64]) -> State;
}

/// 每步发射一个符号，查询字母表即 profile 字母表
#[derive(Clone, Debug)]
pub struct StandardStateFactory {
    alphabet: Alphabet,
}

impl StandardStateFactory {
    pub fn new(alphabet: Alphabet) -> Self {
        Self { alphabet }
    }
}

impl StateFactory for StandardStateFactory {
    fn query_alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn create(&self, kind: StateKind, lprobs: &[f64]) -> State {
        State { kind, emission: Emission::Normal(NormalEmission::new(lprobs)) }
    }
}

/// 氨基酸分布 → 密码子分布 → 核苷酸分布，生成 frame 状态
#[derive(Clone, Debug)]
pub struct FrameStateFactory {
    amino: Alphabet,
    bases: Alphabet,
    gcode: GeneticCode,
    epsilon: f64,
}

impl FrameStateFactory {
    pub fn new(amino: Alphabet, gcode: GeneticCode, epsilon: f64) -> Result<Self> {
        if !(epsilon > 0.0 && epsilon < 1.0) {
            bail!("epsilon must lie in (0, 1), got {}", epsilon);
        }
        Ok(Self { amino, bases: Alphabet::nucleotide(), gcode, epsilon })
    }

    pub fn amino_alphabet(&self) -> &Alphabet {
        &self.amino
    }

    pub fn genetic_code(&self) -> &GeneticCode {
        &self.gcode
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// 每个氨基酸的质量均分给其同义密码子，再在全部密码子上归一化。
    /// 返回以密码子下标（0..64）为索引的表；没有密码子的符号被忽略。
    pub fn infer_codon_lprobs(&self, aa_lprobs: &[f64]) -> Vec<f64> {
        let mut codons = vec![LPROB_ZERO; 64];
        let mut norm = LPROB_ZERO;
        for (i, &lp) in aa_lprobs.iter().enumerate().take(self.amino.len()) {
            let syn = self.gcode.codons(self.amino.decode(i as u8));
            if syn.is_empty() {
                continue;
            }
            let share = lp - (syn.len() as f64).ln();
            for c in syn {
                codons[codon_index(c)] = share;
                norm = logaddexp(norm, share);
            }
        }
        // 退化分布保持全 0，不报错
        if !is_zero(norm) {
            for v in codons.iter_mut() {
                *v -= norm;
            }
        }
        codons
    }

    /// 每个碱基在三个密码子位置上的出现概率之和，再除以 3
    pub fn infer_base_lprobs(codon_lprobs: &[f64]) -> [f64; 4] {
        let mut base = [LPROB_ZERO; 4];
        let third = 3f64.ln();
        for (i, &lp) in codon_lprobs.iter().enumerate().take(64) {
            if is_zero(lp) {
                continue;
            }
            for b in [i / 16, (i / 4) % 4, i % 4] {
                base[b] = logaddexp(base[b], lp - third);
            }
        }
        base
    }
}

impl StateFactory for FrameStateFactory {
    fn query_alphabet(&self) -> &Alphabet {
        &self.bases
    }

    fn create(&self, kind: StateKind, lprobs: &[f64]) -> State {
        let codons = self.infer_codon_lprobs(lprobs);
        let base = Self::infer_base_lprobs(&codons);
        State { kind, emission: Emission::Frame(FrameEmission::new(base, &codons, self.epsilon)) }
    }
}
