use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::lprob::{is_zero, ln_binomial, logaddexp, logsumexp, LPROB_ZERO};

/// 状态在 Plan7 拓扑中的角色；节点编号从 1 开始
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    Start,
    NFlank,
    Begin,
    End,
    Join,
    CFlank,
    Terminal,
    Match(u32),
    Insert(u32),
    Delete(u32),
    /// 空模型的背景状态
    Null,
}

impl StateKind {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, StateKind::Match(_))
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKind::Start => f.write_str("S"),
            StateKind::NFlank => f.write_str("N"),
            StateKind::Begin => f.write_str("B"),
            StateKind::End => f.write_str("E"),
            StateKind::Join => f.write_str("J"),
            StateKind::CFlank => f.write_str("C"),
            StateKind::Terminal => f.write_str("T"),
            StateKind::Match(k) => write!(f, "M{}", k),
            StateKind::Insert(k) => write!(f, "I{}", k),
            StateKind::Delete(k) => write!(f, "D{}", k),
            StateKind::Null => f.write_str("R"),
        }
    }
}

/// 单符号发射：每个字母表符号一个对数概率，末尾附加通配符（全表的边缘和）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalEmission {
    lprobs: Vec<f64>,
}

impl NormalEmission {
    pub fn new(lprobs: &[f64]) -> Self {
        let mut table = lprobs.to_vec();
        table.push(logsumexp(lprobs.iter().copied()));
        Self { lprobs: table }
    }

    #[inline]
    pub fn lprob(&self, code: u8) -> f64 {
        self.lprobs.get(code as usize).copied().unwrap_or(LPROB_ZERO)
    }
}

const ANY: u8 = 4;

/// 密码子发射：一次消耗 1..=5 个核苷酸。
///
/// 密码子 y 先独立地丢失 D 个碱基、插入 I 个碱基（D, I ~ Binomial(2, ε)），
/// 丢失位置与插入位置均匀分布，插入碱基服从 `base` 分布；
/// 对所有密码子取边缘概率。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameEmission {
    epsilon: f64,
    /// ACGT + N
    base: Vec<f64>,
    /// 125 个模式（每位 ACGT 或 any），下标 p0*25 + p1*5 + p2
    codon: Vec<f64>,
    ldel: [f64; 3],
    lins: [f64; 3],
}

impl FrameEmission {
    /// `codon_lprobs` 以 ACGT 编码的密码子下标（0..64）为索引
    pub fn new(base_lprobs: [f64; 4], codon_lprobs: &[f64], epsilon: f64) -> Self {
        let mut base = base_lprobs.to_vec();
        base.push(logsumexp(base_lprobs));

        let mut codon = vec![LPROB_ZERO; 125];
        for (i, &lp) in codon_lprobs.iter().enumerate().take(64) {
            if is_zero(lp) {
                continue;
            }
            let c = [(i / 16) as u8, ((i / 4) % 4) as u8, (i % 4) as u8];
            for any_mask in 0..8u32 {
                let mut p = c;
                for (pos, b) in p.iter_mut().enumerate() {
                    if any_mask >> pos & 1 == 1 {
                        *b = ANY;
                    }
                }
                let idx = pattern_index(p);
                codon[idx] = logaddexp(codon[idx], lp);
            }
        }

        let ldel = [binom2(0, epsilon), binom2(1, epsilon), binom2(2, epsilon)];
        Self { epsilon, base, codon, ldel, lins: ldel }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn base_lprob(&self, code: u8) -> f64 {
        self.base[code.min(ANY) as usize]
    }

    /// 密码子模式的边缘概率，位置上的 any（编码 4）表示对该位置求和
    pub fn codon_lprob(&self, pattern: [u8; 3]) -> f64 {
        self.codon[pattern_index(pattern)]
    }

    pub fn lprob(&self, x: &[u8]) -> f64 {
        let len = x.len();
        if !(1..=5).contains(&len) {
            return LPROB_ZERO;
        }
        let mut total = LPROB_ZERO;
        for del in 0..=2usize {
            let kept = 3 - del;
            if len < kept || len - kept > 2 {
                continue;
            }
            let ins = len - kept;
            let weight = self.ldel[del] + self.lins[ins];
            if is_zero(weight) {
                continue;
            }

            let mut acc = LPROB_ZERO;
            for ins_mask in 0u32..(1 << len) {
                if ins_mask.count_ones() as usize != ins {
                    continue;
                }
                let mut lp_ins = 0.0;
                let mut keep = [ANY; 3];
                let mut nk = 0;
                for (i, &c) in x.iter().enumerate() {
                    if ins_mask >> i & 1 == 1 {
                        lp_ins += self.base_lprob(c);
                    } else {
                        keep[nk] = c.min(ANY);
                        nk += 1;
                    }
                }
                if is_zero(lp_ins) {
                    continue;
                }
                for del_mask in 0u32..8 {
                    if del_mask.count_ones() as usize != del {
                        continue;
                    }
                    let mut pattern = [ANY; 3];
                    let mut k = 0;
                    for (pos, p) in pattern.iter_mut().enumerate() {
                        if del_mask >> pos & 1 == 0 {
                            *p = keep[k];
                            k += 1;
                        }
                    }
                    acc = logaddexp(acc, lp_ins + self.codon_lprob(pattern));
                }
            }
            total = logaddexp(total, weight + acc - ln_binomial(len, ins) - ln_binomial(3, del));
        }
        total
    }
}

#[inline]
fn pattern_index(p: [u8; 3]) -> usize {
    p[0] as usize * 25 + p[1] as usize * 5 + p[2] as usize
}

/// ln P(K = k), K ~ Binomial(2, ε)
fn binom2(k: usize, eps: f64) -> f64 {
    let mut lp = ln_binomial(2, k);
    if k > 0 {
        lp += k as f64 * eps.ln();
    }
    if k < 2 {
        lp += (2 - k) as f64 * (1.0 - eps).ln();
    }
    lp
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Emission {
    Mute,
    Normal(NormalEmission),
    Frame(FrameEmission),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub kind: StateKind,
    pub emission: Emission,
}

impl State {
    pub fn mute(kind: StateKind) -> Self {
        Self { kind, emission: Emission::Mute }
    }

    #[inline]
    pub fn is_mute(&self) -> bool {
        matches!(self.emission, Emission::Mute)
    }

    /// 单步可消耗的符号数范围（闭区间）
    #[inline]
    pub fn span(&self) -> (usize, usize) {
        match self.emission {
            Emission::Mute => (0, 0),
            Emission::Normal(_) => (1, 1),
            Emission::Frame(_) => (1, 5),
        }
    }

    /// 消耗 `codes` 这段符号的发射对数概率
    pub fn lprob(&self, codes: &[u8]) -> f64 {
        match &self.emission {
            Emission::Mute => {
                if codes.is_empty() {
                    0.0
                } else {
                    LPROB_ZERO
                }
            }
            Emission::Normal(e) => match codes {
                [c] => e.lprob(*c),
                _ => LPROB_ZERO,
            },
            Emission::Frame(e) => e.lprob(codes),
        }
    }
}
