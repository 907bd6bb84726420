use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::util::lprob::{is_zero, logsumexp, LPROB_ZERO};

/// 相邻两个节点之间的 7 个核心转移（对数概率）。
///
/// 挂在第 k 个节点上的转移是离开第 k-1 个节点的转移。
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transitions {
    pub mm: f64,
    pub mi: f64,
    pub md: f64,
    pub im: f64,
    pub ii: f64,
    pub dm: f64,
    pub dd: f64,
}

impl Default for Transitions {
    fn default() -> Self {
        Self {
            mm: LPROB_ZERO,
            mi: LPROB_ZERO,
            md: LPROB_ZERO,
            im: LPROB_ZERO,
            ii: LPROB_ZERO,
            dm: LPROB_ZERO,
            dd: LPROB_ZERO,
        }
    }
}

impl Transitions {
    /// 按源状态分别归一化：M→{M,I,D}、I→{M,I}、D→{M,D}
    pub fn normalize(&mut self) -> Result<()> {
        let m = normalizer(&[self.mm, self.mi, self.md], "match")?;
        self.mm -= m;
        self.mi -= m;
        self.md -= m;

        let i = normalizer(&[self.im, self.ii], "insert")?;
        self.im -= i;
        self.ii -= i;

        let d = normalizer(&[self.dm, self.dd], "delete")?;
        self.dm -= d;
        self.dd -= d;
        Ok(())
    }

    pub fn normalized(mut self) -> Result<Self> {
        self.normalize()?;
        Ok(self)
    }
}

fn normalizer(row: &[f64], source: &str) -> Result<f64> {
    if row.iter().any(|v| v.is_nan()) {
        bail!("{} transitions contain NaN", source);
    }
    let norm = logsumexp(row.iter().copied());
    if is_zero(norm) || !norm.is_finite() {
        bail!("{} transitions cannot be normalized: {:?}", source, row);
    }
    Ok(norm)
}

/// 侧翼特殊状态的 11 个转移（对数概率）。
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialTransitions {
    pub nn: f64,
    pub nb: f64,
    pub ec: f64,
    pub cc: f64,
    pub ct: f64,
    pub ej: f64,
    pub jj: f64,
    pub jb: f64,
    pub rr: f64,
    pub bm: f64,
    pub me: f64,
}

impl SpecialTransitions {
    /// HMMER 的目标长度模型：N/C/J 的自环期望覆盖长度为 L 的目标序列，
    /// 多次命中时 E 以 1/2 的概率经 J 回到 B。
    pub fn set_target_length(&mut self, length: usize, multiple_hits: bool) {
        if length == 0 {
            return;
        }
        let l = length as f64;
        let (q, log_q) = if multiple_hits { (0.5f64, 0.5f64.ln()) } else { (0.0, LPROB_ZERO) };
        let r = q / (1.0 - q);

        let lp = l.ln() - (l + 2.0 + r).ln();
        let l1p = (2.0 + r).ln() - (l + 2.0 + r).ln();

        self.nn = lp;
        self.cc = lp;
        self.jj = lp;
        self.nb = l1p;
        self.ct = l1p;
        self.jb = l1p;
        self.rr = l.ln() - (l + 1.0).ln();
        self.ej = log_q;
        self.ec = (1.0 - q).ln();
    }

    /// 局部比对片段长度：B→M_k 在 M 个节点上均匀进入，M/D→E 权重为 1
    pub fn set_core_length(&mut self, core_length: usize) {
        if core_length == 0 {
            return;
        }
        let m = core_length as f64;
        self.bm = 2f64.ln() - m.ln() - (m + 1.0).ln();
        self.me = 0.0;
    }
}
