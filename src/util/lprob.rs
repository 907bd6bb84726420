//! 对数空间概率运算。
//!
//! 所有概率均以自然对数表示；`LPROB_ZERO`（负无穷）代表概率 0，
//! 参与加法时自然传播，不会产生 NaN。

use anyhow::{bail, Result};

/// log(0)
pub const LPROB_ZERO: f64 = f64::NEG_INFINITY;

#[inline]
pub fn is_zero(lp: f64) -> bool {
    lp == LPROB_ZERO
}

/// log(exp(a) + exp(b))
#[inline]
pub fn logaddexp(a: f64, b: f64) -> f64 {
    if is_zero(a) {
        return b;
    }
    if is_zero(b) {
        return a;
    }
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

pub fn logsumexp<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().fold(LPROB_ZERO, logaddexp)
}

/// 将一组对数概率归一化，使 logsumexp 为 0。
/// 全部为 0 概率（或为空）时无法归一化，返回错误。
pub fn lprob_normalize(lprobs: &mut [f64]) -> Result<()> {
    if lprobs.iter().any(|v| v.is_nan()) {
        bail!("log-probabilities contain NaN");
    }
    let norm = logsumexp(lprobs.iter().copied());
    if is_zero(norm) {
        bail!("cannot normalize an all-zero probability table");
    }
    if norm == f64::INFINITY {
        bail!("log-probabilities are not finite");
    }
    for v in lprobs.iter_mut() {
        *v -= norm;
    }
    Ok(())
}

/// ln C(n, k)，n 很小，直接连乘
pub fn ln_binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return LPROB_ZERO;
    }
    let k = k.min(n - k);
    let mut acc = 1.0f64;
    for i in 0..k {
        acc = acc * (n - i) as f64 / (i + 1) as f64;
    }
    acc.ln()
}
