use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::model::StateKind;
use crate::util::alphabet::Interval;

/// 路径中的一步：状态与其消耗的符号数
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub state: StateKind,
    pub seq_len: usize,
}

impl Step {
    pub fn new(state: StateKind, seq_len: usize) -> Self {
        Self { state, seq_len }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{},{}>", self.state, self.seq_len)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    steps: Vec<Step>,
}

impl Path {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 所有步消耗的符号总数
    pub fn seq_len(&self) -> usize {
        self.steps.iter().map(|s| s.seq_len).sum()
    }

    /// 按步下标区间截取子路径
    pub fn slice(&self, iv: Interval) -> Path {
        Path { steps: self.steps[iv.start..iv.end].to_vec() }
    }
}

impl Index<usize> for Path {
    type Output = Step;

    fn index(&self, i: usize) -> &Step {
        &self.steps[i]
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}
