use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::state::{State, StateKind};
use super::transitions::{SpecialTransitions, Transitions};
use crate::util::alphabet::Sequence;
use crate::util::lprob::{is_zero, LPROB_ZERO};

/// 状态在 arena 中的下标
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateId(u32);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 一个 profile 位置：M/I/D 三个状态的句柄
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub m: StateId,
    pub i: StateId,
    pub d: StateId,
}

/// 七个侧翼状态的句柄
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialNode {
    pub s: StateId,
    pub n: StateId,
    pub b: StateId,
    pub e: StateId,
    pub j: StateId,
    pub c: StateId,
    pub t: StateId,
}

/// 构图输入：一个核心位置的 M/I 状态，以及从上一位置进入它的转移（已归一化）
#[derive(Clone, Debug)]
pub struct CoreNode {
    pub m: State,
    pub i: State,
    pub trans: Transitions,
}

/// 构图输入：发射背景分布的 N/J/C
#[derive(Clone, Debug)]
pub struct FlankStates {
    pub n: State,
    pub j: State,
    pub c: State,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
struct Edge {
    from: StateId,
    lprob: f64,
}

/// Viterbi 解码结果：得分与 (状态, 消耗符号数) 序列
#[derive(Clone, Debug, PartialEq)]
pub struct Decode {
    pub loglik: f64,
    pub steps: Vec<(StateId, usize)>,
}

#[derive(Clone, Copy)]
struct Back {
    from: u32,
    len: u8,
}

impl Back {
    const NONE: Back = Back { from: u32::MAX, len: 0 };
}

/// Plan7 备择模型：状态 arena + 入边表 + Viterbi。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AltModel {
    states: Vec<State>,
    /// incoming[s]：所有指向 s 的边，按连线顺序
    incoming: Vec<Vec<Edge>>,
    special: SpecialNode,
    core: Vec<Node>,
    /// 静默状态的拓扑序
    mute_order: Vec<StateId>,
    emitting: Vec<StateId>,
}

impl AltModel {
    pub fn new(flanks: FlankStates, core: Vec<CoreNode>, trans: &SpecialTransitions) -> Result<Self> {
        if core.is_empty() {
            bail!("profile has no core nodes");
        }
        for st in [&flanks.n, &flanks.j, &flanks.c] {
            if st.is_mute() {
                bail!("flanking state {} must emit", st.kind);
            }
        }

        let mut model = AltModel {
            states: Vec::with_capacity(7 + 3 * core.len()),
            incoming: Vec::new(),
            special: SpecialNode {
                s: StateId(0),
                n: StateId(0),
                b: StateId(0),
                e: StateId(0),
                j: StateId(0),
                c: StateId(0),
                t: StateId(0),
            },
            core: Vec::with_capacity(core.len()),
            mute_order: Vec::new(),
            emitting: Vec::new(),
        };

        let s = model.add_state(State::mute(StateKind::Start));
        let n = model.add_state(flanks.n);
        let b = model.add_state(State::mute(StateKind::Begin));
        let e = model.add_state(State::mute(StateKind::End));
        let j = model.add_state(flanks.j);
        let c = model.add_state(flanks.c);
        let t = model.add_state(State::mute(StateKind::Terminal));
        model.special = SpecialNode { s, n, b, e, j, c, t };

        let mut nodes_trans = Vec::with_capacity(core.len());
        for (k, node) in core.into_iter().enumerate() {
            if node.m.is_mute() || node.i.is_mute() {
                bail!("match/insert states of node {} must emit", k + 1);
            }
            let m = model.add_state(node.m);
            let i = model.add_state(node.i);
            let d = model.add_state(State::mute(StateKind::Delete(k as u32 + 1)));
            model.core.push(Node { m, i, d });
            nodes_trans.push(node.trans);
        }

        let nodes = model.core.clone();
        for (pair, t) in nodes.windows(2).zip(&nodes_trans[1..]) {
            let (prev, node) = (pair[0], pair[1]);
            model.set_transition(prev.m, node.m, t.mm);
            model.set_transition(prev.m, prev.i, t.mi);
            model.set_transition(prev.m, node.d, t.md);
            model.set_transition(prev.i, node.m, t.im);
            model.set_transition(prev.i, prev.i, t.ii);
            model.set_transition(prev.d, node.m, t.dm);
            model.set_transition(prev.d, node.d, t.dd);
        }

        model.apply_special_transitions(trans);
        model.mute_order = model.sort_mute_states()?;
        model.emitting = (0..model.states.len())
            .map(|i| StateId(i as u32))
            .filter(|&id| !model.states[id.index()].is_mute())
            .collect();
        Ok(model)
    }

    fn add_state(&mut self, state: State) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.states.push(state);
        self.incoming.push(Vec::new());
        id
    }

    /// 设置 a→b 的转移；已存在则覆盖
    pub fn set_transition(&mut self, a: StateId, b: StateId, lprob: f64) {
        let edges = &mut self.incoming[b.index()];
        match edges.iter_mut().find(|e| e.from == a) {
            Some(edge) => edge.lprob = lprob,
            None => edges.push(Edge { from: a, lprob }),
        }
    }

    pub fn transition(&self, a: StateId, b: StateId) -> Option<f64> {
        self.incoming[b.index()]
            .iter()
            .find(|e| e.from == a)
            .map(|e| e.lprob)
    }

    /// 侧翼连线、B→M_k 与 M_k/D_k→E
    pub fn apply_special_transitions(&mut self, t: &SpecialTransitions) {
        let SpecialNode { s, n, b, e, j, c, t: term } = self.special;
        self.set_transition(s, b, t.nb);
        self.set_transition(s, n, t.nn);
        self.set_transition(n, n, t.nn);
        self.set_transition(n, b, t.nb);
        self.set_transition(e, term, t.ec + t.ct);
        self.set_transition(e, c, t.ec + t.cc);
        self.set_transition(c, c, t.cc);
        self.set_transition(c, term, t.ct);
        self.set_transition(e, b, t.ej + t.jb);
        self.set_transition(e, j, t.ej + t.jj);
        self.set_transition(j, j, t.jj);
        self.set_transition(j, b, t.jb);

        let nodes = self.core.clone();
        for node in nodes {
            self.set_transition(b, node.m, t.bm);
            self.set_transition(node.m, e, t.me);
            self.set_transition(node.d, e, t.me);
        }
    }

    fn sort_mute_states(&self) -> Result<Vec<StateId>> {
        let ns = self.states.len();
        let is_mute = |id: StateId| self.states[id.index()].is_mute();
        let mut indegree = vec![0usize; ns];
        let mut outgoing: Vec<Vec<StateId>> = vec![Vec::new(); ns];
        for (to, edges) in self.incoming.iter().enumerate() {
            let to = StateId(to as u32);
            if !is_mute(to) {
                continue;
            }
            for edge in edges {
                if is_mute(edge.from) {
                    indegree[to.index()] += 1;
                    outgoing[edge.from.index()].push(to);
                }
            }
        }

        let mut ready: Vec<StateId> = (0..ns)
            .map(|i| StateId(i as u32))
            .filter(|&id| is_mute(id) && indegree[id.index()] == 0)
            .rev()
            .collect();
        let mut order = Vec::new();
        while let Some(id) = ready.pop() {
            order.push(id);
            for &to in outgoing[id.index()].iter().rev() {
                indegree[to.index()] -= 1;
                if indegree[to.index()] == 0 {
                    ready.push(to);
                }
            }
        }

        let n_mute = (0..ns).filter(|&i| self.states[i].is_mute()).count();
        if order.len() != n_mute {
            bail!("mute states form a cycle");
        }
        Ok(order)
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn special_node(&self) -> &SpecialNode {
        &self.special
    }

    pub fn core_nodes(&self) -> &[Node] {
        &self.core
    }

    /// 核心位置数
    pub fn len(&self) -> usize {
        self.core.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }

    /// 精确 max-sum 动态规划。
    ///
    /// `score[col][s]` 为消耗前 col 个符号、停在状态 s 的最优得分。
    /// 发射状态只读取更早的列；静默状态按拓扑序在同一列内松弛。
    /// 平局保留最短跨度与连线顺序中最先出现的前驱。
    pub fn viterbi(&self, seq: &Sequence) -> Decode {
        let codes = seq.codes();
        let n = codes.len();
        let ns = self.states.len();
        let start = self.special.s.index();

        let mut score = vec![LPROB_ZERO; (n + 1) * ns];
        let mut back = vec![Back::NONE; (n + 1) * ns];
        score[start] = 0.0;

        for col in 0..=n {
            let row = col * ns;
            for &sid in &self.emitting {
                let s = sid.index();
                let state = &self.states[s];
                let (lo, hi) = state.span();
                let mut best = LPROB_ZERO;
                let mut arg = Back::NONE;
                for len in lo..=hi.min(col) {
                    let e = state.lprob(&codes[col - len..col]);
                    if is_zero(e) {
                        continue;
                    }
                    let prev = (col - len) * ns;
                    for edge in &self.incoming[s] {
                        let v = score[prev + edge.from.index()] + edge.lprob + e;
                        if v > best {
                            best = v;
                            arg = Back { from: edge.from.0, len: len as u8 };
                        }
                    }
                }
                score[row + s] = best;
                back[row + s] = arg;
            }

            for &sid in &self.mute_order {
                let s = sid.index();
                if s == start {
                    continue;
                }
                let mut best = LPROB_ZERO;
                let mut arg = Back::NONE;
                for edge in &self.incoming[s] {
                    let v = score[row + edge.from.index()] + edge.lprob;
                    if v > best {
                        best = v;
                        arg = Back { from: edge.from.0, len: 0 };
                    }
                }
                score[row + s] = best;
                back[row + s] = arg;
            }
        }

        let term = self.special.t.index();
        let loglik = score[n * ns + term];
        if is_zero(loglik) {
            return Decode { loglik: LPROB_ZERO, steps: Vec::new() };
        }

        let mut steps = Vec::new();
        let mut col = n;
        let mut s = term;
        loop {
            let b = back[col * ns + s];
            if b.from == u32::MAX {
                debug_assert!(col == 0 && s == start);
                steps.push((StateId(s as u32), 0));
                break;
            }
            steps.push((StateId(s as u32), b.len as usize));
            col -= b.len as usize;
            s = b.from as usize;
        }
        steps.reverse();
        Decode { loglik, steps }
    }
}
