use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::path::{Path, Step};
use super::result::SearchResult;
use crate::io::hmmer::HmmerModel;
use crate::model::{
    AltModel, CoreNode, FlankStates, FrameStateFactory, NullModel, SpecialTransitions, StandardStateFactory,
    StateFactory, StateKind, Transitions,
};
use crate::util::alphabet::{Alphabet, Sequence};
use crate::util::dna;
use crate::util::gencode::GeneticCode;
use crate::util::lprob::{is_zero, lprob_normalize, LPROB_ZERO};

/// profile 读取端交给核心的原始参数（对数概率，未归一化，缺省项为 `LPROB_ZERO`）
#[derive(Clone, Debug)]
pub struct ProfileParams {
    pub name: String,
    pub accession: Option<String>,
    pub description: Option<String>,
    /// profile（氨基酸）字母表，发射表按其符号顺序排列
    pub alphabet: Alphabet,
    /// 背景分布（insert 0）
    pub insert0: Vec<f64>,
    pub nodes: Vec<NodeParams>,
}

#[derive(Clone, Debug)]
pub struct NodeParams {
    pub match_lprobs: Vec<f64>,
    pub insert_lprobs: Vec<f64>,
    /// 从上一个节点进入本节点的转移；第一个节点的是离开 begin 节点的转移
    pub trans: Transitions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileKind {
    /// 查询为氨基酸序列，每步一个符号
    Standard,
    /// 查询为核苷酸序列，每步 1..=5 个碱基
    Frame,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMeta {
    pub name: String,
    pub accession: Option<String>,
    pub description: Option<String>,
}

/// 空模型 + Plan7 备择模型。
///
/// `search` 会按查询长度更新长度相关的特殊转移，因此需要 `&mut self`；
/// 多线程时每个线程持有自己的副本。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Profile {
    meta: ProfileMeta,
    kind: ProfileKind,
    alphabet: Alphabet,
    null_model: NullModel,
    alt_model: AltModel,
    special: SpecialTransitions,
    multiple_hits: bool,
    target_length: usize,
}

impl Profile {
    pub fn standard(params: &ProfileParams) -> Result<Self> {
        let factory = StandardStateFactory::new(params.alphabet.clone());
        Self::build(params, &factory, ProfileKind::Standard)
    }

    /// 标准遗传密码，泄漏参数 ε
    pub fn frame(params: &ProfileParams, epsilon: f64) -> Result<Self> {
        let factory = FrameStateFactory::new(params.alphabet.clone(), GeneticCode::standard(), epsilon)?;
        Self::build(params, &factory, ProfileKind::Frame)
    }

    pub fn standard_from_hmmer(model: &HmmerModel) -> Result<Self> {
        Self::standard(&model.to_params())
    }

    pub fn frame_from_hmmer(model: &HmmerModel, epsilon: f64) -> Result<Self> {
        if model.alphabet != Alphabet::amino() {
            bail!("profile '{}': frame profiles need an amino-acid HMM", model.name);
        }
        Self::frame(&model.to_params(), epsilon)
    }

    pub fn build<F: StateFactory>(params: &ProfileParams, factory: &F, kind: ProfileKind) -> Result<Self> {
        let name = params.name.as_str();
        if params.nodes.is_empty() {
            bail!("profile '{}' has no core nodes", name);
        }
        let k = params.alphabet.len();

        let null_lprobs = normalized(&params.insert0, k)
            .with_context(|| format!("profile '{}': background distribution", name))?;

        let mut core = Vec::with_capacity(params.nodes.len());
        for (i, node) in params.nodes.iter().enumerate() {
            let m = i as u32 + 1;
            let match_lprobs = normalized(&node.match_lprobs, k)
                .with_context(|| format!("profile '{}': match emissions of node {}", name, m))?;
            let insert_lprobs = normalized(&node.insert_lprobs, k)
                .with_context(|| format!("profile '{}': insert emissions of node {}", name, m))?;
            let trans = node
                .trans
                .normalized()
                .with_context(|| format!("profile '{}': transitions into node {}", name, m))?;
            core.push(CoreNode {
                m: factory.create(StateKind::Match(m), &match_lprobs),
                i: factory.create(StateKind::Insert(m), &insert_lprobs),
                trans,
            });
        }

        let flanks = FlankStates {
            n: factory.create(StateKind::NFlank, &null_lprobs),
            j: factory.create(StateKind::Join, &null_lprobs),
            c: factory.create(StateKind::CFlank, &null_lprobs),
        };
        let null_model = NullModel::new(factory.create(StateKind::Null, &null_lprobs));

        let mut special = SpecialTransitions::default();
        special.set_core_length(core.len());
        let alt_model = AltModel::new(flanks, core, &special).with_context(|| format!("profile '{}'", name))?;

        log::debug!(
            "built {:?} profile '{}' with {} nodes ({} states)",
            kind,
            name,
            alt_model.len(),
            alt_model.num_states()
        );

        Ok(Self {
            meta: ProfileMeta {
                name: params.name.clone(),
                accession: params.accession.clone(),
                description: params.description.clone(),
            },
            kind,
            alphabet: factory.query_alphabet().clone(),
            null_model,
            alt_model,
            special,
            multiple_hits: true,
            target_length: 0,
        })
    }

    pub fn meta(&self) -> &ProfileMeta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    /// 查询序列的字母表（frame 为核苷酸）
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn core_length(&self) -> usize {
        self.alt_model.len()
    }

    pub fn null_model(&self) -> &NullModel {
        &self.null_model
    }

    pub fn alt_model(&self) -> &AltModel {
        &self.alt_model
    }

    pub fn special_transitions(&self) -> &SpecialTransitions {
        &self.special
    }

    pub fn target_length(&self) -> usize {
        self.target_length
    }

    pub fn multiple_hits(&self) -> bool {
        self.multiple_hits
    }

    /// 切换多次命中模式，立即按当前目标长度重算特殊转移
    pub fn set_multiple_hits(&mut self, multiple_hits: bool) {
        self.multiple_hits = multiple_hits;
        if self.target_length > 0 {
            self.apply_length_model();
        }
    }

    /// 长度为 0 时保持原状
    pub fn set_target_length(&mut self, length: usize) {
        if length == 0 {
            return;
        }
        self.target_length = length;
        self.apply_length_model();
    }

    fn apply_length_model(&mut self) {
        self.special.set_target_length(self.target_length, self.multiple_hits);
        self.alt_model.apply_special_transitions(&self.special);
        self.null_model.set_transition(self.special.rr);
    }

    /// 按本 profile 的查询字母表编码序列；frame 先做核苷酸规范化（U→T，未知→N）
    pub fn sequence(&self, text: &[u8]) -> Result<Sequence> {
        match self.kind {
            ProfileKind::Standard => Sequence::new(&self.alphabet, text),
            ProfileKind::Frame => Sequence::new(&self.alphabet, &dna::normalize_seq(text)),
        }
    }

    /// log-odds = Viterbi(alt) − likelihood(null)，并把解码路径切分为片段
    pub fn search(&mut self, seq: &Sequence) -> SearchResult {
        self.set_target_length(seq.len());
        let null = self.null_model.likelihood(seq);
        let decode = self.alt_model.viterbi(seq);

        let score = if is_zero(decode.loglik) { LPROB_ZERO } else { decode.loglik - null };
        let steps = decode
            .steps
            .iter()
            .map(|&(id, len)| Step::new(self.alt_model.state(id).kind, len))
            .collect();
        log::trace!(
            "profile '{}': len={} alt={:.4} null={:.4} score={:.4}",
            self.meta.name,
            seq.len(),
            decode.loglik,
            null,
            score
        );
        SearchResult::new(score, seq, Path::new(steps))
    }
}

fn normalized(lprobs: &[f64], expected: usize) -> Result<Vec<f64>> {
    if lprobs.len() != expected {
        bail!("expected {} probabilities, got {}", expected, lprobs.len());
    }
    let mut v = lprobs.to_vec();
    lprob_normalize(&mut v)?;
    Ok(v)
}
