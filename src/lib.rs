//! # iseq
//!
//! Profile HMM 同源搜索：Plan7 局部多次命中 Viterbi 解码，
//! 以及在核苷酸序列上直接比对氨基酸 profile 的 frame（密码子感知）变体。
//!
//! 本 crate 提供：
//!
//! - **模型构建**：从 HMMER3 文本 profile 构建空模型与 Plan7 备择模型
//! - **解码**：在状态图上做 Viterbi，得到 log-odds 得分与最优状态路径
//! - **片段切分**：把路径切成交替的同源 / 非同源片段
//! - **frame 模型**：每个 match/insert 状态发射 1..=5 个碱基，容忍移码
//! - **扫描**：多个目标 × 多个 profile 并行解码，输出 TSV
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use iseq::io::hmmer;
//! use iseq::search::Profile;
//!
//! let models = hmmer::read_models("PF03373.hmm")?;
//! let mut profile = Profile::standard_from_hmmer(&models[0])?;
//! let seq = profile.sequence(b"KKKPGKEDNNK")?;
//! let result = profile.search(&seq);
//! println!("score = {:.4}", result.loglikelihood());
//! for frag in result.fragments() {
//!     println!("{} homologous={}", frag, frag.homologous());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`io`]：FASTA 目标序列与 HMMER3 profile 解析
//! - [`model`]：状态、转移、空模型与 Plan7 备择模型
//! - [`search`]：profile、路径片段、profile 库与并行扫描
//! - [`util`]：字母表、对数概率、遗传密码等工具

pub mod io;
pub mod model;
pub mod search;
pub mod util;

#[cfg(test)]
pub(crate) mod fixtures;
