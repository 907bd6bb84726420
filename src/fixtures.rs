//! 测试共用的玩具 profile：8 个节点，共识序列 PGKEDNNK

use crate::model::Transitions;
use crate::search::{NodeParams, ProfileParams};
use crate::util::alphabet::Alphabet;

/// 背景（insert 0 与 insert 发射）概率
pub const BG: f64 = 0.05;
/// match 状态在共识残基上的发射概率
pub const MATCH_P: f64 = 0.8;
pub const MM: f64 = 0.9;

pub const TOY_CONSENSUS: &[u8] = b"PGKEDNNK";

/// 编码 PGKEDNNK 的一段 CDS
pub const TOY_CONSENSUS_CDS: &[u8] = b"CCGGGCAAAGAAGATAACAATAAA";

pub fn toy_transitions() -> Transitions {
    Transitions {
        mm: MM.ln(),
        mi: 0.05f64.ln(),
        md: 0.05f64.ln(),
        im: 0.6f64.ln(),
        ii: 0.4f64.ln(),
        dm: 0.7f64.ln(),
        dd: 0.3f64.ln(),
    }
}

pub fn toy_params() -> ProfileParams {
    let alphabet = Alphabet::amino();
    let k = alphabet.len();
    let other = ((1.0 - MATCH_P) / (k - 1) as f64).ln();
    let nodes = TOY_CONSENSUS
        .iter()
        .map(|&c| {
            let match_lprobs = alphabet
                .symbols()
                .iter()
                .map(|&a| if a == c { MATCH_P.ln() } else { other })
                .collect();
            NodeParams {
                match_lprobs,
                insert_lprobs: vec![BG.ln(); k],
                trans: toy_transitions(),
            }
        })
        .collect();
    ProfileParams {
        name: "toy".to_string(),
        accession: Some("TOY00001.1".to_string()),
        description: Some("Toy profile PGKEDNNK".to_string()),
        alphabet,
        insert0: vec![BG.ln(); k],
        nodes,
    }
}

/// 与 `toy_params` 等价的 HMMER3 文本（概率保留 5 位小数）
pub const TOY_HMM: &str = "\
HMMER3/f [3.1b2 | February 2015]
NAME  toy
ACC   TOY00001.1
DESC  Toy profile PGKEDNNK
LENG  8
ALPH  amino
RF    no
MM    no
CONS  yes
CS    no
MAP   yes
NSEQ  4
STATS LOCAL MSV       -9.0000  0.70000
HMM         A        C        D        E        F        G        H        I        K        L        M        N        P        Q        R        S        T        V        W        Y    
            m->m     m->i     m->d     i->m     i->i     d->m     d->d
  COMPO    2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573
           2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573
           0.10536  2.99573  2.99573  0.51083  0.91629  0.35667  1.20397
      1    4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  0.22314  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  1 p - - -
           2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573
           0.10536  2.99573  2.99573  0.51083  0.91629  0.35667  1.20397
      2    4.55388  4.55388  4.55388  4.55388  4.55388  0.22314  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  2 g - - -
           2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573
           0.10536  2.99573  2.99573  0.51083  0.91629  0.35667  1.20397
      3    4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  0.22314  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  3 k - - -
           2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573
           0.10536  2.99573  2.99573  0.51083  0.91629  0.35667  1.20397
      4    4.55388  4.55388  4.55388  0.22314  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4 e - - -
           2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573
           0.10536  2.99573  2.99573  0.51083  0.91629  0.35667  1.20397
      5    4.55388  4.55388  0.22314  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  5 d - - -
           2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573
           0.10536  2.99573  2.99573  0.51083  0.91629  0.35667  1.20397
      6    4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  0.22314  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  6 n - - -
           2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573
           0.10536  2.99573  2.99573  0.51083  0.91629  0.35667  1.20397
      7    4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  0.22314  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  7 n - - -
           2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573
           0.10536  2.99573  2.99573  0.51083  0.91629  0.35667  1.20397
      8    4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  0.22314  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  4.55388  8 k - - -
           2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573  2.99573
           0.00000        *        *  0.51083  0.91629  0.00000        *
//
";
