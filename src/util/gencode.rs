//! 遗传密码表（NCBI 表 1，标准密码）。
//!
//! 密码子以 ACGT 的编码三元组表示（见 [`crate::util::dna::base_code`]），
//! 终止密码子不对应任何氨基酸，不会被发射。

/// 按 TCAG 顺序排列的 64 个密码子对应的氨基酸（NCBI 标准排列）
const TABLE1_AAS: &[u8; 64] = b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";
const TCAG: [u8; 4] = [b'T', b'C', b'A', b'G'];

pub type Codon = [u8; 3];

#[inline]
pub fn codon_index(c: Codon) -> usize {
    (c[0] as usize) * 16 + (c[1] as usize) * 4 + c[2] as usize
}

pub fn codon_from_index(i: usize) -> Codon {
    [(i / 16) as u8, ((i / 4) % 4) as u8, (i % 4) as u8]
}

#[derive(Clone, Debug)]
pub struct GeneticCode {
    /// 以 ACGT 编码的密码子下标（0..64）为索引
    aas: [u8; 64],
}

impl Default for GeneticCode {
    fn default() -> Self {
        Self::standard()
    }
}

impl GeneticCode {
    pub fn standard() -> Self {
        let mut aas = [b'*'; 64];
        for (i, &aa) in TABLE1_AAS.iter().enumerate() {
            let codon = [
                super::dna::base_code(TCAG[i / 16]),
                super::dna::base_code(TCAG[(i / 4) % 4]),
                super::dna::base_code(TCAG[i % 4]),
            ];
            aas[codon_index(codon)] = aa;
        }
        Self { aas }
    }

    /// 翻译一个密码子；终止密码子返回 b'*'
    pub fn translate(&self, codon: Codon) -> u8 {
        self.aas[codon_index(codon)]
    }

    /// 某氨基酸的全部同义密码子
    pub fn codons(&self, aa: u8) -> Vec<Codon> {
        let aa = aa.to_ascii_uppercase();
        if aa == b'*' {
            return Vec::new();
        }
        (0..64)
            .map(codon_from_index)
            .filter(|&c| self.translate(c) == aa)
            .collect()
    }
}
