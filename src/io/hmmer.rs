use anyhow::{anyhow, bail, Context, Result};
use std::io::BufRead;

use crate::model::Transitions;
use crate::search::{NodeParams, ProfileParams};
use crate::util::alphabet::Alphabet;
use crate::util::lprob::LPROB_ZERO;

/// HMMER3 文本格式中的一个 profile（数值已转成自然对数概率）
#[derive(Debug, Clone)]
pub struct HmmerModel {
    pub name: String,
    pub accession: Option<String>,
    pub description: Option<String>,
    pub length: usize,
    pub alphabet: Alphabet,
    pub compo: Option<Vec<f64>>,
    pub insert0: Vec<f64>,
    /// 离开 node 0 (begin) 的转移
    pub begin_trans: Transitions,
    pub nodes: Vec<HmmerNode>,
}

#[derive(Debug, Clone)]
pub struct HmmerNode {
    pub match_lprobs: Vec<f64>,
    pub insert_lprobs: Vec<f64>,
    /// 离开本节点的转移
    pub trans: Transitions,
}

impl HmmerModel {
    /// 转成 profile 参数：节点 k 的转移取自节点 k-1 的转移行
    pub fn to_params(&self) -> ProfileParams {
        let mut into = Vec::with_capacity(self.nodes.len());
        into.push(self.begin_trans);
        into.extend(self.nodes.iter().take(self.nodes.len().saturating_sub(1)).map(|n| n.trans));

        let nodes = self
            .nodes
            .iter()
            .zip(into)
            .map(|(n, trans)| NodeParams {
                match_lprobs: n.match_lprobs.clone(),
                insert_lprobs: n.insert_lprobs.clone(),
                trans,
            })
            .collect();

        ProfileParams {
            name: self.name.clone(),
            accession: self.accession.clone(),
            description: self.description.clone(),
            alphabet: self.alphabet.clone(),
            insert0: self.insert0.clone(),
            nodes,
        }
    }
}

pub struct HmmerReader<R: BufRead> {
    reader: R,
    buf: String,
    line_no: usize,
}

impl<R: BufRead> HmmerReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, buf: String::new(), line_no: 0 }
    }

    /// 读下一行（去掉行尾空白），文件结束返回 None
    fn read_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        let n = self.reader.read_line(&mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(self.buf.trim_end().to_string()))
    }

    fn expect_line(&mut self) -> Result<String> {
        self.read_line()?
            .ok_or_else(|| anyhow!("line {}: unexpected end of file inside HMM record", self.line_no))
    }

    pub fn next_model(&mut self) -> Result<Option<HmmerModel>> {
        // 找到记录头
        loop {
            match self.read_line()? {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) if line.starts_with("HMMER3") => break,
                Some(line) => bail!("line {}: expected HMMER3 header, got '{}'", self.line_no, line),
            }
        }

        let mut name: Option<String> = None;
        let mut accession = None;
        let mut description = None;
        let mut length: Option<usize> = None;
        let mut alphabet: Option<Alphabet> = None;

        // 头部标签，直到 HMM 行
        let symbols = loop {
            let line = self.expect_line()?;
            let mut parts = line.splitn(2, char::is_whitespace);
            let tag = parts.next().unwrap_or("");
            let value = parts.next().map(str::trim).unwrap_or("");
            match tag {
                "NAME" => name = Some(value.to_string()),
                "ACC" => accession = Some(value.to_string()),
                "DESC" => description = Some(value.to_string()),
                "LENG" => {
                    let n = value
                        .parse::<usize>()
                        .map_err(|e| anyhow!("line {}: invalid LENG '{}': {}", self.line_no, value, e))?;
                    length = Some(n);
                }
                "ALPH" => alphabet = Some(parse_alphabet(value).with_context(|| format!("line {}", self.line_no))?),
                "HMM" => break value.split_whitespace().map(|s| s.as_bytes()[0]).collect::<Vec<u8>>(),
                _ => {}
            }
        };

        let name = name.ok_or_else(|| anyhow!("line {}: HMM record without NAME", self.line_no))?;
        let length = length.ok_or_else(|| anyhow!("line {}: HMM '{}' without LENG", self.line_no, name))?;
        let alphabet = alphabet.ok_or_else(|| anyhow!("line {}: HMM '{}' without ALPH", self.line_no, name))?;
        if symbols != alphabet.symbols() {
            bail!(
                "line {}: HMM '{}' symbol header '{}' does not match alphabet",
                self.line_no,
                name,
                String::from_utf8_lossy(&symbols)
            );
        }
        let k = alphabet.len();

        // 转移列名行
        self.expect_line()?;

        let mut line = self.expect_line()?;
        let mut compo = None;
        if line.split_whitespace().next() == Some("COMPO") {
            compo = Some(self.parse_values(&line, 1, k)?);
            line = self.expect_line()?;
        }
        let insert0 = self.parse_values(&line, 0, k)?;
        let line = self.expect_line()?;
        let begin_trans = self.parse_transitions(&line)?;

        let mut nodes = Vec::with_capacity(length);
        loop {
            let line = self.expect_line()?;
            if line.trim() == "//" {
                break;
            }
            let index = line.split_whitespace().next().unwrap_or("");
            if index != (nodes.len() + 1).to_string() {
                bail!("line {}: expected node {}, got '{}'", self.line_no, nodes.len() + 1, index);
            }
            // 节点号 + k 个发射 + 注释列
            let match_lprobs = self.parse_values(&line, 1, k)?;
            let line = self.expect_line()?;
            let insert_lprobs = self.parse_values(&line, 0, k)?;
            let line = self.expect_line()?;
            let trans = self.parse_transitions(&line)?;
            nodes.push(HmmerNode { match_lprobs, insert_lprobs, trans });
        }

        if nodes.len() != length {
            bail!(
                "line {}: HMM '{}' has {} nodes but LENG is {}",
                self.line_no,
                name,
                nodes.len(),
                length
            );
        }

        log::debug!("read HMM '{}' ({} nodes)", name, length);
        Ok(Some(HmmerModel {
            name,
            accession,
            description,
            length,
            alphabet,
            compo,
            insert0,
            begin_trans,
            nodes,
        }))
    }

    /// 跳过前 `skip` 个字段后取 `count` 个 -ln p 数值
    fn parse_values(&self, line: &str, skip: usize, count: usize) -> Result<Vec<f64>> {
        let fields: Vec<&str> = line.split_whitespace().skip(skip).take(count).collect();
        if fields.len() != count {
            bail!("line {}: expected {} values, found {}", self.line_no, count, fields.len());
        }
        fields
            .iter()
            .map(|f| parse_neg_log(f).with_context(|| format!("line {}", self.line_no)))
            .collect()
    }

    fn parse_transitions(&self, line: &str) -> Result<Transitions> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 7 {
            bail!("line {}: expected 7 transitions, found {}", self.line_no, fields.len());
        }
        let v = self.parse_values(line, 0, 7)?;
        Ok(Transitions { mm: v[0], mi: v[1], md: v[2], im: v[3], ii: v[4], dm: v[5], dd: v[6] })
    }
}

fn parse_alphabet(value: &str) -> Result<Alphabet> {
    match value.to_ascii_lowercase().as_str() {
        "amino" => Ok(Alphabet::amino()),
        "dna" => Ok(Alphabet::nucleotide()),
        "rna" => Alphabet::new(b"ACGU", b'N'),
        other => bail!("unsupported alphabet '{}'", other),
    }
}

/// HMMER 存 -ln p，`*` 表示概率 0
fn parse_neg_log(field: &str) -> Result<f64> {
    if field == "*" {
        return Ok(LPROB_ZERO);
    }
    let v: f64 = field
        .parse()
        .map_err(|e| anyhow!("invalid probability field '{}': {}", field, e))?;
    Ok(-v)
}

/// 读出文件中所有 HMM
pub fn read_models(path: &str) -> Result<Vec<HmmerModel>> {
    let fh = std::fs::File::open(path).map_err(|e| anyhow!("cannot open HMM file '{}': {}", path, e))?;
    let mut reader = HmmerReader::new(std::io::BufReader::new(fh));
    let mut models = Vec::new();
    while let Some(m) = reader.next_model().with_context(|| format!("parsing '{}'", path))? {
        models.push(m);
    }
    Ok(models)
}
