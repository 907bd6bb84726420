use std::fmt;

use super::path::{Path, Step};
use crate::model::StateKind;
use crate::util::alphabet::{Interval, Sequence};

/// 序列片段：子序列 + 对应子路径 + 是否同源
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    sequence: Sequence,
    path: Path,
    homologous: bool,
}

impl Fragment {
    pub fn new(sequence: Sequence, path: Path, homologous: bool) -> Self {
        Self { sequence, path, homologous }
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn homologous(&self) -> bool {
        self.homologous
    }

    /// 逐步给出 (该步消耗的符号, 步)
    pub fn items(&self) -> impl Iterator<Item = (&[u8], &Step)> + '_ {
        let symbols = self.sequence.symbols();
        let mut start = 0usize;
        self.path.iter().map(move |step| {
            let end = start + step.seq_len;
            let item = (&symbols[start..end], step);
            start = end;
            item
        })
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.sequence)
    }
}

/// 一次搜索的结果：log-odds 得分与按同源性切分的片段
#[derive(Clone, Debug)]
pub struct SearchResult {
    loglik: f64,
    path: Path,
    fragments: Vec<Fragment>,
    intervals: Vec<Interval>,
}

impl SearchResult {
    pub fn new(loglik: f64, sequence: &Sequence, path: Path) -> Self {
        let mut fragments = Vec::new();
        let mut intervals = Vec::new();
        for (fragi, stepi, homologous) in create_fragments(&path) {
            let frag = Fragment::new(sequence.slice(fragi), path.slice(stepi), homologous);
            fragments.push(frag);
            intervals.push(fragi);
        }
        Self { loglik, path, fragments, intervals }
    }

    pub fn loglikelihood(&self) -> f64 {
        self.loglik
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// 完整的解码路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frag in &self.fragments {
            write!(f, "{}", frag)?;
        }
        Ok(())
    }
}

/// 单次从左到右扫描路径，在进入 M（非同源时）、进入 E（同源时）、
/// 进入 T（非同源时）处切分。返回 (序列区间, 步区间, 是否同源)，丢弃空片段。
pub fn create_fragments(path: &Path) -> Vec<(Interval, Interval, bool)> {
    let mut out = Vec::new();
    let (mut frag_start, mut frag_stop) = (0usize, 0usize);
    let mut step_start = 0usize;
    let mut homologous = false;

    for (step_stop, step) in path.iter().enumerate() {
        let change = match step.state {
            StateKind::Match(_) => !homologous,
            StateKind::End => homologous,
            StateKind::Terminal => !homologous,
            _ => false,
        };

        if change {
            if frag_start < frag_stop {
                out.push((
                    Interval::new(frag_start, frag_stop),
                    Interval::new(step_start, step_stop),
                    homologous,
                ));
            }
            frag_start = frag_stop;
            step_start = step_stop;
            homologous = !homologous;
        }

        frag_stop += step.seq_len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::alphabet::Alphabet;

    fn step(state: StateKind, n: usize) -> Step {
        Step::new(state, n)
    }

    /// S N N B M1 M2 E J B M1 E C T
    fn two_hit_path() -> Path {
        Path::new(vec![
            step(StateKind::Start, 0),
            step(StateKind::NFlank, 1),
            step(StateKind::NFlank, 1),
            step(StateKind::Begin, 0),
            step(StateKind::Match(1), 1),
            step(StateKind::Match(2), 1),
            step(StateKind::End, 0),
            step(StateKind::Join, 1),
            step(StateKind::Begin, 0),
            step(StateKind::Match(2), 1),
            step(StateKind::End, 0),
            step(StateKind::CFlank, 1),
            step(StateKind::Terminal, 0),
        ])
    }

    #[test]
    fn fragments_alternate_and_partition() {
        let path = two_hit_path();
        let frags = create_fragments(&path);
        let flags: Vec<bool> = frags.iter().map(|f| f.2).collect();
        assert_eq!(flags, [false, true, false, true, false]);
        assert_eq!(frags[0].0, Interval::new(0, 2));
        assert_eq!(frags[1].0, Interval::new(2, 4));
        assert_eq!(frags[1].1, Interval::new(4, 6));
        assert_eq!(frags[4].0, Interval::new(6, 7));
        for w in frags.windows(2) {
            assert_eq!(w[0].0.end, w[1].0.start);
            assert_eq!(w[0].1.end, w[1].1.start);
        }
    }

    #[test]
    fn empty_flanks_are_omitted() {
        let path = Path::new(vec![
            step(StateKind::Start, 0),
            step(StateKind::Begin, 0),
            step(StateKind::Match(1), 1),
            step(StateKind::Insert(1), 1),
            step(StateKind::Match(2), 1),
            step(StateKind::End, 0),
            step(StateKind::Terminal, 0),
        ]);
        let frags = create_fragments(&path);
        assert_eq!(frags.len(), 1);
        assert!(frags[0].2);
        assert_eq!(frags[0].0, Interval::new(0, 3));
    }

    #[test]
    fn search_result_slices_sequence() {
        let abc = Alphabet::amino();
        let seq = Sequence::new(&abc, b"KKPGDEA").unwrap();
        let res = SearchResult::new(1.5, &seq, two_hit_path());
        assert_eq!(res.loglikelihood(), 1.5);
        let text: Vec<String> = res.fragments().iter().map(ToString::to_string).collect();
        assert_eq!(text, ["[KK]", "[PG]", "[D]", "[E]", "[A]"]);
        assert_eq!(res.to_string(), "[KK][PG][D][E][A]");
        assert_eq!(res.intervals().len(), 5);

        let items: Vec<(Vec<u8>, String)> = res.fragments()[0]
            .items()
            .map(|(s, st)| (s.to_vec(), st.to_string()))
            .collect();
        assert_eq!(items[0], (b"".to_vec(), "<S,0>".to_string()));
        assert_eq!(items[1], (b"K".to_vec(), "<N,1>".to_string()));
        assert_eq!(items[3], (b"".to_vec(), "<B,0>".to_string()));
    }

    #[test]
    fn empty_path_gives_no_fragments() {
        let abc = Alphabet::amino();
        let seq = Sequence::new(&abc, b"").unwrap();
        let res = SearchResult::new(f64::NEG_INFINITY, &seq, Path::default());
        assert!(res.fragments().is_empty());
        assert!(res.intervals().is_empty());
    }
}
