use anyhow::{Context, Result};
use rayon::prelude::*;
use std::io::Write;

use crate::io::fasta::{self, FastaRecord};
use crate::util::lprob::is_zero;

pub mod library;
pub mod path;
pub mod profile;
pub mod result;

pub use library::{LibraryMeta, ProfileLibrary, DEFAULT_EPSILON};
pub use path::{Path, Step};
pub use profile::{NodeParams, Profile, ProfileKind, ProfileMeta, ProfileParams};
pub use result::{create_fragments, Fragment, SearchResult};

/// 扫描参数
#[derive(Clone, Copy, Debug)]
pub struct ScanOpt {
    /// 允许经 J 状态的多次命中
    pub multiple_hits: bool,
    /// 目标为核苷酸序列，使用 frame profile
    pub frame: bool,
    /// frame 模型的插入/删除概率；为空时取默认值或库中的值
    pub epsilon: Option<f64>,
    pub threads: usize,
    /// 低于该 log-odds 的 (目标, profile) 对不输出
    pub min_score: Option<f64>,
}

impl Default for ScanOpt {
    fn default() -> Self {
        Self {
            multiple_hits: true,
            frame: false,
            epsilon: None,
            threads: 1,
            min_score: None,
        }
    }
}

impl ScanOpt {
    pub fn kind(&self) -> ProfileKind {
        if self.frame {
            ProfileKind::Frame
        } else {
            ProfileKind::Standard
        }
    }
}

/// 一个 (目标, profile) 对的解码结果
#[derive(Clone, Debug)]
pub struct ScanHit {
    pub target: String,
    pub profile: String,
    pub result: SearchResult,
}

/// 用每个 profile 解码一条目标序列，按 profile 顺序返回
pub fn scan_target(profiles: &mut [Profile], rec: &FastaRecord, min_score: Option<f64>) -> Result<Vec<ScanHit>> {
    let mut hits = Vec::with_capacity(profiles.len());
    for profile in profiles.iter_mut() {
        let seq = profile
            .sequence(&rec.seq)
            .with_context(|| format!("target '{}' for profile '{}'", rec.id, profile.name()))?;
        let result = profile.search(&seq);
        let score = result.loglikelihood();
        if is_zero(score) || min_score.is_some_and(|m| score < m) {
            continue;
        }
        hits.push(ScanHit {
            target: rec.id.clone(),
            profile: profile.name().to_string(),
            result,
        });
    }
    Ok(hits)
}

pub const TSV_HEADER: &str = "#target\tprofile\tfragment\tstart\tend\thomologous\tscore\tsequence";

/// 每个片段一行：目标、profile、片段序号、起点（1-based）、终点、是否同源、得分、符号
pub fn write_hits<W: Write>(out: &mut W, hits: &[ScanHit]) -> Result<()> {
    for hit in hits {
        let res = &hit.result;
        for (i, (frag, iv)) in res.fragments().iter().zip(res.intervals()).enumerate() {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{:.4}\t{}",
                hit.target,
                hit.profile,
                i,
                iv.start + 1,
                iv.end,
                frag.homologous(),
                res.loglikelihood(),
                frag.sequence(),
            )?;
        }
    }
    Ok(())
}

pub fn scan_with_opt(profiles_path: &str, targets_path: &str, out_path: Option<&str>, opt: ScanOpt) -> Result<()> {
    if !opt.frame && opt.epsilon.is_some() {
        log::warn!("epsilon only applies to frame profiles, ignoring it");
    }
    let mut library = ProfileLibrary::open(profiles_path, opt.kind(), opt.epsilon)?;
    for p in &mut library.profiles {
        p.set_multiple_hits(opt.multiple_hits);
    }
    let targets = fasta::read_records(targets_path)?;
    log::info!(
        "scanning {} targets against {} profiles ({} threads, multiple hits: {})",
        targets.len(),
        library.len(),
        opt.threads,
        opt.multiple_hits
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opt.threads.max(1))
        .build()
        .context("failed to build thread pool")?;

    // 每个工作线程持有自己的 profile 副本，结果按目标顺序收集
    let per_target: Vec<Vec<ScanHit>> = pool.install(|| {
        targets
            .par_iter()
            .map_init(
                || library.profiles.clone(),
                |profiles, rec| scan_target(profiles, rec, opt.min_score),
            )
            .collect::<Result<Vec<_>>>()
    })?;

    let mut out: Box<dyn Write> = if let Some(p) = out_path {
        let f = std::fs::File::create(p).map_err(|e| anyhow::anyhow!("cannot create output '{}': {}", p, e))?;
        Box::new(std::io::BufWriter::new(f))
    } else {
        Box::new(std::io::BufWriter::new(std::io::stdout()))
    };
    writeln!(out, "{}", TSV_HEADER)?;
    let mut n_hits = 0usize;
    for hits in &per_target {
        n_hits += hits.len();
        write_hits(&mut out, hits)?;
    }
    out.flush()?;

    log::info!("reported {} target/profile pairs", n_hits);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{TOY_CONSENSUS_CDS, TOY_HMM};

    struct TempFiles {
        paths: Vec<String>,
    }

    impl TempFiles {
        fn new() -> Self {
            Self { paths: Vec::new() }
        }

        fn write(&mut self, name: &str, data: &[u8]) -> String {
            let p = self.path(name);
            std::fs::write(&p, data).unwrap();
            p
        }

        fn path(&mut self, name: &str) -> String {
            let p = std::env::temp_dir()
                .join(format!("iseq-scan-{}-{}", std::process::id(), name))
                .to_string_lossy()
                .into_owned();
            self.paths.push(p.clone());
            p
        }
    }

    impl Drop for TempFiles {
        fn drop(&mut self) {
            for p in &self.paths {
                std::fs::remove_file(p).ok();
            }
        }
    }

    fn rows(path: &str) -> Vec<Vec<String>> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .filter(|l| !l.starts_with('#'))
            .map(|l| l.split('\t').map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn scan_writes_fragments_in_target_order() {
        let mut tmp = TempFiles::new();
        let hmm = tmp.write("a.hmm", TOY_HMM.as_bytes());
        let fa = tmp.write("a.fa", b">t1\nKKKPGKEDNNK\n>t2 second\nPGKEDNNK\n>t3\nPPPPGKEDNNKDDDPGKEDNNKEEEE\n");
        let out = tmp.path("a.tsv");

        let opt = ScanOpt { threads: 2, ..ScanOpt::default() };
        scan_with_opt(&hmm, &fa, Some(&out), opt).unwrap();
        let rows = rows(&out);

        let summary: Vec<(&str, &str, &str, &str, &str)> = rows
            .iter()
            .map(|r| (r[0].as_str(), r[2].as_str(), r[3].as_str(), r[4].as_str(), r[5].as_str()))
            .collect();
        assert_eq!(
            summary,
            [
                ("t1", "0", "1", "3", "false"),
                ("t1", "1", "4", "11", "true"),
                ("t2", "0", "1", "8", "true"),
                ("t3", "0", "1", "3", "false"),
                ("t3", "1", "4", "11", "true"),
                ("t3", "2", "12", "14", "false"),
                ("t3", "3", "15", "22", "true"),
                ("t3", "4", "23", "26", "false"),
            ]
        );
        assert!(rows.iter().all(|r| r[1] == "toy"));
        assert_eq!(rows[1][7], "PGKEDNNK");
        assert_eq!(rows[0][6], rows[1][6]);
    }

    #[test]
    fn uni_hit_and_min_score() {
        let mut tmp = TempFiles::new();
        let hmm = tmp.write("b.hmm", TOY_HMM.as_bytes());
        let fa = tmp.write("b.fa", b">t3\nPPPPGKEDNNKDDDPGKEDNNKEEEE\n>weak\nWWWWWW\n");
        let out = tmp.path("b.tsv");

        let opt = ScanOpt { multiple_hits: false, min_score: Some(0.0), ..ScanOpt::default() };
        scan_with_opt(&hmm, &fa, Some(&out), opt).unwrap();
        let rows = rows(&out);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r[0] == "t3"));
        let homologous: Vec<&str> = rows.iter().map(|r| r[5].as_str()).collect();
        assert_eq!(homologous, ["false", "true", "false"]);
    }

    #[test]
    fn frame_scan_of_coding_sequence() {
        let mut tmp = TempFiles::new();
        let hmm = tmp.write("c.hmm", TOY_HMM.as_bytes());
        let mut fa = b">cds\n".to_vec();
        fa.extend_from_slice(TOY_CONSENSUS_CDS);
        fa.push(b'\n');
        let fa = tmp.write("c.fa", &fa);
        let out = tmp.path("c.tsv");

        let opt = ScanOpt { frame: true, ..ScanOpt::default() };
        scan_with_opt(&hmm, &fa, Some(&out), opt).unwrap();
        let rows = rows(&out);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][3], "1");
        assert_eq!(rows[0][4], "24");
        assert_eq!(rows[0][5], "true");
        assert!(rows[0][6].parse::<f64>().unwrap() > 0.0);
    }

    #[test]
    fn invalid_target_symbol_is_error() {
        let mut tmp = TempFiles::new();
        let hmm = tmp.write("d.hmm", TOY_HMM.as_bytes());
        let fa = tmp.write("d.fa", b">bad\nPGK*EDNNK\n");
        let out = tmp.path("d.tsv");
        let err = scan_with_opt(&hmm, &fa, Some(&out), ScanOpt::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("target 'bad'"));
    }

    #[test]
    fn empty_target_is_skipped() {
        let mut profiles = vec![Profile::standard(&crate::fixtures::toy_params()).unwrap()];
        let rec = FastaRecord { id: "e".to_string(), desc: None, seq: Vec::new() };
        let hits = scan_target(&mut profiles, &rec, None).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn scan_rejects_epsilon_conflicting_with_library() {
        let mut tmp = TempFiles::new();
        let hmm = tmp.write("e.hmm", TOY_HMM.as_bytes());
        let lib_path = tmp.path("e.isq");
        ProfileLibrary::from_hmmer(&hmm, ProfileKind::Frame, 0.02)
            .unwrap()
            .save_to_file(&lib_path)
            .unwrap();
        let mut fa = b">cds\n".to_vec();
        fa.extend_from_slice(TOY_CONSENSUS_CDS);
        let fa = tmp.write("e.fa", &fa);
        let out = tmp.path("e.tsv");

        let conflict = ScanOpt { frame: true, epsilon: Some(0.05), ..ScanOpt::default() };
        assert!(scan_with_opt(&lib_path, &fa, Some(&out), conflict).is_err());

        let pressed = ScanOpt { frame: true, ..ScanOpt::default() };
        scan_with_opt(&lib_path, &fa, Some(&out), pressed).unwrap();
        assert_eq!(rows(&out).len(), 1);
    }
}
