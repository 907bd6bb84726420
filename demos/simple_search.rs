//! 演示如何在 library 模式下使用 iseq 做 profile 搜索。
//!
//! 运行方式：
//! ```bash
//! cargo run --example simple_search
//! ```

use iseq::model::Transitions;
use iseq::search::{NodeParams, Profile, ProfileParams};
use iseq::util::alphabet::Alphabet;

/// 共识序列上 0.8，其余均分
fn build_params(consensus: &[u8]) -> ProfileParams {
    let alphabet = Alphabet::amino();
    let k = alphabet.len();
    let other = (0.2 / (k - 1) as f64).ln();
    let trans = Transitions {
        mm: 0.9f64.ln(),
        mi: 0.05f64.ln(),
        md: 0.05f64.ln(),
        im: 0.6f64.ln(),
        ii: 0.4f64.ln(),
        dm: 0.7f64.ln(),
        dd: 0.3f64.ln(),
    };
    let nodes = consensus
        .iter()
        .map(|&c| NodeParams {
            match_lprobs: alphabet
                .symbols()
                .iter()
                .map(|&a| if a == c { 0.8f64.ln() } else { other })
                .collect(),
            insert_lprobs: vec![0.05f64.ln(); k],
            trans,
        })
        .collect();
    ProfileParams {
        name: "demo".to_string(),
        accession: None,
        description: None,
        insert0: vec![0.05f64.ln(); k],
        alphabet,
        nodes,
    }
}

fn main() -> anyhow::Result<()> {
    // 1. 构建 profile
    let params = build_params(b"PGKEDNNK");
    let mut profile = Profile::standard(&params)?;
    println!("profile '{}'：{} 个节点", profile.name(), profile.core_length());

    // 2. 多次命中解码
    let target = b"PPPPGKEDNNKDDDPGKEDNNKEEEE";
    let seq = profile.sequence(target)?;
    let result = profile.search(&seq);
    println!("\n多次命中: score={:.4}", result.loglikelihood());
    for (frag, iv) in result.fragments().iter().zip(result.intervals()) {
        println!("  {} {} 同源={}", iv, frag, frag.homologous());
    }

    // 3. 单次命中
    profile.set_multiple_hits(false);
    let result = profile.search(&seq);
    println!("\n单次命中: score={:.4}", result.loglikelihood());
    println!("  {}", result);

    // 4. frame 模型：直接在 CDS 上解码
    let mut frame = Profile::frame(&params, 0.01)?;
    let cds = frame.sequence(b"ATGCCGGGCAAAGAAGATAACAATAAATGA")?;
    let result = frame.search(&cds);
    println!("\nframe: score={:.4}", result.loglikelihood());
    for frag in result.fragments().iter().filter(|f| f.homologous()) {
        let steps: Vec<String> = frag.items().map(|(s, step)| format!("{}{}", step, String::from_utf8_lossy(s))).collect();
        println!("  {}", steps.join(" "));
    }

    println!("\n完成！");
    Ok(())
}
