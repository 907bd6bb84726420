use anyhow::{anyhow, bail, Result};
use std::io::Write;

use serde::{Deserialize, Serialize};

use super::profile::{Profile, ProfileKind};
use crate::io::hmmer;

/// 压制后的 profile 库文件扩展名
pub const LIBRARY_EXT: &str = "isq";

/// frame profile 默认的插入/删除概率
pub const DEFAULT_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryMeta {
    pub source_file: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
}

/// 预先构建好的一组 profile，可直接用 bincode 存取
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileLibrary {
    pub meta: LibraryMeta,
    pub kind: ProfileKind,
    /// frame 库构建时使用的 ε
    pub epsilon: Option<f64>,
    pub profiles: Vec<Profile>,
}

impl ProfileLibrary {
    pub fn new(kind: ProfileKind, profiles: Vec<Profile>) -> Self {
        Self { meta: LibraryMeta::default(), kind, epsilon: None, profiles }
    }

    /// 从 HMMER3 文本构建；frame 库使用给定的 ε
    pub fn from_hmmer(path: &str, kind: ProfileKind, epsilon: f64) -> Result<Self> {
        let models = hmmer::read_models(path)?;
        if models.is_empty() {
            bail!("HMM file '{}' contains no profiles", path);
        }
        let profiles = models
            .iter()
            .map(|m| match kind {
                ProfileKind::Standard => Profile::standard_from_hmmer(m),
                ProfileKind::Frame => Profile::frame_from_hmmer(m, epsilon),
            })
            .collect::<Result<Vec<_>>>()?;
        log::info!("built {} {:?} profiles from '{}'", profiles.len(), kind, path);
        let mut lib = Self::new(kind, profiles);
        if kind == ProfileKind::Frame {
            lib.epsilon = Some(epsilon);
        }
        Ok(lib)
    }

    pub fn set_meta(&mut self, meta: LibraryMeta) {
        self.meta = meta;
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let f = std::fs::File::create(path)?;
        let mut w = std::io::BufWriter::new(f);
        bincode::serialize_into(&mut w, self)?;
        w.flush()?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let f = std::fs::File::open(path).map_err(|e| anyhow!("cannot open profile library '{}': {}", path, e))?;
        let lib: Self = bincode::deserialize_from(std::io::BufReader::new(f))
            .map_err(|e| anyhow!("'{}' is not a valid profile library: {}", path, e))?;
        Ok(lib)
    }

    /// `.isq` 按库加载，其余按 HMMER3 文本解析。
    ///
    /// 未给出 ε 时文本使用 [`DEFAULT_EPSILON`]、库沿用压制时的值；
    /// 给出的 ε 与 frame 库中的不一致时报错。
    pub fn open(path: &str, kind: ProfileKind, epsilon: Option<f64>) -> Result<Self> {
        let is_library = std::path::Path::new(path)
            .extension()
            .is_some_and(|ext| ext == LIBRARY_EXT);
        if !is_library {
            return Self::from_hmmer(path, kind, epsilon.unwrap_or(DEFAULT_EPSILON));
        }
        let lib = Self::load_from_file(path)?;
        if lib.kind != kind {
            bail!(
                "profile library '{}' was pressed as {:?}, requested {:?}",
                path,
                lib.kind,
                kind
            );
        }
        if let (ProfileKind::Frame, Some(eps)) = (kind, epsilon) {
            if lib.epsilon != Some(eps) {
                bail!(
                    "profile library '{}' was pressed with epsilon {:?}, requested {}",
                    path,
                    lib.epsilon,
                    eps
                );
            }
        }
        log::info!(
            "loaded {} profiles from '{}' (built {})",
            lib.len(),
            path,
            lib.meta.build_timestamp.as_deref().unwrap_or("-")
        );
        Ok(lib)
    }
}
