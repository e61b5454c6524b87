//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nesting, e.g. `APP_RAG__CHUNK_SIZE`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Self::defaults().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self::from_figment(figment);
        config.rag()?;
        Ok(config)
    }

    /// Built-in defaults only. Merge other providers on top of this.
    pub fn defaults() -> Figment {
        Figment::from(Serialized::default("rag", RagConfig::default()))
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// The `[rag]` section with paths expanded and values validated.
    pub fn rag(&self) -> Result<RagConfig> {
        let mut rag: RagConfig = self.get("rag")?;
        rag.expand_paths();
        rag.validate()?;
        Ok(rag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub textbooks_dir: PathBuf,
    pub index_dir: PathBuf,
    pub chunk_dir: PathBuf,
    pub model_name: String,
    pub models_dir: PathBuf,
    /// Target chunk length in characters.
    pub chunk_size: usize,
    /// Characters carried over from the tail of one chunk into the next.
    pub chunk_overlap: usize,
    pub batch_size: usize,
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            textbooks_dir: PathBuf::from("textbooks"),
            index_dir: PathBuf::from("corpus/textbooks/index/simple_rag"),
            chunk_dir: PathBuf::from("corpus/textbooks/chunk"),
            model_name: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            models_dir: PathBuf::from("models"),
            chunk_size: 512,
            chunk_overlap: 128,
            batch_size: 32,
            top_k: 5,
        }
    }
}

impl RagConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be greater than 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be greater than 0".into()));
        }
        if self.model_name.trim().is_empty() {
            return Err(Error::InvalidConfig("model_name must not be empty".into()));
        }
        Ok(())
    }

    /// Resolve every relative directory against `base`.
    #[must_use]
    pub fn with_base(mut self, base: &Path) -> Self {
        for dir in [
            &mut self.textbooks_dir,
            &mut self.index_dir,
            &mut self.chunk_dir,
            &mut self.models_dir,
        ] {
            let resolved = resolve_with_base(base, dir.to_string_lossy());
            *dir = resolved;
        }
        self
    }

    fn expand_paths(&mut self) {
        for dir in [
            &mut self.textbooks_dir,
            &mut self.index_dir,
            &mut self.chunk_dir,
            &mut self.models_dir,
        ] {
            let expanded = expand_path(dir.to_string_lossy());
            *dir = expanded;
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
