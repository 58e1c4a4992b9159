use crate::lyrics::urls::Sources;
use crate::lyrics::{FinderConfig, HttpFetcher, HttpSettings};
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod defaults;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub http: HttpConfig,
    pub search: SearchConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Hyphen-slug lyrics site
    pub lyrics_base_url: String,
    pub lyrics_host: String,
    /// Site with the `/lyrics/{artist}/{title}.html` layout
    pub mirror_base_url: String,
    /// `{query}` is replaced by the URL-encoded search phrase.
    pub search_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Timeout for guessed lyrics URLs; 0 uses `timeout_secs`.
    pub direct_timeout_secs: u64,
    pub user_agent: String,
    /// Sent as `Referer` on every request; empty disables it.
    pub referrer: String,
    pub accept_language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search page attempts when the network fails
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// Best-scored candidates fetched per search
    pub top_candidates: usize,
    pub max_links: usize,
    pub ancestor_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Lookups running at once in `batch`
    pub max_concurrent: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        let s = Sources::default();
        Self {
            lyrics_base_url: s.lyrics_base_url,
            lyrics_host: s.lyrics_host,
            mirror_base_url: s.mirror_base_url,
            search_url: s.search_url,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            direct_timeout_secs: 8,
            user_agent: HttpFetcher::USER_AGENT.to_string(),
            referrer: "https://www.google.com/".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            retry_delay_ms: 2000,
            top_candidates: 3,
            max_links: 10,
            ancestor_depth: 5,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { max_concurrent: 3 }
    }
}

impl Config {
    pub fn finder_config(&self) -> FinderConfig {
        let referrer = self.http.referrer.trim();
        FinderConfig {
            sources: Sources {
                lyrics_base_url: self.sources.lyrics_base_url.clone(),
                lyrics_host: self.sources.lyrics_host.clone(),
                mirror_base_url: self.sources.mirror_base_url.clone(),
                search_url: self.sources.search_url.clone(),
            },
            referrer: (!referrer.is_empty()).then(|| referrer.to_string()),
            direct_timeout: (self.http.direct_timeout_secs > 0)
                .then(|| Duration::from_secs(self.http.direct_timeout_secs)),
            max_search_attempts: self.search.max_attempts.max(1),
            retry_delay: Duration::from_millis(self.search.retry_delay_ms),
            top_candidates: self.search.top_candidates,
            max_links: self.search.max_links,
            ancestor_depth: self.search.ancestor_depth,
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.http.timeout_secs.max(1)),
            user_agent: self.http.user_agent.clone(),
            accept_language: self.http.accept_language.clone(),
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj =
        ProjectDirs::from("dev", "lyricseek", "lyricseek").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Load the config, writing the defaults on first run.
pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = defaults::defaults();
        write_config(&path, &cfg)?;
        tracing::debug!(path = %path.display(), "wrote default config");
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

fn write_config(path: &Path, cfg: &Config) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}
