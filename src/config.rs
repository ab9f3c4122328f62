use clap::Args;
use std::path::PathBuf;

/// Mirrors of the extension index, tried in order.
pub const INDEX_URLS: &[&str] = &[
    "https://raw.githubusercontent.com/keiyoushi/extensions/repo/index.min.json",
    "https://raw.githubusercontent.com/keiyoushi/extensions/repo/index.json",
    "https://raw.githubusercontent.com/keiyoushi/extensions/refs/heads/repo/index.json",
];

pub const DEFAULT_CACHE_DIR: &str = ".cache";
pub const DEFAULT_USER_AGENT: &str = "templates-generator/1.0";
const TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: usize = 3;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub outdir: PathBuf,
    pub cache_dir: PathBuf,
    pub verbose: bool,
    pub index_urls: Vec<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            outdir: PathBuf::from("."),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            verbose: false,
            index_urls: INDEX_URLS.iter().map(|s| s.to_string()).collect(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: TIMEOUT_SECS,
            max_retries: MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Directory to write output files
    #[arg(long, env = "TEMPLATES_OUTDIR", default_value = ".")]
    pub outdir: PathBuf,

    /// Cache directory for ETags and version state
    #[arg(long, env = "TEMPLATES_CACHE_DIR", default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// Log every skipped entry
    #[arg(long)]
    pub verbose: bool,

    /// Override the index mirrors (repeatable)
    #[arg(long = "index-url")]
    pub index_urls: Vec<String>,

    #[arg(long, default_value_t = TIMEOUT_SECS)]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = MAX_RETRIES)]
    pub max_retries: usize,
}

impl Default for GenerateArgs {
    fn default() -> Self {
        let cfg = GeneratorConfig::default();
        GenerateArgs {
            outdir: cfg.outdir,
            cache_dir: cfg.cache_dir,
            verbose: cfg.verbose,
            index_urls: Vec::new(),
            timeout_secs: cfg.timeout_secs,
            max_retries: cfg.max_retries,
        }
    }
}

impl From<GenerateArgs> for GeneratorConfig {
    fn from(args: GenerateArgs) -> Self {
        let mut cfg = GeneratorConfig {
            outdir: args.outdir,
            cache_dir: args.cache_dir,
            verbose: args.verbose,
            timeout_secs: args.timeout_secs,
            max_retries: args.max_retries,
            ..GeneratorConfig::default()
        };
        if !args.index_urls.is_empty() {
            cfg.index_urls = args.index_urls;
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_all_mirrors() {
        let cfg = GeneratorConfig::from(GenerateArgs::default());
        assert_eq!(cfg.index_urls.len(), INDEX_URLS.len());
        assert_eq!(cfg.cache_dir, PathBuf::from(".cache"));
        assert_eq!(cfg.timeout_secs, 30);
    }

    #[test]
    fn explicit_index_urls_replace_mirrors() {
        let args = GenerateArgs {
            index_urls: vec!["http://localhost/index.json".into()],
            ..GenerateArgs::default()
        };
        let cfg = GeneratorConfig::from(args);
        assert_eq!(cfg.index_urls, vec!["http://localhost/index.json".to_string()]);
    }
}
