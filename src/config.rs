use std::env;
use std::path::PathBuf;

use crate::client::DEFAULT_BASE_URL;
use crate::store::DEFAULT_STORAGE_KEY;

const DEFAULT_STORAGE_DIR: &str = ".cep-form";
const DEFAULT_PORT: u16 = 3000;

/// Runtime settings shared by the CLI and the server.
///
/// | Variable | Default |
/// |----------|---------|
/// | `CEP_FORM_STORAGE_DIR` | `./.cep-form` |
/// | `CEP_FORM_STORAGE_KEY` | `form-cep-autosave-v1` |
/// | `VIACEP_BASE_URL` | `https://viacep.com.br` |
/// | `PORT` | `3000` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub storage_dir: PathBuf,
    pub storage_key: String,
    pub lookup_base_url: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            lookup_base_url: DEFAULT_BASE_URL.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            storage_dir: var("CEP_FORM_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            storage_key: var("CEP_FORM_STORAGE_KEY").unwrap_or(defaults.storage_key),
            lookup_base_url: var("VIACEP_BASE_URL").unwrap_or(defaults.lookup_base_url),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
        }
    }
}
