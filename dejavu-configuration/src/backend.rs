use std::sync::Arc;

use dejavu::DEFAULT_MAX_ENTRIES;
use dejavu_backend::Backend as BackendTrait;
use dejavu_moka::MokaBackend;
use serde::{Deserialize, Serialize};

/// In-memory Moka store settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Moka {
    /// Maximum number of fingerprints kept at once.
    pub max_capacity: u64,
    /// Optional label for this backend (used in metrics/tracing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Fingerprint store selection.
///
/// ```yaml
/// backend:
///   type: Moka
///   max_capacity: 10000
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Backend {
    /// In-process store, the default.
    Moka(Moka),
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Moka(Moka {
            max_capacity: DEFAULT_MAX_ENTRIES,
            label: None,
        })
    }
}

impl Backend {
    /// Builds the configured store.
    pub fn into_backend(self) -> Arc<dyn BackendTrait + Send + 'static> {
        match self {
            Backend::Moka(config) => {
                let mut builder = MokaBackend::builder().max_entries(config.max_capacity);
                if let Some(label) = config.label {
                    builder = builder.label(label);
                }
                Arc::new(builder.build())
            }
        }
    }
}
