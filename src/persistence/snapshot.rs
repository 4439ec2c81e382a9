use super::kv::KeyValueStore;
use crate::store::StoreState;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Namespace key the whole store is persisted under
pub const STORE_KEY: &str = "task-store";

/// Current document version
pub const STORE_VERSION: u32 = 0;

/// The persisted document: the store state plus a version tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedDocument {
    pub state: StoreState,
    #[serde(default)]
    pub version: u32,
}

/// Load the store state; None when nothing was persisted yet
pub fn load_state(kv: &dyn KeyValueStore) -> Result<Option<StoreState>> {
    let Some(content) = kv.get(STORE_KEY)? else {
        return Ok(None);
    };

    if content.trim().is_empty() {
        return Ok(None);
    }

    let document: PersistedDocument = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse persisted document under '{}'", STORE_KEY))?;
    Ok(Some(document.state))
}

/// Save the whole store state as one JSON document
pub fn save_state(kv: &dyn KeyValueStore, state: &StoreState) -> Result<()> {
    let document = PersistedDocument {
        state: state.clone(),
        version: STORE_VERSION,
    };
    let json = serde_json::to_string_pretty(&document)?;
    kv.set(STORE_KEY, &json)
}
