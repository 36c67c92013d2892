use std::collections::HashMap;

use pt_recorder::HandHistory;
use serde_json::Value;

/// `save_hand`/`save_hud_profile`/`load_hud_profile`/`list_hud_profiles`
///. Implementation neutral: a local embedded store or a remote
/// service are both valid behind this trait.
#[async_trait::async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn save_hand(&self, hand: &HandHistory) -> bool;
    async fn save_hud_profile(&self, name: &str, profile: &HashMap<String, Value>) -> bool;
    async fn load_hud_profile(&self, name: &str) -> Option<HashMap<String, Value>>;
    async fn list_hud_profiles(&self) -> Vec<String>;
}
