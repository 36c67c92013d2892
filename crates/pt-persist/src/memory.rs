use std::collections::HashMap;
use std::sync::Mutex;

use pt_recorder::HandHistory;
use serde_json::Value;

use crate::adapter::PersistenceAdapter;

/// Implementation-neutral in-memory fallback. Used when no `database`-feature
/// backend is configured, and in tests.
#[derive(Default)]
pub struct InMemoryAdapter {
    hands: Mutex<Vec<HandHistory>>,
    profiles: Mutex<HashMap<String, HashMap<String, Value>>>,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hand_count(&self) -> usize {
        self.hands.lock().expect("hands lock poisoned").len()
    }
}

#[async_trait::async_trait]
impl PersistenceAdapter for InMemoryAdapter {
    async fn save_hand(&self, hand: &HandHistory) -> bool {
        self.hands.lock().expect("hands lock poisoned").push(hand.clone());
        true
    }

    async fn save_hud_profile(&self, name: &str, profile: &HashMap<String, Value>) -> bool {
        self.profiles.lock().expect("profiles lock poisoned").insert(name.to_string(), profile.clone());
        true
    }

    async fn load_hud_profile(&self, name: &str) -> Option<HashMap<String, Value>> {
        self.profiles.lock().expect("profiles lock poisoned").get(name).cloned()
    }

    async fn list_hud_profiles(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.lock().expect("profiles lock poisoned").keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hud_profile_round_trips() {
        let adapter = InMemoryAdapter::new();
        let mut profile = HashMap::new();
        profile.insert("vpip".to_string(), Value::from(24.5));
        assert!(adapter.save_hud_profile("villain1", &profile).await);
        let loaded = adapter.load_hud_profile("villain1").await.unwrap();
        assert_eq!(loaded, profile);
    }

    #[tokio::test]
    async fn unknown_profile_is_none() {
        let adapter = InMemoryAdapter::new();
        assert!(adapter.load_hud_profile("nobody").await.is_none());
    }

    #[tokio::test]
    async fn list_profiles_is_sorted() {
        let adapter = InMemoryAdapter::new();
        adapter.save_hud_profile("zeta", &HashMap::new()).await;
        adapter.save_hud_profile("alpha", &HashMap::new()).await;
        assert_eq!(adapter.list_hud_profiles().await, vec!["alpha".to_string(), "zeta".to_string()]);
    }
}
