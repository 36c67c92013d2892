use std::collections::HashMap;
use std::sync::Arc;

use pt_recorder::HandHistory;
use serde_json::Value;
use tokio_postgres::Client;

use crate::adapter::PersistenceAdapter;

const CREATE_HANDS: &str = "CREATE TABLE IF NOT EXISTS hands (hand_id BIGINT PRIMARY KEY, recorded_at TIMESTAMPTZ NOT NULL DEFAULT now(), payload JSONB NOT NULL)";
const CREATE_PROFILES: &str = "CREATE TABLE IF NOT EXISTS hud_profiles (name TEXT PRIMARY KEY, payload JSONB NOT NULL)";

/// PostgreSQL-backed adapter, grounded on the teacher's `db()`
/// connect-from-env idiom: one `Arc<Client>` shared across async tasks,
/// schema ensured on construction.
pub struct PostgresAdapter {
    client: Arc<Client>,
}

impl PostgresAdapter {
    /// Connects using the `PT_DATABASE_URL` environment variable and
    /// ensures the `hands`/`hud_profiles` tables exist.
    pub async fn connect() -> Result<Self, tokio_postgres::Error> {
        let url = std::env::var("PT_DATABASE_URL").expect("PT_DATABASE_URL must be set");
        let (client, connection) = tokio_postgres::connect(&url, tokio_postgres::tls::NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("persistence connection error: {e}");
            }
        });
        let adapter = Self { client: Arc::new(client) };
        adapter.ensure_schema().await?;
        Ok(adapter)
    }

    async fn ensure_schema(&self) -> Result<(), tokio_postgres::Error> {
        self.client.batch_execute(CREATE_HANDS).await?;
        self.client.batch_execute(CREATE_PROFILES).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PersistenceAdapter for PostgresAdapter {
    async fn save_hand(&self, hand: &HandHistory) -> bool {
        let payload = match serde_json::to_value(hand) {
            Ok(v) => v,
            Err(e) => {
                log::error!("failed to serialise hand {}: {e}", hand.hand_id);
                return false;
            }
        };
        let result = self
            .client
            .execute(
                "INSERT INTO hands (hand_id, payload) VALUES ($1, $2) ON CONFLICT (hand_id) DO UPDATE SET payload = EXCLUDED.payload",
                &[&(hand.hand_id as i64), &payload],
            )
            .await;
        if let Err(e) = &result {
            log::error!("failed to save hand {}: {e}", hand.hand_id);
        }
        result.is_ok()
    }

    async fn save_hud_profile(&self, name: &str, profile: &HashMap<String, Value>) -> bool {
        let payload = match serde_json::to_value(profile) {
            Ok(v) => v,
            Err(e) => {
                log::error!("failed to serialise HUD profile {name}: {e}");
                return false;
            }
        };
        let result = self
            .client
            .execute(
                "INSERT INTO hud_profiles (name, payload) VALUES ($1, $2) ON CONFLICT (name) DO UPDATE SET payload = EXCLUDED.payload",
                &[&name, &payload],
            )
            .await;
        if let Err(e) = &result {
            log::error!("failed to save HUD profile {name}: {e}");
        }
        result.is_ok()
    }

    async fn load_hud_profile(&self, name: &str) -> Option<HashMap<String, Value>> {
        let row = self.client.query_opt("SELECT payload FROM hud_profiles WHERE name = $1", &[&name]).await.ok()??;
        let payload: Value = row.get("payload");
        serde_json::from_value(payload).ok()
    }

    async fn list_hud_profiles(&self) -> Vec<String> {
        match self.client.query("SELECT name FROM hud_profiles ORDER BY name", &[]).await {
            Ok(rows) => rows.iter().map(|row| row.get("name")).collect(),
            Err(e) => {
                log::error!("failed to list HUD profiles: {e}");
                Vec::new()
            }
        }
    }
}
