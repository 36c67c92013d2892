use pt_core::{ActionKind, Card, Stage};

/// A seat's participation summary for one completed hand.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlayerSummary {
    pub seat: u8,
    pub name: Option<String>,
    pub starting_stack: f64,
    pub ending_stack: f64,
    pub position: Option<String>,
    pub is_hero: bool,
    pub cards: Vec<Card>,
    pub won_amount: f64,
}

/// One derived action within a completed hand.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RecordedAction {
    pub seat: u8,
    pub kind: ActionKind,
    pub amount: f64,
    pub stage: Stage,
    pub t: u64,
}

/// Hero's outcome relative to the pot at showdown or fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HeroResult {
    Won,
    Lost,
    Pushed,
    Unknown,
}

/// Terminal record of one completed hand.
///
/// Invariant: `sum(ending_stack - starting_stack)` across `players` is
/// approximately zero, modulo rake.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HandHistory {
    pub hand_id: u64,
    pub start_t: u64,
    pub site: String,
    pub table: String,
    pub small_blind: f64,
    pub big_blind: f64,
    pub hero_name: Option<String>,
    pub hero_cards: Vec<Card>,
    pub board_cards: Vec<Card>,
    pub players: Vec<PlayerSummary>,
    pub actions: Vec<RecordedAction>,
    pub pot_size: f64,
    pub winners: Vec<u8>,
    pub hero_result: HeroResult,
    pub hero_net: f64,
    pub final_stage: Stage,
    pub duration_s: f64,
}
