//! Pot / Card / Player Recognisers (C4): thin typed layers over the ensemble
//! voter applying slot-specific validation — currency parsing and temporal
//! consensus for pots, an emit threshold for cards, and name filtering for
//! players.
#![allow(dead_code)]

mod card;
mod currency;
mod player;
mod pot;

pub use card::{recognise_card, CARD_EMIT_THRESHOLD};
pub use currency::Currency;
pub use player::{filter_player_name, parse_stack};
pub use pot::{parse_amount, PotDetection, PotRecogniser};
