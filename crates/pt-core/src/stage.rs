/// Betting street, implied by the number of board cards (GLOSSARY
/// "Street").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Stage {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Stage {
    /// Maps a board-card count to its street. `Showdown` is never derived from count alone —
    /// callers set it explicitly once a hand resolves.
    pub fn from_board_len(len: usize) -> Option<Stage> {
        match len {
            0 => Some(Stage::Preflop),
            3 => Some(Stage::Flop),
            4 => Some(Stage::Turn),
            5 => Some(Stage::River),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Preflop => "preflop",
            Stage::Flop => "flop",
            Stage::Turn => "turn",
            Stage::River => "river",
            Stage::Showdown => "showdown",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_board_length_to_street() {
        assert_eq!(Stage::from_board_len(0), Some(Stage::Preflop));
        assert_eq!(Stage::from_board_len(3), Some(Stage::Flop));
        assert_eq!(Stage::from_board_len(4), Some(Stage::Turn));
        assert_eq!(Stage::from_board_len(5), Some(Stage::River));
        assert_eq!(Stage::from_board_len(2), None);
    }
}
