use serde::{Deserialize, Serialize};

/// The eight card faces. Every round deals each of them exactly twice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    Apple,
    Orange,
    Lemon,
    Grapes,
    Cat,
    Blossom,
    Note,
    Star,
}

impl Symbol {
    pub const ALL: [Symbol; 8] = [
        Symbol::Apple,
        Symbol::Orange,
        Symbol::Lemon,
        Symbol::Grapes,
        Symbol::Cat,
        Symbol::Blossom,
        Symbol::Note,
        Symbol::Star,
    ];

    pub fn emoji(self) -> &'static str {
        match self {
            Symbol::Apple => "🍎",
            Symbol::Orange => "🍊",
            Symbol::Lemon => "🍋",
            Symbol::Grapes => "🍇",
            Symbol::Cat => "🐱",
            Symbol::Blossom => "🌸",
            Symbol::Note => "🎵",
            Symbol::Star => "⭐",
        }
    }

    pub fn from_emoji(value: &str) -> Option<Self> {
        Symbol::ALL.into_iter().find(|symbol| symbol.emoji() == value.trim())
    }
}

/// Number of pairs on the board.
pub const TOTAL_PAIRS: u32 = Symbol::ALL.len() as u32;

/// Number of cards on the board.
pub const DECK_SIZE: usize = Symbol::ALL.len() * 2;

pub const GRID_COLUMNS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CardState {
    #[default]
    FaceDown,
    FaceUp,
    Matched,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub symbol: Symbol,
    pub position: usize,
    pub state: CardState,
}

impl Card {
    pub fn new(symbol: Symbol, position: usize) -> Self {
        Card {
            symbol,
            position,
            state: CardState::FaceDown,
        }
    }

    pub fn row(&self) -> usize {
        self.position / GRID_COLUMNS
    }

    pub fn column(&self) -> usize {
        self.position % GRID_COLUMNS
    }

    /// Label for assistive technology: the face is only announced once matched.
    pub fn accessible_label(&self) -> String {
        match self.state {
            CardState::Matched => format!("Matched: {}", self.symbol.emoji()),
            _ => format!("Card {}", self.position + 1),
        }
    }
}

/// Fewest moves any finished round has taken, with that round's time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestScore {
    pub moves: u32,
    #[serde(rename = "time")]
    pub time_seconds: u32,
}

impl BestScore {
    pub fn is_beaten_by(&self, moves: u32) -> bool {
        moves < self.moves
    }
}

/// Where the current turn stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Turn {
    #[default]
    Idle,
    /// One card is face up, waiting for its partner.
    OneUp(usize),
    /// Two cards are face up and the board is locked until they resolve.
    Evaluating { first: usize, second: usize },
}

#[derive(Clone, Debug, Default)]
pub struct Round {
    pub(crate) cards: Vec<Card>,
    pub(crate) turn: Turn,
    pub(crate) move_count: u32,
    pub(crate) matched_pairs: u32,
    pub(crate) elapsed_seconds: u32,
    pub(crate) active: bool,
    pub(crate) generation: u64,
}

impl Round {
    /// A round that has not been started; every selection is ignored.
    pub fn idle() -> Self {
        Round::default()
    }

    pub fn new(cards: Vec<Card>, generation: u64) -> Self {
        Round {
            cards,
            turn: Turn::Idle,
            move_count: 0,
            matched_pairs: 0,
            elapsed_seconds: 0,
            active: true,
            generation,
        }
    }

    /// Deal `symbols` face down in order. Handy for fixed layouts.
    pub fn from_symbols(symbols: &[Symbol], generation: u64) -> Self {
        let cards = symbols
            .iter()
            .enumerate()
            .map(|(position, &symbol)| Card::new(symbol, position))
            .collect();
        Round::new(cards, generation)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, position: usize) -> Option<&Card> {
        self.cards.get(position)
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn pending_first(&self) -> Option<usize> {
        match self.turn {
            Turn::Idle => None,
            Turn::OneUp(first) | Turn::Evaluating { first, .. } => Some(first),
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.turn, Turn::Evaluating { .. })
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn matched_pairs(&self) -> u32 {
        self.matched_pairs
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_won(&self) -> bool {
        self.matched_pairs == TOTAL_PAIRS
    }

    pub fn face_up_count(&self) -> usize {
        self.count_in(CardState::FaceUp)
    }

    pub fn count_in(&self, state: CardState) -> usize {
        self.cards.iter().filter(|card| card.state == state).count()
    }

    /// Position of the other card carrying the same symbol.
    pub fn partner_of(&self, position: usize) -> Option<usize> {
        let symbol = self.cards.get(position)?.symbol;
        self.cards
            .iter()
            .find(|card| card.symbol == symbol && card.position != position)
            .map(|card| card.position)
    }
}
