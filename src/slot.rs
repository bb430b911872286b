use crate::{
    chips::ChipStack,
    error::BoardError,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    num::NonZeroU64,
    str::FromStr,
};

/// Stable identifier of a slot. Views and clicks address slots through it,
/// never through their position in a filtered list.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct SlotId(pub u8);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A chip denomination. Always positive.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u64", into = "u64")]
pub struct ChipValue(NonZeroU64);

impl ChipValue {
    pub fn new(value: u64) -> Result<Self, BoardError> {
        NonZeroU64::new(value)
            .map(ChipValue)
            .ok_or(BoardError::InvalidChip)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<u64> for ChipValue {
    type Error = BoardError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        ChipValue::new(value)
    }
}

impl From<ChipValue> for u64 {
    fn from(chip: ChipValue) -> Self {
        chip.get()
    }
}

impl FromStr for ChipValue {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<u64>().map_err(|_| BoardError::InvalidChip)?;
        ChipValue::new(value)
    }
}

impl fmt::Display for ChipValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SlotColor {
    Purple,
    Gray,
    Green,
}

impl SlotColor {
    pub fn hex(self) -> &'static str {
        match self {
            SlotColor::Purple => "#561589",
            SlotColor::Gray => "#2B2A2A",
            SlotColor::Green => "#0E7A3A",
        }
    }

    /// RGB triple of [`SlotColor::hex`].
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            SlotColor::Purple => (0x56, 0x15, 0x89),
            SlotColor::Gray => (0x2B, 0x2A, 0x2A),
            SlotColor::Green => (0x0E, 0x7A, 0x3A),
        }
    }
}

/// Only `Board` slots accumulate chips in the board view; `Outside` slots
/// stay in the board sequence but are presented separately.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Board,
    Outside,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub label: String,
    pub color: SlotColor,
    pub kind: SlotKind,
    #[serde(default)]
    pub coins: ChipStack,
}

impl Slot {
    pub fn new(
        id: SlotId,
        label: impl Into<String>,
        color: SlotColor,
        kind: SlotKind,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            color,
            kind,
            coins: ChipStack::default(),
        }
    }

    pub(crate) fn with_coins(&self, coins: ChipStack) -> Self {
        Self {
            coins,
            ..self.clone()
        }
    }
}

pub fn is_board_slot(slot: &Slot) -> bool {
    slot.kind == SlotKind::Board
}
