use crate::slot::ChipValue;
use serde::{
    Deserialize,
    Serialize,
};
use std::iter;

/// Number of most recent chips a slot keeps.
pub const MAX_VISIBLE_CHIPS: usize = 5;

/// Chips placed on one slot, oldest first. Never longer than
/// [`MAX_VISIBLE_CHIPS`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ChipValue>", into = "Vec<ChipValue>")]
pub struct ChipStack(Vec<ChipValue>);

impl ChipStack {
    pub fn as_slice(&self) -> &[ChipValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChipValue> {
        self.0.iter()
    }

    pub fn total(&self) -> u64 {
        self.0
            .iter()
            .fold(0u64, |acc, chip| acc.saturating_add(chip.get()))
    }
}

impl From<Vec<ChipValue>> for ChipStack {
    fn from(mut chips: Vec<ChipValue>) -> Self {
        let overflow = chips.len().saturating_sub(MAX_VISIBLE_CHIPS);
        chips.drain(..overflow);
        ChipStack(chips)
    }
}

impl From<ChipStack> for Vec<ChipValue> {
    fn from(stack: ChipStack) -> Self {
        stack.0
    }
}

/// Returns `existing` with `chip` appended, keeping only the newest
/// [`MAX_VISIBLE_CHIPS`] entries.
pub fn append_chip(existing: &ChipStack, chip: ChipValue) -> ChipStack {
    let overflow = (existing.len() + 1).saturating_sub(MAX_VISIBLE_CHIPS);
    let chips = existing
        .iter()
        .copied()
        .chain(iter::once(chip))
        .skip(overflow)
        .collect();
    ChipStack(chips)
}

pub fn clear_chips() -> ChipStack {
    ChipStack::default()
}
