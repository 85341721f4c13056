use midly::num::u7;
use serde::{Deserialize, Serialize};

/// Scores at or above this value are assigned to the left hand.
pub const LEFT_THRESHOLD: f64 = 0.5;

/// The performer hand a note is played with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    Right,
    Left,
}

impl Hand {
    /// Map a classifier score onto a hand. Callers are expected to reject
    /// non-finite scores first; NaN compares false and would land on `Left`.
    pub fn from_score(score: f64) -> Self {
        if score < LEFT_THRESHOLD {
            Self::Right
        } else {
            Self::Left
        }
    }

    /// MIDI channel used to tag notes played by this hand.
    pub fn channel(&self) -> u8 {
        match self {
            Self::Right => 0,
            Self::Left => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Left => "left",
        }
    }
}

impl std::fmt::Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pitches currently sounding on each hand within one track.
///
/// One 128-bit set per hand, indexed by MIDI key. A pitch is never held by
/// both hands at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveNotes {
    right: u128,
    left: u128,
}

impl ActiveNotes {
    pub fn new() -> Self {
        Self::default()
    }

    fn bit(key: u7) -> u128 {
        1u128 << key.as_int()
    }

    fn set(&self, hand: Hand) -> u128 {
        match hand {
            Hand::Right => self.right,
            Hand::Left => self.left,
        }
    }

    fn set_mut(&mut self, hand: Hand) -> &mut u128 {
        match hand {
            Hand::Right => &mut self.right,
            Hand::Left => &mut self.left,
        }
    }

    pub fn contains(&self, hand: Hand, key: u7) -> bool {
        self.set(hand) & Self::bit(key) != 0
    }

    /// Which hand holds `key`, checking the right hand first.
    pub fn hand_of(&self, key: u7) -> Option<Hand> {
        [Hand::Right, Hand::Left]
            .into_iter()
            .find(|&hand| self.contains(hand, key))
    }

    /// Give `key` to `hand`, taking it away from the other hand if needed.
    ///
    /// Returns the hand that held the pitch before, if it was already sounding.
    pub fn claim(&mut self, key: u7, hand: Hand) -> Option<Hand> {
        let previous = self.hand_of(key);
        let bit = Self::bit(key);
        self.right &= !bit;
        self.left &= !bit;
        *self.set_mut(hand) |= bit;
        previous
    }

    /// Release `key` from whichever hand holds it (right hand first).
    ///
    /// Returns `None` and leaves the state untouched when no hand holds it.
    pub fn release(&mut self, key: u7) -> Option<Hand> {
        let hand = self.hand_of(key)?;
        *self.set_mut(hand) &= !Self::bit(key);
        Some(hand)
    }

    pub fn len(&self, hand: Hand) -> usize {
        self.set(hand).count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.right == 0 && self.left == 0
    }

    pub fn is_disjoint(&self) -> bool {
        self.right & self.left == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn threshold_boundary() {
        assert_eq!(Hand::from_score(0.0), Hand::Right);
        assert_eq!(Hand::from_score(0.499_999), Hand::Right);
        assert_eq!(Hand::from_score(0.5), Hand::Left);
        assert_eq!(Hand::from_score(3.0), Hand::Left);
        assert_eq!(Hand::from_score(-1.0), Hand::Right);
    }

    #[test]
    fn channels() {
        assert_eq!(Hand::Right.channel(), 0);
        assert_eq!(Hand::Left.channel(), 1);
    }

    #[test]
    fn claim_and_release() {
        let mut active = ActiveNotes::new();
        assert_eq!(active.claim(u7::new(60), Hand::Right), None);
        assert_eq!(active.claim(u7::new(48), Hand::Left), None);
        assert!(active.contains(Hand::Right, u7::new(60)));
        assert!(active.contains(Hand::Left, u7::new(48)));
        assert_eq!(active.len(Hand::Right), 1);

        assert_eq!(active.release(u7::new(60)), Some(Hand::Right));
        assert_eq!(active.release(u7::new(48)), Some(Hand::Left));
        assert!(active.is_empty());
    }

    #[test]
    fn release_unknown_pitch_is_noop() {
        let mut active = ActiveNotes::new();
        active.claim(u7::new(60), Hand::Left);
        let before = active;
        assert_eq!(active.release(u7::new(67)), None);
        assert_eq!(active, before);
    }

    #[test]
    fn reclaim_moves_pitch_between_hands() {
        let mut active = ActiveNotes::new();
        active.claim(u7::new(60), Hand::Left);
        assert_eq!(active.claim(u7::new(60), Hand::Right), Some(Hand::Left));
        assert!(active.contains(Hand::Right, u7::new(60)));
        assert!(!active.contains(Hand::Left, u7::new(60)));
        assert!(active.is_disjoint());
    }

    #[test]
    fn extreme_keys() {
        let mut active = ActiveNotes::new();
        active.claim(u7::new(0), Hand::Left);
        active.claim(u7::new(127), Hand::Right);
        assert_eq!(active.hand_of(u7::new(0)), Some(Hand::Left));
        assert_eq!(active.hand_of(u7::new(127)), Some(Hand::Right));
        assert_eq!(active.hand_of(u7::new(64)), None);
    }
}
