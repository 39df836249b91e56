//! Power-up tokens and the per-team bank that holds them
//!
//! A bank is a bounded FIFO: collecting past capacity drops the oldest
//! token. Tokens leave the bank only when activated onto a stone.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::state::Team;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Next contact stops the striker dead and hits the other stone with a fixed impulse
    SuperStrength,
}

impl PowerUpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::SuperStrength => "SuperStrength",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "superstrength" | "super_strength" => Some(PowerUpKind::SuperStrength),
            _ => None,
        }
    }
}

impl std::fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One team's collected power-ups, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPowerBank {
    capacity: usize,
    slots: VecDeque<PowerUpKind>,
}

impl TeamPowerBank {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a token, evicting the oldest when full.
    ///
    /// Returns the evicted token, if any.
    pub fn add(&mut self, token: PowerUpKind) -> Option<PowerUpKind> {
        let evicted = if self.slots.len() >= self.capacity {
            self.slots.pop_front()
        } else {
            None
        };
        self.slots.push_back(token);
        evicted
    }

    /// Remove and return the token at `index`, or `None` if the slot is empty
    pub fn activate_at(&mut self, index: usize) -> Option<PowerUpKind> {
        self.slots.remove(index)
    }

    pub fn get(&self, index: usize) -> Option<PowerUpKind> {
        self.slots.get(index).copied()
    }

    pub fn contains(&self, token: PowerUpKind) -> bool {
        self.slots.contains(&token)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = PowerUpKind> + '_ {
        self.slots.iter().copied()
    }
}

/// Both teams' banks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamBanks {
    pub red: TeamPowerBank,
    pub blue: TeamPowerBank,
}

impl TeamBanks {
    pub fn new(capacity: usize) -> Self {
        Self {
            red: TeamPowerBank::new(capacity),
            blue: TeamPowerBank::new(capacity),
        }
    }

    pub fn get(&self, team: Team) -> &TeamPowerBank {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }

    pub fn get_mut(&mut self, team: Team) -> &mut TeamPowerBank {
        match team {
            Team::Red => &mut self.red,
            Team::Blue => &mut self.blue,
        }
    }

    pub fn clear(&mut self) {
        self.red.clear();
        self.blue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keeps_acquisition_order() {
        let mut bank = TeamPowerBank::new(3);
        assert!(bank.is_empty());
        assert_eq!(bank.add(PowerUpKind::SuperStrength), None);
        assert_eq!(bank.add(PowerUpKind::SuperStrength), None);
        assert_eq!(bank.len(), 2);
        assert!(bank.contains(PowerUpKind::SuperStrength));
    }

    #[test]
    fn test_full_bank_evicts_oldest() {
        let mut bank = TeamPowerBank::new(3);
        for _ in 0..3 {
            bank.add(PowerUpKind::SuperStrength);
        }
        assert_eq!(bank.len(), 3);

        let evicted = bank.add(PowerUpKind::SuperStrength);
        assert_eq!(evicted, Some(PowerUpKind::SuperStrength));
        assert_eq!(bank.len(), 3);
        assert_eq!(bank.get(2), Some(PowerUpKind::SuperStrength));
    }

    #[test]
    fn test_activate_out_of_range_is_empty_slot() {
        let mut bank = TeamPowerBank::new(3);
        assert_eq!(bank.activate_at(0), None);

        bank.add(PowerUpKind::SuperStrength);
        assert_eq!(bank.activate_at(1), None);
        assert_eq!(bank.len(), 1);

        assert_eq!(bank.activate_at(0), Some(PowerUpKind::SuperStrength));
        assert!(bank.is_empty());
    }

    #[test]
    fn test_banks_are_independent() {
        let mut banks = TeamBanks::new(3);
        banks.get_mut(Team::Red).add(PowerUpKind::SuperStrength);
        assert_eq!(banks.get(Team::Red).len(), 1);
        assert!(banks.get(Team::Blue).is_empty());

        banks.clear();
        assert!(banks.get(Team::Red).is_empty());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(
            PowerUpKind::from_str("super_strength"),
            Some(PowerUpKind::SuperStrength)
        );
        assert_eq!(PowerUpKind::from_str("shield"), None);
        assert_eq!(PowerUpKind::SuperStrength.to_string(), "SuperStrength");
    }
}
