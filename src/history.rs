//! A bounded ring of recently entered command lines, addressable by the
//! 1-based numbers printed by the `history` builtin and accepted by `!n`.

use std::collections::VecDeque;

pub const HISTORY_SIZE: usize = 20;

/// Ring buffer of command lines. Numbering is absolute: the first line ever
/// entered is number 1, and the numbers keep growing after old entries are
/// evicted.
#[derive(Debug, Default)]
pub struct History {
    entries: VecDeque<String>,
    /// Absolute number of the oldest retained entry, minus one.
    evicted: usize,
}

impl History {
    pub fn new() -> Self {
        History {
            entries: VecDeque::with_capacity(HISTORY_SIZE),
            evicted: 0,
        }
    }

    /// Record a line. Blank lines are not kept.
    pub fn add(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        if self.entries.len() == HISTORY_SIZE {
            self.entries.pop_front();
            self.evicted += 1;
        }
        self.entries.push_back(line.to_string());
    }

    /// Look up entry number `n` (1-based, absolute).
    pub fn get(&self, n: usize) -> Option<&str> {
        let index = n.checked_sub(self.evicted + 1)?;
        self.entries.get(index).map(String::as_str)
    }

    /// Retained entries, oldest first, with their absolute numbers.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, line)| (self.evicted + i + 1, line.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_starts_at_one() {
        let mut history = History::new();
        history.add("first");
        history.add("second");
        assert_eq!(history.get(1), Some("first"));
        assert_eq!(history.get(2), Some("second"));
        assert_eq!(history.get(3), None);
        assert_eq!(history.get(0), None);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut history = History::new();
        history.add("   ");
        history.add("");
        assert!(history.is_empty());
    }

    #[test]
    fn eviction_preserves_absolute_numbers() {
        let mut history = History::new();
        for i in 1..=HISTORY_SIZE + 3 {
            history.add(&format!("cmd{i}"));
        }
        assert_eq!(history.len(), HISTORY_SIZE);
        // The first three entries were evicted.
        assert_eq!(history.get(3), None);
        assert_eq!(history.get(4), Some("cmd4"));
        assert_eq!(history.get(HISTORY_SIZE + 3), Some("cmd23"));
    }

    #[test]
    fn iter_yields_oldest_first_with_numbers() {
        let mut history = History::new();
        history.add("a");
        history.add("b");
        let listed: Vec<(usize, &str)> = history.iter().collect();
        assert_eq!(listed, [(1, "a"), (2, "b")]);
    }
}
