//! Nudge message catalog and category rotation.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Theme of a nudge. Consecutive nudges avoid recently used categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Breathe,
    Posture,
    Hydrate,
    Gratitude,
    Movement,
    Reflection,
    Outdoors,
    Connection,
}

impl MessageCategory {
    pub const ALL: [MessageCategory; 8] = [
        MessageCategory::Breathe,
        MessageCategory::Posture,
        MessageCategory::Hydrate,
        MessageCategory::Gratitude,
        MessageCategory::Movement,
        MessageCategory::Reflection,
        MessageCategory::Outdoors,
        MessageCategory::Connection,
    ];
}

/// What a notification shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub sound: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<MessageCategory>,
}

struct Message {
    category: MessageCategory,
    title: &'static str,
    body: &'static str,
}

const CATALOG: &[Message] = &[
    Message {
        category: MessageCategory::Breathe,
        title: "Take a breath",
        body: "Pause the feed. Breathe in for four, out for six.",
    },
    Message {
        category: MessageCategory::Breathe,
        title: "Three slow breaths",
        body: "Before the next swipe, take three slow breaths.",
    },
    Message {
        category: MessageCategory::Posture,
        title: "Check your posture",
        body: "Drop your shoulders and lift the phone to eye level.",
    },
    Message {
        category: MessageCategory::Hydrate,
        title: "Water break",
        body: "Put the phone down and drink a glass of water.",
    },
    Message {
        category: MessageCategory::Gratitude,
        title: "One good thing",
        body: "Name one thing that went well today.",
    },
    Message {
        category: MessageCategory::Movement,
        title: "Stretch it out",
        body: "Stand up and stretch for thirty seconds.",
    },
    Message {
        category: MessageCategory::Movement,
        title: "Walk it off",
        body: "A two minute walk beats twenty minutes of scrolling.",
    },
    Message {
        category: MessageCategory::Reflection,
        title: "Why are you here?",
        body: "What were you looking for when you opened this app?",
    },
    Message {
        category: MessageCategory::Outdoors,
        title: "Look outside",
        body: "Find a window and look at something far away.",
    },
    Message {
        category: MessageCategory::Connection,
        title: "Reach out",
        body: "Message a friend instead of reading strangers.",
    },
];

/// Picks nudge content, skipping the last `memory` categories used.
#[derive(Debug, Clone)]
pub struct ContentPicker {
    recent: VecDeque<MessageCategory>,
    memory: usize,
}

impl ContentPicker {
    pub fn new(memory: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(memory),
            memory,
        }
    }

    /// Categories chosen most recently, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &MessageCategory> {
        self.recent.iter()
    }

    pub fn pick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> NotificationContent {
        let fresh: Vec<&Message> = CATALOG
            .iter()
            .filter(|m| !self.recent.contains(&m.category))
            .collect();
        // With a memory at least as large as the category set, only the
        // latest category is excluded.
        let candidates: Vec<&Message> = if fresh.is_empty() {
            let last = self.recent.back().copied();
            CATALOG.iter().filter(|m| Some(m.category) != last).collect()
        } else {
            fresh
        };

        let message = candidates
            .choose(rng)
            .copied()
            .unwrap_or(&CATALOG[0]);

        if self.memory > 0 {
            if self.recent.len() == self.memory {
                self.recent.pop_front();
            }
            self.recent.push_back(message.category);
        }

        NotificationContent {
            title: message.title.to_string(),
            body: message.body.to_string(),
            sound: true,
            category: Some(message.category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn catalog_covers_every_category() {
        for category in MessageCategory::ALL {
            assert!(CATALOG.iter().any(|m| m.category == category), "{category:?}");
        }
    }

    #[test]
    fn never_repeats_within_memory() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut picker = ContentPicker::new(5);
        let picks: Vec<MessageCategory> = (0..200)
            .map(|_| picker.pick(&mut rng).category.unwrap())
            .collect();
        for (i, category) in picks.iter().enumerate() {
            let lookback = &picks[i.saturating_sub(5)..i];
            assert!(!lookback.contains(category), "repeat at {i}: {category:?}");
        }
    }

    #[test]
    fn oversized_memory_still_picks() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut picker = ContentPicker::new(20);
        let mut previous = None;
        for _ in 0..30 {
            let category = picker.pick(&mut rng).category;
            assert_ne!(category, previous);
            previous = category;
        }
    }
}
