//! Prebuilt mindful tasks.

use serde::{Deserialize, Serialize};

use super::CompletionTracker;

pub const TASK_COMPLETIONS_KEY: &str = "mindful_task_completions";
pub const TASK_STREAKS_KEY: &str = "prebuilt_tasks_streaks";

/// Payload of a task completion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletion {
    pub xp_awarded: u32,
}

pub type TaskTracker = CompletionTracker<TaskCompletion>;

/// A task offered out of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrebuiltTask {
    pub id: &'static str,
    pub title: &'static str,
    pub xp: u32,
}

pub const PREBUILT_TASKS: &[PrebuiltTask] = &[
    PrebuiltTask {
        id: "coldShower",
        title: "Take a cold shower",
        xp: 8,
    },
    PrebuiltTask {
        id: "phoneFreeMorning",
        title: "No phone for the first hour",
        xp: 10,
    },
    PrebuiltTask {
        id: "morningWalk",
        title: "Walk outside for 10 minutes",
        xp: 6,
    },
    PrebuiltTask {
        id: "readTenPages",
        title: "Read 10 pages of a book",
        xp: 6,
    },
    PrebuiltTask {
        id: "makeBed",
        title: "Make your bed",
        xp: 3,
    },
    PrebuiltTask {
        id: "screenFreeMeal",
        title: "Eat one meal without a screen",
        xp: 5,
    },
    PrebuiltTask {
        id: "phoneOutOfBedroom",
        title: "Charge your phone outside the bedroom",
        xp: 8,
    },
];

pub fn prebuilt_task(id: &str) -> Option<&'static PrebuiltTask> {
    PREBUILT_TASKS.iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn prebuilt_ids_are_unique() {
        let ids: HashSet<_> = PREBUILT_TASKS.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), PREBUILT_TASKS.len());
    }

    #[test]
    fn cold_shower_is_worth_eight() {
        assert_eq!(prebuilt_task("coldShower").map(|t| t.xp), Some(8));
        assert!(prebuilt_task("doomscroll").is_none());
    }
}
