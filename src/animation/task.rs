//! Task categories and their clip sequences

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use super::clip::ClipRef;
use crate::config::TasksConfig;
use crate::error::AnimationError;

/// A requestable gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskName {
    Talk,
    Laugh,
    Angry,
    /// Sit down and start typing
    Task,
    /// Stop typing and stand up
    StopTask,
}

impl TaskName {
    pub const ALL: [TaskName; 5] = [
        Self::Talk,
        Self::Laugh,
        Self::Angry,
        Self::Task,
        Self::StopTask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Talk => "talk",
            Self::Laugh => "laugh",
            Self::Angry => "angry",
            Self::Task => "task",
            Self::StopTask => "stop-task",
        }
    }
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskName {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "talk" => Ok(Self::Talk),
            "laugh" => Ok(Self::Laugh),
            "angry" => Ok(Self::Angry),
            "task" => Ok(Self::Task),
            "stop-task" => Ok(Self::StopTask),
            _ => Err(AnimationError::UnknownTask(s.to_string())),
        }
    }
}

/// Ordered clips for one task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskPlan {
    pub clips: Vec<ClipRef>,
    /// The final clip loops; all earlier clips play once
    pub loop_last: bool,
}

impl TaskPlan {
    pub fn new(clips: Vec<ClipRef>, loop_last: bool) -> Self {
        Self { clips, loop_last }
    }

    /// Whether the clip at `index` loops
    pub fn loops_at(&self, index: usize) -> bool {
        self.loop_last && index + 1 == self.clips.len()
    }
}

/// Static task table, built once at startup
#[derive(Debug, Clone)]
pub struct TaskCatalog {
    plans: HashMap<TaskName, TaskPlan>,
}

impl TaskCatalog {
    pub fn from_config(config: &TasksConfig) -> Self {
        let plans = TaskName::ALL
            .iter()
            .map(|&name| {
                let task = config.get(name);
                let clips = task.clips.iter().map(|c| ClipRef::new(c.as_str())).collect();
                (name, TaskPlan::new(clips, task.loop_last))
            })
            .collect();

        Self { plans }
    }

    /// Resolve a free-form task name
    pub fn resolve(&self, name: &str) -> Result<(TaskName, &TaskPlan), AnimationError> {
        let task: TaskName = name.parse()?;
        self.plans
            .get(&task)
            .map(|plan| (task, plan))
            .ok_or_else(|| AnimationError::UnknownTask(name.to_string()))
    }

    pub fn get(&self, task: TaskName) -> Option<&TaskPlan> {
        self.plans.get(&task)
    }

    /// All tasks in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (TaskName, &TaskPlan)> {
        TaskName::ALL
            .into_iter()
            .filter_map(move |name| self.plans.get(&name).map(|plan| (name, plan)))
    }
}

impl Default for TaskCatalog {
    fn default() -> Self {
        Self::from_config(&TasksConfig::default())
    }
}
