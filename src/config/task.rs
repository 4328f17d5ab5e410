use std::fmt;
use std::str::FromStr;

use crate::error::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    CodingMath,
    FileQuestions,
    Computational,
    Normal,
    DataAnalysis,
    Conversation,
    Creative,
}

impl TaskType {
    pub const ALL: [TaskType; 7] = [
        TaskType::CodingMath,
        TaskType::FileQuestions,
        TaskType::Computational,
        TaskType::Normal,
        TaskType::DataAnalysis,
        TaskType::Conversation,
        TaskType::Creative,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskType::CodingMath => "Coding/Math Questions",
            TaskType::FileQuestions => "File Questions",
            TaskType::Computational => "Computational Tasks",
            TaskType::Normal => "Normal Questions",
            TaskType::DataAnalysis => "Data Cleaning/Data Analysis",
            TaskType::Conversation => "General Conversation / Translation",
            TaskType::Creative => "Creative Tasks/Poetry",
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            TaskType::CodingMath => 0.0,
            TaskType::FileQuestions => 0.1,
            TaskType::Computational => 0.2,
            TaskType::Normal => 0.6,
            TaskType::DataAnalysis => 1.0,
            TaskType::Conversation => 1.3,
            TaskType::Creative => 1.5,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for TaskType {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TaskType::ALL
            .iter()
            .copied()
            .find(|task| task.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ChatError::Validation(format!("Unknown task type: '{}'", s)))
    }
}
