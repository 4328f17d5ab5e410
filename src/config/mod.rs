pub mod prompt;
pub mod task;
