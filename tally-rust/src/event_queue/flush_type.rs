use std::fmt::Display;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FlushType {
    Scheduled,
    FullBatch,
    Manual,
    Shutdown,
}

impl Display for FlushType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlushType::Scheduled => "scheduled",
            FlushType::FullBatch => "full_batch",
            FlushType::Manual => "manual",
            FlushType::Shutdown => "shutdown",
        }
        .fmt(f)
    }
}
