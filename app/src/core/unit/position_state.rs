use serde::{Deserialize, Serialize};

/// Movement of a window covering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionState {
    Decreasing,
    Increasing,
    Stopped,
}
