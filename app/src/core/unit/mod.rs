mod position;
mod position_state;

pub use position::Position;
pub use position_state::PositionState;
