pub mod consistency;
pub mod delta;
pub mod replay;

pub use consistency::out_of_order_warnings;
pub use delta::{apply_backward, apply_forward, rescore_slots, score_match, PlayerBook};
pub use replay::{replay, sort_chronologically, ReplayOutcome};
