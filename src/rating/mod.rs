pub mod model;
pub mod points;
pub mod scoring;
pub mod types;

pub use model::{compute_deltas, k_factor};
pub use points::Points;
pub use types::{ExperienceLevel, Participant, PlayerId, RatingChange};
