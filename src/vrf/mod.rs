pub mod coordinator;
pub mod engine;

pub use coordinator::{
    MockVrfCoordinator, RandomnessConsumer, RandomnessCoordinator, RandomnessRequest,
};
pub use engine::{VrfEngine, VrfProof};
