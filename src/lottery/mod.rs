pub mod machine;
pub mod types;

pub use machine::Lottery;
pub use types::{DrawParams, LotteryState, UpkeepStatus};
