pub mod animator;
pub mod geometry;
pub mod prize;
pub mod random;
pub mod selector;
pub mod session;
pub mod shared_wheel_game;
pub mod storage;

pub use animator::{SpinPlan, SpinTuning, WheelAnimator};
pub use prize::{CatalogError, Prize, PrizeCatalog};
pub use random::{RngSource, SequenceSource, UniformSource};
pub use selector::{select_prize, ClaimConstraints};
pub use session::SpinSession;
pub use shared_wheel_game::{GameRules, SpinOutcome, SpinResult, WheelGame, WheelStatus};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
