pub mod config;
pub mod credit;
pub mod error;
pub mod inputs;
pub mod numeric;
pub mod types;

pub use config::UnderwritingThresholds;
pub use error::FinSightError;
pub use types::*;

/// Standard result type for all finsight operations
pub type FinSightResult<T> = Result<T, FinSightError>;
