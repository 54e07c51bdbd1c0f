//! Boundary normalisation: raw dashboard / projection-engine JSON in,
//! canonical typed records out.

pub mod parameters;
pub mod projection;

pub use parameters::{FinancialParameters, RawFinancialParameters};
pub use projection::{Projection, RawProjection};
