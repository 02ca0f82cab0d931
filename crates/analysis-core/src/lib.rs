pub mod chart;
pub mod error;
pub mod traits;
pub mod types;

pub use chart::{normalize_intraday, normalize_period, round_to_cents};
pub use error::*;
pub use traits::*;
pub use types::*;
