//! Helpers for testing stages and queries.
//!
//! - **Builders**: construct labeled series and shard inputs tersely
//! - **Assertions**: compare samples (NaN-aware, with tolerance) and series
//!   order, with messages that show both sides
//!
//! # Quick Start
//!
//! ```
//! use ironseries::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let s = SeriesBuilder::new(10)
//!     .label("host", "a")
//!     .points([(0, 1.0), (10, 2.0)])
//!     .build()?;
//!
//! assert_samples_eq(s.samples(), &[(0, 1.0), (10, 2.0)]);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod builders;

pub use assertions::*;
pub use builders::*;
