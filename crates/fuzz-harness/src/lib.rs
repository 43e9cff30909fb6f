//! Globe Reveal Fuzz Harness
//!
//! Shared proptest strategies for geographic inputs: coordinates, square
//! countries and coverage disks. Values are plain tuples and structs so any
//! crate can turn them into its own geometry types.
//!
//! # Usage
//!
//! ```rust
//! use fuzz_harness::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn my_fuzz_test(square in square_country()) {
//!         prop_assert!(square.size_deg > 0.0);
//!     }
//! }
//! ```

pub mod generators;

pub mod prelude {
    pub use crate::generators::*;
    pub use proptest::prelude::*;
}

// Re-export proptest for convenience
pub use proptest;
