//! # Scenario Test Suite
//!
//! End-to-end checks of fitting and tuning over synthesized multi-year
//! records. Unit tests live next to the code they cover.
