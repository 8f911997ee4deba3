//! Integration tests for the stamina workspace
//!
//! These tests exercise the retry engine, circuit breaker, and settings
//! layer together, the way a consuming service would wire them up.
