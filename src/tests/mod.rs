//! # Crate-level Test Suite
//!
//! Marshalling tests driven by a recording stub in place of the native
//! library, plus identifier and coefficient tests.

mod identifier_tests;
