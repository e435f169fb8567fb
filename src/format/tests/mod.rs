//! Tests for annotation storage.
//!
//! These tests exercise the store against real files in temporary
//! directories: the load fallback chain, whole-file rejection and saving.
