//! Unit tests for the Kiro bootstrap
//!
//! These tests use a recording command runner and the real filesystem under
//! temporary directories. No network access and no real installer.

mod install_command;
