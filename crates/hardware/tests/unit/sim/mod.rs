//! Simulator driver tests.
