//! Canned input sequences and the learn-then-replay harness used by the
//! binary, the integration tests and the benchmarks.

pub mod replay;
pub mod sequences;
