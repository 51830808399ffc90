//! End-to-end scans through the public resolver.

mod builtin;
mod containers;
mod exact;
mod memoization;
mod persistence;
