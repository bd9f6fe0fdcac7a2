//! Test utilities for ledger testing.
