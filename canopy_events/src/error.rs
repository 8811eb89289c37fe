// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch errors.

/// Errors returned by the dispatcher before any handler runs.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// The payload passed to a dispatch entry point is not the type the
    /// capability's handlers take.
    #[error("invalid event data: expected {expected}, received {actual}")]
    InvalidEventData {
        /// Type the capability requires.
        expected: &'static str,
        /// Type that was supplied.
        actual: &'static str,
    },
}
