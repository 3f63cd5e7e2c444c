// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of zk-stats project.
// Copyright (C) 2025  Andrei Kochergin <zeek@tuta.com>
//
// Additional terms under GNU AGPL v3 section 7:
//   You must preserve this notice and the zk-stats
//   attribution in copies of this file or substantial
//   portions of it. See the NOTICE file for details.

//! Error type shared across the orchestration core.
//!
//! Protocol violations signal a computation that behaved
//! differently between trace and replay; they are fatal for
//! the session and are never retried. Precision failures are
//! not errors at all and flow through as a `false` verdict.

use std::path::PathBuf;

use crate::ops::OpKind;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Replay made more statistic calls than trace recorded.
    #[error("replay cursor out of bounds: {cursor} >= {ops}")]
    CursorOutOfBounds { cursor: usize, ops: usize },

    /// Replay requested a different operation kind than the
    /// one recorded at this position during trace.
    #[error("operation kind mismatch at index {index}: recorded {recorded}, replayed {replayed}")]
    OpKindMismatch {
        index: usize,
        recorded: OpKind,
        replayed: OpKind,
    },

    /// Replay made fewer statistic calls than trace recorded.
    #[error("incomplete replay: {replayed} of {ops} operations replayed")]
    IncompleteReplay { replayed: usize, ops: usize },

    /// Pending precision checks diverged from the operation
    /// log; structurally impossible unless the log was mutated
    /// mid-replay.
    #[error("pending check count mismatch: {checks} checks for {ops} operations")]
    CheckCountMismatch { checks: usize, ops: usize },

    #[error("witness io: {source}: {path}")]
    WitnessIo {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("witness malformed: {0}")]
    WitnessFormat(#[from] serde_json::Error),
}
