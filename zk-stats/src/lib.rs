// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of zk-stats project.
// Copyright (C) 2025  Andrei Kochergin <zeek@tuta.com>
//
// Additional terms under GNU AGPL v3 section 7:
//   You must preserve this notice and the zk-stats
//   attribution in copies of this file or substantial
//   portions of it. See the NOTICE file for details.

//! Provable statistics over private data.
//!
//! A user writes one computation function calling statistic
//! methods on an orchestration [`computation::State`]. The same
//! function is executed twice: a trace pass that records every
//! operation, and a replay pass that re-runs the identical call
//! sequence against the frozen operation log and aggregates a
//! per-operation precision verdict into a single boolean. The
//! prover persists a small witness so a later verifier session
//! can replay the chain without access to the private inputs.

#![forbid(unsafe_code)]

pub mod computation;
pub mod error;
pub mod logging;
pub mod model;
pub mod ops;
pub mod tensor;
pub mod witness;

/// Default error tolerance for precision checks.
pub const DEFAULT_ERROR: f64 = 0.01;
