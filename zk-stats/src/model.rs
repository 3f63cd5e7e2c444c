// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of zk-stats project.
// Copyright (C) 2025  Andrei Kochergin <zeek@tuta.com>
//
// Additional terms under GNU AGPL v3 section 7:
//   You must preserve this notice and the zk-stats
//   attribution in copies of this file or substantial
//   portions of it. See the NOTICE file for details.

//! Two-phase model adapter over a user computation.
//!
//! Downstream export tooling drives the standard pair:
//! [`Model::preprocess`] runs the computation once under the
//! trace stage and freezes the state, [`Model::forward`] replays
//! it and yields the aggregated precision verdict next to the
//! final value. `forward` may be called any number of times and
//! must replay the identical call sequence each time.

use std::path::PathBuf;

use crate::computation::{IsPrecise, State};
use crate::error::{Error, Result};
use crate::tensor::Tensor;
use crate::witness::Role;

pub struct Model<F>
where
    F: Fn(&mut State, &[Tensor]) -> Result<Tensor>,
{
    state: State,
    computation: F,
}

impl<F> Model<F>
where
    F: Fn(&mut State, &[Tensor]) -> Result<Tensor>,
{
    pub fn new(computation: F, error: f64, role: Role, witness_path: impl Into<PathBuf>) -> Self {
        Self {
            state: State::new(error, role, witness_path),
            computation,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Trace pass. Must be called exactly once, before any
    /// [`Model::forward`].
    pub fn preprocess(&mut self, inputs: &[Tensor]) -> Result<()> {
        (self.computation)(&mut self.state, inputs)?;
        self.state.freeze()
    }

    /// Replay pass: returns the AND of every operation's
    /// precision check together with the final tensor.
    ///
    /// A computation that makes no statistic calls has no
    /// aggregation boundary; it yields `(true, output)`
    /// vacuously.
    pub fn forward(&mut self, inputs: &[Tensor]) -> Result<(IsPrecise, Tensor)> {
        self.state.rewind()?;
        let out = (self.computation)(&mut self.state, inputs)?;

        if let Some(verdict) = self.state.take_verdict() {
            return Ok(verdict);
        }

        if self.state.op_count() == 0 {
            return Ok((true, out));
        }

        // Fewer calls than were recorded during trace.
        Err(Error::IncompleteReplay {
            replayed: self.state.replayed(),
            ops: self.state.op_count(),
        })
    }
}
