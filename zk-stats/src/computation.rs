// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of zk-stats project.
// Copyright (C) 2025  Andrei Kochergin <zeek@tuta.com>
//
// Additional terms under GNU AGPL v3 section 7:
//   You must preserve this notice and the zk-stats
//   attribution in copies of this file or substantial
//   portions of it. See the NOTICE file for details.

//! Orchestration state machine for trace/replay sessions.
//!
//! A [`State`] is created fresh per prove or verify session and
//! moves through exactly two stages. During trace every statistic
//! call constructs an [`Operation`] and appends it to the log.
//! After [`State::freeze`] the log is read-only; each replayed
//! call must match the recorded kind at the cursor, enqueues a
//! deferred precision predicate, and returns the recorded result
//! rebased onto the live inputs through a zero offset. The call
//! that replays the last recorded operation evaluates every
//! pending predicate in order, ANDs them into one verdict, and
//! (prover side) persists the witness.
//!
//! Correctness rests on the user computation being deterministic:
//! any divergence in call count or kind between trace and replay
//! is a fatal protocol violation, not a recoverable error.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::ops::{OpKind, Operation};
use crate::tensor::Tensor;
use crate::witness::{Role, Witness};

/// Aggregated precision verdict over a whole computation.
pub type IsPrecise = bool;

/// Deferred per-operation precision predicate; evaluated exactly
/// once, in enqueue order, when the last operation is replayed.
type PendingCheck = Box<dyn FnOnce() -> Result<bool>>;

enum Stage {
    Trace,
    Replay { cursor: usize },
}

pub struct State {
    ops: Vec<Operation>,
    pending_checks: Vec<PendingCheck>,
    error: f64,
    stage: Stage,
    role: Role,
    witness_path: PathBuf,
    witness: Witness,
    witness_loaded: bool,
    verdict: Option<(IsPrecise, Tensor)>,
}

impl State {
    pub fn new(error: f64, role: Role, witness_path: impl Into<PathBuf>) -> Self {
        Self {
            ops: Vec::new(),
            pending_checks: Vec::new(),
            error,
            stage: Stage::Trace,
            role,
            witness_path: witness_path.into(),
            witness: Witness::default(),
            witness_loaded: false,
            verdict: None,
        }
    }

    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Number of operations recorded during trace.
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// End the trace stage and freeze the operation log.
    /// The stage transition is strictly forward; calling this
    /// twice within one session is an error.
    pub fn freeze(&mut self) -> Result<()> {
        match self.stage {
            Stage::Trace => {
                tracing::debug!(target: "stats.state", ops = self.ops.len(), "frozen for replay");
                self.stage = Stage::Replay { cursor: 0 };
                Ok(())
            }
            Stage::Replay { .. } => Err(Error::InvalidInput("state is already frozen for replay")),
        }
    }

    /// Rewind the replay cursor for a fresh pass. Each `forward`
    /// replays the whole chain from the start.
    pub(crate) fn rewind(&mut self) -> Result<()> {
        match self.stage {
            Stage::Trace => Err(Error::InvalidInput("state has not been frozen for replay")),
            Stage::Replay { .. } => {
                self.stage = Stage::Replay { cursor: 0 };
                self.pending_checks.clear();
                self.verdict = None;
                Ok(())
            }
        }
    }

    /// How many operations the current replay pass has consumed.
    pub(crate) fn replayed(&self) -> usize {
        match self.stage {
            Stage::Trace => 0,
            Stage::Replay { cursor } => cursor,
        }
    }

    pub(crate) fn take_verdict(&mut self) -> Option<(IsPrecise, Tensor)> {
        self.verdict.take()
    }

    /// Mean of the input tensor.
    pub fn mean(&mut self, x: &Tensor) -> Result<Tensor> {
        self.call_op(vec![x.clone()], OpKind::Mean)
    }

    /// Median of the input tensor.
    pub fn median(&mut self, x: &Tensor) -> Result<Tensor> {
        self.call_op(vec![x.clone()], OpKind::Median)
    }

    pub fn geometric_mean(&mut self, x: &Tensor) -> Result<Tensor> {
        self.call_op(vec![x.clone()], OpKind::GeometricMean)
    }

    pub fn harmonic_mean(&mut self, x: &Tensor) -> Result<Tensor> {
        self.call_op(vec![x.clone()], OpKind::HarmonicMean)
    }

    /// First-encountered most common value.
    pub fn mode(&mut self, x: &Tensor) -> Result<Tensor> {
        self.call_op(vec![x.clone()], OpKind::Mode)
    }

    /// Population standard deviation.
    pub fn pstdev(&mut self, x: &Tensor) -> Result<Tensor> {
        self.call_op(vec![x.clone()], OpKind::PStdev)
    }

    /// Population variance.
    pub fn pvariance(&mut self, x: &Tensor) -> Result<Tensor> {
        self.call_op(vec![x.clone()], OpKind::PVariance)
    }

    /// Sample standard deviation (Bessel-corrected).
    pub fn stdev(&mut self, x: &Tensor) -> Result<Tensor> {
        self.call_op(vec![x.clone()], OpKind::Stdev)
    }

    /// Sample variance (Bessel-corrected).
    pub fn variance(&mut self, x: &Tensor) -> Result<Tensor> {
        self.call_op(vec![x.clone()], OpKind::Variance)
    }

    pub fn covariance(&mut self, x: &Tensor, y: &Tensor) -> Result<Tensor> {
        self.call_op(vec![x.clone(), y.clone()], OpKind::Covariance)
    }

    /// Pearson correlation coefficient.
    pub fn correlation(&mut self, x: &Tensor, y: &Tensor) -> Result<Tensor> {
        self.call_op(vec![x.clone(), y.clone()], OpKind::Correlation)
    }

    /// One-variable least squares; returns `[slope, intercept]`.
    pub fn linear_regression(&mut self, x: &Tensor, y: &Tensor) -> Result<Tensor> {
        self.call_op(vec![x.clone(), y.clone()], OpKind::LinearRegression)
    }

    /// Element-wise conditional select of `x` under `filter`,
    /// preserving the input shape.
    pub fn where_select(&mut self, filter: &Tensor, x: &Tensor) -> Result<Tensor> {
        self.call_op(vec![filter.clone(), x.clone()], OpKind::Where)
    }

    fn call_op(&mut self, inputs: Vec<Tensor>, kind: OpKind) -> Result<Tensor> {
        match self.stage {
            Stage::Trace => self.trace_op(inputs, kind),
            Stage::Replay { cursor } => self.replay_op(inputs, kind, cursor),
        }
    }

    fn trace_op(&mut self, inputs: Vec<Tensor>, kind: OpKind) -> Result<Tensor> {
        let op = match self.role {
            Role::Prover => {
                let op = Operation::create(kind, &inputs, self.error)?;
                if kind == OpKind::Mean {
                    // The only witness-backed statistic; see witness.rs.
                    self.witness.record(kind.name(), op.result().data().to_vec());
                }
                op
            }
            Role::Verifier => {
                if !self.witness_loaded {
                    self.witness = Witness::load(&self.witness_path)?;
                    self.witness_loaded = true;
                }
                Operation::from_witness(kind, &inputs, self.error, &self.witness)?
            }
        };

        tracing::debug!(target: "stats.state", %kind, index = self.ops.len(), "recorded operation");

        let result = op.result().clone();
        self.ops.push(op);

        Ok(result)
    }

    fn replay_op(&mut self, inputs: Vec<Tensor>, kind: OpKind, cursor: usize) -> Result<Tensor> {
        if cursor >= self.ops.len() {
            return Err(Error::CursorOutOfBounds {
                cursor,
                ops: self.ops.len(),
            });
        }

        let op = self.ops[cursor].clone();
        if op.kind() != kind {
            return Err(Error::OpKindMismatch {
                index: cursor,
                recorded: op.kind(),
                replayed: kind,
            });
        }

        self.stage = Stage::Replay { cursor: cursor + 1 };

        // Numerically this is exactly the recorded result, but it
        // is derived from the live inputs so the returned tensor
        // stays inside the traced data flow.
        let combined = if kind == OpKind::Where {
            let live = inputs
                .get(1)
                .ok_or(Error::InvalidInput("where requires two input tensors"))?;
            op.result().with_zero_offset_like(live)?
        } else {
            let live = inputs
                .first()
                .ok_or(Error::InvalidInput("statistic requires an input tensor"))?;
            op.result().with_zero_offset_of(live)?
        };

        self.pending_checks
            .push(Box::new(move || op.precision_check(&inputs)));

        if cursor + 1 == self.ops.len() {
            let precise = self.aggregate()?;
            if self.role == Role::Prover {
                self.witness.store(&self.witness_path)?;
            }
            self.verdict = Some((precise, combined.clone()));
        }

        Ok(combined)
    }

    fn aggregate(&mut self) -> Result<bool> {
        let checks = std::mem::take(&mut self.pending_checks);
        if checks.len() != self.ops.len() {
            return Err(Error::CheckCountMismatch {
                checks: checks.len(),
                ops: self.ops.len(),
            });
        }

        let mut precise = true;
        for check in checks {
            precise &= check()?;
        }

        tracing::debug!(target: "stats.state", ops = self.ops.len(), precise, "aggregated precision checks");

        Ok(precise)
    }
}
