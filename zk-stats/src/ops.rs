// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of zk-stats project.
// Copyright (C) 2025  Andrei Kochergin <zeek@tuta.com>
//
// Additional terms under GNU AGPL v3 section 7:
//   You must preserve this notice and the zk-stats
//   attribution in copies of this file or substantial
//   portions of it. See the NOTICE file for details.

//! Statistic operations and their precision checks.
//!
//! Each [`Operation`] is one statistic instance: a kind, a
//! recorded result and the error tolerance it was created
//! under. Scalar statistics follow the conventions of Python's
//! `statistics` module (median averages middle pairs, mode
//! picks the first-encountered most common value, sample
//! variance applies Bessel's correction).

use core::fmt;

use crate::error::{Error, Result};
use crate::tensor::Tensor;
use crate::witness::Witness;

/// Statistic kinds dispatchable through the orchestration state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {
    Mean,
    Median,
    GeometricMean,
    HarmonicMean,
    Mode,
    PStdev,
    PVariance,
    Stdev,
    Variance,
    Covariance,
    Correlation,
    LinearRegression,
    Where,
}

impl OpKind {
    /// Stable name, also used as the witness-file key.
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Mean => "Mean",
            OpKind::Median => "Median",
            OpKind::GeometricMean => "GeometricMean",
            OpKind::HarmonicMean => "HarmonicMean",
            OpKind::Mode => "Mode",
            OpKind::PStdev => "PStdev",
            OpKind::PVariance => "PVariance",
            OpKind::Stdev => "Stdev",
            OpKind::Variance => "Variance",
            OpKind::Covariance => "Covariance",
            OpKind::Correlation => "Correlation",
            OpKind::LinearRegression => "LinearRegression",
            OpKind::Where => "Where",
        }
    }

    /// Number of input tensors the kind consumes.
    pub fn arity(&self) -> usize {
        match self {
            OpKind::Covariance
            | OpKind::Correlation
            | OpKind::LinearRegression
            | OpKind::Where => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One recorded statistic instance.
#[derive(Clone, Debug)]
pub struct Operation {
    kind: OpKind,
    result: Tensor,
    error: f64,
}

impl Operation {
    /// Prover-side construction: compute the real result from
    /// the live inputs.
    pub fn create(kind: OpKind, inputs: &[Tensor], error: f64) -> Result<Self> {
        let result = Self::evaluate(kind, inputs)?;
        Ok(Self { kind, result, error })
    }

    /// Verifier-side construction: take the result from the
    /// persisted witness when an entry for this kind exists,
    /// otherwise fall back to evaluating the replay inputs.
    /// Only `Mean` is witness-backed today.
    pub fn from_witness(
        kind: OpKind,
        inputs: &[Tensor],
        error: f64,
        witness: &Witness,
    ) -> Result<Self> {
        let result = match witness.get(kind.name()) {
            Some(values) if !values.is_empty() => Tensor::from_vec(values.to_vec()),
            _ => Self::evaluate(kind, inputs)?,
        };

        Ok(Self { kind, result, error })
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    pub fn result(&self) -> &Tensor {
        &self.result
    }

    /// Whether the recorded result is within tolerance of the
    /// statistic recomputed from `inputs`. Element-wise:
    /// `|claimed - actual| <= error * max(|actual|, 1)`.
    pub fn precision_check(&self, inputs: &[Tensor]) -> Result<bool> {
        let actual = Self::evaluate(self.kind, inputs)?;
        if actual.len() != self.result.len() {
            return Ok(false);
        }

        let ok = self
            .result
            .data()
            .iter()
            .zip(actual.data().iter())
            .all(|(claimed, actual)| {
                (claimed - actual).abs() <= self.error * actual.abs().max(1.0)
            });

        Ok(ok)
    }

    fn evaluate(kind: OpKind, inputs: &[Tensor]) -> Result<Tensor> {
        if inputs.len() != kind.arity() {
            return Err(Error::InvalidInput("wrong number of input tensors"));
        }

        let x = inputs[0].data();
        match kind {
            OpKind::Mean => Ok(Tensor::scalar(mean(x)?)),
            OpKind::Median => Ok(Tensor::scalar(median(x)?)),
            OpKind::GeometricMean => Ok(Tensor::scalar(geometric_mean(x)?)),
            OpKind::HarmonicMean => Ok(Tensor::scalar(harmonic_mean(x)?)),
            OpKind::Mode => Ok(Tensor::scalar(mode(x)?)),
            OpKind::PStdev => Ok(Tensor::scalar(pvariance(x)?.sqrt())),
            OpKind::PVariance => Ok(Tensor::scalar(pvariance(x)?)),
            OpKind::Stdev => Ok(Tensor::scalar(variance(x)?.sqrt())),
            OpKind::Variance => Ok(Tensor::scalar(variance(x)?)),
            OpKind::Covariance => Ok(Tensor::scalar(covariance(x, inputs[1].data())?)),
            OpKind::Correlation => Ok(Tensor::scalar(correlation(x, inputs[1].data())?)),
            OpKind::LinearRegression => {
                let (slope, intercept) = linear_regression(x, inputs[1].data())?;
                Ok(Tensor::from_vec(vec![slope, intercept]))
            }
            OpKind::Where => select(&inputs[0], &inputs[1]),
        }
    }
}

fn mean(xs: &[f64]) -> Result<f64> {
    if xs.is_empty() {
        return Err(Error::InvalidInput("mean requires a non-empty tensor"));
    }

    Ok(xs.iter().sum::<f64>() / xs.len() as f64)
}

fn median(xs: &[f64]) -> Result<f64> {
    if xs.is_empty() {
        return Err(Error::InvalidInput("median requires a non-empty tensor"));
    }

    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Ok(sorted[mid])
    } else {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

fn geometric_mean(xs: &[f64]) -> Result<f64> {
    if xs.is_empty() {
        return Err(Error::InvalidInput(
            "geometric mean requires a non-empty tensor",
        ));
    }
    if xs.iter().any(|&x| x <= 0.0) {
        return Err(Error::InvalidInput("geometric mean requires positive inputs"));
    }

    let log_sum: f64 = xs.iter().map(|x| x.ln()).sum();
    Ok((log_sum / xs.len() as f64).exp())
}

fn harmonic_mean(xs: &[f64]) -> Result<f64> {
    if xs.is_empty() {
        return Err(Error::InvalidInput(
            "harmonic mean requires a non-empty tensor",
        ));
    }
    if xs.iter().any(|&x| x <= 0.0) {
        return Err(Error::InvalidInput("harmonic mean requires positive inputs"));
    }

    let inv_sum: f64 = xs.iter().map(|x| 1.0 / x).sum();
    Ok(xs.len() as f64 / inv_sum)
}

fn mode(xs: &[f64]) -> Result<f64> {
    if xs.is_empty() {
        return Err(Error::InvalidInput("mode requires a non-empty tensor"));
    }

    // First-encountered value wins ties, like statistics.mode.
    let mut best = xs[0];
    let mut best_count = 0usize;
    for &candidate in xs {
        let count = xs.iter().filter(|&&v| v == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }

    Ok(best)
}

fn pvariance(xs: &[f64]) -> Result<f64> {
    if xs.is_empty() {
        return Err(Error::InvalidInput(
            "population variance requires a non-empty tensor",
        ));
    }

    let m = mean(xs)?;
    Ok(xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64)
}

fn variance(xs: &[f64]) -> Result<f64> {
    if xs.len() < 2 {
        return Err(Error::InvalidInput(
            "sample variance requires at least two samples",
        ));
    }

    let m = mean(xs)?;
    Ok(xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (xs.len() - 1) as f64)
}

fn covariance(xs: &[f64], ys: &[f64]) -> Result<f64> {
    if xs.len() != ys.len() {
        return Err(Error::InvalidInput(
            "covariance requires equally sized tensors",
        ));
    }
    if xs.len() < 2 {
        return Err(Error::InvalidInput(
            "covariance requires at least two samples",
        ));
    }

    let mx = mean(xs)?;
    let my = mean(ys)?;
    let sum: f64 = xs
        .iter()
        .zip(ys.iter())
        .map(|(x, y)| (x - mx) * (y - my))
        .sum();

    Ok(sum / (xs.len() - 1) as f64)
}

fn correlation(xs: &[f64], ys: &[f64]) -> Result<f64> {
    if xs.len() != ys.len() {
        return Err(Error::InvalidInput(
            "correlation requires equally sized tensors",
        ));
    }
    if xs.len() < 2 {
        return Err(Error::InvalidInput(
            "correlation requires at least two samples",
        ));
    }

    let mx = mean(xs)?;
    let my = mean(ys)?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        return Err(Error::InvalidInput(
            "correlation is undefined for constant inputs",
        ));
    }

    Ok(sxy / denom)
}

fn linear_regression(xs: &[f64], ys: &[f64]) -> Result<(f64, f64)> {
    if xs.len() != ys.len() {
        return Err(Error::InvalidInput(
            "linear regression requires equally sized tensors",
        ));
    }
    if xs.len() < 2 {
        return Err(Error::InvalidInput(
            "linear regression requires at least two samples",
        ));
    }

    let mx = mean(xs)?;
    let my = mean(ys)?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mx;
        sxy += dx * (y - my);
        sxx += dx * dx;
    }

    if sxx == 0.0 {
        return Err(Error::InvalidInput(
            "linear regression requires non-constant x",
        ));
    }

    let slope = sxy / sxx;
    Ok((slope, my - slope * mx))
}

/// Element-wise conditional select: `filter[i] != 0 ? x[i] : 0`.
/// Preserves the shape of `x` so the result stays usable as a
/// tensor input to downstream operations.
fn select(filter: &Tensor, x: &Tensor) -> Result<Tensor> {
    if filter.shape() != x.shape() {
        return Err(Error::InvalidInput(
            "where requires filter and data of equal shape",
        ));
    }

    let data = filter
        .data()
        .iter()
        .zip(x.data().iter())
        .map(|(f, v)| if *f != 0.0 { *v } else { 0.0 })
        .collect();

    Tensor::new(x.shape().to_vec(), data)
}
