// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of zk-stats project.
// Copyright (C) 2025  Andrei Kochergin <zeek@tuta.com>
//
// Additional terms under GNU AGPL v3 section 7:
//   You must preserve this notice and the zk-stats
//   attribution in copies of this file or substantial
//   portions of it. See the NOTICE file for details.

//! Dense row-major tensor of f64 values.
//!
//! Deliberately minimal: the orchestration core only needs
//! element-wise arithmetic for the replay zero-offset
//! combination, plus flat access for the statistic kernels.

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Tensor {
    /// Construct a tensor with an explicit shape.
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::InvalidInput("tensor shape does not match data length"));
        }

        Ok(Self { shape, data })
    }

    /// One-dimensional tensor over the given values.
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Single-element tensor.
    pub fn scalar(value: f64) -> Self {
        Self {
            shape: vec![1],
            data: vec![value],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// First element in row-major order.
    pub fn first(&self) -> Result<f64> {
        self.data
            .first()
            .copied()
            .ok_or(Error::InvalidInput("tensor is empty"))
    }

    /// Value of a single-element tensor.
    pub fn item(&self) -> Result<f64> {
        if self.data.len() != 1 {
            return Err(Error::InvalidInput("tensor is not a scalar"));
        }

        Ok(self.data[0])
    }

    pub fn add(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn add_scalar(&self, value: f64) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|x| x + value).collect(),
        }
    }

    /// Combine this tensor with a zero derived from the first
    /// element of `live`, keeping the numeric value unchanged.
    ///
    /// Replay returns recorded results through this combination
    /// so the output stays tied to the caller's live inputs in
    /// the exported computation graph.
    pub fn with_zero_offset_of(&self, live: &Tensor) -> Result<Tensor> {
        let z = live.first()?;
        Ok(self.add_scalar(z - z))
    }

    /// Shape-preserving variant: adds `live - live` element-wise.
    /// Used for conditional-select results, which must keep the
    /// filtered shape instead of collapsing to one element.
    pub fn with_zero_offset_like(&self, live: &Tensor) -> Result<Tensor> {
        self.add(&live.sub(live)?)
    }

    fn zip_with(&self, other: &Tensor, f: impl Fn(f64, f64) -> f64) -> Result<Tensor> {
        if self.shape != other.shape {
            return Err(Error::InvalidInput("tensor shape mismatch"));
        }

        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| f(*a, *b))
            .collect();

        Ok(Tensor {
            shape: self.shape.clone(),
            data,
        })
    }
}
