// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of zk-stats project.
// Copyright (C) 2025  Andrei Kochergin <zeek@tuta.com>
//
// Additional terms under GNU AGPL v3 section 7:
//   You must preserve this notice and the zk-stats
//   attribution in copies of this file or substantial
//   portions of it. See the NOTICE file for details.

//! Persisted witness shared between prover and verifier sessions.
//!
//! A witness is a JSON object mapping operation-name keys to a
//! list of recorded scalar results. The prover writes it once at
//! the end of a successful replay; a later verifier session reads
//! it wholesale before constructing any operation. Only the mean
//! statistic records an entry today; multi-statistic witness
//! chains are a known limitation carried over from the source
//! protocol.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which side of the protocol a session runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Computes statistics from live private data and persists
    /// the witness.
    Prover,
    /// Reconstructs operations from the persisted witness.
    Verifier,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Witness {
    entries: BTreeMap<String, Vec<f64>>,
}

impl Witness {
    pub fn record(&mut self, name: &str, values: Vec<f64>) {
        self.entries.insert(name.to_string(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::WitnessIo {
            source: e,
            path: path.to_path_buf(),
        })?;

        let witness: Self = serde_json::from_slice(&bytes)?;
        tracing::debug!(
            target: "stats.witness",
            path = %path.display(),
            entries = witness.entries.len(),
            "loaded witness"
        );

        Ok(witness)
    }

    pub fn store(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec(self)?;
        fs::write(path, bytes).map_err(|e| Error::WitnessIo {
            source: e,
            path: path.to_path_buf(),
        })?;

        tracing::debug!(
            target: "stats.witness",
            path = %path.display(),
            entries = self.entries.len(),
            "stored witness"
        );

        Ok(())
    }
}
