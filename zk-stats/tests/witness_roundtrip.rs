// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of zk-stats project.
// Copyright (C) 2025  Andrei Kochergin <zeek@tuta.com>
//
// Additional terms under GNU AGPL v3 section 7:
//   You must preserve this notice and the zk-stats
//   attribution in copies of this file or substantial
//   portions of it. See the NOTICE file for details.

use std::fs;
use std::path::Path;

use zk_stats::computation::State;
use zk_stats::error::{Error, Result};
use zk_stats::model::Model;
use zk_stats::tensor::Tensor;
use zk_stats::witness::Role;

fn mean_comp(state: &mut State, xs: &[Tensor]) -> Result<Tensor> {
    state.mean(&xs[0])
}

fn prover_session(path: &Path, x: &Tensor) -> (bool, Tensor) {
    let mut model = Model::new(mean_comp, 0.01, Role::Prover, path);
    model.preprocess(std::slice::from_ref(x)).unwrap();
    model.forward(std::slice::from_ref(x)).unwrap()
}

#[test]
fn prover_persists_witness_at_replay_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("witness.json");

    let x = Tensor::from_vec(vec![1.0, 2.0, 3.0]);
    let (precise, result) = prover_session(&path, &x);
    assert!(precise);
    assert_eq!(result.item().unwrap(), 2.0);

    let raw = fs::read_to_string(&path).unwrap();
    assert_eq!(raw, r#"{"Mean":[2.0]}"#);
}

#[test]
fn verifier_reproduces_prover_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("witness.json");

    let x = Tensor::from_vec(vec![1.0, 2.0, 3.0]);
    let (prover_precise, prover_result) = prover_session(&path, &x);

    let mut verifier = Model::new(mean_comp, 0.01, Role::Verifier, path.clone());
    verifier.preprocess(std::slice::from_ref(&x)).unwrap();
    let (precise, result) = verifier.forward(std::slice::from_ref(&x)).unwrap();

    assert_eq!(precise, prover_precise);
    assert_eq!(result.item().unwrap(), prover_result.item().unwrap());
}

#[test]
fn corrupted_witness_fails_precision_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("witness.json");

    let x = Tensor::from_vec(vec![1.0, 2.0, 3.0]);
    prover_session(&path, &x);

    // Forge the recorded mean: 2.0 -> 2.5
    fs::write(&path, r#"{"Mean":[2.5]}"#).unwrap();

    let mut verifier = Model::new(mean_comp, 0.01, Role::Verifier, path.clone());
    verifier.preprocess(std::slice::from_ref(&x)).unwrap();
    let (precise, result) = verifier.forward(std::slice::from_ref(&x)).unwrap();

    assert!(!precise);
    assert_eq!(result.item().unwrap(), 2.5);
}

#[test]
fn verifier_without_witness_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");

    let x = Tensor::from_vec(vec![1.0, 2.0, 3.0]);
    let mut verifier = Model::new(mean_comp, 0.01, Role::Verifier, path.clone());

    let err = verifier.preprocess(std::slice::from_ref(&x)).unwrap_err();
    assert!(matches!(err, Error::WitnessIo { .. }));
}

#[test]
fn malformed_witness_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("witness.json");
    fs::write(&path, "not json").unwrap();

    let x = Tensor::from_vec(vec![1.0, 2.0, 3.0]);
    let mut verifier = Model::new(mean_comp, 0.01, Role::Verifier, path.clone());

    let err = verifier.preprocess(std::slice::from_ref(&x)).unwrap_err();
    assert!(matches!(err, Error::WitnessFormat(_)));
}
