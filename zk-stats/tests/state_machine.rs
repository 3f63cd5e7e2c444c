// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of zk-stats project.
// Copyright (C) 2025  Andrei Kochergin <zeek@tuta.com>
//
// Additional terms under GNU AGPL v3 section 7:
//   You must preserve this notice and the zk-stats
//   attribution in copies of this file or substantial
//   portions of it. See the NOTICE file for details.

use std::cell::Cell;
use std::path::PathBuf;

use zk_stats::computation::State;
use zk_stats::error::{Error, Result};
use zk_stats::model::Model;
use zk_stats::tensor::Tensor;
use zk_stats::witness::Role;

fn witness_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("witness.json")
}

fn mean_comp(state: &mut State, xs: &[Tensor]) -> Result<Tensor> {
    state.mean(&xs[0])
}

#[test]
fn mean_scenario() {
    // state.mean(x) with x = [1, 2, 3] at tolerance 0.01
    let dir = tempfile::tempdir().unwrap();
    let mut model = Model::new(mean_comp, 0.01, Role::Prover, witness_path(&dir));

    let x = Tensor::from_vec(vec![1.0, 2.0, 3.0]);
    model.preprocess(std::slice::from_ref(&x)).unwrap();
    assert_eq!(model.state().op_count(), 1);

    let (precise, result) = model.forward(std::slice::from_ref(&x)).unwrap();
    assert!(precise);
    assert_eq!(result.item().unwrap(), 2.0);
}

#[test]
fn forward_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = Model::new(mean_comp, 0.01, Role::Prover, witness_path(&dir));

    let x = Tensor::from_vec(vec![1.0, 2.0, 3.0]);
    model.preprocess(std::slice::from_ref(&x)).unwrap();

    let first = model.forward(std::slice::from_ref(&x)).unwrap();
    let second = model.forward(std::slice::from_ref(&x)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn chained_operations_replay_in_order() {
    // median feeds mean; both precision checks must aggregate
    let comp = |state: &mut State, xs: &[Tensor]| -> Result<Tensor> {
        let med = state.median(&xs[0])?;
        state.mean(&med)
    };

    let dir = tempfile::tempdir().unwrap();
    let mut model = Model::new(comp, 0.01, Role::Prover, witness_path(&dir));

    let x = Tensor::from_vec(vec![4.0, 1.0, 3.0]);
    model.preprocess(std::slice::from_ref(&x)).unwrap();
    assert_eq!(model.state().op_count(), 2);

    let (precise, result) = model.forward(std::slice::from_ref(&x)).unwrap();
    assert!(precise);
    assert_eq!(result.item().unwrap(), 3.0);
}

#[test]
fn where_chain_preserves_shape() {
    let comp = |state: &mut State, xs: &[Tensor]| -> Result<Tensor> {
        let filtered = state.where_select(&xs[1], &xs[0])?;
        state.mean(&filtered)
    };

    let dir = tempfile::tempdir().unwrap();
    let mut model = Model::new(comp, 0.01, Role::Prover, witness_path(&dir));

    let x = Tensor::from_vec(vec![2.0, 4.0, 6.0]);
    let mask = Tensor::from_vec(vec![1.0, 0.0, 1.0]);
    let inputs = [x, mask];

    model.preprocess(&inputs).unwrap();
    let (precise, result) = model.forward(&inputs).unwrap();

    assert!(precise);
    // mean over [2, 0, 6]
    assert!((result.item().unwrap() - 8.0 / 3.0).abs() < 1e-12);
}

#[test]
fn replay_with_drifted_inputs_is_not_precise() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = Model::new(mean_comp, 0.01, Role::Prover, witness_path(&dir));

    model
        .preprocess(&[Tensor::from_vec(vec![1.0, 2.0, 3.0])])
        .unwrap();

    // Recorded mean is 2.0; replay-time inputs say 5.0.
    let (precise, result) = model
        .forward(&[Tensor::from_vec(vec![4.0, 5.0, 6.0])])
        .unwrap();

    assert!(!precise);
    assert_eq!(result.item().unwrap(), 2.0);
}

#[test]
fn one_failed_check_poisons_the_aggregate() {
    // Two-op chain: the median check passes, the forged mean
    // check fails, and the AND over both must come out false
    // while the session itself still succeeds.
    let comp = |state: &mut State, xs: &[Tensor]| -> Result<Tensor> {
        let med = state.median(&xs[0])?;
        state.mean(&med)
    };

    let dir = tempfile::tempdir().unwrap();
    let path = witness_path(&dir);
    let x = Tensor::from_vec(vec![4.0, 1.0, 3.0]);

    let mut prover = Model::new(comp, 0.01, Role::Prover, path.clone());
    prover.preprocess(std::slice::from_ref(&x)).unwrap();
    let (precise, _) = prover.forward(std::slice::from_ref(&x)).unwrap();
    assert!(precise);

    // Forge only the mean entry; median is not witness-backed
    // and reconstructs cleanly from the inputs.
    std::fs::write(&path, r#"{"Mean":[3.5]}"#).unwrap();

    let mut verifier = Model::new(comp, 0.01, Role::Verifier, path.clone());
    verifier.preprocess(std::slice::from_ref(&x)).unwrap();
    assert_eq!(verifier.state().op_count(), 2);

    let (precise, result) = verifier.forward(std::slice::from_ref(&x)).unwrap();
    assert!(!precise);
    assert_eq!(result.item().unwrap(), 3.5);
}

#[test]
fn kind_mismatch_between_passes_is_fatal() {
    // Branches on input length, so trace and replay disagree.
    let comp = |state: &mut State, xs: &[Tensor]| -> Result<Tensor> {
        if xs[0].len() > 2 {
            state.mean(&xs[0])
        } else {
            state.median(&xs[0])
        }
    };

    let dir = tempfile::tempdir().unwrap();
    let mut model = Model::new(comp, 0.01, Role::Prover, witness_path(&dir));

    model
        .preprocess(&[Tensor::from_vec(vec![1.0, 2.0, 3.0])])
        .unwrap();

    let err = model
        .forward(&[Tensor::from_vec(vec![1.0, 2.0])])
        .unwrap_err();
    assert!(matches!(err, Error::OpKindMismatch { index: 0, .. }));
}

#[test]
fn extra_replay_call_is_fatal() {
    let calls = Cell::new(0u32);
    let comp = |state: &mut State, xs: &[Tensor]| -> Result<Tensor> {
        calls.set(calls.get() + 1);
        let out = state.mean(&xs[0])?;
        if calls.get() > 1 {
            // second pass sneaks in an extra operation
            return state.mean(&out);
        }
        Ok(out)
    };

    let dir = tempfile::tempdir().unwrap();
    let mut model = Model::new(comp, 0.01, Role::Prover, witness_path(&dir));

    let x = Tensor::from_vec(vec![1.0, 2.0, 3.0]);
    model.preprocess(std::slice::from_ref(&x)).unwrap();

    let err = model.forward(std::slice::from_ref(&x)).unwrap_err();
    assert!(matches!(err, Error::CursorOutOfBounds { cursor: 1, ops: 1 }));
}

#[test]
fn missing_replay_call_is_fatal() {
    let calls = Cell::new(0u32);
    let comp = |state: &mut State, xs: &[Tensor]| -> Result<Tensor> {
        calls.set(calls.get() + 1);
        let out = state.median(&xs[0])?;
        if calls.get() == 1 {
            return state.mean(&out);
        }
        Ok(out)
    };

    let dir = tempfile::tempdir().unwrap();
    let mut model = Model::new(comp, 0.01, Role::Prover, witness_path(&dir));

    let x = Tensor::from_vec(vec![1.0, 2.0, 3.0]);
    model.preprocess(std::slice::from_ref(&x)).unwrap();

    let err = model.forward(std::slice::from_ref(&x)).unwrap_err();
    assert!(matches!(err, Error::IncompleteReplay { replayed: 1, ops: 2 }));
}

#[test]
fn zero_operation_computation_is_vacuously_precise() {
    let comp = |_state: &mut State, xs: &[Tensor]| -> Result<Tensor> { Ok(xs[0].clone()) };

    let dir = tempfile::tempdir().unwrap();
    let mut model = Model::new(comp, 0.01, Role::Prover, witness_path(&dir));

    let x = Tensor::from_vec(vec![9.0, 8.0]);
    model.preprocess(std::slice::from_ref(&x)).unwrap();
    assert_eq!(model.state().op_count(), 0);

    let (precise, result) = model.forward(std::slice::from_ref(&x)).unwrap();
    assert!(precise);
    assert_eq!(result, x);
}

#[test]
fn forward_before_preprocess_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = Model::new(mean_comp, 0.01, Role::Prover, witness_path(&dir));

    let err = model
        .forward(&[Tensor::from_vec(vec![1.0, 2.0, 3.0])])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn two_input_statistics_replay() {
    let comp = |state: &mut State, xs: &[Tensor]| -> Result<Tensor> {
        state.linear_regression(&xs[0], &xs[1])
    };

    let dir = tempfile::tempdir().unwrap();
    let mut model = Model::new(comp, 0.01, Role::Prover, witness_path(&dir));

    let inputs = [
        Tensor::from_vec(vec![1.0, 2.0, 3.0]),
        Tensor::from_vec(vec![3.0, 5.0, 7.0]),
    ];
    model.preprocess(&inputs).unwrap();

    let (precise, result) = model.forward(&inputs).unwrap();
    assert!(precise);
    assert_eq!(result.shape(), &[2]);
    assert!((result.data()[0] - 2.0).abs() < 1e-12);
    assert!((result.data()[1] - 1.0).abs() < 1e-12);
}
