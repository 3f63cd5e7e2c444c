// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of zk-stats project.
// Copyright (C) 2025  Andrei Kochergin <zeek@tuta.com>
//
// Additional terms under GNU AGPL v3 section 7:
//   You must preserve this notice and the zk-stats
//   attribution in copies of this file or substantial
//   portions of it. See the NOTICE file for details.

//! Command-line interface for the zk-stats prover.
//!
//! Provides subcommands to run, prove and verify statistical
//! computations over JSON data files: a prover session records
//! the computation and persists its witness, a verifier session
//! replays the same computation against that witness.

#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use zk_stats::computation::State;
use zk_stats::error::Error as StatsError;
use zk_stats::ops::OpKind;
use zk_stats::tensor::Tensor;

mod prove;
mod run;
mod verify;

use prove::cmd_prove;
use run::cmd_run;
use verify::cmd_verify;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "zk-stats",
    about = r"# zk-stats CLI
# Copyright (c) Andrei Kochergin. All rights reserved.

Provable statistics: trace, prove and verify statistical
claims over private data within an error tolerance.",
    version
)]
struct Cli {
    /// Global JSON output
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    /// Global log level (trace|debug|info|warn|error)
    #[arg(
        long,
        global = true,
        default_value = "info",
        value_parser = ["trace","debug","info","warn","error"],
    )]
    log_level: String,
    /// Max input file size in bytes
    #[arg(long, global = true, default_value_t = 1_048_576)]
    max_bytes: usize,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Trace and replay a computation locally, print the verdict
    Run(RunArgs),
    /// Prover session: compute, check precision, persist witness
    Prove(ProveArgs),
    /// Verifier session: replay against a persisted witness
    Verify(VerifyArgs),
}

#[derive(clap::Args, Debug, Clone)]
struct RunArgs {
    /// Path to JSON data file (array of numeric arrays)
    path: PathBuf,
    /// Statistic to compute
    #[arg(long, value_enum)]
    stat: StatArg,
    /// Prefix the statistic with a conditional select using the
    /// last array in the data file as the filter
    #[arg(long, default_value_t = false)]
    filter: bool,
    /// Error tolerance for precision checks
    #[arg(long, default_value_t = zk_stats::DEFAULT_ERROR)]
    error: f64,
    /// Witness output path; defaults to a throwaway temp file
    #[arg(long)]
    witness: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
struct ProveArgs {
    /// Path to JSON data file (array of numeric arrays)
    path: PathBuf,
    /// Statistic to compute
    #[arg(long, value_enum)]
    stat: StatArg,
    /// Prefix the statistic with a conditional select using the
    /// last array in the data file as the filter
    #[arg(long, default_value_t = false)]
    filter: bool,
    /// Error tolerance for precision checks
    #[arg(long, default_value_t = zk_stats::DEFAULT_ERROR)]
    error: f64,
    /// Witness output path
    #[arg(long)]
    witness: PathBuf,
    /// Quiet mode (suppress non-essential output)
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

#[derive(clap::Args, Debug, Clone)]
struct VerifyArgs {
    /// Path to JSON data file; must match the shape the prover used
    path: PathBuf,
    /// Statistic the prover computed
    #[arg(long, value_enum)]
    stat: StatArg,
    /// Must match the prover's --filter flag
    #[arg(long, default_value_t = false)]
    filter: bool,
    /// Error tolerance; must match the prover's
    #[arg(long, default_value_t = zk_stats::DEFAULT_ERROR)]
    error: f64,
    /// Witness path written by the prover
    #[arg(long)]
    witness: PathBuf,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum StatArg {
    Mean,
    Median,
    GeometricMean,
    HarmonicMean,
    Mode,
    Pstdev,
    Pvariance,
    Stdev,
    Variance,
    Covariance,
    Correlation,
    LinearRegression,
    Where,
}

impl StatArg {
    fn kind(self) -> OpKind {
        match self {
            StatArg::Mean => OpKind::Mean,
            StatArg::Median => OpKind::Median,
            StatArg::GeometricMean => OpKind::GeometricMean,
            StatArg::HarmonicMean => OpKind::HarmonicMean,
            StatArg::Mode => OpKind::Mode,
            StatArg::Pstdev => OpKind::PStdev,
            StatArg::Pvariance => OpKind::PVariance,
            StatArg::Stdev => OpKind::Stdev,
            StatArg::Variance => OpKind::Variance,
            StatArg::Covariance => OpKind::Covariance,
            StatArg::Correlation => OpKind::Correlation,
            StatArg::LinearRegression => OpKind::LinearRegression,
            StatArg::Where => OpKind::Where,
        }
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("io error")]
    Io(#[from] io::Error),
    #[error("io error: {source}: {path}")]
    IoPath {
        #[source]
        source: io::Error,
        path: PathBuf,
    },
    #[error("data file malformed: {0}")]
    Data(#[from] serde_json::Error),
    #[error("session error: {0}")]
    Session(#[from] StatsError),
}

impl CliError {
    fn code(&self) -> i32 {
        match self {
            CliError::InvalidInput(_) | CliError::Data(_) => 2,
            CliError::Io(_) | CliError::IoPath { .. } => 5,
            CliError::Session(e) => match e {
                StatsError::CursorOutOfBounds { .. }
                | StatsError::OpKindMismatch { .. }
                | StatsError::IncompleteReplay { .. }
                | StatsError::CheckCountMismatch { .. } => 7,
                StatsError::WitnessIo { .. } => 5,
                _ => 4,
            },
        }
    }
}

fn try_main(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Run(args) => cmd_run(args, cli.json, cli.max_bytes),
        Command::Prove(args) => cmd_prove(args, cli.json, cli.max_bytes),
        Command::Verify(args) => cmd_verify(args, cli.json, cli.max_bytes),
    }
}

fn read_data(path: &Path, max_bytes: usize) -> Result<Vec<Tensor>, CliError> {
    let meta = fs::metadata(path).map_err(|e| CliError::IoPath {
        source: e,
        path: path.to_path_buf(),
    })?;

    if meta.len() as usize > max_bytes {
        return Err(CliError::InvalidInput(format!(
            "data file too large: {} bytes (limit {})",
            meta.len(),
            max_bytes
        )));
    }

    let raw = fs::read_to_string(path).map_err(|e| CliError::IoPath {
        source: e,
        path: path.to_path_buf(),
    })?;

    let arrays: Vec<Vec<f64>> = serde_json::from_str(&raw)?;
    if arrays.is_empty() {
        return Err(CliError::InvalidInput(
            "data file holds no arrays".to_string(),
        ));
    }

    Ok(arrays.into_iter().map(Tensor::from_vec).collect())
}

fn validate_inputs(stat: StatArg, filtered: bool, tensors: &[Tensor]) -> Result<(), CliError> {
    let kind = stat.kind();
    if filtered && kind.arity() != 1 {
        return Err(CliError::InvalidInput(format!(
            "--filter is only supported for single-input statistics, not {kind}"
        )));
    }

    let needed = kind.arity() + usize::from(filtered);
    if tensors.len() < needed {
        return Err(CliError::InvalidInput(format!(
            "{kind} needs {needed} arrays in the data file, got {}",
            tensors.len()
        )));
    }

    Ok(())
}

/// Build the computation definition driven by the CLI flags.
/// Must stay deterministic for fixed inputs: both passes of a
/// session run this exact closure.
fn computation_for(
    stat: StatArg,
    filtered: bool,
) -> impl Fn(&mut State, &[Tensor]) -> zk_stats::error::Result<Tensor> {
    move |state: &mut State, inputs: &[Tensor]| {
        let kind = stat.kind();
        let first = inputs
            .first()
            .ok_or(StatsError::InvalidInput("data file holds no tensors"))?;

        let lead = if filtered && kind.arity() == 1 {
            let mask = inputs
                .last()
                .ok_or(StatsError::InvalidInput("missing filter tensor"))?;
            state.where_select(mask, first)?
        } else {
            first.clone()
        };

        let second = || {
            inputs
                .get(1)
                .ok_or(StatsError::InvalidInput("statistic requires two tensors"))
        };

        match kind {
            OpKind::Mean => state.mean(&lead),
            OpKind::Median => state.median(&lead),
            OpKind::GeometricMean => state.geometric_mean(&lead),
            OpKind::HarmonicMean => state.harmonic_mean(&lead),
            OpKind::Mode => state.mode(&lead),
            OpKind::PStdev => state.pstdev(&lead),
            OpKind::PVariance => state.pvariance(&lead),
            OpKind::Stdev => state.stdev(&lead),
            OpKind::Variance => state.variance(&lead),
            OpKind::Covariance => state.covariance(&lead, second()?),
            OpKind::Correlation => state.correlation(&lead, second()?),
            OpKind::LinearRegression => state.linear_regression(&lead, second()?),
            OpKind::Where => state.where_select(&lead, second()?),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    zk_stats::logging::init_with_level(Some(&cli.log_level));

    let code = match try_main(cli.clone()) {
        Ok(()) => 0,
        Err(e) => {
            let code = e.code();
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "ok": false, "error": e.to_string(), "code": code })
                );
            } else {
                eprintln!("error: {e}");
            }

            code
        }
    };

    std::process::exit(code);
}
