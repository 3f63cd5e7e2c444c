// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of zk-stats project.
// Copyright (C) 2025  Andrei Kochergin <zeek@tuta.com>
//
// Additional terms under GNU AGPL v3 section 7:
//   You must preserve this notice and the zk-stats
//   attribution in copies of this file or substantial
//   portions of it. See the NOTICE file for details.

use crate::{CliError, RunArgs};

use std::fs;

use zk_stats::model::Model;
use zk_stats::witness::Role;

pub fn cmd_run(args: RunArgs, json: bool, max_bytes: usize) -> Result<(), CliError> {
    let t_start = std::time::Instant::now();

    let tensors = crate::read_data(&args.path, max_bytes)?;
    crate::validate_inputs(args.stat, args.filter, &tensors)?;
    tracing::debug!(target: "cli.run", tensors = tensors.len(), "loaded data file");

    let (witness_path, throwaway) = match args.witness {
        Some(path) => (path, false),
        None => {
            let path = std::env::temp_dir().join(format!(
                "zk-stats-run-{}.witness.json",
                std::process::id()
            ));
            (path, true)
        }
    };

    let computation = crate::computation_for(args.stat, args.filter);
    let mut model = Model::new(computation, args.error, Role::Prover, witness_path.clone());

    model.preprocess(&tensors)?;
    let outcome = model.forward(&tensors);

    if throwaway {
        let _ = fs::remove_file(&witness_path);
    }

    let (precise, result) = outcome?;
    let elapsed_ms = t_start.elapsed().as_millis();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "precise": precise,
                "result": result.data(),
                "ops": model.state().op_count(),
                "time_ms": elapsed_ms,
            })
        );
    } else {
        println!("precise: {precise}");
        println!("result: {:?}", result.data());
        println!("time: {elapsed_ms} ms");
    }

    Ok(())
}
