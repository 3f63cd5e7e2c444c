// SPDX-License-Identifier: AGPL-3.0-or-later
// This file is part of zk-stats project.
// Copyright (C) 2025  Andrei Kochergin <zeek@tuta.com>
//
// Additional terms under GNU AGPL v3 section 7:
//   You must preserve this notice and the zk-stats
//   attribution in copies of this file or substantial
//   portions of it. See the NOTICE file for details.

use std::io;
use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Targets this workspace logs under. An explicit level is
/// scoped to these instead of turning on every dependency.
const SESSION_TARGETS: [&str; 3] = ["zk_stats", "stats", "cli"];

fn session_filter(level: &str) -> String {
    SESSION_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber once per process.
///
/// An explicit level takes precedence and applies to the session
/// targets only; otherwise `RUST_LOG` is used verbatim, falling
/// back to `info`. Diagnostics go to stderr so that JSON results
/// on stdout stay machine-readable.
pub fn init_with_level(level: Option<&str>) {
    INIT.call_once(|| {
        if tracing::dispatcher::has_been_set() {
            return;
        }

        let directives = match level {
            Some(l) if !l.is_empty() => session_filter(l),
            _ => std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        let filter = EnvFilter::try_new(&directives).unwrap_or_else(|e| {
            eprintln!("WARN: unusable log filter '{directives}': {e}; using 'info'");
            EnvFilter::new("info")
        });

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(true)
            .compact()
            .try_init();
    });
}
