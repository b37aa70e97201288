// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and run
//! whenever a database is opened.

use alumnet_core::AlumnetError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), AlumnetError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| AlumnetError::Storage {
            source: Box::new(e),
        })?;
    tracing::debug!(
        applied = report.applied_migrations().len(),
        "database migrations complete"
    );
    Ok(())
}
