//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register tagged schema migration steps in strictly increasing order.
//! - Plan and apply pending steps atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - A fresh store (version 0) gets the latest layout directly.
//! - Stores older than [`RESET_CUTOFF_VERSION`] are dropped and recreated.
//! - Applied migration version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::{info, warn};
use rusqlite::Connection;

/// Stores with a version below this are reset instead of upgraded.
pub const RESET_CUTOFF_VERSION: u32 = 6;

const LATEST_LAYOUT_SQL: &str = include_str!("latest_layout.sql");

/// One tagged schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    /// Drops both catalog tables and recreates them empty.
    ///
    /// Data loss is the documented policy for installations this old.
    Reset { sql: &'static str },
    /// Adds one column with a safe default, then backfills unset rows.
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
        default_value: &'static str,
    },
}

impl MigrationStep {
    /// Stable step label used in logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reset { .. } => "reset",
            Self::AddColumn { .. } => "add_column",
        }
    }

    fn execute(&self, conn: &Connection) -> rusqlite::Result<()> {
        match self {
            Self::Reset { sql } => conn.execute_batch(sql),
            Self::AddColumn {
                table,
                column,
                definition,
                default_value,
            } => {
                conn.execute_batch(&format!(
                    "ALTER TABLE {table} ADD COLUMN {column} {definition};"
                ))?;
                conn.execute(
                    &format!("UPDATE {table} SET {column} = {default_value} WHERE {column} IS NULL;"),
                    [],
                )?;
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub step: MigrationStep,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: RESET_CUTOFF_VERSION,
        step: MigrationStep::Reset {
            sql: include_str!("0006_reset.sql"),
        },
    },
    Migration {
        version: 7,
        step: MigrationStep::AddColumn {
            table: "accounts",
            column: "enabled",
            definition: "INTEGER NOT NULL DEFAULT 1",
            default_value: "1",
        },
    },
];

/// What opening a store at a given version has to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationPlan {
    UpToDate,
    /// No prior layout; create the latest one directly.
    CreateLatest,
    /// Apply these steps in order.
    Upgrade(Vec<(u32, MigrationStep)>),
}

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Decides which steps apply to a store at `current_version`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the store is newer than this binary.
pub fn plan_migrations(current_version: u32) -> DbResult<MigrationPlan> {
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }
    if current_version == latest {
        return Ok(MigrationPlan::UpToDate);
    }
    if current_version == 0 {
        return Ok(MigrationPlan::CreateLatest);
    }

    let steps = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current_version)
        .map(|migration| (migration.version, migration.step))
        .collect();
    Ok(MigrationPlan::Upgrade(steps))
}

/// Applies all pending migrations on the provided connection.
///
/// Everything runs in one transaction; on failure nothing is committed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    let plan = plan_migrations(current_version)?;
    if plan == MigrationPlan::UpToDate {
        return Ok(());
    }

    let tx = conn.transaction()?;
    match plan {
        MigrationPlan::UpToDate => {}
        MigrationPlan::CreateLatest => {
            tx.execute_batch(LATEST_LAYOUT_SQL)
                .map_err(|source| DbError::Migration {
                    version: latest,
                    step: "create_latest",
                    source,
                })?;
            set_user_version(&tx, latest)?;
            info!("event=db_migrate module=db status=ok step=create_latest version={latest}");
        }
        MigrationPlan::Upgrade(steps) => {
            for (version, step) in steps {
                if matches!(step, MigrationStep::Reset { .. }) {
                    warn!(
                        "event=db_migrate module=db status=reset from_version={current_version} version={version}"
                    );
                }
                step.execute(&tx).map_err(|source| DbError::Migration {
                    version,
                    step: step.label(),
                    source,
                })?;
                set_user_version(&tx, version)?;
                info!(
                    "event=db_migrate module=db status=ok step={} version={}",
                    step.label(),
                    version
                );
            }
        }
    }
    tx.commit()?;

    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn set_user_version(conn: &Connection, version: u32) -> DbResult<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{latest_version, plan_migrations, MigrationPlan, MigrationStep};
    use crate::db::DbError;

    #[test]
    fn fresh_store_creates_latest_layout() {
        assert_eq!(plan_migrations(0).unwrap(), MigrationPlan::CreateLatest);
    }

    #[test]
    fn old_store_resets_before_adding_column() {
        let MigrationPlan::Upgrade(steps) = plan_migrations(5).unwrap() else {
            panic!("version 5 must upgrade");
        };
        let labels: Vec<_> = steps.iter().map(|(_, step)| step.label()).collect();
        assert_eq!(labels, ["reset", "add_column"]);
    }

    #[test]
    fn version_six_only_adds_column() {
        let MigrationPlan::Upgrade(steps) = plan_migrations(6).unwrap() else {
            panic!("version 6 must upgrade");
        };
        assert_eq!(steps.len(), 1);
        assert!(matches!(
            steps[0].1,
            MigrationStep::AddColumn {
                column: "enabled",
                ..
            }
        ));
    }

    #[test]
    fn latest_is_up_to_date_and_newer_is_rejected() {
        assert_eq!(latest_version(), 7);
        assert_eq!(plan_migrations(7).unwrap(), MigrationPlan::UpToDate);
        assert!(matches!(
            plan_migrations(8),
            Err(DbError::UnsupportedSchemaVersion { db_version: 8, .. })
        ));
    }
}
