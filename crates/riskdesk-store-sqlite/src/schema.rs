//! SQL schema for the SQLite record store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per named table; headers is a JSON array of column names.
CREATE TABLE IF NOT EXISTS sheets (
    name    TEXT PRIMARY KEY,
    headers TEXT NOT NULL
);

-- Data rows in insertion order; cells is a JSON array of strings.
CREATE TABLE IF NOT EXISTS sheet_rows (
    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    sheet  TEXT NOT NULL REFERENCES sheets(name),
    cells  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS sheet_rows_sheet_idx ON sheet_rows(sheet, row_id);

PRAGMA user_version = 1;
";
