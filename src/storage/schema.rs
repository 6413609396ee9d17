use rusqlite::Connection;

pub mod tables {
    pub const PAGES: &str = "pages";

    pub const ALL_TABLES: &[&str] = &[PAGES];
}

pub mod columns {
    pub const DAY: &str = "day";
    pub const PAGE: &str = "page";
    pub const BODY: &str = "body";
    pub const FETCHED_AT: &str = "fetched_at";
}

pub use columns::*;
pub use tables::*;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pages (
    day TEXT NOT NULL,
    page INTEGER NOT NULL,
    body TEXT NOT NULL,
    fetched_at INTEGER NOT NULL,
    PRIMARY KEY (day, page)
);
"#;

pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}
