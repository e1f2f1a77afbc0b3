pub mod migrations;
pub mod schema;

use crate::error::Result;
use crate::models::ConditionRecord;
use rusqlite::Connection;
use std::path::Path;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open a database and bring its schema up to date.
    pub fn open_migrated(path: &Path) -> rusqlite::Result<Self> {
        let db = Self::open(path)?;
        migrations::run(db.connection())?;
        Ok(db)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn load_conditions(&self) -> Result<Vec<ConditionRecord>> {
        Ok(ConditionRecord::load_all(&self.conn)?)
    }

    pub fn save_conditions(&mut self, records: &[ConditionRecord]) -> Result<()> {
        ConditionRecord::save_all(&mut self.conn, records)
    }
}
