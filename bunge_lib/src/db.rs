//! SQLite storage for scraped members and county membership lists.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::types::{CountyMember, MpRecord};

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Insert/update split for one upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
    pub inserted: usize,
    pub updated: usize,
}

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), DbError> {
        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DbError> {
        self.conn
            .query_row(
                "SELECT value FROM ingest_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO ingest_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn mp_count(&self) -> Result<i64, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(1) FROM mps", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Writes every record in one transaction, keyed by slug: existing rows
    /// are updated in place (keeping `created_at`), new ones inserted.
    /// Nothing is ever deleted.
    pub fn upsert_mps(&mut self, mps: &[MpRecord]) -> Result<UpsertCounts, DbError> {
        let now = Utc::now().to_rfc3339();
        let mut counts = UpsertCounts::default();
        let tx = self.conn.transaction()?;

        {
            let mut stmt_exists = tx.prepare("SELECT 1 FROM mps WHERE slug = ?1")?;
            let mut stmt_mp = tx.prepare(
                "INSERT INTO mps (
               slug,
               name,
               county,
               constituency,
               party,
               email,
               phone,
               bio,
               photo_url,
               profile_url,
               committees_json,
               education_json,
               employment_json,
               wiki_title,
               created_at,
               updated_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
             ON CONFLICT(slug) DO UPDATE SET
               name = excluded.name,
               county = excluded.county,
               constituency = excluded.constituency,
               party = excluded.party,
               email = excluded.email,
               phone = excluded.phone,
               bio = excluded.bio,
               photo_url = excluded.photo_url,
               profile_url = excluded.profile_url,
               committees_json = excluded.committees_json,
               education_json = excluded.education_json,
               employment_json = excluded.employment_json,
               wiki_title = excluded.wiki_title,
               updated_at = excluded.updated_at",
            )?;

            for mp in mps {
                let exists = stmt_exists
                    .query_row(params![mp.slug], |_| Ok(()))
                    .optional()?
                    .is_some();

                stmt_mp.execute(params![
                    mp.slug,
                    mp.name,
                    mp.county,
                    mp.constituency,
                    mp.party,
                    mp.email,
                    mp.phone,
                    mp.bio,
                    mp.photo_url,
                    mp.profile_url,
                    serde_json::to_string(&mp.committees)?,
                    serde_json::to_string(&mp.education)?,
                    serde_json::to_string(&mp.employment_history)?,
                    mp.wiki_title,
                    now,
                ])?;

                if exists {
                    counts.updated += 1;
                } else {
                    counts.inserted += 1;
                }
            }
        }

        tx.commit()?;
        Ok(counts)
    }

    /// Adds a county row if it is not already present. Returns whether a row
    /// was created.
    pub fn insert_county(&self, name: &str) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "INSERT INTO counties (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            params![name],
        )?;
        Ok(changed > 0)
    }

    /// Overwrites the membership list of every county in `by_county` that
    /// already has a row. Counties without a row are left alone. Returns the
    /// number of counties updated.
    pub fn update_county_members(
        &mut self,
        by_county: &BTreeMap<String, Vec<CountyMember>>,
    ) -> Result<usize, DbError> {
        let now = Utc::now().to_rfc3339();
        let mut updated = 0;
        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "UPDATE counties SET mps_json = ?1, updated_at = ?2 WHERE name = ?3",
            )?;
            for (county, members) in by_county {
                updated += stmt.execute(params![serde_json::to_string(members)?, now, county])?;
            }
        }

        tx.commit()?;
        Ok(updated)
    }

    pub fn county_members(&self, county: &str) -> Result<Option<Vec<CountyMember>>, DbError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT mps_json FROM counties WHERE name = ?1",
                params![county],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|j| serde_json::from_str(&j).map_err(DbError::from))
            .transpose()
    }

    pub fn get_mp(&self, slug: &str) -> Result<Option<MpRecord>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM mps WHERE slug = ?1", MP_COLUMNS),
                params![slug],
                DbMpRow::from_row,
            )
            .optional()?;
        row.map(DbMpRow::into_record).transpose()
    }

    /// Every stored member, optionally limited to one county, ordered by name.
    pub fn query_mps(&self, county: Option<&str>) -> Result<Vec<MpRecord>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM mps
             WHERE (?1 IS NULL OR county = ?1)
             ORDER BY name",
            MP_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![county], DbMpRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(DbMpRow::into_record).collect()
    }
}

const MP_COLUMNS: &str = "slug, name, county, constituency, party, email, phone, bio, photo_url,
     profile_url, committees_json, education_json, employment_json, wiki_title";

/// Raw `mps` row before the JSON list columns are decoded.
struct DbMpRow {
    slug: String,
    name: String,
    county: Option<String>,
    constituency: Option<String>,
    party: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    bio: Option<String>,
    photo_url: Option<String>,
    profile_url: String,
    committees_json: String,
    education_json: String,
    employment_json: String,
    wiki_title: String,
}

impl DbMpRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            slug: row.get(0)?,
            name: row.get(1)?,
            county: row.get(2)?,
            constituency: row.get(3)?,
            party: row.get(4)?,
            email: row.get(5)?,
            phone: row.get(6)?,
            bio: row.get(7)?,
            photo_url: row.get(8)?,
            profile_url: row.get(9)?,
            committees_json: row.get(10)?,
            education_json: row.get(11)?,
            employment_json: row.get(12)?,
            wiki_title: row.get(13)?,
        })
    }

    fn into_record(self) -> Result<MpRecord, DbError> {
        Ok(MpRecord {
            slug: self.slug,
            profile_url: self.profile_url,
            name: self.name,
            county: self.county,
            constituency: self.constituency,
            party: self.party,
            email: self.email,
            phone: self.phone,
            bio: self.bio,
            photo_url: self.photo_url,
            committees: serde_json::from_str(&self.committees_json)?,
            education: serde_json::from_str(&self.education_json)?,
            employment_history: serde_json::from_str(&self.employment_json)?,
            wiki_title: self.wiki_title,
        })
    }
}
