/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::StoreError;
use crate::plugin_data::PluginDataStore;
use crate::store::{Row, SqlValue, StoreAdapter, StoreConnection};

/// The profile columns the site context draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistProfile {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    pub artist_avatar: Option<String>,
    pub artist_bio: Option<String>,
    pub social_links: Option<String>,
}

impl ArtistProfile {
    fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            id: row.integer("id")?,
            username: row.text("username").unwrap_or_default().to_string(),
            is_admin: row.boolean("is_admin").unwrap_or(false),
            artist_avatar: row.text("artist_avatar").map(str::to_string),
            artist_bio: row.text("artist_bio").map(str::to_string),
            social_links: row.text("social_links").map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistSummary {
    pub id: i64,
    pub username: String,
}

#[derive(Clone)]
pub struct ProfileStore {
    adapter: Arc<dyn StoreAdapter>,
}

impl ProfileStore {
    pub fn new(adapter: Arc<dyn StoreAdapter>) -> Self {
        Self { adapter }
    }

    /// Lowest-id administrator, if any.
    pub fn primary_artist(
        &self,
        conn: &mut dyn StoreConnection,
    ) -> Result<Option<ArtistProfile>, StoreError> {
        if !conn.table_exists("users")? {
            return Ok(None);
        }
        let sql = format!(
            "SELECT id, username, is_admin, artist_avatar, artist_bio, social_links FROM users WHERE is_admin = {} ORDER BY id ASC LIMIT 1",
            self.adapter.dialect().bool_literal(true)
        );
        Ok(conn
            .query_opt(&sql, &[])?
            .as_ref()
            .and_then(ArtistProfile::from_row))
    }

    pub fn list_artists(
        &self,
        conn: &mut dyn StoreConnection,
    ) -> Result<Vec<ArtistSummary>, StoreError> {
        let sql = format!(
            "SELECT id, username FROM users WHERE is_admin = {} ORDER BY username",
            self.adapter.dialect().bool_literal(true)
        );
        Ok(conn
            .query(&sql, &[])?
            .iter()
            .filter_map(|r| {
                Some(ArtistSummary {
                    id: r.integer("id")?,
                    username: r.text("username")?.to_string(),
                })
            })
            .collect())
    }

    pub fn insert_user(
        &self,
        conn: &mut dyn StoreConnection,
        username: &str,
        is_admin: bool,
    ) -> Result<i64, StoreError> {
        let sql = format!(
            "INSERT INTO users (username, is_admin) VALUES ({}, {})",
            self.adapter.placeholder(1),
            self.adapter.placeholder(2)
        );
        conn.execute(&sql, &[SqlValue::from(username), SqlValue::from(is_admin)])?;
        let lookup = format!("SELECT id FROM users WHERE username = {}", self.adapter.placeholder(1));
        conn.query_opt(&lookup, &[SqlValue::from(username)])?
            .and_then(|r| r.integer("id"))
            .ok_or_else(|| StoreError::query(format!("user {username} not found after insert")))
    }

    pub fn update_artist_profile(
        &self,
        conn: &mut dyn StoreConnection,
        user_id: i64,
        artist_avatar: Option<&str>,
        artist_bio: Option<&str>,
        social_links: Option<&str>,
    ) -> Result<bool, StoreError> {
        let sql = format!(
            "UPDATE users SET artist_avatar = {}, artist_bio = {}, social_links = {} WHERE id = {}",
            self.adapter.placeholder(1),
            self.adapter.placeholder(2),
            self.adapter.placeholder(3),
            self.adapter.placeholder(4)
        );
        let n = conn.execute(
            &sql,
            &[
                SqlValue::from(artist_avatar),
                SqlValue::from(artist_bio),
                SqlValue::from(social_links),
                SqlValue::from(user_id),
            ],
        )?;
        Ok(n > 0)
    }

    /// Removes a user and, first, every plugin data cell they own. Run inside
    /// one unit of work so a failure leaves both in place.
    pub fn delete_user(
        &self,
        conn: &mut dyn StoreConnection,
        plugin_data: &PluginDataStore,
        user_id: i64,
    ) -> Result<bool, StoreError> {
        let cells = plugin_data.delete_for_user(conn, user_id)?;
        let sql = format!("DELETE FROM users WHERE id = {}", self.adapter.placeholder(1));
        let n = conn.execute(&sql, &[SqlValue::from(user_id)])?;
        info!(user_id, plugin_cells = cells, "user deleted");
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{initialize, SeedValues};
    use crate::store::{with_unit_of_work, SqliteAdapter};
    use serde_json::json;

    fn setup(dir: &tempfile::TempDir) -> (Arc<dyn StoreAdapter>, ProfileStore) {
        let adapter: Arc<dyn StoreAdapter> = Arc::new(SqliteAdapter::new(dir.path().join("p.db")));
        initialize(adapter.as_ref(), &SeedValues::default()).unwrap();
        (adapter.clone(), ProfileStore::new(adapter))
    }

    #[test]
    fn primary_artist_is_lowest_id_admin() {
        let dir = tempfile::tempdir().unwrap();
        let (adapter, profiles) = setup(&dir);
        let artist = with_unit_of_work(adapter.as_ref(), |conn| {
            profiles.insert_user(conn, "client", false)?;
            let first = profiles.insert_user(conn, "mara", true)?;
            profiles.insert_user(conn, "bruno", true)?;
            profiles.update_artist_profile(conn, first, Some("/a.png"), Some("bio"), None)?;
            profiles.primary_artist(conn)
        })
        .unwrap()
        .unwrap();
        assert_eq!(artist.username, "mara");
        assert!(artist.is_admin);
        assert_eq!(artist.artist_avatar.as_deref(), Some("/a.png"));
        assert_eq!(artist.artist_bio.as_deref(), Some("bio"));
        assert_eq!(artist.social_links, None);
    }

    #[test]
    fn no_admin_means_no_primary_artist() {
        let dir = tempfile::tempdir().unwrap();
        let (adapter, profiles) = setup(&dir);
        let artist = with_unit_of_work(adapter.as_ref(), |conn| {
            profiles.insert_user(conn, "client", false)?;
            profiles.primary_artist(conn)
        })
        .unwrap();
        assert_eq!(artist, None);
    }

    #[test]
    fn missing_users_table_means_no_primary_artist() {
        let dir = tempfile::tempdir().unwrap();
        let adapter: Arc<dyn StoreAdapter> = Arc::new(SqliteAdapter::new(dir.path().join("empty.db")));
        let profiles = ProfileStore::new(adapter.clone());
        let mut conn = adapter.acquire().unwrap();
        assert_eq!(profiles.primary_artist(&mut *conn).unwrap(), None);
    }

    #[test]
    fn artists_are_sorted_by_username() {
        let dir = tempfile::tempdir().unwrap();
        let (adapter, profiles) = setup(&dir);
        let names = with_unit_of_work(adapter.as_ref(), |conn| {
            profiles.insert_user(conn, "zoe", true)?;
            profiles.insert_user(conn, "ana", true)?;
            profiles.insert_user(conn, "client", false)?;
            profiles.list_artists(conn)
        })
        .unwrap()
        .into_iter()
        .map(|a| a.username)
        .collect::<Vec<_>>();
        assert_eq!(names, vec!["ana", "zoe"]);
    }

    #[test]
    fn deleting_a_user_cascades_to_plugin_data() {
        let dir = tempfile::tempdir().unwrap();
        let (adapter, profiles) = setup(&dir);
        let data = PluginDataStore::new(adapter.clone());
        let (gone, kept) = with_unit_of_work(adapter.as_ref(), |conn| {
            Ok::<_, StoreError>((
                profiles.insert_user(conn, "gone", true)?,
                profiles.insert_user(conn, "kept", true)?,
            ))
        })
        .unwrap();
        data.upsert_value("contacts", Some(gone), "public_discord", &json!("x")).unwrap();
        data.upsert_value("contacts", Some(kept), "public_discord", &json!("y")).unwrap();

        let deleted = with_unit_of_work(adapter.as_ref(), |conn| {
            profiles.delete_user(conn, &data, gone)
        })
        .unwrap();
        assert!(deleted);

        let mut conn = adapter.acquire().unwrap();
        assert_eq!(data.get_value(&mut *conn, "contacts", Some(gone), "public_discord").unwrap(), None);
        assert!(data.get_value(&mut *conn, "contacts", Some(kept), "public_discord").unwrap().is_some());
    }
}
