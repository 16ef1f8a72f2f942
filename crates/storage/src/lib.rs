use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::{
    domain::{Category, Event, EventId},
    protocol::UpdateEventData,
};

const EVENT_COLUMNS: &str =
    "id, title, date, time, notes, category, archived, created_at, updated_at";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct NewEvent<'a> {
    pub title: &'a str,
    pub date: &'a str,
    pub time: &'a str,
    pub notes: Option<&'a str>,
    pub category: Category,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// All events in insertion order.
    pub async fn list_events(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY seq ASC"))
            .fetch_all(&self.pool)
            .await
            .context("failed to list events")?;
        rows.iter().map(event_from_row).collect()
    }

    pub async fn get_event(&self, id: &EventId) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    pub async fn insert_event(&self, new_event: NewEvent<'_>) -> Result<Event> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO events (id, title, date, time, notes, category, archived, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&id)
        .bind(new_event.title)
        .bind(new_event.date)
        .bind(new_event.time)
        .bind(new_event.notes)
        .bind(new_event.category.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert event")?;
        event_from_row(&row)
    }

    /// Applies the present fields of `changes`; returns `None` for an unknown id.
    pub async fn update_event(
        &self,
        id: &EventId,
        changes: &UpdateEventData,
    ) -> Result<Option<Event>> {
        let row = sqlx::query(&format!(
            "UPDATE events SET
                title = COALESCE(?, title),
                date = COALESCE(?, date),
                time = COALESCE(?, time),
                notes = COALESCE(?, notes),
                archived = COALESCE(?, archived),
                category = COALESCE(?, category),
                updated_at = ?
             WHERE id = ?
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(changes.title.as_deref())
        .bind(changes.date.as_deref())
        .bind(changes.time.as_deref())
        .bind(changes.notes.as_deref())
        .bind(changes.archived)
        .bind(changes.category.map(Category::as_str))
        .bind(Utc::now())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to update event {id}"))?;
        row.as_ref().map(event_from_row).transpose()
    }

    pub async fn toggle_archived(&self, id: &EventId) -> Result<Option<Event>> {
        let row = sqlx::query(&format!(
            "UPDATE events SET archived = NOT archived, updated_at = ?
             WHERE id = ?
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to toggle archived flag of event {id}"))?;
        row.as_ref().map(event_from_row).transpose()
    }

    /// Returns whether a row was removed.
    pub async fn delete_event(&self, id: &EventId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete event {id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn event_from_row(row: &SqliteRow) -> Result<Event> {
    let category = row.try_get::<String, _>("category")?;
    Ok(Event {
        id: EventId(row.try_get("id")?),
        title: row.try_get("title")?,
        date: row.try_get("date")?,
        time: row.try_get("time")?,
        notes: row.try_get("notes")?,
        category: category
            .parse()
            .with_context(|| format!("stored event has an invalid category '{category}'"))?,
        archived: row.try_get::<bool, _>("archived")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

/// Creates the directory a file-backed sqlite url points into. Other urls are left alone.
pub fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

pub fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
