use guestdrop_core::models::{Event, NewEvent};
use guestdrop_core::AppError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Repository for the event registry document
///
/// Writes are serialized through one async mutex and replace the document
/// atomically, so concurrent creates never lose records and readers never see
/// a half-written file.
#[derive(Clone)]
pub struct EventRepository {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl EventRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an event with a fresh id and persist it
    #[tracing::instrument(skip(self, new_event), fields(db.table = "events", db.operation = "insert"))]
    pub async fn create(&self, new_event: NewEvent) -> Result<Event, AppError> {
        let _guard = self.write_lock.lock().await;

        // Never overwrite a document we could not parse.
        let mut events = self.read_document().await.map_err(|e| {
            tracing::error!(error = %e, path = %self.path.display(), "Event registry unreadable");
            AppError::Persistence(format!("Event registry unreadable: {}", e))
        })?;

        let event = Event::new(new_event);
        events.push(event.clone());

        self.write_document(&events).await.map_err(|e| {
            tracing::error!(error = %e, path = %self.path.display(), "Failed to write event registry");
            AppError::Persistence(e.to_string())
        })?;

        tracing::info!(event_id = %event.id, total = events.len(), "Event created");

        Ok(event)
    }

    /// Get event by ID
    #[tracing::instrument(skip(self), fields(db.table = "events", db.operation = "select", db.record_id = %id))]
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        let events = self.load_or_empty().await;
        Ok(events.into_iter().find(|event| event.id == id))
    }

    /// List all events in creation order
    #[tracing::instrument(skip(self), fields(db.table = "events", db.operation = "select"))]
    pub async fn list_all(&self) -> Result<Vec<Event>, AppError> {
        Ok(self.load_or_empty().await)
    }

    async fn load_or_empty(&self) -> Vec<Event> {
        match self.read_document().await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "Event registry unreadable, treating as empty"
                );
                Vec::new()
            }
        }
    }

    async fn read_document(&self) -> Result<Vec<Event>, anyhow::Error> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if raw.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_slice(&raw)?)
    }

    /// Write the whole collection to a sibling temp file, then rename it over the document.
    async fn write_document(&self, events: &[Event]) -> Result<(), anyhow::Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).await?;

        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid registry path: {}", self.path.display()))?;
        let temp_path = dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

        let body = serde_json::to_vec_pretty(events)?;

        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&body).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &self.path).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_event(name: &str) -> NewEvent {
        NewEvent {
            name: name.to_string(),
            date: "2024-06-01".to_string(),
            place: "Garden".to_string(),
            bg: "https://cdn.example.com/backgrounds/1_bg.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let dir = tempdir().unwrap();
        let repo = EventRepository::new(dir.path().join("events.json"));

        let created = repo.create(new_event("Wedding")).await.unwrap();
        let found = repo.find_by_id(&created.id).await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_registry() {
        let dir = tempdir().unwrap();
        let repo = EventRepository::new(dir.path().join("nested/events.json"));

        assert!(repo.list_all().await.unwrap().is_empty());
        assert_eq!(repo.find_by_id("nope").await.unwrap(), None);

        // First write creates the parent directory
        repo.create(new_event("Party")).await.unwrap();
        assert!(dir.path().join("nested/events.json").exists());
    }

    #[tokio::test]
    async fn test_list_preserves_creation_order() {
        let dir = tempdir().unwrap();
        let repo = EventRepository::new(dir.path().join("events.json"));

        for name in ["first", "second", "third"] {
            repo.create(new_event(name)).await.unwrap();
        }

        let names: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_concurrent_creates_keep_every_record() {
        let dir = tempdir().unwrap();
        let repo = EventRepository::new(dir.path().join("events.json"));

        let creates = (0..8).map(|i| {
            let repo = repo.clone();
            async move { repo.create(new_event(&format!("event-{}", i))).await }
        });
        let results = futures::future::join_all(creates).await;
        assert!(results.iter().all(|r| r.is_ok()));

        assert_eq!(repo.list_all().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_corrupt_document_reads_empty_but_blocks_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let repo = EventRepository::new(&path);

        assert!(repo.list_all().await.unwrap().is_empty());
        assert_eq!(repo.find_by_id("anything").await.unwrap(), None);

        let result = repo.create(new_event("Party")).await;
        assert!(matches!(result, Err(AppError::Persistence(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"{ not json");
    }

    #[tokio::test]
    async fn test_document_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.json");

        let created = EventRepository::new(&path)
            .create(new_event("Gala"))
            .await
            .unwrap();

        let reopened = EventRepository::new(&path);
        assert_eq!(reopened.find_by_id(&created.id).await.unwrap(), Some(created));

        // No temp files left beside the document
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_reads_registry_written_as_plain_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.json");
        std::fs::write(
            &path,
            r#"[{"id":"abc","name":"Old","date":"2023-01-01","place":"Hall","bg":"https://x/bg.jpg"}]"#,
        )
        .unwrap();

        let repo = EventRepository::new(&path);
        let event = repo.find_by_id("abc").await.unwrap().unwrap();
        assert_eq!(event.name, "Old");
    }
}
