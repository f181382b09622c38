use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use jobs::ScheduleStore;
use types::ScheduleRow;

/// Schedule rows as one JSON array on disk, rewritten whole on every run.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ScheduleStore for JsonFileStore {
    async fn replace_all(&self, rows: Vec<ScheduleRow>) -> anyhow::Result<()> {
        let body = serde_json::to_vec_pretty(&rows)?;
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("writing {}", self.path.display()))
    }

    async fn load(&self) -> anyhow::Result<Vec<ScheduleRow>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing {}", self.path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{ClassId, Day, SubjectId, TeacherId};

    fn row(day: Day) -> ScheduleRow {
        ScheduleRow {
            class_id: ClassId(1),
            subject_id: SubjectId(1),
            teacher_id: TeacherId(1),
            batch_id: None,
            is_lab: false,
            day,
            start_time: "08:30".into(),
            end_time: "09:30".into(),
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("rows.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_overwrites_previous_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("rows.json"));
        store
            .replace_all(vec![row(Day::Mon), row(Day::Tue)])
            .await
            .unwrap();
        store.replace_all(vec![row(Day::Fri)]).await.unwrap();
        assert_eq!(store.load().await.unwrap(), vec![row(Day::Fri)]);
    }
}
