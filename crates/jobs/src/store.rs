use async_trait::async_trait;
use parking_lot::RwLock;
use types::ScheduleRow;

/// Persistence boundary. A run replaces the whole schedule or leaves it alone.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn replace_all(&self, rows: Vec<ScheduleRow>) -> anyhow::Result<()>;
    async fn load(&self) -> anyhow::Result<Vec<ScheduleRow>>;
}

#[derive(Default)]
pub struct InMemStore {
    rows: RwLock<Vec<ScheduleRow>>,
}

impl InMemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<ScheduleRow>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl ScheduleStore for InMemStore {
    async fn replace_all(&self, rows: Vec<ScheduleRow>) -> anyhow::Result<()> {
        *self.rows.write() = rows;
        Ok(())
    }

    async fn load(&self) -> anyhow::Result<Vec<ScheduleRow>> {
        Ok(self.rows.read().clone())
    }
}
