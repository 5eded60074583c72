use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::AppError;
use crate::ident;
use crate::persistence::repo::{ExecutionStore, StatsDelta};
use crate::run::model::{ExecutionRun, RunStatus};

pub struct RunOperations {
    pub(crate) store: Arc<dyn ExecutionStore>,
}

impl RunOperations {
    pub async fn create(&self, run: ExecutionRun) -> Result<ExecutionRun, AppError> {
        self.store.put_run(run).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<ExecutionRun>, AppError> {
        self.store.get_run(id).await
    }

    /// Dual addressing: the identifier is tried as an internal id first,
    /// then as a public run code when its shape allows one. A lookup by a
    /// value that matches neither namespace is a miss, never an error.
    pub async fn resolve(&self, identifier: &str) -> Result<Option<ExecutionRun>, AppError> {
        match self.store.get_run(identifier).await? {
            Some(run) => Ok(Some(run)),
            None => {
                if ident::looks_like_run_code(identifier) {
                    self.store.find_run_by_code(identifier).await
                } else {
                    Ok(None)
                }
            }
        }
    }

    pub async fn list(&self, limit: i32) -> Result<Vec<ExecutionRun>, AppError> {
        self.store.list_runs(limit).await
    }

    pub async fn apply_stats(&self, run_id: &str, delta: StatsDelta) -> Result<(), AppError> {
        if delta.is_empty() {
            return Ok(());
        }
        self.store.apply_run_stats(run_id, delta).await
    }

    pub async fn seal(
        &self,
        run_id: &str,
        status: RunStatus,
        finished_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.store.seal_run(run_id, status, finished_at).await
    }
}

#[cfg(test)]
mod tests {
    use crate::persistence::repo::Repository;
    use crate::run::model::ExecutionRun;

    fn sample_run() -> ExecutionRun {
        ExecutionRun::builder()
            .run_code("A3F9K2M".to_string())
            .browser("chrome".to_string())
            .build()
    }

    #[tokio::test]
    async fn resolve_finds_by_internal_id() {
        let repository = Repository::in_memory();
        let run = repository.runs().create(sample_run()).await.unwrap();

        let resolved = repository.runs().resolve(&run.id).await.unwrap().unwrap();
        assert_eq!(resolved.id, run.id);
    }

    #[tokio::test]
    async fn resolve_falls_back_to_the_public_code() {
        let repository = Repository::in_memory();
        let run = repository.runs().create(sample_run()).await.unwrap();

        let resolved = repository.runs().resolve("A3F9K2M").await.unwrap().unwrap();
        assert_eq!(resolved.id, run.id);
    }

    #[tokio::test]
    async fn resolve_misses_when_the_shape_rules_out_a_code() {
        let repository = Repository::in_memory();
        repository.runs().create(sample_run()).await.unwrap();

        // lowercase and wrong length never reach the code lookup
        assert!(repository.runs().resolve("a3f9k2m").await.unwrap().is_none());
        assert!(repository.runs().resolve("A3F9K2M9").await.unwrap().is_none());
        assert!(repository.runs().resolve("unknown-id").await.unwrap().is_none());
    }
}
