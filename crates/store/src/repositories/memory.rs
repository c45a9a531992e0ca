use tokio::sync::RwLock;

use autostream_core::domain::lead::Lead;

use super::{LeadRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryLeadRepository {
    leads: RwLock<Vec<Lead>>,
}

#[async_trait::async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn append(&self, lead: &Lead) -> Result<(), RepositoryError> {
        let mut leads = self.leads.write().await;
        leads.push(lead.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Lead>, RepositoryError> {
        let leads = self.leads.read().await;
        Ok(leads.clone())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use autostream_core::domain::lead::Lead;

    use crate::repositories::{InMemoryLeadRepository, LeadRepository};

    #[tokio::test]
    async fn in_memory_repository_preserves_append_order() {
        let repo = InMemoryLeadRepository::default();
        let first = Lead::capture("Ada", "ada@example.com", "YouTube").expect("valid lead");
        let second = Lead::capture("Grace", "grace@example.com", "TikTok").expect("valid lead");

        repo.append(&first).await.expect("append first");
        repo.append(&second).await.expect("append second");

        let leads = repo.list().await.expect("list");
        assert_eq!(leads, vec![first, second]);
    }
}
