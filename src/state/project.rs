use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{api::ApiClient, error::Error, model::Project};

#[derive(Debug, Clone, Default)]
pub struct ProjectState {
    pub projects: Vec<Project>,
    pub search_results: Vec<Project>,
    pub loading: bool,
    pub error: Option<String>,
}

///State container for the read-only project list. Fetch and search each
///overwrite their own result list.
pub struct ProjectStore {
    api: Arc<ApiClient>,
    state: RwLock<ProjectState>,
}

impl ProjectStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: RwLock::new(ProjectState::default()),
        }
    }

    pub async fn snapshot(&self) -> ProjectState {
        self.state.read().await.clone()
    }

    pub async fn fetch_projects(&self) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }
        let result = self.api.fetch_projects().await;
        let mut state = self.state.write().await;
        match result {
            Ok(envelope) => {
                state.projects = envelope
                    .data
                    .into_iter()
                    .map(Project::normalized)
                    .collect();
                state.loading = false;
                Ok(())
            }
            Err(err) => {
                state.loading = false;
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn search_projects(&self, query: &str) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }
        let result = self.api.search_projects(query).await;
        let mut state = self.state.write().await;
        match result {
            Ok(envelope) => {
                state.search_results = envelope
                    .data
                    .into_iter()
                    .map(Project::normalized)
                    .collect();
                state.loading = false;
                Ok(())
            }
            Err(err) => {
                state.loading = false;
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }
}
