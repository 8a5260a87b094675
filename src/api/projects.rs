use crate::{
    api::ApiClient,
    error::{ApiError, Error},
    model::{ListEnvelope, Project},
};

impl ApiClient {
    pub async fn fetch_projects(&self) -> Result<ListEnvelope<Project>, Error> {
        let response = self
            .client
            .get(self.url("/projects"))
            .send()
            .await
            .map_err(ApiError::Transport)?;
        Self::decode(response).await
    }

    pub async fn search_projects(&self, query: &str) -> Result<ListEnvelope<Project>, Error> {
        let response = self
            .client
            .get(self.url("/projects"))
            .query(&[("search", query)])
            .send()
            .await
            .map_err(ApiError::Transport)?;
        Self::decode(response).await
    }
}
