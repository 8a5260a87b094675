use crate::{
    api::ApiClient,
    error::{ApiError, Error},
    model::{ListEnvelope, Role},
};

impl ApiClient {
    pub async fn fetch_roles(&self) -> Result<ListEnvelope<Role>, Error> {
        let response = self
            .client
            .get(self.url("/roles"))
            .send()
            .await
            .map_err(ApiError::Transport)?;
        Self::decode(response).await
    }
}
