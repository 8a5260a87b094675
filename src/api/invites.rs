use crate::{
    api::ApiClient,
    error::{ApiError, Error},
    model::{
        InviteOutcome, InviteRequest, InvitedUser, Paged, RecordEnvelope, ResendOutcome,
        ResendRequest, UserUpdate,
    },
};

impl ApiClient {
    pub async fn fetch_invited_users(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Paged<InvitedUser>, Error> {
        let response = self
            .client
            .get(self.url("/users"))
            .query(&[("page", page.to_string()), ("limit", limit.to_string())])
            .send()
            .await
            .map_err(ApiError::Transport)?;
        Self::decode(response).await
    }

    pub async fn search_invited_users(
        &self,
        page: u32,
        limit: u32,
        query: &str,
    ) -> Result<Paged<InvitedUser>, Error> {
        let response = self
            .client
            .get(self.url("/users/search"))
            .query(&[
                ("page", page.to_string()),
                ("limit", limit.to_string()),
                ("query", query.to_owned()),
            ])
            .send()
            .await
            .map_err(ApiError::Transport)?;
        Self::decode(response).await
    }

    pub async fn send_invite(&self, request: &InviteRequest) -> Result<InviteOutcome, Error> {
        let response = self
            .client
            .post(self.url("/invite"))
            .json(request)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        Self::decode(response).await
    }

    pub async fn resend_invite(&self, request: &ResendRequest) -> Result<ResendOutcome, Error> {
        let response = self
            .client
            .post(self.url("/invite/resend"))
            .json(request)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        Self::decode(response).await
    }

    pub async fn update_user(
        &self,
        uuid: &str,
        update: &UserUpdate,
    ) -> Result<RecordEnvelope<InvitedUser>, Error> {
        let response = self
            .client
            .put(self.url(&format!("/users/{}", uuid)))
            .json(update)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        Self::decode(response).await
    }
}
