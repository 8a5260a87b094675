use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    api::ApiClient,
    error::{Error, InviteRejectedError},
    model::{
        InviteOutcome, InviteRequest, InvitedUser, Paged, ResendRequest, Role, UserUpdate,
    },
};

///One page of invited users plus the totals the backend reported for the
///whole result set.
#[derive(Debug, Clone)]
pub struct Listing {
    pub rows: Vec<InvitedUser>,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub total_rows: u64,
}

impl Default for Listing {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            page: 1,
            limit: 10,
            total_pages: 1,
            total_rows: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InviteState {
    pub listing: Listing,
    pub roles: Vec<Role>,
    pub loading: bool,
    pub error: Option<String>,
}

///State container for invited users and the cached role list. Each
///operation performs one data-access call and reduces the result into
///state.
pub struct InviteStore {
    api: Arc<ApiClient>,
    state: RwLock<InviteState>,
    //Monotonic stamp for listing loads. A completion whose stamp is no
    //longer current lost the race to a newer dispatch and is discarded.
    listing_generation: AtomicU64,
}

impl InviteStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: RwLock::new(InviteState::default()),
            listing_generation: AtomicU64::new(0),
        }
    }

    pub async fn snapshot(&self) -> InviteState {
        self.state.read().await.clone()
    }

    ///Replaces the listing wholesale with the requested page.
    pub async fn fetch_users(&self, page: u32, limit: u32) -> Result<(), Error> {
        let generation = self.begin_listing_load().await;
        let result = self.api.fetch_invited_users(page, limit).await;
        self.finish_listing_load(generation, page, limit, result)
            .await
    }

    ///Same reduction as fetch_users, against the search endpoint.
    pub async fn search_users(&self, page: u32, limit: u32, query: &str) -> Result<(), Error> {
        let generation = self.begin_listing_load().await;
        let result = self.api.search_invited_users(page, limit, query).await;
        self.finish_listing_load(generation, page, limit, result)
            .await
    }

    async fn begin_listing_load(&self) -> u64 {
        let generation = self.listing_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
        generation
    }

    async fn finish_listing_load(
        &self,
        generation: u64,
        page: u32,
        limit: u32,
        result: Result<Paged<InvitedUser>, Error>,
    ) -> Result<(), Error> {
        if self.listing_generation.load(Ordering::SeqCst) != generation {
            info!("discarding superseded listing response for page {}", page);
            return Ok(());
        }
        let mut state = self.state.write().await;
        match result {
            Ok(paged) => {
                state.listing = Listing {
                    rows: paged
                        .data
                        .into_iter()
                        .map(InvitedUser::normalized)
                        .collect(),
                    page,
                    limit,
                    total_pages: paged.total_pages.max(1),
                    total_rows: paged.total_rows,
                };
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

    ///Sends an invite. The listing is not touched; the caller re-fetches
    ///the current page once the backend has accepted.
    pub async fn send_invite(&self, request: &InviteRequest) -> Result<(), Error> {
        let outcome: InviteOutcome = self.api.send_invite(request).await?;
        if !outcome.success {
            return Err(InviteRejectedError::Rejected(outcome.message).into());
        }
        info!("invite sent to {} recipient(s)", request.emails.len());
        Ok(())
    }

    ///The first entry of the results array is authoritative; a reported
    ///failure becomes a rejection carrying the server's message.
    pub async fn resend_invite(&self, request: &ResendRequest) -> Result<(), Error> {
        let outcome = self.api.resend_invite(request).await?;
        let first = match outcome.results.into_iter().next() {
            Some(first) => first,
            None => return Err(InviteRejectedError::EmptyResults.into()),
        };
        if !first.success {
            return Err(InviteRejectedError::Rejected(first.message).into());
        }
        Ok(())
    }

    ///Replaces the matching listing row with the updated record. A record
    ///not on the current page is left for the next fetch to pick up.
    pub async fn update_user(&self, uuid: &str, update: &UserUpdate) -> Result<(), Error> {
        let updated = self.api.update_user(uuid, update).await?.data.normalized();
        let mut state = self.state.write().await;
        match state
            .listing
            .rows
            .iter_mut()
            .find(|row| row.get_uuid() == updated.get_uuid())
        {
            Some(row) => *row = updated,
            None => warn!("updated user {} is not on the current page", uuid),
        }
        Ok(())
    }

    pub async fn fetch_roles(&self) -> Result<(), Error> {
        let envelope = self.api.fetch_roles().await?;
        self.state.write().await.roles = envelope.data;
        Ok(())
    }
}
