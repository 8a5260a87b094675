use core::fmt;
use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use email_address::EmailAddress;
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
};
use tracing::{info, warn};

use crate::{
    config::Config,
    error::{Error, ValidationError},
    model::{InviteRequest, InvitedUser, ResendRequest, UserRole, UserUpdate},
    normalize::{canonical_uuid, split_emails},
    state::{InviteStore, ProjectStore},
};

#[derive(Debug)]
pub enum RequiredField {
    Project,
    Email,
    Role,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Project => "Project",
                Self::Email => "Email",
                Self::Role => "Role",
            }
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct InviteForm {
    pub project_uuid: String,
    pub email: String,
    pub role: String,
}

///Replacement values for an edit. None leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct EditUserForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageChange {
    Next,
    Previous,
}

///The invite dashboard: an invite form plus a paginated, searchable
///listing of invited users. Binds both stores and owns the interaction
///state (form fields, search term, page cursor).
pub struct Dashboard {
    invites: Arc<InviteStore>,
    projects: Arc<ProjectStore>,
    items_per_page: u32,
    debounce: Duration,
    form: RwLock<InviteForm>,
    search_term: RwLock<String>,
    current_page: AtomicU32,
    pending_search: Mutex<Option<JoinHandle<()>>>,
}

impl Dashboard {
    pub fn new(invites: Arc<InviteStore>, projects: Arc<ProjectStore>, config: &Config) -> Self {
        Self {
            invites,
            projects,
            items_per_page: config.get_items_per_page(),
            debounce: config.get_search_debounce(),
            form: RwLock::new(InviteForm::default()),
            search_term: RwLock::new(String::new()),
            current_page: AtomicU32::new(1),
            pending_search: Mutex::new(None),
        }
    }

    pub fn get_invites(&self) -> &Arc<InviteStore> {
        &self.invites
    }
    pub fn get_projects(&self) -> &Arc<ProjectStore> {
        &self.projects
    }
    pub fn get_items_per_page(&self) -> u32 {
        self.items_per_page
    }
    pub fn get_current_page(&self) -> u32 {
        self.current_page.load(Ordering::SeqCst)
    }
    pub async fn get_search_term(&self) -> String {
        self.search_term.read().await.to_owned()
    }
    pub async fn get_form(&self) -> InviteForm {
        self.form.read().await.clone()
    }

    ///Initial load: projects and roles for the form, first page of users
    ///for the table. Failures are surfaced through store state and the
    ///dashboard stays interactive.
    pub async fn mount(&self) {
        if let Err(err) = self.projects.fetch_projects().await {
            warn!("project fetch failed on mount: {}", err);
        }
        if let Err(err) = self.invites.fetch_roles().await {
            warn!("role fetch failed on mount: {}", err);
        }
        if let Err(err) = self.dispatch_listing().await {
            warn!("user fetch failed on mount: {}", err);
        }
    }

    ///Fetch or search at the current cursor, depending on whether a
    ///search term is active.
    pub async fn dispatch_listing(&self) -> Result<(), Error> {
        let page = self.get_current_page();
        let term = self.get_search_term().await;
        if term.is_empty() {
            self.invites.fetch_users(page, self.items_per_page).await
        } else {
            self.invites
                .search_users(page, self.items_per_page, &term)
                .await
        }
    }

    ///Records the new term and defers the dispatch until input has been
    ///quiet for the debounce interval. A newer edit cancels the pending
    ///timer, so one quiet window produces exactly one dispatch.
    pub async fn set_search_term(&self, term: &str) {
        let term = term.trim().to_owned();
        *self.search_term.write().await = term.to_owned();
        let invites = self.invites.to_owned();
        let page = self.get_current_page();
        let limit = self.items_per_page;
        let debounce = self.debounce;
        let mut pending = self.pending_search.lock().await;
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let result = if term.is_empty() {
                invites.fetch_users(page, limit).await
            } else {
                invites.search_users(page, limit, &term).await
            };
            if let Err(err) = result {
                warn!("deferred search dispatch failed: {}", err);
            }
        }));
    }

    ///Waits for a pending debounced dispatch, if any, to run to
    ///completion.
    pub async fn settled(&self) {
        let handle = self.pending_search.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    ///Moves the page cursor, clamped to [1, total pages], and re-issues
    ///the current fetch or search. Returns the page now in effect.
    pub async fn change_page(&self, change: PageChange) -> Result<u32, Error> {
        let total_pages = self.invites.snapshot().await.listing.total_pages.max(1);
        let current = self.get_current_page();
        let requested = match change {
            PageChange::Next => current.saturating_add(1).min(total_pages),
            PageChange::Previous => current.saturating_sub(1).max(1),
        };
        if requested != current {
            self.current_page.store(requested, Ordering::SeqCst);
            self.dispatch_listing().await?;
        }
        Ok(requested)
    }

    pub async fn set_form_project(&self, project_uuid: &str) {
        self.form.write().await.project_uuid = project_uuid.trim().to_owned();
    }
    pub async fn set_form_email(&self, email: &str) {
        self.form.write().await.email = email.trim().to_owned();
    }
    pub async fn set_form_role(&self, role: &str) {
        self.form.write().await.role = role.trim().to_owned();
    }

    ///Validates and submits the invite form. On acceptance the form is
    ///cleared and the current page re-fetched; on failure the form is
    ///left as entered.
    pub async fn submit(&self) -> Result<(), Error> {
        let form = self.get_form().await;
        let mut missing: Vec<RequiredField> = Vec::new();
        if form.project_uuid.is_empty() {
            missing.push(RequiredField::Project);
        }
        if form.email.is_empty() {
            missing.push(RequiredField::Email);
        }
        if form.role.is_empty() {
            missing.push(RequiredField::Role);
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(format!("{:?}", missing)).into());
        }
        let emails = split_emails(&form.email);
        if emails.is_empty() {
            return Err(
                ValidationError::MissingFields(format!("{:?}", [RequiredField::Email])).into(),
            );
        }
        for email in emails.iter() {
            if let Err(err) = EmailAddress::from_str(email) {
                return Err(ValidationError::InvalidEmail(format!("{}: {}", email, err)).into());
            }
        }
        let role = UserRole::from_str(&form.role)?;
        let request = InviteRequest {
            emails,
            role,
            project_uuid: canonical_uuid(&form.project_uuid),
        };
        self.invites.send_invite(&request).await?;
        *self.form.write().await = InviteForm::default();
        self.dispatch_listing().await?;
        Ok(())
    }

    ///Re-issues the invite behind a listing row. The listing itself is
    ///not refreshed; nothing about the row changed.
    pub async fn resend(&self, user: &InvitedUser) -> Result<(), Error> {
        let request = ResendRequest {
            emails: vec![user.get_email().to_owned()],
            project_uuid: user.get_project_uuid().to_owned(),
            role: user.get_role().to_owned(),
        };
        self.invites.resend_invite(&request).await?;
        info!("invite re-sent to {}", user.get_email());
        Ok(())
    }

    ///Submits only the fields that differ from the current row. A
    ///no-change edit is rejected before any network call.
    pub async fn edit(&self, user: &InvitedUser, form: EditUserForm) -> Result<(), Error> {
        let mut update = UserUpdate::default();
        if let Some(name) = form.name {
            let name = name.trim().to_owned();
            if !name.is_empty() && name != user.get_name() {
                update.name = Some(name);
            }
        }
        if let Some(email) = form.email {
            let email = email.trim().to_owned();
            if !email.is_empty() && email != user.get_email() {
                if let Err(err) = EmailAddress::from_str(&email) {
                    return Err(
                        ValidationError::InvalidEmail(format!("{}: {}", email, err)).into(),
                    );
                }
                update.email = Some(email);
            }
        }
        if let Some(role) = form.role {
            let role = UserRole::from_str(&role)?;
            if role.as_str() != user.get_role() {
                update.role = Some(role);
            }
        }
        if update.is_empty() {
            return Err(ValidationError::NoChanges.into());
        }
        self.invites.update_user(user.get_uuid(), &update).await?;
        self.dispatch_listing().await?;
        Ok(())
    }
}
