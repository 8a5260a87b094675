use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::ValidationError, normalize::canonical_uuid};

///The closed set of roles an invite can carry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SuperAdmin,
    Admin,
    Member,
}

impl UserRole {
    ///Folds operator input into the closed set. Case is ignored and the
    ///common misspellings of super_admin are accepted. Anything else is
    ///rejected.
    pub fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "super_admin" | "super admin" | "superadmin" => Some(Self::SuperAdmin),
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match Self::normalize(raw) {
            Some(role) => Ok(role),
            None => Err(ValidationError::InvalidRole(raw.to_owned())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvitedUser {
    uuid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    project_uuid: String,
}

impl InvitedUser {
    pub fn new(
        uuid: String,
        name: String,
        email: String,
        role: String,
        project_uuid: String,
    ) -> Self {
        Self {
            uuid,
            name,
            email,
            role,
            project_uuid,
        }
    }
    ///Record identifiers as served are not reliably hyphenated.
    pub fn normalized(mut self) -> Self {
        self.uuid = canonical_uuid(&self.uuid);
        self.project_uuid = canonical_uuid(&self.project_uuid);
        self
    }
    pub fn get_uuid(&self) -> &str {
        &self.uuid
    }
    pub fn get_name(&self) -> &str {
        &self.name
    }
    pub fn get_email(&self) -> &str {
        &self.email
    }
    pub fn get_role(&self) -> &str {
        &self.role
    }
    pub fn get_project_uuid(&self) -> &str {
        &self.project_uuid
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Project {
    uuid: String,
    #[serde(default)]
    name: String,
}

impl Project {
    pub fn new(uuid: String, name: String) -> Self {
        Self { uuid, name }
    }
    pub fn normalized(mut self) -> Self {
        self.uuid = canonical_uuid(&self.uuid);
        self
    }
    pub fn get_uuid(&self) -> &str {
        &self.uuid
    }
    pub fn get_name(&self) -> &str {
        &self.name
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    uuid: String,
    #[serde(default)]
    display_name: String,
}

impl Role {
    pub fn new(uuid: String, display_name: String) -> Self {
        Self { uuid, display_name }
    }
    pub fn get_uuid(&self) -> &str {
        &self.uuid
    }
    pub fn get_display_name(&self) -> &str {
        &self.display_name
    }
}

// ---- request payloads ----

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub emails: Vec<String>,
    pub role: UserRole,
    pub project_uuid: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResendRequest {
    pub emails: Vec<String>,
    pub project_uuid: String,
    pub role: String,
}

///Body of an update. Unchanged fields stay None and are omitted from the
///serialized payload; the record identifier travels in the request path.
#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.role.is_none()
    }
}

// ---- response envelopes ----

fn default_total_pages() -> u32 {
    1
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default = "default_total_pages")]
    pub total_pages: u32,
    #[serde(default)]
    pub total_rows: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RecordEnvelope<T> {
    pub data: T,
}

#[derive(Deserialize, Debug, Clone)]
pub struct InviteOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResendResult {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResendOutcome {
    #[serde(default)]
    pub results: Vec<ResendResult>,
}
