use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::{ApiError, Error},
};

pub mod invites;
pub mod projects;
pub mod roles;

///Configured request sender with a fixed base URL. All data access goes
///through here; callers get the decoded envelope or an ApiError.
#[derive(Debug)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = match reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.get_request_timeout())
            .build()
        {
            Ok(client) => client,
            Err(err) => return Err(ApiError::Transport(err).into()),
        };
        Ok(Self {
            client,
            base_url: config.get_api_base_url().to_owned(),
        })
    }

    pub(crate) fn url(&self, resource: &str) -> String {
        format!("{}{}", self.base_url, resource)
    }

    ///Single decode path: a non-success status becomes an error carrying
    ///the status and whatever text the server sent.
    pub(crate) async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, Error> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            }
            .into());
        }
        match response.json::<T>().await {
            Ok(decoded) => Ok(decoded),
            Err(err) => Err(ApiError::Transport(err).into()),
        }
    }
}
