use super::RemoteStore;
use crate::error::RemoteError;
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use tally_engine::Expense;

/// Error body returned by tally-server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

/// Remote store backed by the tally-server HTTP API.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    base: Url,
    client: Client,
}

impl HttpRemoteStore {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        Self::with_client(base_url, Client::builder().build()?)
    }

    /// Create a client reusing an existing `reqwest` client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self, RemoteError> {
        let base = Url::parse(base_url)
            .map_err(|e| RemoteError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { base, client })
    }

    /// Server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn collection_url(&self) -> Url {
        self.url(&["expenses"])
    }

    fn expense_url(&self, id: &str) -> Url {
        self.url(&["expenses", id])
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in the constructor: the base URL can take path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Turn a non-success response into [`RemoteError::Rejected`].
async fn check(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            error,
            details: Some(details),
        }) => format!("{} ({})", error, details),
        Ok(ErrorBody { error, .. }) => error,
        Err(_) if body.is_empty() => status.to_string(),
        Err(_) => body,
    };

    Err(RemoteError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list(&self) -> Result<Vec<Expense>, RemoteError> {
        let response = self.client.get(self.collection_url()).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn replace_all(&self, expenses: &[Expense]) -> Result<(), RemoteError> {
        let response = self
            .client
            .put(self.collection_url())
            .json(expenses)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn create(&self, expense: &Expense) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.collection_url())
            .json(expense)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn update(&self, expense: &Expense) -> Result<(), RemoteError> {
        let response = self
            .client
            .patch(self.expense_url(&expense.id))
            .json(expense)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), RemoteError> {
        let response = self.client.delete(self.expense_url(id)).send().await?;
        check(response).await?;
        Ok(())
    }
}
