//! Blocking HTTP implementation of [`RemoteCollection`].
//!
//! Talks to a JSON-Server style collection at `<base_url>/<resource>`.

use crate::sync::remote::{
    CreateItemPayload, RemoteCollection, RemoteError, RemoteItem, RemoteMethod, RemoteResult,
    UpdateItemPayload,
};
use log::{debug, info};
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;

/// HTTP client bound to one remote collection.
pub struct HttpRemoteCollection {
    client: Client,
    collection_url: String,
}

impl HttpRemoteCollection {
    pub fn new(base_url: &str, resource: &str) -> Self {
        Self::with_client(Client::new(), base_url, resource)
    }

    pub fn with_client(client: Client, base_url: &str, resource: &str) -> Self {
        Self {
            client,
            collection_url: collection_url(base_url, resource),
        }
    }

    /// `<collection>/<id>` with the id as one percent-encoded path segment.
    fn item_url(&self, method: RemoteMethod, id: &str) -> RemoteResult<Url> {
        let id = id.trim();
        if id.is_empty() {
            return Err(invalid_request(method, "item id is blank".to_string()));
        }

        let mut url = Url::parse(&self.collection_url).map_err(|err| {
            invalid_request(
                method,
                format!("invalid collection url `{}`: {err}", self.collection_url),
            )
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                invalid_request(
                    method,
                    format!("collection url `{}` cannot have a path", self.collection_url),
                )
            })?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }
}

impl RemoteCollection for HttpRemoteCollection {
    fn endpoint(&self) -> String {
        self.collection_url.clone()
    }

    fn list_items(&self) -> RemoteResult<Vec<RemoteItem>> {
        let method = RemoteMethod::Get;
        let response = self
            .client
            .get(&self.collection_url)
            .send()
            .map_err(|err| transport(method, &err))?;
        decode(method, ensure_success(method, response)?)
    }

    fn create_item(&self, payload: &CreateItemPayload) -> RemoteResult<RemoteItem> {
        let method = RemoteMethod::Post;
        let response = self
            .client
            .post(&self.collection_url)
            .json(payload)
            .send()
            .map_err(|err| transport(method, &err))?;
        decode(method, ensure_success(method, response)?)
    }

    fn update_item(&self, id: &str, payload: &UpdateItemPayload) -> RemoteResult<RemoteItem> {
        let method = RemoteMethod::Put;
        let response = self
            .client
            .put(self.item_url(method, id)?)
            .json(payload)
            .send()
            .map_err(|err| transport(method, &err))?;
        decode(method, ensure_success(method, response)?)
    }

    fn delete_item(&self, id: &str) -> RemoteResult<()> {
        let method = RemoteMethod::Delete;
        let response = self
            .client
            .delete(self.item_url(method, id)?)
            .send()
            .map_err(|err| transport(method, &err))?;
        ensure_success(method, response)?;
        Ok(())
    }
}

/// Joins base URL and resource path with exactly one slash.
pub fn collection_url(base_url: &str, resource: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim().trim_end_matches('/'),
        resource.trim().trim_matches('/')
    )
}

fn ensure_success(method: RemoteMethod, response: Response) -> RemoteResult<Response> {
    let status = response.status();
    debug!(
        "event=remote_call module=sync method={} status_code={}",
        method,
        status.as_u16()
    );
    if status.is_success() {
        return Ok(response);
    }

    info!(
        "event=remote_call module=sync status=error method={} status_code={}",
        method,
        status.as_u16()
    );
    Err(RemoteError::Status {
        method,
        code: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
    })
}

fn decode<T: DeserializeOwned>(method: RemoteMethod, response: Response) -> RemoteResult<T> {
    response.json::<T>().map_err(|err| RemoteError::Decode {
        method,
        message: err.to_string(),
    })
}

fn invalid_request(method: RemoteMethod, message: String) -> RemoteError {
    RemoteError::InvalidRequest { method, message }
}

fn transport(method: RemoteMethod, err: &reqwest::Error) -> RemoteError {
    RemoteError::Transport {
        method,
        message: err.to_string(),
    }
}
