// Async HTTP client for the portfolio data API.
//
// Every resource table exposes the same REST-like surface:
//   GET    {base}/{table}        list
//   GET    {base}/{table}/{id}   get
//   POST   {base}/{table}        create
//   PATCH  {base}/{table}/{id}   update
//   DELETE {base}/{table}/{id}   delete
//
// Responses are JSON carrying either the canonical row(s) or an `error` field.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

// ── Response shapes ──────────────────────────────────────────────────

/// A list endpoint may answer with a bare array or a `{ data: [...] }` envelope.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListBody<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the per-table REST endpoints.
///
/// Table-agnostic: callers name the table and pick the row type, so one
/// client serves every resource kind.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config (timeout + bearer token).
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The normalized base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Table and id go in as single percent-encoded path segments, so an id
    /// can never reach another path or add a query.
    fn url(&self, table: &str, id: Option<&str>) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            segments.pop_if_empty().push(table);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List every row of `table`.
    pub async fn list<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>, Error> {
        let url = self.url(table, None)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let body: ListBody<T> = self.handle_response(resp).await?;
        Ok(body.into_vec())
    }

    /// Fetch a single row by id.
    pub async fn get<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<T, Error> {
        let url = self.url(table, Some(id))?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    /// Insert a row; the server answers with the canonical row, including
    /// generated fields (id, timestamps).
    pub async fn create<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(table, None)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    /// Partially update a row; the server answers with the full updated row.
    pub async fn update<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: &str,
        id: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(table, Some(id))?;
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    /// Delete a row.
    pub async fn delete(&self, table: &str, id: &str) -> Result<(), Error> {
        let url = self.url(table, Some(id))?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        let status = resp.status();
        if status.is_success() {
            // Some backends echo the deleted row; only an `error` field matters.
            let raw = resp.text().await?;
            match error_message(&raw) {
                Some(message) => Err(Error::Api {
                    status: status.as_u16(),
                    message,
                }),
                None => Ok(()),
            }
        } else {
            Err(parse_error(status, resp).await)
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        if let Some(message) = error_message(&body) {
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}

/// Map a non-success response into the error taxonomy.
async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let path = resp.url().path().to_owned();
    let raw = resp.text().await.unwrap_or_default();
    let message = error_message(&raw).unwrap_or_else(|| {
        if raw.is_empty() {
            status.to_string()
        } else {
            raw
        }
    });

    match status.as_u16() {
        code @ (401 | 403) => Error::Unauthorized {
            status: code,
            message,
        },
        400 | 422 => Error::Validation { message },
        404 => Error::NotFound { path },
        409 => Error::Conflict { message },
        code => Error::Api {
            status: code,
            message,
        },
    }
}

/// Extract the `error` field from a JSON body, if present.
///
/// Accepts both `{"error": "text"}` and `{"error": {"message": "text"}}`.
fn error_message(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let err = value.as_object()?.get("error")?;
    match err {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => Some(
            map.get("message")
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| err.to_string(), str::to_owned),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let client =
            RestClient::from_reqwest("https://data.example.com/rest/v1", reqwest::Client::new())
                .unwrap();
        assert_eq!(client.base_url().as_str(), "https://data.example.com/rest/v1/");
        assert_eq!(
            client.url("projects", Some("42")).unwrap().as_str(),
            "https://data.example.com/rest/v1/projects/42"
        );
        assert_eq!(
            client.url("projects", None).unwrap().as_str(),
            "https://data.example.com/rest/v1/projects"
        );
    }

    #[test]
    fn ids_are_escaped_into_one_segment() {
        let client =
            RestClient::from_reqwest("https://data.example.com/rest/v1/", reqwest::Client::new())
                .unwrap();
        let url = client.url("projects", Some("../a/b?c#d")).unwrap();
        assert_eq!(url.path(), "/rest/v1/projects/..%2Fa%2Fb%3Fc%23d");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn error_field_string_and_object() {
        assert_eq!(error_message(r#"{"error":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(
            error_message(r#"{"error":{"message":"bad row","code":"22P02"}}"#).as_deref(),
            Some("bad row")
        );
        assert!(error_message(r#"{"error":null,"id":1}"#).is_none());
        assert!(error_message(r#"[{"id":1}]"#).is_none());
        assert!(error_message("not json").is_none());
    }
}
