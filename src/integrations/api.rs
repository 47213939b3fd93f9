use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

use crate::{
    core::{auth::Credential, settings::Settings},
    error::ApiError,
};

/// Error body returned by the API on failure
#[derive(Deserialize, Default)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// HTTP client for the Haaflah API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_client(base_url, Client::new())
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Self::with_client(settings.api_url(), builder.build()?)
    }

    fn with_client(base_url: &str, http: Client) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::BaseUrl(base_url.to_owned()));
        }
        Ok(ApiClient { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Join path segments onto the base URL, escaping each one.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::BaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn get(&self, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        Ok(self.http.get(self.endpoint(segments)?))
    }

    pub fn post(&self, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        Ok(self.http.post(self.endpoint(segments)?))
    }

    pub fn put(&self, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        Ok(self.http.put(self.endpoint(segments)?))
    }

    pub fn delete(&self, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        Ok(self.http.delete(self.endpoint(segments)?))
    }
}

pub fn authorized(request: RequestBuilder, credential: &Credential) -> RequestBuilder {
    request.bearer_auth(credential.token())
}

/// Send a request, turning a 401 into `ApiError::Unauthorized` and any other
/// non-2xx answer into `ApiError::Status`.
pub async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let parsed: ErrorBody = serde_json::from_slice(&body).unwrap_or_default();
    let message = parsed
        .error
        .or(parsed.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_owned());

    log::debug!("API answered {}: {}", status, message);
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized(message));
    }
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Send a request and decode its JSON body.
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    let body = send(request).await?.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}


#[cfg(test)]
mod tests {
    use super::*;
    use warp::{http::StatusCode, Filter};

    #[test]
    fn test_endpoint_joins_and_escapes() {
        let client = ApiClient::new("http://localhost:4000/api/").unwrap();
        let url = client.endpoint(&["participants", "a b/c", "check-in"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:4000/api/participants/a%20b%2Fc/check-in"
        );

        let client = ApiClient::new("http://localhost:4000").unwrap();
        assert_eq!(
            client.endpoint(&["events"]).unwrap().as_str(),
            "http://localhost:4000/events"
        );
    }

    #[test]
    fn test_rejects_bad_base() {
        assert!(matches!(ApiClient::new("not a url"), Err(ApiError::Url(_))));
        assert!(matches!(
            ApiClient::new("mailto:someone@example.com"),
            Err(ApiError::BaseUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_error_body_becomes_message() {
        let routes = warp::path!("api" / "boom").map(|| {
            warp::reply::with_status(
                warp::reply::json(&serde_json::json!({"error": "Invalid credentials"})),
                StatusCode::UNAUTHORIZED,
            )
        });
        let client = test_server::serve(routes);

        let err = send(client.get(&["boom"]).unwrap()).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(matches!(err, ApiError::Unauthorized(ref message) if message == "Invalid credentials"));
    }

    #[tokio::test]
    async fn test_unparseable_error_body() {
        let routes = warp::path!("api" / "boom").map(|| {
            warp::reply::with_status("oops", StatusCode::INTERNAL_SERVER_ERROR)
        });
        let client = test_server::serve(routes);

        let err = send(client.get(&["boom"]).unwrap()).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
    }
}
