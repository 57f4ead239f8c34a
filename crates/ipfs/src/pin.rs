use {
    crate::config::PinningConfig,
    reqwest::{ClientBuilder, StatusCode, multipart},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::time::Duration,
    url::Url,
};

/// Client for the pinning service api. Content pinned here is what the
/// gateways later serve.
pub struct PinningClient {
    client: reqwest::Client,
    base: Url,
    auth_token: Option<String>,
}

/// Failure to pin content, classified so that callers can map it to a
/// user facing message.
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    /// No auth token is configured; no request was attempted.
    #[error("pinning requires an auth token")]
    MissingCredentials,
    #[error("the auth token was rejected")]
    Unauthorized,
    #[error("the pinning account is over its quota")]
    QuotaExceeded,
    #[error("the auth token lacks the required scope")]
    MissingScope,
    #[error("pinning request failed with status {status}: {message}")]
    Rejected { status: StatusCode, message: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Response of the pin endpoints.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PinResponse {
    pub ipfs_hash: String,
    pub pin_size: Option<u64>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PinJsonRequest<'a, T> {
    pinata_content: &'a T,
    pinata_metadata: PinMetadata,
    pinata_options: PinOptions,
}

#[derive(Debug, Serialize)]
struct PinMetadata {
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PinOptions {
    cid_version: u8,
}

impl PinningClient {
    pub fn new(config: &PinningConfig) -> Self {
        Self::with_client(ClientBuilder::new(), config)
    }

    pub fn with_client(builder: ClientBuilder, config: &PinningConfig) -> Self {
        Self {
            // Uploads are larger than gateway fetches; give them more
            // room than the per-gateway timeout.
            client: builder.timeout(Duration::from_secs(30)).build().unwrap(),
            base: config.base.clone(),
            auth_token: config.auth_token.clone(),
        }
    }

    /// Pins a JSON document and returns its content identifier.
    pub async fn pin_json<T: Serialize + Sync>(
        &self,
        content: &T,
        name: &str,
    ) -> Result<String, PinError> {
        let request = PinJsonRequest {
            pinata_content: content,
            pinata_metadata: PinMetadata {
                name: name.to_string(),
            },
            pinata_options: PinOptions { cid_version: 0 },
        };
        let url = crate::url::join(&self.base, "pinning/pinJSONToIPFS");
        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth_token()?)
            .json(&request)
            .send()
            .await?;
        Self::into_cid(response).await
    }

    /// Pins a raw file and returns its content identifier.
    pub async fn pin_file(&self, content: Vec<u8>, name: &str) -> Result<String, PinError> {
        let metadata = serde_json::json!({ "name": name }).to_string();
        let options = serde_json::json!({ "cidVersion": 0 }).to_string();
        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(content).file_name(name.to_string()),
            )
            .text("pinataMetadata", metadata)
            .text("pinataOptions", options);
        let url = crate::url::join(&self.base, "pinning/pinFileToIPFS");
        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth_token()?)
            .multipart(form)
            .send()
            .await?;
        Self::into_cid(response).await
    }

    fn auth_token(&self) -> Result<&str, PinError> {
        self.auth_token
            .as_deref()
            .ok_or(PinError::MissingCredentials)
    }

    async fn into_cid(response: reqwest::Response) -> Result<String, PinError> {
        let status = response.status();
        if status.is_success() {
            let response: PinResponse = response.json().await?;
            tracing::debug!(cid = %response.ipfs_hash, "content pinned");
            return Ok(response.ipfs_hash);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_rejection(status, body))
    }
}

fn classify_rejection(status: StatusCode, body: String) -> PinError {
    let reason = serde_json::from_str::<Value>(&body).ok().and_then(|body| {
        body.pointer("/error/reason")
            .or_else(|| body.pointer("/reason"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    if reason.as_deref() == Some("NO_SCOPES_FOUND") {
        return PinError::MissingScope;
    }
    match status {
        StatusCode::UNAUTHORIZED => PinError::Unauthorized,
        StatusCode::PAYMENT_REQUIRED => PinError::QuotaExceeded,
        _ => PinError::Rejected {
            status,
            message: reason.unwrap_or(body),
        },
    }
}

#[cfg(test)]
mod tests {
    use {super::*, httpmock::prelude::*, serde_json::json};

    fn client(server: &MockServer, auth_token: Option<&str>) -> PinningClient {
        PinningClient::new(&PinningConfig {
            base: server.url("").parse().unwrap(),
            auth_token: auth_token.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn pins_json_documents() {
        let server = MockServer::start();
        let pin = server.mock(|when, then| {
            when.method(POST)
                .path("/pinning/pinJSONToIPFS")
                .header("authorization", "Bearer jwt")
                .json_body_partial(
                    r#"{
                        "pinataContent": {"name": "A", "description": "d", "image": "Qm_img"},
                        "pinataOptions": {"cidVersion": 0}
                    }"#,
                );
            then.status(200).json_body(json!({
                "IpfsHash": "QmPinned",
                "PinSize": 42,
                "Timestamp": "2024-05-02T08:00:00.000Z"
            }));
        });

        let client = client(&server, Some("jwt"));
        let content = json!({"name": "A", "description": "d", "image": "Qm_img"});
        let cid = client.pin_json(&content, "A-metadata").await.unwrap();

        assert_eq!(cid, "QmPinned");
        pin.assert_hits(1);
    }

    #[tokio::test]
    async fn missing_token_fails_without_a_request() {
        let server = MockServer::start();
        let pin = server.mock(|when, then| {
            when.method(POST).path_contains("/pinning/");
            then.status(200);
        });

        let client = client(&server, None);
        let err = client.pin_json(&json!({}), "x").await.unwrap_err();

        assert!(matches!(err, PinError::MissingCredentials));
        pin.assert_hits(0);
    }

    #[tokio::test]
    async fn classifies_rejections() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/pinning/pinJSONToIPFS");
            then.status(401).json_body(json!({"error": "invalid key"}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/pinning/pinFileToIPFS");
            then.status(403)
                .json_body(json!({"error": {"reason": "NO_SCOPES_FOUND"}}));
        });

        let client = client(&server, Some("jwt"));
        let err = client.pin_json(&json!({}), "x").await.unwrap_err();
        assert!(matches!(err, PinError::Unauthorized));

        let err = client.pin_file(b"bytes".to_vec(), "img.png").await.unwrap_err();
        assert!(matches!(err, PinError::MissingScope));
    }

    #[tokio::test]
    #[ignore]
    async fn pin_json_document() {
        observe::tracing::initialize_reentrant("ipfs=debug");
        let auth_token = std::env::var("pinata_auth").ok();
        let client = PinningClient::new(&PinningConfig {
            base: "https://api.pinata.cloud".parse().unwrap(),
            auth_token,
        });
        let content = json!({"name": "test", "description": "test", "image": ""});
        let cid = client.pin_json(&content, "test-metadata").await.unwrap();
        println!("{cid}");
    }
}
