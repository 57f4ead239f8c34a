use {
    crate::{config::IpfsConfig, reference::Reference},
    reqwest::{ClientBuilder, StatusCode},
    serde_json::Value,
    url::Url,
};

/// Client for fetching content addressed data, masking the unreliability
/// of any single gateway behind an ordered fallback list.
///
/// Gateway order is fixed configuration; no health state is tracked
/// across fetches and attempts for one reference are strictly
/// sequential.
pub struct GatewayClient {
    client: reqwest::Client,
    gateways: Vec<Url>,
}

/// One failed gateway attempt, recorded in the order it was made.
#[derive(Debug)]
pub struct Attempt {
    pub gateway: Url,
    pub error: GatewayError,
}

/// Why a single request failed. Recovered from locally by advancing to
/// the next gateway in the list.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request timed out")]
    Timeout,
    #[error("not a requestable url")]
    InvalidUrl,
    #[error(transparent)]
    Transport(reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("response is not valid json: {0}")]
    Payload(reqwest::Error),
}

/// Terminal failure to retrieve a reference.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// A direct request failed. No fallback applies since there is no
    /// alternate access point for the url.
    #[error("request to {url} failed: {error}")]
    Direct { url: String, error: GatewayError },
    /// Every configured gateway failed for the identifier.
    #[error("all {} gateways failed for {cid}", .attempts.len())]
    AllGatewaysExhausted { cid: String, attempts: Vec<Attempt> },
}

impl FetchError {
    /// True if the failure was an access denied response, which warrants
    /// the single bounded retry against the public gateway.
    pub fn is_access_denied(&self) -> bool {
        let denied =
            |error: &GatewayError| matches!(error, GatewayError::Status(StatusCode::FORBIDDEN));
        match self {
            Self::Direct { error, .. } => denied(error),
            Self::AllGatewaysExhausted { attempts, .. } => {
                attempts.iter().any(|attempt| denied(&attempt.error))
            }
        }
    }
}

impl GatewayClient {
    pub fn new(config: &IpfsConfig) -> Self {
        Self::with_client(ClientBuilder::new(), config)
    }

    pub fn with_client(builder: ClientBuilder, config: &IpfsConfig) -> Self {
        Self {
            client: builder.timeout(config.timeout).build().unwrap(),
            gateways: config.gateways.clone(),
        }
    }

    /// Retrieves the JSON document behind a content reference.
    ///
    /// References with an extractable identifier are tried against every
    /// configured gateway in order; the first success wins and the
    /// remaining gateways are not contacted. Anything else is fetched
    /// directly, exactly once.
    pub async fn fetch(&self, reference: &str) -> Result<Value, FetchError> {
        match Reference::parse(reference) {
            Reference::Direct(target) => self.fetch_direct(&target).await,
            Reference::Cid(cid) => self.fetch_cid(&cid).await,
        }
    }

    /// Like [`GatewayClient::fetch`] but asks one specific gateway,
    /// bypassing the configured list. Used for the single bounded retry
    /// on access denied responses.
    pub async fn fetch_via(&self, gateway: &Url, cid: &str) -> Result<Value, FetchError> {
        let target = crate::url::join(gateway, cid);
        self.attempt(target.clone()).await.map_err(|error| {
            tracing::debug!(%target, %error, "gateway fetch failed");
            FetchError::Direct {
                url: target.to_string(),
                error,
            }
        })
    }

    async fn fetch_direct(&self, target: &str) -> Result<Value, FetchError> {
        let url = target.parse().map_err(|_| FetchError::Direct {
            url: target.to_string(),
            error: GatewayError::InvalidUrl,
        })?;
        self.attempt(url).await.map_err(|error| {
            tracing::debug!(url = %target, %error, "direct fetch failed");
            FetchError::Direct {
                url: target.to_string(),
                error,
            }
        })
    }

    async fn fetch_cid(&self, cid: &str) -> Result<Value, FetchError> {
        let mut attempts = Vec::new();
        for gateway in &self.gateways {
            let target = crate::url::join(gateway, cid);
            match self.attempt(target).await {
                Ok(payload) => {
                    tracing::debug!(%gateway, %cid, "fetched content");
                    return Ok(payload);
                }
                Err(error) => {
                    tracing::debug!(%gateway, %cid, %error, "gateway failed");
                    attempts.push(Attempt {
                        gateway: gateway.clone(),
                        error,
                    });
                }
            }
        }
        tracing::warn!(%cid, gateways = attempts.len(), "all gateways failed");
        Err(FetchError::AllGatewaysExhausted {
            cid: cid.to_string(),
            attempts,
        })
    }

    async fn attempt(&self, target: Url) -> Result<Value, GatewayError> {
        let response = match self.client.get(target).send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => return Err(GatewayError::Timeout),
            Err(err) => return Err(GatewayError::Transport(err)),
        };
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status));
        }
        response.json().await.map_err(|err| {
            if err.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Payload(err)
            }
        })
    }
}
