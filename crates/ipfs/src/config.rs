use {
    serde::{Deserialize, Deserializer, Serialize},
    std::time::Duration,
    url::Url,
};

/// The gateways tried in order when fetching content by identifier.
pub fn default_gateways() -> Vec<Url> {
    [
        "https://gateway.pinata.cloud/ipfs/",
        "https://ipfs.io/ipfs/",
        "https://cloudflare-ipfs.com/ipfs/",
        "https://dweb.link/ipfs/",
        "https://gateway.ipfs.io/ipfs/",
    ]
    .into_iter()
    .map(|gateway| gateway.parse().unwrap())
    .collect()
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct IpfsConfig {
    /// Ordered list of gateways to try when fetching content by
    /// identifier. The list is never reordered at runtime.
    pub gateways: Vec<Url>,

    /// Timeout applied to every individual gateway attempt.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Gateway used for display urls and for the bounded access denied
    /// retry.
    pub public_gateway: Url,

    /// Pinning service access. Only the minting flow needs this.
    pub pinning: Option<PinningConfig>,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            gateways: default_gateways(),
            timeout: Duration::from_secs(10),
            public_gateway: crate::reference::PUBLIC_GATEWAY.parse().unwrap(),
            pinning: None,
        }
    }
}

/// Access to the pinning service used when minting.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PinningConfig {
    /// Base url of the pinning api.
    #[serde(default = "default_pinning_base")]
    pub base: Url,

    /// Authentication token for the pinning api. A leading `%` reads the
    /// token from the named environment variable instead, since secrets
    /// are injected into the environment and never written to the
    /// configuration file.
    #[serde(default, deserialize_with = "deserialize_auth_token")]
    pub auth_token: Option<String>,
}

fn default_pinning_base() -> Url {
    "https://api.pinata.cloud".parse().unwrap()
}

fn deserialize_auth_token<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw_auth_token) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw_auth_token.strip_prefix('%') {
        Some(env_var_name) => {
            let env_var_contents = std::env::var(env_var_name).map_err(|err| {
                tracing::error!(%err, %env_var_name, "failed to load env var");
                serde::de::Error::invalid_value(
                    serde::de::Unexpected::Str(env_var_name),
                    &"expected environment variable to be available",
                )
            })?;
            Ok(Some(env_var_contents))
        }
        None => Ok(Some(raw_auth_token)),
    }
}
