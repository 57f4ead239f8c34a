use serde::{Deserialize, Serialize};

/// The off-chain metadata document a token uri points to.
///
/// Real world documents carry plenty of extra fields (attributes,
/// external urls, ...) which are ignored. `name` and `image` are
/// required; a document without them cannot be displayed.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct TokenMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image: String,
}
