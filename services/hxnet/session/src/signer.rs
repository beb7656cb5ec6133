//! Request URIs in three trust tiers and the `cmd_id` integrity hash.
//!
//! ```text
//! raw:     <path>?<params>
//! cmd:     <path>?<params>&cmd_id=<hash(raw)>
//! session: <path>?<params>&session_id=<sid>&cmd_id=<hash(raw with session_id)>
//! ```
//!
//! The session id must be part of the hashed URI; the server rejects a hash
//! computed before it was added.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use url::form_urlencoded;

/// Query parameter carrying the session token
pub const SESSION_PARAM: &str = "session_id";
/// Query parameter carrying the integrity hash
pub const CMD_PARAM: &str = "cmd_id";

/// Salt is spliced in after at most this many characters of the URI
const SALT_OFFSET: usize = 10;

/// Insertion-ordered request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// Create an empty parameter list
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.push(key, value);
        self
    }

    /// Append a parameter; order is preserved and affects the hash
    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) {
        self.pairs.push((key.into(), value.to_string()));
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no parameters
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encode as `application/x-www-form-urlencoded`
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.push(k, v);
        }
        params
    }
}

/// Compute the `cmd_id` for a fully formed URI.
///
/// The salt is inserted at `min(len, 10)`, the result is MD5 digested, bytes
/// 2..8 of the digest are base64 encoded and `=`, `+`, `/` are replaced with
/// `.`, `-`, `_`.
pub fn cmd_hash(uri: &str, salt: &str) -> String {
    let offset = uri
        .char_indices()
        .nth(SALT_OFFSET)
        .map(|(i, _)| i)
        .unwrap_or(uri.len());

    let mut salted = String::with_capacity(uri.len() + salt.len());
    salted.push_str(&uri[..offset]);
    salted.push_str(salt);
    salted.push_str(&uri[offset..]);

    let digest = md5::compute(salted.as_bytes());
    STANDARD
        .encode(&digest.0[2..8])
        .chars()
        .map(|c| match c {
            '=' => '.',
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect()
}

/// Builds signed request URIs against a fixed base path
#[derive(Debug, Clone)]
pub struct Signer {
    base_path: String,
    salt: String,
}

impl Signer {
    /// Create a signer for `base_path` using the shared `salt`
    pub fn new(base_path: impl Into<String>, salt: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            salt: salt.into(),
        }
    }

    /// Base path requests are issued against
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Anonymous tier: parameters encoded onto the base path
    pub fn raw(&self, params: &Params) -> String {
        if params.is_empty() {
            return self.base_path.clone();
        }
        format!("{}?{}", self.base_path, params.to_query())
    }

    /// Integrity-checked tier: `cmd_id` over the raw URI, appended last
    pub fn cmd(&self, params: &Params) -> String {
        let hash = self.hash(&self.raw(params));
        let signed = params.clone().with(CMD_PARAM, hash);
        self.raw(&signed)
    }

    /// Session-bound tier: `session_id` is added before hashing
    pub fn session(&self, params: &Params, session_id: &str) -> String {
        let sessioned = params.clone().with(SESSION_PARAM, session_id);
        self.cmd(&sessioned)
    }

    /// `cmd_id` for `uri` with this signer's salt
    pub fn hash(&self, uri: &str) -> String {
        cmd_hash(uri, &self.salt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/game/index.php";
    const SALT: &str = "pepper";

    fn attack_params() -> Params {
        Params::new()
            .with("action", "net_get_for_attack")
            .with("target_id", 4242)
    }

    #[test]
    fn test_hash_known_vectors() {
        // short URI: salt appended, "abcdefXYZ" is digested
        assert_eq!(cmd_hash("abcdef", "XYZ"), "cpFc_y3i");
        assert_eq!(cmd_hash("abcdefghijklmnop", "XYZ"), "Bv-zENNg");
    }

    #[test]
    fn test_hash_is_deterministic_and_sensitive() {
        let a = cmd_hash("/game/index.php?action=a", SALT);
        assert_eq!(a.len(), 8);
        assert_eq!(a, cmd_hash("/game/index.php?action=a", SALT));
        assert_ne!(a, cmd_hash("/game/index.php?action=b", SALT));
        assert_ne!(a, cmd_hash("/game/index.php?action=a", "salt"));
        assert!(!a.contains(['+', '/', '=']));
    }

    #[test]
    fn test_raw_tier() {
        let signer = Signer::new(PATH, SALT);
        assert_eq!(
            signer.raw(&attack_params()),
            "/game/index.php?action=net_get_for_attack&target_id=4242"
        );
        assert_eq!(signer.raw(&Params::new()), PATH);
    }

    #[test]
    fn test_cmd_tier() {
        let signer = Signer::new(PATH, SALT);
        assert_eq!(
            signer.cmd(&attack_params()),
            "/game/index.php?action=net_get_for_attack&target_id=4242&cmd_id=2AI619d0"
        );
    }

    #[test]
    fn test_session_tier_hashes_over_session_id() {
        let signer = Signer::new(PATH, SALT);
        let uri = signer.session(&attack_params(), "a1b2c3d4");

        assert_eq!(
            uri,
            "/game/index.php?action=net_get_for_attack&target_id=4242\
             &session_id=a1b2c3d4&cmd_id=mfB2NvUX"
        );
        assert_eq!(
            uri,
            signer.cmd(&attack_params().with(SESSION_PARAM, "a1b2c3d4"))
        );
    }

    #[test]
    fn test_session_added_after_hashing_is_rejected_form() {
        // hashing first and appending the session afterwards yields the
        // cmd-tier hash, which the server does not accept for session calls
        let signer = Signer::new(PATH, SALT);
        let wrong = signer.hash(&signer.raw(&attack_params()));
        let right = signer.session(&attack_params(), "a1b2c3d4");

        assert_eq!(wrong, "2AI619d0");
        assert!(!right.ends_with(&format!("cmd_id={}", wrong)));
    }

    #[test]
    fn test_query_is_form_encoded() {
        let params = Params::new()
            .with("text", "hi there, @all; *ok*")
            .with("x", "a+b/c");
        assert_eq!(
            params.to_query(),
            "text=hi+there%2C+%40all%3B+*ok*&x=a%2Bb%2Fc"
        );
    }

    #[test]
    fn test_params_order_and_lookup() {
        let params: Params = vec![("b", "2"), ("a", "1"), ("b", "3")].into_iter().collect();

        assert_eq!(params.len(), 3);
        assert_eq!(params.get("b"), Some("2"));
        assert_eq!(params.get("c"), None);
        assert_eq!(
            params.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            vec!["b", "a", "b"]
        );
    }
}
