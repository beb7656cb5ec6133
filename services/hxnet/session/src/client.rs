//! Client facade tying signing, transport and decoding together.

use crate::error::ClientError;
use crate::signer::{Params, Signer};
use crate::transport::{Transport, TransportConfig};
use hxnet_wire::Document;
use std::fmt;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Trust tier of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTier {
    /// No signature
    Raw,
    /// Signed with `cmd_id`
    Cmd,
    /// Carries `session_id` and is signed over it
    Session,
}

impl fmt::Display for RequestTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestTier::Raw => "raw",
            RequestTier::Cmd => "cmd",
            RequestTier::Session => "session",
        };
        f.write_str(name)
    }
}

/// Game-server client shared by every concurrent caller
#[derive(Debug)]
pub struct Client {
    signer: Signer,
    transport: Transport,
    session_id: RwLock<Option<String>>,
}

impl Client {
    /// Create a client from its parts
    pub fn new(signer: Signer, transport: Transport) -> Self {
        Self {
            signer,
            transport,
            session_id: RwLock::new(None),
        }
    }

    /// Create a client and its connection pool from configuration
    pub fn connect(
        config: &TransportConfig,
        base_path: impl Into<String>,
        salt: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Ok(Self::new(Signer::new(base_path, salt), Transport::new(config)?))
    }

    /// Store the session token used by session-tier requests
    pub async fn set_session(&self, session_id: impl Into<String>) {
        let session_id = session_id.into();
        info!("Session established");
        *self.session_id.write().await = Some(session_id);
    }

    /// Forget the session token
    pub async fn clear_session(&self) {
        *self.session_id.write().await = None;
    }

    /// Current session token
    pub async fn session_id(&self) -> Option<String> {
        self.session_id.read().await.clone()
    }

    /// Signer used to build request URIs
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Underlying transport
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Build the request URI for `tier`
    pub async fn uri(&self, tier: RequestTier, params: &Params) -> Result<String, ClientError> {
        Ok(match tier {
            RequestTier::Raw => self.signer.raw(params),
            RequestTier::Cmd => self.signer.cmd(params),
            RequestTier::Session => {
                let guard = self.session_id.read().await;
                let sid = guard.as_deref().ok_or(ClientError::NoSession)?;
                self.signer.session(params, sid)
            }
        })
    }

    /// GET and return the raw body text
    pub async fn call_text(&self, tier: RequestTier, params: &Params) -> Result<String, ClientError> {
        let uri = self.uri(tier, params).await?;
        debug!("Issuing {} request", tier);
        self.transport.get(&uri).await
    }

    /// GET and parse the body as a wire document
    pub async fn call(&self, tier: RequestTier, params: &Params) -> Result<Document, ClientError> {
        let text = self.call_text(tier, params).await?;
        Ok(Document::parse(&text))
    }

    /// POST a form body and parse the response as a wire document
    pub async fn post(
        &self,
        tier: RequestTier,
        params: &Params,
        body: &Params,
    ) -> Result<Document, ClientError> {
        let uri = self.uri(tier, params).await?;
        debug!("Issuing {} POST request", tier);
        let text = self.transport.post(&uri, body).await?;
        Ok(Document::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve;
    use std::time::Duration;

    async fn local_client(status: &'static str, body: &'static str, count: usize)
        -> (Client, tokio::task::JoinHandle<Vec<String>>)
    {
        let (addr, server) = serve(status, body, count).await;
        let config = TransportConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            ssl: false,
            timeout: Duration::from_secs(5),
            ..Default::default()
        };
        let client = Client::connect(&config, "/game/index.php", "pepper").unwrap();
        (client, server)
    }

    fn attack_params() -> Params {
        Params::new()
            .with("action", "net_get_for_attack")
            .with("target_id", 4242)
    }

    #[tokio::test]
    async fn test_session_call_sends_signed_uri() {
        let (client, server) =
            local_client("200 OK", "4839489,write_readmes,3,1;41299391,earn_reputation,4,0;", 1)
                .await;
        client.set_session("a1b2c3d4").await;

        let doc = client
            .call(RequestTier::Session, &attack_params())
            .await
            .unwrap();
        assert_eq!(doc.record(0, 0).unwrap()[1], "write_readmes");

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with(
            "GET /game/index.php?action=net_get_for_attack&target_id=4242\
             &session_id=a1b2c3d4&cmd_id=mfB2NvUX HTTP/1.1"
        ));
    }

    #[tokio::test]
    async fn test_session_tier_requires_session() {
        let (client, _server) = local_client("200 OK", "", 0).await;

        let err = client
            .call(RequestTier::Session, &attack_params())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NoSession));

        client.set_session("x").await;
        assert_eq!(client.session_id().await.as_deref(), Some("x"));
        client.clear_session().await;
        assert!(client.session_id().await.is_none());
    }

    #[tokio::test]
    async fn test_uri_tiers() {
        let (client, _server) = local_client("200 OK", "", 0).await;

        assert_eq!(
            client.uri(RequestTier::Raw, &attack_params()).await.unwrap(),
            "/game/index.php?action=net_get_for_attack&target_id=4242"
        );
        assert!(client
            .uri(RequestTier::Cmd, &attack_params())
            .await
            .unwrap()
            .ends_with("&cmd_id=2AI619d0"));
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_document() {
        let (client, _server) = local_client("200 OK", "", 1).await;

        let doc = client.call(RequestTier::Raw, &Params::new()).await.unwrap();
        assert!(doc.is_empty());
    }

    #[tokio::test]
    async fn test_post_parses_response() {
        let (client, server) = local_client("200 OK", "1,saved", 1).await;

        let body = Params::new().with("text", hxnet_wire::encode("hi, there"));
        let doc = client
            .post(RequestTier::Cmd, &Params::new().with("action", "note_set"), &body)
            .await
            .unwrap();
        assert_eq!(doc.field(0, 0, 1).unwrap(), "saved");

        let requests = server.await.unwrap();
        assert!(requests[0].ends_with("text=hi%01+there"));
    }
}
