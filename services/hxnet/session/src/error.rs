//! Typed failures surfaced to every caller of the client.
//!
//! Transport failures and server-reported failures are both reduced to a
//! `(kind, description)` pair. A handful of server descriptions are known to
//! the client and are promoted to [`NamedException`]s.

use hxnet_wire::{decode, Document, WireError};
use std::fmt;
use thiserror::Error;

/// Kind used when an error body cannot be decoded
pub const UNKNOWN_KIND: &str = "Unknown";

/// Server failures recognised by their exact description text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedException {
    /// The player or node cannot level any further
    LevelCap,
    /// More concurrent builders were requested than are available
    TooManyBuilders,
    /// The task or upgrade was already completed
    AlreadyFinished,
}

const NAMED_EXCEPTIONS: &[(&str, NamedException)] = &[
    ("Level cap reached", NamedException::LevelCap),
    ("Too many builders", NamedException::TooManyBuilders),
    ("Already finished", NamedException::AlreadyFinished),
];

impl NamedException {
    /// Look up a server description in the table
    pub fn lookup(description: &str) -> Option<Self> {
        NAMED_EXCEPTIONS
            .iter()
            .find(|(text, _)| *text == description)
            .map(|(_, named)| *named)
    }

    /// Symbolic name used as the error kind
    pub fn name(&self) -> &'static str {
        match self {
            NamedException::LevelCap => "LevelCap",
            NamedException::TooManyBuilders => "TooManyBuilders",
            NamedException::AlreadyFinished => "AlreadyFinished",
        }
    }
}

impl fmt::Display for NamedException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// The exchange could not be completed
    #[error("{kind}: {description}")]
    Transport {
        /// Failure category (Timeout, Connect, ...)
        kind: String,
        /// Underlying error message
        description: String,
    },

    /// The server answered with a non-success status
    #[error("{kind}: {description}")]
    Server {
        /// Server error type, or `Unknown`
        kind: String,
        /// Server error description
        description: String,
    },

    /// A server error recognised by its description
    #[error("{exception}: {description}")]
    Named {
        /// Recognised exception
        exception: NamedException,
        /// Server error type the exception arrived with
        server_kind: String,
        /// Server error description
        description: String,
    },

    /// Strict access into a response document failed
    #[error(transparent)]
    Parser(#[from] WireError),

    /// A session-tier request was issued without a session id
    #[error("no session: log in before issuing session requests")]
    NoSession,
}

impl ClientError {
    /// Error kind for display
    pub fn kind(&self) -> &str {
        match self {
            ClientError::Transport { kind, .. } | ClientError::Server { kind, .. } => kind,
            ClientError::Named { exception, .. } => exception.name(),
            ClientError::Parser(_) => "ParserError",
            ClientError::NoSession => "NoSession",
        }
    }

    /// Error description for display
    pub fn description(&self) -> String {
        match self {
            ClientError::Transport { description, .. }
            | ClientError::Server { description, .. }
            | ClientError::Named { description, .. } => description.clone(),
            ClientError::Parser(e) => e.to_string(),
            ClientError::NoSession => "session id is not set".to_string(),
        }
    }

    /// Build the error for a non-success response body.
    ///
    /// The first record's first two fields are `(type, description)`,
    /// both escaped.
    pub fn from_error_body(body: &str) -> Self {
        let doc = Document::parse(body);
        match (doc.field(0, 0, 0), doc.field(0, 0, 1)) {
            (Ok(kind), Ok(description)) => Self::server(decode(kind), decode(description)),
            _ => ClientError::Server {
                kind: UNKNOWN_KIND.to_string(),
                description: body.to_string(),
            },
        }
    }

    /// Server error, promoted to a named exception when the text is known
    pub fn server(kind: String, description: String) -> Self {
        match NamedException::lookup(&description) {
            Some(exception) => ClientError::Named {
                exception,
                server_kind: kind,
                description,
            },
            None => ClientError::Server { kind, description },
        }
    }

    /// Wrap an HTTP client failure, classified by category
    pub fn transport(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "Timeout"
        } else if err.is_connect() {
            "Connect"
        } else if err.is_redirect() {
            "Redirect"
        } else if err.is_builder() {
            "Builder"
        } else if err.is_decode() {
            "Decode"
        } else if err.is_body() {
            "Body"
        } else if err.is_request() {
            "Request"
        } else {
            "Transport"
        };
        ClientError::Transport {
            kind: kind.to_string(),
            description: err.to_string(),
        }
    }
}
