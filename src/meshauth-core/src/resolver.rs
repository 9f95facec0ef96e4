//! Resolves the peer behind a connection into a verified identity.
use crate::error::lookup::LookupError;
use crate::identity::PeerIdentity;
use crate::oracle::IdentityOracle;
use lazy_static::lazy_static;
use regex::Regex;
use slog::{debug, o, warn, Logger};
use std::fmt;
use std::future::pending;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

lazy_static! {
    static ref HOSTNAME: Regex = Regex::new(
        r"^(?i:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)(?:\.(?i:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?))*\.?$"
    )
    .unwrap();
    static ref IPV6_ZONE: Regex = Regex::new(r"^[A-Za-z0-9._-]+$").unwrap();
}

/// The remote end of a connection, as `host:port`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteAddress {
    host: String,
    port: u16,
}

impl RemoteAddress {
    /// Accepts an IP literal (IPv6 optionally bracketed or zoned) or a hostname.
    /// Brackets are only allowed around IPv6.
    pub fn new(host: &str, port: u16) -> Result<Self, LookupError> {
        let valid = match host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            Some(inner) => is_ipv6_literal(inner).then_some(inner),
            None => (is_ipv4_literal(host) || is_ipv6_literal(host) || is_hostname(host))
                .then_some(host),
        };
        match valid {
            Some(host) => Ok(Self {
                host: host.to_string(),
                port,
            }),
            None => Err(LookupError::InvalidHost(host.to_string())),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

fn is_ipv4_literal(host: &str) -> bool {
    host.parse::<Ipv4Addr>().is_ok()
}

fn is_ipv6_literal(host: &str) -> bool {
    // Link-local IPv6 may carry a zone, e.g. fe80::1%eth0.
    let (ip, zone) = match host.split_once('%') {
        Some((ip, zone)) => (ip, Some(zone)),
        None => (host, None),
    };
    ip.parse::<Ipv6Addr>().is_ok() && zone.map_or(true, |zone| IPV6_ZONE.is_match(zone))
}

/// An all-numeric last label would read as a malformed IPv4 address.
fn is_hostname(host: &str) -> bool {
    let top_label = host.trim_end_matches('.').rsplit('.').next().unwrap_or_default();
    host.len() <= 253
        && HOSTNAME.is_match(host)
        && !top_label.chars().all(|c| c.is_ascii_digit())
}

/// Cancellation and deadline of the request a lookup is made for.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels every context derived from [`RequestContext::with_cancel`].
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancel = Some(rx);
        (self, CancelHandle(tx))
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    async fn cancelled(&self) {
        match self.cancel.clone() {
            // A dropped handle can no longer cancel.
            Some(mut rx) => {
                if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                    pending::<()>().await
                }
            }
            None => pending().await,
        }
    }

    async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => pending().await,
        }
    }
}

/// Looks up peers through an [`IdentityOracle`], one round trip per call.
#[derive(Clone)]
pub struct PeerResolver {
    oracle: Arc<dyn IdentityOracle>,
    log: Logger,
}

impl PeerResolver {
    pub fn new(oracle: Arc<dyn IdentityOracle>, log: &Logger) -> Self {
        Self {
            oracle,
            log: log.new(o!("component" => "resolver")),
        }
    }

    pub async fn resolve_peer(
        &self,
        ctx: &RequestContext,
        host: &str,
        port: u16,
    ) -> Result<PeerIdentity, LookupError> {
        let address = RemoteAddress::new(host, port)?.to_string();
        debug!(self.log, "Looking up peer"; "address" => &address);

        let result = tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(LookupError::Cancelled { address: address.clone() }),
            _ = ctx.expired() => Err(LookupError::DeadlineExceeded { address: address.clone() }),
            who = self.oracle.who_is(&address) => who.map_err(|source| LookupError::WhoIsFailed {
                address: address.clone(),
                source,
            }),
        };

        match &result {
            Ok(identity) => debug!(
                self.log,
                "Resolved peer";
                "address" => &address,
                "computed_name" => &identity.computed_name,
                "tags" => identity.tags.len()
            ),
            Err(err) => warn!(self.log, "Peer lookup failed: {}", err; "address" => &address),
        }
        result
    }
}
