//! Worker identities and their durable cookie bindings.

use std::fmt;

use serde::Serialize;

/// Caller-supplied identity of a worker that is (re)connecting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WorkerIdentity {
    pub uuid: String,
    pub hostname: String,
    pub ip_address: String,
}

impl WorkerIdentity {
    pub fn new(
        uuid: impl Into<String>,
        hostname: impl Into<String>,
        ip_address: impl Into<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            hostname: hostname.into(),
            ip_address: ip_address.into(),
        }
    }
}

impl fmt::Display for WorkerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}/{}]", self.uuid, self.hostname, self.ip_address)
    }
}

/// Durable binding of a worker uuid to its handshake cookie.
///
/// Exactly one record exists per `uuid`. The uuid is fixed at creation; the
/// cookie and network attributes are overwritten in place on later writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerRecord {
    uuid: String,
    pub cookie: String,
    pub hostname: String,
    pub ip_address: String,
}

impl WorkerRecord {
    pub fn new(identity: &WorkerIdentity, cookie: impl Into<String>) -> Self {
        Self {
            uuid: identity.uuid.clone(),
            cookie: cookie.into(),
            hostname: identity.hostname.clone(),
            ip_address: identity.ip_address.clone(),
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Overwrite cookie and network attributes, keeping the uuid.
    pub fn update(&mut self, cookie: impl Into<String>, identity: &WorkerIdentity) {
        self.cookie = cookie.into();
        self.relocate(identity);
    }

    /// Take the identity's hostname and ip address, keeping the cookie.
    pub fn relocate(&mut self, identity: &WorkerIdentity) {
        self.hostname.clone_from(&identity.hostname);
        self.ip_address.clone_from(&identity.ip_address);
    }

    /// True when the stored hostname and ip address both equal the identity's.
    pub fn matches_location(&self, identity: &WorkerIdentity) -> bool {
        self.hostname == identity.hostname && self.ip_address == identity.ip_address
    }
}
