use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Per-`Subscriber` MQTT session lifecycle (`spec.md` §4.3.1).
///
/// Mirrors the shape of `driver::ConnectionState` in this codebase: an enum
/// plus fallible transition methods, one test per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl SessionState {
    pub fn can_connect(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub fn to_connecting(&self) -> std::result::Result<Self, &'static str> {
        match self {
            Self::Disconnected => Ok(Self::Connecting),
            _ => Err("can only connect from Disconnected"),
        }
    }

    pub fn to_connected(&self) -> std::result::Result<Self, &'static str> {
        match self {
            Self::Connecting => Ok(Self::Connected),
            _ => Err("can only complete connection from Connecting"),
        }
    }

    pub fn to_disconnecting(&self) -> std::result::Result<Self, &'static str> {
        match self {
            Self::Connected => Ok(Self::Disconnecting),
            _ => Err("can only disconnect from Connected"),
        }
    }

    pub fn to_disconnected(&self) -> Self {
        Self::Disconnected
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Disconnected
    }
}

/// A live MQTT session owner (`spec.md` §3). Aggregate root for a
/// connect/disconnect session; deletion is allowed only when disconnected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Option<i64>,
    pub is_enabled: bool,
    pub keep_alive: u16,
    pub use_persistent_session: bool,
    pub session_expiry: u32,
    pub username: Option<String>,
    pub password: Option<String>,
    pub broker_id: i64,
    #[serde(skip)]
    pub state: SessionState,
    pub timestamp_last_connection: Option<DateTime<Utc>>,
}

impl Subscriber {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        broker_id: i64,
        is_enabled: bool,
        keep_alive: u16,
        use_persistent_session: bool,
        session_expiry: u32,
        username: Option<String>,
        password: Option<String>,
        broker_is_auth_required: bool,
    ) -> Result<Self> {
        if broker_is_auth_required && username.as_deref().unwrap_or("").is_empty() {
            return Err(DomainError::InvalidSubscriberConfig(
                "broker requires authentication: username must be set".to_string(),
            ));
        }
        Ok(Self {
            id: None,
            is_enabled,
            keep_alive,
            use_persistent_session,
            session_expiry,
            username,
            password,
            broker_id,
            state: SessionState::Disconnected,
            timestamp_last_connection: None,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Mirrors `Subscriber.connect`'s final state-confirmation step
    /// (`spec.md` §4.3.1 step 7): called once the client reports connected.
    pub fn mark_connected(&mut self, at: DateTime<Utc>) {
        self.state = SessionState::Connected;
        self.timestamp_last_connection = Some(at);
    }

    pub fn mark_disconnected(&mut self) {
        self.state = SessionState::Disconnected;
    }

    /// Deletion is only allowed while disconnected (`spec.md` §3).
    pub fn can_delete(&self) -> bool {
        !self.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(auth_required: bool, username: Option<&str>) -> Result<Subscriber> {
        Subscriber::new(
            1,
            true,
            60,
            false,
            0,
            username.map(String::from),
            None,
            auth_required,
        )
    }

    #[test]
    fn test_new_without_auth_ok() {
        assert!(make(false, None).is_ok());
    }

    #[test]
    fn test_auth_required_without_username_rejected() {
        assert!(make(true, None).is_err());
    }

    #[test]
    fn test_auth_required_with_username_ok() {
        assert!(make(true, Some("svc-acct")).is_ok());
    }

    #[test]
    fn test_initial_state_disconnected() {
        let sub = make(false, None).unwrap();
        assert_eq!(sub.state, SessionState::Disconnected);
        assert!(!sub.is_connected());
        assert!(sub.can_delete());
    }

    #[test]
    fn test_session_state_transitions() {
        let mut state = SessionState::Disconnected;
        state = state.to_connecting().unwrap();
        assert_eq!(state, SessionState::Connecting);
        state = state.to_connected().unwrap();
        assert_eq!(state, SessionState::Connected);
        state = state.to_disconnecting().unwrap();
        assert_eq!(state, SessionState::Disconnecting);
        state = state.to_disconnected();
        assert_eq!(state, SessionState::Disconnected);
    }

    #[test]
    fn test_cannot_connect_from_connected() {
        assert!(SessionState::Connected.to_connecting().is_err());
    }

    #[test]
    fn test_cannot_disconnect_from_disconnected() {
        assert!(SessionState::Disconnected.to_disconnecting().is_err());
    }

    #[test]
    fn test_mark_connected_updates_timestamp() {
        let mut sub = make(false, None).unwrap();
        let now = Utc::now();
        sub.mark_connected(now);
        assert!(sub.is_connected());
        assert_eq!(sub.timestamp_last_connection, Some(now));
        assert!(!sub.can_delete());
    }

    #[test]
    fn test_mark_disconnected() {
        let mut sub = make(false, None).unwrap();
        sub.mark_connected(Utc::now());
        sub.mark_disconnected();
        assert!(!sub.is_connected());
        assert!(sub.can_delete());
    }
}
