//! Authentication events and their subscribers.
//!
//! The registry is assembled once at startup, wrapped in `web::Data`, and handed to
//! the login/logout handlers. Nothing here is global.

use std::fmt;
use std::net::IpAddr;

/// Log target for the audit trail.
pub const AUDIT_TARGET: &str = "kupolls::audit";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn {
        user_id: i32,
        name: String,
        ip: Option<IpAddr>,
    },
    LoggedOut {
        user_id: i32,
        name: String,
        ip: Option<IpAddr>,
    },
    LoginFailed {
        name: String,
        ip: Option<IpAddr>,
    },
}

struct DisplayIp(Option<IpAddr>);

impl fmt::Display for DisplayIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ip) => write!(f, "{}", ip),
            None => f.write_str("unknown"),
        }
    }
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthEvent::LoggedIn { user_id, name, ip } => write!(
                f,
                "Login user: {} (user_id: {}) via ip: {}",
                name,
                user_id,
                DisplayIp(*ip)
            ),
            AuthEvent::LoggedOut { user_id, name, ip } => write!(
                f,
                "Logout user: {} (user_id: {}) via ip: {}",
                name,
                user_id,
                DisplayIp(*ip)
            ),
            AuthEvent::LoginFailed { name, ip } => write!(
                f,
                "Login failed for: {} via ip: {}",
                name,
                DisplayIp(*ip)
            ),
        }
    }
}

type Subscriber = Box<dyn Fn(&AuthEvent) + Send + Sync>;

/// Callbacks invoked, in subscription order, for every authentication event.
#[derive(Default)]
pub struct AuthEvents {
    subscribers: Vec<Subscriber>,
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&AuthEvent) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(f));
        self
    }

    pub fn emit(&self, event: &AuthEvent) {
        for subscriber in &self.subscribers {
            subscriber(event);
        }
    }
}

impl fmt::Debug for AuthEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthEvents")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Audit subscriber: writes the event to the log.
pub fn log_auth_event(event: &AuthEvent) {
    match event {
        AuthEvent::LoginFailed { .. } => log::warn!(target: AUDIT_TARGET, "{}", event),
        _ => log::info!(target: AUDIT_TARGET, "{}", event),
    }
}

/// Registry with the audit subscriber attached.
pub fn with_audit_log() -> AuthEvents {
    let mut events = AuthEvents::new();
    events.subscribe(log_auth_event);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_subscribers_receive_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut events = AuthEvents::new();

        let first = seen.clone();
        events.subscribe(move |e| first.lock().unwrap().push(format!("first: {}", e)));
        let second = seen.clone();
        events.subscribe(move |e| second.lock().unwrap().push(format!("second: {}", e)));

        events.emit(&AuthEvent::LoginFailed {
            name: "nice".to_owned(),
            ip: None,
        });

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                "first: Login failed for: nice via ip: unknown".to_owned(),
                "second: Login failed for: nice via ip: unknown".to_owned(),
            ]
        );
    }

    #[test]
    fn test_event_display_includes_ip() {
        let event = AuthEvent::LoggedIn {
            user_id: 3,
            name: "nice".to_owned(),
            ip: Some("10.0.0.2".parse().unwrap()),
        };
        assert_eq!(
            event.to_string(),
            "Login user: nice (user_id: 3) via ip: 10.0.0.2"
        );
    }

    #[test]
    fn test_with_audit_log_has_one_subscriber() {
        assert_eq!(format!("{:?}", with_audit_log()), "AuthEvents { subscribers: 1 }");
        assert_eq!(format!("{:?}", AuthEvents::new()), "AuthEvents { subscribers: 0 }");
    }
}
