//! One-shot notices carried across a redirect in the session cookie.

use actix_session::Session;
use serde::{Deserialize, Serialize};

const NOTICE_SESSION_KEY: &str = "notices";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Info,
    Success,
}

impl Level {
    /// CSS class used by the templates.
    pub fn css_class(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "success",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
    /// Optional (href, label) pair rendered after the message.
    pub link: Option<(String, String)>,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
            link: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, href: impl Into<String>, label: impl Into<String>) -> Self {
        self.link = Some((href.into(), label.into()));
        self
    }

    pub fn css_class(&self) -> &'static str {
        self.level.css_class()
    }

    pub fn has_link(&self) -> bool {
        self.link.is_some()
    }

    pub fn link_href(&self) -> &str {
        self.link.as_ref().map(|(href, _)| href.as_str()).unwrap_or("")
    }

    pub fn link_label(&self) -> &str {
        self.link.as_ref().map(|(_, label)| label.as_str()).unwrap_or("")
    }
}

/// Queues a notice for the next rendered page.
pub fn push(session: &Session, notice: Notice) {
    let mut notices = session
        .get::<Vec<Notice>>(NOTICE_SESSION_KEY)
        .unwrap_or_default()
        .unwrap_or_default();
    notices.push(notice);
    if let Err(e) = session.insert(NOTICE_SESSION_KEY, notices) {
        log::error!("notice::push: session.insert() {}", e);
    }
}

/// Removes and returns every queued notice.
pub fn take(session: &Session) -> Vec<Notice> {
    match session.remove_as::<Vec<Notice>>(NOTICE_SESSION_KEY) {
        Some(Ok(notices)) => notices,
        Some(Err(raw)) => {
            log::warn!("notice::take: discarding malformed notices {}", raw);
            Vec::new()
        }
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_map_to_template_classes() {
        let info = Notice::info("Voting is not allowed!");
        assert_eq!(info.css_class(), "info");
        assert!(!info.has_link());
        assert_eq!(info.link_href(), "");

        let success = Notice::success("Your vote was recorded.").with_link("/polls/3/", "Vote again");
        assert_eq!(success.css_class(), "success");
        assert_eq!(success.link_href(), "/polls/3/");
        assert_eq!(success.link_label(), "Vote again");
    }
}
