//! Application-wide constants
//!
//! User-facing strings shared between handlers and tests.

/// Indicator shown on the index page when there is nothing to list.
pub const NO_POLLS_MESSAGE: &str = "No polls are available.";

/// Notice shown when a closed or unpublished question is opened.
pub const VOTING_NOT_ALLOWED: &str = "Voting is not allowed!";

/// Inline form error for a missing or foreign choice.
pub const SELECT_CHOICE_ERROR: &str = "Please select one choice below for voting.";

/// Notice shown after a vote was recorded.
pub const VOTE_RECORDED: &str = "Your vote was recorded.";

/// Generic login failure, used for both unknown names and bad passwords.
pub const BAD_CREDENTIALS: &str = "Invalid username or password.";

/// Where a visitor lands by default.
pub const INDEX_URL: &str = "/polls/";

/// Login page path.
pub const LOGIN_URL: &str = "/accounts/login/";

/// Default username displayed for unauthenticated users
pub const GUEST_USERNAME: &str = "Guest";
