//! Message text construction
//!
//! Messages are assembled from three fixed vocabularies. Every call draws one
//! action, one user and one error phrase, then composes them by level.

use rand::Rng;

use super::Severity;

pub const ACTIONS: [&str; 7] = [
    "processing request",
    "connecting to database",
    "fetching user data",
    "updating cache",
    "validating input",
    "generating report",
    "sending notification",
];

pub const USERS: [&str; 5] = ["user123", "admin", "guest", "service_account", "api_client"];

pub const ERRORS: [&str; 5] = [
    "connection timeout",
    "invalid credentials",
    "resource not found",
    "permission denied",
    "internal server error",
];

fn pick<'a, R: Rng>(items: &[&'a str], rng: &mut R) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

/// Build the message text for a record at `level`
pub fn build_message<R: Rng>(level: Severity, rng: &mut R) -> String {
    let action = pick(&ACTIONS, rng);
    let user = pick(&USERS, rng);
    let error = pick(&ERRORS, rng);

    match level {
        Severity::Trace => format!("trace {}", action),
        Severity::Debug => format!("debug {}", action),
        Severity::Info => format!("info {} user={}", action, user),
        Severity::Warn => format!("warn possible issue action={}", action),
        Severity::Error | Severity::Critical | Severity::Fatal => format!("error {} user={}", error, user),
    }
}
