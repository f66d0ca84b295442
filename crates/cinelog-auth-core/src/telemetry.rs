//! Metric names and recording helpers
//!
//! Counters go through the `metrics` facade; without an installed recorder
//! they are no-ops.

/// Authentication outcomes, labelled by `outcome`
pub const AUTH_OUTCOMES: &str = "cinelog_auth_outcomes_total";
/// Username inserts rejected by the username unique constraint
pub const USERNAME_COLLISIONS: &str = "cinelog_username_collisions_total";
/// Provisioning runs repeated after losing an email race
pub const PROVISIONING_RETRIES: &str = "cinelog_provisioning_retries_total";

pub(crate) fn record_outcome(outcome: &'static str) {
    metrics::counter!(AUTH_OUTCOMES, "outcome" => outcome).increment(1);
}

pub(crate) fn record_username_collision() {
    metrics::counter!(USERNAME_COLLISIONS).increment(1);
}

pub(crate) fn record_provisioning_retry() {
    metrics::counter!(PROVISIONING_RETRIES).increment(1);
}

/// Register descriptions for every counter with the installed recorder
pub fn describe() {
    metrics::describe_counter!(AUTH_OUTCOMES, "Authentication outcomes by kind");
    metrics::describe_counter!(
        USERNAME_COLLISIONS,
        "Username inserts rejected as already taken"
    );
    metrics::describe_counter!(
        PROVISIONING_RETRIES,
        "Provisioning runs repeated after an email race"
    );
}
