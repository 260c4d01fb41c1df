use stripe::Client;

use crate::billing::SecretKey;

/// Builds a Stripe client bound to a single secret key.
/// Test and live keys get separate clients, so no global mode switch exists.
pub fn create_client(secret_key: &SecretKey) -> Client {
    Client::new(secret_key.expose())
}
