// Bootstrap admin account
// Decision: seed at startup rather than lazily at login, so the admin
// exists before the first request and restarts stay idempotent

use anyhow::{Context, Result};
use daybook_storage::{CreateUser, StorageBackend};

use super::config::{AuthConfig, AuthStrategy};
use super::token::generate_opaque_token;
use daybook_storage::password::hash_password;

/// Ensure the configured admin account exists, creating it on first start.
///
/// The signed strategy needs AUTH_ADMIN_PASSWORD to seed anything; without
/// it the server starts with no admin and logs a warning. The stored
/// strategy always seeds, generating an opaque token when none is
/// configured and printing it once so the operator can hand it out.
pub async fn ensure_bootstrap_admin(store: &StorageBackend, config: &AuthConfig) -> Result<()> {
    let admin = &config.admin;

    if let Some(existing) = store
        .get_user_by_username(&admin.username)
        .await
        .context("failed to look up admin account")?
    {
        tracing::debug!(username = %existing.username, "admin account already present");
        return Ok(());
    }

    let input = match config.strategy {
        AuthStrategy::Signed => {
            let Some(password) = admin.password.as_deref() else {
                tracing::warn!(
                    "AUTH_ADMIN_PASSWORD not set; no admin account was seeded"
                );
                return Ok(());
            };
            CreateUser {
                username: admin.username.clone(),
                password_hash: Some(hash_password(password)?),
                token: None,
                settings: None,
                is_admin: true,
            }
        }
        AuthStrategy::Stored => {
            let token = match admin.token.clone() {
                Some(token) => token,
                None => {
                    let token = generate_opaque_token();
                    // Printed exactly once, on first start; there is no
                    // other way for the operator to obtain it.
                    tracing::warn!(
                        username = %admin.username,
                        token = %token,
                        "AUTH_ADMIN_TOKEN not set; generated an admin token"
                    );
                    token
                }
            };
            CreateUser {
                username: admin.username.clone(),
                password_hash: None,
                token: Some(token),
                settings: None,
                is_admin: true,
            }
        }
    };

    let user = store
        .create_user(input)
        .await
        .context("failed to seed admin account")?;
    tracing::info!(username = %user.username, id = %user.id, "seeded admin account");
    Ok(())
}
