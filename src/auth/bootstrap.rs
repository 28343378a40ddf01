use crate::{
    auth::password::hash_password,
    config::BootstrapAdmin,
    model::administrator::NewAdministrator,
    store::AdminRepository,
};
use anyhow::{Context, anyhow};
use chrono::Local;
use tracing::info;

/// Creates the configured staff administrator unless the username already exists.
/// Returns `true` when an account was created.
pub async fn ensure_admin(
    admins: &dyn AdminRepository,
    seed: &BootstrapAdmin,
) -> anyhow::Result<bool> {
    if admins
        .find_admin_by_username(&seed.username)
        .await
        .context("looking up bootstrap administrator")?
        .is_some()
    {
        info!(username = %seed.username, "Bootstrap administrator already present");
        return Ok(false);
    }

    let password_hash =
        hash_password(&seed.password).map_err(|e| anyhow!("hashing bootstrap password: {e}"))?;

    let admin = admins
        .insert_admin(
            NewAdministrator {
                id_administrator: seed.id_administrator.clone(),
                username: seed.username.clone(),
                email: seed.email.clone(),
                phone_number: seed.phone_number,
                password_hash,
                is_staff: true,
            },
            Local::now().naive_local(),
        )
        .await
        .context("creating bootstrap administrator")?;

    info!(admin_id = admin.id, username = %admin.username, "Bootstrap administrator created");
    Ok(true)
}
