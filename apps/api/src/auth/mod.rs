pub mod handlers;
pub mod middleware;
pub mod password;
pub mod token;

use tracing::info;

use crate::config::AdminSeed;
use crate::errors::AppError;
use crate::models::user::{NewUser, Role, RoleKind};
use crate::store::UserRepository;

/// Creates the configured admin account unless one with that email already exists.
pub async fn seed_admin(users: &dyn UserRepository, seed: &AdminSeed) -> Result<(), AppError> {
    let email = handlers::normalize_email(&seed.email);
    if users.find_by_email(&email).await?.is_some() {
        info!("Admin {email} already present");
        return Ok(());
    }

    let password_hash = password::hash_password(seed.password.clone()).await?;
    let admin = users
        .insert(NewUser {
            name: "Admin".to_string(),
            email,
            phone: None,
            password_hash,
            role: Role::initial(RoleKind::Admin),
        })
        .await?;
    info!("Seeded admin account {}", admin.id);
    Ok(())
}
