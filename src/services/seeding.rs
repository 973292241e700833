use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info};

use crate::auth::password::hash_password;
use crate::config::BootstrapAdmin;
use crate::database::{Database, StoreError};
use crate::models::{Admin, DEFAULT_ADMIN_ROLE};
use crate::repositories::AdminRepository;

pub struct SeedingService {
    database: Database,
}

impl SeedingService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Creates the configured admin unless an account with that email exists.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, bootstrap: &BootstrapAdmin) -> Result<bool> {
        let admin_repo = AdminRepository::new(&self.database);

        if admin_repo.find_by_email(&bootstrap.email).await?.is_some() {
            debug!("Bootstrap admin {} already exists", bootstrap.email);
            return Ok(false);
        }

        self.create_admin(&bootstrap.email, &bootstrap.password, &bootstrap.name).await?;
        info!("Created bootstrap admin {}", bootstrap.email);
        Ok(true)
    }

    /// Fails with a [`StoreError::Duplicate`] source when the email is taken.
    pub async fn create_admin(&self, email: &str, password: &str, name: &str) -> Result<Admin> {
        let admin_repo = AdminRepository::new(&self.database);
        let now = Utc::now();

        let admin = Admin {
            id: String::new(),
            email: email.trim().to_lowercase(),
            password_hash: hash_password(password)?,
            name: name.trim().to_string(),
            role: DEFAULT_ADMIN_ROLE.to_string(),
            created_at: now,
            updated_at: now,
        };

        match admin_repo.create_admin(&admin).await {
            Ok(created) => Ok(created),
            Err(StoreError::Duplicate) => Err(StoreError::Duplicate)
                .with_context(|| format!("An admin with email {} already exists", admin.email)),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates the admin, or resets the password of an existing one.
    pub async fn upsert_admin(&self, email: &str, password: &str, name: &str) -> Result<Admin> {
        let admin_repo = AdminRepository::new(&self.database);

        match admin_repo.find_by_email(email).await? {
            Some(existing) => {
                admin_repo.update_password(&existing.id, &hash_password(password)?).await?;
                info!("Reset password for admin {}", existing.email);
                Ok(existing)
            }
            None => self.create_admin(email, password, name).await,
        }
    }
}
