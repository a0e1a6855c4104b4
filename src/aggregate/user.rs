//! User Aggregate
//!
//! Registration and identity lifecycle. Authentication/session issuance is
//! an external collaborator; only profile identity lives here.

use crate::domain::{Clock, DomainError, UserChanges, UserEvent};

use super::{AggregateRoot, NEW_AGGREGATE_VERSION};

/// User status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserStatus {
    #[default]
    Active,
    Deactivated,
}

/// User Aggregate
#[derive(Debug, Clone)]
pub struct User {
    id: String,
    username: String,
    email: String,
    display_name: Option<String>,
    status: UserStatus,
    version: i64,
    pending: Vec<UserEvent>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: String::new(),
            username: String::new(),
            email: String::new(),
            display_name: None,
            status: UserStatus::Active,
            version: NEW_AGGREGATE_VERSION,
            pending: Vec::new(),
        }
    }
}

impl User {
    /// Register a new user and emit the registration event.
    pub fn register(
        id: impl Into<String>,
        username: &str,
        email: &str,
        display_name: Option<String>,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        if username.trim().is_empty() {
            return Err(DomainError::validation("username must not be empty"));
        }
        validate_email(email)?;

        let mut user = Self::default();
        user.apply(UserEvent::UserRegistered {
            user_id: id.into(),
            username: username.to_string(),
            email: email.to_string(),
            display_name,
            registered_at: clock.now(),
        });

        Ok(user)
    }

    /// Update the profile. At least one change must be provided.
    pub fn update_profile(
        &mut self,
        changes: UserChanges,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_active()?;
        if changes.is_empty() {
            return Err(DomainError::validation("no changes provided"));
        }
        if let Some(email) = &changes.email {
            validate_email(email)?;
        }

        self.apply(UserEvent::UserProfileUpdated {
            user_id: self.id.clone(),
            changes,
            updated_at: clock.now(),
        });
        Ok(())
    }

    /// Deactivate the user (suspension, reversible).
    pub fn deactivate(
        &mut self,
        reason: Option<String>,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_active()?;

        self.apply(UserEvent::UserDeactivated {
            user_id: self.id.clone(),
            reason,
            deactivated_at: clock.now(),
        });
        Ok(())
    }

    /// Reactivate a deactivated user.
    pub fn reactivate(&mut self, clock: &dyn Clock) -> Result<(), DomainError> {
        if self.status != UserStatus::Deactivated {
            return Err(DomainError::invariant("user is not deactivated"));
        }

        self.apply(UserEvent::UserReactivated {
            user_id: self.id.clone(),
            reactivated_at: clock.now(),
        });
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.status == UserStatus::Deactivated {
            return Err(DomainError::invariant(format!(
                "user {} is deactivated",
                self.id
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
    });
    if !valid {
        return Err(DomainError::validation(format!(
            "invalid email address: {email}"
        )));
    }
    Ok(())
}

impl AggregateRoot for User {
    type Event = UserEvent;

    fn aggregate_type() -> &'static str {
        "User"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn version_mut(&mut self) -> &mut i64 {
        &mut self.version
    }

    fn pending(&self) -> &[UserEvent] {
        &self.pending
    }

    fn pending_mut(&mut self) -> &mut Vec<UserEvent> {
        &mut self.pending
    }

    fn when(&mut self, event: &UserEvent) {
        match event {
            UserEvent::UserRegistered {
                user_id,
                username,
                email,
                display_name,
                ..
            } => {
                self.id = user_id.clone();
                self.username = username.clone();
                self.email = email.clone();
                self.display_name = display_name.clone();
                self.status = UserStatus::Active;
            }

            UserEvent::UserProfileUpdated { changes, .. } => {
                if let Some(display_name) = &changes.display_name {
                    self.display_name = Some(display_name.clone());
                }
                if let Some(email) = &changes.email {
                    self.email = email.clone();
                }
            }

            UserEvent::UserDeactivated { .. } => {
                self.status = UserStatus::Deactivated;
            }

            UserEvent::UserReactivated { .. } => {
                self.status = UserStatus::Active;
            }
        }
    }
}
