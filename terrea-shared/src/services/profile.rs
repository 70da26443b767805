/// Profile use-cases
///
/// Registration, login/logout, profile updates, account deletion and
/// profile views. Every operation that changes what a profile view shows
/// also drops the cached view.

use std::sync::Arc;

use super::{build_profile_view, invalidate_all, project_cache_keys};
use crate::auth::password::CredentialHasher;
use crate::auth::resolver::SessionResolver;
use crate::auth::token::TokenManager;
use crate::db::repository::StoreError;
use crate::db::Repositories;
use crate::error::{AuthFailure, ServiceError};
use crate::models::project::ProjectKey;
use crate::models::task::TaskKey;
use crate::models::user::{self, NewUser, ProfileView, User, UserKey, UserPatch};
use crate::notifications::{EmailJob, Notifier};
use crate::redis::cache::{CacheKey, CachedView, ViewCache};
use crate::validation;

pub const USER_EXISTS: &str = "User already exists";
pub const USERNAME_TAKEN: &str = "Username is already taken";
pub const ALREADY_LOGGED_IN: &str = "User is already login";
pub const USER_NOT_FOUND: &str = "User doesn't exist";

/// Input for registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Input for login
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Input for a profile update; every field is replaced
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_active: bool,
}

/// An authenticated user and a freshly issued session token
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Profile use-cases
#[derive(Clone)]
pub struct ProfileService {
    repos: Repositories,
    hasher: Arc<CredentialHasher>,
    tokens: Arc<TokenManager>,
    resolver: SessionResolver,
    cache: Arc<dyn ViewCache>,
    notifier: Arc<dyn Notifier>,
    default_role_id: i64,
}

impl ProfileService {
    pub fn new(
        repos: Repositories,
        hasher: Arc<CredentialHasher>,
        tokens: Arc<TokenManager>,
        cache: Arc<dyn ViewCache>,
        notifier: Arc<dyn Notifier>,
        default_role_id: i64,
    ) -> Self {
        let resolver = SessionResolver::new(tokens.clone(), repos.users.clone());
        Self {
            repos,
            hasher,
            tokens,
            resolver,
            cache,
            notifier,
            default_role_id,
        }
    }

    /// Creates an account and opens a session for it
    ///
    /// A confirmation e-mail is queued afterwards; failing to queue it is
    /// logged and does not fail the registration.
    pub async fn register(&self, input: Registration) -> Result<Session, ServiceError> {
        if self.find_by_email(&input.email).await?.is_some() {
            tracing::warn!(email = %input.email, "Registration rejected: {}", USER_EXISTS);
            return Err(ServiceError::conflict(USER_EXISTS));
        }

        if self.find_by_username(&input.username).await?.is_some() {
            tracing::warn!(username = %input.username, "Registration rejected: {}", USERNAME_TAKEN);
            return Err(ServiceError::conflict(USERNAME_TAKEN));
        }

        validation::check_credentials(&[
            ("username", input.username.as_str()),
            ("password", input.password.as_str()),
        ])?;

        let password = self.hash(input.password).await?;
        let user = self
            .repos
            .users
            .insert(NewUser {
                username: input.username,
                email: input.email,
                password,
                role_id: self.default_role_id,
            })
            .await
            .map_err(user_conflict)?;

        let token = self.issue(&user)?;
        tracing::info!(user_id = user.id, username = %user.username, "User registered");

        let job = EmailJob::registration(&user.email, &user.username);
        if let Err(e) = self.notifier.dispatch(job).await {
            tracing::error!(user_id = user.id, error = %e, "Failed to queue registration e-mail");
        }

        Ok(Session { user, token })
    }

    /// Verifies credentials and opens a session
    ///
    /// `existing_token` is the session cookie already on the request, if
    /// any. A token that still resolves to a user is a `Conflict`; a stale
    /// one is ignored. Unknown e-mail and wrong password fail identically.
    pub async fn login(
        &self,
        existing_token: Option<&str>,
        credentials: Credentials,
    ) -> Result<Session, ServiceError> {
        if let Some(token) = existing_token {
            match self.resolver.resolve_token(token).await {
                Ok(current) => {
                    tracing::warn!(user_id = current.id, "Login rejected: {}", ALREADY_LOGGED_IN);
                    return Err(ServiceError::conflict(ALREADY_LOGGED_IN));
                }
                Err(ServiceError::Unauthorized(_)) => {
                    tracing::debug!("Ignoring stale session cookie at login");
                }
                Err(e) => return Err(e),
            }
        }

        let Some(mut user) = self.find_by_email(&credentials.email).await? else {
            return Err(bad_credentials(&credentials.email));
        };

        if !self.verify(credentials.password, user.password.clone()).await? {
            return Err(bad_credentials(&credentials.email));
        }

        if !user.is_active {
            user = self
                .set_active(&user, true)
                .await?
                .ok_or(ServiceError::Unauthorized(AuthFailure::UserNotFound))?;
        }

        let token = self.issue(&user)?;
        tracing::info!(user_id = user.id, "User logged in");

        Ok(Session { user, token })
    }

    /// Marks the user inactive; the caller clears the cookie
    pub async fn logout(&self, user: &User) -> Result<(), ServiceError> {
        self.set_active(user, false).await?;
        tracing::info!(user_id = user.id, "User logged out");
        Ok(())
    }

    /// Replaces the user's profile and rotates the session token
    ///
    /// The password is re-hashed even when unchanged. The new token is bound
    /// to the new e-mail address.
    pub async fn update_profile(
        &self,
        user: &User,
        input: ProfileUpdate,
    ) -> Result<(ProfileView, String), ServiceError> {
        validation::check_credentials(&[
            ("username", input.username.as_str()),
            ("password", input.password.as_str()),
        ])?;

        if input.username != user.username && self.find_by_username(&input.username).await?.is_some() {
            return Err(ServiceError::conflict(USERNAME_TAKEN));
        }
        if input.email != user.email && self.find_by_email(&input.email).await?.is_some() {
            return Err(ServiceError::conflict(USER_EXISTS));
        }

        let password = self.hash(input.password).await?;
        let updated = self
            .repos
            .users
            .update(
                &UserKey::Id(user.id),
                UserPatch {
                    username: Some(input.username),
                    email: Some(input.email),
                    password: Some(password),
                    is_active: Some(input.is_active),
                },
            )
            .await
            .map_err(user_conflict)?
            .ok_or(ServiceError::Unauthorized(AuthFailure::UserNotFound))?;

        self.cache.invalidate(&CacheKey::Profile(user.username.clone())).await;
        self.cache.invalidate(&CacheKey::Profile(updated.username.clone())).await;

        let token = self.issue(&updated)?;
        tracing::info!(user_id = updated.id, "Profile updated; session rotated");

        let view = self.profile(&updated).await?;
        Ok((view, token))
    }

    /// Deletes the account and everything that cascades from it
    pub async fn delete_account(&self, user: &User) -> Result<(), ServiceError> {
        // Cached views of every project this account touches go stale.
        let mut projects = self.repos.projects.find_many(&ProjectKey::Owner(user.id)).await?;
        let mut tasks = self.repos.tasks.find_many(&TaskKey::Performer(user.id)).await?;
        tasks.extend(self.repos.tasks.find_many(&TaskKey::Customer(user.id)).await?);
        for task in tasks {
            if projects.iter().all(|p| p.id != task.project_id) {
                if let Some(project) = self.repos.projects.find_one(&ProjectKey::Id(task.project_id)).await? {
                    projects.push(project);
                }
            }
        }
        let mut stale = vec![CacheKey::Profile(user.username.clone())];
        for project in &projects {
            stale.extend(project_cache_keys(&self.repos, project).await);
        }

        self.repos.users.delete(&UserKey::Id(user.id)).await?;
        invalidate_all(&self.cache, &stale).await;

        tracing::info!(user_id = user.id, "User deleted");
        Ok(())
    }

    /// Profile of the acting user
    pub async fn me(&self, user: &User) -> Result<ProfileView, ServiceError> {
        self.profile(user).await
    }

    /// Profile of another user by username
    pub async fn other(&self, username: &str) -> Result<ProfileView, ServiceError> {
        validation::check_path_segment("username", username)?;

        let key = CacheKey::Profile(username.to_string());
        if let Some(CachedView::Profile(view)) = self.cache.get(&key).await {
            return Ok(view);
        }

        let user = self.find_by_username(username).await?.ok_or_else(|| {
            tracing::warn!(username, "{}", USER_NOT_FOUND);
            ServiceError::not_found(USER_NOT_FOUND)
        })?;

        self.profile(&user).await
    }

    async fn profile(&self, user: &User) -> Result<ProfileView, ServiceError> {
        let key = CacheKey::Profile(user.username.clone());
        if let Some(CachedView::Profile(view)) = self.cache.get(&key).await {
            return Ok(view);
        }

        let view = build_profile_view(&self.repos, user).await?;
        self.cache.put(&key, &CachedView::Profile(view.clone())).await;
        Ok(view)
    }

    async fn set_active(&self, user: &User, is_active: bool) -> Result<Option<User>, ServiceError> {
        let updated = self
            .repos
            .users
            .update(
                &UserKey::Id(user.id),
                UserPatch {
                    is_active: Some(is_active),
                    ..Default::default()
                },
            )
            .await?;
        self.cache.invalidate(&CacheKey::Profile(user.username.clone())).await;
        Ok(updated)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.repos.users.find_one(&UserKey::Email(email.to_string())).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .repos
            .users
            .find_one(&UserKey::Username(username.to_string()))
            .await?)
    }

    fn issue(&self, user: &User) -> Result<String, ServiceError> {
        self.tokens.issue(&user.email).map_err(|e| {
            tracing::error!(user_id = user.id, error = %e, "Failed to issue session token");
            ServiceError::ServerError
        })
    }

    async fn hash(&self, plaintext: String) -> Result<String, ServiceError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing task failed");
                ServiceError::ServerError
            })?
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing failed");
                ServiceError::ServerError
            })
    }

    async fn verify(&self, plaintext: String, hash: String) -> Result<bool, ServiceError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hash))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password verification task failed");
                ServiceError::ServerError
            })
    }
}

fn bad_credentials(email: &str) -> ServiceError {
    tracing::warn!(
        email,
        reason = AuthFailure::BadCredentials.reason(),
        "Login rejected"
    );
    ServiceError::Unauthorized(AuthFailure::BadCredentials)
}

/// Maps a lost uniqueness race onto the same conflict as the pre-check
fn user_conflict(err: StoreError) -> ServiceError {
    if err.is_conflict_on(user::USERNAME_CONSTRAINT) {
        ServiceError::conflict(USERNAME_TAKEN)
    } else if err.is_conflict_on(user::EMAIL_CONSTRAINT) {
        ServiceError::conflict(USER_EXISTS)
    } else {
        err.into()
    }
}
