/// Authentication and authorization utilities
///
/// This module provides the session primitives for Terrea:
///
/// # Modules
///
/// - [`password`]: Argon2id credential hashing with adjustable cost
/// - [`jwt`]: HS256 claim encoding and decoding
/// - [`token`]: Session token issuance and cookie extraction
/// - [`cookie`]: `Cookie` parsing and `Set-Cookie` rendering
/// - [`resolver`]: Maps a request's session cookie to the acting user
/// - [`authorization`]: Owner-equality access checks
///
/// # Example
///
/// ```no_run
/// use terrea_shared::auth::password::CredentialHasher;
/// use terrea_shared::auth::token::TokenManager;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = CredentialHasher::default();
/// let hash = hasher.hash("secret1")?;
/// assert!(hasher.verify("secret1", &hash));
///
/// let tokens = TokenManager::new("a-secret-of-at-least-thirty-two-bytes!!", 7);
/// let token = tokens.issue("alice@example.com")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod cookie;
pub mod jwt;
pub mod password;
pub mod resolver;
pub mod token;
