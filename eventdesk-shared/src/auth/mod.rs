/// Authentication and authorization
///
/// - [`password`]: Argon2id password hashing and registration rules
/// - [`jwt`]: Access/refresh token issuance and validation
/// - [`middleware`]: Bearer-token authentication and the request `AuthContext`
/// - [`authorization`]: The Viewer/Editor/Admin access-level gate
///
/// ```no_run
/// use eventdesk_shared::auth::jwt::{create_token, Claims, TokenType};
/// use eventdesk_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Organizer2024")?;
/// assert!(verify_password("Organizer2024", &hash)?);
///
/// let token = create_token(&Claims::new(1, TokenType::Access), "secret-of-at-least-32-bytes-long!")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
