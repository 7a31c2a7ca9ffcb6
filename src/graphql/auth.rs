//! GraphQL authentication
//!
//! Requests may carry `Authorization: UT_<user name>`. A well-formed token
//! attaches an [`AuthUser`] to the request; a malformed one is rejected by
//! the HTTP layer with 401; no header means an anonymous request.
//!
//! ## Guards
//!
//! Use `AuthGuard` to require authentication on any GraphQL operation:
//!
//! ```ignore
//! #[graphql(guard = "AuthGuard")]
//! async fn protected_mutation(&self, ctx: &Context<'_>) -> Result<String> { ... }
//! ```

use async_graphql::{Context, ErrorExtensions, Result};
use thiserror::Error;

const TOKEN_PREFIX: &str = "UT";

/// User context extracted from the token, available in GraphQL resolvers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid token")]
pub struct InvalidToken;

/// Parse a `UT_<user name>` token.
pub fn parse_token(token: &str) -> std::result::Result<AuthUser, InvalidToken> {
    let (kind, name) = token.split_once('_').ok_or(InvalidToken)?;
    if kind != TOKEN_PREFIX || name.is_empty() {
        return Err(InvalidToken);
    }
    Ok(AuthUser {
        name: name.to_string(),
    })
}

/// Extension trait to get authenticated user from GraphQL context
pub trait AuthExt {
    /// Get the authenticated user, or return an error if not authenticated
    fn auth_user(&self) -> Result<&AuthUser>;
}

impl<'a> AuthExt for Context<'a> {
    fn auth_user(&self) -> Result<&AuthUser> {
        self.data_opt::<AuthUser>().ok_or_else(|| {
            async_graphql::Error::new("not authenticated")
                .extend_with(|_, e| e.set("code", "UNAUTHORIZED"))
        })
    }
}

/// Guard that requires authentication for GraphQL operations.
pub struct AuthGuard;

impl async_graphql::Guard for AuthGuard {
    fn check(&self, ctx: &Context<'_>) -> impl std::future::Future<Output = Result<()>> + Send {
        let result = ctx.auth_user().map(|_| ());
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        assert_eq!(
            parse_token("UT_hsaki"),
            Ok(AuthUser {
                name: "hsaki".to_string()
            })
        );
        // Only the first underscore separates the prefix.
        assert_eq!(parse_token("UT_snake_case").unwrap().name, "snake_case");
    }

    #[test]
    fn test_reject_malformed_tokens() {
        for token in ["hsaki", "XX_hsaki", "ut_hsaki", "UT_", "Bearer abc"] {
            assert_eq!(parse_token(token), Err(InvalidToken), "{}", token);
        }
    }
}
