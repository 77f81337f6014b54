use crate::{
    auth::Claims,
    errors::{AppError, AppResult},
};

/// Profiles are private: a caller may only touch their own record.
pub fn require_self(claims: &Claims, user_id: &str) -> AppResult<()> {
    if claims.sub != user_id {
        return Err(AppError::Unauthorized(
            "You can only access your own profile".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_for(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            email: "someone@example.com".to_string(),
            iat: 0,
            exp: 9999999999,
        }
    }

    #[test]
    fn test_require_self_as_owner() {
        assert!(require_self(&claims_for("abc"), "abc").is_ok());
    }

    #[test]
    fn test_require_self_rejects_other_user() {
        let result = require_self(&claims_for("abc"), "def");
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
