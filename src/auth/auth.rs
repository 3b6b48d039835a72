use crate::auth::jwt::verify_access_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, actix_web::Error> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ErrorUnauthorized("Missing token"))?;

    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Config missing"))?;

    let claims = verify_access_token(token, &config.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ErrorUnauthorized("Invalid token")
    })?;

    let role = Role::from_id(claims.role).ok_or_else(|| ErrorUnauthorized("Invalid role"))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        employee_id: claims.employee_id,
    })
}

impl AuthUser {
    pub fn require_hr_or_admin(&self) -> actix_web::Result<()> {
        if self.role.can_import_attendance() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("HR/Admin only"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::token;
    use crate::models::TokenType;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;

    fn bearer(role: u8) -> (&'static str, String) {
        let access = token(role, TokenType::Access, "s3cret", 600);
        ("Authorization", format!("Bearer {}", access))
    }

    fn config() -> Config {
        Config {
            jwt_secret: "s3cret".to_string(),
            ..Config::for_tests()
        }
    }

    #[actix_web::test]
    async fn hr_token_may_import() {
        let req = TestRequest::default()
            .insert_header(bearer(2))
            .app_data(Data::new(config()))
            .to_http_request();

        let user = AuthUser::extract(&req).await.unwrap();

        assert_eq!(user.role, Role::Hr);
        assert_eq!(user.employee_id, Some(3));
        assert!(user.require_hr_or_admin().is_ok());
    }

    #[actix_web::test]
    async fn employee_token_is_forbidden() {
        let req = TestRequest::default()
            .insert_header(bearer(3))
            .app_data(Data::new(config()))
            .to_http_request();

        let user = AuthUser::extract(&req).await.unwrap();
        let err = user.require_hr_or_admin().unwrap_err();

        assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn missing_or_unknown_role_is_unauthorized() {
        let no_header = TestRequest::default().app_data(Data::new(config())).to_http_request();
        let err = AuthUser::extract(&no_header).await.err().unwrap();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

        let bad_role = TestRequest::default()
            .insert_header(bearer(42))
            .app_data(Data::new(config()))
            .to_http_request();
        let err = AuthUser::extract(&bad_role).await.err().unwrap();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }
}
