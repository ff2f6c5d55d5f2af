//! Accounts: registration, login, credential refresh and profile maintenance

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{JwtError, JwtService};
use crate::db::repository::{RepoError, UserRecord, UserRepository};
use crate::security_log;
use shared::models::{
    LoginRequest, LoginResponse, RefreshResponse, RegisterRequest, UpdateProfileRequest,
    UserResponse, UserRole,
};
use shared::util::{new_id, now_millis};
use shared::{AppError, AppResult, ErrorCode};

fn email_taken(email: &str) -> AppError {
    AppError::with_message(
        ErrorCode::EmailAlreadyRegistered,
        format!("Email {email} is already registered"),
    )
}

#[derive(Clone)]
pub struct AccountService {
    users: UserRepository,
    jwt: JwtService,
}

impl AccountService {
    pub fn new(users: UserRepository, jwt: JwtService) -> Self {
        Self { users, jwt }
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: String,
        phone: String,
        role: UserRole,
    ) -> AppResult<UserRecord> {
        let email = email.trim().to_lowercase();
        let password_hash = hash_password(password)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

        let now = now_millis();
        let user = UserRecord {
            id: new_id(),
            email,
            password_hash,
            name,
            phone,
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        match self.users.create(&user).await {
            Ok(()) => Ok(user),
            Err(RepoError::Duplicate(_)) => Err(email_taken(&user.email)),
            Err(e) => Err(e.into()),
        }
    }

    /// Self-registration; always a customer account
    pub async fn register(&self, req: RegisterRequest) -> AppResult<UserResponse> {
        let user = self
            .create_user(
                &req.email,
                &req.password,
                req.name,
                req.phone,
                UserRole::Customer,
            )
            .await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.into())
    }

    pub async fn login(&self, req: LoginRequest) -> AppResult<LoginResponse> {
        let email = req.email.trim().to_lowercase();
        let Some(user) = self.users.find_by_email(&email).await? else {
            security_log!("WARN", "login_failed", email = email.as_str(), reason = "unknown_email");
            return Err(AppError::invalid_credentials());
        };

        if !user.is_active {
            security_log!("WARN", "login_failed", user_id = user.id.as_str(), reason = "disabled");
            return Err(AppError::new(ErrorCode::AccountDisabled));
        }

        if !verify_password(&req.password, &user.password_hash) {
            security_log!("WARN", "login_failed", user_id = user.id.as_str(), reason = "bad_password");
            return Err(AppError::invalid_credentials());
        }

        let access_token = self
            .jwt
            .generate_access_token(&user.id, &user.email, user.role)
            .map_err(token_error)?;
        let refresh_token = self
            .jwt
            .generate_refresh_token(&user.id, &user.email, user.role)
            .map_err(token_error)?;

        security_log!("INFO", "login_success", user_id = user.id.as_str());
        Ok(LoginResponse {
            user: user.into(),
            access_token,
            refresh_token,
        })
    }

    /// New access credential from a refresh credential of an active account
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshResponse> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|e| match e {
                JwtError::ExpiredToken => AppError::token_expired(),
                _ => AppError::invalid_token("Invalid or expired refresh token"),
            })?;

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::invalid_token("User no longer exists"))?;
        if !user.is_active {
            return Err(AppError::new(ErrorCode::AccountDisabled));
        }

        let access_token = self
            .jwt
            .generate_access_token(&user.id, &user.email, user.role)
            .map_err(token_error)?;
        Ok(RefreshResponse { access_token })
    }

    pub async fn me(&self, user_id: &str) -> AppResult<UserResponse> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))
    }

    /// Change name and/or phone; absent or blank fields keep their value
    pub async fn update_profile(
        &self,
        user_id: &str,
        req: UpdateProfileRequest,
    ) -> AppResult<UserResponse> {
        let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let phone = req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
        let user = match self.users.update_profile(user_id, name, phone).await {
            Ok(user) => user,
            Err(RepoError::NotFound(_)) => {
                return Err(AppError::not_found(format!("User {user_id}")));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user.into())
    }

    /// Create the bootstrap admin unless the email is already registered
    pub async fn ensure_admin(&self, email: &str, password: &str) -> AppResult<()> {
        let created = self
            .create_user(
                email,
                password,
                "Administrator".to_string(),
                String::new(),
                UserRole::Admin,
            )
            .await;
        match created {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Bootstrap admin created");
                Ok(())
            }
            Err(e) if e.code == ErrorCode::EmailAlreadyRegistered => {
                tracing::debug!("Bootstrap admin already present");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn token_error(e: JwtError) -> AppError {
    AppError::internal(format!("Failed to issue token: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use crate::db::DbService;
    use std::time::Duration;

    async fn service() -> AccountService {
        service_on(DbService::in_memory().await.unwrap())
    }

    fn service_on(db: DbService) -> AccountService {
        let jwt = JwtService::new(JwtConfig {
            access_secret: "a".repeat(32),
            refresh_secret: "r".repeat(32),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(3600),
        });
        AccountService::new(UserRepository::new(&db), jwt)
    }

    fn register(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: "secreto123".into(),
            name: "Ana Gomez".into(),
            phone: "3001234567".into(),
        }
    }

    #[tokio::test]
    async fn test_register_login_refresh() {
        let svc = service().await;
        let user = svc.register(register("Ana@Example.com")).await.unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.role, UserRole::Customer);

        let login = svc
            .login(LoginRequest {
                email: "ana@example.com".into(),
                password: "secreto123".into(),
            })
            .await
            .unwrap();
        assert_eq!(login.user.id, user.id);

        let refreshed = svc.refresh(&login.refresh_token).await.unwrap();
        assert!(!refreshed.access_token.is_empty());

        // An access token is not a refresh token
        let err = svc.refresh(&login.access_token).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);

        assert_eq!(svc.me(&user.id).await.unwrap().email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let svc = service().await;
        svc.register(register("dup@example.com")).await.unwrap();
        let err = svc.register(register("DUP@example.com")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailAlreadyRegistered);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let svc = service().await;
        svc.register(register("ana@example.com")).await.unwrap();

        let err = svc
            .login(LoginRequest {
                email: "ana@example.com".into(),
                password: "wrong-password".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);

        let err = svc
            .login(LoginRequest {
                email: "nobody@example.com".into(),
                password: "whatever".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let svc = service().await;
        svc.ensure_admin("admin@example.com", "admin-pass").await.unwrap();
        svc.ensure_admin("admin@example.com", "admin-pass").await.unwrap();

        let login = svc
            .login(LoginRequest {
                email: "admin@example.com".into(),
                password: "admin-pass".into(),
            })
            .await
            .unwrap();
        assert_eq!(login.user.role, UserRole::Admin);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_registrations_of_one_email() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.db");
        let db = DbService::new(path.to_str().unwrap(), Duration::from_secs(5))
            .await
            .unwrap();
        let svc = service_on(db);

        let handles: Vec<_> = ["race@example.com", "RACE@example.com", "Race@Example.com"]
            .into_iter()
            .map(|email| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.register(register(email)).await })
            })
            .collect();

        let mut registered = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => registered += 1,
                Err(e) => assert_eq!(e.code, ErrorCode::EmailAlreadyRegistered),
            }
        }
        assert_eq!(registered, 1);
    }

    #[tokio::test]
    async fn test_update_profile_skips_blank_fields() {
        let svc = service().await;
        let user = svc.register(register("perfil@example.com")).await.unwrap();

        let updated = svc
            .update_profile(
                &user.id,
                UpdateProfileRequest {
                    name: Some("Ana Maria".into()),
                    phone: Some("   ".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.phone, "3001234567");
        assert!(updated.updated_at >= user.updated_at);

        let updated = svc
            .update_profile(
                &user.id,
                UpdateProfileRequest {
                    name: None,
                    phone: Some("3119876543".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.phone, "3119876543");

        let err = svc
            .update_profile("missing", UpdateProfileRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
