use serde::Deserialize;
use serde_json::json;

use crate::{
    core::auth::{AuthResponse, Credential, LoginCredentials, NewAccount},
    error::ApiError,
};

use super::api::{authorized, send, send_json, ApiClient};

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

impl ApiClient {
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse =
            send_json(self.post(&["auth", "login"])?.json(credentials)).await?;
        log::info!("Signed in as {}", response.user.email);
        Ok(response)
    }

    pub async fn register_account(&self, account: &NewAccount) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse =
            send_json(self.post(&["auth", "register"])?.json(account)).await?;
        log::info!("Created account for {}", response.user.email);
        Ok(response)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
        let request = self
            .post(&["auth", "forgot-password"])?
            .json(&json!({ "email": email }));
        let body: MessageBody = send_json(request).await?;
        Ok(body.message)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<String, ApiError> {
        let request = self
            .post(&["auth", "reset-password"])?
            .json(&json!({ "token": token, "newPassword": new_password }));
        let body: MessageBody = send_json(request).await?;
        Ok(body.message)
    }

    /// Invalidate the session server-side. The caller still owns clearing
    /// the stored credential.
    pub async fn logout(&self, credential: &Credential) -> Result<(), ApiError> {
        send(authorized(self.post(&["auth", "logout"])?, credential)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use warp::{http::StatusCode, Filter};

    use super::*;
    use crate::integrations::api::test_server;

    #[tokio::test]
    async fn test_login() {
        let routes = warp::path!("api" / "auth" / "login")
            .and(warp::post())
            .and(warp::body::json())
            .map(|body: LoginCredentials| {
                if body.password == "right" {
                    warp::reply::with_status(
                        warp::reply::json(&json!({
                            "token": "abc",
                            "user": {"id": "u1", "name": "Org", "email": body.email}
                        })),
                        StatusCode::OK,
                    )
                } else {
                    warp::reply::with_status(
                        warp::reply::json(&json!({"error": "Invalid credentials"})),
                        StatusCode::UNAUTHORIZED,
                    )
                }
            });
        let client = test_server::serve(routes);

        let response = client
            .login(&LoginCredentials {
                email: "o@x.com".to_owned(),
                password: "right".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(response.token, Credential::new("abc"));
        assert_eq!(response.user.email, "o@x.com");

        let err = client
            .login(&LoginCredentials {
                email: "o@x.com".to_owned(),
                password: "wrong".to_owned(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Invalid credentials");
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let forgot = warp::path!("api" / "auth" / "forgot-password")
            .and(warp::body::json())
            .map(|body: Value| {
                assert_eq!(body["email"], "o@x.com");
                warp::reply::json(&json!({"message": "Reset link sent"}))
            });
        let reset = warp::path!("api" / "auth" / "reset-password")
            .and(warp::body::json())
            .map(|body: Value| {
                assert_eq!(body["newPassword"], "hunter22");
                warp::reply::json(&json!({"message": "Password updated"}))
            });
        let client = test_server::serve(warp::post().and(forgot.or(reset)));

        assert_eq!(
            client.forgot_password("o@x.com").await.unwrap(),
            "Reset link sent"
        );
        assert_eq!(
            client.reset_password("t0k", "hunter22").await.unwrap(),
            "Password updated"
        );
    }

    #[tokio::test]
    async fn test_logout_sends_credential() {
        let routes = warp::path!("api" / "auth" / "logout")
            .and(warp::post())
            .and(warp::header::exact("authorization", "Bearer abc"))
            .map(warp::reply);
        let client = test_server::serve(routes);

        client.logout(&Credential::new("abc")).await.unwrap();
        assert!(client.logout(&Credential::new("other")).await.is_err());
    }
}
