/// Role-Gated Authentication Middleware
///
/// Validates the bearer token from the Authorization header, optionally
/// checks the role it carries, and injects the decoded claims into request
/// extensions for route handlers.
///
/// Both token failures and role mismatches surface as 401; the boundary
/// conflates unauthorized and forbidden.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::verify_token;
use crate::configuration::JwtSettings;
use crate::error::ApiError;
use crate::models::Role;

pub struct AuthGuard {
    jwt_config: JwtSettings,
    required_role: Option<Role>,
}

impl AuthGuard {
    /// Accept any valid bearer token.
    pub fn any(jwt_config: JwtSettings) -> Self {
        Self {
            jwt_config,
            required_role: None,
        }
    }

    /// Accept only tokens whose role claim matches `role`.
    pub fn role(jwt_config: JwtSettings, role: Role) -> Self {
        Self {
            jwt_config,
            required_role: Some(role),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthGuardService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
            required_role: self.required_role,
        }))
    }
}

pub struct AuthGuardService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
    required_role: Option<Role>,
}

impl<S, B> Service<ServiceRequest> for AuthGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.to_string());

        let token = match bearer {
            Some(token) => token,
            None => {
                tracing::warn!("Missing or malformed Authorization header");
                return Box::pin(async move { Err(ApiError::InvalidToken.into()) });
            }
        };

        let claims = match verify_token(&token, &self.jwt_config) {
            Ok(claims) => claims,
            Err(_) => {
                return Box::pin(async move { Err(ApiError::InvalidToken.into()) });
            }
        };

        if let Some(required) = self.required_role {
            if claims.role() != required {
                tracing::warn!(
                    user_id = claims.id,
                    current_role = %claims.role(),
                    required_role = %required,
                    "Role check failed"
                );
                let current_role = claims.role();
                return Box::pin(async move {
                    Err(ApiError::InsufficientAccess { current_role }.into())
                });
            }
        }

        tracing::debug!(
            user_id = claims.id,
            role = %claims.role(),
            "Bearer token accepted"
        );
        req.extensions_mut().insert(claims);

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}
