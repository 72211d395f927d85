/// Request Authentication Guard
///
/// Resolves the `Authorization: Bearer <access token>` header to a user and
/// injects the `User` into request extensions for route handlers
/// (`web::ReqData<User>`). Performs no writes and no refresh-token lookups.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::AuthService;
use crate::error::AppError;

/// Wrap any resource or scope that requires an authenticated caller.
///
/// Expects `web::Data<AuthService>` to be registered on the app.
pub struct AuthGuard;

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
        }))
    }
}

pub struct AuthGuardService<S> {
    service: Rc<S>,
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
        // A header that is not valid UTF-8 is treated like an empty one
        let authorization = req
            .headers()
            .get(AUTHORIZATION)
            .map(|h| h.to_str().unwrap_or_default().to_string());

        let auth = req.app_data::<web::Data<AuthService>>().cloned();
        let service = self.service.clone();

        Box::pin(async move {
            let auth = auth.ok_or_else(|| {
                AppError::Internal("authentication service is not registered".to_string())
            })?;

            let user = auth.authenticate(authorization.as_deref()).await?;

            tracing::debug!(email = %user.email, path = %req.path(), "Request authenticated");

            req.extensions_mut().insert(user);
            service.call(req).await
        })
    }
}
