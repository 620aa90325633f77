/// Webhook API Key Middleware
///
/// Guards service-to-service endpoints with the shared `X-Api-Key` secret
/// instead of a user bearer token.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{api_key, verify_api_key};
use crate::configuration::WebhookSettings;
use crate::error::{AppError, AuthError};

pub struct ApiKeyMiddleware {
    webhook_config: WebhookSettings,
}

impl ApiKeyMiddleware {
    pub fn new(webhook_config: WebhookSettings) -> Self {
        Self { webhook_config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(ApiKeyMiddlewareService {
            service: Rc::new(service),
            webhook_config: self.webhook_config.clone(),
        }))
    }
}

pub struct ApiKeyMiddlewareService<S> {
    service: Rc<S>,
    webhook_config: WebhookSettings,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
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
        let outcome = api_key(req.headers())
            .map_err(AuthError::Bearer)
            .and_then(|key| verify_api_key(Some(key), &self.webhook_config.api_key));

        match outcome {
            Ok(()) => {
                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(path = %req.path(), "Webhook call rejected: {}", e);
                Box::pin(async move { Err(AppError::from(e).into()) })
            }
        }
    }
}
