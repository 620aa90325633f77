use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use log::{info, warn};
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use crate::error::{AppError, ErrorHandler};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Id shared by the access log, the `x-request-id` header, handler logs and
/// the `error_id` of error bodies. Handlers read it with `web::ReqData<RequestId>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request logger middleware
///
/// Tags every request with an id, echoed back in `x-request-id`, and logs the
/// outcome with its latency. Query strings and headers are never logged.
///
/// Errors raised by inner middleware (gate rejections) are turned into
/// responses here so they are logged and tagged like everything else.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let request_id = RequestId::new();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let http_req = req.request().clone();

        req.extensions_mut().insert(request_id.clone());

        let service = self.service.clone();

        Box::pin(async move {
            let mut res = match service.call(req).await {
                Ok(res) => {
                    let rendered = res
                        .response()
                        .error()
                        .and_then(|e| render_app_error(e, &request_id));

                    match rendered {
                        Some(response) => res.into_response(response).map_into_right_body(),
                        None => res.map_into_left_body(),
                    }
                }
                Err(e) => {
                    let response =
                        render_app_error(&e, &request_id).unwrap_or_else(|| e.error_response());
                    ServiceResponse::new(http_req, response).map_into_right_body()
                }
            };

            let elapsed = start_time.elapsed().as_millis();
            let status = res.status();

            if status.is_server_error() {
                warn!(
                    "[{}] {} {} -> {} ({}ms)",
                    request_id,
                    method,
                    path,
                    status.as_u16(),
                    elapsed
                );
            } else {
                info!(
                    "[{}] {} {} -> {} ({}ms)",
                    request_id,
                    method,
                    path,
                    status.as_u16(),
                    elapsed
                );
            }

            if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            Ok(res)
        })
    }
}

/// Render an `AppError` with the request's id; other errors keep their own body
fn render_app_error(err: &Error, request_id: &RequestId) -> Option<HttpResponse> {
    let app_error = err.as_error::<AppError>()?;
    app_error.log_error(request_id.as_str());

    let (status, body) = <AppError as ErrorHandler>::error_response(app_error, request_id.as_str());
    Some(HttpResponse::build(status).json(body))
}
