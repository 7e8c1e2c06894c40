use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::time::Instant;
use tracing::Instrument;

use crate::error::{AppError, ErrorHandler};

/// Request logging middleware
///
/// Every request runs inside an `http_request` span carrying a fresh
/// request id, so log lines emitted by handlers can be correlated. Errors
/// are logged here too, inside the span. Query strings, headers and bodies
/// are never logged; they may carry tokens.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
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
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let span = tracing::info_span!(
            "http_request",
            request_id = %uuid::Uuid::new_v4(),
            method = %req.method(),
            path = %req.path(),
        );

        let service = self.service.clone();

        Box::pin(
            async move {
                tracing::info!("Request started");

                let res = service.call(req).await;
                let elapsed_ms = start_time.elapsed().as_millis() as u64;

                match &res {
                    Ok(response) => {
                        if let Some(error) = response
                            .response()
                            .error()
                            .and_then(|e| e.as_error::<AppError>())
                        {
                            error.log_error();
                        }
                        tracing::info!(
                            status = response.status().as_u16(),
                            elapsed_ms,
                            "Request completed"
                        )
                    }
                    Err(e) => {
                        if let Some(error) = e.as_error::<AppError>() {
                            error.log_error();
                        }
                        tracing::warn!(
                            status = e.as_response_error().status_code().as_u16(),
                            elapsed_ms,
                            "Request failed"
                        )
                    }
                }

                res
            }
            .instrument(span),
        )
    }
}
