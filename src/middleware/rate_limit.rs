use actix_web::{dev::{Service, ServiceRequest, ServiceResponse, Transform}, Error, HttpResponse};
use actix_web::body::EitherBody;
use leaky_bucket::RateLimiter;
use std::{task::{Context, Poll}, time::Duration};
use std::sync::Arc;
use futures::future::{ok, LocalBoxFuture, Ready};
use log::warn;

use crate::apis::schemas::ErrorResponse;
use crate::configs::settings::RateLimitConfig;

// Token bucket shared by every worker; requests over the budget get a 429.
#[derive(Clone)]
pub struct RateLimitMiddleware {
    limiter: Option<Arc<RateLimiter>>,
}

impl RateLimitMiddleware {
    pub fn new(rate_per_interval: usize, max_capacity: usize, interval: Duration) -> Self {
        let limiter = RateLimiter::builder()
            .initial(max_capacity)
            .refill(rate_per_interval)
            .max(max_capacity)
            .interval(interval)
            .fair(false)
            .build();

        Self {
            limiter: Some(Arc::new(limiter)),
        }
    }

    pub fn disabled() -> Self {
        Self { limiter: None }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        if config.enabled {
            Self::new(config.tps, config.bucket_capacity, Duration::from_millis(config.refill_interval))
        } else {
            Self::disabled()
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitMiddlewareService {
            service,
            limiter: self.limiter.clone(),
        })
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: S,
    limiter: Option<Arc<RateLimiter>>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let allowed = self.limiter.as_ref().map_or(true, |limiter| limiter.try_acquire(1));
        if !allowed {
            warn!(target: "error", "rate limit exceeded for {}", req.path());
            let response = HttpResponse::TooManyRequests().json(ErrorResponse {
                error: "Too many requests".into(),
            });
            let res = req.into_response(response).map_into_right_body();
            return Box::pin(async move { Ok(res) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_rt::test]
    async fn rejects_requests_over_capacity() {
        let limiter = RateLimitMiddleware::new(1, 2, Duration::from_secs(3600));
        let app = test::init_service(
            App::new()
                .wrap(limiter)
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        for _ in 0..2 {
            let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
            assert!(resp.status().is_success());
        }

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), 429);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Too many requests");
    }

    #[actix_rt::test]
    async fn disabled_limiter_lets_everything_through() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::disabled())
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        for _ in 0..5 {
            let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
            assert!(resp.status().is_success());
        }
    }
}
