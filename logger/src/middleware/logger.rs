use actix_web::{
    Error,
    body::MessageBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use colored::Colorize;
use futures::future::{LocalBoxFuture, Ready, ready};
use log::info;
use serde_json::{Map, Value, json};
use std::rc::Rc;
use std::time::Instant;

/// Console access log.
///
/// Request and response bodies are never read: sync requests may carry a
/// Stripe secret key.
pub struct LoggerMiddleware {
    console_logging_enabled: bool,
}

impl LoggerMiddleware {
    pub fn new(console_logging_enabled: bool) -> Self {
        Self {
            console_logging_enabled,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = LoggerMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
            console_logging_enabled: self.console_logging_enabled,
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
    console_logging_enabled: bool,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().to_string();
        let path = req.path().to_string();
        let params = query_params(req.query_string());
        let console_logging_enabled = self.console_logging_enabled;
        let srv = Rc::clone(&self.service);

        Box::pin(async move {
            let started = Instant::now();
            let res = srv.call(req).await?;

            if console_logging_enabled {
                let status_code = res.status().as_u16();
                let colored_status = match status_code {
                    200..=299 => status_code.to_string().green(),
                    300..=399 => status_code.to_string().yellow(),
                    400..=499 => status_code.to_string().bright_red(),
                    _ => status_code.to_string().red(),
                };

                let colored_method = match method.as_str() {
                    "GET" => method.blue(),
                    "POST" => method.yellow(),
                    "PUT" => method.purple(),
                    "PATCH" => method.cyan(),
                    _ => method.normal(),
                };

                info!(
                    "[{}] {} {} {} params={}",
                    colored_status,
                    colored_method,
                    path.bright_white(),
                    format!("({}ms)", started.elapsed().as_millis()).bright_black(),
                    params.to_string().bright_cyan(),
                );
            }

            Ok(res)
        })
    }
}

fn query_params(query_string: &str) -> Value {
    let mut params = Map::new();
    for pair in query_string.split('&').filter(|p| !p.is_empty()) {
        match pair.split_once('=') {
            Some((key, value)) => params.insert(key.to_string(), json!(value)),
            None => params.insert(pair.to_string(), json!(true)),
        };
    }
    Value::Object(params)
}
