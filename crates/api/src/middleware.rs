use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use clientreg_infra::workers::RequestCounter;

/// Count every request by method and raw path, then run the handler.
///
/// Never blocks or fails the request: a dropped observation is only logged.
pub async fn count_requests(
    State(counter): State<RequestCounter>,
    req: Request,
    next: Next,
) -> Response {
    counter.record(req.method().as_str(), req.uri().path());
    next.run(req).await
}
