//! SSE delivery of realtime push events.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Extension,
};
use futures::stream::Stream;
use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AppError;
use crate::server::{AppState, CurrentUser};

/// Stream the caller's push events as server-sent events.
///
/// One logical channel per user: this endpoint only ever sees events the
/// push adapter published for the authenticated identity.
#[tracing::instrument(name = "sse.connect", skip(state, user))]
pub async fn notification_stream(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(CurrentUser(user_id))) = user else {
        return AppError::Auth("Missing caller identity".to_string()).into_response();
    };

    let rx = state.hub.subscribe(user_id);

    tracing::info!(user_id = %user_id, "SSE subscription established");

    let stream: std::pin::Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>> =
        Box::pin(ReceiverStream::new(rx).map(|event| {
            Ok(Event::default()
                .event("notification")
                .data(event.to_string()))
        }));

    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("keep-alive"),
        )
        .into_response()
}
