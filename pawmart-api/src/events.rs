use axum::{
    extract::State,
    middleware,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures_util::stream::{Stream, StreamExt};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;
use pawmart_core::identity::Role;
use pawmart_shared::StoreEvent;

use crate::middleware::auth::{shopper_auth_middleware, SessionClaims};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/events", get(stream_events))
        .route_layer(middleware::from_fn_with_state(state, shopper_auth_middleware))
}

/// Whether a session should see an event: its own, or every order event for admins
fn visible_to(claims: &SessionClaims, event: &StoreEvent) -> bool {
    if event.audience() == claims.sub {
        return true;
    }
    claims.acts_as(Role::Admin)
        && matches!(event, StoreEvent::OrderPlaced { .. } | StoreEvent::OrderStatusChanged { .. })
}

/// Server-sent events for the caller's cart and orders
async fn stream_events(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |msg| {
        let event = match msg {
            Ok(event) if visible_to(&claims, &event) => Event::default()
                .event(event.name())
                .json_data(&event)
                .ok()
                .map(Ok::<Event, Infallible>),
            Ok(_) => None,
            Err(e) => {
                warn!("SSE subscriber lagged: {}", e);
                None
            }
        };
        futures_util::future::ready(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claims(sub: &str, role: &str) -> SessionClaims {
        SessionClaims {
            sub: sub.to_string(),
            role: role.to_string(),
            name: None,
            exp: 0,
        }
    }

    #[test]
    fn test_event_visibility() {
        let placed = StoreEvent::OrderPlaced {
            order_id: Uuid::nil(),
            order_number: "PM-20250101-ABCDEF".to_string(),
            customer_id: "user-a".to_string(),
            total_cents: 100,
            timestamp: 0,
        };
        let cart = StoreEvent::CartUpdated {
            shopper_id: "user-a".to_string(),
            item_count: 1,
            subtotal_cents: 100,
            timestamp: 0,
        };

        assert!(visible_to(&claims("user-a", "CUSTOMER"), &placed));
        assert!(!visible_to(&claims("user-b", "CUSTOMER"), &placed));
        assert!(visible_to(&claims("admin", "ADMIN"), &placed));
        assert!(!visible_to(&claims("admin", "ADMIN"), &cart));
    }
}
