//! HTTP surface: signaling and capability administration.
//!
//! | Method | Path            | Body                       | Success                     |
//! |--------|-----------------|----------------------------|-----------------------------|
//! | POST   | `/signal/offer` | SDP text                   | `200 application/sdp`       |
//! | POST   | `/offer`        | `{"sdp":..,"type":"offer"}`| `200 {"sdp":..,"type":"answer"}` |
//! | POST   | `/toggle`       | `{"gamepad":true}` etc.    | `200` full capability JSON  |
//! | GET    | `/caps`         | -                          | `200` full capability JSON  |
//!
//! Every failure is a `400` with a `{"error": "..."}` body.  A rejected
//! toggle never touches the capability store.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use relay_core::CapabilityUpdate;
use serde::Serialize;
use tracing::{debug, info};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::{Reply, Response};
use warp::{Filter, Rejection};

use crate::application::signaling::{SignalingError, SignalingService};
use crate::domain::SessionDescription;

/// Largest accepted request body.  SDP offers are a few kilobytes.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

// ── Routes ────────────────────────────────────────────────────────────────────

/// Builds the complete route tree.
pub fn routes(
    signaling: Arc<SignalingService>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let signal_offer = warp::path!("signal" / "offer")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_signaling(signaling.clone()))
        .then(handle_sdp_offer);

    let json_offer = warp::path!("offer")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_signaling(signaling.clone()))
        .then(handle_json_offer);

    let toggle = warp::path!("toggle")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_signaling(signaling.clone()))
        .then(handle_toggle);

    let caps = warp::path!("caps")
        .and(warp::get())
        .and(with_signaling(signaling))
        .then(handle_caps);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(["GET", "POST"])
        .allow_header("content-type");

    signal_offer
        .or(json_offer)
        .or(toggle)
        .or(caps)
        .with(cors)
        .with(warp::trace::request())
}

fn with_signaling(
    signaling: Arc<SignalingService>,
) -> impl Filter<Extract = (Arc<SignalingService>,), Error = Infallible> + Clone {
    warp::any().map(move || signaling.clone())
}

/// Binds `addr` and returns the bound address plus the server future.
///
/// The server stops accepting requests once `shutdown` resolves.
///
/// # Errors
///
/// Returns [`warp::Error`] if the address cannot be bound.
pub fn bind(
    addr: SocketAddr,
    signaling: Arc<SignalingService>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()> + Send + 'static), warp::Error> {
    let (bound, server) =
        warp::serve(routes(signaling)).try_bind_with_graceful_shutdown(addr, shutdown)?;
    info!("HTTP signaling listening on {bound}");
    Ok((bound, server))
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn handle_sdp_offer(body: Bytes, signaling: Arc<SignalingService>) -> Response {
    let Ok(sdp) = std::str::from_utf8(&body) else {
        return json_error("offer is not valid UTF-8");
    };
    match signaling.handle_offer(SessionDescription::offer(sdp)).await {
        Ok(accepted) => {
            warp::reply::with_header(accepted.answer.sdp, "content-type", "application/sdp")
                .into_response()
        }
        Err(e) => signaling_error(e),
    }
}

async fn handle_json_offer(body: Bytes, signaling: Arc<SignalingService>) -> Response {
    let offer: SessionDescription = match serde_json::from_slice(&body) {
        Ok(o) => o,
        Err(e) => {
            debug!("rejecting offer body: {e}");
            return json_error("invalid json");
        }
    };
    match signaling.handle_offer(offer).await {
        Ok(accepted) => warp::reply::json(&accepted.answer).into_response(),
        Err(e) => signaling_error(e),
    }
}

async fn handle_toggle(body: Bytes, signaling: Arc<SignalingService>) -> Response {
    let update = match CapabilityUpdate::from_json_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            debug!("rejecting toggle body: {e}");
            return json_error("invalid json");
        }
    };
    let caps = signaling.dispatcher().apply_toggle(&update).await;
    warp::reply::json(&caps).into_response()
}

async fn handle_caps(signaling: Arc<SignalingService>) -> Response {
    let caps = signaling.dispatcher().capabilities().get();
    warp::reply::json(&caps).into_response()
}

fn signaling_error(e: SignalingError) -> Response {
    json_error(&e.to_string())
}

fn json_error(message: &str) -> Response {
    warp::reply::with_status(
        warp::reply::json(&ErrorBody { error: message }),
        StatusCode::BAD_REQUEST,
    )
    .into_response()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dispatcher::EventDispatcher;
    use crate::application::transport::{ChannelMessage, WireFormat};
    use crate::infrastructure::mock::{MemoryTransport, RecordingSink};
    use relay_core::protocol::control::{decode_control, ControlMessage};
    use relay_core::{CapabilitySet, CapabilityStore};
    use serde_json::{json, Value};
    use std::time::Duration;

    struct Harness {
        transport: Arc<MemoryTransport>,
        signaling: Arc<SignalingService>,
    }

    fn harness() -> Harness {
        let transport = Arc::new(MemoryTransport::new());
        let dispatcher = Arc::new(EventDispatcher::new(
            Arc::new(CapabilityStore::new(CapabilitySet::default())),
            Arc::new(RecordingSink::new("keymouse")),
            Arc::new(RecordingSink::new("gamepad")),
        ));
        let signaling = Arc::new(SignalingService::new(
            transport.clone(),
            dispatcher,
            Duration::from_secs(5),
        ));
        Harness {
            transport,
            signaling,
        }
    }

    fn body_json(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn test_get_caps_returns_defaults() {
        let h = harness();

        let res = warp::test::request()
            .method("GET")
            .path("/caps")
            .reply(&routes(h.signaling))
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            body_json(res.body()),
            json!({"keyboard": true, "mouse": true, "gamepad": false})
        );
    }

    #[tokio::test]
    async fn test_toggle_returns_full_set_and_updates_store() {
        // Arrange
        let h = harness();

        // Act
        let res = warp::test::request()
            .method("POST")
            .path("/toggle")
            .body(r#"{"gamepad": true}"#)
            .reply(&routes(h.signaling.clone()))
            .await;

        // Assert
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            body_json(res.body()),
            json!({"keyboard": true, "mouse": true, "gamepad": true})
        );
        assert!(h.signaling.dispatcher().capabilities().get().gamepad);
    }

    #[tokio::test]
    async fn test_malformed_toggle_is_400_and_store_unchanged() {
        let h = harness();

        let res = warp::test::request()
            .method("POST")
            .path("/toggle")
            .body("{gamepad: true")
            .reply(&routes(h.signaling.clone()))
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res.body()), json!({"error": "invalid json"}));
        assert_eq!(
            h.signaling.dispatcher().capabilities().get(),
            CapabilitySet::default()
        );
    }

    #[tokio::test]
    async fn test_toggle_with_non_boolean_value_is_rejected_whole() {
        let h = harness();

        let res = warp::test::request()
            .method("POST")
            .path("/toggle")
            .body(r#"{"gamepad": true, "mouse": "off"}"#)
            .reply(&routes(h.signaling.clone()))
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(!h.signaling.dispatcher().capabilities().get().gamepad);
    }

    #[tokio::test]
    async fn test_toggle_with_only_unknown_keys_is_a_no_op() {
        let h = harness();

        let res = warp::test::request()
            .method("POST")
            .path("/toggle")
            .body(r#"{"touch": true}"#)
            .reply(&routes(h.signaling.clone()))
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            h.signaling.dispatcher().capabilities().get(),
            CapabilitySet::default()
        );
    }

    #[tokio::test]
    async fn test_toggle_rebroadcasts_to_open_channel() {
        // Arrange: one session with an open binary channel
        let h = harness();
        let filter = routes(h.signaling.clone());
        let res = warp::test::request()
            .method("POST")
            .path("/signal/offer")
            .body("v=0\r\n")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let (channel, _inbound) = h.transport.open_next(WireFormat::Binary).unwrap();
        // Wait for the session task to attach and announce.
        for _ in 0..100 {
            if !channel.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        // Act
        warp::test::request()
            .method("POST")
            .path("/toggle")
            .body(r#"{"gamepad": true}"#)
            .reply(&filter)
            .await;

        // Assert: initial announcement plus the post-toggle broadcast
        let sent = channel.sent();
        assert_eq!(sent.len(), 2);
        let ChannelMessage::Binary(frame) = &sent[1] else {
            panic!("binary channel must receive a caps frame");
        };
        let ControlMessage::Caps { caps } = decode_control(frame).unwrap();
        assert!(caps.gamepad);
    }

    #[tokio::test]
    async fn test_sdp_offer_returns_sdp_answer() {
        let h = harness();

        let res = warp::test::request()
            .method("POST")
            .path("/signal/offer")
            .body("v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\n")
            .reply(&routes(h.signaling))
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "application/sdp");
        assert!(std::str::from_utf8(res.body()).unwrap().starts_with("v=0"));
        assert_eq!(h.transport.offers().len(), 1);
    }

    #[tokio::test]
    async fn test_unusable_sdp_offer_is_400_with_error_body() {
        let h = harness();

        let res = warp::test::request()
            .method("POST")
            .path("/signal/offer")
            .body("hello")
            .reply(&routes(h.signaling))
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(res.body())["error"].is_string());
    }

    #[tokio::test]
    async fn test_json_offer_returns_json_answer() {
        let h = harness();

        let res = warp::test::request()
            .method("POST")
            .path("/offer")
            .body(r#"{"sdp":"v=0\r\n","type":"offer"}"#)
            .reply(&routes(h.signaling))
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let answer = body_json(res.body());
        assert_eq!(answer["type"], "answer");
        assert!(answer["sdp"].as_str().unwrap().starts_with("v=0"));
    }

    #[tokio::test]
    async fn test_json_offer_with_bad_body_is_400() {
        let h = harness();

        let res = warp::test::request()
            .method("POST")
            .path("/offer")
            .body("not json")
            .reply(&routes(h.signaling))
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res.body()), json!({"error": "invalid json"}));
    }

    #[tokio::test]
    async fn test_json_answer_in_place_of_offer_is_400() {
        let h = harness();

        let res = warp::test::request()
            .method("POST")
            .path("/offer")
            .body(r#"{"sdp":"v=0\r\n","type":"answer"}"#)
            .reply(&routes(h.signaling))
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(h.transport.offers().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        let h = harness();

        let res = warp::test::request()
            .method("GET")
            .path("/toggle")
            .reply(&routes(h.signaling))
            .await;

        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
