//! Long-running queue consumers.
//!
//! Each worker drains its own queue and makes one Mailgun call per event.
//! Delivery is best-effort: failures are logged and the loop moves on.

pub mod sender;
pub mod subscriber;

pub use sender::SenderWorker;
pub use subscriber::SubscriberWorker;

/// Outcome of handling a single queued event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    /// No configuration exists for the event's `To` address.
    UnknownRecipient,
    Failed,
}

#[cfg(test)]
pub(crate) mod fake_mailgun {
    //! Local stand-in for the Mailgun API that records every request.

    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode, Uri},
        Router,
    };
    use tokio::net::TcpListener;

    #[derive(Debug, Clone)]
    pub struct Recorded {
        pub path: String,
        pub authorization: Option<String>,
        pub body: String,
    }

    #[derive(Clone)]
    struct FakeState {
        requests: Arc<Mutex<Vec<Recorded>>>,
        fail_marker: Option<String>,
    }

    pub struct FakeMailgun {
        pub base: String,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl FakeMailgun {
        /// Start the fake. Requests whose path contains `fail_marker` get a 500.
        pub async fn start(fail_marker: Option<&str>) -> Self {
            let requests = Arc::new(Mutex::new(Vec::new()));
            let state = FakeState {
                requests: Arc::clone(&requests),
                fail_marker: fail_marker.map(str::to_string),
            };

            let app = Router::new().fallback(record).with_state(state);
            let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
                .await
                .unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            Self {
                base: format!("http://{addr}/v3"),
                requests,
            }
        }

        pub fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn record(
        State(state): State<FakeState>,
        uri: Uri,
        headers: HeaderMap,
        body: String,
    ) -> StatusCode {
        let path = uri.path().to_string();
        let failing = state
            .fail_marker
            .as_deref()
            .is_some_and(|marker| path.contains(marker));

        state.requests.lock().unwrap().push(Recorded {
            path,
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });

        if failing {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        }
    }
}
