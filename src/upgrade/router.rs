//! Upgrade request classification and dispatch.

use crate::config::GatewayConfig;

/// The route an upgrade request is dispatched to. Exactly one per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeRoute {
    /// Hand the handshake to the GraphQL subscription transport.
    GraphqlSubscription,
    /// Owned by the host framework's realtime transport; leave untouched.
    FrameworkNative,
    /// Unknown target; close the socket without a response.
    Rejected,
}

/// An incoming protocol-upgrade request.
#[derive(Debug, Clone)]
pub struct UpgradeRequest {
    /// Raw request target, possibly carrying a query string.
    pub target: String,
}

impl UpgradeRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// Raw transport socket under an upgrade request.
pub trait RawSocket {
    /// Tear the connection down. Returns false when the socket offers no
    /// destroy capability; the router treats that as a successful no-op.
    fn destroy(&mut self) -> bool;
}

/// The GraphQL subscription transport's side of the handshake. The transport
/// completes the upgrade and emits its own connection-established event.
pub trait SubscriptionTransport<S: RawSocket> {
    fn handle_upgrade(&self, request: &UpgradeRequest, socket: &mut S, head: &[u8]);
}

/// Dispatches protocol-upgrade requests by target path.
#[derive(Debug, Clone)]
pub struct UpgradeRouter {
    graphql_path: String,
    native_prefix: String,
}

impl UpgradeRouter {
    pub fn new(graphql_path: impl Into<String>, native_prefix: impl Into<String>) -> Self {
        Self {
            graphql_path: graphql_path.into(),
            native_prefix: native_prefix.into(),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(&config.graphql.path, &config.realtime.native_prefix)
    }

    /// Classify an upgrade target. The GraphQL endpoint requires an exact
    /// path match; the native transport owns everything under its prefix.
    pub fn classify(&self, target: &str) -> UpgradeRoute {
        let path = strip_query(target);

        if path == self.graphql_path {
            UpgradeRoute::GraphqlSubscription
        } else if path.starts_with(&self.native_prefix) {
            UpgradeRoute::FrameworkNative
        } else {
            UpgradeRoute::Rejected
        }
    }

    /// Route one upgrade attempt. Invoked exactly once per attempt.
    ///
    /// GraphQL targets are handed to the subscription transport; native
    /// targets are left strictly alone; anything else has its socket
    /// destroyed, tolerating sockets without a destroy capability.
    pub fn dispatch<S, T>(
        &self,
        request: &UpgradeRequest,
        socket: &mut S,
        head: &[u8],
        transport: &T,
    ) -> UpgradeRoute
    where
        S: RawSocket,
        T: SubscriptionTransport<S>,
    {
        let route = self.classify(&request.target);
        match route {
            UpgradeRoute::GraphqlSubscription => {
                transport.handle_upgrade(request, socket, head);
            }
            UpgradeRoute::FrameworkNative => {
                // Not ours. The host framework's upgrade handler owns this
                // socket and will complete the handshake itself.
            }
            UpgradeRoute::Rejected => {
                if !socket.destroy() {
                    tracing::debug!(target = %request.target, "socket has no destroy capability");
                }
            }
        }
        route
    }
}

/// Path portion of a request target.
fn strip_query(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Socket recording destroy calls.
    struct MockSocket {
        destroyable: bool,
        destroys: u32,
    }

    impl MockSocket {
        fn new(destroyable: bool) -> Self {
            Self {
                destroyable,
                destroys: 0,
            }
        }
    }

    impl RawSocket for MockSocket {
        fn destroy(&mut self) -> bool {
            self.destroys += 1;
            self.destroyable
        }
    }

    /// Transport counting handshakes.
    #[derive(Default)]
    struct MockTransport {
        upgrades: Cell<u32>,
    }

    impl SubscriptionTransport<MockSocket> for MockTransport {
        fn handle_upgrade(&self, _request: &UpgradeRequest, _socket: &mut MockSocket, _head: &[u8]) {
            self.upgrades.set(self.upgrades.get() + 1);
        }
    }

    fn router() -> UpgradeRouter {
        UpgradeRouter::new("/graphql", "/sockjs")
    }

    #[test]
    fn classification_is_exclusive_and_exhaustive() {
        let router = router();
        assert_eq!(router.classify("/graphql"), UpgradeRoute::GraphqlSubscription);
        assert_eq!(
            router.classify("/graphql?query=x"),
            UpgradeRoute::GraphqlSubscription
        );
        assert_eq!(router.classify("/sockjs"), UpgradeRoute::FrameworkNative);
        assert_eq!(
            router.classify("/sockjs/123/abc/websocket"),
            UpgradeRoute::FrameworkNative
        );
        assert_eq!(router.classify("/graphql/extra"), UpgradeRoute::Rejected);
        assert_eq!(router.classify("/other"), UpgradeRoute::Rejected);
    }

    #[test]
    fn graphql_target_reaches_transport_exactly_once() {
        let router = router();
        let transport = MockTransport::default();
        let mut socket = MockSocket::new(true);

        let route = router.dispatch(
            &UpgradeRequest::new("/graphql"),
            &mut socket,
            &[],
            &transport,
        );

        assert_eq!(route, UpgradeRoute::GraphqlSubscription);
        assert_eq!(transport.upgrades.get(), 1);
        assert_eq!(socket.destroys, 0);
    }

    #[test]
    fn native_target_never_touches_the_socket() {
        let router = router();
        let transport = MockTransport::default();
        let mut socket = MockSocket::new(true);

        let route = router.dispatch(
            &UpgradeRequest::new("/sockjs/440/session/websocket"),
            &mut socket,
            &[],
            &transport,
        );

        assert_eq!(route, UpgradeRoute::FrameworkNative);
        assert_eq!(transport.upgrades.get(), 0);
        assert_eq!(socket.destroys, 0);
    }

    #[test]
    fn unknown_target_destroys_the_socket_once() {
        let router = router();
        let transport = MockTransport::default();
        let mut socket = MockSocket::new(true);

        let route = router.dispatch(&UpgradeRequest::new("/nope"), &mut socket, &[], &transport);

        assert_eq!(route, UpgradeRoute::Rejected);
        assert_eq!(transport.upgrades.get(), 0);
        assert_eq!(socket.destroys, 1);
    }

    #[test]
    fn rejection_tolerates_missing_destroy_capability() {
        let router = router();
        let transport = MockTransport::default();
        let mut socket = MockSocket::new(false);

        // Must not panic even though the socket reports no destroy support.
        let route = router.dispatch(&UpgradeRequest::new("/nope"), &mut socket, &[], &transport);
        assert_eq!(route, UpgradeRoute::Rejected);
        assert_eq!(socket.destroys, 1);
    }
}
