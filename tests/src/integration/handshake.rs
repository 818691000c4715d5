//! # Editing Session Flows
//!
//! ```text
//! HostBus ──start-ice / reload / nav / end-ice──▶ GuestBus
//!    ▲                                              │
//!    └──────────────────── check-in ────────────────┘
//! ```
//!
//! Also covers relaying into a nested preview and frame lifecycle.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bridge_bus::{
        BusError, GuestBus, HostBus, MessageBus, NoOpMetrics, Relay, Role, Scope, Target, Topic,
    };
    use bridge_runtime::{BridgeConfig, BridgeContainer, HandshakeCoordinator};
    use serde_json::{json, Value};

    use crate::integration::fixtures::{origin, Seen, Session, HOST, PREVIEW};

    // =========================================================================
    // FULL HANDSHAKE
    // =========================================================================

    #[test]
    fn test_full_handshake_through_runtime_wiring() {
        let c = BridgeContainer::new(
            BridgeConfig::default(),
            Arc::new(NoOpMetrics),
            Arc::new(NoOpMetrics),
        )
        .unwrap();
        let coordinator = HandshakeCoordinator::install(&c.host, &c.guest);

        c.guest.check_in(json!({"url": "/"}));
        c.settle();
        assert!(c.guest.is_ice_active());

        c.host.request_reload();
        c.host.request_navigation("/blog");
        c.host.end_ice(Value::Null);
        c.settle();

        assert_eq!(c.host.guest_check_ins(), 1);
        assert_eq!(coordinator.activity().reloads(), 1);
        assert_eq!(coordinator.activity().navigations(), vec!["/blog".to_string()]);
        assert!(!c.guest.is_ice_active());
    }

    #[test]
    fn test_handshake_messages_are_external() {
        let s = Session::new();

        s.guest.check_in(Value::Null);
        s.host.start_ice(Value::Null);
        s.host.request_reload();
        s.host.request_navigation("/");
        s.host.end_ice(Value::Null);

        let deliveries = s.env.deliveries();
        assert_eq!(deliveries.len(), 5);
        assert!(deliveries.iter().all(|d| d.scope == Scope::External));
    }

    #[test]
    fn test_messages_arrive_in_send_order() {
        let s = Session::new();
        let seen = Seen::default();
        s.guest.subscribe(Topic::GuestNavRequest, seen.handler());

        for path in ["/a", "/b", "/c"] {
            s.host.request_navigation(path);
        }
        s.settle();

        assert_eq!(
            seen.values(),
            vec![json!({"url": "/a"}), json!({"url": "/b"}), json!({"url": "/c"})]
        );
    }

    // =========================================================================
    // FRAMES
    // =========================================================================

    #[test]
    fn test_frame_element_resolves_through_content_window() {
        let s = Session::new();
        let frame_ref = s.host_ctx.frame_ref(&s.frame);

        assert!(frame_ref.handle().is_none());
        assert!(frame_ref.resolve().is_some());
        assert_eq!(s.host.start_ice(Value::Null), 1);
    }

    #[test]
    fn test_detached_frame_evicted_on_next_publish() {
        let s = Session::new();
        s.env.detach_frame(&s.frame);

        assert_eq!(s.host.start_ice(Value::Null), 0);
        assert_eq!(s.host.channel().target_count(), 0);
        assert_eq!(s.host_metrics.snapshot().targets_evicted, 1);
    }

    #[test]
    fn test_embedding_a_second_preview() {
        let s = Session::new();
        let second = s.env.embed_frame(&s.host_ctx, origin("https://second.example"));
        s.host.add_target(Arc::new(s.host_ctx.frame_ref(&second)));

        assert_eq!(s.host.start_ice(Value::Null), 2);
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    #[test]
    fn test_closed_guest_ignores_host() {
        let s = Session::new();
        assert!(s.guest.close());
        assert_eq!(s.guest_ctx().listener_count(), 0);

        s.host.start_ice(Value::Null);
        s.settle();

        assert!(!s.guest.is_ice_active());
    }

    #[test]
    fn test_double_open_rejected() {
        let s = Session::new();
        let result = s.host.open(Arc::new(s.host_ctx.clone()));
        assert_eq!(result, Err(BusError::AlreadyOpen { role: Role::Host }));
        assert_eq!(s.host_ctx.listener_count(), 1);
    }

    #[test]
    fn test_dropped_bus_detaches_listener() {
        let s = Session::new();
        let Session { env, host_ctx, host, guest, .. } = s;

        drop(host);
        assert_eq!(host_ctx.listener_count(), 0);

        guest.check_in(Value::Null);
        assert_eq!(env.run_until_idle(), 1);
    }

    // =========================================================================
    // RELAY
    // =========================================================================

    #[test]
    fn test_relay_forwards_only_broadcast_into_nested_preview() {
        let s = Session::new();
        let nested_frame = s.env.embed_frame(s.guest_ctx(), origin("https://nested.example"));

        let downstream = Arc::new(HostBus::new());
        downstream.add_target(Arc::new(s.guest_ctx().frame_ref(&nested_frame)));

        let nested = GuestBus::new();
        nested.add_origin(origin(PREVIEW));
        nested.open(Arc::new(nested_frame.content.clone())).unwrap();
        let nested_seen = Seen::default();
        nested.subscribe(Topic::All, nested_seen.handler());

        let _relay = Relay::bridge(&*s.guest, downstream.clone());

        s.host.publish_broadcast(Topic::GuestReloadRequest, json!({"hard": true}));
        s.host.start_ice(Value::Null);
        s.settle();

        assert_eq!(nested_seen.values(), vec![json!({"hard": true})]);
        assert!(!nested.is_ice_active());
        assert_eq!(s.guest_metrics.snapshot().relay_dropped, 1);
    }
}
