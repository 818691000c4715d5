//! # Bus Properties
//!
//! Registry, authentication gate, dispatch and echo rules exercised across
//! real contexts.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bridge_bus::{HostBus, InMemoryEnvironment, MessageBus, Scope, Target, Topic};
    use serde_json::{json, Value};

    use crate::integration::fixtures::{origin, Seen, Session, EVIL, HOST, PREVIEW};

    // =========================================================================
    // TARGET REGISTRY
    // =========================================================================

    #[test]
    fn test_adding_same_target_twice_keeps_one_entry() {
        let env = InMemoryEnvironment::new();
        let host_ctx = env.open_context(origin(HOST));
        let other = env.open_context(origin(PREVIEW));
        let host = HostBus::new();

        host.add_target(Arc::new(host_ctx.window_of(&other)));
        host.add_target(Arc::new(host_ctx.window_of(&other)));

        assert_eq!(host.channel().target_count(), 1);
        assert_eq!(host.start_ice(Value::Null), 1);
        assert_eq!(env.deliveries().len(), 1);
    }

    #[test]
    fn test_removed_target_receives_nothing() {
        let env = InMemoryEnvironment::new();
        let host_ctx = env.open_context(origin(HOST));
        let a = env.open_context(origin(PREVIEW));
        let b = env.open_context(origin("https://other.example"));
        let host = HostBus::new();

        let to_a = host_ctx.window_of(&a);
        let key_a = to_a.key();
        host.add_target(Arc::new(to_a));
        host.add_target(Arc::new(host_ctx.window_of(&b)));

        assert!(host.remove_target(key_a));
        assert!(!host.remove_target(key_a));
        host.start_ice(Value::Null);

        let deliveries = env.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert!(deliveries.iter().all(|d| d.to != a.id()));
    }

    #[test]
    fn test_publish_without_targets_is_noop() {
        let host = HostBus::new();

        for scope in [Scope::Local, Scope::External, Scope::Broadcast] {
            assert_eq!(host.publish(Topic::StartIce, json!({"x": 1}), scope), 0);
        }
        assert_eq!(host.channel().target_count(), 0);
    }

    // =========================================================================
    // AUTHENTICATION GATE
    // =========================================================================

    #[test]
    fn test_disallowed_origin_invokes_no_handler() {
        let s = Session::new();
        let seen = Seen::default();
        s.guest.subscribe(Topic::All, seen.handler());

        let payloads = [
            json!({"topic": "start-ice"}),
            json!({"topic": "nav-request", "data": {"url": "/"}, "scope": "external"}),
            json!({"topic": "no-such-topic"}),
            json!("not an object"),
        ];
        for payload in payloads {
            s.env.inject(s.guest_ctx(), payload, EVIL);
        }
        s.settle();

        assert_eq!(seen.count(), 0);
        assert!(!s.guest.is_ice_active());
        assert_eq!(s.guest_metrics.snapshot().origin_rejected, 4);
    }

    #[test]
    fn test_origin_removed_from_allowlist_is_rejected() {
        let s = Session::new();
        let seen = Seen::default();
        s.guest.subscribe(Topic::StartIce, seen.handler());

        assert!(s.guest.remove_origin(&origin(HOST)));
        s.host.start_ice(Value::Null);
        s.settle();

        assert_eq!(seen.count(), 0);
    }

    #[test]
    fn test_configured_spelling_trusts_and_untrusts_reported_origin() {
        let s = Session::new();
        let seen = Seen::default();
        s.guest.subscribe(Topic::StartIce, seen.handler());
        s.guest.reset_origins();

        let configured = "HTTPS://Host.Example:443";
        assert!(s.guest.add_origin(origin(configured)));
        s.host.start_ice(Value::Null);
        s.settle();
        assert_eq!(seen.count(), 1);

        assert!(s.guest.remove_origin(&origin(configured)));
        s.host.start_ice(Value::Null);
        s.settle();
        assert_eq!(seen.count(), 1);
        assert_eq!(s.guest_metrics.snapshot().origin_rejected, 1);
    }

    #[test]
    fn test_reset_origins_rejects_everything() {
        let s = Session::new();
        s.host.reset_origins();

        s.guest.check_in(Value::Null);
        s.settle();

        assert_eq!(s.host.guest_check_ins(), 0);
        assert_eq!(s.host_metrics.snapshot().origin_rejected, 1);
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    #[test]
    fn test_exact_and_wildcard_handlers_only() {
        let s = Session::new();
        let exact = Seen::default();
        let wildcard = Seen::default();
        let other = Seen::default();

        s.guest.subscribe(Topic::StartIce, exact.handler());
        s.guest.subscribe(Topic::All, wildcard.handler());
        s.guest.subscribe(Topic::EndIce, other.handler());

        s.host.start_ice(json!({"field": "title"}));
        s.settle();

        assert_eq!(exact.values(), vec![json!({"field": "title"})]);
        assert_eq!(wildcard.values(), vec![json!({"field": "title"})]);
        assert_eq!(other.count(), 0);
    }

    #[test]
    fn test_unexpected_payload_shape_passed_through() {
        let s = Session::new();
        let seen = Seen::default();
        s.host.subscribe(Topic::GuestCheckIn, seen.handler());

        s.env.inject(
            &s.host_ctx,
            json!({"topic": "check-in", "data": [1, "two", null]}),
            PREVIEW,
        );
        s.settle();

        assert_eq!(seen.values(), vec![json!([1, "two", null])]);
    }

    // =========================================================================
    // NO SELF-ECHO
    // =========================================================================

    #[test]
    fn test_publish_never_reaches_own_subscribers() {
        let s = Session::new();
        let own = Seen::default();
        s.host.subscribe(Topic::All, own.handler());

        for scope in [Scope::Local, Scope::External, Scope::Broadcast] {
            s.host.publish(Topic::StartIce, Value::Null, scope);
            assert_eq!(own.count(), 0);
        }
        s.settle();

        assert_eq!(own.count(), 0);
    }
}
