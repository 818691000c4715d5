//! # Numbered Scenarios
//!
//! 1. Authenticated check-in reaches the handler; the same payload from a
//!    foreign origin does not.
//! 2. Duplicate registration collapses; reset empties the registry.
//! 3. A torn-down target is evicted while the others still receive.
//! 4. After unsubscribing, redelivery invokes nothing.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bridge_bus::{HostBus, InMemoryEnvironment, MessageBus, SubscriptionToken, Target, Topic};
    use serde_json::{json, Value};

    use crate::integration::fixtures::{origin, Seen, Session, EVIL, HOST, PREVIEW};

    fn check_in_payload() -> Value {
        json!({"topic": "check-in", "data": {"id": 1}, "scope": "broadcast"})
    }

    /// Scenario 1 setup: guest allowlist is exactly {HOST}.
    fn scenario_one() -> (Session, Seen, SubscriptionToken) {
        let s = Session::new();
        let seen = Seen::default();
        let token = s.guest.subscribe(Topic::GuestCheckIn, seen.handler());

        s.env.inject(s.guest_ctx(), check_in_payload(), HOST);
        s.settle();
        (s, seen, token)
    }

    #[test]
    fn test_scenario_1_authenticated_check_in() {
        let (s, seen, _token) = scenario_one();
        assert_eq!(seen.values(), vec![json!({"id": 1})]);

        s.env.inject(s.guest_ctx(), check_in_payload(), EVIL);
        s.settle();

        assert_eq!(seen.count(), 1);
    }

    #[test]
    fn test_scenario_2_idempotent_add_and_reset() {
        let env = InMemoryEnvironment::new();
        let host_ctx = env.open_context(origin(HOST));
        let a = env.open_context(origin(PREVIEW));
        let host = HostBus::new();

        host.add_target(Arc::new(host_ctx.window_of(&a)));
        host.add_target(Arc::new(host_ctx.window_of(&a)));
        assert_eq!(host.channel().target_count(), 1);

        host.reset_targets();
        assert_eq!(host.channel().target_count(), 0);

        assert_eq!(host.start_ice(Value::Null), 0);
        assert!(env.deliveries().is_empty());
    }

    #[test]
    fn test_scenario_3_torn_down_target_evicted() {
        let s = Session::new();
        let b = s.env.open_context(origin("https://b.example"));
        let c = s.env.open_context(origin("https://c.example"));

        let host = HostBus::with_metrics(s.host_metrics.clone());
        let to_b = s.host_ctx.window_of(&b);
        let key_b = to_b.key();
        host.add_target(Arc::new(to_b));
        host.add_target(Arc::new(s.host_ctx.window_of(&c)));

        s.env.destroy(&b);

        assert_eq!(host.start_ice(Value::Null), 1);
        assert!(!host.channel().has_target(key_b));
        assert_eq!(host.channel().target_count(), 1);
        assert_eq!(s.host_metrics.snapshot().targets_evicted, 1);

        let deliveries = s.env.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].to, c.id());

        // Next publish no longer considers B at all.
        assert_eq!(host.end_ice(Value::Null), 1);
        assert_eq!(s.host_metrics.snapshot().targets_evicted, 1);
    }

    #[test]
    fn test_scenario_4_unsubscribe_stops_delivery() {
        let (s, seen, token) = scenario_one();

        assert!(token.unsubscribe());
        s.env.inject(s.guest_ctx(), check_in_payload(), HOST);
        s.settle();

        assert_eq!(seen.count(), 1);
        assert!(!token.unsubscribe());
    }
}
