//! # In-Memory Hosting Environment
//!
//! A single-process stand-in for the browser-style environment the bus runs
//! in: contexts with origins, frames embedding child contexts, an
//! asynchronous `post_message` and an event loop that delivers queued
//! messages on the receiver's turn.
//!
//! Suitable for tests, benchmarks and the runtime demo; a real deployment
//! supplies its own `Target` / `MessageSource` implementations.
//!
//! ## Semantics
//!
//! - `post_message` only enqueues; listeners run inside `run_until_idle`.
//! - The claimed origin attached to a delivery is the *sender's* origin, as
//!   the environment knows it. `inject` lets tests forge one.
//! - One global FIFO queue, so messages from one sender to one target arrive
//!   in send order.
//! - `destroy` tears a context down: its listeners are dropped, queued
//!   messages to it are discarded and handles to it stop resolving.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use bridge_types::{Envelope, Origin, Scope, Topic};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::bus::{InboundListener, InboundMessage, ListenerId, MessageSource};
use crate::targets::{DeliveryHandle, Target, TargetKey};

/// Upper bound on deliveries per `run_until_idle` call.
pub const DEFAULT_TURN_LIMIT: usize = 10_000;

/// Delivery records kept by the environment. Older records are discarded.
pub const DELIVERY_LOG_CAPACITY: usize = 1_024;

/// Identity of a context. Shares its number space with `FrameId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

/// Identity of an embedding frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// One `post_message` call as the environment saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRecord {
    pub from: ContextId,
    pub to: ContextId,
    pub topic: Topic,
    pub scope: Scope,
}

struct ContextState {
    origin: Origin,
    alive: bool,
    listeners: Vec<(ListenerId, Arc<dyn InboundListener>)>,
}

struct FrameState {
    content: ContextId,
}

struct Pending {
    to: ContextId,
    message: InboundMessage,
}

#[derive(Default)]
struct EnvState {
    next_id: u64,
    contexts: HashMap<ContextId, ContextState>,
    frames: HashMap<FrameId, FrameState>,
    queue: VecDeque<Pending>,
    deliveries: VecDeque<DeliveryRecord>,
}

impl EnvState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn is_alive(&self, id: ContextId) -> bool {
        self.contexts.get(&id).is_some_and(|c| c.alive)
    }
}

/// Shared environment. Cloning yields another handle to the same world.
#[derive(Clone, Default)]
pub struct InMemoryEnvironment {
    state: Arc<Mutex<EnvState>>,
}

impl InMemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a top-level context.
    pub fn open_context(&self, origin: Origin) -> ContextHandle {
        let mut state = self.state.lock();
        let id = ContextId(state.next_id());
        state.contexts.insert(
            id,
            ContextState {
                origin,
                alive: true,
                listeners: Vec::new(),
            },
        );
        drop(state);

        debug!(context = %id, "Context opened");
        ContextHandle {
            env: self.clone(),
            id,
        }
    }

    /// Embed a frame in `parent` whose content is a new context at `origin`.
    pub fn embed_frame(&self, parent: &ContextHandle, origin: Origin) -> EmbeddedFrame {
        let content = self.open_context(origin);
        let id = {
            let mut state = self.state.lock();
            let id = FrameId(state.next_id());
            state.frames.insert(id, FrameState { content: content.id });
            id
        };

        debug!(frame = %id, parent = %parent.id, content = %content.id, "Frame embedded");
        EmbeddedFrame {
            id,
            parent: parent.clone(),
            content,
        }
    }

    /// Tear a context down.
    pub fn destroy(&self, context: &ContextHandle) {
        let mut state = self.state.lock();
        if let Some(ctx) = state.contexts.get_mut(&context.id) {
            ctx.alive = false;
            ctx.listeners.clear();
        }
        state.queue.retain(|p| p.to != context.id);
        drop(state);

        debug!(context = %context.id, "Context destroyed");
    }

    /// Remove a frame from its parent, destroying its content.
    pub fn detach_frame(&self, frame: &EmbeddedFrame) {
        self.state.lock().frames.remove(&frame.id);
        self.destroy(&frame.content);
    }

    pub fn is_alive(&self, id: ContextId) -> bool {
        self.state.lock().is_alive(id)
    }

    /// Queue a message for `to` with an arbitrary claimed origin.
    pub fn inject(&self, to: &ContextHandle, data: Value, claimed_origin: &str) {
        let mut state = self.state.lock();
        if !state.is_alive(to.id) {
            return;
        }
        state.queue.push_back(Pending {
            to: to.id,
            message: InboundMessage {
                data,
                origin: claimed_origin.to_string(),
            },
        });
    }

    /// Deliver queued messages, including any queued by listeners while this
    /// runs, until the queue is empty. Returns how many were delivered.
    pub fn run_until_idle(&self) -> usize {
        self.run_turns(DEFAULT_TURN_LIMIT)
    }

    /// Deliver at most `limit` queued messages.
    pub fn run_turns(&self, limit: usize) -> usize {
        let mut delivered = 0;

        while delivered < limit {
            let (listeners, message) = {
                let mut state = self.state.lock();
                let Some(pending) = state.queue.pop_front() else {
                    return delivered;
                };
                let Some(ctx) = state.contexts.get(&pending.to).filter(|c| c.alive) else {
                    continue;
                };
                let listeners: Vec<_> = ctx.listeners.iter().map(|(_, l)| l.clone()).collect();
                (listeners, pending.message)
            };

            // Environment lock released: listeners may post or open.
            for listener in &listeners {
                listener.on_message(message.clone());
            }
            delivered += 1;
        }

        if self.pending() > 0 {
            warn!(limit, pending = self.pending(), "Turn limit reached with messages still queued");
        }
        delivered
    }

    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// The most recent `post_message` calls, oldest first, up to
    /// `DELIVERY_LOG_CAPACITY`.
    pub fn deliveries(&self) -> Vec<DeliveryRecord> {
        self.state.lock().deliveries.iter().cloned().collect()
    }

    pub fn clear_deliveries(&self) {
        self.state.lock().deliveries.clear();
    }

    fn port(&self, from: ContextId, to: ContextId) -> Arc<dyn DeliveryHandle> {
        Arc::new(Port {
            env: self.clone(),
            from,
            to,
        })
    }
}

impl fmt::Debug for InMemoryEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InMemoryEnvironment")
            .field("contexts", &state.contexts.len())
            .field("frames", &state.frames.len())
            .field("pending", &state.queue.len())
            .finish()
    }
}

/// A context's view of itself. Acts as its `MessageSource`.
#[derive(Clone)]
pub struct ContextHandle {
    env: InMemoryEnvironment,
    id: ContextId,
}

impl ContextHandle {
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn origin(&self) -> Option<Origin> {
        self.env
            .state
            .lock()
            .contexts
            .get(&self.id)
            .map(|c| c.origin.clone())
    }

    pub fn is_alive(&self) -> bool {
        self.env.is_alive(self.id)
    }

    pub fn listener_count(&self) -> usize {
        self.env
            .state
            .lock()
            .contexts
            .get(&self.id)
            .map_or(0, |c| c.listeners.len())
    }

    /// A reference, held by this context, to another context's window.
    pub fn window_of(&self, other: &ContextHandle) -> WindowRef {
        WindowRef {
            env: self.env.clone(),
            from: self.id,
            to: other.id,
        }
    }

    /// A reference, held by this context, to a frame element.
    pub fn frame_ref(&self, frame: &EmbeddedFrame) -> FrameRef {
        FrameRef {
            env: self.env.clone(),
            from: self.id,
            frame: frame.id,
        }
    }
}

impl MessageSource for ContextHandle {
    fn add_listener(&self, listener: Arc<dyn InboundListener>) -> ListenerId {
        let id = ListenerId::new();
        if let Some(ctx) = self.env.state.lock().contexts.get_mut(&self.id) {
            if ctx.alive {
                ctx.listeners.push((id, listener));
            }
        }
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut state = self.env.state.lock();
        let Some(ctx) = state.contexts.get_mut(&self.id) else {
            return false;
        };
        let before = ctx.listeners.len();
        ctx.listeners.retain(|(l, _)| *l != id);
        ctx.listeners.len() != before
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle").field("id", &self.id).finish()
    }
}

/// A frame embedded in a parent context.
#[derive(Debug, Clone)]
pub struct EmbeddedFrame {
    pub id: FrameId,
    pub parent: ContextHandle,
    pub content: ContextHandle,
}

impl EmbeddedFrame {
    /// The content context's reference to its parent window.
    pub fn parent_window(&self) -> WindowRef {
        self.content.window_of(&self.parent)
    }
}

/// Reference to a window. Exposes a delivery handle directly.
#[derive(Clone)]
pub struct WindowRef {
    env: InMemoryEnvironment,
    from: ContextId,
    to: ContextId,
}

impl WindowRef {
    /// Post outside of any bus. Returns `false` if the window is gone.
    pub fn post(&self, envelope: &Envelope) -> bool {
        match self.handle() {
            Some(handle) => {
                handle.post_message(envelope);
                true
            }
            None => false,
        }
    }

    pub fn to(&self) -> ContextId {
        self.to
    }
}

impl Target for WindowRef {
    fn key(&self) -> TargetKey {
        TargetKey::new(self.to.0)
    }

    fn handle(&self) -> Option<Arc<dyn DeliveryHandle>> {
        if self.env.is_alive(self.to) {
            Some(self.env.port(self.from, self.to))
        } else {
            None
        }
    }
}

/// Reference to a frame element. Has no handle of its own; resolves through
/// its content window.
#[derive(Clone)]
pub struct FrameRef {
    env: InMemoryEnvironment,
    from: ContextId,
    frame: FrameId,
}

impl Target for FrameRef {
    fn key(&self) -> TargetKey {
        TargetKey::new(self.frame.0)
    }

    fn handle(&self) -> Option<Arc<dyn DeliveryHandle>> {
        None
    }

    fn content(&self) -> Option<Arc<dyn DeliveryHandle>> {
        let to = {
            let state = self.env.state.lock();
            let content = state.frames.get(&self.frame)?.content;
            if !state.is_alive(content) {
                return None;
            }
            content
        };
        Some(self.env.port(self.from, to))
    }
}

/// A resolved delivery handle from one context to another.
struct Port {
    env: InMemoryEnvironment,
    from: ContextId,
    to: ContextId,
}

impl DeliveryHandle for Port {
    fn post_message(&self, envelope: &Envelope) {
        let mut state = self.env.state.lock();
        if !state.is_alive(self.to) {
            return;
        }
        let Some(origin) = state.contexts.get(&self.from).map(|c| c.origin.to_string()) else {
            return;
        };

        state.queue.push_back(Pending {
            to: self.to,
            message: InboundMessage {
                data: envelope.to_wire(),
                origin,
            },
        });
        if state.deliveries.len() == DELIVERY_LOG_CAPACITY {
            state.deliveries.pop_front();
        }
        state.deliveries.push_back(DeliveryRecord {
            from: self.from,
            to: self.to,
            topic: envelope.topic(),
            scope: envelope.scope(),
        });
    }
}
