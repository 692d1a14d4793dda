//! Typed notification system with per-kind ring buffers.
//!
//! Events are emitted while mutations and evaluation run, then delivered in
//! batch at the end of each tick. Each event kind has its own [`EventBuffer`]
//! ring with a bounded capacity, so a chatty tick can never grow memory
//! without limit.
//!
//! # Suppression
//!
//! Individual kinds can be suppressed via [`EventBus::suppress`], which drops
//! the buffer and makes emission free. The whole bus can also be muted with
//! [`EventBus::mute`]; deserialization uses this so that rebuilding a network
//! does not replay hundreds of construction events at listeners.

use std::collections::VecDeque;

use crate::capacitor::CapacitorPhase;
use crate::component::ComponentKind;
use crate::id::{CircuitId, ComponentId, WireId};
use crate::units::Ticks;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A notification. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Graph shape --
    ComponentAdded {
        component: ComponentId,
        kind: ComponentKind,
        tick: Ticks,
    },
    ComponentRemoved {
        component: ComponentId,
        tick: Ticks,
    },
    WireAdded {
        wire: WireId,
        source: ComponentId,
        dest: ComponentId,
        tick: Ticks,
    },
    WireRemoved {
        wire: WireId,
        source: ComponentId,
        dest: ComponentId,
        tick: Ticks,
    },

    // -- Faults and flow --
    ComponentBlown {
        component: ComponentId,
        tick: Ticks,
    },
    CircuitBroken {
        circuit: CircuitId,
        cause: ComponentId,
        tick: Ticks,
    },
    CircuitRestored {
        circuit: CircuitId,
        tick: Ticks,
    },

    // -- Component behavior --
    SourceFlipped {
        component: ComponentId,
        tick: Ticks,
    },
    DiodeLocked {
        component: ComponentId,
        tick: Ticks,
    },
    DiodeUnlocked {
        component: ComponentId,
        tick: Ticks,
    },
    CapacitorPhaseChanged {
        component: ComponentId,
        phase: CapacitorPhase,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ComponentAdded,
    ComponentRemoved,
    WireAdded,
    WireRemoved,
    ComponentBlown,
    CircuitBroken,
    CircuitRestored,
    SourceFlipped,
    DiodeLocked,
    DiodeUnlocked,
    CapacitorPhaseChanged,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 11;

impl Event {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ComponentAdded { .. } => EventKind::ComponentAdded,
            Event::ComponentRemoved { .. } => EventKind::ComponentRemoved,
            Event::WireAdded { .. } => EventKind::WireAdded,
            Event::WireRemoved { .. } => EventKind::WireRemoved,
            Event::ComponentBlown { .. } => EventKind::ComponentBlown,
            Event::CircuitBroken { .. } => EventKind::CircuitBroken,
            Event::CircuitRestored { .. } => EventKind::CircuitRestored,
            Event::SourceFlipped { .. } => EventKind::SourceFlipped,
            Event::DiodeLocked { .. } => EventKind::DiodeLocked,
            Event::DiodeUnlocked { .. } => EventKind::DiodeUnlocked,
            Event::CapacitorPhaseChanged { .. } => EventKind::CapacitorPhaseChanged,
        }
    }

    /// The tick the event was recorded at.
    pub fn tick(&self) -> Ticks {
        match self {
            Event::ComponentAdded { tick, .. }
            | Event::ComponentRemoved { tick, .. }
            | Event::WireAdded { tick, .. }
            | Event::WireRemoved { tick, .. }
            | Event::ComponentBlown { tick, .. }
            | Event::CircuitBroken { tick, .. }
            | Event::CircuitRestored { tick, .. }
            | Event::SourceFlipped { tick, .. }
            | Event::DiodeLocked { tick, .. }
            | Event::DiodeUnlocked { tick, .. }
            | Event::CapacitorPhaseChanged { tick, .. } => *tick,
        }
    }
}

impl EventKind {
    /// Convert to usize index for array lookups.
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer -- bounded ring
// ---------------------------------------------------------------------------

/// A bounded ring of events. When full, the oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: VecDeque<Event>,
    capacity: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// Create a new ring with the given capacity. A capacity of 0 is clamped
    /// to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
        }
    }

    /// Push an event. If full, the oldest event is dropped.
    pub fn push(&mut self, event: Event) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.total_written += 1;
    }

    /// The total capacity of the ring.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events currently stored.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total events written since creation (including dropped).
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of events dropped because the ring was full.
    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.events.len() as u64)
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Clear all events. The lifetime counter is not reset.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// A listener receives delivered events read-only.
pub type Listener = Box<dyn FnMut(&Event)>;

/// Optional predicate that filters events for a listener.
pub type EventFilter = Box<dyn Fn(&Event) -> bool>;

struct ListenerEntry {
    listener: Listener,
    filter: Option<EventFilter>,
}

impl std::fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("listener", &"<fn>")
            .field(
                "filter",
                &if self.filter.is_some() {
                    "Some(<fn>)"
                } else {
                    "None"
                },
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// The central notification bus: one ring per event kind, listener lists,
/// suppression flags, and the tick stamp applied to emitted events.
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<ListenerEntry>; EVENT_KIND_COUNT],
    default_capacity: usize,
    /// Tick stamp for events emitted by graph code that does not track time.
    tick: Ticks,
    /// Master switch. While muted, nothing is buffered or delivered.
    muted: bool,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("default_capacity", &self.default_capacity)
            .field("tick", &self.tick)
            .field("muted", &self.muted)
            .finish_non_exhaustive()
    }
}

const fn empty_listener_array() -> [Vec<ListenerEntry>; EVENT_KIND_COUNT] {
    // Cannot use Default in const context, so build it manually.
    [
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
    ]
}

impl EventBus {
    /// Create a new bus with the given default buffer capacity per kind.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: empty_listener_array(),
            default_capacity,
            tick: 0,
            muted: false,
        }
    }

    /// The tick stamp currently applied to emitted events.
    pub fn tick(&self) -> Ticks {
        self.tick
    }

    /// Update the tick stamp. The coordinator calls this as ticks advance.
    pub fn set_tick(&mut self, tick: Ticks) {
        self.tick = tick;
    }

    /// Silence the whole bus. Emitted events are discarded.
    pub fn mute(&mut self) {
        self.muted = true;
    }

    /// Re-enable the bus after [`EventBus::mute`].
    pub fn unmute(&mut self) {
        self.muted = false;
    }

    /// Whether the bus is currently muted.
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Suppress one event kind. Suppressed kinds are never buffered.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        // Drop the buffer so suppressed kinds cost nothing.
        self.buffers[kind.index()] = None;
    }

    /// Check if an event kind is suppressed.
    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Emit an event into its ring buffer. No-ops while muted or when the
    /// kind is suppressed.
    pub fn emit(&mut self, event: Event) {
        if self.muted {
            return;
        }
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        if self.buffers[idx].is_none() {
            self.buffers[idx] = Some(EventBuffer::new(self.default_capacity));
        }
        if let Some(buffer) = self.buffers[idx].as_mut() {
            buffer.push(event);
        }
    }

    /// Register a listener for an event kind. Listeners are called in
    /// registration order during delivery.
    pub fn on(&mut self, kind: EventKind, listener: Listener) {
        self.on_filtered(kind, None, listener);
    }

    /// Register a listener with an optional filter predicate.
    pub fn on_filtered(&mut self, kind: EventKind, filter: Option<EventFilter>, listener: Listener) {
        self.listeners[kind.index()].push(ListenerEntry { listener, filter });
    }

    /// Deliver all buffered events to listeners and clear the buffers.
    ///
    /// Events of one kind are delivered oldest-to-newest to each listener in
    /// registration order. Buffers are cleared afterwards even when no
    /// listener is registered.
    pub fn deliver(&mut self) {
        if self.muted {
            return;
        }
        for idx in 0..EVENT_KIND_COUNT {
            let Some(buffer) = self.buffers[idx].as_ref() else {
                continue;
            };
            if buffer.is_empty() {
                continue;
            }

            // Copy out to avoid holding a buffer borrow across listener calls.
            let events: Vec<Event> = buffer.iter().cloned().collect();

            for entry in &mut self.listeners[idx] {
                for event in &events {
                    if let Some(filter) = &entry.filter
                        && !filter(event)
                    {
                        continue;
                    }
                    (entry.listener)(event);
                }
            }

            if let Some(buffer) = self.buffers[idx].as_mut() {
                buffer.clear();
            }
        }
    }

    /// The ring buffer for one event kind, if any events were emitted.
    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }

    /// Count of events currently buffered for a kind.
    pub fn buffered_count(&self, kind: EventKind) -> usize {
        self.buffers[kind.index()].as_ref().map_or(0, |b| b.len())
    }

    /// Total events ever emitted for a kind (survives delivery and clears).
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffers[kind.index()]
            .as_ref()
            .map_or(0, |b| b.total_written())
    }

    /// Clear all buffers. Listeners and suppression settings are kept.
    pub fn clear_all(&mut self) {
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.clear();
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
