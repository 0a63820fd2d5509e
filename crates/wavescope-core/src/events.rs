//! Synchronous publish/subscribe bus shared by every component of a session
//!
//! `publish` enqueues; the queue is drained before the outermost call
//! returns. Events are delivered in FIFO order and, for a given event, to the
//! topic's subscribers in subscription order. An event published from inside
//! a handler is queued behind the one being delivered, so handlers are never
//! re-entered and every subscriber sees frames in production order.
//!
//! Components publish while holding their own state borrowed; the session
//! calls [`EventBus::flush`] once those borrows are released.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::types::{FrameGeometry, Seconds};

/// Where a zoom level change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomSource {
    /// Programmatic call on the session
    Api,
    /// Keyboard or other host-page control
    Keyboard,
    /// Settled mouse-wheel gesture on the zoom view
    Wheel,
}

/// Phase of a zoom transition animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPhase {
    Started,
    Finished,
}

/// Everything that travels over the bus
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// A viewport redrew its frame
    FrameChanged(FrameGeometry),
    /// The user seeked by pointer on the overview (or clicked the zoom view)
    UserSeek { time: Seconds },
    /// A new zoom level was requested
    ZoomLevelChanged { index: usize, source: ZoomSource },
    /// Playback progressed
    PlayheadTime { time: Seconds },
    /// Playback started or stopped
    PlaybackState { playing: bool },
    SegmentCreated { id: u64 },
    SegmentRemoved { id: u64 },
    /// Segment time range changed through a drag or an explicit edit
    SegmentChanged { id: u64 },
    /// Container resized (after settling)
    Resize { width: u32 },
    ZoomAnimation(AnimationPhase),
}

/// Subscription topic, one per event variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    FrameChanged,
    UserSeek,
    ZoomLevelChanged,
    PlayheadTime,
    PlaybackState,
    SegmentCreated,
    SegmentRemoved,
    SegmentChanged,
    Resize,
    ZoomAnimation,
}

impl ViewEvent {
    pub fn topic(&self) -> Topic {
        match self {
            ViewEvent::FrameChanged(_) => Topic::FrameChanged,
            ViewEvent::UserSeek { .. } => Topic::UserSeek,
            ViewEvent::ZoomLevelChanged { .. } => Topic::ZoomLevelChanged,
            ViewEvent::PlayheadTime { .. } => Topic::PlayheadTime,
            ViewEvent::PlaybackState { .. } => Topic::PlaybackState,
            ViewEvent::SegmentCreated { .. } => Topic::SegmentCreated,
            ViewEvent::SegmentRemoved { .. } => Topic::SegmentRemoved,
            ViewEvent::SegmentChanged { .. } => Topic::SegmentChanged,
            ViewEvent::Resize { .. } => Topic::Resize,
            ViewEvent::ZoomAnimation(_) => Topic::ZoomAnimation,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Rc<RefCell<dyn FnMut(&ViewEvent)>>;

struct Subscriber {
    id: SubscriptionId,
    topic: Topic,
    handler: Handler,
}

/// Session-scoped event bus
#[derive(Default)]
pub struct EventBus {
    subscribers: RefCell<Vec<Subscriber>>,
    queue: RefCell<VecDeque<ViewEvent>>,
    next_id: Cell<u64>,
    dispatching: Cell<bool>,
    delivered: Cell<u64>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.borrow().len())
            .field("queued", &self.queue.borrow().len())
            .field("dispatching", &self.dispatching.get())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one topic
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: FnMut(&ViewEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            topic,
            handler: Rc::new(RefCell::new(handler)),
        });
        id
    }

    /// Remove a handler; returns false if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.borrow_mut();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    /// Queue an event for delivery on the next flush
    pub fn publish(&self, event: ViewEvent) {
        self.queue.borrow_mut().push_back(event);
    }

    /// Queue an event and deliver everything pending
    pub fn emit(&self, event: ViewEvent) {
        self.publish(event);
        self.flush();
    }

    /// Deliver all pending events
    ///
    /// A flush requested from inside a handler returns immediately; the
    /// outer flush picks up whatever the handler queued.
    pub fn flush(&self) {
        if self.dispatching.get() {
            return;
        }
        self.dispatching.set(true);

        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(event) = next else { break };

            let topic = event.topic();
            let handlers: Vec<Handler> = self
                .subscribers
                .borrow()
                .iter()
                .filter(|s| s.topic == topic)
                .map(|s| Rc::clone(&s.handler))
                .collect();

            for handler in handlers {
                match handler.try_borrow_mut() {
                    Ok(mut h) => (*h)(&event),
                    Err(_) => log::error!("EventBus: handler for {:?} re-entered, skipping", topic),
                }
            }
            self.delivered.set(self.delivered.get() + 1);
        }

        self.dispatching.set(false);
    }

    /// Number of events waiting for a flush
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Total events delivered since creation
    pub fn delivered(&self) -> u64 {
        self.delivered.get()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Drop all subscribers and pending events
    pub fn clear(&self) {
        self.subscribers.borrow_mut().clear();
        self.queue.borrow_mut().clear();
    }
}
