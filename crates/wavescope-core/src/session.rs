//! Session: one envelope, two viewports and the annotation layer, wired
//! through a session-scoped event bus
//!
//! The session owns every component. Bus handlers hold weak references only,
//! so dropping the session drops the graph. Every entry point releases its
//! component borrow before flushing the bus; handlers therefore always find
//! the components they touch unborrowed.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Instant;

use crate::annotations::layer::AnnotationCounts;
use crate::annotations::{AnnotationLayer, EntityId, Marker, SegmentOptions, SpeakerInterval, TimeRange};
use crate::config::ViewerConfig;
use crate::context::ViewContext;
use crate::envelope::Envelope;
use crate::error::{AnnotationResult, SessionError, SessionResult};
use crate::events::{EventBus, SubscriptionId, Topic, ViewEvent, ZoomSource};
use crate::payload::AnnotationPayload;
use crate::resample::ResampleEngine;
use crate::types::{Seconds, ViewportKind};
use crate::viewport::{Debounced, Overview, Viewport, ZoomView};

/// Container geometry for a new session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub width: u32,
    pub overview_height: u32,
    pub zoomview_height: u32,
}

impl SessionOptions {
    /// Options with the configured viewport heights
    pub fn with_width(width: u32, config: &ViewerConfig) -> Self {
        Self {
            width,
            overview_height: config.overview.height,
            zoomview_height: config.zoomview.height,
        }
    }
}

/// Borrow a component from a bus handler
fn with<T>(weak: &Weak<RefCell<T>>, f: impl FnOnce(&mut T)) {
    let Some(rc) = weak.upgrade() else {
        return;
    };
    match rc.try_borrow_mut() {
        Ok(mut component) => f(&mut component),
        Err(_) => log::error!("session: component already borrowed, dropping event"),
    };
}

pub struct Session {
    ctx: ViewContext,
    overview: Rc<RefCell<Overview>>,
    zoomview: Rc<RefCell<ZoomView>>,
    layer: Rc<RefCell<AnnotationLayer>>,
    subscriptions: Vec<SubscriptionId>,
    resize: Debounced<u32>,
    width: u32,
    disposed: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("width", &self.width)
            .field("zoom_level", &self.zoomview.borrow().zoom_level())
            .field("bus", &self.ctx.bus)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl Session {
    pub fn new(envelope: Arc<Envelope>, config: ViewerConfig, options: SessionOptions) -> SessionResult<Self> {
        config.validate()?;
        if envelope.is_empty() {
            return Err(SessionError::EmptyEnvelope);
        }
        for height in [options.overview_height, options.zoomview_height] {
            if options.width == 0 || height == 0 {
                return Err(SessionError::InvalidContainer {
                    width: options.width,
                    height,
                });
            }
        }

        let resize = Debounced::new(config.resize_settle());
        let ctx = ViewContext::new(
            Rc::new(EventBus::new()),
            Rc::new(ResampleEngine::new(envelope)),
            Rc::new(config),
        );

        let layer = Rc::new(RefCell::new(AnnotationLayer::new(ctx.clone())));
        let overview = Rc::new(RefCell::new(Overview::new(
            ctx.clone(),
            options.width,
            options.overview_height,
        )?));
        let zoomview = Rc::new(RefCell::new(ZoomView::new(
            ctx.clone(),
            options.width,
            options.zoomview_height,
        )?));

        let mut session = Self {
            ctx,
            overview,
            zoomview,
            layer,
            subscriptions: Vec::new(),
            resize,
            width: options.width,
            disposed: false,
        };
        session.wire();
        session.flush();

        log::info!(
            "session: created {}px wide, {:.2}s at {}Hz, zoom level {}",
            session.width,
            session.ctx.duration(),
            session.ctx.sample_rate(),
            session.current_zoom_level()
        );
        Ok(session)
    }

    fn wire(&mut self) {
        let bus = Rc::clone(&self.ctx.bus);
        let overview = Rc::downgrade(&self.overview);
        let zoomview = Rc::downgrade(&self.zoomview);
        let layer = Rc::downgrade(&self.layer);

        let mut subs = Vec::new();

        {
            let (overview, layer) = (overview.clone(), layer.clone());
            subs.push(bus.subscribe(Topic::FrameChanged, move |event| {
                let ViewEvent::FrameChanged(frame) = event else { return };
                with(&layer, |l| l.on_frame_changed(frame));
                if frame.kind == ViewportKind::ZoomView {
                    with(&overview, |o| o.show_zoom_window(frame));
                }
            }));
        }
        {
            let (overview, zoomview) = (overview.clone(), zoomview.clone());
            subs.push(bus.subscribe(Topic::UserSeek, move |event| {
                let ViewEvent::UserSeek { time } = *event else { return };
                with(&zoomview, |z| z.on_user_seek(time));
                with(&overview, |o| o.set_playhead_time(time));
            }));
        }
        {
            let zoomview = zoomview.clone();
            subs.push(bus.subscribe(Topic::ZoomLevelChanged, move |event| {
                let ViewEvent::ZoomLevelChanged { index, source } = *event else { return };
                with(&zoomview, |z| {
                    let outcome = z.request_zoom_level(index);
                    log::debug!("session: zoom to {} from {:?}: {:?}", index, source, outcome);
                });
            }));
        }
        {
            let (overview, zoomview) = (overview.clone(), zoomview.clone());
            subs.push(bus.subscribe(Topic::PlayheadTime, move |event| {
                let ViewEvent::PlayheadTime { time } = *event else { return };
                with(&overview, |o| o.set_playhead_time(time));
                with(&zoomview, |z| z.set_playhead_time(time));
            }));
        }
        {
            let zoomview = zoomview.clone();
            subs.push(bus.subscribe(Topic::PlaybackState, move |event| {
                let ViewEvent::PlaybackState { playing } = *event else { return };
                with(&zoomview, |z| z.set_playing(playing));
            }));
        }
        {
            let layer = layer.clone();
            subs.push(bus.subscribe(Topic::ZoomAnimation, move |event| {
                let ViewEvent::ZoomAnimation(phase) = *event else { return };
                with(&layer, |l| l.on_zoom_animation(phase));
            }));
        }
        subs.push(bus.subscribe(Topic::Resize, move |event| {
            let ViewEvent::Resize { width } = *event else { return };
            with(&overview, |o| o.resize(width));
            with(&zoomview, |z| z.resize(width));
        }));

        self.subscriptions = subs;
    }

    fn flush(&self) {
        self.ctx.bus.flush();
    }

    pub fn context(&self) -> &ViewContext {
        &self.ctx
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.ctx.config
    }

    pub fn overview(&self) -> Ref<'_, Overview> {
        self.overview.borrow()
    }

    pub fn zoomview(&self) -> Ref<'_, ZoomView> {
        self.zoomview.borrow()
    }

    pub fn annotations(&self) -> Ref<'_, AnnotationLayer> {
        self.layer.borrow()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Register an external collaborator on the bus
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: FnMut(&ViewEvent) + 'static,
    {
        self.ctx.bus.subscribe(topic, handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.ctx.bus.unsubscribe(id)
    }

    // Pointer and wheel input

    pub fn overview_pointer_down(&self, x: f64) {
        self.overview.borrow_mut().pointer_down(x);
        self.flush();
    }

    pub fn overview_pointer_move(&self, x: f64) {
        self.overview.borrow_mut().pointer_move(x);
        self.flush();
    }

    pub fn overview_pointer_up(&self, x: f64) {
        self.overview.borrow_mut().pointer_up(x);
        self.flush();
    }

    pub fn zoomview_pointer_down(&self, x: f64) {
        self.zoomview.borrow_mut().pointer_down(x);
        self.flush();
    }

    pub fn zoomview_pointer_move(&self, x: f64) {
        self.zoomview.borrow_mut().pointer_move(x);
        self.flush();
    }

    pub fn zoomview_pointer_up(&self, x: f64) {
        self.zoomview.borrow_mut().pointer_up(x);
        self.flush();
    }

    pub fn zoomview_wheel(&self, delta: f64, now: Instant) {
        self.zoomview.borrow_mut().wheel(delta, now);
    }

    /// Container width changed; applied once the resize settles
    pub fn resize(&mut self, width: u32, now: Instant) {
        if width == 0 {
            log::warn!("session: ignoring resize to zero width");
            return;
        }
        self.resize.trigger(width, now);
    }

    /// Display refresh tick: settles debounces and advances animation
    ///
    /// Returns true if anything needs repainting.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        if let Some(width) = self.resize.poll(now) {
            if width != self.width {
                log::debug!("session: resize {} -> {}", self.width, width);
                self.width = width;
                self.ctx.bus.publish(ViewEvent::Resize { width });
                changed = true;
            }
        }
        self.flush();

        changed |= self.zoomview.borrow_mut().tick(now);
        self.flush();
        changed
    }

    // Player wrapper

    pub fn set_playhead_time(&self, time: Seconds) {
        self.ctx.bus.emit(ViewEvent::PlayheadTime { time });
    }

    pub fn set_playing(&self, playing: bool) {
        self.ctx.bus.emit(ViewEvent::PlaybackState { playing });
    }

    /// Programmatic seek, as if the user had clicked
    pub fn seek(&self, time: Seconds) {
        let time = time.clamp(0.0, self.ctx.duration());
        self.ctx.bus.emit(ViewEvent::UserSeek { time });
    }

    // Zoom

    pub fn current_zoom_level(&self) -> usize {
        self.zoomview.borrow().zoom_level()
    }

    pub fn current_scale(&self) -> f64 {
        self.zoomview.borrow().scale()
    }

    pub fn set_zoom_level(&self, index: usize, source: ZoomSource) {
        let index = index.min(self.ctx.config.zoom_levels.len().saturating_sub(1));
        self.ctx.bus.emit(ViewEvent::ZoomLevelChanged { index, source });
    }

    /// Move to the next smaller scale; false at the limit
    pub fn zoom_in(&self) -> bool {
        let level = self.current_zoom_level();
        if level == 0 {
            return false;
        }
        self.set_zoom_level(level - 1, ZoomSource::Api);
        true
    }

    /// Move to the next larger scale; false at the limit
    pub fn zoom_out(&self) -> bool {
        let level = self.current_zoom_level();
        if level + 1 >= self.ctx.config.zoom_levels.len() {
            return false;
        }
        self.set_zoom_level(level + 1, ZoomSource::Api);
        true
    }

    // Annotations

    pub fn add_segment(&self, start: Seconds, end: Seconds, options: SegmentOptions) -> AnnotationResult<EntityId> {
        let result = self.layer.borrow_mut().add_segment(start, end, options);
        self.flush();
        result
    }

    pub fn update_segment(&self, id: EntityId, start: Seconds, end: Seconds) -> AnnotationResult<()> {
        let result = self.layer.borrow_mut().update_segment(id, start, end);
        self.flush();
        result
    }

    pub fn remove_segment(&self, id: EntityId) -> bool {
        let removed = self.layer.borrow_mut().remove_segment(id);
        self.flush();
        removed
    }

    pub fn remove_segments_by_time(&self, start: Seconds, end: Option<Seconds>) -> Vec<EntityId> {
        let removed = self.layer.borrow_mut().remove_segments_by_time(start, end);
        self.flush();
        removed
    }

    pub fn remove_all_segments(&self) -> Vec<EntityId> {
        let removed = self.layer.borrow_mut().remove_all_segments();
        self.flush();
        removed
    }

    pub fn drag_segment_marker(&self, id: EntityId, marker: Marker, x: f64) -> AnnotationResult<TimeRange> {
        let result = self.layer.borrow_mut().drag_segment_marker(id, marker, x);
        self.flush();
        result
    }

    pub fn add_tag(&self, start: Seconds, end: Seconds, label: &str, confidence: f64) -> AnnotationResult<EntityId> {
        self.layer.borrow_mut().add_tag(start, end, label, confidence)
    }

    pub fn remove_tag(&self, id: EntityId) -> bool {
        self.layer.borrow_mut().remove_tag(id)
    }

    pub fn add_keyword(&self, start: Seconds, end: Seconds, label: &str) -> AnnotationResult<EntityId> {
        self.layer.borrow_mut().add_keyword(start, end, label)
    }

    pub fn remove_keyword(&self, id: EntityId) -> bool {
        self.layer.borrow_mut().remove_keyword(id)
    }

    pub fn add_speaker(&self, start: Seconds, end: Seconds, speaker: &str) -> AnnotationResult<EntityId> {
        self.layer.borrow_mut().add_speaker(start, end, speaker)
    }

    pub fn remove_speaker(&self, id: EntityId) -> bool {
        self.layer.borrow_mut().remove_speaker(id)
    }

    pub fn load_speakers(&self, raw: &[SpeakerInterval]) -> AnnotationResult<Vec<EntityId>> {
        self.layer.borrow_mut().load_speakers(raw)
    }

    pub fn load_payload(&self, payload: &AnnotationPayload) -> AnnotationCounts {
        let counts = self.layer.borrow_mut().load_payload(payload);
        self.flush();
        counts
    }

    /// Tear down every subscription and pending event
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for id in self.subscriptions.drain(..) {
            self.ctx.bus.unsubscribe(id);
        }
        self.ctx.bus.clear();
        self.resize.cancel();
        self.disposed = true;
        log::info!("session: disposed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispose();
    }
}
