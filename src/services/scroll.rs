//! Scroll-spy for the floating table of contents.
//!
//! Everything here runs on the UI thread inside the scroll handler. The
//! tracker reads heading positions through [`ReadingSurface`] and keeps the
//! active navigation entry visible inside the nav panel.

use crate::types::{Bounds, ReadingState, TocEntry};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::debug;

/// Live layout data for the page being read.
pub trait ReadingSurface {
    fn viewport_height(&self) -> f64;

    /// Top offset of the heading element relative to the viewport, if rendered.
    fn heading_top(&self, id: &str) -> Option<f64>;

    fn nav_panel_bounds(&self) -> Option<Bounds>;

    fn nav_entry_bounds(&self, id: &str) -> Option<Bounds>;

    /// Smoothly scroll the nav panel so the entry sits in its centre.
    fn scroll_nav_entry_into_view(&self, id: &str);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    /// Target point as a fraction of viewport height from the top.
    pub target_ratio: f64,
    /// How far below the target point a heading may sit and still qualify.
    pub lookahead_px: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            target_ratio: 0.35,
            lookahead_px: 100.0,
        }
    }
}

pub struct ScrollTracker {
    entries: Vec<TocEntry>,
    config: TrackerConfig,
    state: ReadingState,
}

impl ScrollTracker {
    pub fn new(entries: Vec<TocEntry>) -> Self {
        Self::with_config(entries, TrackerConfig::default())
    }

    pub fn with_config(entries: Vec<TocEntry>, config: TrackerConfig) -> Self {
        Self {
            entries,
            config,
            state: ReadingState::default(),
        }
    }

    pub fn state(&self) -> &ReadingState {
        &self.state
    }

    pub fn active_heading_id(&self) -> Option<&str> {
        self.state.active_heading_id.as_deref()
    }

    /// Pick the heading currently being read without touching state.
    ///
    /// Among headings at or above `target + lookahead`, the one closest to the
    /// target wins; ties go to the earlier entry. With no such heading, the
    /// first entry is used while it is above the bottom of the viewport.
    pub fn select_active<S: ReadingSurface + ?Sized>(&self, surface: &S) -> Option<&str> {
        let viewport_height = surface.viewport_height();
        let target = viewport_height * self.config.target_ratio;
        let threshold = target + self.config.lookahead_px;

        let mut closest: Option<(&str, f64)> = None;
        for entry in &self.entries {
            let Some(top) = surface.heading_top(&entry.id) else {
                continue;
            };
            let distance = (top - target).abs();
            if top <= threshold && closest.map_or(true, |(_, best)| distance < best) {
                closest = Some((entry.id.as_str(), distance));
            }
        }

        if let Some((id, _)) = closest {
            return Some(id);
        }

        let first = self.entries.first()?;
        match surface.heading_top(&first.id) {
            Some(top) if top < viewport_height => Some(first.id.as_str()),
            _ => None,
        }
    }

    /// Recompute the active heading. Returns true when it changed.
    ///
    /// When nothing qualifies the previous heading stays active.
    pub fn recompute<S: ReadingSurface + ?Sized>(&mut self, surface: &S) -> bool {
        let Some(selected) = self.select_active(surface) else {
            return false;
        };
        if self.active_heading_id() == Some(selected) {
            return false;
        }

        let selected = selected.to_string();
        debug!("Active heading changed to '{}'", selected);
        reveal_in_nav(surface, &selected);
        self.state.active_heading_id = Some(selected);
        true
    }

    /// Run the mount-time check and follow every later scroll event until the
    /// returned handle is dropped.
    pub fn attach<S: ReadingSurface + 'static>(
        mut self,
        events: &ScrollEvents<S>,
        surface: &S,
    ) -> TrackerHandle {
        self.recompute(surface);

        let tracker = Rc::new(RefCell::new(self));
        let handler_tracker = Rc::clone(&tracker);
        let subscription = events.subscribe(move |surface: &S| {
            handler_tracker.borrow_mut().recompute(surface);
        });

        TrackerHandle {
            tracker,
            _subscription: subscription,
        }
    }
}

fn reveal_in_nav<S: ReadingSurface + ?Sized>(surface: &S, id: &str) {
    if let (Some(panel), Some(entry)) = (surface.nav_panel_bounds(), surface.nav_entry_bounds(id)) {
        if !panel.contains(&entry) {
            surface.scroll_nav_entry_into_view(id);
        }
    }
}

/// Owns a mounted tracker; dropping it deregisters the scroll handler.
pub struct TrackerHandle {
    tracker: Rc<RefCell<ScrollTracker>>,
    _subscription: Subscription,
}

impl TrackerHandle {
    pub fn active_heading_id(&self) -> Option<String> {
        self.tracker.borrow().state.active_heading_id.clone()
    }

    pub fn state(&self) -> ReadingState {
        self.tracker.borrow().state.clone()
    }
}

type Handler<S> = Box<dyn FnMut(&S)>;

struct Registry<S> {
    handlers: RefCell<Vec<(u64, Handler<S>)>>,
    dispatching: Cell<bool>,
    /// Ids released while their handler was detached for a dispatch.
    released: RefCell<Vec<u64>>,
}

impl<S> Registry<S> {
    fn release(&self, id: u64) {
        self.handlers.borrow_mut().retain(|(handler_id, _)| *handler_id != id);
        if self.dispatching.get() {
            self.released.borrow_mut().push(id);
        }
    }
}

/// Single-threaded scroll event source.
///
/// Handlers may subscribe or drop subscriptions (including their own) while
/// a dispatch runs. A handler added during a dispatch first runs on the next
/// one; a handler released during a dispatch does not run again.
pub struct ScrollEvents<S> {
    registry: Rc<Registry<S>>,
    next_id: Cell<u64>,
}

impl<S: 'static> ScrollEvents<S> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(Registry {
                handlers: RefCell::new(Vec::new()),
                dispatching: Cell::new(false),
                released: RefCell::new(Vec::new()),
            }),
            next_id: Cell::new(0),
        }
    }

    pub fn subscribe(&self, handler: impl FnMut(&S) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let handler: Handler<S> = Box::new(handler);
        self.registry.handlers.borrow_mut().push((id, handler));

        let registry: Weak<Registry<S>> = Rc::downgrade(&self.registry);
        let release: Box<dyn FnOnce()> = Box::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.release(id);
            }
        });
        Subscription {
            release: Some(release),
        }
    }

    pub fn dispatch(&self, surface: &S) {
        let registry = &self.registry;
        if registry.dispatching.get() {
            debug!("Ignoring nested scroll dispatch");
            return;
        }

        // Detach the list so handlers can re-enter subscribe or release.
        let mut running = std::mem::take(&mut *registry.handlers.borrow_mut());
        registry.dispatching.set(true);

        for (id, handler) in running.iter_mut() {
            if registry.released.borrow().contains(id) {
                continue;
            }
            handler(surface);
        }

        // Dropping a released handler may release others it owned.
        loop {
            let released = std::mem::take(&mut *registry.released.borrow_mut());
            if released.is_empty() {
                break;
            }
            let (gone, kept): (Vec<_>, Vec<_>) = running
                .into_iter()
                .partition(|(id, _)| released.contains(id));
            running = kept;
            drop(gone);
        }
        registry.dispatching.set(false);

        let mut handlers = registry.handlers.borrow_mut();
        let added = std::mem::take(&mut *handlers);
        *handlers = running;
        handlers.extend(added);
    }

    pub fn listener_count(&self) -> usize {
        self.registry.handlers.borrow().len()
    }
}

impl<S: 'static> Default for ScrollEvents<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deregisters its handler on drop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::toc::extract_toc;
    use std::collections::HashMap;

    struct FakePage {
        viewport_height: f64,
        tops: HashMap<String, f64>,
        panel: Bounds,
        entries: HashMap<String, Bounds>,
        nav_scrolls: RefCell<Vec<String>>,
    }

    impl FakePage {
        fn new(viewport_height: f64, tops: &[(&str, f64)]) -> Self {
            Self {
                viewport_height,
                tops: tops.iter().map(|(id, top)| (id.to_string(), *top)).collect(),
                panel: Bounds::new(0.0, 400.0),
                entries: HashMap::new(),
                nav_scrolls: RefCell::new(Vec::new()),
            }
        }

        fn set_top(&mut self, id: &str, top: f64) {
            self.tops.insert(id.to_string(), top);
        }
    }

    impl ReadingSurface for FakePage {
        fn viewport_height(&self) -> f64 {
            self.viewport_height
        }

        fn heading_top(&self, id: &str) -> Option<f64> {
            self.tops.get(id).copied()
        }

        fn nav_panel_bounds(&self) -> Option<Bounds> {
            Some(self.panel)
        }

        fn nav_entry_bounds(&self, id: &str) -> Option<Bounds> {
            self.entries.get(id).copied()
        }

        fn scroll_nav_entry_into_view(&self, id: &str) {
            self.nav_scrolls.borrow_mut().push(id.to_string());
        }
    }

    fn three_sections() -> Vec<TocEntry> {
        extract_toc("## Alpha\n## Beta\n### Gamma")
    }

    #[test]
    fn test_selects_heading_closest_to_target_band() {
        // 800px viewport puts the target at 280px.
        let page = FakePage::new(800.0, &[("alpha", 500.0), ("beta", 50.0), ("gamma", -200.0)]);
        let tracker = ScrollTracker::new(three_sections());
        assert_eq!(tracker.select_active(&page), Some("beta"));
    }

    #[test]
    fn test_lookahead_admits_heading_just_below_target() {
        let page = FakePage::new(800.0, &[("alpha", -400.0), ("beta", 370.0), ("gamma", 900.0)]);
        let tracker = ScrollTracker::new(three_sections());
        assert_eq!(tracker.select_active(&page), Some("beta"));
    }

    #[test]
    fn test_ties_go_to_earlier_entry() {
        let page = FakePage::new(800.0, &[("alpha", 180.0), ("beta", 380.0), ("gamma", 1200.0)]);
        let tracker = ScrollTracker::new(three_sections());
        assert_eq!(tracker.select_active(&page), Some("alpha"));
    }

    #[test]
    fn test_falls_back_to_first_visible_heading() {
        let page = FakePage::new(800.0, &[("alpha", 600.0), ("beta", 1400.0), ("gamma", 2000.0)]);
        let tracker = ScrollTracker::new(three_sections());
        assert_eq!(tracker.select_active(&page), Some("alpha"));
    }

    #[test]
    fn test_nothing_selected_above_first_heading() {
        let page = FakePage::new(800.0, &[("alpha", 900.0), ("beta", 1400.0)]);
        let mut tracker = ScrollTracker::new(three_sections());
        assert_eq!(tracker.select_active(&page), None);
        assert!(!tracker.recompute(&page));
        assert_eq!(tracker.active_heading_id(), None);
    }

    #[test]
    fn test_missing_elements_are_skipped() {
        let page = FakePage::new(800.0, &[("gamma", 250.0)]);
        let tracker = ScrollTracker::new(three_sections());
        assert_eq!(tracker.select_active(&page), Some("gamma"));
        assert_eq!(ScrollTracker::new(Vec::new()).select_active(&page), None);
    }

    #[test]
    fn test_previous_heading_kept_when_nothing_qualifies() {
        let mut page = FakePage::new(800.0, &[("alpha", 100.0), ("beta", 900.0)]);
        let mut tracker = ScrollTracker::new(three_sections());
        assert!(tracker.recompute(&page));
        assert_eq!(tracker.active_heading_id(), Some("alpha"));

        page.set_top("alpha", 1000.0);
        page.set_top("beta", 1500.0);
        assert!(!tracker.recompute(&page));
        assert_eq!(tracker.active_heading_id(), Some("alpha"));
    }

    #[test]
    fn test_nav_scrolls_only_when_entry_hidden() {
        let mut page = FakePage::new(800.0, &[("alpha", 200.0), ("beta", 1200.0)]);
        page.entries.insert("alpha".into(), Bounds::new(10.0, 30.0));
        page.entries.insert("beta".into(), Bounds::new(390.0, 420.0));

        let mut tracker = ScrollTracker::new(three_sections());
        tracker.recompute(&page);
        assert!(page.nav_scrolls.borrow().is_empty());

        page.set_top("alpha", -600.0);
        page.set_top("beta", 250.0);
        assert!(tracker.recompute(&page));
        assert!(!tracker.recompute(&page));
        assert_eq!(*page.nav_scrolls.borrow(), vec!["beta".to_string()]);
    }

    #[test]
    fn test_attached_tracker_follows_scroll_events() {
        let events = ScrollEvents::new();
        let mut page = FakePage::new(800.0, &[("alpha", 100.0), ("beta", 700.0), ("gamma", 1300.0)]);

        let handle = ScrollTracker::new(three_sections()).attach(&events, &page);
        assert_eq!(handle.active_heading_id().as_deref(), Some("alpha"));
        assert_eq!(events.listener_count(), 1);

        page.set_top("alpha", -500.0);
        page.set_top("beta", 260.0);
        page.set_top("gamma", 860.0);
        events.dispatch(&page);
        assert_eq!(handle.state().active_heading_id.as_deref(), Some("beta"));

        drop(handle);
        assert_eq!(events.listener_count(), 0);
        events.dispatch(&page);
    }

    #[test]
    fn test_subscriptions_release_independently() {
        let events: ScrollEvents<FakePage> = ScrollEvents::new();
        let hits = Rc::new(Cell::new(0));

        let first_hits = Rc::clone(&hits);
        let first = events.subscribe(move |_| first_hits.set(first_hits.get() + 1));
        let second_hits = Rc::clone(&hits);
        let second = events.subscribe(move |_| second_hits.set(second_hits.get() + 10));

        let page = FakePage::new(800.0, &[]);
        events.dispatch(&page);
        assert_eq!(hits.get(), 11);

        drop(first);
        events.dispatch(&page);
        assert_eq!(hits.get(), 21);

        drop(second);
        events.dispatch(&page);
        assert_eq!(hits.get(), 21);
    }

    #[test]
    fn test_handler_can_tear_down_tracker_during_dispatch() {
        let events = ScrollEvents::new();
        let page = FakePage::new(800.0, &[("alpha", 100.0), ("beta", 700.0), ("gamma", 1300.0)]);

        let slot = Rc::new(RefCell::new(Some(
            ScrollTracker::new(three_sections()).attach(&events, &page),
        )));
        let navigate_away = Rc::clone(&slot);
        let _nav = events.subscribe(move |_: &FakePage| {
            navigate_away.borrow_mut().take();
        });
        assert_eq!(events.listener_count(), 2);

        events.dispatch(&page);
        assert!(slot.borrow().is_none());
        assert_eq!(events.listener_count(), 1);
        events.dispatch(&page);
    }

    #[test]
    fn test_released_handler_does_not_run_again() {
        let events: ScrollEvents<FakePage> = ScrollEvents::new();
        let hits = Rc::new(Cell::new(0));

        let own: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let own_slot = Rc::clone(&own);
        let once_hits = Rc::clone(&hits);
        *own.borrow_mut() = Some(events.subscribe(move |_| {
            once_hits.set(once_hits.get() + 1);
            own_slot.borrow_mut().take();
        }));

        let later: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let later_slot = Rc::clone(&later);
        let _killer = events.subscribe(move |_| {
            later_slot.borrow_mut().take();
        });
        let later_hits = Rc::clone(&hits);
        *later.borrow_mut() = Some(events.subscribe(move |_| later_hits.set(later_hits.get() + 100)));

        let page = FakePage::new(800.0, &[]);
        events.dispatch(&page);
        events.dispatch(&page);

        assert_eq!(hits.get(), 1);
        assert_eq!(events.listener_count(), 1);
    }

    #[test]
    fn test_subscribe_during_dispatch_runs_from_next_event() {
        let events: Rc<ScrollEvents<FakePage>> = Rc::new(ScrollEvents::new());
        let hits = Rc::new(Cell::new(0));
        let added: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let weak_events = Rc::downgrade(&events);
        let added_slot = Rc::clone(&added);
        let new_hits = Rc::clone(&hits);
        let _spawner = events.subscribe(move |_| {
            if !added_slot.borrow().is_empty() {
                return;
            }
            if let Some(events) = weak_events.upgrade() {
                let hits = Rc::clone(&new_hits);
                let subscription = events.subscribe(move |_| hits.set(hits.get() + 1));
                added_slot.borrow_mut().push(subscription);
            }
        });

        let page = FakePage::new(800.0, &[]);
        events.dispatch(&page);
        assert_eq!(hits.get(), 0);
        assert_eq!(events.listener_count(), 2);

        events.dispatch(&page);
        assert_eq!(hits.get(), 1);
    }
}
