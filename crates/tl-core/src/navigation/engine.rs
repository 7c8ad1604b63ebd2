//! Topic message navigator implementation

use super::{
    Direction, NavigationContext, NavigationOutcome, NavigationState, NavigationSubscriber,
    Playhead, SessionId,
};
use crate::boundaries::{BoundaryTracker, TopicBoundaries};
use crate::config::NavigatorConfig;
use crate::error::NavigationError;
use crate::source::MessageSource;
use crate::time::Time;
use std::sync::{Arc, Weak};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

type Subscribers = Arc<RwLock<Vec<Weak<dyn NavigationSubscriber>>>>;

/// Session state stored internally
#[derive(Debug)]
struct SessionState {
    topic: String,
    /// Bumped on every reset, seek and close; results of requests issued
    /// under an older incarnation are dropped
    incarnation: u64,
    navigation: NavigationState,
}

impl SessionState {
    fn refresh(&mut self, tracker: &BoundaryTracker) -> TopicBoundaries {
        let bounds = tracker.boundaries_for(&self.topic);
        self.navigation.recompute(&bounds);
        bounds
    }
}

/// Steps through the messages of one topic, one at a time.
///
/// At most one navigation request is in flight per session. Requests issued
/// while another is pending, or in a direction that is not currently
/// available, complete immediately without touching the state.
pub struct TopicNavigator {
    id: SessionId,
    config: NavigatorConfig,
    source: Arc<dyn MessageSource>,
    tracker: BoundaryTracker,
    state: Arc<Mutex<SessionState>>,
    subscribers: Subscribers,
}

impl TopicNavigator {
    /// Create a new session bound to `config.topic`
    pub fn new(
        config: NavigatorConfig,
        source: Arc<dyn MessageSource>,
        tracker: BoundaryTracker,
    ) -> Self {
        let bounds = tracker.boundaries_for(&config.topic);
        let navigation = NavigationState::new(config.start_time.map(Playhead::at_time), &bounds);
        let state = SessionState {
            topic: config.topic.clone(),
            incarnation: 0,
            navigation,
        };

        Self {
            id: Uuid::new_v4(),
            config,
            source,
            tracker,
            state: Arc::new(Mutex::new(state)),
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Move to the earliest message after the current one
    pub async fn handle_next_message(&self) -> Result<NavigationOutcome, NavigationError> {
        self.navigate(Direction::Next).await
    }

    /// Move to the latest message before the current one
    pub async fn handle_previous_message(&self) -> Result<NavigationOutcome, NavigationError> {
        self.navigate(Direction::Previous).await
    }

    async fn navigate(&self, direction: Direction) -> Result<NavigationOutcome, NavigationError> {
        let (topic, incarnation, from) = {
            let mut session = self.state.lock();
            let bounds = session.refresh(&self.tracker);

            if session.navigation.is_closed() || !session.navigation.can_navigate(direction) {
                debug!(
                    "Skipping {} message on '{}' (navigating: {}, current: {:?})",
                    direction,
                    session.topic,
                    session.navigation.is_navigating(),
                    session.navigation.current_time(),
                );
                return Ok(NavigationOutcome::Skipped);
            }

            session.navigation.begin(&bounds);
            (session.topic.clone(), session.incarnation, session.navigation.current())
        };
        self.notify_subscribers();

        // Restores Idle if this future is dropped while the source is pending
        let mut in_flight = InFlight {
            navigator: self,
            incarnation,
            armed: true,
        };

        debug!("Resolving {} message on '{}' from {:?}", direction, topic, from);
        let resolved = match direction {
            Direction::Next => {
                let after = from.map(|playhead| playhead.after_cursor());
                self.source
                    .resolve_after(&topic, after)
                    .await
                    .map(|found| found.filter(|message| after.map_or(true, |a| message.cursor > a)))
            }
            Direction::Previous => {
                let before = from.map(|playhead| playhead.before_cursor());
                self.source
                    .resolve_before(&topic, before)
                    .await
                    .map(|found| {
                        found.filter(|message| before.map_or(true, |b| message.cursor < b))
                    })
            }
        };
        in_flight.armed = false;

        if self.config.record_resolved_boundaries {
            if let Ok(Some(message)) = &resolved {
                self.tracker.observe(&topic, message.time());
            }
        }

        let outcome = {
            let mut session = self.state.lock();
            if session.incarnation != incarnation {
                debug!(
                    "Dropping {} message result for '{}' from incarnation {} (now {})",
                    direction, topic, incarnation, session.incarnation
                );
                return Ok(NavigationOutcome::Superseded);
            }

            let bounds = self.tracker.boundaries_for(&session.topic);
            match resolved {
                Ok(Some(message)) => {
                    session.navigation.finish_moved(message.cursor, &bounds);
                    debug!(
                        "Navigated to {} message on '{}' at {}",
                        direction,
                        topic,
                        message.time()
                    );
                    Ok(NavigationOutcome::Moved(message.cursor))
                }
                Ok(None) => {
                    if self.config.retry_after_exhaustion {
                        session.navigation.finish_unchanged(&bounds);
                    } else {
                        session.navigation.finish_exhausted(direction, &bounds);
                    }
                    debug!("No {} message on '{}'", direction, topic);
                    Ok(NavigationOutcome::Exhausted)
                }
                Err(source) => {
                    session.navigation.finish_unchanged(&bounds);
                    warn!("Error navigating to {} message: {}", direction, source);
                    Err(NavigationError::Source { topic, direction, source })
                }
            }
        };

        self.notify_subscribers();
        outcome
    }

    /// Start over, optionally on another topic.
    ///
    /// Clears the playhead and drops the result of any request in flight.
    pub fn reset(&self, topic: Option<String>) {
        {
            let mut session = self.state.lock();
            session.incarnation += 1;
            if let Some(topic) = topic {
                session.topic = topic;
            }
            let bounds = self.tracker.boundaries_for(&session.topic);
            let closed = session.navigation.is_closed();
            session.navigation = NavigationState::new(None, &bounds);
            if closed {
                session.navigation.close(&bounds);
            }
            info!(
                "Navigation session reset to '{}' (incarnation {})",
                session.topic, session.incarnation
            );
        }
        self.notify_subscribers();
    }

    /// Move the playhead to `time` from outside, e.g. after the user scrubbed
    /// the timeline. Any request in flight is superseded.
    pub fn seek_to(&self, time: Option<Time>) {
        {
            let mut session = self.state.lock();
            session.incarnation += 1;
            let bounds = self.tracker.boundaries_for(&session.topic);
            session.navigation.seek(time.map(Playhead::at_time), &bounds);
        }
        self.notify_subscribers();
    }

    /// End the session. Later navigation calls are no-ops.
    pub fn close(&self) {
        {
            let mut session = self.state.lock();
            session.incarnation += 1;
            let bounds = self.tracker.boundaries_for(&session.topic);
            session.navigation.close(&bounds);
            debug!("Navigation session on '{}' closed", session.topic);
        }
        self.notify_subscribers();
    }

    /// Re-derive availability after the boundaries changed
    pub fn refresh(&self) {
        let changed = {
            let mut session = self.state.lock();
            let before = session.navigation.clone();
            session.refresh(&self.tracker);
            session.navigation != before
        };
        if changed {
            self.notify_subscribers();
        }
    }

    /// Ask the source where the topic starts and ends and record the answer.
    ///
    /// Sessions on a tracker that has never seen the topic cannot navigate
    /// until something observes its boundaries.
    pub async fn discover_boundaries(&self) -> Result<TopicBoundaries, NavigationError> {
        let topic = self.topic();
        let discovered = match self.source.discover_boundaries(&topic).await {
            Ok(discovered) => discovered,
            Err(source) => {
                warn!("Error discovering boundaries of '{}': {}", topic, source);
                return Err(NavigationError::Discovery { topic, source });
            }
        };

        self.tracker.observe_boundaries(&topic, discovered);
        debug!(
            "Discovered boundaries of '{}': {:?} to {:?}",
            topic, discovered.first, discovered.last
        );
        self.refresh();
        Ok(self.tracker.boundaries_for(&topic))
    }

    /// Current state, with flags derived from the latest boundaries
    pub fn state(&self) -> NavigationState {
        let mut session = self.state.lock();
        session.refresh(&self.tracker);
        session.navigation.clone()
    }

    pub fn is_navigating(&self) -> bool {
        self.state().is_navigating()
    }

    pub fn can_navigate_next(&self) -> bool {
        self.state().can_navigate_next()
    }

    pub fn can_navigate_previous(&self) -> bool {
        self.state().can_navigate_previous()
    }

    pub fn current_time(&self) -> Option<Time> {
        self.state().current_time()
    }

    pub fn topic(&self) -> String {
        self.state.lock().topic.clone()
    }

    pub fn incarnation(&self) -> u64 {
        self.state.lock().incarnation
    }

    pub fn session_id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Get current navigation context
    pub fn context(&self) -> NavigationContext {
        let mut session = self.state.lock();
        session.refresh(&self.tracker);
        NavigationContext {
            session_id: self.id,
            incarnation: session.incarnation,
            topic: session.topic.clone(),
            current_time: session.navigation.current_time(),
            is_navigating: session.navigation.is_navigating(),
            can_navigate_next: session.navigation.can_navigate_next(),
            can_navigate_previous: session.navigation.can_navigate_previous(),
        }
    }

    /// Add a subscriber
    pub fn add_subscriber(&self, subscriber: Arc<dyn NavigationSubscriber>) {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::downgrade(&subscriber));
    }

    /// Notify all subscribers of navigation change
    fn notify_subscribers(&self) {
        let context = self.context();
        let live: Vec<Arc<dyn NavigationSubscriber>> = {
            let mut subscribers = self.subscribers.write();

            // Remove any dead weak references
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        for subscriber in live {
            subscriber.on_navigation_change(&context);
        }
    }
}

/// Guard for a request waiting on the source
struct InFlight<'a> {
    navigator: &'a TopicNavigator,
    incarnation: u64,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let restored = {
            let mut session = self.navigator.state.lock();
            if session.incarnation == self.incarnation && session.navigation.is_navigating() {
                let bounds = self.navigator.tracker.boundaries_for(&session.topic);
                session.navigation.finish_unchanged(&bounds);
                true
            } else {
                false
            }
        };
        if restored {
            debug!("Navigation request cancelled before the source answered");
            self.navigator.notify_subscribers();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::navigation::{Message, MessageCursor};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    const TOPIC: &str = "/ultrasonic";

    /// Source answering from a fixed, cursor-ordered message list
    struct ScriptedSource {
        messages: Vec<Message>,
    }

    impl ScriptedSource {
        fn new(topic: &str, times: &[Time]) -> Self {
            let mut messages: Vec<Message> = times
                .iter()
                .enumerate()
                .map(|(seq, time)| Message::new(topic, MessageCursor::new(*time, seq as u64)))
                .collect();
            messages.sort_by_key(|message| message.cursor);
            Self { messages }
        }
    }

    #[async_trait]
    impl MessageSource for ScriptedSource {
        async fn resolve_after(
            &self,
            topic: &str,
            after: Option<MessageCursor>,
        ) -> Result<Option<Message>, SourceError> {
            Ok(self
                .messages
                .iter()
                .filter(|m| m.topic == topic)
                .find(|m| after.map_or(true, |a| m.cursor > a))
                .cloned())
        }

        async fn resolve_before(
            &self,
            topic: &str,
            before: Option<MessageCursor>,
        ) -> Result<Option<Message>, SourceError> {
            Ok(self
                .messages
                .iter()
                .rev()
                .filter(|m| m.topic == topic)
                .find(|m| before.map_or(true, |b| m.cursor < b))
                .cloned())
        }

        async fn discover_boundaries(&self, topic: &str) -> Result<TopicBoundaries, SourceError> {
            let mut bounds = TopicBoundaries::default();
            for message in self.messages.iter().filter(|m| m.topic == topic) {
                bounds.observe(message.time());
            }
            Ok(bounds)
        }
    }

    /// Holds every request until the gate is opened once per request
    struct GatedSource {
        inner: ScriptedSource,
        gate: Arc<Notify>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MessageSource for GatedSource {
        async fn resolve_after(
            &self,
            topic: &str,
            after: Option<MessageCursor>,
        ) -> Result<Option<Message>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.inner.resolve_after(topic, after).await
        }

        async fn resolve_before(
            &self,
            topic: &str,
            before: Option<MessageCursor>,
        ) -> Result<Option<Message>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.inner.resolve_before(topic, before).await
        }
    }

    struct FailingSource;

    #[async_trait]
    impl MessageSource for FailingSource {
        async fn resolve_after(
            &self,
            _: &str,
            _: Option<MessageCursor>,
        ) -> Result<Option<Message>, SourceError> {
            Err(SourceError::Unavailable("disk detached".to_string()))
        }

        async fn resolve_before(
            &self,
            _: &str,
            _: Option<MessageCursor>,
        ) -> Result<Option<Message>, SourceError> {
            Err(SourceError::Unavailable("disk detached".to_string()))
        }

        async fn discover_boundaries(&self, _: &str) -> Result<TopicBoundaries, SourceError> {
            Err(SourceError::Unavailable("disk detached".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingSubscriber {
        seen: Mutex<Vec<NavigationContext>>,
    }

    impl NavigationSubscriber for RecordingSubscriber {
        fn on_navigation_change(&self, context: &NavigationContext) {
            self.seen.lock().push(context.clone());
        }
    }

    fn secs(values: &[u32]) -> Vec<Time> {
        values.iter().map(|s| Time::new(*s, 0)).collect()
    }

    fn tracker_with(times: &[Time]) -> BoundaryTracker {
        let tracker = BoundaryTracker::new();
        for time in times {
            tracker.observe(TOPIC, *time);
        }
        tracker
    }

    fn navigator(times: &[Time], config: NavigatorConfig) -> TopicNavigator {
        let source = Arc::new(ScriptedSource::new(TOPIC, times));
        TopicNavigator::new(config, source, tracker_with(times))
    }

    #[tokio::test]
    async fn test_absent_boundaries_make_navigation_a_no_op() {
        let source = Arc::new(GatedSource {
            inner: ScriptedSource::new(TOPIC, &secs(&[1, 2])),
            gate: Arc::new(Notify::new()),
            calls: AtomicUsize::new(0),
        });
        let nav = TopicNavigator::new(
            NavigatorConfig::for_topic(TOPIC),
            source.clone(),
            BoundaryTracker::new(),
        );

        assert!(!nav.can_navigate_next());
        assert!(!nav.can_navigate_previous());
        assert_eq!(nav.handle_next_message().await.unwrap(), NavigationOutcome::Skipped);
        assert_eq!(nav.handle_previous_message().await.unwrap(), NavigationOutcome::Skipped);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(nav.current_time(), None);
    }

    #[tokio::test]
    async fn test_discovery_opens_navigation_on_fresh_tracker() {
        let tracker = BoundaryTracker::new();
        let nav = TopicNavigator::new(
            NavigatorConfig::for_topic(TOPIC),
            Arc::new(ScriptedSource::new(TOPIC, &secs(&[1, 2]))),
            tracker.clone(),
        );
        assert_eq!(nav.handle_next_message().await.unwrap(), NavigationOutcome::Skipped);

        let bounds = nav.discover_boundaries().await.unwrap();
        assert_eq!(bounds, TopicBoundaries::spanning(Time::new(1, 0), Time::new(2, 0)));
        assert_eq!(tracker.boundaries_for(TOPIC), bounds);
        assert!(nav.can_navigate_next());
        assert!(nav.can_navigate_previous());

        let outcome = nav.handle_next_message().await.unwrap();
        assert_eq!(outcome.moved_to().map(|c| c.time), Some(Time::new(1, 0)));
    }

    #[tokio::test]
    async fn test_discovery_failure_leaves_tracker_untouched() {
        let tracker = BoundaryTracker::new();
        let nav = TopicNavigator::new(
            NavigatorConfig::for_topic(TOPIC),
            Arc::new(FailingSource),
            tracker.clone(),
        );

        let err = nav.discover_boundaries().await.unwrap_err();
        assert!(matches!(err, NavigationError::Discovery { .. }));
        assert!(tracker.boundaries_for(TOPIC).is_empty());
        assert!(!nav.can_navigate_next());
    }

    #[tokio::test]
    async fn test_first_next_lands_on_first_boundary() {
        let nav = navigator(&secs(&[0, 5, 10]), NavigatorConfig::for_topic(TOPIC));
        assert!(nav.can_navigate_next());

        let outcome = nav.handle_next_message().await.unwrap();
        assert_eq!(outcome.moved_to().map(|c| c.time), Some(Time::new(0, 0)));
        assert_eq!(nav.current_time(), Some(Time::new(0, 0)));
        assert!(!nav.can_navigate_previous());
        assert!(nav.can_navigate_next());
        assert!(!nav.is_navigating());
    }

    #[tokio::test]
    async fn test_first_previous_lands_on_last_message() {
        let nav = navigator(&secs(&[0, 5, 10]), NavigatorConfig::for_topic(TOPIC));

        nav.handle_previous_message().await.unwrap();
        assert_eq!(nav.current_time(), Some(Time::new(10, 0)));
        assert!(!nav.can_navigate_next());
        assert!(nav.can_navigate_previous());
    }

    #[tokio::test]
    async fn test_next_is_a_no_op_at_last_boundary() {
        let config = NavigatorConfig::for_topic(TOPIC).with_start_time(Time::new(10, 0));
        let nav = navigator(&secs(&[0, 5, 10]), config);

        assert!(!nav.can_navigate_next());
        let before = nav.state();
        assert_eq!(nav.handle_next_message().await.unwrap(), NavigationOutcome::Skipped);
        assert_eq!(nav.state(), before);
    }

    #[tokio::test]
    async fn test_next_visits_every_message_once_in_order() {
        let times = secs(&[1, 2, 3, 4, 5]);
        let nav = navigator(&times, NavigatorConfig::for_topic(TOPIC));

        let mut visited = Vec::new();
        while let NavigationOutcome::Moved(cursor) = nav.handle_next_message().await.unwrap() {
            visited.push(cursor.time);
        }

        assert_eq!(visited, times);
        assert!(!nav.can_navigate_next());
        assert_eq!(nav.handle_next_message().await.unwrap(), NavigationOutcome::Skipped);
        assert_eq!(nav.current_time(), Some(Time::new(5, 0)));
    }

    #[tokio::test]
    async fn test_next_then_previous_round_trips() {
        let config = NavigatorConfig::for_topic(TOPIC).with_start_time(Time::new(2, 0));
        let nav = navigator(&secs(&[1, 2, 3, 4]), config);

        nav.handle_next_message().await.unwrap();
        assert_eq!(nav.current_time(), Some(Time::new(3, 0)));
        nav.handle_previous_message().await.unwrap();
        assert_eq!(nav.current_time(), Some(Time::new(2, 0)));
        nav.handle_next_message().await.unwrap();
        nav.handle_previous_message().await.unwrap();
        assert_eq!(nav.current_time(), Some(Time::new(2, 0)));
    }

    #[tokio::test]
    async fn test_duplicate_timestamps_are_traversed_in_arrival_order() {
        let times = secs(&[1, 2, 2, 2, 3]);
        let nav = navigator(&times, NavigatorConfig::for_topic(TOPIC));

        let mut visited = Vec::new();
        while let NavigationOutcome::Moved(cursor) = nav.handle_next_message().await.unwrap() {
            visited.push((cursor.time.sec, cursor.sequence));
        }
        assert_eq!(visited, vec![(1, 0), (2, 1), (2, 2), (2, 3), (3, 4)]);

        let mut back = Vec::new();
        while let NavigationOutcome::Moved(cursor) = nav.handle_previous_message().await.unwrap() {
            back.push(cursor.sequence);
        }
        assert_eq!(back, vec![3, 2, 1, 0]);
    }

    #[tokio::test]
    async fn test_stale_boundary_exhausts_until_boundaries_widen() {
        let source = Arc::new(ScriptedSource::new(TOPIC, &secs(&[1, 5])));
        let tracker = tracker_with(&secs(&[1, 10]));
        let config = NavigatorConfig::for_topic(TOPIC).with_start_time(Time::new(5, 0));
        let nav = TopicNavigator::new(config, source, tracker.clone());

        assert!(nav.can_navigate_next());
        assert_eq!(nav.handle_next_message().await.unwrap(), NavigationOutcome::Exhausted);
        assert_eq!(nav.current_time(), Some(Time::new(5, 0)));
        assert!(!nav.can_navigate_next());
        assert!(!nav.is_navigating());
        assert_eq!(nav.handle_next_message().await.unwrap(), NavigationOutcome::Skipped);

        tracker.observe(TOPIC, Time::new(11, 0));
        nav.refresh();
        assert!(nav.can_navigate_next());
    }

    #[tokio::test]
    async fn test_retry_after_exhaustion_keeps_direction_open() {
        let source = Arc::new(ScriptedSource::new(TOPIC, &secs(&[1, 5])));
        let mut config = NavigatorConfig::for_topic(TOPIC).with_start_time(Time::new(5, 0));
        config.retry_after_exhaustion = true;
        let nav = TopicNavigator::new(config, source, tracker_with(&secs(&[1, 10])));

        assert_eq!(nav.handle_next_message().await.unwrap(), NavigationOutcome::Exhausted);
        assert!(nav.can_navigate_next());
    }

    #[tokio::test]
    async fn test_source_failure_propagates_and_restores_idle() {
        let config = NavigatorConfig::for_topic(TOPIC).with_start_time(Time::new(3, 0));
        let nav =
            TopicNavigator::new(config, Arc::new(FailingSource), tracker_with(&secs(&[0, 10])));

        let err = nav.handle_next_message().await.unwrap_err();
        assert!(matches!(
            err,
            NavigationError::Source {
                direction: Direction::Next,
                source: SourceError::Unavailable(_),
                ..
            }
        ));
        assert!(!nav.is_navigating());
        assert_eq!(nav.current_time(), Some(Time::new(3, 0)));
        assert!(nav.can_navigate_next());
    }

    #[tokio::test]
    async fn test_overlapping_request_is_rejected() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(GatedSource {
            inner: ScriptedSource::new(TOPIC, &secs(&[1, 2, 3])),
            gate: gate.clone(),
            calls: AtomicUsize::new(0),
        });
        let nav = TopicNavigator::new(
            NavigatorConfig::for_topic(TOPIC),
            source.clone(),
            tracker_with(&secs(&[1, 2, 3])),
        );

        let (first, second) = tokio::join!(nav.handle_next_message(), async {
            assert!(nav.is_navigating());
            assert!(!nav.can_navigate_next());
            assert!(!nav.can_navigate_previous());
            let second = nav.handle_previous_message().await;
            gate.notify_one();
            second
        });

        assert_eq!(first.unwrap().moved_to().map(|c| c.time), Some(Time::new(1, 0)));
        assert_eq!(second.unwrap(), NavigationOutcome::Skipped);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(!nav.is_navigating());
    }

    #[tokio::test]
    async fn test_result_after_reset_is_discarded() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(GatedSource {
            inner: ScriptedSource::new(TOPIC, &secs(&[1, 2, 3])),
            gate: gate.clone(),
            calls: AtomicUsize::new(0),
        });
        let tracker = tracker_with(&secs(&[1, 2, 3]));
        tracker.observe("/gnss", Time::new(7, 0));
        let nav = TopicNavigator::new(NavigatorConfig::for_topic(TOPIC), source, tracker);

        let (outcome, _) = tokio::join!(nav.handle_next_message(), async {
            nav.reset(Some("/gnss".to_string()));
            gate.notify_one();
        });

        assert_eq!(outcome.unwrap(), NavigationOutcome::Superseded);
        assert_eq!(nav.topic(), "/gnss");
        assert_eq!(nav.incarnation(), 1);
        assert_eq!(nav.current_time(), None);
        assert!(!nav.is_navigating());
        assert!(nav.can_navigate_next());
    }

    #[tokio::test]
    async fn test_seek_supersedes_in_flight_request() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(GatedSource {
            inner: ScriptedSource::new(TOPIC, &secs(&[1, 2, 3])),
            gate: gate.clone(),
            calls: AtomicUsize::new(0),
        });
        let nav = TopicNavigator::new(
            NavigatorConfig::for_topic(TOPIC),
            source,
            tracker_with(&secs(&[1, 2, 3])),
        );

        let (outcome, _) = tokio::join!(nav.handle_next_message(), async {
            nav.seek_to(Some(Time::new(2, 0)));
            gate.notify_one();
        });

        assert_eq!(outcome.unwrap(), NavigationOutcome::Superseded);
        assert_eq!(nav.current_time(), Some(Time::new(2, 0)));
        assert!(nav.can_navigate_next());
        assert!(nav.can_navigate_previous());
    }

    #[tokio::test]
    async fn test_dropped_request_returns_to_idle() {
        let source = Arc::new(GatedSource {
            inner: ScriptedSource::new(TOPIC, &secs(&[1, 2])),
            gate: Arc::new(Notify::new()),
            calls: AtomicUsize::new(0),
        });
        let nav = TopicNavigator::new(
            NavigatorConfig::for_topic(TOPIC),
            source,
            tracker_with(&secs(&[1, 2])),
        );

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), nav.handle_next_message()).await;
        assert!(timed_out.is_err());
        assert!(!nav.is_navigating());
        assert!(nav.can_navigate_next());
        assert_eq!(nav.current_time(), None);
    }

    #[tokio::test]
    async fn test_closed_session_ignores_navigation() {
        let nav = navigator(&secs(&[1, 2]), NavigatorConfig::for_topic(TOPIC));
        nav.close();
        assert!(!nav.can_navigate_next());
        assert!(!nav.can_navigate_previous());
        assert_eq!(nav.handle_next_message().await.unwrap(), NavigationOutcome::Skipped);
        assert_eq!(nav.current_time(), None);

        nav.refresh();
        nav.reset(None);
        let context = nav.context();
        assert!(!context.can_navigate_next);
        assert!(!context.can_navigate_previous);
        assert_eq!(nav.handle_previous_message().await.unwrap(), NavigationOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_subscribers_see_every_transition() {
        let nav = navigator(&secs(&[1, 2]), NavigatorConfig::for_topic(TOPIC));
        let subscriber = Arc::new(RecordingSubscriber::default());
        nav.add_subscriber(subscriber.clone());

        nav.handle_next_message().await.unwrap();

        let seen = subscriber.seen.lock().clone();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_navigating);
        assert!(!seen[0].can_navigate_next && !seen[0].can_navigate_previous);
        assert!(!seen[1].is_navigating);
        assert_eq!(seen[1].current_time, Some(Time::new(1, 0)));
        assert_eq!(seen[1].session_id, nav.session_id());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let nav = navigator(&secs(&[1, 2]), NavigatorConfig::for_topic(TOPIC));
        let subscriber = Arc::new(RecordingSubscriber::default());
        nav.add_subscriber(subscriber.clone());
        drop(subscriber);

        nav.handle_next_message().await.unwrap();
        assert!(nav.subscribers.read().is_empty());
    }

    #[tokio::test]
    async fn test_resolved_messages_widen_shared_boundaries() {
        let tracker = BoundaryTracker::new();
        tracker.observe(TOPIC, Time::new(1, 0));
        let source = Arc::new(ScriptedSource::new(TOPIC, &secs(&[1, 4])));
        let nav = TopicNavigator::new(NavigatorConfig::for_topic(TOPIC), source, tracker.clone());

        nav.handle_previous_message().await.unwrap();
        assert_eq!(nav.current_time(), Some(Time::new(4, 0)));
        assert_eq!(tracker.boundaries_for(TOPIC).last, Some(Time::new(4, 0)));
    }

    #[tokio::test]
    async fn test_independent_sessions_navigate_concurrently() {
        let tracker = BoundaryTracker::new();
        for time in secs(&[1, 2]) {
            tracker.observe("/a", time);
            tracker.observe("/b", time);
        }
        let mut times = ScriptedSource::new("/a", &secs(&[1, 2])).messages;
        times.extend(ScriptedSource::new("/b", &secs(&[1, 2])).messages);
        times.sort_by_key(|message| message.cursor);
        let source: Arc<dyn MessageSource> = Arc::new(ScriptedSource { messages: times });

        let a = TopicNavigator::new(
            NavigatorConfig::for_topic("/a"),
            source.clone(),
            tracker.clone(),
        );
        let b = TopicNavigator::new(NavigatorConfig::for_topic("/b"), source, tracker);

        let (ra, rb) = tokio::join!(a.handle_next_message(), b.handle_previous_message());
        assert_eq!(ra.unwrap().moved_to().map(|c| c.time), Some(Time::new(1, 0)));
        assert_eq!(rb.unwrap().moved_to().map(|c| c.time), Some(Time::new(2, 0)));
    }
}
