//! Headless, typed, topic-based publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message without any single subscriber blocking
//! the others.  The bus stands in for the inter-process transport: the
//! facade publishes to it and an external bridge forwards the traffic.
//!
//! # Topics
//!
//! | Topic | Typical traffic |
//! |---|---|
//! | [`Topic::Rifts`] | One world-point set per camera frame |
//! | [`Topic::JointCommands`] | Per-joint scalar position commands |
//! | [`Topic::Locomotion`] | Walk velocity (twist) commands |
//! | [`Topic::SystemAlerts`] | Recovered faults, shutdown notices |

use riftwalk_types::Event;
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Enumeration of all routing topics on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// World-frame rift point sets, one message per camera frame.
    Rifts,
    /// Fire-and-forget joint position commands.
    JointCommands,
    /// Walk velocity commands for the gait engine.
    Locomotion,
    /// Recovered faults and lifecycle notices.
    SystemAlerts,
}

/// Shared event bus. Clone it cheaply – all clones share the same underlying
/// broadcast channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    rifts: broadcast::Sender<Event>,
    joint_commands: broadcast::Sender<Event>,
    locomotion: broadcast::Sender<Event>,
    system_alerts: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// The `capacity` is applied to every topic channel independently.
    pub fn new(capacity: usize) -> Self {
        let (rifts, _) = broadcast::channel(capacity);
        let (joint_commands, _) = broadcast::channel(capacity);
        let (locomotion, _) = broadcast::channel(capacity);
        let (system_alerts, _) = broadcast::channel(capacity);
        Self {
            rifts,
            joint_commands,
            locomotion,
            system_alerts,
        }
    }

    /// Publish `event` to the given [`Topic`] channel.
    ///
    /// Returns the number of active receivers that were handed the event.
    /// Publishing is fire-and-forget: when nobody is listening the event is
    /// discarded and `0` is returned.
    pub fn publish_to(&self, topic: Topic, event: Event) -> usize {
        match self.topic_sender(topic).send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(event)) => {
                trace!(?topic, source = %event.source, "no subscribers, event dropped");
                0
            }
        }
    }

    /// Subscribe to a specific [`Topic`] channel.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Rifts => &self.rifts,
            Topic::JointCommands => &self.joint_commands,
            Topic::Locomotion => &self.locomotion,
            Topic::SystemAlerts => &self.system_alerts,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// An async receiver bound to a single [`Topic`] channel.
///
/// Obtained via [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event on this topic.
    ///
    /// Returns:
    /// * `Ok(event)` – a successfully received event.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` messages were dropped.  The caller decides whether to
    ///   continue or abort.
    /// * `Err(broadcast::error::RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Wait for the next event, skipping over lag notifications.
    ///
    /// Returns `None` once the bus is closed.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(topic = ?self.topic, lagged_by = n, "TopicReceiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Return an already-delivered event without waiting.
    pub fn try_recv(&mut self) -> Result<Event, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// The [`Topic`] this receiver is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riftwalk_types::{EventPayload, Twist};

    fn make_event(source: &str) -> Event {
        Event::new(
            source,
            EventPayload::Velocity(Twist {
                linear_x: 0.1,
                linear_y: 0.0,
                angular_z: 0.2,
            }),
        )
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::default();
        assert_eq!(bus.publish_to(Topic::Locomotion, make_event("cmd_vel")), 0);
    }

    #[tokio::test]
    async fn topic_multiple_subscribers_receive_same_event() -> Result<(), Box<dyn std::error::Error>>
    {
        let bus = EventBus::default();
        let mut subscriber1 = bus.subscribe_to(Topic::Locomotion);
        let mut subscriber2 = bus.subscribe_to(Topic::Locomotion);

        let event = make_event("/phantomx/cmd_vel");
        assert_eq!(bus.publish_to(Topic::Locomotion, event.clone()), 2);

        let recv1 = subscriber1.recv().await?;
        let recv2 = subscriber2.recv().await?;

        assert_eq!(recv1.id, event.id, "subscriber 1 got wrong event");
        assert_eq!(recv2.id, event.id, "subscriber 2 got wrong event");
        assert_eq!(subscriber1.topic(), Topic::Locomotion);
        Ok(())
    }

    /// A subscriber on `SystemAlerts` must not receive events published to
    /// `Rifts` because they are routed through separate channels.
    #[tokio::test]
    async fn topic_subscriber_does_not_receive_other_topic_events() {
        let bus = EventBus::default();
        let mut alerts_sub = bus.subscribe_to(Topic::SystemAlerts);
        let _rifts_sub = bus.subscribe_to(Topic::Rifts);

        bus.publish_to(Topic::Rifts, make_event("/phantomx/rifts_coord"));

        let result =
            tokio::time::timeout(std::time::Duration::from_millis(50), alerts_sub.recv()).await;

        assert!(
            result.is_err(),
            "SystemAlerts subscriber must not receive a Rifts event"
        );
    }

    /// Flooding a low-capacity channel while a subscriber sleeps must produce
    /// a `Lagged` error rather than panicking or blocking.
    #[tokio::test]
    async fn topic_channel_lag_on_slow_subscriber() {
        const CAPACITY: usize = 64;
        let bus = EventBus::new(CAPACITY);
        let mut slow_sub = bus.subscribe_to(Topic::JointCommands);

        for _ in 0..1_000 {
            bus.publish_to(Topic::JointCommands, make_event("flood"));
        }

        let result = slow_sub.recv().await;
        assert!(
            matches!(result, Err(broadcast::error::RecvError::Lagged(_))),
            "expected Lagged error, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn next_skips_lag_notifications() {
        let bus = EventBus::new(4);
        let mut sub = bus.subscribe_to(Topic::Rifts);
        for _ in 0..10 {
            bus.publish_to(Topic::Rifts, make_event("flood"));
        }
        assert!(sub.next().await.is_some());
    }
}
