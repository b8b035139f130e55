//! rosbridge-style JSON encoding of bus events.
//!
//! The transport itself lives outside this workspace.  A bridge process
//! subscribes to the [`EventBus`][crate::bus::EventBus] and forwards each
//! event as a rosbridge `publish` frame produced by [`to_publish_frame`]:
//!
//! ```text
//! { "op": "publish", "topic": "<event.source>", "msg": { ... } }
//! ```
//!
//! Rift clouds are encoded column-wise (`x`, `y`, `z` arrays) together with
//! an explicit `empty` flag so a frame without rifts is never mistaken for a
//! dropped message.

use riftwalk_types::{Event, EventPayload, WorldPointSet};
use serde_json::{Value, json};

/// Encode `event` as a rosbridge `publish` frame addressed to `event.source`.
pub fn to_publish_frame(event: &Event) -> Value {
    json!({
        "op": "publish",
        "topic": event.source,
        "msg": encode_payload(&event.payload),
    })
}

fn encode_payload(payload: &EventPayload) -> Value {
    match payload {
        EventPayload::Rifts { frame_stamp, cloud } => encode_cloud(frame_stamp.timestamp_millis(), cloud),
        // std_msgs/Float64
        EventPayload::JointCommand(cmd) => json!({ "data": cmd.angle_rad }),
        // geometry_msgs/Twist
        EventPayload::Velocity(twist) => json!({
            "linear":  { "x": twist.linear_x, "y": twist.linear_y, "z": 0.0 },
            "angular": { "x": 0.0, "y": 0.0, "z": twist.angular_z }
        }),
        // std_msgs/String
        EventPayload::Fault { component, message } => json!({
            "data": format!("{component}: {message}")
        }),
    }
}

fn encode_cloud(stamp_ms: i64, cloud: &WorldPointSet) -> Value {
    let points = cloud.points();
    json!({
        "stamp_ms": stamp_ms,
        "empty": cloud.is_empty(),
        "x": points.iter().map(|p| p.x).collect::<Vec<_>>(),
        "y": points.iter().map(|p| p.y).collect::<Vec<_>>(),
        "z": points.iter().map(|p| p.z).collect::<Vec<_>>(),
    })
}
