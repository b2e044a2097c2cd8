//! ThingSpeak MQTT feed bindings.
//!
//! A [`Feed`] binds a sensor feed name to a ThingSpeak channel publish topic
//! (`channels/<CHANNEL_ID>/publish`). Feeds are collected in a [`Feeds`]
//! registry built once at startup and handed to whatever publishes readings.
//! A [`FeedPublisher`] borrows an MQTT client and a feed and forwards payloads
//! to the client on the feed's topic.
//!
//! With the default `mqtt` feature, [`MqttSession`] is a [`Publish`] client
//! for ThingSpeak's MQTT 3.1.1 broker over any `embedded-io-async` stream.

#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

mod error;
mod feed;
mod interval;
#[cfg(feature = "mqtt")]
mod mqtt;
mod payload;
mod publish;
mod registry;
mod topic;

pub use error::Error;
pub use feed::Feed;
pub use interval::{update_interval_secs, MIN_UPDATE_INTERVAL_SECS};
#[cfg(feature = "mqtt")]
pub use mqtt::{ConnectOptions, MqttError, MqttSession};
pub use payload::{FieldMap, Payload, FIELD_COUNT, PAYLOAD_CAPACITY};
pub use publish::{FeedPublisher, Publish, PublishError};
pub use registry::Feeds;
pub use topic::{Topic, PUBLISH_SUFFIX, TOPIC_CAPACITY, TOPIC_PREFIX};

#[doc(hidden)]
pub mod __private {
    pub use const_format::concatcp;
}
