use crate::error::Error;
use crate::topic::{Topic, PUBLISH_SUFFIX, TOPIC_PREFIX};

/// A named outbound feed bound to one ThingSpeak channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    name: &'static str,
    topic: Topic,
}

impl Feed {
    /// Binds `name` to `channels/<channel_id>/publish`.
    pub fn new(name: &'static str, channel_id: &str) -> Result<Self, Error> {
        Ok(Self {
            name,
            topic: Topic::channel_feed(channel_id)?,
        })
    }

    /// Binds `name` to an already built topic, e.g. one produced by
    /// `channel_publish_topic!`.
    ///
    /// Anything but `channels/<CHANNEL_ID>/publish` with a non-empty channel
    /// ID is rejected with `Error::InvalidTopic`.
    pub fn with_topic(name: &'static str, topic: &str) -> Result<Self, Error> {
        let channel_id = topic
            .strip_prefix(TOPIC_PREFIX)
            .and_then(|rest| rest.strip_suffix(PUBLISH_SUFFIX))
            .filter(|channel_id| !channel_id.is_empty())
            .ok_or(Error::InvalidTopic)?;

        Self::new(name, channel_id)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}
