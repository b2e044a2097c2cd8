use core::fmt::{self, Write};

use heapless::String;

use crate::error::Error;
use crate::payload::FIELD_COUNT;

/// Maximum topic length in bytes
pub const TOPIC_CAPACITY: usize = 64;

pub const TOPIC_PREFIX: &str = "channels/";
pub const PUBLISH_SUFFIX: &str = "/publish";

const FIELD_SUFFIX: &str = "/fields/field";

/// Builds a channel feed publish topic at compile time.
///
/// Accepts a string literal or a `&'static str` constant:
///
/// ```
/// const POND_CHANNEL_ID: &str = "12345";
/// const POND_TOPIC: &str = thingspeak_feeds::channel_publish_topic!(POND_CHANNEL_ID);
/// assert_eq!(POND_TOPIC, "channels/12345/publish");
/// ```
#[macro_export]
macro_rules! channel_publish_topic {
    ($channel_id:expr) => {
        $crate::__private::concatcp!($crate::TOPIC_PREFIX, $channel_id, $crate::PUBLISH_SUFFIX)
    };
}

/// An MQTT topic a ThingSpeak channel accepts publishes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic(String<TOPIC_CAPACITY>);

impl Topic {
    /// `channels/<channel_id>/publish`
    ///
    /// The channel ID is taken as-is. A malformed ID is only noticed by the
    /// broker when publishing.
    pub fn channel_feed(channel_id: &str) -> Result<Self, Error> {
        let mut topic = String::new();
        push(&mut topic, TOPIC_PREFIX)?;
        push(&mut topic, channel_id)?;
        push(&mut topic, PUBLISH_SUFFIX)?;
        Ok(Self(topic))
    }

    /// `channels/<channel_id>/publish/fields/field<field>`, for updating a
    /// single channel field.
    pub fn channel_field(channel_id: &str, field: u8) -> Result<Self, Error> {
        if field == 0 || field as usize > FIELD_COUNT {
            return Err(Error::InvalidField(field));
        }

        let mut topic = Self::channel_feed(channel_id)?.0;
        push(&mut topic, FIELD_SUFFIX)?;
        write!(topic, "{}", field).map_err(|_| Error::TopicTooLong)?;
        Ok(Self(topic))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn push(topic: &mut String<TOPIC_CAPACITY>, s: &str) -> Result<(), Error> {
    topic.push_str(s).map_err(|_| Error::TopicTooLong)
}

impl TryFrom<&str> for Topic {
    type Error = Error;

    fn try_from(topic: &str) -> Result<Self, Self::Error> {
        let mut inner = String::new();
        push(&mut inner, topic)?;
        Ok(Self(inner))
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Topic {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Topic {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
