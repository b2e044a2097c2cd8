#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// Topic does not fit in `TOPIC_CAPACITY` bytes
    TopicTooLong,
    /// Not a `channels/<CHANNEL_ID>/publish` topic
    InvalidTopic,
    /// Encoded payload does not fit in `PAYLOAD_CAPACITY` bytes
    PayloadTooLong,
    /// Channel fields are numbered 1 to 8
    InvalidField(u8),
    /// NaN or infinite value for a channel field
    NonFiniteValue(u8),
    DuplicateFeed,
    RegistryFull,
}
