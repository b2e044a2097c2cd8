use core::fmt::Debug;

use crate::error::Error;
use crate::feed::Feed;
use crate::payload::Payload;

/// An MQTT client able to publish a message on a topic.
pub trait Publish {
    type Error: Debug;

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;
}

#[derive(Debug, PartialEq, Eq)]
pub enum PublishError<E> {
    Client(E),
    Encode(Error),
}

/// Publishes on one feed through a borrowed client.
pub struct FeedPublisher<'c, 'f, C> {
    client: &'c mut C,
    feed: &'f Feed,
}

impl<'c, 'f, C> FeedPublisher<'c, 'f, C>
where
    C: Publish,
{
    pub fn new(client: &'c mut C, feed: &'f Feed) -> Self {
        Self { client, feed }
    }

    pub fn feed(&self) -> &Feed {
        self.feed
    }

    pub async fn publish(&mut self, payload: &[u8]) -> Result<(), PublishError<C::Error>> {
        log::debug!(
            "Publishing {} bytes to feed {} on {}",
            payload.len(),
            self.feed.name(),
            self.feed.topic()
        );

        self.client
            .publish(self.feed.topic().as_str(), payload)
            .await
            .map_err(|e| {
                log::error!("Failed to publish to feed {}: {:?}", self.feed.name(), e);
                PublishError::Client(e)
            })
    }

    pub async fn publish_payload(
        &mut self,
        payload: &Payload<'_>,
    ) -> Result<(), PublishError<C::Error>> {
        let encoded = payload.encode().map_err(PublishError::Encode)?;
        self.publish(encoded.as_bytes()).await
    }
}

#[cfg(test)]
mod test {
    use embassy_futures::block_on;
    use std::{string::String, vec::Vec};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        sent: Vec<(String, Vec<u8>)>,
        fail: bool,
    }

    #[derive(Debug, PartialEq)]
    struct Refused;

    impl Publish for Recorder {
        type Error = Refused;

        async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error> {
            if self.fail {
                return Err(Refused);
            }
            self.sent.push((topic.into(), payload.into()));
            Ok(())
        }
    }

    #[test]
    fn publish_on_feed_topic() {
        let feed = Feed::new("Pond_Sensor", "12345").unwrap();
        let mut client = Recorder::default();

        let mut publisher = FeedPublisher::new(&mut client, &feed);
        assert_eq!(publisher.feed().name(), "Pond_Sensor");
        block_on(publisher.publish(b"field1=1.00")).unwrap();

        assert_eq!(
            client.sent,
            [(String::from("channels/12345/publish"), b"field1=1.00".to_vec())]
        );
    }

    #[test]
    fn publish_payload() {
        let feed = Feed::new("Pond_Sensor", "12345").unwrap();
        let mut client = Recorder::default();

        let mut payload = Payload::new().with_status("MQTTPUBLISH");
        payload.set_field(1, 19.5).unwrap();

        block_on(FeedPublisher::new(&mut client, &feed).publish_payload(&payload)).unwrap();

        assert_eq!(client.sent.len(), 1);
        assert_eq!(client.sent[0].1, b"field1=19.50&status=MQTTPUBLISH");
    }

    #[test]
    fn client_error_is_wrapped() {
        let feed = Feed::new("Pond_Sensor", "12345").unwrap();
        let mut client = Recorder {
            fail: true,
            ..Default::default()
        };

        let result = block_on(FeedPublisher::new(&mut client, &feed).publish(b"x"));
        assert_eq!(result, Err(PublishError::Client(Refused)));
    }

    #[test]
    fn encode_error_does_not_publish() {
        let feed = Feed::new("Pond_Sensor", "12345").unwrap();
        let mut client = Recorder::default();

        let status = " ".repeat(crate::PAYLOAD_CAPACITY);
        let payload = Payload::new().with_status(&status);

        let result = block_on(FeedPublisher::new(&mut client, &feed).publish_payload(&payload));
        assert_eq!(result, Err(PublishError::Encode(Error::PayloadTooLong)));
        assert!(client.sent.is_empty());
    }

    #[test]
    fn two_feeds_share_a_client() {
        let mut feeds = crate::Feeds::<2>::new();
        feeds.add("Pond_Sensor", "1").unwrap();
        feeds.add("Pump", "2").unwrap();
        let mut client = Recorder::default();

        for feed in feeds.iter() {
            block_on(FeedPublisher::new(&mut client, feed).publish(feed.name().as_bytes()))
                .unwrap();
        }

        let topics: Vec<_> = client.sent.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(topics, ["channels/1/publish", "channels/2/publish"]);
    }
}
