use heapless::Vec;

use crate::error::Error;
use crate::feed::Feed;

/// The set of feeds a device publishes to, in registration order.
///
/// Built once during startup and passed to the publishing component.
#[derive(Debug, Default)]
pub struct Feeds<const N: usize> {
    feeds: Vec<Feed, N>,
}

impl<const N: usize> Feeds<N> {
    pub fn new() -> Self {
        Self { feeds: Vec::new() }
    }

    /// Registers a feed publishing to `channels/<channel_id>/publish`.
    pub fn add(&mut self, name: &'static str, channel_id: &str) -> Result<&Feed, Error> {
        self.insert(Feed::new(name, channel_id)?)
    }

    pub fn insert(&mut self, feed: Feed) -> Result<&Feed, Error> {
        if self.get(feed.name()).is_some() {
            log::warn!("Feed {} is already registered", feed.name());
            return Err(Error::DuplicateFeed);
        }

        log::debug!("Registering feed {} on {}", feed.name(), feed.topic());
        match self.feeds.push(feed) {
            Ok(()) => Ok(&self.feeds[self.feeds.len() - 1]),
            Err(_) => Err(Error::RegistryFull),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Feed> {
        self.feeds.iter().find(|feed| feed.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feed> {
        self.feeds.iter()
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}
