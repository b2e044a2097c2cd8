/// Shortest channel update interval ThingSpeak accepts on free accounts
pub const MIN_UPDATE_INTERVAL_SECS: u16 = 15;

/// Clamps the configured update interval to what ThingSpeak accepts.
/// Faster updates are rejected by the broker.
pub fn update_interval_secs(configured: u16) -> u16 {
    if configured < MIN_UPDATE_INTERVAL_SECS {
        log::warn!(
            "Update interval {}s is below the ThingSpeak minimum, using {}s",
            configured,
            MIN_UPDATE_INTERVAL_SECS
        );
    }
    configured.max(MIN_UPDATE_INTERVAL_SECS)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clamps_short_intervals() {
        assert_eq!(update_interval_secs(0), 15);
        assert_eq!(update_interval_secs(14), 15);
    }

    #[test]
    fn keeps_longer_intervals() {
        assert_eq!(update_interval_secs(15), 15);
        assert_eq!(update_interval_secs(300), 300);
    }
}
