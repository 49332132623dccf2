use crate::atomic::{AtomicU32, Ordering};

const IS_CONNECTED: u32 = 1 << 0;
const IS_FAILED_UNSUBSCRIBE: u32 = 1 << 31;

#[derive(Debug)]
pub(crate) struct RawQuickInfo(AtomicU32);

/// Client status flags
///
/// Obtained from [`Client::quick_info`].
///
/// [`Client::quick_info`]: crate::Client::quick_info
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QuickInfo {
    pub(crate) is_connected: bool,
    pub(crate) is_failed_unsubscribe: bool,
}

impl RawQuickInfo {
    pub(crate) fn new() -> Self {
        Self(AtomicU32::new(
            QuickInfo {
                is_connected: true,
                is_failed_unsubscribe: false,
            }
            .encode(),
        ))
    }

    pub(crate) fn get(&self) -> QuickInfo {
        QuickInfo::decode(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store_is_connected(&self, val: bool) {
        self.store_bit(IS_CONNECTED, val);
    }

    pub(crate) fn store_is_failed_unsubscribe(&self, val: bool) {
        self.store_bit(IS_FAILED_UNSUBSCRIBE, val);
    }

    #[expect(
        clippy::inline_always,
        reason = "we want this to be inlined inside the store_* functions"
    )]
    #[inline(always)]
    fn store_bit(&self, mask: u32, val: bool) {
        debug_assert_eq!(mask.count_ones(), 1);

        if val {
            self.0.fetch_or(mask, Ordering::AcqRel);
        } else {
            self.0.fetch_and(!mask, Ordering::AcqRel);
        }
    }
}

impl QuickInfo {
    /// Returns `true` while the transport reports the connection alive
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// Returns `true` if a dropped subscription couldn't enqueue its
    /// unsubscribe command
    ///
    /// The transport clears the flag once it has swept the subscription
    /// table for dead entries.
    #[must_use]
    pub fn is_failed_unsubscribe(&self) -> bool {
        self.is_failed_unsubscribe
    }

    fn encode(self) -> u32 {
        let mut val = 0;

        if self.is_connected {
            val |= IS_CONNECTED;
        }

        if self.is_failed_unsubscribe {
            val |= IS_FAILED_UNSUBSCRIBE;
        }

        val
    }

    fn decode(val: u32) -> Self {
        Self {
            is_connected: (val & IS_CONNECTED) != 0,
            is_failed_unsubscribe: (val & IS_FAILED_UNSUBSCRIBE) != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{QuickInfo, RawQuickInfo};

    #[test]
    fn set_get() {
        let quick_info = RawQuickInfo::new();
        let mut expected = QuickInfo {
            is_connected: true,
            is_failed_unsubscribe: false,
        };
        assert_eq!(expected, quick_info.get());

        for is_connected in [false, true] {
            quick_info.store_is_connected(is_connected);
            expected.is_connected = is_connected;

            for is_failed_unsubscribe in [false, true] {
                quick_info.store_is_failed_unsubscribe(is_failed_unsubscribe);
                expected.is_failed_unsubscribe = is_failed_unsubscribe;

                assert_eq!(expected, quick_info.get());
            }
        }
    }
}
