//! The fixed response policy of the player endpoint.
//!
//! Pure decision logic: given what the cache holds and whether this request
//! may trigger a refresh, say whether to enqueue and what to answer. The
//! handler performs the side effects.

use playercache_db::Lookup;

/// What the cache holds for the requested player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Fresh,
    Stale,
    Missing,
}

impl CacheState {
    pub fn of(lookup: &Lookup) -> Self {
        match (&lookup.payload, lookup.stale) {
            (None, _) => CacheState::Missing,
            (Some(_), true) => CacheState::Stale,
            (Some(_), false) => CacheState::Fresh,
        }
    }
}

/// The response to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    /// 200 with the stored payload.
    Cached,
    /// 202 "Waiting for data".
    WaitingForData,
    /// 403 "No API key configured".
    NotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub enqueue: bool,
    pub answer: Answer,
}

/// `refresh_permitted` is false when no upstream credential is configured or
/// the client's protocol version is below the configured minimum.
pub fn decide(state: CacheState, refresh_permitted: bool) -> Decision {
    match (state, refresh_permitted) {
        (CacheState::Fresh, _) => Decision {
            enqueue: false,
            answer: Answer::Cached,
        },
        (CacheState::Stale, permitted) => Decision {
            enqueue: permitted,
            answer: Answer::Cached,
        },
        (CacheState::Missing, true) => Decision {
            enqueue: true,
            answer: Answer::WaitingForData,
        },
        (CacheState::Missing, false) => Decision {
            enqueue: false,
            answer: Answer::NotConfigured,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_state_from_lookup() {
        let lookup = |payload: Option<&[u8]>, stale| Lookup {
            payload: payload.map(<[u8]>::to_vec),
            stale,
        };
        assert_eq!(CacheState::of(&lookup(None, true)), CacheState::Missing);
        assert_eq!(CacheState::of(&lookup(Some(b"{}"), true)), CacheState::Stale);
        assert_eq!(CacheState::of(&lookup(Some(b"{}"), false)), CacheState::Fresh);
    }

    #[test]
    fn decision_table() {
        use Answer::*;
        use CacheState::*;

        let table = [
            (Fresh, true, false, Cached),
            (Fresh, false, false, Cached),
            (Stale, true, true, Cached),
            (Stale, false, false, Cached),
            (Missing, true, true, WaitingForData),
            (Missing, false, false, NotConfigured),
        ];

        for (state, permitted, enqueue, answer) in table {
            assert_eq!(
                decide(state, permitted),
                Decision { enqueue, answer },
                "state={state:?} permitted={permitted}"
            );
        }
    }
}
