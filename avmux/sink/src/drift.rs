/*!
    Drift accounting between interleaved streams.
*/

use avmux_types::{MediaDuration, Rational};

/**
    Tracks how far each stream has progressed relative to the slowest one.

    Every written frame adds its duration, in microseconds, to its stream's
    lead. Leads are renormalized after every update so the slowest stream
    always sits at zero. A stream whose lead exceeds the limit is not muxed
    until the others catch up.
*/
#[derive(Debug, Clone)]
pub struct DriftTracker {
    ahead: Vec<i64>,
    limit: i64,
}

impl DriftTracker {
    /**
        Create a tracker for `streams` streams with an unbounded limit.
    */
    pub fn new(streams: usize) -> Self {
        Self {
            ahead: vec![0; streams],
            limit: i64::MAX,
        }
    }

    /**
        Derive a drift limit from a container's maximum interleave delta.

        Both are in microseconds. The result is `delta * ratio`, rounded
        toward zero and clamped to the `i64` range.
    */
    pub fn limit_from(max_interleave_delta: i64, ratio: Rational) -> i64 {
        let scaled =
            i128::from(max_interleave_delta) * i128::from(ratio.num) / i128::from(ratio.den);
        scaled.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    pub fn set_limit(&mut self, limit: i64) {
        self.limit = limit;
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /**
        Lead of a stream over the slowest one, in microseconds.
    */
    pub fn ahead(&self, stream: usize) -> Option<i64> {
        self.ahead.get(stream).copied()
    }

    /**
        Returns true if the stream is too far ahead to accept more frames.
    */
    pub fn is_limited(&self, stream: usize) -> bool {
        self.ahead.get(stream).is_some_and(|&ahead| ahead > self.limit)
    }

    /**
        Account for a frame written to `stream`, then renormalize.

        Returns true if the stream is limited afterwards.
    */
    pub fn record(&mut self, stream: usize, duration: MediaDuration, time_base: Rational) -> bool {
        let micros = duration.rescale(time_base, Rational::MICROSECONDS).0;
        if let Some(ahead) = self.ahead.get_mut(stream) {
            *ahead = ahead.saturating_add(micros);
        }
        self.renormalize();
        self.is_limited(stream)
    }

    /**
        Subtract the smallest lead from every stream.
    */
    pub fn renormalize(&mut self) {
        let Some(&min) = self.ahead.iter().min() else {
            return;
        };
        if min == 0 {
            return;
        }
        for ahead in &mut self.ahead {
            *ahead -= min;
        }
    }
}
