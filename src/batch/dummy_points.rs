use std::path::Path;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{model::Measurement, model::DEFAULT_DECIMALS, util::current_time_ns, InfluxResult};

use super::{dump_points, serialize_points, PointStream};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// How generated points are spread over series
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SeriesPolicy {
    /// All points belong to one series, timestamps advance by `delta_seconds` per point
    #[default]
    SingleSeries,

    /// Point `i` (starting at 1) goes to series `<name>_<i>`, all points share one timestamp.
    /// Simulates many sensors reporting once
    SeriesPerPoint,
}

/// Synthetic point generator for load tests.
///
/// Each point has the float fields `X` in `(-720, 0]`, `Y` in `[0, 720)` and `T` in `[0, 30)`
/// with nanosecond timestamps.
///
/// The start timestamp carries over between calls to [`generate`](`Self::generate`), so consecutive
/// calls never overlap in time. Give each worker its own generator.
#[derive(Debug, Clone)]
pub struct DummyPoints {
    name: String,
    npoints: u64,
    decimals: usize,
    delta_seconds: u64,
    policy: SeriesPolicy,
    next_start_ns: Option<i64>,
    rng: StdRng,
}

impl DummyPoints {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            npoints: 1,
            decimals: DEFAULT_DECIMALS,
            delta_seconds: 1,
            policy: SeriesPolicy::default(),
            next_start_ns: None,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Number of points produced by each call to `generate`
    pub fn npoints(mut self, npoints: u64) -> Self {
        self.npoints = npoints;
        self
    }

    /// Digits after the decimal point of the generated fields
    pub fn decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    /// Time between two sequential points of the single series policy
    pub fn delta_seconds(mut self, delta_seconds: u64) -> Self {
        self.delta_seconds = delta_seconds;
        self
    }

    pub fn policy(mut self, policy: SeriesPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Timestamp of the first generated point. Random in `[1e9, now]` if not set
    pub fn start_ns(mut self, start_ns: i64) -> Self {
        self.next_start_ns = Some(start_ns);
        self
    }

    /// Seed the field values and the random start timestamp, for reproducible output
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> u64 {
        self.npoints
    }

    pub fn is_empty(&self) -> bool {
        self.npoints == 0
    }

    /// Timestamp the next call to `generate` starts from, if already decided
    pub fn next_start_ns(&self) -> Option<i64> {
        self.next_start_ns
    }

    /// Produce the next `npoints` points as a single-pass stream
    pub fn generate(&mut self) -> PointStream {
        let delta_ns = (self.delta_seconds as i64).saturating_mul(NANOS_PER_SECOND);

        let start_ns = match self.next_start_ns {
            Some(ts) => ts,
            None => self.rng.random_range(NANOS_PER_SECOND..=current_time_ns().max(NANOS_PER_SECOND)),
        };

        let next_start_ns = match self.policy {
            SeriesPolicy::SingleSeries => start_ns.saturating_add((self.npoints as i64).saturating_mul(delta_ns)),
            SeriesPolicy::SeriesPerPoint => start_ns.saturating_add(delta_ns),
        };
        self.next_start_ns = Some(next_start_ns);

        log::debug!(
            "generating {} points for {} ({:?}) starting at {}",
            self.npoints,
            self.name,
            self.policy,
            start_ns
        );

        let name = self.name.clone();
        let policy = self.policy;
        let decimals = self.decimals;
        let mut rng = StdRng::seed_from_u64(self.rng.random());

        PointStream::new((0..self.npoints).map(move |i| {
            let (series, ts) = match policy {
                SeriesPolicy::SingleSeries => (name.clone(), start_ns.saturating_add((i as i64).saturating_mul(delta_ns))),
                SeriesPolicy::SeriesPerPoint => (format!("{}_{}", name, i + 1), start_ns),
            };

            Measurement::new(series)
                .field_float("X", rng.random::<f64>() * -720.0)
                .field_float("Y", rng.random::<f64>() * 720.0)
                .field_float("T", rng.random::<f64>() * 30.0)
                .timestamp(ts)
                .to_bytes(decimals)
        }))
    }

    /// Generate the next points and concatenate them in memory, optionally gzip compressed
    pub fn serialize(&mut self, compress: bool) -> InfluxResult<Vec<u8>> {
        serialize_points(self.generate(), compress)
    }

    /// Generate the next points and write them to a file, optionally gzip compressed
    pub fn dump(&mut self, path: impl AsRef<Path>, compress: bool) -> InfluxResult<()> {
        dump_points(self.generate(), path, compress)
    }
}
