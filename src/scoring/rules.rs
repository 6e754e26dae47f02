/// Value range a rule applies to.
#[derive(Debug, Clone, Copy)]
pub(super) enum Band {
    /// `value >= min`
    AtLeast(f64),
    /// `value <= max`
    AtMost(f64),
    /// `lo <= value <= hi`
    Closed(f64, f64),
    /// `lo <= value < hi`
    ClosedOpen(f64, f64),
    /// `lo < value <= hi`
    OpenClosed(f64, f64),
    /// Either of two bands
    Or(&'static Band, &'static Band),
    /// Catch-all, including NaN
    Otherwise,
}

impl Band {
    pub(super) fn contains(self, value: f64) -> bool {
        match self {
            Band::AtLeast(min) => value >= min,
            Band::AtMost(max) => value <= max,
            Band::Closed(lo, hi) => lo <= value && value <= hi,
            Band::ClosedOpen(lo, hi) => lo <= value && value < hi,
            Band::OpenClosed(lo, hi) => lo < value && value <= hi,
            Band::Or(a, b) => a.contains(value) || b.contains(value),
            Band::Otherwise => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Rule {
    pub band: Band,
    pub score: f64,
}

const fn rule(band: Band, score: f64) -> Rule {
    Rule { band, score }
}

// words per minute
pub(super) const SPEECH_RATE: &[Rule] = &[
    rule(Band::AtLeast(160.0), 1.0),
    rule(Band::AtLeast(140.0), 0.9),
    rule(Band::AtLeast(120.0), 0.7),
    rule(Band::AtLeast(100.0), 0.5),
    rule(Band::AtLeast(80.0), 0.3),
    rule(Band::Otherwise, 0.1),
];

pub(super) const ARTICULATION_RATE: &[Rule] = &[
    rule(Band::AtLeast(180.0), 1.0),
    rule(Band::AtLeast(160.0), 0.9),
    rule(Band::AtLeast(140.0), 0.7),
    rule(Band::AtLeast(120.0), 0.5),
    rule(Band::AtLeast(100.0), 0.3),
    rule(Band::Otherwise, 0.1),
];

pub(super) const PAUSE_RATIO: &[Rule] = &[
    rule(Band::Closed(0.15, 0.25), 1.0),
    rule(
        Band::Or(&Band::ClosedOpen(0.10, 0.15), &Band::OpenClosed(0.25, 0.30)),
        0.8,
    ),
    rule(Band::OpenClosed(0.30, 0.35), 0.6),
    rule(Band::OpenClosed(0.35, 0.40), 0.4),
    rule(Band::OpenClosed(0.40, 0.50), 0.2),
    rule(Band::Otherwise, 0.1),
];

pub(super) const MEAN_FLUENT_RUN: &[Rule] = &[
    rule(Band::AtLeast(10.0), 1.0),
    rule(Band::AtLeast(8.0), 0.8),
    rule(Band::AtLeast(6.0), 0.6),
    rule(Band::AtLeast(5.0), 0.4),
    rule(Band::AtLeast(3.0), 0.2),
    rule(Band::Otherwise, 0.1),
];

// pauses per minute
pub(super) const LONG_PAUSE_FREQUENCY: &[Rule] = &[
    rule(Band::AtMost(2.0), 1.0),
    rule(Band::AtMost(3.0), 0.8),
    rule(Band::AtMost(4.0), 0.6),
    rule(Band::AtMost(5.0), 0.4),
    rule(Band::AtMost(7.0), 0.2),
    rule(Band::Otherwise, 0.1),
];

// standard deviation of windowed words per minute
pub(super) const RATE_STABILITY: &[Rule] = &[
    rule(Band::AtMost(30.0), 1.0),
    rule(Band::AtMost(40.0), 0.8),
    rule(Band::AtMost(50.0), 0.6),
    rule(Band::AtMost(65.0), 0.4),
    rule(Band::AtMost(80.0), 0.2),
    rule(Band::Otherwise, 0.1),
];

// Hz
pub(super) const PITCH_VARIABILITY: &[Rule] = &[
    rule(Band::Closed(40.0, 80.0), 1.0),
    rule(
        Band::Or(&Band::ClosedOpen(30.0, 40.0), &Band::OpenClosed(80.0, 90.0)),
        0.7,
    ),
    rule(
        Band::Or(&Band::ClosedOpen(20.0, 30.0), &Band::OpenClosed(90.0, 100.0)),
        0.5,
    ),
    rule(Band::Otherwise, 0.3),
];

// dB
pub(super) const LOUDNESS_VARIABILITY: &[Rule] = &[
    rule(Band::Closed(8.0, 15.0), 1.0),
    rule(
        Band::Or(&Band::ClosedOpen(6.0, 8.0), &Band::OpenClosed(15.0, 18.0)),
        0.7,
    ),
    rule(
        Band::Or(&Band::ClosedOpen(5.0, 6.0), &Band::OpenClosed(18.0, 20.0)),
        0.5,
    ),
    rule(Band::Otherwise, 0.3),
];
