#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum TimerKind {
    Scan = 0,
    AuthTimeout = 1,
    Countermeasures = 2,
}

impl TimerKind {
    pub const ALL: [Self; 3] = [Self::Scan, Self::AuthTimeout, Self::Countermeasures];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::AuthTimeout => "auth_timeout",
            Self::Countermeasures => "countermeasures",
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// One single-shot deadline per timer kind.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TimerSet {
    deadlines: [Option<u64>; 3],
}

impl TimerSet {
    pub const fn new() -> Self {
        Self {
            deadlines: [None; 3],
        }
    }

    /// Cancel-and-reschedule.
    pub fn arm(&mut self, kind: TimerKind, deadline_ms: u64) {
        self.deadlines[kind.slot()] = Some(deadline_ms);
    }

    /// Keeps an already armed deadline when it is earlier.
    pub fn arm_earliest(&mut self, kind: TimerKind, deadline_ms: u64) {
        let slot = &mut self.deadlines[kind.slot()];
        *slot = Some(slot.map_or(deadline_ms, |armed| armed.min(deadline_ms)));
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.deadlines[kind.slot()] = None;
    }

    pub fn cancel_all(&mut self) {
        self.deadlines = [None; 3];
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<u64> {
        self.deadlines[kind.slot()]
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.deadline(kind).is_some()
    }

    /// Earliest expired timer. The handler that consumes it disarms it.
    pub fn due(&self, now_ms: u64) -> Option<TimerKind> {
        TimerKind::ALL
            .into_iter()
            .filter(|kind| self.deadline(*kind).is_some_and(|at| at <= now_ms))
            .min_by_key(|kind| self.deadline(*kind))
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.deadlines.iter().flatten().copied().min()
    }
}
