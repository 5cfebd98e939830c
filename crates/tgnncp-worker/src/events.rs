use tgnncp_core::MessageStatus;

/// Outcome counters for one relay tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
    /// Status rows actually written back.
    pub applied: usize,
}

#[derive(Debug, Clone)]
pub enum RelayEvent {
    MessageRelayed { id: i64, status: MessageStatus, destination: String },
    TickCompleted { report: TickReport },
    TickSkipped { error: String },
    Stopped,
}
