use std::fmt;

/// Progress of one booking transaction.
///
/// `Start → SeatChecked → TicketWritten → CounterAdjusted → Committed`.
/// Cancels skip `SeatChecked`; bookings and same-flight seat moves commit
/// straight from `TicketWritten`. `RolledBack` ends any unfinished stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStage {
    Start,
    SeatChecked,
    TicketWritten,
    CounterAdjusted,
    Committed,
    RolledBack,
}

impl BookingStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStage::Committed | BookingStage::RolledBack)
    }

    pub fn can_transition_to(&self, next: BookingStage) -> bool {
        use BookingStage::*;
        match (self, next) {
            (from, RolledBack) => !from.is_terminal(),
            (Start, SeatChecked) | (Start, TicketWritten) => true,
            (SeatChecked, TicketWritten) => true,
            (TicketWritten, CounterAdjusted) | (TicketWritten, Committed) => true,
            (CounterAdjusted, Committed) => true,
            _ => false,
        }
    }

    pub fn transition(&mut self, next: BookingStage) -> Result<(), StageError> {
        if !self.can_transition_to(next) {
            return Err(StageError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for BookingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStage::Start => "START",
            BookingStage::SeatChecked => "SEAT_CHECKED",
            BookingStage::TicketWritten => "TICKET_WRITTEN",
            BookingStage::CounterAdjusted => "COUNTER_ADJUSTED",
            BookingStage::Committed => "COMMITTED",
            BookingStage::RolledBack => "ROLLED_BACK",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Book,
    Cancel,
    Rebook,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Book => "book",
            Operation::Cancel => "cancel",
            Operation::Rebook => "rebook",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("Invalid booking stage transition from {from} to {to}")]
    InvalidTransition { from: BookingStage, to: BookingStage },
}
