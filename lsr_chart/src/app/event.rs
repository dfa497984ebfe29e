use crate::model::{FetchTicket, Sample};

#[derive(Debug, Clone)]
pub enum ChartEvent {
    Feed(FeedEvent),
    Ui(UiEvent),
}

#[derive(Debug, Clone)]
pub enum FeedEvent {
    FetchStarted {
        ticket: FetchTicket,
    },
    FetchCompleted {
        ticket: FetchTicket,
        samples: Vec<Sample>,
    },
    FetchFailed {
        ticket: FetchTicket,
        error: String,
    },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// The line chart for `symbol` made it to the screen.
    ChartPainted { symbol: String },
    DismissError,
}
