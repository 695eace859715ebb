use crate::chat::SubmissionId;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    StreamDelta {
        submission: SubmissionId,
        text: String,
    },
    StreamEnd {
        submission: SubmissionId,
    },
    ExchangeFailed {
        submission: SubmissionId,
        message: String,
    },
}

impl AppEvent {
    pub fn submission(&self) -> SubmissionId {
        match self {
            Self::StreamDelta { submission, .. }
            | Self::StreamEnd { submission }
            | Self::ExchangeFailed { submission, .. } => *submission,
        }
    }
}
