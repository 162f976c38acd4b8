use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Queued,
    Extracting,
    Segmenting,
    Transcribing,
    Aggregating,
    Finished,
    Error,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "QUEUED",
            JobState::Extracting => "EXTRACTING",
            JobState::Segmenting => "SEGMENTING",
            JobState::Transcribing => "TRANSCRIBING",
            JobState::Aggregating => "AGGREGATING",
            JobState::Finished => "FINISHED",
            JobState::Error => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finished | JobState::Error)
    }

    /// Transitions are one-way: each state is visited at most once, and the
    /// only edges are the next pipeline stage or the terminal `Error`.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == JobState::Error {
            return true;
        }
        matches!(
            (self, next),
            (JobState::Queued, JobState::Extracting)
                | (JobState::Extracting, JobState::Segmenting)
                | (JobState::Segmenting, JobState::Transcribing)
                | (JobState::Transcribing, JobState::Aggregating)
                | (JobState::Aggregating, JobState::Finished)
        )
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(JobState::Queued),
            "EXTRACTING" => Ok(JobState::Extracting),
            "SEGMENTING" => Ok(JobState::Segmenting),
            "TRANSCRIBING" => Ok(JobState::Transcribing),
            "AGGREGATING" => Ok(JobState::Aggregating),
            "FINISHED" => Ok(JobState::Finished),
            "ERROR" => Ok(JobState::Error),
            _ => Err(format!("Invalid job state: {}", s)),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
