use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId(Uuid);

impl ChunkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ChunkId {
    fn default() -> Self {
        Self::new()
    }
}

/// Half-open span of the normalized audio stream, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl TimeRange {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatus {
    Pending,
    InFlight,
    Succeeded,
    FailedRetryable,
    FailedFatal,
}

impl ChunkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkStatus::Pending => "PENDING",
            ChunkStatus::InFlight => "IN_FLIGHT",
            ChunkStatus::Succeeded => "SUCCEEDED",
            ChunkStatus::FailedRetryable => "FAILED_RETRYABLE",
            ChunkStatus::FailedFatal => "FAILED_FATAL",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ChunkStatus::Succeeded | ChunkStatus::FailedFatal)
    }
}

/// One contiguous slice of the source audio, the unit of transcription work.
/// `index` defines the total order used for reassembly; `payload` holds the
/// WAV-encoded audio including the boundary guard past `range.end_ms`.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: ChunkId,
    pub index: usize,
    pub range: TimeRange,
    pub payload: Vec<u8>,
    pub attempts: u32,
    pub status: ChunkStatus,
    pub text: Option<String>,
}

impl Chunk {
    pub fn new(index: usize, range: TimeRange, payload: Vec<u8>) -> Self {
        Self {
            id: ChunkId::new(),
            index,
            range,
            payload,
            attempts: 0,
            status: ChunkStatus::Pending,
            text: None,
        }
    }
}
