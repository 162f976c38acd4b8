mod health;
mod progress;
mod transcribe;
mod transcriptions;

pub use health::health_handler;
pub use progress::progress_handler;
pub use transcribe::transcribe_handler;
pub use transcriptions::{
    clear_transcriptions_handler, delete_transcription_handler, list_transcriptions_handler,
};
