//! Centralized constants for the voice agent
//!
//! Single source of truth for default values. Settings defaults, the
//! pipeline and the tools all read from here.

/// Provider and downstream endpoints
pub mod endpoints {
    /// OpenAI-compatible API base URL
    pub const PROVIDER_BASE_URL: &str = "https://api.openai.com/v1";

    /// Downstream LLM server receiving forwarded text and audio
    pub const LLM_SERVER_URL: &str = "http://localhost:8000/process";

    /// Fallback environment variable for the provider API key
    pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
}

/// Index build and retrieval defaults
pub mod rag {
    /// Directory holding the raw `.txt` corpus
    pub const SOURCE_DIR: &str = "database";

    /// Persisted index directory
    pub const INDEX_PATH: &str = "database/vector_store";

    /// Chunk size in characters
    pub const CHUNK_SIZE: usize = 1000;

    /// Characters shared by adjacent chunks
    pub const CHUNK_OVERLAP: usize = 200;

    /// Chunks returned per question
    pub const TOP_K: usize = 3;

    /// Hard cap on a tool answer, in characters
    pub const MAX_ANSWER_CHARS: usize = 500;

    /// Appended when an answer is truncated
    pub const ELLIPSIS: &str = "...";

    /// Returned when nothing relevant is indexed
    pub const NOT_FOUND_MESSAGE: &str = "ขออภัยค่ะ ไม่พบข้อมูลที่เกี่ยวข้องกับคำถามนี้";

    /// Embedding model
    pub const EMBEDDING_MODEL: &str = "text-embedding-ada-002";

    /// Output dimension of [`EMBEDDING_MODEL`]
    pub const EMBEDDING_DIMENSION: usize = 1536;
}

/// Speech provider defaults
pub mod speech {
    pub const STT_MODEL: &str = "whisper-1";
    pub const TTS_MODEL: &str = "gpt-4o-mini-tts";
    pub const TTS_VOICE: &str = "alloy";

    /// Words per verse before a forced break
    pub const MAX_VERSE_WORDS: usize = 20;
}

/// Reasoning service defaults
pub mod llm {
    pub const MODEL: &str = "gpt-3.5-turbo-1106";
    pub const TEMPERATURE: f32 = 0.7;
    pub const MAX_TOKENS: u32 = 512;

    /// Model calls allowed per user turn while tools are requested
    pub const MAX_TOOL_ROUNDS: usize = 4;
}

/// Timeouts
pub mod timeouts {
    /// Downstream forwarding call (seconds)
    pub const FORWARD_SECS: u64 = 30;

    /// Provider requests (seconds)
    pub const PROVIDER_SECS: u64 = 30;

    /// Inbound HTTP requests (seconds)
    pub const REQUEST_SECS: u64 = 120;

    /// Tool execution (seconds)
    pub const TOOL_SECS: u64 = 30;

    /// Idle time before a dialogue session is reaped (seconds)
    pub const SESSION_IDLE_SECS: u64 = 3600;

    /// Interval between idle-session sweeps (seconds)
    pub const SESSION_CLEANUP_SECS: u64 = 300;
}

/// Live dialogue session limits
pub mod sessions {
    pub const MAX_SESSIONS: usize = 100;
}
