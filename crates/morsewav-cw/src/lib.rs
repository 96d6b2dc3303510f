pub mod config;
pub mod encode;
pub mod error;
pub mod player;
pub mod session;
pub mod sink;
pub mod timing;
pub mod tone;

pub use config::SessionConfig;
pub use encode::{encode, MorseLine, MorseSymbol};
pub use error::{MorseError, SinkError};
pub use player::SymbolPlayer;
pub use session::{render, Session, SessionSummary};
pub use sink::{PcmSink, RawSink};
pub use timing::Timing;
pub use tone::{render_tone, ToneBuffer, ToneCache, ToneSpec};
