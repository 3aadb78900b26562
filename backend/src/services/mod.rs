//! Service layer: prayer-time computation, DST probing and playback.

pub mod dst;
pub mod playback;
pub mod prayer_times;

pub use dst::{detect_transition, local_to_utc, DstTransition};
pub use playback::{DevicePlayer, LoggingPlayer, PlaybackError};
pub use prayer_times::PrayerTimeEngine;
