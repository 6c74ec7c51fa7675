//! Process-wide rendering settings

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Selects how text is drawn into the exported PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingEngine {
    /// Registered TrueType/OpenType faces, embedded as CID fonts
    #[default]
    Embedded,
    /// Base-14 Helvetica family; registered fonts are ignored
    Standard,
}

impl DrawingEngine {
    fn to_u8(self) -> u8 {
        match self {
            DrawingEngine::Embedded => 0,
            DrawingEngine::Standard => 1,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => DrawingEngine::Standard,
            _ => DrawingEngine::Embedded,
        }
    }
}

impl fmt::Display for DrawingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawingEngine::Embedded => write!(f, "Embedded"),
            DrawingEngine::Standard => write!(f, "Standard"),
        }
    }
}

static DRAWING_ENGINE: AtomicU8 = AtomicU8::new(0);

/// Select the drawing engine used by document servers without an explicit override
pub fn set_drawing_engine(engine: DrawingEngine) {
    DRAWING_ENGINE.store(engine.to_u8(), Ordering::SeqCst);
}

/// Currently selected drawing engine
pub fn drawing_engine() -> DrawingEngine {
    DrawingEngine::from_u8(DRAWING_ENGINE.load(Ordering::SeqCst))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_round_trips_through_u8() {
        for engine in [DrawingEngine::Embedded, DrawingEngine::Standard] {
            assert_eq!(DrawingEngine::from_u8(engine.to_u8()), engine);
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(DrawingEngine::Embedded.to_string(), "Embedded");
        assert_eq!(DrawingEngine::Standard.to_string(), "Standard");
    }
}
