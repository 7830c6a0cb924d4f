pub mod falling;
pub mod snake;
pub mod spiral;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Classic,
    Falling,
    Spiral,
    Snake,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Classic => "classic",
            Mode::Falling => "falling",
            Mode::Spiral => "spiral",
            Mode::Snake => "snake",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(Mode::Classic),
            "falling" => Some(Mode::Falling),
            "spiral" => Some(Mode::Spiral),
            "snake" => Some(Mode::Snake),
            _ => None,
        }
    }
}
