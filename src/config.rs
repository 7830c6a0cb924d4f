use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::SessionError;
use crate::engine::catalog::{Script, Selection};
use crate::engine::combo::{ComboTable, ComboTier, standard_tiers};
use crate::engine::pool::{DEFAULT_WEIGHT, MAX_WEIGHT, clamp_weight};
use crate::modes::Mode;
use crate::modes::falling::FallingSettings;
use crate::modes::snake::SnakeSettings;
use crate::modes::spiral::SpiralSettings;
use crate::session::quiz::{SessionSettings, TimerCompression};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_time_limit_ms")]
    pub time_limit_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_wrong_answer_delay_ms")]
    pub wrong_answer_delay_ms: u64,
    #[serde(default = "default_pause_after_timeouts")]
    pub pause_after_timeouts: u32,
    #[serde(default = "default_weight_increase")]
    pub weight_increase: f64,
    #[serde(default = "default_weight_decrease")]
    pub weight_decrease: f64,
    #[serde(default = "default_initial_weight")]
    pub initial_weight: f64,
    #[serde(default = "default_timer_compression")]
    pub timer_compression: bool,
    #[serde(default = "default_compression_factor")]
    pub compression_factor: f64,
    #[serde(default = "default_min_time_limit_ms")]
    pub min_time_limit_ms: u64,
    #[serde(default = "default_scripts")]
    pub scripts: Vec<String>,
    #[serde(default)]
    pub include_dakuten: bool,
    #[serde(default)]
    pub include_combinations: bool,
    #[serde(default = "default_avoid_repeats")]
    pub avoid_repeats: bool,
    #[serde(default = "default_mode")]
    pub default_mode: String,
    #[serde(default = "default_spiral_visible")]
    pub spiral_visible: usize,
    #[serde(default = "default_falling_columns")]
    pub falling_columns: usize,
    #[serde(default = "default_falling_rows")]
    pub falling_rows: usize,
    #[serde(default = "default_fall_interval_ms")]
    pub fall_interval_ms: u64,
    #[serde(default = "default_snake_width")]
    pub snake_width: i32,
    #[serde(default = "default_snake_height")]
    pub snake_height: i32,
    #[serde(default = "default_snake_step_ms")]
    pub snake_step_ms: u64,
    /// "standard", "quick", or "custom" to use `combo_tiers`.
    #[serde(default = "default_combo_preset")]
    pub combo_preset: String,
    // Kept last: serializes as an array of tables.
    #[serde(default = "standard_tiers")]
    pub combo_tiers: Vec<ComboTier>,
}

fn default_time_limit_ms() -> u64 {
    5000
}
fn default_tick_ms() -> u64 {
    50
}
fn default_wrong_answer_delay_ms() -> u64 {
    1000
}
fn default_pause_after_timeouts() -> u32 {
    2
}
fn default_weight_increase() -> f64 {
    2.0
}
fn default_weight_decrease() -> f64 {
    1.0
}
fn default_initial_weight() -> f64 {
    DEFAULT_WEIGHT
}
fn default_timer_compression() -> bool {
    true
}
fn default_compression_factor() -> f64 {
    0.85
}
fn default_min_time_limit_ms() -> u64 {
    1500
}
fn default_scripts() -> Vec<String> {
    vec![Script::Hiragana.to_key().to_string()]
}
fn default_avoid_repeats() -> bool {
    true
}
fn default_mode() -> String {
    Mode::Classic.as_str().to_string()
}
fn default_spiral_visible() -> usize {
    6
}
fn default_falling_columns() -> usize {
    6
}
fn default_falling_rows() -> usize {
    12
}
fn default_fall_interval_ms() -> u64 {
    600
}
fn default_snake_width() -> i32 {
    20
}
fn default_snake_height() -> i32 {
    12
}
fn default_snake_step_ms() -> u64 {
    450
}
fn default_combo_preset() -> String {
    "standard".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_limit_ms: default_time_limit_ms(),
            tick_ms: default_tick_ms(),
            wrong_answer_delay_ms: default_wrong_answer_delay_ms(),
            pause_after_timeouts: default_pause_after_timeouts(),
            weight_increase: default_weight_increase(),
            weight_decrease: default_weight_decrease(),
            initial_weight: default_initial_weight(),
            timer_compression: default_timer_compression(),
            compression_factor: default_compression_factor(),
            min_time_limit_ms: default_min_time_limit_ms(),
            scripts: default_scripts(),
            include_dakuten: false,
            include_combinations: false,
            avoid_repeats: default_avoid_repeats(),
            default_mode: default_mode(),
            spiral_visible: default_spiral_visible(),
            falling_columns: default_falling_columns(),
            falling_rows: default_falling_rows(),
            fall_interval_ms: default_fall_interval_ms(),
            snake_width: default_snake_width(),
            snake_height: default_snake_height(),
            snake_step_ms: default_snake_step_ms(),
            combo_preset: default_combo_preset(),
            combo_tiers: standard_tiers(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kanadrill")
            .join("config.toml")
    }

    /// Clamp out-of-range values and reset unknown keys to their defaults.
    /// Call after deserialization; hand-edited files are not trusted.
    pub fn validate(&mut self) {
        self.time_limit_ms = self.time_limit_ms.clamp(500, 60_000);
        self.tick_ms = self.tick_ms.clamp(10, 1000);
        self.wrong_answer_delay_ms = self.wrong_answer_delay_ms.min(10_000);
        self.pause_after_timeouts = self.pause_after_timeouts.clamp(1, 100);
        self.weight_increase = sanitize(
            self.weight_increase,
            0.0,
            MAX_WEIGHT,
            default_weight_increase(),
        );
        self.weight_decrease = sanitize(
            self.weight_decrease,
            0.0,
            MAX_WEIGHT,
            default_weight_decrease(),
        );
        self.initial_weight = if self.initial_weight.is_finite() {
            clamp_weight(self.initial_weight)
        } else {
            DEFAULT_WEIGHT
        };
        self.compression_factor =
            sanitize(self.compression_factor, 0.1, 1.0, default_compression_factor());
        self.min_time_limit_ms = self.min_time_limit_ms.clamp(100, self.time_limit_ms);

        self.scripts.retain(|s| Script::from_key(s).is_some());
        self.scripts.dedup();
        if self.scripts.is_empty() {
            self.scripts = default_scripts();
        }
        if Mode::from_key(&self.default_mode).is_none() {
            self.default_mode = default_mode();
        }

        self.spiral_visible = self.spiral_visible.clamp(1, 12);
        self.falling_columns = self.falling_columns.clamp(1, 16);
        self.falling_rows = self.falling_rows.clamp(4, 40);
        self.fall_interval_ms = self.fall_interval_ms.clamp(50, 5000);
        self.snake_width = self.snake_width.clamp(5, 80);
        self.snake_height = self.snake_height.clamp(5, 40);
        self.snake_step_ms = self.snake_step_ms.clamp(50, 5000);

        if !matches!(self.combo_preset.as_str(), "standard" | "quick" | "custom") {
            self.combo_preset = default_combo_preset();
        }
        if ComboTable::new(self.combo_tiers.clone()).is_err() {
            self.combo_tiers = standard_tiers();
        }
    }

    pub fn mode(&self) -> Mode {
        Mode::from_key(&self.default_mode).unwrap_or_default()
    }

    pub fn selection(&self) -> Selection {
        Selection {
            scripts: self
                .scripts
                .iter()
                .filter_map(|s| Script::from_key(s))
                .collect(),
            dakuten: self.include_dakuten,
            combinations: self.include_combinations,
        }
    }

    pub fn combo_table(&self) -> Result<ComboTable, SessionError> {
        match self.combo_preset.as_str() {
            "quick" => Ok(ComboTable::quick()),
            "custom" => ComboTable::new(self.combo_tiers.clone()),
            _ => Ok(ComboTable::standard()),
        }
    }

    /// Engine settings for the classic drill. Mode adapters derive their own
    /// from this.
    pub fn session_settings(&self) -> Result<SessionSettings, SessionError> {
        let settings = SessionSettings {
            time_limit_ms: self.time_limit_ms,
            wrong_answer_delay_ms: self.wrong_answer_delay_ms,
            pause_after_timeouts: self.pause_after_timeouts,
            weight_increase: self.weight_increase,
            weight_decrease: self.weight_decrease,
            combo_table: self.combo_table()?,
            compression: self.timer_compression.then_some(TimerCompression {
                factor: self.compression_factor,
                min_time_limit_ms: self.min_time_limit_ms,
            }),
            avoid_repeats: self.avoid_repeats,
            lookahead: 0,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn falling_settings(&self) -> FallingSettings {
        FallingSettings {
            columns: self.falling_columns,
            rows: self.falling_rows,
            fall_interval_ms: self.fall_interval_ms,
            ..FallingSettings::default()
        }
    }

    pub fn spiral_settings(&self) -> SpiralSettings {
        SpiralSettings {
            visible: self.spiral_visible,
            ..SpiralSettings::default()
        }
    }

    pub fn snake_settings(&self) -> SnakeSettings {
        SnakeSettings {
            width: self.snake_width,
            height: self.snake_height,
            step_interval_ms: self.snake_step_ms,
            ..SnakeSettings::default()
        }
    }
}

fn sanitize(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}
