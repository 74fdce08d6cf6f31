use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Clear,
    Rain,
}

/// Time and weather as an injected capability, so cost and ETA math never
/// reads hidden global state.
pub trait EnvContext: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn current_weather(&self) -> Weather;
}

pub struct SystemEnv {
    weather: Weather,
}

impl SystemEnv {
    pub fn new(weather: Weather) -> Self {
        Self { weather }
    }
}

impl EnvContext for SystemEnv {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn current_weather(&self) -> Weather {
        self.weather
    }
}

/// Deterministic context for tests: a settable clock that only moves when
/// `advance` is called.
pub struct FixedEnv {
    now: Mutex<DateTime<Utc>>,
    weather: Weather,
}

impl FixedEnv {
    pub fn new(now: DateTime<Utc>, weather: Weather) -> Self {
        Self {
            now: Mutex::new(now),
            weather,
        }
    }

    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + delta;
    }
}

impl EnvContext for FixedEnv {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    fn current_weather(&self) -> Weather {
        self.weather
    }
}
