use serde::{Deserialize, Serialize};

/// Body a sensor sends to record one reading
#[derive(Debug, Clone, Serialize)]
pub struct ReadingPayload {
    pub secret: String,
    pub temperature: f64,
}

/// A reading as returned by the endpoint's read path
#[derive(Debug, Clone, Deserialize)]
pub struct StoredReading {
    pub temperature: f64,
    pub recorded_at: String,
}

/// Random walk around a base temperature, like a slowly drifting room sensor.
pub struct Sensor {
    current: f64,
    min: f64,
    max: f64,
}

impl Sensor {
    pub fn new(base: f64) -> Self {
        Self {
            current: base,
            min: base - 10.0,
            max: base + 10.0,
        }
    }

    pub fn next_reading<R: rand::Rng>(&mut self, rng: &mut R) -> f64 {
        let step: f64 = rng.gen_range(-0.5..0.5);
        self.current = (self.current + step).clamp(self.min, self.max);
        (self.current * 100.0).round() / 100.0
    }
}
