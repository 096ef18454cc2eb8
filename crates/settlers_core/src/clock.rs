use serde::{Deserialize, Serialize};

/// Hours before this are night.
pub const DAWN_HOUR: f64 = 6.0;
/// Hours from this on are night.
pub const DUSK_HOUR: f64 = 18.0;
/// Ambient light while it is dark.
pub const NIGHT_LIGHT: f64 = 0.3;

/// Day/night cycle. `day_time == 0` is midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayClock {
    pub day_time: f64,
    pub day_length: f64,
    pub day_number: u64,
}

impl DayClock {
    #[must_use]
    pub fn new(day_length: f64) -> Self {
        Self {
            day_time: 0.0,
            day_length: day_length.max(f64::EPSILON),
            day_number: 0,
        }
    }

    /// Starts the clock at a given hour of day zero.
    #[must_use]
    pub fn starting_at_hour(day_length: f64, hour: f64) -> Self {
        let mut clock = Self::new(day_length);
        clock.day_time = (hour.rem_euclid(24.0) / 24.0) * clock.day_length;
        clock
    }

    /// Advances by `dt` seconds, rolling over into following days.
    pub fn advance(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        self.day_time += dt;
        while self.day_time >= self.day_length {
            self.day_time -= self.day_length;
            self.day_number += 1;
        }
    }

    /// Position within the day in `[0, 1)`; 0.5 is noon.
    #[must_use]
    pub fn phase(&self) -> f64 {
        (self.day_time / self.day_length).clamp(0.0, 1.0 - f64::EPSILON)
    }

    #[must_use]
    pub fn hour(&self) -> f64 {
        self.phase() * 24.0
    }

    #[must_use]
    pub fn is_night(&self) -> bool {
        let hour = self.hour();
        !(DAWN_HOUR..DUSK_HOUR).contains(&hour)
    }

    /// Ambient light in `[0.3, 1]` with two-hour dawn and dusk ramps.
    #[must_use]
    pub fn light_intensity(&self) -> f64 {
        let hour = self.hour();
        if (DAWN_HOUR..DAWN_HOUR + 2.0).contains(&hour) {
            NIGHT_LIGHT + 0.4 * ((hour - DAWN_HOUR) / 2.0)
        } else if (DAWN_HOUR + 2.0..DUSK_HOUR).contains(&hour) {
            1.0
        } else if (DUSK_HOUR..DUSK_HOUR + 2.0).contains(&hour) {
            1.0 - 0.4 * ((hour - DUSK_HOUR) / 2.0)
        } else {
            NIGHT_LIGHT
        }
    }
}

impl Default for DayClock {
    fn default() -> Self {
        Self::new(120.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midnight_is_night() {
        let clock = DayClock::new(120.0);
        assert!(clock.is_night());
        assert_eq!(clock.light_intensity(), NIGHT_LIGHT);
    }

    #[test]
    fn test_noon_is_day() {
        let clock = DayClock::starting_at_hour(120.0, 12.0);
        assert!(!clock.is_night());
        assert!((clock.phase() - 0.5).abs() < 1e-9);
        assert_eq!(clock.light_intensity(), 1.0);
    }

    #[test]
    fn test_advance_rolls_over() {
        let mut clock = DayClock::new(120.0);
        clock.advance(250.0);
        assert_eq!(clock.day_number, 2);
        assert!((clock.day_time - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_night_boundaries() {
        assert!(!DayClock::starting_at_hour(120.0, 6.0).is_night());
        assert!(DayClock::starting_at_hour(120.0, 18.0).is_night());
        assert!(DayClock::starting_at_hour(120.0, 5.9).is_night());
    }

    #[test]
    fn test_dawn_ramp() {
        let clock = DayClock::starting_at_hour(120.0, 7.0);
        assert!((clock.light_intensity() - 0.5).abs() < 1e-9);
    }
}
