use bevy::reflect::Reflect;
use serde::{Deserialize, Serialize};

use super::Parameter;
use crate::errors::ParameterError;

/// Display color of controllers, 8 bits per channel.
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[i64; 3]", into = "[i64; 3]")]
pub struct Color([u8; 3]);

impl Color {
    pub const RED: Self = Self([255, 0, 0]);
    pub const BLUE: Self = Self([0, 0, 255]);
    pub const YELLOW: Self = Self([255, 255, 0]);

    pub fn new(value: [i64; 3]) -> Result<Self, ParameterError> {
        Self::check(&value)?;
        Ok(Self(value.map(|channel| channel as u8)))
    }

    /// Builds a color, saturating each channel into `[0, 255]`.
    pub fn clamped(value: [i64; 3]) -> Self {
        Self(value.map(|channel| channel.clamp(0, 255) as u8))
    }

    pub fn channels(self) -> [u8; 3] {
        self.0
    }

    /// Channels normalized to `[0, 1]`.
    pub fn to_linear(self) -> [f64; 3] {
        self.0.map(|channel| f64::from(channel) / 255.)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::YELLOW
    }
}

impl Parameter for Color {
    type Value = [i64; 3];

    fn check(value: &[i64; 3]) -> Result<(), ParameterError> {
        match value
            .iter()
            .enumerate()
            .find(|(_, channel)| !(0..=255).contains(*channel))
        {
            Some((channel, value)) => Err(ParameterError::ColorOutOfRange {
                channel,
                value: *value,
            }),
            None => Ok(()),
        }
    }

    /// Rotates the channels, so red becomes blue and blue becomes green.
    /// Three mirrors, not two, give back the original color.
    fn mirror(&self) -> Result<Self, ParameterError> {
        let [r, g, b] = self.0;
        Ok(Self([g, b, r]))
    }
}

impl TryFrom<[i64; 3]> for Color {
    type Error = ParameterError;

    fn try_from(value: [i64; 3]) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Color> for [i64; 3] {
    fn from(value: Color) -> Self {
        value.0.map(i64::from)
    }
}
