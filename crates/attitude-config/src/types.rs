use attitude_core::{Gains, GyroUnits, HeadingReference, Pipeline};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Feedback gains shared by the corrected pipelines.
    #[serde(with = "gains_serde")]
    pub gains: Gains,
    /// Heading correction settings.
    pub heading: HeadingConfig,
    /// How to interpret the recording.
    pub input: InputConfig,
    /// Which pipelines to run and export.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingConfig {
    /// `"first-sample"` or `{ fixed = [x, y] }` in the world frame.
    pub reference: HeadingReference,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Unit of the gyroscope columns.
    pub gyro_units: GyroUnits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub gyro: bool,
    pub tilt: bool,
    pub yaw: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            gyro: true,
            tilt: true,
            yaw: true,
        }
    }
}

impl OutputConfig {
    /// Enabled pipelines, in gyro/tilt/yaw order.
    pub fn pipelines(&self) -> Vec<Pipeline> {
        Pipeline::ALL
            .into_iter()
            .filter(|p| match p {
                Pipeline::Gyro => self.gyro,
                Pipeline::Tilt => self.tilt,
                Pipeline::Yaw => self.yaw,
            })
            .collect()
    }

    /// Enable exactly the given pipelines.
    pub fn select(pipelines: &[Pipeline]) -> Self {
        Self {
            gyro: pipelines.contains(&Pipeline::Gyro),
            tilt: pipelines.contains(&Pipeline::Tilt),
            yaw: pipelines.contains(&Pipeline::Yaw),
        }
    }
}

// Gains with per-field defaults, so a file may set only one of them.

mod gains_serde {
    use attitude_core::Gains;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(default)]
    struct Repr {
        alpha: f64,
        alpha2: f64,
    }

    impl Default for Repr {
        fn default() -> Self {
            let Gains { alpha, alpha2 } = Gains::default();
            Self { alpha, alpha2 }
        }
    }

    pub fn serialize<S: Serializer>(g: &Gains, s: S) -> Result<S::Ok, S::Error> {
        Repr {
            alpha: g.alpha,
            alpha2: g.alpha2,
        }
        .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Gains, D::Error> {
        let Repr { alpha, alpha2 } = Repr::deserialize(d)?;
        Ok(Gains { alpha, alpha2 })
    }
}
