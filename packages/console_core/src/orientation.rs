//! Complementary-filter attitude estimate from raw MPU6050 registers.
//!
//! Pitch and roll blend integrated gyro rate with accelerometer tilt. Yaw is
//! pure gyro integration and drifts; there is no magnetometer to correct it.

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::{
    ACCEL_LSB_PER_G, COMPLEMENTARY_ALPHA, DISPLAY_FILTER_ALPHA, GYRO_LSB_PER_DPS,
    MIN_SAMPLE_INTERVAL_S,
};
use crate::hal::{ImuSource, RawImuSample};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrientationState {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
    pub pitch_filtered: f32,
    pub roll_filtered: f32,
    pub yaw_filtered: f32,
    pub dt: f32,
}

/// Raw-LSB offsets subtracted before scaling.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorBias {
    pub gyro: [f32; 3],
    pub accel: [f32; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    Updated,
    TooSoon,
    ReadFailed,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OrientationEstimator {
    state: OrientationState,
    last_sample_us: Option<u64>,
}

impl OrientationEstimator {
    pub const fn new() -> Self {
        Self {
            state: OrientationState {
                pitch: 0.0,
                roll: 0.0,
                yaw: 0.0,
                pitch_filtered: 0.0,
                roll_filtered: 0.0,
                yaw_filtered: 0.0,
                dt: 0.0,
            },
            last_sample_us: None,
        }
    }

    pub fn with_state(state: OrientationState) -> Self {
        Self {
            state,
            last_sample_us: None,
        }
    }

    pub fn state(&self) -> &OrientationState {
        &self.state
    }

    /// Fuses one sample. Intervals shorter than the minimum leave the state
    /// untouched.
    pub fn update(
        &mut self,
        accel: [i16; 3],
        gyro: [i16; 3],
        bias: &SensorBias,
        dt: f32,
    ) -> OrientationState {
        if dt < MIN_SAMPLE_INTERVAL_S {
            return self.state;
        }

        let ax = (accel[0] as f32 - bias.accel[0]) / ACCEL_LSB_PER_G;
        let ay = (accel[1] as f32 - bias.accel[1]) / ACCEL_LSB_PER_G;
        let az = (accel[2] as f32 - bias.accel[2]) / ACCEL_LSB_PER_G;

        let gx = (gyro[0] as f32 - bias.gyro[0]) / GYRO_LSB_PER_DPS;
        let gy = (gyro[1] as f32 - bias.gyro[1]) / GYRO_LSB_PER_DPS;
        let gz = (gyro[2] as f32 - bias.gyro[2]) / GYRO_LSB_PER_DPS;

        let (pitch_acc, roll_acc) = tilt_from_gravity(ax, ay, az);

        let state = &mut self.state;
        state.dt = dt;
        state.pitch =
            COMPLEMENTARY_ALPHA * (state.pitch + gx * dt) + (1.0 - COMPLEMENTARY_ALPHA) * pitch_acc;
        state.roll =
            COMPLEMENTARY_ALPHA * (state.roll + gy * dt) + (1.0 - COMPLEMENTARY_ALPHA) * roll_acc;
        state.yaw += gz * dt;

        state.pitch_filtered = smooth(state.pitch_filtered, state.pitch);
        state.roll_filtered = smooth(state.roll_filtered, state.roll);
        state.yaw_filtered = smooth(state.yaw_filtered, state.yaw);

        self.state
    }

    /// Samples the IMU if enough time has passed since the last attempt.
    /// A failed read keeps the previous estimate.
    pub fn poll<I: ImuSource>(&mut self, imu: &mut I, bias: &SensorBias, now_us: u64) -> PollOutcome {
        let Some(last) = self.last_sample_us else {
            self.last_sample_us = Some(now_us);
            return PollOutcome::TooSoon;
        };

        let dt = now_us.saturating_sub(last) as f32 / 1_000_000.0;
        if dt < MIN_SAMPLE_INTERVAL_S {
            return PollOutcome::TooSoon;
        }
        self.last_sample_us = Some(now_us);

        match imu.read_raw() {
            Ok(RawImuSample { accel, gyro }) => {
                self.update(accel, gyro, bias, dt);
                PollOutcome::Updated
            }
            Err(_) => PollOutcome::ReadFailed,
        }
    }
}

/// Accelerometer-only pitch and roll in degrees.
pub fn tilt_from_gravity(ax: f32, ay: f32, az: f32) -> (f32, f32) {
    let pitch = ay.atan2(az).to_degrees();
    let roll = (-ax).atan2(az).to_degrees();
    (pitch, roll)
}

/// Heading relative to the calibrated yaw, wrapped to [0, 360).
pub fn heading_degrees(yaw_ref: f32, yaw_filtered: f32) -> f32 {
    let mut heading = (yaw_ref - yaw_filtered) % 360.0;
    if heading < 0.0 {
        heading += 360.0;
    }
    if heading >= 360.0 {
        heading -= 360.0;
    }
    heading
}

fn smooth(previous: f32, value: f32) -> f32 {
    DISPLAY_FILTER_ALPHA * previous + (1.0 - DISPLAY_FILTER_ALPHA) * value
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedImu {
        sample: RawImuSample,
        fail: bool,
        reads: u32,
    }

    impl ImuSource for ScriptedImu {
        type Error = ();

        fn read_raw(&mut self) -> Result<RawImuSample, Self::Error> {
            self.reads += 1;
            if self.fail {
                Err(())
            } else {
                Ok(self.sample)
            }
        }
    }

    const LEVEL: [i16; 3] = [0, 0, 16_384];

    #[test]
    fn level_input_converges_pitch_and_roll_to_zero() {
        let mut estimator = OrientationEstimator::with_state(OrientationState {
            pitch: 30.0,
            roll: -20.0,
            yaw: 12.5,
            pitch_filtered: 30.0,
            roll_filtered: -20.0,
            yaw_filtered: 12.5,
            dt: 0.0,
        });
        let bias = SensorBias::default();

        for _ in 0..2_000 {
            estimator.update(LEVEL, [0, 0, 0], &bias, 0.01);
        }

        let state = estimator.state();
        assert!(state.pitch.abs() < 0.5, "pitch={}", state.pitch);
        assert!(state.roll.abs() < 0.5, "roll={}", state.roll);
        assert!(state.pitch_filtered.abs() < 0.5);
        assert!(state.roll_filtered.abs() < 0.5);
        assert_eq!(state.yaw, 12.5);
    }

    #[test]
    fn short_interval_is_a_no_op() {
        let mut estimator = OrientationEstimator::new();
        let before = *estimator.state();
        let after = estimator.update([100, 200, 300], [1_000, 0, 0], &SensorBias::default(), 0.001);
        assert_eq!(before, after);
    }

    #[test]
    fn yaw_integrates_gyro_without_correction() {
        let mut estimator = OrientationEstimator::new();
        // 131 LSB = 1 deg/s, 100 steps of 0.1s = 10 degrees.
        for _ in 0..100 {
            estimator.update(LEVEL, [0, 0, 131], &SensorBias::default(), 0.1);
        }
        assert!((estimator.state().yaw - 10.0).abs() < 1e-3);
    }

    #[test]
    fn bias_is_removed_before_scaling() {
        let mut estimator = OrientationEstimator::new();
        let bias = SensorBias {
            gyro: [0.0, 0.0, 50.0],
            accel: [0.0, 0.0, 0.0],
        };
        estimator.update(LEVEL, [0, 0, 50], &bias, 0.5);
        assert_eq!(estimator.state().yaw, 0.0);
    }

    #[test]
    fn poll_skips_failed_reads_and_keeps_state() {
        let mut estimator = OrientationEstimator::with_state(OrientationState {
            pitch: 5.0,
            ..OrientationState::default()
        });
        let mut imu = ScriptedImu {
            sample: RawImuSample {
                accel: LEVEL,
                gyro: [0, 0, 0],
            },
            fail: true,
            reads: 0,
        };
        let bias = SensorBias::default();

        assert_eq!(estimator.poll(&mut imu, &bias, 0), PollOutcome::TooSoon);
        assert_eq!(estimator.poll(&mut imu, &bias, 1_000), PollOutcome::TooSoon);
        assert_eq!(estimator.poll(&mut imu, &bias, 10_000), PollOutcome::ReadFailed);
        assert_eq!(estimator.state().pitch, 5.0);
        assert_eq!(imu.reads, 1);

        imu.fail = false;
        assert_eq!(estimator.poll(&mut imu, &bias, 20_000), PollOutcome::Updated);
        assert!(estimator.state().pitch < 5.0);
    }

    #[test]
    fn heading_wraps_into_range() {
        assert_eq!(heading_degrees(0.0, 90.0), 270.0);
        assert_eq!(heading_degrees(400.0, 0.0), 40.0);
        assert_eq!(heading_degrees(10.0, 10.0), 0.0);
        let h = heading_degrees(0.0, 720.5);
        assert!((0.0..360.0).contains(&h));
    }

    #[test]
    fn register_block_skips_temperature() {
        let mut block = [0u8; 14];
        block[0..2].copy_from_slice(&100i16.to_be_bytes());
        block[4..6].copy_from_slice(&(-16_384i16).to_be_bytes());
        block[6..8].copy_from_slice(&0x7FFFi16.to_be_bytes());
        block[12..14].copy_from_slice(&(-7i16).to_be_bytes());
        let sample = RawImuSample::from_register_block(&block);
        assert_eq!(sample.accel, [100, 0, -16_384]);
        assert_eq!(sample.gyro, [0, 0, -7]);
    }
}
