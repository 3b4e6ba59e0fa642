use crate::config::{
    ACCEL_LSB_PER_G, CALIBRATION_GRACE_MS, CALIBRATION_PROGRESS_EVERY,
    CALIBRATION_RETRY_DELAY_MS, CALIBRATION_SAMPLES, CALIBRATION_WINDOW_MS,
};
use crate::hal::{CalibrationStorage, DelayOps, ImuSource, MonotonicClock};
use crate::orientation::{tilt_from_gravity, SensorBias};

pub const CALIBRATION_RECORD_LEN: usize = 64;
pub const CALIBRATION_MAGIC: u8 = 0xAB;
pub const CALIBRATION_VERSION: u8 = 1;
const FIELDS_OFFSET: usize = 2;
const FIELD_COUNT: usize = 9;

/// Attitude captured at calibration time; the zero for relative readouts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReferenceAttitude {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CalibrationRecord {
    pub bias: SensorBias,
    pub reference: ReferenceAttitude,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordError {
    Erased,
    BadMagic,
    BadVersion,
    BadChecksum,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationError {
    NoSamples,
}

impl CalibrationRecord {
    pub fn record_bytes(&self) -> [u8; CALIBRATION_RECORD_LEN] {
        let mut record = [0xFFu8; CALIBRATION_RECORD_LEN];
        record[0] = CALIBRATION_MAGIC;
        record[1] = CALIBRATION_VERSION;
        for (idx, value) in self.fields().iter().enumerate() {
            let at = FIELDS_OFFSET + idx * 4;
            record[at..at + 4].copy_from_slice(&value.to_le_bytes());
        }
        record[CALIBRATION_RECORD_LEN - 1] = checksum8(&record[..CALIBRATION_RECORD_LEN - 1]);
        record
    }

    pub fn from_record(record: &[u8; CALIBRATION_RECORD_LEN]) -> Result<Self, RecordError> {
        if record.iter().all(|&byte| byte == 0xFF) {
            return Err(RecordError::Erased);
        }
        if record[0] != CALIBRATION_MAGIC {
            return Err(RecordError::BadMagic);
        }
        if record[1] != CALIBRATION_VERSION {
            return Err(RecordError::BadVersion);
        }
        if record[CALIBRATION_RECORD_LEN - 1] != checksum8(&record[..CALIBRATION_RECORD_LEN - 1]) {
            return Err(RecordError::BadChecksum);
        }

        let mut fields = [0.0f32; FIELD_COUNT];
        for (idx, field) in fields.iter_mut().enumerate() {
            let at = FIELDS_OFFSET + idx * 4;
            *field = f32::from_le_bytes([
                record[at],
                record[at + 1],
                record[at + 2],
                record[at + 3],
            ]);
        }

        Ok(Self {
            bias: SensorBias {
                gyro: [fields[0], fields[1], fields[2]],
                accel: [fields[3], fields[4], fields[5]],
            },
            reference: ReferenceAttitude {
                pitch: fields[6],
                roll: fields[7],
                yaw: fields[8],
            },
        })
    }

    fn fields(&self) -> [f32; FIELD_COUNT] {
        [
            self.bias.gyro[0],
            self.bias.gyro[1],
            self.bias.gyro[2],
            self.bias.accel[0],
            self.bias.accel[1],
            self.bias.accel[2],
            self.reference.pitch,
            self.reference.roll,
            self.reference.yaw,
        ]
    }
}

/// Reads the persisted record. Anything other than a valid record is
/// treated as "not calibrated".
pub fn load_calibration<S: CalibrationStorage>(storage: &mut S) -> Option<CalibrationRecord> {
    let Ok(record) = storage.load() else {
        log::warn!("calibration: storage read failed");
        return None;
    };
    match CalibrationRecord::from_record(&record) {
        Ok(decoded) => Some(decoded),
        Err(RecordError::Erased) => None,
        Err(reason) => {
            log::warn!("calibration: ignoring stored record reason={:?}", reason);
            None
        }
    }
}

/// Blocks for up to the sampling window plus grace while averaging the IMU
/// at rest. `on_progress` is called every few collected samples.
pub fn calibrate<H, F>(
    hw: &mut H,
    current_yaw: f32,
    mut on_progress: F,
) -> Result<CalibrationRecord, CalibrationError>
where
    H: ImuSource + MonotonicClock + DelayOps,
    F: FnMut(u32),
{
    let mut gyro_sum = [0i64; 3];
    let mut accel_sum = [0i64; 3];
    let mut collected = 0u32;
    let started_ms = hw.now_ms();
    let deadline_ms = CALIBRATION_WINDOW_MS + CALIBRATION_GRACE_MS;

    while collected < CALIBRATION_SAMPLES
        && hw.now_ms().saturating_sub(started_ms) < deadline_ms
    {
        match hw.read_raw() {
            Ok(sample) => {
                for axis in 0..3 {
                    gyro_sum[axis] += i64::from(sample.gyro[axis]);
                    accel_sum[axis] += i64::from(sample.accel[axis]);
                }
                collected += 1;
                if collected % CALIBRATION_PROGRESS_EVERY == 0 {
                    on_progress(collected);
                }
            }
            Err(_) => hw.delay_ms(CALIBRATION_RETRY_DELAY_MS),
        }
    }

    if collected == 0 {
        return Err(CalibrationError::NoSamples);
    }

    let n = collected as f32;
    let gyro_mean = gyro_sum.map(|sum| sum as f32 / n);
    let accel_mean = accel_sum.map(|sum| sum as f32 / n);

    // Z carries 1g at rest; its bias is whatever remains after removing it.
    let accel_bias = [
        accel_mean[0],
        accel_mean[1],
        accel_mean[2] - ACCEL_LSB_PER_G,
    ];

    let ax = (accel_mean[0] - accel_bias[0]) / ACCEL_LSB_PER_G;
    let ay = (accel_mean[1] - accel_bias[1]) / ACCEL_LSB_PER_G;
    let az = (accel_mean[2] - accel_bias[2]) / ACCEL_LSB_PER_G;
    let (pitch_ref, roll_ref) = tilt_from_gravity(ax, ay, az);

    log::info!(
        "calibration: samples={} gyro_bias=({}, {}, {})",
        collected,
        gyro_mean[0],
        gyro_mean[1],
        gyro_mean[2]
    );

    Ok(CalibrationRecord {
        bias: SensorBias {
            gyro: gyro_mean,
            accel: accel_bias,
        },
        reference: ReferenceAttitude {
            pitch: pitch_ref,
            roll: roll_ref,
            yaw: current_yaw,
        },
    })
}

fn checksum8(bytes: &[u8]) -> u8 {
    let mut acc = 0x5Au8;
    for &byte in bytes {
        acc ^= byte.rotate_left(1);
    }
    acc
}
