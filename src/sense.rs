use crate::error::SenseError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

// Sense HAT sensors as exposed by the kernel IIO drivers. Channel values
// follow the sysfs contract: processed = (raw + offset) * scale.
const IIO_DEVICES_ROOT: &str = "/sys/bus/iio/devices";

const HUMIDITY_SENSOR: &str = "hts221";
const PRESSURE_SENSOR: &str = "lps25h";
const ACCEL_SENSOR: &str = "lsm9ds1_accel";
const MAGN_SENSOR: &str = "lsm9ds1_magn";

const STANDARD_GRAVITY: f64 = 9.80665;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

pub struct SenseHat {
    humidity_dev: PathBuf,
    pressure_dev: PathBuf,
    accel_dev: PathBuf,
    magn_dev: PathBuf,
}

impl SenseHat {
    pub fn open() -> Result<Self, SenseError> {
        Self::open_at(Path::new(IIO_DEVICES_ROOT))
    }

    pub fn open_at(root: &Path) -> Result<Self, SenseError> {
        let mut humidity_dev = None;
        let mut pressure_dev = None;
        let mut accel_dev = None;
        let mut magn_dev = None;

        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(SenseError::HatNotFound),
            Err(err) => return Err(SenseError::Io(err)),
        };

        for entry in entries {
            let path = entry?.path();
            let name = match fs::read_to_string(path.join("name")) {
                Ok(name) => name,
                Err(_) => continue,
            };
            match name.trim() {
                HUMIDITY_SENSOR => humidity_dev = Some(path),
                PRESSURE_SENSOR => pressure_dev = Some(path),
                ACCEL_SENSOR => accel_dev = Some(path),
                MAGN_SENSOR => magn_dev = Some(path),
                _ => {}
            }
        }

        match (humidity_dev, pressure_dev, accel_dev, magn_dev) {
            (Some(humidity_dev), Some(pressure_dev), Some(accel_dev), Some(magn_dev)) => Ok(Self {
                humidity_dev,
                pressure_dev,
                accel_dev,
                magn_dev,
            }),
            _ => Err(SenseError::HatNotFound),
        }
    }

    // Temperature from the humidity sensor, degrees Celsius. The IIO value is
    // millidegrees after scaling.
    pub fn temperature(&self) -> Result<f64, SenseError> {
        Ok(read_channel(&self.humidity_dev, "in_temp")? / 1000.0)
    }

    // Relative humidity in percent; IIO reports milli-percent.
    pub fn humidity(&self) -> Result<f64, SenseError> {
        Ok(read_channel(&self.humidity_dev, "in_humidityrelative")? / 1000.0)
    }

    // Pressure in millibars; IIO reports kilopascals.
    pub fn pressure(&self) -> Result<f64, SenseError> {
        Ok(read_channel(&self.pressure_dev, "in_pressure")? * 10.0)
    }

    // Acceleration in g; IIO reports m/s^2.
    pub fn accelerometer(&self) -> Result<Acceleration, SenseError> {
        Ok(Acceleration {
            x: read_axis(&self.accel_dev, "in_accel", 'x')? / STANDARD_GRAVITY,
            y: read_axis(&self.accel_dev, "in_accel", 'y')? / STANDARD_GRAVITY,
            z: read_axis(&self.accel_dev, "in_accel", 'z')? / STANDARD_GRAVITY,
        })
    }

    // Magnetic field in gauss.
    pub fn magnetometer(&self) -> Result<[f64; 3], SenseError> {
        Ok([
            read_axis(&self.magn_dev, "in_magn", 'x')?,
            read_axis(&self.magn_dev, "in_magn", 'y')?,
            read_axis(&self.magn_dev, "in_magn", 'z')?,
        ])
    }

    pub fn orientation(&self) -> Result<Orientation, SenseError> {
        let accel = self.accelerometer()?;
        let magn = self.magnetometer()?;
        Ok(orientation_from_vectors(&accel, &magn))
    }
}

// Pitch and roll from the gravity vector, yaw as the tilt-compensated
// magnetometer heading. Angles in degrees, normalized into [0, 360).
pub fn orientation_from_vectors(accel: &Acceleration, magn: &[f64; 3]) -> Orientation {
    let roll = accel.y.atan2(accel.z);
    let pitch = (-accel.x).atan2((accel.y * accel.y + accel.z * accel.z).sqrt());

    let (sin_r, cos_r) = (roll.sin(), roll.cos());
    let (sin_p, cos_p) = (pitch.sin(), pitch.cos());
    let mx = magn[0] * cos_p + magn[1] * sin_p * sin_r + magn[2] * sin_p * cos_r;
    let my = magn[1] * cos_r - magn[2] * sin_r;
    let yaw = (-my).atan2(mx);

    Orientation {
        pitch: normalize_degrees(pitch.to_degrees()),
        roll: normalize_degrees(roll.to_degrees()),
        yaw: normalize_degrees(yaw.to_degrees()),
    }
}

pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

fn read_channel(dev: &Path, channel: &str) -> Result<f64, SenseError> {
    let raw = read_attribute(&dev.join(format!("{channel}_raw")))?;
    let offset = read_optional_attribute(&dev.join(format!("{channel}_offset")))?.unwrap_or(0.0);
    let scale = read_optional_attribute(&dev.join(format!("{channel}_scale")))?.unwrap_or(1.0);
    Ok((raw + offset) * scale)
}

// Axis channels share one scale attribute on these parts, but some kernels
// expose a per-axis one instead.
fn read_axis(dev: &Path, prefix: &str, axis: char) -> Result<f64, SenseError> {
    let raw = read_attribute(&dev.join(format!("{prefix}_{axis}_raw")))?;
    let scale = match read_optional_attribute(&dev.join(format!("{prefix}_scale")))? {
        Some(scale) => Some(scale),
        None => read_optional_attribute(&dev.join(format!("{prefix}_{axis}_scale")))?,
    };
    Ok(raw * scale.unwrap_or(1.0))
}

fn read_attribute(path: &Path) -> Result<f64, SenseError> {
    match read_optional_attribute(path)? {
        Some(value) => Ok(value),
        None => Err(SenseError::MissingAttribute(path.to_path_buf())),
    }
}

fn read_optional_attribute(path: &Path) -> Result<Option<f64>, SenseError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(SenseError::Io(err)),
    };
    match raw.trim().parse() {
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(SenseError::InvalidAttribute {
            path: path.to_path_buf(),
            value: raw.trim().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write_attr(dir: &Path, name: &str, value: &str) {
        let mut file = File::create(dir.join(name)).expect("create attr");
        writeln!(file, "{}", value).expect("write attr");
    }

    fn fake_hat(root: &Path) {
        for (index, (name, attrs)) in [
            (
                HUMIDITY_SENSOR,
                vec![
                    ("in_temp_raw", "640"),
                    ("in_temp_offset", "16000"),
                    ("in_temp_scale", "1.5"),
                    ("in_humidityrelative_raw", "20000"),
                    ("in_humidityrelative_offset", "20500"),
                    ("in_humidityrelative_scale", "1.2"),
                ],
            ),
            (
                PRESSURE_SENSOR,
                vec![("in_pressure_raw", "413894"), ("in_pressure_scale", "0.000244140625")],
            ),
            (
                ACCEL_SENSOR,
                vec![
                    ("in_accel_x_raw", "0"),
                    ("in_accel_y_raw", "0"),
                    ("in_accel_z_raw", "16384"),
                    ("in_accel_scale", "0.000598550415"),
                ],
            ),
            (
                MAGN_SENSOR,
                vec![
                    ("in_magn_x_raw", "2000"),
                    ("in_magn_y_raw", "0"),
                    ("in_magn_z_raw", "3000"),
                    ("in_magn_scale", "0.0001"),
                ],
            ),
        ]
        .into_iter()
        .enumerate()
        {
            let dev = root.join(format!("iio:device{}", index));
            fs::create_dir_all(&dev).expect("create dev");
            write_attr(&dev, "name", name);
            for (attr, value) in attrs {
                write_attr(&dev, attr, value);
            }
        }
    }

    #[test]
    fn reads_scaled_channels_from_sysfs_tree() {
        let root = std::env::temp_dir().join("ncs_usb_oxidized_sense_test");
        fs::remove_dir_all(&root).ok();
        fake_hat(&root);

        let hat = SenseHat::open_at(&root).expect("open");

        // (640 + 16000) * 1.5 millidegrees = 24.96 C
        let temp = hat.temperature().expect("temp");
        assert!((temp - 24.96).abs() < 1e-9);

        // (20000 + 20500) * 1.2 milli-percent = 48.6 %RH
        let humidity = hat.humidity().expect("humidity");
        assert!((humidity - 48.6).abs() < 1e-9);

        // 413894 * 0.000244140625 kPa * 10 = 1010.48 mbar
        let pressure = hat.pressure().expect("pressure");
        assert!((pressure - 1010.484).abs() < 0.01);

        // 16384 * 0.000598550415 m/s^2 is one g on the z axis.
        let accel = hat.accelerometer().expect("accel");
        assert!(accel.x.abs() < 1e-9);
        assert!((accel.z - 1.0).abs() < 1e-3);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_sensor_is_hat_not_found() {
        let root = std::env::temp_dir().join("ncs_usb_oxidized_sense_missing_test");
        fs::remove_dir_all(&root).ok();
        let dev = root.join("iio:device0");
        fs::create_dir_all(&dev).expect("create dev");
        write_attr(&dev, "name", HUMIDITY_SENSOR);

        assert!(matches!(
            SenseHat::open_at(&root),
            Err(SenseError::HatNotFound)
        ));
        assert!(matches!(
            SenseHat::open_at(&root.join("nope")),
            Err(SenseError::HatNotFound)
        ));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn level_device_has_zero_pitch_and_roll() {
        let accel = Acceleration {
            x: 0.0,
            y: 0.0,
            z: 1.0,
        };
        let o = orientation_from_vectors(&accel, &[0.3, 0.0, 0.4]);
        assert!(o.pitch.abs() < 1e-9);
        assert!(o.roll.abs() < 1e-9);
        assert!(o.yaw.abs() < 1e-9);
    }

    #[test]
    fn right_angle_roll_and_pitch() {
        let rolled = Acceleration {
            x: 0.0,
            y: 1.0,
            z: 0.0,
        };
        let o = orientation_from_vectors(&rolled, &[0.3, 0.0, 0.0]);
        assert!((o.roll - 90.0).abs() < 1e-9);

        let pitched = Acceleration {
            x: 1.0,
            y: 0.0,
            z: 0.0,
        };
        let o = orientation_from_vectors(&pitched, &[0.3, 0.0, 0.0]);
        assert!((o.pitch - 270.0).abs() < 1e-9);
    }

    #[test]
    fn heading_rotates_with_the_field() {
        let level = Acceleration {
            x: 0.0,
            y: 0.0,
            z: 1.0,
        };
        let east = orientation_from_vectors(&level, &[0.0, -0.3, 0.0]);
        assert!((east.yaw - 90.0).abs() < 1e-9);
    }

    #[test]
    fn normalizes_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(450.0), 90.0);
    }
}
