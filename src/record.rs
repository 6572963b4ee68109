use chrono::Utc;
use serde::Serialize;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn timestamp_now() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

// Field order is the emitted key order; downstream consumers key on it.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationRecord {
    pub label1: String,
    pub label2: String,
    pub label3: String,
    pub label4: String,
    pub label5: String,
    pub currenttime: String,
    pub host: String,
    pub cputemp: f64,
    pub ipaddress: Option<String>,
    pub starttime: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SensedRecord {
    pub cputemp2: f64,
    pub temp: f64,
    pub tempf: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub memory: f64,
    pub diskfree: String,
    pub label1: String,
    pub label2: String,
    pub label3: String,
    pub label4: String,
    pub label5: String,
    pub currenttime: String,
    pub host: String,
    pub cputemp: f64,
    pub ipaddress: Option<String>,
    pub starttime: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn sample_labels() -> [String; 5] {
        [
            "n02123045 tabby, tabby cat".to_string(),
            "n02123159 tiger cat".to_string(),
            "n02124075 Egyptian cat".to_string(),
            "n02127052 lynx, catamount".to_string(),
            "n02128385 leopard, Panthera pardus".to_string(),
        ]
    }

    fn object_keys(value: &serde_json::Value) -> BTreeSet<String> {
        value
            .as_object()
            .expect("record serializes to an object")
            .keys()
            .cloned()
            .collect()
    }

    #[test]
    fn classification_record_has_exactly_the_documented_keys() {
        let [label1, label2, label3, label4, label5] = sample_labels();
        let record = ClassificationRecord {
            label1,
            label2,
            label3,
            label4,
            label5,
            currenttime: "2017-12-28 14:00:05".to_string(),
            host: "raspberrypi".to_string(),
            cputemp: 48.0,
            ipaddress: Some("192.168.1.20".to_string()),
            starttime: "2017-12-28 14:00:00".to_string(),
        };

        let value = serde_json::to_value(&record).expect("serialize");
        let expected: BTreeSet<String> = [
            "label1",
            "label2",
            "label3",
            "label4",
            "label5",
            "currenttime",
            "host",
            "cputemp",
            "ipaddress",
            "starttime",
        ]
        .iter()
        .map(|k| k.to_string())
        .collect();
        assert_eq!(object_keys(&value), expected);
    }

    #[test]
    fn sensed_record_has_exactly_the_documented_keys() {
        let [label1, label2, label3, label4, label5] = sample_labels();
        let record = SensedRecord {
            cputemp2: 48.23,
            temp: 24.96,
            tempf: 76.93,
            humidity: 48.6,
            pressure: 1010.5,
            pitch: 0.0,
            roll: 0.0,
            yaw: 90.0,
            x: 0.0,
            y: 0.0,
            z: 1.0,
            memory: 64.4,
            diskfree: "1234.5 MB".to_string(),
            label1,
            label2,
            label3,
            label4,
            label5,
            currenttime: "2017-12-28 14:00:05".to_string(),
            host: "raspberrypi".to_string(),
            cputemp: 48.0,
            ipaddress: None,
            starttime: "2017-12-28 14:00:00".to_string(),
        };

        let value = serde_json::to_value(&record).expect("serialize");
        let expected: BTreeSet<String> = [
            "cputemp2",
            "temp",
            "tempf",
            "humidity",
            "pressure",
            "pitch",
            "roll",
            "yaw",
            "x",
            "y",
            "z",
            "memory",
            "diskfree",
            "label1",
            "label2",
            "label3",
            "label4",
            "label5",
            "currenttime",
            "host",
            "cputemp",
            "ipaddress",
            "starttime",
        ]
        .iter()
        .map(|k| k.to_string())
        .collect();
        assert_eq!(object_keys(&value), expected);

        // A failed IP probe serializes as null, not as a missing key.
        assert!(value.get("ipaddress").expect("key present").is_null());
    }

    #[test]
    fn record_serializes_in_declaration_order() {
        let [label1, label2, label3, label4, label5] = sample_labels();
        let record = ClassificationRecord {
            label1,
            label2,
            label3,
            label4,
            label5,
            currenttime: "c".to_string(),
            host: "h".to_string(),
            cputemp: 1.0,
            ipaddress: None,
            starttime: "s".to_string(),
        };
        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.starts_with("{\"label1\""));
        assert!(json.ends_with("\"starttime\":\"s\"}"));
    }

    #[test]
    fn rounding_helpers() {
        assert_eq!(round_to(48.2345, 2), 48.23);
        assert_eq!(round_to(48.26, 1), 48.3);
        assert_eq!(round_to(-1.4, 0), -1.0);
        assert_eq!(fahrenheit(0.0), 32.0);
        assert_eq!(fahrenheit(100.0), 212.0);
        assert_eq!(round_to(fahrenheit(24.96), 2), 76.93);
    }
}
