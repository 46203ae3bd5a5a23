//! Titanic passenger records and their binary encoding.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};
use tracing::{debug, info};

/// Column names of the encoded feature matrix, in order.
pub const FEATURE_NAMES: [&str; 11] = [
    "sex_female",
    "pclass_1",
    "pclass_2",
    "pclass_3",
    "age_above",
    "fare_above",
    "has_sibsp",
    "has_parch",
    "embarked_c",
    "embarked_q",
    "embarked_s",
];

/// One row of the Kaggle Titanic training CSV. Columns not listed here
/// (`Name`, `Ticket`, `Cabin`) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Passenger {
    #[serde(rename = "PassengerId")]
    pub id: u32,
    #[serde(rename = "Survived")]
    pub survived: u8,
    #[serde(rename = "Pclass")]
    pub class: u8,
    #[serde(rename = "Sex")]
    pub sex: String,
    #[serde(rename = "Age")]
    pub age: Option<f64>,
    #[serde(rename = "SibSp")]
    pub siblings_spouses: u32,
    #[serde(rename = "Parch")]
    pub parents_children: u32,
    #[serde(rename = "Fare")]
    pub fare: Option<f64>,
    #[serde(rename = "Embarked")]
    pub embarked: Option<String>,
}

/// Cut points for the two continuous columns. `None` bins at the median of
/// the values present in the data being encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Binning {
    pub age_threshold: Option<f64>,
    pub fare_threshold: Option<f64>,
}

/// Passengers turned into a 0/1 matrix plus survival labels.
#[derive(Debug, Clone)]
pub struct EncodedDataset {
    pub ids: Vec<u32>,
    pub features: Vec<Vec<u8>>,
    pub labels: Vec<u8>,
    /// Threshold actually used for `age_above`.
    pub age_threshold: f64,
    /// Threshold actually used for `fare_above`.
    pub fare_threshold: f64,
}

impl EncodedDataset {
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

pub fn load_passengers<P: AsRef<Path>>(path: P) -> Result<Vec<Passenger>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let passengers =
        read_passengers(file).with_context(|| format!("failed to read {}", path.display()))?;

    info!(path = %path.display(), passengers = passengers.len(), "loaded passengers");
    Ok(passengers)
}

pub fn read_passengers<R: Read>(reader: R) -> Result<Vec<Passenger>> {
    let mut reader = csv::Reader::from_reader(reader);

    let mut passengers = Vec::new();
    for (i, record) in reader.deserialize().enumerate() {
        let passenger: Passenger =
            record.with_context(|| format!("malformed passenger record {}", i + 1))?;
        passengers.push(passenger);
    }

    Ok(passengers)
}

/// Encodes every passenger into [`FEATURE_NAMES`] order.
///
/// Missing ages and fares encode as 0 in their binned indicator.
pub fn encode(passengers: &[Passenger], binning: &Binning) -> Result<EncodedDataset> {
    let age_threshold = match binning.age_threshold {
        Some(threshold) => threshold,
        None => median(passengers.iter().filter_map(|p| p.age))
            .context("no Age values to derive a binning threshold from")?,
    };
    let fare_threshold = match binning.fare_threshold {
        Some(threshold) => threshold,
        None => median(passengers.iter().filter_map(|p| p.fare))
            .context("no Fare values to derive a binning threshold from")?,
    };
    debug!(age_threshold, fare_threshold, "binning continuous columns");

    let mut ids = Vec::with_capacity(passengers.len());
    let mut features = Vec::with_capacity(passengers.len());
    let mut labels = Vec::with_capacity(passengers.len());
    for passenger in passengers {
        let row = encode_one(passenger, age_threshold, fare_threshold)
            .with_context(|| format!("passenger {}", passenger.id))?;
        if passenger.survived > 1 {
            bail!(
                "passenger {}: Survived must be 0 or 1, got {}",
                passenger.id,
                passenger.survived
            );
        }

        ids.push(passenger.id);
        features.push(row);
        labels.push(passenger.survived);
    }

    Ok(EncodedDataset {
        ids,
        features,
        labels,
        age_threshold,
        fare_threshold,
    })
}

fn encode_one(passenger: &Passenger, age_threshold: f64, fare_threshold: f64) -> Result<Vec<u8>> {
    let female = match passenger.sex.trim() {
        "female" => 1,
        "male" => 0,
        other => bail!("unknown sex {other:?}"),
    };

    if !(1..=3).contains(&passenger.class) {
        bail!("Pclass must be 1, 2 or 3, got {}", passenger.class);
    }

    let port = passenger.embarked.as_deref().map(str::trim);
    if let Some(other) = port.filter(|p| !matches!(*p, "C" | "Q" | "S")) {
        bail!("unknown embarkation port {other:?}");
    }

    let above = |value: Option<f64>, threshold: f64| u8::from(value.is_some_and(|v| v > threshold));

    Ok(vec![
        female,
        u8::from(passenger.class == 1),
        u8::from(passenger.class == 2),
        u8::from(passenger.class == 3),
        above(passenger.age, age_threshold),
        above(passenger.fare, fare_threshold),
        u8::from(passenger.siblings_spouses > 0),
        u8::from(passenger.parents_children > 0),
        u8::from(port == Some("C")),
        u8::from(port == Some("Q")),
        u8::from(port == Some("S")),
    ])
}

fn median(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut values: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SAMPLE: &str = "\
PassengerId,Survived,Pclass,Name,Sex,Age,SibSp,Parch,Ticket,Fare,Cabin,Embarked
1,0,3,\"Braund, Mr. Owen Harris\",male,22,1,0,A/5 21171,7.25,,S
2,1,1,\"Cumings, Mrs. John Bradley (Florence Briggs Thayer)\",female,38,1,0,PC 17599,71.2833,C85,C
3,1,3,\"Heikkinen, Miss. Laina\",female,26,0,0,STON/O2. 3101282,7.925,,S
4,1,1,\"Futrelle, Mrs. Jacques Heath (Lily May Peel)\",female,35,1,0,113803,53.1,C123,S
6,0,3,\"Moran, Mr. James\",male,,0,0,330877,8.4583,,Q
62,1,1,\"Icard, Miss. Amelie\",female,38,0,0,113572,80,B28,
";

    #[test]
    fn reads_kaggle_layout() {
        let passengers = read_passengers(SAMPLE.as_bytes()).unwrap();
        assert_eq!(passengers.len(), 6);
        assert_eq!(
            passengers[0],
            Passenger {
                id: 1,
                survived: 0,
                class: 3,
                sex: "male".to_string(),
                age: Some(22.0),
                siblings_spouses: 1,
                parents_children: 0,
                fare: Some(7.25),
                embarked: Some("S".to_string()),
            }
        );
        assert_eq!(passengers[4].age, None);
        assert_eq!(passengers[5].embarked, None);
    }

    #[test]
    fn rejects_malformed_rows() {
        let csv = "PassengerId,Survived,Pclass,Sex,Age,SibSp,Parch,Fare,Embarked\n1,yes,3,male,22,1,0,7.25,S\n";
        let err = read_passengers(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn encodes_with_median_thresholds() {
        let passengers = read_passengers(SAMPLE.as_bytes()).unwrap();
        let data = encode(&passengers, &Binning::default()).unwrap();

        // Ages 22, 26, 35, 38, 38 -> 35; fares sorted 7.25 .. 80 -> (8.4583 + 53.1) / 2.
        assert_abs_diff_eq!(data.age_threshold, 35.0);
        assert_abs_diff_eq!(data.fare_threshold, (8.4583 + 53.1) / 2.0);

        assert_eq!(data.ids, vec![1, 2, 3, 4, 6, 62]);
        assert_eq!(data.labels, vec![0, 1, 1, 1, 0, 1]);
        assert_eq!(data.features[0], vec![0, 0, 0, 1, 0, 0, 1, 0, 0, 0, 1]);
        assert_eq!(data.features[1], vec![1, 1, 0, 0, 1, 1, 1, 0, 1, 0, 0]);
        // Missing age bins low, Queenstown set.
        assert_eq!(data.features[4], vec![0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0]);
        // Missing port leaves all three indicators clear.
        assert_eq!(data.features[5][8..].to_vec(), vec![0, 0, 0]);
        assert!(data.features.iter().all(|row| row.len() == FEATURE_NAMES.len()));
    }

    #[test]
    fn explicit_thresholds_win() {
        let passengers = read_passengers(SAMPLE.as_bytes()).unwrap();
        let binning = Binning {
            age_threshold: Some(18.0),
            fare_threshold: Some(100.0),
        };
        let data = encode(&passengers, &binning).unwrap();

        assert_eq!(data.age_threshold, 18.0);
        assert!(data.features.iter().all(|row| row[5] == 0));
        assert_eq!(data.features[0][4], 1);
    }

    #[test]
    fn rejects_unknown_categories() {
        let mut passengers = read_passengers(SAMPLE.as_bytes()).unwrap();
        passengers[2].sex = "unknown".to_string();
        let err = encode(&passengers, &Binning::default()).unwrap_err();
        assert!(format!("{err:#}").contains("passenger 3"));

        let mut passengers = read_passengers(SAMPLE.as_bytes()).unwrap();
        passengers[0].class = 4;
        assert!(encode(&passengers, &Binning::default()).is_err());

        let mut passengers = read_passengers(SAMPLE.as_bytes()).unwrap();
        passengers[0].embarked = Some("X".to_string());
        assert!(encode(&passengers, &Binning::default()).is_err());

        let mut passengers = read_passengers(SAMPLE.as_bytes()).unwrap();
        passengers[0].survived = 2;
        assert!(encode(&passengers, &Binning::default()).is_err());
    }

    #[test]
    fn needs_some_values_to_derive_a_threshold() {
        let mut passengers = read_passengers(SAMPLE.as_bytes()).unwrap();
        passengers.iter_mut().for_each(|p| p.age = None);
        assert!(encode(&passengers, &Binning::default()).is_err());

        let binning = Binning {
            age_threshold: Some(30.0),
            fare_threshold: None,
        };
        assert!(encode(&passengers, &binning).is_ok());
    }

    #[test]
    fn median_handles_odd_and_even_counts() {
        assert_eq!(median([3.0, 1.0, 2.0].into_iter()), Some(2.0));
        assert_eq!(median([4.0, 1.0, 3.0, 2.0].into_iter()), Some(2.5));
        assert_eq!(median(std::iter::empty()), None);
    }
}
