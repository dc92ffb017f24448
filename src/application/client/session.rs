use crate::domain::ports::PredictOutcome;

pub const UNREACHABLE_MESSAGE: &str = "Prediction service unreachable. Please try again later.";

/// Predictions CSV decoded for display
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Body as received, for saving to disk unchanged
    pub raw: Vec<u8>,
}

impl PredictionTable {
    pub fn parse(raw: Vec<u8>) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(raw.as_slice());
        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows, raw })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Numeric prediction column, skipping cells that do not parse.
    pub fn values(&self) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.get(1))
            .filter_map(|cell| cell.parse::<f64>().ok())
            .collect()
    }

    /// Counts of values in `bins` equal-width buckets over [0, 1], keyed by
    /// bucket center. Values outside the range land in the edge buckets.
    pub fn histogram(&self, bins: usize) -> Vec<(f64, usize)> {
        let bins = bins.max(1);
        let width = 1.0 / bins as f64;
        let mut counts = vec![0usize; bins];
        for v in self.values() {
            let idx = ((v / width).floor().max(0.0) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        counts
            .into_iter()
            .enumerate()
            .map(|(i, c)| ((i as f64 + 0.5) * width, c))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SampleState {
    #[default]
    NotFetched,
    Fetching,
    Ready(Vec<u8>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PredictionState {
    #[default]
    Idle,
    InFlight { file_name: String },
    Ready { file_name: String, table: PredictionTable },
    /// 422 from the service; holds its `detail`
    Rejected(String),
    Unreachable,
}

/// UI-toolkit independent session state.
#[derive(Debug, Default)]
pub struct ClientSession {
    sample: SampleState,
    prediction: PredictionState,
}

impl ClientSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&self) -> &SampleState {
        &self.sample
    }

    pub fn prediction(&self) -> &PredictionState {
        &self.prediction
    }

    /// The sample is fetched once per session, again only after a failure.
    pub fn needs_sample(&self) -> bool {
        matches!(self.sample, SampleState::NotFetched | SampleState::Failed(_))
    }

    pub fn begin_sample_fetch(&mut self) {
        self.sample = SampleState::Fetching;
    }

    pub fn on_sample(&mut self, result: Result<Vec<u8>, String>) {
        self.sample = match result {
            Ok(bytes) => SampleState::Ready(bytes),
            Err(reason) => SampleState::Failed(reason),
        };
    }

    pub fn sample_bytes(&self) -> Option<&[u8]> {
        match &self.sample {
            SampleState::Ready(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.prediction, PredictionState::InFlight { .. })
    }

    pub fn begin_prediction(&mut self, file_name: impl Into<String>) {
        self.prediction = PredictionState::InFlight {
            file_name: file_name.into(),
        };
    }

    pub fn on_prediction(&mut self, outcome: PredictOutcome) {
        let file_name = match &self.prediction {
            PredictionState::InFlight { file_name } => file_name.clone(),
            _ => String::new(),
        };

        self.prediction = match outcome {
            PredictOutcome::Predictions(raw) => match PredictionTable::parse(raw) {
                Ok(table) => PredictionState::Ready { file_name, table },
                Err(e) => {
                    tracing::warn!("Unreadable predictions body: {}", e);
                    PredictionState::Unreachable
                }
            },
            PredictOutcome::Rejected(detail) => PredictionState::Rejected(detail),
            PredictOutcome::Unreachable(reason) => {
                tracing::warn!("Prediction request failed: {}", reason);
                PredictionState::Unreachable
            }
        };
    }

    pub fn table(&self) -> Option<&PredictionTable> {
        match &self.prediction {
            PredictionState::Ready { table, .. } => Some(table),
            _ => None,
        }
    }

    /// Message to show for the current prediction state, if any.
    pub fn status_message(&self) -> Option<String> {
        match &self.prediction {
            PredictionState::Idle => None,
            PredictionState::InFlight { file_name } => Some(format!("Predicting {file_name}...")),
            PredictionState::Ready { file_name, table } => {
                Some(format!("{} predictions for {}", table.len(), file_name))
            }
            PredictionState::Rejected(detail) => Some(detail.clone()),
            PredictionState::Unreachable => Some(UNREACHABLE_MESSAGE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_cached_after_success() {
        let mut session = ClientSession::new();
        assert!(session.needs_sample());

        session.begin_sample_fetch();
        assert!(!session.needs_sample());

        session.on_sample(Err("connection refused".into()));
        assert!(session.needs_sample());

        session.begin_sample_fetch();
        session.on_sample(Ok(b"ID_code\n".to_vec()));
        assert!(!session.needs_sample());
        assert_eq!(session.sample_bytes(), Some(b"ID_code\n".as_slice()));
    }

    #[test]
    fn test_successful_prediction_builds_table() {
        let mut session = ClientSession::new();
        session.begin_prediction("upload.csv");
        assert!(session.is_busy());

        session.on_prediction(PredictOutcome::Predictions(
            b"ID_code,target\ntest_0,0.125\ntest_1,0.900\n".to_vec(),
        ));
        let table = session.table().unwrap();
        assert_eq!(table.headers, vec!["ID_code", "target"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.values(), vec![0.125, 0.9]);
        let hist = table.histogram(2);
        assert_eq!(hist, vec![(0.25, 1), (0.75, 1)]);
        assert_eq!(
            session.status_message().unwrap(),
            "2 predictions for upload.csv"
        );
    }

    #[test]
    fn test_rejection_shows_detail() {
        let mut session = ClientSession::new();
        session.begin_prediction("bad.csv");
        session.on_prediction(PredictOutcome::Rejected(
            "Wrong file format or missing columns".into(),
        ));
        assert_eq!(
            session.prediction(),
            &PredictionState::Rejected("Wrong file format or missing columns".into())
        );
        assert!(session.table().is_none());
    }

    #[test]
    fn test_other_failures_are_unreachable() {
        let mut session = ClientSession::new();
        session.begin_prediction("x.csv");
        session.on_prediction(PredictOutcome::Unreachable("HTTP 502".into()));
        assert_eq!(session.prediction(), &PredictionState::Unreachable);
        assert_eq!(session.status_message().unwrap(), UNREACHABLE_MESSAGE);
        assert!(!session.is_busy());
    }
}
