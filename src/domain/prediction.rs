// ============================================================
// Layer 3 — Prediction Contract
// ============================================================
// Wire types of POST /predict.
//
//   request:  {"features": [[f64, ...], ...]}
//   response: {"predictions": [i64, ...], "probabilities": [f64, ...]}
//
// The response vectors are parallel to the request rows.

use serde::{Deserialize, Serialize};

/// One or more feature rows to classify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub features: Vec<Vec<f64>>,
}

impl PredictionRequest {
    #[cfg(test)]
    pub fn new(features: Vec<Vec<f64>>) -> Self {
        Self { features }
    }
}

/// Per-row class labels and positive-class probabilities, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predictions:   Vec<i64>,
    pub probabilities: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let req: PredictionRequest =
            serde_json::from_str(r#"{"features": [[1.0, 2.0], [3.5, -4.0]]}"#).unwrap();
        assert_eq!(req.features, vec![vec![1.0, 2.0], vec![3.5, -4.0]]);
    }

    #[test]
    fn test_non_numeric_feature_rejected() {
        let res = serde_json::from_str::<PredictionRequest>(r#"{"features": [["a"]]}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let resp = PredictionResponse {
            predictions:   vec![1, 0],
            probabilities: vec![0.75, 0.25],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"predictions": [1, 0], "probabilities": [0.75, 0.25]})
        );
    }
}
