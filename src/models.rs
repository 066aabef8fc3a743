use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::config::LoadPolicy;
use crate::error::{FieldError, ValidationErrors};
use crate::inference::ArtifactFormat;

pub const FEATURE_COUNT: usize = 23;

/// Declares the feature record once: struct fields, wire names in column
/// order, and the array view used to build the model row.
macro_rules! feature_record {
    ($($field:ident => $name:literal),+ $(,)?) => {
        /// One employee to score. Field order is the column order the model
        /// was trained on.
        #[derive(Debug, Clone, PartialEq)]
        pub struct FeatureRecord {
            $(
                pub $field: f64,
            )+
        }

        pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [$($name),+];

        impl FeatureRecord {
            pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
                [$(self.$field),+]
            }

            fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
                let [$($field),+] = values;
                FeatureRecord { $($field),+ }
            }
        }
    };
}

feature_record! {
    age => "num__Age",
    environment_satisfaction => "num__EnvironmentSatisfaction",
    job_involvement => "num__JobInvolvement",
    job_level => "num__JobLevel",
    job_satisfaction => "num__JobSatisfaction",
    monthly_income => "num__MonthlyIncome",
    stock_option_level => "num__StockOptionLevel",
    total_working_years => "num__TotalWorkingYears",
    years_at_company => "num__YearsAtCompany",
    years_in_current_role => "num__YearsInCurrentRole",
    years_with_curr_manager => "num__YearsWithCurrManager",
    travel_frequently => "oneHot__x0_Travel_Frequently",
    research_and_development => "oneHot__x1_Research_and_Development",
    laboratory_technician => "oneHot__x4_Laboratory_Technician",
    manager => "oneHot__x4_Manager",
    manufacturing_director => "oneHot__x4_Manufacturing_Director",
    research_director => "oneHot__x4_Research_Director",
    sales_representative => "oneHot__x4_Sales_Representative",
    divorced => "oneHot__x5_Divorced",
    married => "oneHot__x5_Married",
    single => "oneHot__x5_Single",
    overtime_no => "oneHot__x6_No",
    overtime_yes => "oneHot__x6_Yes",
}

impl FeatureRecord {
    /// Validates a decoded JSON body against the record schema.
    ///
    /// Every field is checked so the caller gets one entry per offending
    /// field. Numbers, numeric strings and booleans coerce to floats; extra
    /// keys are ignored.
    pub fn from_json(body: Value) -> Result<Self, ValidationErrors> {
        let Value::Object(map) = body else {
            return Err(ValidationErrors::single(FieldError::not_a_dict()));
        };

        let mut values = [0.0; FEATURE_COUNT];
        let mut errors = Vec::new();
        for (slot, name) in values.iter_mut().zip(FEATURE_NAMES) {
            match map.get(name) {
                None => errors.push(FieldError::missing(name)),
                Some(value) => match coerce_float(value) {
                    Ok(v) => *slot = v,
                    Err(error) => errors.push(error.at(name)),
                },
            }
        }

        if errors.is_empty() {
            Ok(Self::from_array(values))
        } else {
            Err(ValidationErrors { detail: errors })
        }
    }
}

enum CoercionError {
    Null,
    NotAFloat,
}

impl CoercionError {
    fn at(self, field: &str) -> FieldError {
        match self {
            CoercionError::Null => FieldError::none_not_allowed(field),
            CoercionError::NotAFloat => FieldError::not_a_float(field),
        }
    }
}

fn coerce_float(value: &Value) -> Result<f64, CoercionError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or(CoercionError::NotAFloat),
        Value::String(s) => s.trim().parse().map_err(|_| CoercionError::NotAFloat),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Null => Err(CoercionError::Null),
        Value::Array(_) | Value::Object(_) => Err(CoercionError::NotAFloat),
    }
}

/// The single-row table handed to a prediction engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: [f64; FEATURE_COUNT],
}

impl FeatureRow {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn columns(&self) -> &'static [&'static str; FEATURE_COUNT] {
        &FEATURE_NAMES
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn to_f32(&self) -> [f32; FEATURE_COUNT] {
        self.values.map(|v| v as f32)
    }
}

impl From<&FeatureRecord> for FeatureRow {
    fn from(record: &FeatureRecord) -> Self {
        Self::new(record.to_array())
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// What `/api/model-info` reports. Built without loading the artifact.
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub artifact_path: String,
    pub artifact_format: Option<ArtifactFormat>,
    pub artifact_present: bool,
    pub load_policy: LoadPolicy,
    pub feature_count: usize,
    pub features: Vec<&'static str>,
    pub version: &'static str,
}

impl ModelInfo {
    pub fn describe(path: &Path, load_policy: LoadPolicy) -> Self {
        ModelInfo {
            artifact_path: path.display().to_string(),
            artifact_format: ArtifactFormat::from_path(path).ok(),
            artifact_present: path.is_file(),
            load_policy,
            feature_count: FEATURE_COUNT,
            features: FEATURE_NAMES.to_vec(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::{json, Map};

    use super::*;

    fn full_body() -> Map<String, Value> {
        FEATURE_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), json!(i as f64)))
            .collect()
    }

    #[test]
    fn feature_names_are_unique() {
        let unique: HashSet<_> = FEATURE_NAMES.iter().collect();
        assert_eq!(unique.len(), FEATURE_COUNT);
        assert_eq!(FEATURE_NAMES[0], "num__Age");
        assert_eq!(FEATURE_NAMES[FEATURE_COUNT - 1], "oneHot__x6_Yes");
    }

    #[test]
    fn row_preserves_declaration_order() {
        let record = FeatureRecord::from_json(Value::Object(full_body())).unwrap();
        let row = FeatureRow::from(&record);
        for (i, value) in row.values().iter().enumerate() {
            assert_eq!(*value, i as f64);
        }
        assert_eq!(record.age, 0.0);
        assert_eq!(record.overtime_yes, 22.0);
    }

    #[test]
    fn numeric_strings_and_integers_are_coerced() {
        let mut body = full_body();
        body.insert("num__Age".into(), json!(" 35.5 "));
        body.insert("num__JobLevel".into(), json!(2));
        body.insert("oneHot__x6_Yes".into(), json!(true));
        let record = FeatureRecord::from_json(Value::Object(body)).unwrap();
        assert_eq!(record.age, 35.5);
        assert_eq!(record.job_level, 2.0);
        assert_eq!(record.overtime_yes, 1.0);
    }

    #[test]
    fn extra_keys_are_ignored() {
        let mut body = full_body();
        body.insert("EmployeeNumber".into(), json!("abc"));
        assert!(FeatureRecord::from_json(Value::Object(body)).is_ok());
    }

    #[test]
    fn every_offending_field_is_reported() {
        let mut body = full_body();
        body.remove("num__MonthlyIncome");
        body.insert("oneHot__x5_Single".into(), json!("single"));
        body.insert("num__Age".into(), Value::Null);

        let err = FeatureRecord::from_json(Value::Object(body)).unwrap_err();
        let kinds: Vec<_> = err
            .detail
            .iter()
            .map(|e| (e.loc[1].as_str(), e.kind.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("num__Age", "type_error.none.not_allowed"),
                ("num__MonthlyIncome", "value_error.missing"),
                ("oneHot__x5_Single", "type_error.float"),
            ]
        );
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = FeatureRecord::from_json(json!([1.0, 2.0])).unwrap_err();
        assert_eq!(err.detail.len(), 1);
        assert_eq!(err.detail[0].loc, vec!["body".to_string()]);
        assert_eq!(err.detail[0].kind, "type_error.dict");
    }
}
