//! User profile as seen by the matchers, plus parsing of loosely typed request payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::MatchError;
use crate::models::user::UserPreferences;

/// Request-scoped profile. Not persisted by the matching core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub target_roles: Vec<String>,
    pub skills: Vec<String>,
    pub experience_level: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
}

impl UserProfile {
    /// Text block for the lexical matcher: roles, skills, then experience level.
    pub fn lexical_text(&self) -> String {
        let mut parts: Vec<&str> = self
            .target_roles
            .iter()
            .chain(self.skills.iter())
            .map(String::as_str)
            .collect();
        if let Some(level) = &self.experience_level {
            parts.push(level);
        }
        parts.join(" ")
    }

    /// Text block for the semantic matcher: roles and skills only.
    /// Experience level is left out; it shifts embeddings toward seniority wording.
    pub fn semantic_text(&self) -> String {
        self.target_roles
            .iter()
            .chain(self.skills.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<&UserPreferences> for UserProfile {
    fn from(prefs: &UserPreferences) -> Self {
        UserProfile {
            target_roles: prefs.target_roles.clone(),
            skills: prefs.skills.clone(),
            experience_level: prefs.experience_level.clone(),
            salary_min: prefs.salary_min,
            salary_max: prefs.salary_max,
        }
    }
}

/// Preferences exactly as a client sent them; salary bounds are not yet validated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPreferences {
    #[serde(default)]
    pub desired_locations: Vec<String>,
    #[serde(default)]
    pub target_roles: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub salary_min: Option<Value>,
    #[serde(default)]
    pub salary_max: Option<Value>,
}

impl RawPreferences {
    /// Validates salary bounds and produces typed preferences.
    pub fn parse(self) -> Result<UserPreferences, MatchError> {
        let salary_min = parse_salary_bound("salary_min", self.salary_min.as_ref())?;
        let salary_max = parse_salary_bound("salary_max", self.salary_max.as_ref())?;

        if let (Some(min), Some(max)) = (salary_min, salary_max) {
            if min > max {
                return Err(MatchError::MalformedProfile(format!(
                    "salary_min ({min}) exceeds salary_max ({max})"
                )));
            }
        }

        Ok(UserPreferences {
            desired_locations: self.desired_locations,
            target_roles: self.target_roles,
            skills: self.skills,
            experience_level: self
                .experience_level
                .filter(|level| !level.trim().is_empty()),
            salary_min,
            salary_max,
        })
    }
}

/// Accepts a JSON number or numeric string; `null` and `""` mean "no bound".
fn parse_salary_bound(field: &str, value: Option<&Value>) -> Result<Option<f64>, MatchError> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        Some(v) => Err(MatchError::MalformedProfile(format!(
            "{field} must be a non-negative number, got {v}"
        ))),
        None => Err(MatchError::MalformedProfile(format!(
            "{field} must be numeric"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawPreferences {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_lexical_text_includes_experience_level() {
        let profile = UserProfile {
            target_roles: vec!["Data Engineer".to_string()],
            skills: vec!["Spark".to_string(), "Airflow".to_string()],
            experience_level: Some("Senior".to_string()),
            ..Default::default()
        };
        assert_eq!(profile.lexical_text(), "Data Engineer Spark Airflow Senior");
        assert_eq!(profile.semantic_text(), "Data Engineer Spark Airflow");
    }

    #[test]
    fn test_empty_profile_text_is_empty() {
        let profile = UserProfile::default();
        assert_eq!(profile.lexical_text(), "");
        assert_eq!(profile.semantic_text(), "");
    }

    #[test]
    fn test_salary_accepts_numbers_and_numeric_strings() {
        let prefs = raw(json!({"salary_min": 50000, "salary_max": "100,000"}))
            .parse()
            .unwrap();
        assert_eq!(prefs.salary_min, Some(50_000.0));
        assert_eq!(prefs.salary_max, Some(100_000.0));
    }

    #[test]
    fn test_null_and_empty_salary_mean_unbounded() {
        let prefs = raw(json!({"salary_min": null, "salary_max": ""})).parse().unwrap();
        assert_eq!(prefs.salary_min, None);
        assert_eq!(prefs.salary_max, None);
    }

    #[test]
    fn test_non_numeric_salary_is_malformed() {
        let err = raw(json!({"salary_min": "lots"})).parse().unwrap_err();
        assert!(matches!(err, MatchError::MalformedProfile(_)));

        let err = raw(json!({"salary_max": [1, 2]})).parse().unwrap_err();
        assert!(matches!(err, MatchError::MalformedProfile(_)));
    }

    #[test]
    fn test_negative_or_inverted_salary_is_malformed() {
        assert!(raw(json!({"salary_min": -1})).parse().is_err());
        assert!(raw(json!({"salary_min": 90000, "salary_max": 50000}))
            .parse()
            .is_err());
    }

    #[test]
    fn test_blank_experience_level_dropped() {
        let prefs = raw(json!({"experience_level": "  "})).parse().unwrap();
        assert_eq!(prefs.experience_level, None);
    }
}
