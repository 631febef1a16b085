//! Scalar validation rules for string and number fields

/// Length and presence rules for a string field.
///
/// Every rule carries its own user-facing message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringRules {
    pub required: Option<String>,
    pub min_length: Option<(usize, String)>,
    pub max_length: Option<(usize, String)>,
}

impl StringRules {
    /// Create empty rules (no constraints)
    pub fn none() -> Self {
        Self::default()
    }

    /// Every violated rule, in declaration order.
    ///
    /// Lengths are counted in characters, not bytes.
    pub fn violations(&self, value: &str) -> Vec<String> {
        let mut out = Vec::new();

        if let Some(message) = &self.required {
            if value.trim().is_empty() {
                out.push(message.clone());
            }
        }

        let len = value.chars().count();

        if let Some((min, message)) = &self.min_length {
            if len < *min {
                out.push(message.clone());
            }
        }

        if let Some((max, message)) = &self.max_length {
            if len > *max {
                out.push(message.clone());
            }
        }

        out
    }
}

/// Bound rules for a numeric field
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberRules {
    pub min: Option<(f64, String)>,
    pub max: Option<(f64, String)>,
    pub integer: Option<String>,
}

impl NumberRules {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn violations(&self, value: f64) -> Vec<String> {
        let mut out = Vec::new();

        if let Some(message) = &self.integer {
            if value.fract() != 0.0 {
                out.push(message.clone());
            }
        }

        if let Some((min, message)) = &self.min {
            if value < *min {
                out.push(message.clone());
            }
        }

        if let Some((max, message)) = &self.max {
            if value > *max {
                out.push(message.clone());
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_rules_collect_every_violation() {
        let rules = StringRules {
            required: Some("requis".into()),
            min_length: Some((3, "trop court".into())),
            max_length: None,
        };
        assert_eq!(rules.violations("  "), vec!["requis", "trop court"]);
        assert!(rules.violations("abc").is_empty());
    }

    #[test]
    fn test_length_counts_characters() {
        let rules = StringRules {
            max_length: Some((5, "trop long".into())),
            ..StringRules::none()
        };
        // 5 characters, 10 bytes
        assert!(rules.violations("دليلي").is_empty());
    }

    #[test]
    fn test_number_rules() {
        let rules = NumberRules {
            min: Some((0.0, "négatif".into())),
            max: Some((10.0, "trop grand".into())),
            integer: Some("entier attendu".into()),
        };
        assert_eq!(rules.violations(-1.5), vec!["entier attendu", "négatif"]);
        assert_eq!(rules.violations(11.0), vec!["trop grand"]);
        assert!(rules.violations(4.0).is_empty());
    }
}
