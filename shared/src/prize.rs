use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Allowed deviation of the summed weights from 1 before a warning is logged.
pub const PROBABILITY_TOLERANCE: f64 = 1e-5;

/// One wheel slice and what it pays out.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prize {
    pub id: String,
    pub name: String,
    pub probability: f64,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Prize {
    pub fn new(id: &str, name: &str, probability: f64, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            probability,
            color: color.to_string(),
            text_color: None,
            value: None,
            icon: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_text_color(mut self, text_color: &str) -> Self {
        self.text_color = Some(text_color.to_string());
        self
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    /// Cash amount paid out, zero for non-cash prizes.
    pub fn cash_value(&self) -> f64 {
        self.value.unwrap_or(0.0)
    }

    pub fn is_cash(&self) -> bool {
        self.cash_value() > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    Empty,
    MissingSentinel,
    DuplicateId(String),
    InvalidProbability { id: String, probability: f64 },
    InvalidValue { id: String, value: f64 },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Empty => write!(f, "prize catalog is empty"),
            CatalogError::MissingSentinel => {
                write!(f, "prize catalog has no non-cash prize to fall back on")
            }
            CatalogError::DuplicateId(id) => write!(f, "duplicate prize id '{}'", id),
            CatalogError::InvalidProbability { id, probability } => {
                write!(f, "prize '{}' has invalid probability {}", id, probability)
            }
            CatalogError::InvalidValue { id, value } => {
                write!(f, "prize '{}' has invalid value {}", id, value)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Validated, ordered prize list. The order is the render order of the wheel.
#[derive(Debug, Clone, PartialEq)]
pub struct PrizeCatalog {
    prizes: Vec<Prize>,
    sentinel: usize,
}

impl PrizeCatalog {
    pub fn new(prizes: Vec<Prize>) -> Result<Self, CatalogError> {
        if prizes.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for prize in &prizes {
            if !seen.insert(prize.id.as_str()) {
                return Err(CatalogError::DuplicateId(prize.id.clone()));
            }
            if !prize.probability.is_finite() || prize.probability < 0.0 {
                return Err(CatalogError::InvalidProbability {
                    id: prize.id.clone(),
                    probability: prize.probability,
                });
            }
            if let Some(value) = prize.value {
                if !value.is_finite() || value < 0.0 {
                    return Err(CatalogError::InvalidValue {
                        id: prize.id.clone(),
                        value,
                    });
                }
            }
        }

        let sentinel = prizes
            .iter()
            .position(|prize| !prize.is_cash())
            .ok_or(CatalogError::MissingSentinel)?;

        let total: f64 = prizes.iter().map(|prize| prize.probability).sum();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            log::warn!(
                "Total prize probability is {}, not 1.0. Weights will be normalized per spin.",
                total
            );
        }

        Ok(Self { prizes, sentinel })
    }

    /// The festival catalog the wheel ships with.
    pub fn perunnal() -> Self {
        let prizes = vec![
            Prize::new("better-luck", "Better Luck Next Time", 0.40, "#CFD8DC")
                .with_text_color("#37474F")
                .with_icon("meh"),
            Prize::new("sweets", "Sweets", 0.38, "#F8BBD0")
                .with_text_color("#880E4F")
                .with_icon("gift"),
            Prize::new("10-rupees", "10 Rupees", 0.10, "#BBDEFB")
                .with_text_color("#1565C0")
                .with_icon("rupee-10")
                .with_value(10.0),
            Prize::new("20-rupees", "20 Rupees", 0.05, "#B2EBF2")
                .with_text_color("#00838F")
                .with_icon("rupee-20")
                .with_value(20.0),
            Prize::new("50-rupees", "50 Rupees", 0.05, "#C8E6C9")
                .with_text_color("#2E7D32")
                .with_icon("rupee-50")
                .with_value(50.0),
            Prize::new("100-rupees", "100 Rupees", 0.02, "#FFF9C4")
                .with_text_color("#F9A825")
                .with_icon("rupee-100")
                .with_value(100.0),
        ];
        Self {
            prizes,
            sentinel: 0,
        }
    }

    pub fn prizes(&self) -> &[Prize] {
        &self.prizes
    }

    pub fn len(&self) -> usize {
        self.prizes.len()
    }

    /// Always false for a constructed catalog; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.prizes.is_empty()
    }

    /// The no-win fallback prize.
    pub fn sentinel(&self) -> &Prize {
        &self.prizes[self.sentinel]
    }

    pub fn is_sentinel(&self, prize: &Prize) -> bool {
        self.sentinel().id == prize.id
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.prizes.iter().position(|prize| prize.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Prize> {
        self.prizes.iter().find(|prize| prize.id == id)
    }

    pub fn total_probability(&self) -> f64 {
        self.prizes.iter().map(|prize| prize.probability).sum()
    }
}
