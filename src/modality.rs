use crate::config::{LineId, PlannerConfig};
use crate::demand::DemandRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    #[serde(rename = "Automatica")]
    Automatic,
    Manual,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Automatic => "Automatica",
            Modality::Manual => "Manual",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "automatica" | "automatic" => Ok(Modality::Automatic),
            "manual" => Ok(Modality::Manual),
            other => Err(format!("unknown modality '{other}'")),
        }
    }
}

/// Where and how fast a demand row runs.
#[derive(Debug, Clone, PartialEq)]
pub struct LineAssignment {
    pub modality: Modality,
    /// Boxes per hour on the chosen modality.
    pub rate: f64,
    /// Candidate lines in priority order.
    pub candidates: Vec<LineId>,
}

/// Decides automatic vs manual per demand row.
#[derive(Debug, Clone)]
pub struct ModalitySelector {
    keywords: Vec<String>,
    automatic_lines: Vec<LineId>,
    manual_lines: Vec<LineId>,
}

impl ModalitySelector {
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            keywords: config
                .automatic_keywords
                .iter()
                .map(|keyword| keyword.to_uppercase())
                .filter(|keyword| !keyword.is_empty())
                .collect(),
            automatic_lines: config.automatic_lines.clone(),
            manual_lines: config.manual_lines(),
        }
    }

    /// Case-insensitive substring match against the automatic keywords.
    pub fn is_keyword_brand(&self, brand: &str) -> bool {
        let brand = brand.to_uppercase();
        self.keywords.iter().any(|keyword| brand.contains(keyword.as_str()))
    }

    pub fn select(&self, row: &DemandRow) -> LineAssignment {
        if self.is_keyword_brand(&row.brand) || row.automatic_rate > row.manual_rate {
            LineAssignment {
                modality: Modality::Automatic,
                rate: row.automatic_rate,
                candidates: self.automatic_lines.clone(),
            }
        } else {
            LineAssignment {
                modality: Modality::Manual,
                rate: row.manual_rate,
                candidates: self.manual_lines.clone(),
            }
        }
    }
}
