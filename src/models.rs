use serde_json::{Map, Value};

use crate::error::ReportError;

pub const YEAR_MONTH: &str = "yearMonth";
pub const OUTBOUND: &str = "totalOutbound";
pub const OPPORTUNITY: &str = "totalOpportunity";
pub const GOALS: &str = "totalGoals";
pub const GOALS_C2C: &str = "detailedGoalC2C";
pub const GOALS_C2C_PROPOSAL: &str = "detailedGoalC2CProposta";
pub const PROPOSAL_CONVERSION: &str = "detailedGoalProposta";

/// The three email campaign variants tracked by the Data Extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Campaign {
    C1a,
    C2,
    C3,
}

impl Campaign {
    pub const ALL: [Campaign; 3] = [Campaign::C1a, Campaign::C2, Campaign::C3];

    pub fn label(self) -> &'static str {
        match self {
            Campaign::C1a => "C1A",
            Campaign::C2 => "C2",
            Campaign::C3 => "C3",
        }
    }

    // The click columns use a lowercase variant suffix upstream.
    fn sent_field(self) -> &'static str {
        match self {
            Campaign::C1a => "totalEmailsSent_C1a",
            Campaign::C2 => "totalEmailsSent_C2",
            Campaign::C3 => "totalEmailsSent_C3",
        }
    }

    fn open_field(self) -> &'static str {
        match self {
            Campaign::C1a => "totalEmailsOpen_C1a",
            Campaign::C2 => "totalEmailsOpen_C2",
            Campaign::C3 => "totalEmailsOpen_C3",
        }
    }

    fn click_field(self) -> &'static str {
        match self {
            Campaign::C1a => "totalEmailsClick_c1a",
            Campaign::C2 => "totalEmailsClick_c2",
            Campaign::C3 => "totalEmailsClick_c3",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmailCounters {
    pub sent: u64,
    pub opened: u64,
    pub clicked: u64,
}

/// One row of the Data Extension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub year_month: String,
    pub c1a: EmailCounters,
    pub c2: EmailCounters,
    pub c3: EmailCounters,
    pub outbound: u64,
    pub opportunities: u64,
    pub goals: u64,
    pub goals_c2c: u64,
    pub goals_c2c_proposal: u64,
    pub proposal_conversion: Option<f64>,
}

impl Record {
    pub fn emails(&self, campaign: Campaign) -> &EmailCounters {
        match campaign {
            Campaign::C1a => &self.c1a,
            Campaign::C2 => &self.c2,
            Campaign::C3 => &self.c3,
        }
    }

    /// Builds a record from one flattened JSON row. `row` is the item's
    /// position in the payload and only used for error reporting.
    pub fn from_json(row: usize, object: &Map<String, Value>) -> Result<Self, ReportError> {
        let fields = FieldReader { row, object };

        let counters = |campaign: Campaign| -> Result<EmailCounters, ReportError> {
            Ok(EmailCounters {
                sent: fields.counter(campaign.sent_field())?,
                opened: fields.counter(campaign.open_field())?,
                clicked: fields.counter(campaign.click_field())?,
            })
        };

        Ok(Record {
            year_month: fields.period_key(YEAR_MONTH)?,
            c1a: counters(Campaign::C1a)?,
            c2: counters(Campaign::C2)?,
            c3: counters(Campaign::C3)?,
            outbound: fields.counter(OUTBOUND)?,
            opportunities: fields.counter(OPPORTUNITY)?,
            goals: fields.counter(GOALS)?,
            goals_c2c: fields.counter(GOALS_C2C)?,
            goals_c2c_proposal: fields.counter(GOALS_C2C_PROPOSAL)?,
            proposal_conversion: fields.ratio(PROPOSAL_CONVERSION)?,
        })
    }
}

struct FieldReader<'a> {
    row: usize,
    object: &'a Map<String, Value>,
}

impl FieldReader<'_> {
    fn get(&self, field: &'static str) -> Result<&Value, ReportError> {
        self.object.get(field).ok_or(ReportError::MissingField {
            row: self.row,
            field,
        })
    }

    fn invalid(&self, field: &'static str, value: &Value) -> ReportError {
        ReportError::InvalidField {
            row: self.row,
            field,
            value: value.to_string(),
        }
    }

    fn period_key(&self, field: &'static str) -> Result<String, ReportError> {
        match self.get(field)? {
            Value::String(text) => Ok(text.trim().to_string()),
            Value::Number(number) => Ok(number.to_string()),
            other => Err(self.invalid(field, other)),
        }
    }

    /// Null counts as zero so it drops out of sums.
    fn counter(&self, field: &'static str) -> Result<u64, ReportError> {
        let value = self.get(field)?;
        let parsed = match value {
            Value::Null => Some(0),
            Value::Number(number) => number
                .as_u64()
                .or_else(|| number.as_f64().and_then(whole_number)),
            Value::String(text) if text.trim().is_empty() => Some(0),
            Value::String(text) => {
                let text = text.trim();
                text.parse::<u64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(whole_number))
            }
            _ => None,
        };
        parsed.ok_or_else(|| self.invalid(field, value))
    }

    /// Null stays `None` so the mean can skip it.
    fn ratio(&self, field: &'static str) -> Result<Option<f64>, ReportError> {
        let value = self.get(field)?;
        match value {
            Value::Null => Ok(None),
            Value::Number(number) => number
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(field, value)),
            Value::String(text) if text.trim().is_empty() => Ok(None),
            Value::String(text) => match text.trim().parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => Ok(Some(parsed)),
                _ => Err(self.invalid(field, value)),
            },
            _ => Err(self.invalid(field, value)),
        }
    }
}

fn whole_number(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CampaignMetrics {
    pub sent: u64,
    pub open_rate: f64,
    pub click_rate: f64,
}

/// KPIs derived from one dataset snapshot. Rates are already multiplied by 100.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricReport {
    pub record_count: usize,
    pub c1a: CampaignMetrics,
    pub c2: CampaignMetrics,
    pub c3: CampaignMetrics,
    pub outbound: u64,
    pub opportunities: u64,
    pub goals: u64,
    pub goals_c2c: u64,
    pub goals_c2c_proposal: u64,
    /// `None` when no record carries a conversion ratio.
    pub global_conversion_rate: Option<f64>,
}

impl MetricReport {
    pub fn campaign(&self, campaign: Campaign) -> &CampaignMetrics {
        match campaign {
            Campaign::C1a => &self.c1a,
            Campaign::C2 => &self.c2,
            Campaign::C3 => &self.c3,
        }
    }
}
