use serde::{Deserialize, Serialize};

use super::{participant::Participant, roster::RosterStore};

/// Check-in status dimension of the roster filter
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    Checked,
    NotChecked,
}

impl StatusFilter {
    pub fn matches(&self, participant: &Participant) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Checked => participant.checked_in,
            StatusFilter::NotChecked => !participant.checked_in,
        }
    }
}

/// Search text plus status filter applied to the roster
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct FilterCriteria {
    pub query: String,
    pub status: StatusFilter,
}

impl FilterCriteria {
    pub fn new(query: impl Into<String>, status: StatusFilter) -> Self {
        FilterCriteria {
            query: query.into(),
            status,
        }
    }

    /// Case-insensitive substring match against "first last" or email.
    pub fn matches_text(&self, participant: &Participant) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let query = self.query.to_lowercase();
        participant.full_name().to_lowercase().contains(&query)
            || participant.email.to_lowercase().contains(&query)
    }

    pub fn matches(&self, participant: &Participant) -> bool {
        self.matches_text(participant) && self.status.matches(participant)
    }
}

/// Rows that pass `criteria`, in store order.
pub fn visible_rows<'a>(store: &'a RosterStore, criteria: &FilterCriteria) -> Vec<&'a Participant> {
    store
        .participants()
        .iter()
        .filter(|p| criteria.matches(p))
        .collect()
}
