// src/detection/change_detector.rs
//! Classifies the delta between a baseline role and fresh enrichment data

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::DetectionConfig;
use crate::types::{ChangeEvent, ChangeKind, ProfileRecord, RoleSnapshot};
use crate::utils::{contains_keyword, matches_placeholder};

#[derive(Debug, Clone)]
pub struct ChangeDetector {
    founder_keywords: Vec<String>,
    stealth_keywords: Vec<String>,
    placeholder_companies: Vec<String>,
}

impl ChangeDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            founder_keywords: config.founder_keywords.clone(),
            stealth_keywords: config.stealth_keywords.clone(),
            placeholder_companies: config.placeholder_companies.clone(),
        }
    }

    /// Compare `baseline` with `fresh`. No baseline means first sighting.
    pub fn detect(
        &self,
        profile_id: &str,
        baseline: Option<&RoleSnapshot>,
        fresh: &RoleSnapshot,
        detected_at: DateTime<Utc>,
    ) -> ChangeEvent {
        let change_kind = match baseline {
            None => ChangeKind::Unknown,
            Some(previous) => self.classify(previous, fresh),
        };

        ChangeEvent {
            id: Uuid::new_v4(),
            profile_id: profile_id.to_string(),
            previous_title: baseline.and_then(|b| b.title.clone()),
            new_title: fresh.title.clone(),
            previous_company: baseline.and_then(|b| b.company.clone()),
            new_company: fresh.company.clone(),
            detected_at,
            change_kind,
        }
    }

    pub fn detect_against_record(
        &self,
        profile_id: &str,
        stored: Option<&ProfileRecord>,
        fresh: &RoleSnapshot,
        detected_at: DateTime<Utc>,
    ) -> ChangeEvent {
        let baseline = stored.map(ProfileRecord::role);
        self.detect(profile_id, baseline.as_ref(), fresh, detected_at)
    }

    fn classify(&self, previous: &RoleSnapshot, fresh: &RoleSnapshot) -> ChangeKind {
        if self.is_founder_title(fresh.title.as_deref())
            && !self.is_founder_title(previous.title.as_deref())
        {
            return ChangeKind::FounderTransition;
        }

        if self.is_stealth_company(fresh.company.as_deref())
            && !self.is_stealth_company(previous.company.as_deref())
        {
            return ChangeKind::StealthJoin;
        }

        ChangeKind::NoChange
    }

    pub fn is_founder_title(&self, title: Option<&str>) -> bool {
        title.is_some_and(|t| contains_keyword(t, &self.founder_keywords))
    }

    /// Absent company, a configured placeholder, or a stealth keyword
    pub fn is_stealth_company(&self, company: Option<&str>) -> bool {
        match company.map(str::trim).filter(|c| !c.is_empty()) {
            None => true,
            Some(name) => {
                matches_placeholder(name, &self.placeholder_companies)
                    || contains_keyword(name, &self.stealth_keywords)
            }
        }
    }
}
