//! Promoter group and skill payload validation

use serde::Deserialize;

use super::fields::{self, MAX_DESCRIPTION_LEN, MAX_TEXT_LEN};
use super::ValidationErrors;

/// Name and description shared by groups and skills
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Details {
    pub name: String,
    pub description: Option<String>,
}

impl Details {
    fn parse(
        name: Option<String>,
        description: Option<String>,
        errors: &mut ValidationErrors,
    ) -> Option<Self> {
        let name = errors.check(fields::required_text("name", name, MAX_TEXT_LEN));
        let description = errors.check(fields::optional_text(
            "description",
            description,
            MAX_DESCRIPTION_LEN,
        ));
        Some(Self {
            name: name?,
            description: description?,
        })
    }

    fn check(name: Option<String>, description: Option<String>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match Self::parse(name, description, &mut errors) {
            Some(details) if errors.is_empty() => Ok(details),
            _ => Err(errors),
        }
    }
}

/// Ids requested for a relationship, in request order.
///
/// `None` at the payload level means "leave links alone"; an empty list
/// means "remove every link".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdList {
    /// Name of the payload field, used as the error key prefix
    pub field: &'static str,
    requested: Vec<i64>,
}

impl IdList {
    pub fn new(field: &'static str, requested: Vec<i64>) -> Self {
        Self { field, requested }
    }

    /// Ids as sent, duplicates included. Indexes match the request body.
    pub fn requested(&self) -> &[i64] {
        &self.requested
    }

    /// Distinct ids, first occurrence order.
    pub fn unique(&self) -> Vec<i64> {
        let mut out = Vec::with_capacity(self.requested.len());
        for id in &self.requested {
            if !out.contains(id) {
                out.push(*id);
            }
        }
        out
    }
}

/// Raw promoter group body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromoterGroupInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub skill_ids: Option<Vec<i64>>,
    pub promoter_ids: Option<Vec<i64>>,
}

/// Validated promoter group write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPromoterGroup {
    pub details: Details,
    pub skill_ids: Option<IdList>,
    pub promoter_ids: Option<IdList>,
}

/// Promoter group body after field checks, before reference checks.
///
/// Id lists are kept even when a field failed so unknown references can
/// be reported in the same response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoterGroupDraft {
    details: Result<Details, ValidationErrors>,
    pub skill_ids: Option<IdList>,
    pub promoter_ids: Option<IdList>,
}

impl PromoterGroupDraft {
    /// Field errors, when there are no ids left to look up.
    pub fn settled_errors(&self) -> Option<&ValidationErrors> {
        match &self.details {
            Err(errors) if no_ids(&[&self.skill_ids, &self.promoter_ids]) => Some(errors),
            _ => None,
        }
    }

    /// Combine field errors with reference errors found by the store.
    pub fn finish(
        self,
        references: ValidationErrors,
    ) -> Result<NewPromoterGroup, ValidationErrors> {
        let details = combine(self.details, references)?;
        Ok(NewPromoterGroup {
            details,
            skill_ids: self.skill_ids,
            promoter_ids: self.promoter_ids,
        })
    }
}

impl PromoterGroupInput {
    /// Check field rules. Referenced ids are checked by the store.
    pub fn validate(self) -> PromoterGroupDraft {
        PromoterGroupDraft {
            details: Details::check(self.name, self.description),
            skill_ids: self.skill_ids.map(|ids| IdList::new("skill_ids", ids)),
            promoter_ids: self.promoter_ids.map(|ids| IdList::new("promoter_ids", ids)),
        }
    }
}

/// Raw skill body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub promoter_group_ids: Option<Vec<i64>>,
}

/// Validated skill write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSkill {
    pub details: Details,
    pub promoter_group_ids: Option<IdList>,
}

/// Skill body after field checks, before reference checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillDraft {
    details: Result<Details, ValidationErrors>,
    pub promoter_group_ids: Option<IdList>,
}

impl SkillDraft {
    pub fn settled_errors(&self) -> Option<&ValidationErrors> {
        match &self.details {
            Err(errors) if no_ids(&[&self.promoter_group_ids]) => Some(errors),
            _ => None,
        }
    }

    pub fn finish(self, references: ValidationErrors) -> Result<NewSkill, ValidationErrors> {
        let details = combine(self.details, references)?;
        Ok(NewSkill {
            details,
            promoter_group_ids: self.promoter_group_ids,
        })
    }
}

impl SkillInput {
    pub fn validate(self) -> SkillDraft {
        SkillDraft {
            details: Details::check(self.name, self.description),
            promoter_group_ids: self
                .promoter_group_ids
                .map(|ids| IdList::new("promoter_group_ids", ids)),
        }
    }
}

fn no_ids(lists: &[&Option<IdList>]) -> bool {
    lists
        .iter()
        .all(|list| list.as_ref().map_or(true, |ids| ids.requested().is_empty()))
}

fn combine(
    details: Result<Details, ValidationErrors>,
    references: ValidationErrors,
) -> Result<Details, ValidationErrors> {
    match details {
        Ok(details) => references.into_result().map(|()| details),
        Err(mut errors) => {
            errors.merge(references);
            Err(errors)
        }
    }
}

/// Body of `POST /promoters/{id}/skills`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachSkillInput {
    pub skill_id: Option<i64>,
}
