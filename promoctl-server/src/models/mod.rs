//! Domain models with validation at construction
//!
//! Field rules are checked here. Group and skill bodies come back as
//! drafts so the store can add unknown-reference errors to the same set.

pub mod catalog;
pub mod fields;
pub mod promoter;
pub mod validation;

pub use catalog::{
    AttachSkillInput, Details, IdList, NewPromoterGroup, NewSkill, PromoterGroupDraft,
    PromoterGroupInput, SkillDraft, SkillInput,
};
pub use promoter::{Gender, NewPromoter, PromoterInput};
pub use validation::{ValidationError, ValidationErrors};
