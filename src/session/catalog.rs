// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! Step catalog: the ordered step definitions for each verification level.
//!
//! The catalog is a plain value injected into the verification service at
//! construction. Production uses [`StepCatalog::builtin`]; tests can build
//! reduced catalogs to exercise specific flows.

use super::types::{StepStatus, VerificationLevel, VerificationStep};

/// Template for a step, before it is instantiated into a session.
#[derive(Debug, Clone, PartialEq)]
pub struct StepDefinition {
    pub id: String,
    pub label: String,
    pub required: bool,
    pub estimated_minutes: u32,
}

impl StepDefinition {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        required: bool,
        estimated_minutes: u32,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            required,
            estimated_minutes,
        }
    }
}

/// Ordered step definitions per verification level.
///
/// Lookup never fails; a level always has a (possibly empty) sequence.
#[derive(Debug, Clone)]
pub struct StepCatalog {
    basic: Vec<StepDefinition>,
    enhanced: Vec<StepDefinition>,
}

impl StepCatalog {
    pub fn new(basic: Vec<StepDefinition>, enhanced: Vec<StepDefinition>) -> Self {
        Self { basic, enhanced }
    }

    /// The built-in production catalog.
    ///
    /// Every basic step is required; enhanced adds proof of address and an
    /// optional source-of-funds questionnaire on top.
    pub fn builtin() -> Self {
        let basic = vec![
            StepDefinition::new("email", "Email verification", true, 2),
            StepDefinition::new("document", "Government ID document", true, 5),
            StepDefinition::new("selfie", "Selfie match", true, 3),
        ];

        let mut enhanced = basic.clone();
        enhanced.push(StepDefinition::new(
            "proof_of_address",
            "Proof of address",
            true,
            4,
        ));
        enhanced.push(StepDefinition::new(
            "questionnaire",
            "Source of funds questionnaire",
            false,
            5,
        ));

        Self::new(basic, enhanced)
    }

    /// The step definitions for a level, in flow order.
    pub fn definitions(&self, level: VerificationLevel) -> &[StepDefinition] {
        match level {
            VerificationLevel::Basic => &self.basic,
            VerificationLevel::Enhanced => &self.enhanced,
        }
    }

    /// Instantiate the steps for a new session. All steps start
    /// `not_started`; the service promotes the first one.
    pub fn steps_for(&self, level: VerificationLevel) -> Vec<VerificationStep> {
        self.definitions(level)
            .iter()
            .map(|def| VerificationStep {
                id: def.id.clone(),
                label: def.label.clone(),
                required: def.required,
                estimated_minutes: def.estimated_minutes,
                status: StepStatus::NotStarted,
                completed_at: None,
            })
            .collect()
    }
}

impl Default for StepCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_basic_steps_are_all_required() {
        let catalog = StepCatalog::builtin();
        let basic = catalog.definitions(VerificationLevel::Basic);

        let ids: Vec<&str> = basic.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["email", "document", "selfie"]);
        assert!(basic.iter().all(|d| d.required));
    }

    #[test]
    fn builtin_enhanced_extends_basic() {
        let catalog = StepCatalog::builtin();
        let basic = catalog.definitions(VerificationLevel::Basic);
        let enhanced = catalog.definitions(VerificationLevel::Enhanced);

        assert_eq!(&enhanced[..basic.len()], basic);

        let extra: Vec<&str> = enhanced[basic.len()..]
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(extra, vec!["proof_of_address", "questionnaire"]);

        // The questionnaire is the one optional step.
        assert!(enhanced.iter().filter(|d| !d.required).count() == 1);
        assert!(!enhanced.last().unwrap().required);
    }

    #[test]
    fn steps_for_preserves_order_and_starts_not_started() {
        let catalog = StepCatalog::builtin();
        let steps = catalog.steps_for(VerificationLevel::Enhanced);

        let expected: Vec<&str> = catalog
            .definitions(VerificationLevel::Enhanced)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        let actual: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(actual, expected);

        assert!(steps.iter().all(|s| s.status == StepStatus::NotStarted));
        assert!(steps.iter().all(|s| s.completed_at.is_none()));
    }
}
