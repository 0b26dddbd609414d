//! Two-pass creation of epics and stories
//!
//! Pass 1 creates every epic and registers the keys of those that declared a
//! placeholder. Pass 2 resolves each story's parent through the same resolver
//! and creates the story. A failure only ever affects its own entry.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{
    DirectKeyPolicy, DuplicatePolicy, Entry, IdResolver, ItemKind, Outcome, PlaceholderConvention,
    Reference,
};
use crate::storage::TextSource;
use crate::tracker::IssueCreator;

/// Summary used when an entry's summary is blank
pub const DEFAULT_SUMMARY: &str = "Untitled";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Placeholder \"{placeholder}\" is declared by more than one epic (entries {first} and {second})")]
    DuplicatePlaceholder {
        placeholder: String,
        first: usize,
        second: usize,
    },
}

/// Knobs for planning and resolution
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub convention: PlaceholderConvention,
    pub duplicates: DuplicatePolicy,
    pub direct_keys: DirectKeyPolicy,
    pub default_summary: String,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            convention: PlaceholderConvention::default(),
            duplicates: DuplicatePolicy::default(),
            direct_keys: DirectKeyPolicy::default(),
            default_summary: DEFAULT_SUMMARY.to_string(),
        }
    }
}

/// An epic ready to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedEpic {
    /// 1-based position in the input
    pub index: usize,
    pub summary: String,
    pub description_ref: Option<String>,
    pub temp_id: Option<String>,
}

/// A story ready to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStory {
    /// 1-based position in the input
    pub index: usize,
    pub summary: String,
    pub description_ref: Option<String>,
    pub parent: Reference,
}

/// Validated entries split into the two passes, each in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    epics: Vec<PlannedEpic>,
    stories: Vec<PlannedStory>,
}

impl Plan {
    pub fn epics(&self) -> &[PlannedEpic] {
        &self.epics
    }

    pub fn stories(&self) -> &[PlannedStory] {
        &self.stories
    }

    pub fn len(&self) -> usize {
        self.epics.len() + self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Placeholders declared by epics in this plan
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.epics.iter().filter_map(|e| e.temp_id.as_deref())
    }
}

/// Runs the two-pass creation for one project
pub struct Orchestrator {
    project_key: String,
    options: OrchestratorOptions,
}

impl Orchestrator {
    pub fn new(project_key: impl Into<String>, options: OrchestratorOptions) -> Self {
        Self {
            project_key: project_key.into(),
            options,
        }
    }

    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Returns an empty resolver configured for this orchestrator
    pub fn resolver(&self) -> IdResolver {
        IdResolver::with_policy(self.options.direct_keys)
    }

    /// Plans and executes in one go with a fresh resolver
    pub fn run<C: IssueCreator + ?Sized>(
        &self,
        entries: &[Entry],
        creator: &mut C,
        texts: &dyn TextSource,
    ) -> Result<Vec<Outcome>, PlanError> {
        let plan = self.plan(entries)?;
        Ok(self.execute(&plan, creator, texts, self.resolver()))
    }

    /// Classifies and validates entries without touching the tracker
    pub fn plan(&self, entries: &[Entry]) -> Result<Plan, PlanError> {
        let mut plan = Plan::default();
        let mut declared: HashMap<&str, usize> = HashMap::new();

        for (position, entry) in entries.iter().enumerate() {
            let index = position + 1;
            let summary = entry.normalized_summary(&self.options.default_summary);
            let description_ref = entry.description_ref().map(str::to_string);

            // A blank parent classifies as empty, which makes the entry an epic
            let raw_parent = entry.parent.as_deref().unwrap_or_default();
            let Ok(parent) = Reference::classify(raw_parent, &self.options.convention) else {
                let temp_id = entry.temp_id();
                if let Some(id) = temp_id {
                    self.declare(&mut declared, id, index)?;
                }
                plan.epics.push(PlannedEpic {
                    index,
                    summary,
                    description_ref,
                    temp_id: temp_id.map(str::to_string),
                });
                continue;
            };

            if let Some(id) = entry.temp_id() {
                warn!(index, placeholder = id, "placeholder on a story is ignored; only epics can be parents");
            }

            plan.stories.push(PlannedStory {
                index,
                summary,
                description_ref,
                parent,
            });
        }

        debug!(epics = plan.epics.len(), stories = plan.stories.len(), "planned entries");
        Ok(plan)
    }

    fn declare<'a>(
        &self,
        declared: &mut HashMap<&'a str, usize>,
        id: &'a str,
        index: usize,
    ) -> Result<(), PlanError> {
        if !self.options.convention.matches(id) {
            warn!(
                index,
                placeholder = id,
                prefix = self.options.convention.prefix(),
                "placeholder does not start with the placeholder prefix; stories cannot reference it"
            );
        }

        if let Some(first) = declared.insert(id, index) {
            match self.options.duplicates {
                DuplicatePolicy::Reject => {
                    return Err(PlanError::DuplicatePlaceholder {
                        placeholder: id.to_string(),
                        first,
                        second: index,
                    })
                }
                DuplicatePolicy::LastWins => {
                    warn!(placeholder = id, first, second = index, "duplicate placeholder; the later epic wins");
                }
            }
        }

        Ok(())
    }

    /// Creates every planned item, epics first
    ///
    /// Returns one outcome per planned item: epics in input order followed by
    /// stories in input order.
    pub fn execute<C: IssueCreator + ?Sized>(
        &self,
        plan: &Plan,
        creator: &mut C,
        texts: &dyn TextSource,
        mut resolver: IdResolver,
    ) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(plan.len());

        info!(project = %self.project_key, epics = plan.epics.len(), "pass 1: creating epics");
        for epic in &plan.epics {
            let (Ok(outcome) | Err(outcome)) = self.create_epic(epic, creator, texts, &mut resolver);
            outcomes.push(outcome);
        }

        info!(project = %self.project_key, stories = plan.stories.len(), "pass 2: creating stories");
        for story in &plan.stories {
            let (Ok(outcome) | Err(outcome)) = self.create_story(story, creator, texts, &resolver);
            outcomes.push(outcome);
        }

        outcomes
    }

    fn create_epic<C: IssueCreator + ?Sized>(
        &self,
        epic: &PlannedEpic,
        creator: &mut C,
        texts: &dyn TextSource,
        resolver: &mut IdResolver,
    ) -> Result<Outcome, Outcome> {
        let description = describe(epic.description_ref.as_deref(), &epic.summary, texts);

        let key = creator
            .create_epic(&self.project_key, &epic.summary, &description)
            .map_err(|e| {
                warn!(summary = %epic.summary, error = %e, "failed to create epic");
                Outcome::failed(ItemKind::Epic, &epic.summary, format!("Creation failed: {}", e))
            })?;

        info!("Created Epic: {} - {}", key, epic.summary);

        if let Some(id) = &epic.temp_id {
            resolver.register(id, &key);
            info!("Mapped placeholder {} -> {}", id, key);
        }

        Ok(Outcome::created(ItemKind::Epic, &epic.summary, key))
    }

    fn create_story<C: IssueCreator + ?Sized>(
        &self,
        story: &PlannedStory,
        creator: &mut C,
        texts: &dyn TextSource,
        resolver: &IdResolver,
    ) -> Result<Outcome, Outcome> {
        let parent_key = resolver.resolve(&story.parent).map_err(|e| {
            warn!(summary = %story.summary, error = %e, "skipping story");
            Outcome::failed(ItemKind::Story, &story.summary, e.to_string())
        })?;

        let description = describe(story.description_ref.as_deref(), &story.summary, texts);

        let key = creator
            .create_story(&self.project_key, &story.summary, &description, &parent_key)
            .map_err(|e| {
                warn!(summary = %story.summary, parent = %parent_key, error = %e, "failed to create story");
                Outcome::failed(ItemKind::Story, &story.summary, format!("Creation failed: {}", e))
            })?;

        info!("Created Story: {} under {} - {}", key, parent_key, story.summary);
        Ok(Outcome::created(ItemKind::Story, &story.summary, key))
    }
}

/// Long-form description, or the summary when there is none
fn describe(reference: Option<&str>, summary: &str, texts: &dyn TextSource) -> String {
    let Some(reference) = reference else {
        return summary.to_string();
    };

    match texts.read_text(reference) {
        Ok(Some(text)) if !text.trim().is_empty() => text,
        Ok(_) => {
            debug!(%reference, "description is empty; using summary");
            summary.to_string()
        }
        Err(e) => {
            warn!(%reference, error = %e, "could not read description; using summary");
            summary.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsTextSource;
    use crate::tracker::recording::{Call, RecordingTracker};
    use proptest::prelude::*;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new("JD", OrchestratorOptions::default())
    }

    fn no_text() -> HashMap<String, String> {
        HashMap::new()
    }

    fn scenario() -> Vec<Entry> {
        vec![
            Entry::epic("Epic A").with_temp_id("temp-1"),
            Entry::story("Story B", "temp-1"),
        ]
    }

    #[test]
    fn creates_epic_then_story_under_resolved_key() {
        let mut tracker = RecordingTracker::new();

        let outcomes = orchestrator().run(&scenario(), &mut tracker, &no_text()).unwrap();

        assert_eq!(
            outcomes,
            vec![
                Outcome::created(ItemKind::Epic, "Epic A", "EPIC-1"),
                Outcome::created(ItemKind::Story, "Story B", "STORY-1"),
            ]
        );
        assert!(matches!(
            &tracker.calls[1],
            Call::CreateStory { parent, project, .. } if parent == "EPIC-1" && project == "JD"
        ));
    }

    #[test]
    fn failed_epic_skips_dependent_story() {
        let mut tracker = RecordingTracker::failing_epics();

        let outcomes = orchestrator().run(&scenario(), &mut tracker, &no_text()).unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].is_success());
        assert_eq!(outcomes[0].kind(), ItemKind::Epic);

        let story = &outcomes[1];
        assert_eq!(story.kind(), ItemKind::Story);
        assert_eq!(story.summary(), "Story B");
        assert!(!story.is_success());
        assert!(story.key().is_none());
        assert!(story.error().unwrap().contains("temp-1"));

        assert_eq!(tracker.story_creations(), 0);
    }

    #[test]
    fn epics_come_first_regardless_of_input_order() {
        let entries = vec![
            Entry::story("S1", "JD-100"),
            Entry::epic("E1"),
            Entry::story("S2", "JD-100"),
            Entry::epic("E2"),
        ];
        let mut tracker = RecordingTracker::new();

        let outcomes = orchestrator().run(&entries, &mut tracker, &no_text()).unwrap();
        let summaries: Vec<_> = outcomes.iter().map(|o| o.summary()).collect();

        assert_eq!(summaries, vec!["E1", "E2", "S1", "S2"]);
    }

    #[test]
    fn story_may_reference_epic_declared_later_in_input() {
        let entries = vec![
            Entry::story("Story first", "temp-late"),
            Entry::epic("Epic later").with_temp_id("temp-late"),
        ];
        let mut tracker = RecordingTracker::new();

        let outcomes = orchestrator().run(&entries, &mut tracker, &no_text()).unwrap();

        assert!(outcomes.iter().all(|o| o.is_success()));
    }

    #[test]
    fn epic_failure_does_not_abort_pass() {
        let entries = vec![
            Entry::epic("E1"),
            Entry::epic("E2"),
            Entry::epic("E3"),
        ];
        let mut tracker = RecordingTracker::new().fail_summary("E2");

        let outcomes = orchestrator().run(&entries, &mut tracker, &no_text()).unwrap();

        assert_eq!(tracker.epic_creations(), 3);
        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert!(outcomes[1].error().unwrap().starts_with("Creation failed"));
        assert!(outcomes[2].is_success());
    }

    #[test]
    fn story_failure_does_not_abort_pass() {
        let entries = vec![
            Entry::epic("E").with_temp_id("temp-e"),
            Entry::story("S1", "temp-e"),
            Entry::story("S2", "temp-e"),
        ];
        let mut tracker = RecordingTracker::new().fail_summary("S1");

        let outcomes = orchestrator().run(&entries, &mut tracker, &no_text()).unwrap();

        assert_eq!(tracker.story_creations(), 2);
        assert!(!outcomes[1].is_success());
        assert!(outcomes[2].is_success());
    }

    #[test]
    fn undeclared_placeholder_is_reported() {
        let entries = vec![Entry::story("Orphan", "temp-ghost")];
        let mut tracker = RecordingTracker::new();

        let outcomes = orchestrator().run(&entries, &mut tracker, &no_text()).unwrap();

        assert_eq!(
            outcomes[0].error(),
            Some("Could not resolve parent placeholder \"temp-ghost\"")
        );
        assert!(tracker.calls.is_empty());
    }

    #[test]
    fn direct_keys_pass_through_by_default() {
        let entries = vec![Entry::story("Follow-up", "JD-77")];
        let mut tracker = RecordingTracker::new();

        orchestrator().run(&entries, &mut tracker, &no_text()).unwrap();

        assert!(matches!(&tracker.calls[0], Call::CreateStory { parent, .. } if parent == "JD-77"));
    }

    #[test]
    fn require_known_blocks_unknown_direct_keys() {
        let options = OrchestratorOptions {
            direct_keys: DirectKeyPolicy::RequireKnown,
            ..OrchestratorOptions::default()
        };
        let orchestrator = Orchestrator::new("JD", options);
        let entries = vec![
            Entry::story("Known parent", "JD-5"),
            Entry::story("Unknown parent", "JD-6"),
        ];
        let plan = orchestrator.plan(&entries).unwrap();
        let resolver = orchestrator.resolver().with_known_keys(["JD-5"]);
        let mut tracker = RecordingTracker::new();

        let outcomes = orchestrator.execute(&plan, &mut tracker, &no_text(), resolver);

        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert!(outcomes[1].error().unwrap().contains("JD-6"));
        assert_eq!(tracker.story_creations(), 1);
    }

    #[test]
    fn duplicate_placeholders_are_rejected_by_default() {
        let entries = vec![
            Entry::epic("First").with_temp_id("temp-1"),
            Entry::epic("Second").with_temp_id("temp-1"),
        ];

        let err = orchestrator().plan(&entries).unwrap_err();

        assert_eq!(
            err,
            PlanError::DuplicatePlaceholder {
                placeholder: "temp-1".to_string(),
                first: 1,
                second: 2,
            }
        );
    }

    #[test]
    fn rejected_plan_creates_nothing() {
        let entries = vec![
            Entry::epic("First").with_temp_id("temp-1"),
            Entry::epic("Second").with_temp_id("temp-1"),
        ];
        let mut tracker = RecordingTracker::new();

        assert!(orchestrator().run(&entries, &mut tracker, &no_text()).is_err());
        assert!(tracker.calls.is_empty());
    }

    #[test]
    fn duplicate_placeholders_last_wins_when_configured() {
        let options = OrchestratorOptions {
            duplicates: DuplicatePolicy::LastWins,
            ..OrchestratorOptions::default()
        };
        let entries = vec![
            Entry::epic("First").with_temp_id("temp-1"),
            Entry::epic("Second").with_temp_id("temp-1"),
            Entry::story("Child", "temp-1"),
        ];
        let mut tracker = RecordingTracker::new();

        Orchestrator::new("JD", options)
            .run(&entries, &mut tracker, &no_text())
            .unwrap();

        assert!(matches!(&tracker.calls[2], Call::CreateStory { parent, .. } if parent == "EPIC-2"));
    }

    #[test]
    fn story_temp_id_is_not_a_parent() {
        let entries = vec![
            Entry::epic("E").with_temp_id("temp-e"),
            Entry::story("S", "temp-e").with_temp_id("temp-s"),
            Entry::story("Grandchild", "temp-s"),
        ];
        let mut tracker = RecordingTracker::new();

        let outcomes = orchestrator().run(&entries, &mut tracker, &no_text()).unwrap();

        assert!(outcomes[1].is_success());
        assert!(!outcomes[2].is_success());
        assert!(outcomes[2].error().unwrap().contains("temp-s"));
    }

    #[test]
    fn description_is_read_from_text_source() {
        let mut texts = HashMap::new();
        texts.insert("outputs/epic.md".to_string(), "Full epic write-up".to_string());
        let entries = vec![
            Entry::epic("With text").with_description("outputs/epic.md"),
            Entry::epic("Missing text").with_description("outputs/missing.md"),
            Entry::epic("No reference"),
        ];
        let mut tracker = RecordingTracker::new();

        orchestrator().run(&entries, &mut tracker, &texts).unwrap();

        let descriptions: Vec<_> = tracker
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::CreateEpic { description, .. } => Some(description.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(descriptions, vec!["Full epic write-up", "Missing text", "No reference"]);
    }

    #[test]
    fn blank_parent_plans_as_epic() {
        let entries = vec![
            Entry::story("Blank parent", "   ").with_temp_id("temp-1"),
            Entry::story("Child", "temp-1"),
        ];

        let plan = orchestrator().plan(&entries).unwrap();

        assert_eq!(plan.epics().len(), 1);
        assert_eq!(plan.epics()[0].temp_id.as_deref(), Some("temp-1"));
        assert_eq!(plan.stories().len(), 1);
        assert_eq!(plan.stories()[0].index, 2);
    }

    #[test]
    fn unreadable_description_falls_back_to_summary() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("outputs")).unwrap();
        let texts = FsTextSource::new(dir.path());
        let entries = vec![Entry::epic("Directory ref").with_description("outputs")];
        let mut tracker = RecordingTracker::new();

        let outcomes = orchestrator().run(&entries, &mut tracker, &texts).unwrap();

        assert!(outcomes[0].is_success());
        assert!(matches!(
            &tracker.calls[0],
            Call::CreateEpic { description, .. } if description == "Directory ref"
        ));
    }

    #[test]
    fn blank_summary_uses_default() {
        let entries = vec![Entry::epic("   ")];
        let mut tracker = RecordingTracker::new();

        let outcomes = orchestrator().run(&entries, &mut tracker, &no_text()).unwrap();

        assert_eq!(outcomes[0].summary(), DEFAULT_SUMMARY);
    }

    #[test]
    fn empty_input_produces_no_outcomes() {
        let mut tracker = RecordingTracker::new();

        let outcomes = orchestrator().run(&[], &mut tracker, &no_text()).unwrap();

        assert!(outcomes.is_empty());
        assert!(tracker.calls.is_empty());
    }

    #[test]
    fn plan_classifies_parents() {
        let entries = vec![
            Entry::epic("E").with_temp_id("temp-1"),
            Entry::story("S1", "temp-1"),
            Entry::story("S2", "JD-9"),
        ];

        let plan = orchestrator().plan(&entries).unwrap();

        assert_eq!(plan.epics().len(), 1);
        assert_eq!(plan.stories()[0].parent, Reference::Placeholder("temp-1".into()));
        assert_eq!(plan.stories()[1].parent, Reference::DirectKey("JD-9".into()));
        assert_eq!(plan.stories()[1].index, 3);
        assert_eq!(plan.placeholders().collect::<Vec<_>>(), vec!["temp-1"]);
    }

    /// Entries named `item-{i}`; epics declare `temp-{i}`, stories point at
    /// `temp-{n}` or `JD-{n}` for small `n`.
    fn entries_strategy() -> impl Strategy<Value = Vec<Entry>> {
        proptest::collection::vec((any::<bool>(), 0usize..8, any::<bool>()), 0..12).prop_map(
            |specs| {
                specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (is_epic, target, direct))| {
                        let summary = format!("item-{}", i);
                        if is_epic {
                            Entry::epic(summary).with_temp_id(format!("temp-{}", i))
                        } else if direct {
                            Entry::story(summary, format!("JD-{}", target))
                        } else {
                            Entry::story(summary, format!("temp-{}", target))
                        }
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn every_entry_yields_one_outcome_epics_first(
            entries in entries_strategy(),
            failing in proptest::collection::hash_set(0usize..12, 0..4),
        ) {
            let mut tracker = RecordingTracker::new();
            for i in &failing {
                tracker.fail_summaries.insert(format!("item-{}", i));
            }

            let outcomes = orchestrator().run(&entries, &mut tracker, &no_text()).unwrap();

            prop_assert_eq!(outcomes.len(), entries.len());

            let epic_count = entries.iter().filter(|e| e.kind() == ItemKind::Epic).count();
            prop_assert!(outcomes[..epic_count].iter().all(|o| o.kind() == ItemKind::Epic));
            prop_assert!(outcomes[epic_count..].iter().all(|o| o.kind() == ItemKind::Story));

            // Input order is kept within each pass
            let expected: Vec<String> = entries
                .iter()
                .filter(|e| e.kind() == ItemKind::Epic)
                .chain(entries.iter().filter(|e| e.kind() == ItemKind::Story))
                .map(|e| e.summary.clone())
                .collect();
            let actual: Vec<String> = outcomes.iter().map(|o| o.summary().to_string()).collect();
            prop_assert_eq!(actual, expected);

            for outcome in &outcomes {
                prop_assert_eq!(outcome.is_success(), outcome.key().is_some());
                prop_assert_eq!(outcome.is_success(), outcome.error().is_none());
            }
        }

        #[test]
        fn stories_are_attempted_only_when_parent_resolves(
            entries in entries_strategy(),
            failing in proptest::collection::hash_set(0usize..12, 0..4),
        ) {
            let mut tracker = RecordingTracker::new();
            for i in &failing {
                tracker.fail_summaries.insert(format!("item-{}", i));
            }

            orchestrator().run(&entries, &mut tracker, &no_text()).unwrap();

            let created_epic = |n: usize| {
                entries.get(n).map_or(false, |e| e.kind() == ItemKind::Epic) && !failing.contains(&n)
            };
            let expected_stories = entries
                .iter()
                .filter_map(|e| e.parent())
                .filter(|parent| match parent.strip_prefix("temp-") {
                    Some(n) => n.parse::<usize>().map_or(false, |n| created_epic(n)),
                    None => true,
                })
                .count();

            prop_assert_eq!(tracker.epic_creations(), entries.iter().filter(|e| e.kind() == ItemKind::Epic).count());
            prop_assert_eq!(tracker.story_creations(), expected_stories);
        }
    }
}
