//! Simulation state machine (v0.4.0).
//!
//! One branching scenario played step by step:
//!
//! ```text
//! idle --start--> in_progress --choose/advance--> in_progress --complete--> completed
//! ```
//!
//! Every transition returns a new run and leaves the old one untouched, so the
//! reducer can drop the result on error and keep the previous state as is.
//!
//! ## Scoring
//!
//! - Runs start at a neutral 50, not 0
//! - Each choice adds a signed impact, clamped to [0, 100] right away
//! - Payout = round_half_up(xp_cap * score / 100)

use crate::error::EngineError;
use crate::progression::{apply_impact, simulation_payout, MAX_SCORE, NEUTRAL_SCORE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Idle,
    InProgress,
    Completed,
}

/// A single playthrough of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SimulationRunRepr")]
pub struct SimulationRun {
    scenario_id: String,
    current_step_index: usize,
    total_steps: usize,
    score: u8,
    history: Vec<String>,
    status: SimulationStatus,
    /// Step the most recent choice was recorded on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_choice_step: Option<usize>,
}

/// Wire form, validated into `SimulationRun`
#[derive(Deserialize)]
struct SimulationRunRepr {
    scenario_id: String,
    current_step_index: usize,
    total_steps: usize,
    score: u8,
    #[serde(default)]
    history: Vec<String>,
    status: SimulationStatus,
    #[serde(default)]
    last_choice_step: Option<usize>,
}

impl TryFrom<SimulationRunRepr> for SimulationRun {
    type Error = String;

    fn try_from(repr: SimulationRunRepr) -> Result<Self, Self::Error> {
        let id = &repr.scenario_id;
        if repr.score > MAX_SCORE {
            return Err(format!(
                "simulation '{}' score {} is above {}",
                id, repr.score, MAX_SCORE
            ));
        }
        if repr.total_steps == 0 {
            return Err(format!("simulation '{}' has no steps", id));
        }
        if repr.current_step_index >= repr.total_steps {
            return Err(format!(
                "simulation '{}' is at step {} of {}",
                id,
                repr.current_step_index + 1,
                repr.total_steps
            ));
        }
        if repr.history.len() > repr.current_step_index + 1 {
            return Err(format!(
                "simulation '{}' has {} choices by step {}",
                id,
                repr.history.len(),
                repr.current_step_index + 1
            ));
        }
        if matches!(repr.last_choice_step, Some(step) if step > repr.current_step_index) {
            return Err(format!("simulation '{}' has a choice recorded ahead of its step", id));
        }

        Ok(Self {
            scenario_id: repr.scenario_id,
            current_step_index: repr.current_step_index,
            total_steps: repr.total_steps,
            score: repr.score,
            history: repr.history,
            status: repr.status,
            last_choice_step: repr.last_choice_step,
        })
    }
}

impl SimulationRun {
    /// Fresh run at step 0 with the neutral score.
    ///
    /// A scenario always has at least one step.
    pub fn start(scenario_id: impl Into<String>, total_steps: usize) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            current_step_index: 0,
            total_steps: total_steps.max(1),
            score: NEUTRAL_SCORE,
            history: Vec::new(),
            status: SimulationStatus::InProgress,
            last_choice_step: None,
        }
    }

    pub fn scenario_id(&self) -> &str {
        &self.scenario_id
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    /// Chosen option ids, oldest first
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn is_final_step(&self) -> bool {
        self.current_step_index + 1 >= self.total_steps
    }

    /// Whether the current step already has a choice
    pub fn choice_recorded(&self) -> bool {
        self.last_choice_step == Some(self.current_step_index)
    }

    fn ensure_in_progress(&self) -> Result<(), EngineError> {
        if self.status != SimulationStatus::InProgress {
            return Err(EngineError::SimulationNotInProgress {
                scenario_id: self.scenario_id.clone(),
            });
        }
        Ok(())
    }

    /// Record the option picked on the current step and apply its impact.
    ///
    /// Does not advance; showing feedback and moving on are separate steps.
    pub fn record_choice(&self, option_id: &str, score_impact: i32) -> Result<Self, EngineError> {
        self.ensure_in_progress()?;
        if self.choice_recorded() {
            return Err(EngineError::ChoiceAlreadyRecorded {
                scenario_id: self.scenario_id.clone(),
                step: self.current_step_index + 1,
            });
        }

        let mut next = self.clone();
        next.history.push(option_id.to_string());
        next.score = apply_impact(self.score, score_impact);
        next.last_choice_step = Some(self.current_step_index);
        Ok(next)
    }

    /// Move to the next step. `Ok(None)` when already at the last one.
    pub fn advance(&self) -> Result<Option<Self>, EngineError> {
        self.ensure_in_progress()?;
        if self.is_final_step() {
            return Ok(None);
        }

        let mut next = self.clone();
        next.current_step_index += 1;
        Ok(Some(next))
    }

    /// Finish the run and compute its payout. Only legal on the final step.
    pub fn complete(&self, xp_cap: u64) -> Result<SimulationOutcome, EngineError> {
        self.ensure_in_progress()?;
        if !self.is_final_step() {
            return Err(EngineError::NotAtFinalStep {
                scenario_id: self.scenario_id.clone(),
                step: self.current_step_index + 1,
                total_steps: self.total_steps,
            });
        }

        let mut run = self.clone();
        run.status = SimulationStatus::Completed;
        let payout = simulation_payout(xp_cap, run.score);
        Ok(SimulationOutcome { run, payout })
    }
}

/// A completed run together with the XP it earned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationOutcome {
    pub run: SimulationRun,
    pub payout: u64,
}

impl SimulationOutcome {
    pub fn record(&self) -> SimulationRecord {
        SimulationRecord {
            scenario_id: self.run.scenario_id.clone(),
            score: self.run.score,
            payout: self.payout,
            choices: self.run.history.clone(),
        }
    }
}

/// Kept on the learner after a run has been cleared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SimulationRecordRepr")]
pub struct SimulationRecord {
    pub scenario_id: String,
    pub score: u8,
    pub payout: u64,
    #[serde(default)]
    pub choices: Vec<String>,
}

#[derive(Deserialize)]
struct SimulationRecordRepr {
    scenario_id: String,
    score: u8,
    payout: u64,
    #[serde(default)]
    choices: Vec<String>,
}

impl TryFrom<SimulationRecordRepr> for SimulationRecord {
    type Error = String;

    fn try_from(repr: SimulationRecordRepr) -> Result<Self, Self::Error> {
        if repr.score > MAX_SCORE {
            return Err(format!(
                "simulation record '{}' score {} is above {}",
                repr.scenario_id, repr.score, MAX_SCORE
            ));
        }
        Ok(Self {
            scenario_id: repr.scenario_id,
            score: repr.score,
            payout: repr.payout,
            choices: repr.choices,
        })
    }
}

/// The learner's simulation sub-state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SimulationSlot {
    #[default]
    Idle,
    Active(SimulationRun),
}

impl SimulationSlot {
    pub fn active(&self) -> Option<&SimulationRun> {
        match self {
            SimulationSlot::Idle => None,
            SimulationSlot::Active(run) => Some(run),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SimulationSlot::Active(_))
    }

    pub fn status(&self) -> SimulationStatus {
        match self {
            SimulationSlot::Idle => SimulationStatus::Idle,
            SimulationSlot::Active(run) => run.status(),
        }
    }
}

/// How a start request lands on the current slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartDecision {
    /// Same scenario already in progress; keep it
    Resume,
    /// Begin a new run, replacing whatever was active
    Fresh { discarded: Option<SimulationRun> },
}

pub fn decide_start(slot: &SimulationSlot, scenario_id: &str) -> StartDecision {
    match slot {
        SimulationSlot::Active(run)
            if run.scenario_id() == scenario_id && run.status() == SimulationStatus::InProgress =>
        {
            StartDecision::Resume
        }
        SimulationSlot::Active(run) => StartDecision::Fresh {
            discarded: Some(run.clone()),
        },
        SimulationSlot::Idle => StartDecision::Fresh { discarded: None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_final_step(run: SimulationRun) -> SimulationRun {
        let mut run = run;
        while let Some(next) = run.advance().unwrap() {
            run = next;
        }
        run
    }

    #[test]
    fn test_start_defaults() {
        let run = SimulationRun::start("triage", 3);
        assert_eq!(run.current_step_index(), 0);
        assert_eq!(run.score(), 50);
        assert!(run.history().is_empty());
        assert_eq!(run.status(), SimulationStatus::InProgress);
    }

    #[test]
    fn test_zero_steps_normalized() {
        let run = SimulationRun::start("empty", 0);
        assert_eq!(run.total_steps(), 1);
        assert!(run.is_final_step());
    }

    #[test]
    fn test_record_choice_does_not_advance() {
        let run = SimulationRun::start("triage", 3);
        let run = run.record_choice("calm", 15).unwrap();
        assert_eq!(run.current_step_index(), 0);
        assert_eq!(run.score(), 65);
        assert_eq!(run.history(), &["calm".to_string()]);
    }

    #[test]
    fn test_second_choice_on_same_step_rejected() {
        let run = SimulationRun::start("triage", 3).record_choice("a", 5).unwrap();
        let err = run.record_choice("b", 5).unwrap_err();
        assert_eq!(
            err,
            EngineError::ChoiceAlreadyRecorded {
                scenario_id: "triage".to_string(),
                step: 1
            }
        );
    }

    #[test]
    fn test_choice_allowed_again_after_advance() {
        let run = SimulationRun::start("triage", 2).record_choice("a", 5).unwrap();
        let run = run.advance().unwrap().unwrap();
        let run = run.record_choice("b", -15).unwrap();
        assert_eq!(run.history().len(), 2);
        assert_eq!(run.score(), 40);
    }

    #[test]
    fn test_advance_stops_at_last_step() {
        let run = SimulationRun::start("triage", 2);
        let run = run.advance().unwrap().unwrap();
        assert_eq!(run.current_step_index(), 1);
        assert!(run.advance().unwrap().is_none());
    }

    #[test]
    fn test_complete_before_final_step_fails() {
        let run = SimulationRun::start("triage", 3);
        let err = run.complete(300).unwrap_err();
        assert!(matches!(err, EngineError::NotAtFinalStep { step: 1, total_steps: 3, .. }));
    }

    #[test]
    fn test_complete_payouts() {
        let run = at_final_step(SimulationRun::start("triage", 3));
        assert_eq!(run.complete(300).unwrap().payout, 150);

        let high = run.record_choice("best", 80).unwrap();
        assert_eq!(high.score(), 100);
        assert_eq!(high.complete(300).unwrap().payout, 300);

        let low = run.record_choice("worst", -200).unwrap();
        assert_eq!(low.score(), 0);
        assert_eq!(low.complete(300).unwrap().payout, 0);
    }

    #[test]
    fn test_completed_run_rejects_further_moves() {
        let run = at_final_step(SimulationRun::start("triage", 1));
        let done = run.complete(100).unwrap().run;
        assert_eq!(done.status(), SimulationStatus::Completed);
        assert!(matches!(
            done.record_choice("x", 1),
            Err(EngineError::SimulationNotInProgress { .. })
        ));
        assert!(done.advance().is_err());
        assert!(done.complete(100).is_err());
    }

    #[test]
    fn test_outcome_record() {
        let run = SimulationRun::start("triage", 1).record_choice("calm", 10).unwrap();
        let outcome = run.complete(200).unwrap();
        let record = outcome.record();
        assert_eq!(record.scenario_id, "triage");
        assert_eq!(record.score, 60);
        assert_eq!(record.payout, 120);
        assert_eq!(record.choices, vec!["calm".to_string()]);
    }

    #[test]
    fn test_decide_start() {
        assert_eq!(
            decide_start(&SimulationSlot::Idle, "triage"),
            StartDecision::Fresh { discarded: None }
        );

        let slot = SimulationSlot::Active(SimulationRun::start("triage", 3));
        assert_eq!(decide_start(&slot, "triage"), StartDecision::Resume);
        assert!(matches!(
            decide_start(&slot, "escalation"),
            StartDecision::Fresh { discarded: Some(_) }
        ));
    }

    #[test]
    fn test_slot_serde() {
        let slot = SimulationSlot::Active(SimulationRun::start("triage", 2));
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["state"], "active");
        assert_eq!(json["scenario_id"], "triage");
        let parsed: SimulationSlot = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, slot);

        let idle = serde_json::to_value(&SimulationSlot::Idle).unwrap();
        assert_eq!(idle["state"], "idle");
    }

    fn run_json(score: u32, step: usize, total: usize, history: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "state": "active",
            "scenario_id": "triage",
            "current_step_index": step,
            "total_steps": total,
            "score": score,
            "history": history,
            "status": "in_progress",
        })
    }

    #[test]
    fn test_stored_run_must_be_consistent() {
        let ok: SimulationSlot = serde_json::from_value(run_json(70, 1, 2, &["a"])).unwrap();
        assert_eq!(ok.active().unwrap().score(), 70);

        for bad in [
            run_json(250, 0, 2, &[]),
            run_json(50, 7, 2, &[]),
            run_json(50, 0, 0, &[]),
            run_json(50, 0, 3, &["a", "b"]),
        ] {
            assert!(serde_json::from_value::<SimulationSlot>(bad.clone()).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_stored_record_score_bounded() {
        let record = serde_json::json!({"scenario_id": "triage", "score": 101, "payout": 10});
        let err = serde_json::from_value::<SimulationRecord>(record).unwrap_err();
        assert!(err.to_string().contains("above 100"));
    }
}
